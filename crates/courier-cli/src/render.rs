//! Minimal HTML pages.
//!
//! Every value that came from a user or a task is passed through `escape`.

use std::fmt::Write;

use courier_core::domain::TaskSnapshot;
use courier_core::{StartReceipt, StatusCounts};

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2em auto;padding:0 1em}\
table{border-collapse:collapse;width:100%}th,td{border:1px solid #ccc;padding:4px 8px;text-align:left}\
.error{color:#b00020}.note{color:#1b5e20}label{display:block;margin-top:.6em}";

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = escape(title),
    )
}

fn stop_form() -> &'static str {
    "<form method=\"post\" action=\"/stop\" enctype=\"multipart/form-data\">\n\
<label for=\"taskId\">Task ID to stop</label>\n\
<input type=\"text\" id=\"taskId\" name=\"taskId\" required>\n\
<button type=\"submit\">Stop task</button>\n</form>\n"
}

/// Start form, optionally with a validation message above it.
pub fn start_page(error: Option<&str>) -> String {
    let mut body = String::new();
    if let Some(error) = error {
        let _ = writeln!(body, "<p class=\"error\">{}</p>", escape(error));
    }
    body.push_str(
        "<form method=\"post\" action=\"/\" enctype=\"multipart/form-data\">\n\
<label>Credentials</label>\n\
<label><input type=\"radio\" name=\"tokenOption\" value=\"single\" checked> Single</label>\n\
<label><input type=\"radio\" name=\"tokenOption\" value=\"multiple\"> File (one per line)</label>\n\
<label for=\"singleToken\">Credential</label>\n\
<input type=\"text\" id=\"singleToken\" name=\"singleToken\">\n\
<label for=\"tokenFile\">Credential file</label>\n\
<input type=\"file\" id=\"tokenFile\" name=\"tokenFile\" accept=\".txt\">\n\
<label for=\"threadId\">Target ID</label>\n\
<input type=\"text\" id=\"threadId\" name=\"threadId\" required>\n\
<label for=\"displayName\">Display label</label>\n\
<input type=\"text\" id=\"displayName\" name=\"displayName\" required>\n\
<label for=\"time\">Interval (seconds)</label>\n\
<input type=\"number\" id=\"time\" name=\"time\" min=\"1\" value=\"60\" required>\n\
<label for=\"txtFile\">Message file (one per line)</label>\n\
<input type=\"file\" id=\"txtFile\" name=\"txtFile\" accept=\".txt\" required>\n\
<label for=\"cycles\">Cycles (empty = until stopped)</label>\n\
<input type=\"number\" id=\"cycles\" name=\"cycles\" min=\"1\">\n\
<p><button type=\"submit\">Start task</button></p>\n</form>\n<hr>\n",
    );
    body.push_str(stop_form());
    body.push_str("<p><a href=\"/status\">View status</a></p>\n");
    page("Courier", &body)
}

pub fn started_page(receipt: &StartReceipt) -> String {
    let body = format!(
        "<p>Task ID:</p>\n<p><code>{id}</code></p>\n\
<p>Sending {payloads} message(s) with {credentials} credential(s) to <code>{target}</code> \
every {interval}s.</p>\n<p>Keep the task ID to stop it later.</p>\n\
<p><a href=\"/status\">View status</a> | <a href=\"/\">Back</a></p>",
        id = escape(&receipt.task_id.to_string()),
        payloads = receipt.payload_count,
        credentials = receipt.credential_count,
        target = escape(&receipt.target),
        interval = receipt.interval_secs,
    );
    page("Task started", &body)
}

/// Task table, optionally with a message from a stop request.
pub fn status_page(tasks: &[TaskSnapshot], message: Option<&str>) -> String {
    let counts = StatusCounts::from_snapshots(tasks);
    let mut body = String::new();

    if let Some(message) = message {
        let _ = writeln!(body, "<p class=\"note\">{}</p>", escape(message));
    }
    let _ = writeln!(
        body,
        "<p>{} task(s), {} active.</p>",
        counts.total(),
        counts.active()
    );

    if tasks.is_empty() {
        body.push_str("<p>No tasks yet.</p>\n");
    } else {
        body.push_str(
            "<table>\n<tr><th>Task ID</th><th>Status</th><th>Sent / Total</th>\
<th>Failed</th><th>Target</th><th>Interval</th><th>Started</th><th>Last attempt</th></tr>\n",
        );
        for task in tasks {
            let last = task
                .fault
                .as_deref()
                .or(task.last_attempt.as_deref())
                .unwrap_or("-");
            let _ = writeln!(
                body,
                "<tr><td><code>{id}</code></td><td>{status}</td><td>{sent} / {total}</td>\
<td>{failed}</td><td>{target}</td><td>{interval}s</td><td>{started}</td><td>{last}</td></tr>",
                id = escape(&task.task_id.to_string()),
                status = escape(task.status_label),
                sent = task.sent,
                total = task.total,
                failed = task.failed,
                target = escape(&task.target),
                interval = task.interval_secs,
                started = task.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                last = escape(last),
            );
        }
        body.push_str("</table>\n");
    }

    body.push_str(stop_form());
    body.push_str("<p><a href=\"/\">Start another task</a></p>\n");
    page("Task status", &body)
}
