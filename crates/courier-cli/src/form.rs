//! Form decoding for the start and stop endpoints.
//!
//! Start form (multipart):
//! - `tokenOption`  - `single` | `multiple`
//! - `singleToken`  - one credential
//! - `tokenFile`    - newline-delimited credentials
//! - `threadId`     - target id
//! - `displayName`  - label prefixed onto every message
//! - `time`         - interval in seconds
//! - `txtFile`      - newline-delimited messages
//! - `cycles`       - optional number of full passes

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use courier_core::domain::StartRequest;
use serde::Deserialize;

/// Read every known field of the start form. Unknown fields are ignored.
pub async fn read_start_form(mut multipart: Multipart) -> Result<StartRequest, MultipartError> {
    let mut request = StartRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let slot = match name.as_str() {
            "tokenOption" => &mut request.credential_mode,
            "singleToken" => &mut request.single_credential,
            "tokenFile" => &mut request.credential_list,
            "threadId" => &mut request.target,
            "displayName" => &mut request.label,
            "time" => &mut request.interval_secs,
            "txtFile" => &mut request.payload_list,
            "cycles" => &mut request.max_cycles,
            _ => continue,
        };
        *slot = Some(field.text().await?);
    }

    Ok(request)
}

/// Stop form, accepted urlencoded or multipart.
#[derive(Debug, Default, Deserialize)]
pub struct StopForm {
    #[serde(rename = "taskId", default)]
    pub task_id: String,
}

pub async fn read_stop_form(mut multipart: Multipart) -> Result<StopForm, MultipartError> {
    let mut form = StopForm::default();
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("taskId") {
            form.task_id = field.text().await?;
        }
    }
    Ok(form)
}
