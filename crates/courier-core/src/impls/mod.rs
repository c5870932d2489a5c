//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryTaskStore**: プロセス内レジストリ
//! - **HttpInvoker**: reqwest による外部アクション（本番用）
//! - **ScriptedInvoker**: ネットワークなし（dry-run・テスト用）

pub mod http_invoker;
pub mod inmem_store;
pub mod scripted_invoker;

pub use self::http_invoker::{HttpInvoker, HttpInvokerConfig, HttpInvokerError};
pub use self::inmem_store::InMemoryTaskStore;
pub use self::scripted_invoker::{RecordedCall, Script, ScriptedInvoker};
