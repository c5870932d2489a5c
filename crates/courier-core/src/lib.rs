//! courier-core
//!
//! Courier（バックグラウンドタスクランナー）のコア部品。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, spec, state, task, attempt, outcome, errors）
//! - **ports**: 抽象化レイヤー（TaskStore, ActionInvoker, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（builder, control, worker_loop, status）
//! - **impls**: 実装（InMemoryTaskStore, HttpInvoker, ScriptedInvoker）
//! - **error**: 公開 API のエラー型

pub mod app;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;

pub use app::{AppBuilder, StartReceipt, StatusCounts, StopOutcome, TaskManager};
pub use error::CourierError;
