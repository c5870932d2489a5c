//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: TaskManager の構築とワイヤリング
//! - **TaskManager**: start / stop / status（照合付き）
//! - **WorkerLoop**: 1 タスク分の送信ループ（キャンセル可能）
//! - **StatusCounts**: status ごとの件数

pub mod builder;
pub mod control;
pub mod status;
pub mod worker_loop;

// 主要な型を再エクスポート
pub use self::builder::{AppBuilder, BuildError};
pub use self::control::{StartReceipt, StopOutcome, TaskManager};
pub use self::status::StatusCounts;
pub use self::worker_loop::{WorkerContext, WorkerExit, WorkerLoop};
