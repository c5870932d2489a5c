//! Ports - 抽象化レイヤー
//!
//! 外部（時刻・ID・レジストリ・外部 API）へのインターフェースを定義します。
//! 実装は `impls` にあります。

pub mod clock;
pub mod id_generator;
pub mod invoker;
pub mod task_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::invoker::{ActionInvoker, Invocation};
pub use self::task_store::{StoreError, TaskStore};
