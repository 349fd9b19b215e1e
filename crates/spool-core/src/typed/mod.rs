//! Typed - 型付き Task API
//!
//! # 二層構造
//! - **表層（Typed）**: `Task` trait - 型安全、serde で永続化
//! - **内部（Dyn）**: `DynTask` trait - object-safe, type erasure
//!
//! `TaskRegistry` が task_type 文字列からデコーダを引き、`PayloadCodec` が
//! `TaskEnvelope` との相互変換を行う。

pub mod codec;
pub mod erased;
pub mod registry;
pub mod task;

pub use self::codec::{CodecError, PayloadCodec};
pub use self::erased::{DynTask, TypedTask, erase};
pub use self::registry::{DecodeFn, TaskRegistry};
pub use self::task::Task;
