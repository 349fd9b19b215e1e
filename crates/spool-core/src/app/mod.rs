//! App - アプリケーション層
//!
//! # 主要コンポーネント
//! - **QueueBuilder**: タスク種別の登録、起動時検証、永続化済みタスクの復元
//! - **QueueConfig**: ストレージキー、リトライ方針、デコード不能タスクの扱い

pub mod builder;
pub mod config;

pub use self::builder::{BuildError, QueueBuilder};
pub use self::config::{DEFAULT_STORAGE_KEY, QueueConfig};
