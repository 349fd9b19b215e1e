//! Impls - ports の実装
//!
//! - **InMemoryKvStore**: テスト用。クローンで中身を共有できる
//! - **FileKvStore**: 1 キー 1 ファイルの永続ストア（CLI が使用）

pub mod file_kv;
pub mod memory_kv;

pub use self::file_kv::FileKvStore;
pub use self::memory_kv::InMemoryKvStore;
