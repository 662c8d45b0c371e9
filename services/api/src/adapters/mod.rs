pub mod db;
pub mod realtime;
pub mod storage;

pub use db::DbAdapter;
pub use realtime::BroadcastHub;
pub use storage::LocalStorageAdapter;
