pub mod memory_store;
pub mod fs_store;
pub mod sqlite_store;
pub mod http_feed_source;
pub mod fake_feed_source;
pub mod console_notifier;
pub mod smtp_notifier;
pub mod multi_notifier;
