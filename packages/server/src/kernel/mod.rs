// Infrastructure: locks, notifications, messaging, scheduling
pub mod jobs;
pub mod locks;
pub mod nats;
pub mod notifier;

pub use locks::{lock_key, LockError, LockStore, MemoryLockStore, PostgresLockStore};
pub use nats::{NatsClientPublisher, NatsPublisher, TestNats};
pub use notifier::{NatsNotifier, Notification, Notifier, RecordingNotifier};
