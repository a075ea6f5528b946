pub mod db;
pub mod notifier;

pub use db::PgStore;
pub use notifier::{BroadcastNotifier, NullNotifier};
