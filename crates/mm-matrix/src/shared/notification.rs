//! User-facing notifications
//!
//! The matrix emits a success toast after each applied membership change.
//! Rendering is up to the sink.

use async_trait::async_trait;
use tracing::info;

pub const SUCCESS_TITLE: &str = "Success";
pub const MEMBERSHIP_UPDATED: &str = "Membership updated";

/// Notification sink
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_success(&self, title: &str, message: &str);
}

/// Writes notifications to the log
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify_success(&self, title: &str, message: &str) {
        info!(title, message, "Notification");
    }
}

/// Drops notifications
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn notify_success(&self, _title: &str, _message: &str) {}
}
