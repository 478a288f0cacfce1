//! User feedback channel.
//!
//! Notifications are fire-and-forget toasts. The front-end either renders
//! them as they arrive (`LogNotifier` for terminal use) or drains a
//! `NotificationQueue` on its own schedule.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;

pub trait Notifier: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn info(&self, message: &str) {
        info!("[notify] {message}");
    }

    fn error(&self, message: &str) {
        error!("[notify] {message}");
    }
}

/// Buffers notifications until the front-end drains them.
#[derive(Debug, Default, Clone)]
pub struct NotificationQueue {
    pending: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: NotificationLevel, message: &str) {
        let notification = Notification {
            level,
            message: message.to_string(),
            raised_at: Utc::now(),
        };
        match self.pending.lock() {
            Ok(mut pending) => pending.push(notification),
            Err(err) => warn!("[notify] queue mutex poisoned, dropping notification: {err}"),
        }
    }

    /// Removes and returns everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(err) => {
                warn!("[notify] queue mutex poisoned: {err}");
                Vec::new()
            }
        }
    }

    /// Copies the queued notifications without removing them.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.pending
            .lock()
            .map(|pending| pending.clone())
            .unwrap_or_default()
    }
}

impl Notifier for NotificationQueue {
    fn info(&self, message: &str) {
        self.push(NotificationLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.push(NotificationLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_drains_in_order() {
        let queue = NotificationQueue::new();
        queue.info("first");
        queue.error("second");

        assert_eq!(queue.snapshot().len(), 2);
        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NotificationLevel::Info);
        assert_eq!(drained[0].message, "first");
        assert_eq!(drained[1].level, NotificationLevel::Error);
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn clones_share_the_same_queue() {
        let queue = NotificationQueue::new();
        let handle = queue.clone();
        handle.info("from clone");
        assert_eq!(queue.drain().len(), 1);
    }
}
