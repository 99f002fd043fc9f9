//! Notification outbox.
//!
//! Side-effect notifications (quote sent, message posted, order ready...)
//! must never fail the operation that caused them. Handlers hand them to
//! [`Outbox::enqueue`], which queues without waiting; a background worker
//! writes them to `notifications`. Any failure along the way is logged at
//! WARN with the notification type and recipient.

use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::db::notifications::{self, NewNotification};

/// Default queue depth.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Handle for queueing notifications. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::Sender<NewNotification>,
}

impl Outbox {
    /// Spawn the writer task and return a handle to it.
    ///
    /// The task ends once every `Outbox` clone has been dropped and the
    /// queue is drained.
    #[must_use]
    pub fn start(pool: PgPool, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity);
        let handle = tokio::spawn(run_worker(pool, rx));
        (Self { tx }, handle)
    }

    /// An outbox whose queue is read by the caller instead of a worker.
    #[cfg(test)]
    pub(crate) fn detached(capacity: usize) -> (Self, mpsc::Receiver<NewNotification>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Queue a notification without waiting.
    ///
    /// A full or closed queue drops the notification with a warning.
    pub fn enqueue(&self, notification: NewNotification) {
        if let Err(err) = self.tx.try_send(notification) {
            let (reason, dropped) = match err {
                mpsc::error::TrySendError::Full(n) => ("queue full", n),
                mpsc::error::TrySendError::Closed(n) => ("worker stopped", n),
            };
            tracing::warn!(
                kind = %dropped.kind,
                user_id = %dropped.user_id,
                reason,
                "Dropped notification"
            );
        }
    }

    /// Queue the same notification for several recipients.
    pub fn enqueue_many(
        &self,
        recipients: impl IntoIterator<Item = atelier_core::UserId>,
        template: &NewNotification,
    ) {
        for user_id in recipients {
            self.enqueue(NewNotification {
                user_id,
                ..template.clone()
            });
        }
    }
}

async fn run_worker(pool: PgPool, mut rx: mpsc::Receiver<NewNotification>) {
    while let Some(notification) = rx.recv().await {
        if let Err(e) = notifications::insert(&pool, &notification).await {
            tracing::warn!(
                kind = %notification.kind,
                user_id = %notification.user_id,
                error = %e,
                "Failed to write notification"
            );
        }
    }
    tracing::debug!("Notification outbox closed");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use atelier_core::UserId;

    use super::*;
    use crate::db::notifications::NotificationKind;

    fn sample(user_id: UserId) -> NewNotification {
        NewNotification::new(
            user_id,
            NotificationKind::Quote,
            "Quote ready",
            "A new quote is ready for your review.",
            json!({}),
        )
    }

    #[tokio::test]
    async fn test_enqueue_delivers_in_order() {
        let (outbox, mut rx) = Outbox::detached(4);
        let first = UserId::generate();
        let second = UserId::generate();
        outbox.enqueue(sample(first));
        outbox.enqueue(sample(second));

        assert_eq!(rx.recv().await.unwrap().user_id, first);
        assert_eq!(rx.recv().await.unwrap().user_id, second);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_failing() {
        let (outbox, mut rx) = Outbox::detached(1);
        outbox.enqueue(sample(UserId::generate()));
        outbox.enqueue(sample(UserId::generate()));

        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_queue_drops_without_failing() {
        let (outbox, rx) = Outbox::detached(1);
        drop(rx);
        outbox.enqueue(sample(UserId::generate()));
    }

    #[tokio::test]
    async fn test_enqueue_many_rewrites_recipient() {
        let (outbox, mut rx) = Outbox::detached(8);
        let staff = [UserId::generate(), UserId::generate()];
        outbox.enqueue_many(staff, &sample(UserId::generate()));

        assert_eq!(rx.recv().await.unwrap().user_id, staff[0]);
        assert_eq!(rx.recv().await.unwrap().user_id, staff[1]);
    }
}
