//! Change notifications for long-lived listeners.
//!
//! A notification only says that something was committed. Listeners must
//! read the model again for the actual state, and a listener that falls
//! behind simply misses notifications.

use event_store::Version;
use serde::Serialize;
use tokio::sync::broadcast;

/// Notifications buffered per listener before old ones are dropped.
const NOTIFICATION_BUFFER_SIZE: usize = 64;

/// Sent after an event has been logged and applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Committed {
    pub event_type: &'static str,
    pub version: Version,
}

/// Fan-out of [`Committed`] notifications.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Committed>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(NOTIFICATION_BUFFER_SIZE);
        Self { tx }
    }

    /// Sends to every current listener. Having no listeners is fine.
    pub fn notify(&self, committed: Committed) {
        let _ = self.tx.send(committed);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Committed> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notify_without_listeners_is_ok() {
        let notifier = Notifier::new();
        notifier.notify(Committed {
            event_type: "set-phase",
            version: Version::first(),
        });
        assert_eq!(notifier.listener_count(), 0);
    }

    #[tokio::test]
    async fn every_listener_receives() {
        let notifier = Notifier::new();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();

        let committed = Committed {
            event_type: "set-bid",
            version: Version::new(3),
        };
        notifier.notify(committed.clone());

        assert_eq!(a.recv().await.unwrap(), committed);
        assert_eq!(b.recv().await.unwrap(), committed);
    }

    #[tokio::test]
    async fn lagging_listener_misses_notifications() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        for v in 1..=(NOTIFICATION_BUFFER_SIZE as i64 + 1) {
            notifier.notify(Committed {
                event_type: "set-bid",
                version: Version::new(v),
            });
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
    }
}
