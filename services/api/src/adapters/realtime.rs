//! services/api/src/adapters/realtime.rs
//!
//! In-process implementation of the `RealtimeService` port on top of a
//! `tokio::sync::broadcast` channel. Every live support-chat connection
//! holds one subscription; dropping it closes the channel for that receiver.

use async_trait::async_trait;
use meridian_core::ports::{RealtimeEvent, RealtimeService, RealtimeSubscription};
use tokio::sync::broadcast;
use tracing::warn;

#[derive(Clone)]
pub struct BroadcastHub {
    tx: broadcast::Sender<RealtimeEvent>,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }
}

struct BroadcastSubscription {
    rx: broadcast::Receiver<RealtimeEvent>,
}

#[async_trait]
impl RealtimeSubscription for BroadcastSubscription {
    async fn next_event(&mut self) -> Option<RealtimeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // A slow consumer only loses events, it never stalls the hub.
                    warn!("Realtime subscriber lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[async_trait]
impl RealtimeService for BroadcastHub {
    fn subscribe(&self) -> Box<dyn RealtimeSubscription> {
        Box::new(BroadcastSubscription {
            rx: self.tx.subscribe(),
        })
    }

    fn publish(&self, event: RealtimeEvent) {
        // Send only fails when there are no subscribers, which is fine.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use meridian_core::domain::Message;
    use uuid::Uuid;

    #[tokio::test]
    async fn published_inserts_reach_subscribers() {
        let hub = BroadcastHub::new(16);
        let mut sub = hub.subscribe();

        let message = Message {
            id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            receiver_id: None,
            content: "hello".to_string(),
            created_at: Utc::now(),
        };
        hub.publish(RealtimeEvent::MessageInserted(message.clone()));

        match sub.next_event().await {
            Some(RealtimeEvent::MessageInserted(received)) => assert_eq!(received, message),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn revocation_events_carry_the_user() {
        let hub = BroadcastHub::new(16);
        let mut sub = hub.subscribe();
        let user_id = Uuid::new_v4();

        hub.publish(RealtimeEvent::SessionRevoked { user_id });

        match sub.next_event().await {
            Some(RealtimeEvent::SessionRevoked { user_id: revoked }) => {
                assert_eq!(revoked, user_id)
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
