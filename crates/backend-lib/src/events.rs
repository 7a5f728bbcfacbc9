// ============================
// crates/backend-lib/src/events.rs
// ============================
//! In-process domain event bus.
//!
//! A thin wrapper over a `tokio::sync::broadcast` channel. Publishing never
//! waits for subscribers: with nobody listening the event is dropped, and a
//! subscriber that falls more than `capacity` events behind loses the oldest
//! ones. Each emission is delivered at most once per subscriber.
use crate::metrics::EVENT_PUBLISHED;
use crate::models::User;
use metrics::counter;
use tokio::sync::broadcast;
use tracing::debug;

/// Something happened to the data of a user
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A task owned by `user` was created, updated or deleted
    TaskMutated { user: User },
}

impl DomainEvent {
    pub fn task_mutated(user: User) -> Self {
        DomainEvent::TaskMutated { user }
    }
}

/// Cloneable publisher handle
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Fire-and-forget publish
    pub fn publish(&self, event: DomainEvent) {
        counter!(EVENT_PUBLISHED).increment(1);
        if self.tx.send(event).is_err() {
            debug!("event published with no subscribers");
        }
    }

    /// A new receiver seeing every event published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            name: None,
            password: String::new(),
            refresh_token_hash: None,
            last_login: None,
            connection_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(4);
        bus.publish(DomainEvent::task_mutated(user()));
    }

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let bus = EventBus::new(4);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        let user = user();

        bus.publish(DomainEvent::task_mutated(user.clone()));

        for rx in [&mut first, &mut second] {
            let DomainEvent::TaskMutated { user: got } = rx.recv().await.unwrap();
            assert_eq!(got.id, user.id);
        }
    }

    #[tokio::test]
    async fn test_order_is_preserved() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let users: Vec<User> = (0..3).map(|_| user()).collect();

        for u in &users {
            bus.publish(DomainEvent::task_mutated(u.clone()));
        }
        for u in &users {
            let DomainEvent::TaskMutated { user: got } = rx.recv().await.unwrap();
            assert_eq!(got.id, u.id);
        }
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags_instead_of_blocking() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();

        for _ in 0..5 {
            bus.publish(DomainEvent::task_mutated(user()));
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
    }
}
