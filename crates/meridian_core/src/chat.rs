//! crates/meridian_core/src/chat.rs
//!
//! The chat mirror: owns the rendered transcript for one support-chat view
//! and enforces the subscription lifecycle (Idle <-> Subscribed). The
//! transport layer loads history and delivers insert notifications; the
//! mirror decides what is rendered and in which visual class.

use uuid::Uuid;

use crate::domain::Message;
use chrono::{DateTime, Utc};

/// Visual class of a rendered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleKind {
    /// The current user sent this message.
    Sent,
    /// The message was addressed to the current user.
    Received,
}

/// A single rendered chat entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub message_id: Uuid,
    pub content: String,
    pub kind: BubbleKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MirrorState {
    Idle,
    Subscribed { user_id: Uuid },
}

/// Two-state machine mirroring one user's support conversation.
///
/// The transcript is always a history prefix followed by a live-appended
/// suffix; together they form one non-decreasing-time sequence as long as
/// inserts are delivered in order.
#[derive(Debug)]
pub struct ChatMirror {
    state: MirrorState,
    transcript: Vec<Bubble>,
}

impl ChatMirror {
    pub fn new() -> Self {
        Self {
            state: MirrorState::Idle,
            transcript: Vec::new(),
        }
    }

    /// Loads the message history for `user_id` and transitions to
    /// `Subscribed`. Re-entry is idempotent: any prior subscription is
    /// released first and the transcript rebuilt, so afterwards exactly one
    /// subscription is active.
    pub fn enter(&mut self, user_id: Uuid, history: Vec<Message>) -> &[Bubble] {
        if self.is_subscribed() {
            self.leave();
        }
        self.transcript = history
            .iter()
            .filter(|m| Self::involves(user_id, m))
            .map(|m| Self::bubble_for(user_id, m))
            .collect();
        self.state = MirrorState::Subscribed { user_id };
        &self.transcript
    }

    /// Handles an insert notification. Appends a bubble only while
    /// subscribed and only when the current user is sender or receiver of
    /// the new message; returns the appended bubble for the transport to
    /// push to the view.
    pub fn on_insert(&mut self, message: &Message) -> Option<&Bubble> {
        let MirrorState::Subscribed { user_id } = self.state else {
            return None;
        };
        if !Self::involves(user_id, message) {
            return None;
        }
        self.transcript.push(Self::bubble_for(user_id, message));
        self.transcript.last()
    }

    /// Releases the subscription and clears the transcript. Must run before
    /// navigating away or on logout so no push listener leaks.
    pub fn leave(&mut self) {
        self.state = MirrorState::Idle;
        self.transcript.clear();
    }

    pub fn is_subscribed(&self) -> bool {
        matches!(self.state, MirrorState::Subscribed { .. })
    }

    pub fn current_user(&self) -> Option<Uuid> {
        match self.state {
            MirrorState::Subscribed { user_id } => Some(user_id),
            MirrorState::Idle => None,
        }
    }

    pub fn transcript(&self) -> &[Bubble] {
        &self.transcript
    }

    fn involves(user_id: Uuid, message: &Message) -> bool {
        message.sender_id == user_id || message.receiver_id == Some(user_id)
    }

    fn bubble_for(user_id: Uuid, message: &Message) -> Bubble {
        let kind = if message.sender_id == user_id {
            BubbleKind::Sent
        } else {
            BubbleKind::Received
        };
        Bubble {
            message_id: message.id,
            content: message.content.clone(),
            kind,
            created_at: message.created_at,
        }
    }
}

impl Default for ChatMirror {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn msg(sender: Uuid, receiver: Option<Uuid>, content: &str, secs: i64) -> Message {
        Message {
            id: Uuid::new_v4(),
            sender_id: sender,
            receiver_id: receiver,
            content: content.to_string(),
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn history_bubbles_are_classified_by_sender() {
        let user = Uuid::new_v4();
        let agent = Uuid::new_v4();
        let history = vec![
            msg(user, None, "hello", 1),
            msg(agent, Some(user), "hi, how can we help?", 2),
        ];

        let mut mirror = ChatMirror::new();
        let bubbles = mirror.enter(user, history);

        assert_eq!(bubbles.len(), 2);
        assert_eq!(bubbles[0].kind, BubbleKind::Sent);
        assert_eq!(bubbles[1].kind, BubbleKind::Received);
    }

    #[test]
    fn history_keeps_ascending_order_and_live_messages_follow() {
        let user = Uuid::new_v4();
        let agent = Uuid::new_v4();
        let history = vec![
            msg(user, None, "first", 1),
            msg(agent, Some(user), "second", 2),
        ];

        let mut mirror = ChatMirror::new();
        mirror.enter(user, history);
        mirror.on_insert(&msg(agent, Some(user), "third", 3));
        mirror.on_insert(&msg(user, None, "fourth", 4));

        let times: Vec<_> = mirror.transcript().iter().map(|b| b.created_at).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
        assert_eq!(mirror.transcript().len(), 4);
    }

    #[test]
    fn messages_for_other_users_are_never_appended() {
        let user = Uuid::new_v4();
        let other_a = Uuid::new_v4();
        let other_b = Uuid::new_v4();

        let mut mirror = ChatMirror::new();
        mirror.enter(user, Vec::new());

        assert!(mirror
            .on_insert(&msg(other_a, Some(other_b), "not for you", 1))
            .is_none());
        assert!(mirror.transcript().is_empty());
    }

    #[test]
    fn inserts_are_ignored_while_idle() {
        let user = Uuid::new_v4();
        let mut mirror = ChatMirror::new();
        assert!(mirror.on_insert(&msg(user, None, "dropped", 1)).is_none());

        mirror.enter(user, Vec::new());
        mirror.leave();
        assert!(mirror.on_insert(&msg(user, None, "dropped", 2)).is_none());
        assert!(mirror.transcript().is_empty());
    }

    #[test]
    fn entering_twice_leaves_exactly_one_subscription() {
        let user = Uuid::new_v4();
        let mut mirror = ChatMirror::new();

        mirror.enter(user, vec![msg(user, None, "old", 1)]);
        mirror.enter(user, vec![msg(user, None, "fresh", 2)]);

        assert!(mirror.is_subscribed());
        assert_eq!(mirror.current_user(), Some(user));
        // No duplicated history from the first entry.
        assert_eq!(mirror.transcript().len(), 1);
        assert_eq!(mirror.transcript()[0].content, "fresh");
    }

    #[test]
    fn leave_returns_to_idle() {
        let user = Uuid::new_v4();
        let mut mirror = ChatMirror::new();
        mirror.enter(user, Vec::new());
        assert!(mirror.is_subscribed());

        mirror.leave();
        assert!(!mirror.is_subscribed());
        assert_eq!(mirror.current_user(), None);
    }
}
