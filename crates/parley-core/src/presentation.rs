//! Text rules the renderer relies on.

use std::ops::RangeInclusive;

use parley_types::{Message, UserId};

/// Shown in place of the message list when the thread is empty.
pub const EMPTY_THREAD_PLACEHOLDER: &str = "No messages yet.";

/// Label used for the current user's own messages.
pub const OWN_SENDER_LABEL: &str = "You";

/// The Unicode Arabic block.
const ARABIC_BLOCK: RangeInclusive<char> = '\u{0600}'..='\u{06FF}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl TextDirection {
    /// Right-to-left iff `text` has at least one character in the Arabic block.
    pub fn of(text: &str) -> Self {
        if text.chars().any(|c| ARABIC_BLOCK.contains(&c)) {
            Self::Rtl
        } else {
            Self::Ltr
        }
    }

    pub fn is_rtl(self) -> bool {
        self == Self::Rtl
    }
}

/// "You" for the current user's messages, otherwise the peer's display name.
pub fn sender_label<'a>(message: &Message, me: &UserId, peer_name: &'a str) -> &'a str {
    if message.is_from(me) {
        OWN_SENDER_LABEL
    } else {
        peer_name
    }
}

/// Header line for the conversation panel.
pub fn thread_title(peer_name: &str) -> String {
    format!("Chat with {peer_name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_direction() {
        assert_eq!(TextDirection::of("hello world"), TextDirection::Ltr);
        assert_eq!(TextDirection::of(""), TextDirection::Ltr);
        assert_eq!(TextDirection::of("مرحبا"), TextDirection::Rtl);
        assert_eq!(TextDirection::of("ok \u{0600}"), TextDirection::Rtl);
        assert_eq!(TextDirection::of("ok \u{06FF}"), TextDirection::Rtl);
        // Neighbouring blocks (Syriac, Arabic Supplement) do not count.
        assert_eq!(TextDirection::of("\u{0700}\u{0750}"), TextDirection::Ltr);
        // Hebrew is RTL in general but outside the rule.
        assert_eq!(TextDirection::of("שלום"), TextDirection::Ltr);
    }

    #[test]
    fn test_sender_label() {
        let me = UserId::new("u1");
        let msg = Message {
            id: "m1".into(),
            sender: "u1".into(),
            receiver: "u2".into(),
            text: "hi".into(),
            created_at: Utc::now(),
        };
        assert_eq!(sender_label(&msg, &me, "Sara"), "You");
        assert_eq!(sender_label(&msg, &UserId::new("u2"), "Omar"), "Omar");
        assert_eq!(thread_title("Sara"), "Chat with Sara");
    }
}
