//! Turns snapshots into lines of text.

use parley::prelude::{Message, Phase, Snapshot, UserId};

/// Name to show for `id`: "you", a roster name, or the raw id.
pub fn display_name<'a>(snapshot: &'a Snapshot, id: &'a UserId) -> &'a str {
    if snapshot.user_id.as_ref() == Some(id) {
        "you"
    } else {
        snapshot.name_of(id).unwrap_or(id.as_str())
    }
}

pub fn message(snapshot: &Snapshot, message: &Message) -> String {
    format!("[{}] {}", display_name(snapshot, &message.sender), message.content)
}

pub fn roster(snapshot: &Snapshot) -> String {
    if snapshot.roster.is_empty() {
        return "nobody else is online".into();
    }
    let mut out = String::from("online:");
    for entry in snapshot.roster.iter() {
        out.push_str(&format!("\n  {}  {}", entry.id, entry.name));
    }
    out
}

pub fn status(snapshot: &Snapshot) -> String {
    if snapshot.phase == Phase::Closed {
        return "disconnected".into();
    }
    if let Some(peer) = &snapshot.peer {
        return format!("chatting with {}", display_name(snapshot, peer));
    }
    match &snapshot.user_id {
        Some(id) if snapshot.phase.is_registered() => {
            format!("signed in as {} ({id})", snapshot.display_name)
        }
        _ => "registering...".into(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parley::prelude::RosterEntry;

    use super::*;

    fn snapshot() -> Snapshot {
        Snapshot {
            phase: Phase::Paired,
            user_id: Some(UserId::new("u1")),
            display_name: "Ada".into(),
            roster: Arc::new(vec![RosterEntry::new("u2", "Bob")]),
            peer: Some(UserId::new("u2")),
            messages: Arc::new(vec![]),
        }
    }

    #[test]
    fn test_message_names_sender() {
        let s = snapshot();
        assert_eq!(message(&s, &Message::new("u1", "hi")), "[you] hi");
        assert_eq!(message(&s, &Message::new("u2", "yo")), "[Bob] yo");
        assert_eq!(message(&s, &Message::new("u9", "?")), "[u9] ?");
    }

    #[test]
    fn test_roster_lists_entries() {
        let mut s = snapshot();
        assert_eq!(roster(&s), "online:\n  u2  Bob");
        s.roster = Arc::new(vec![]);
        assert_eq!(roster(&s), "nobody else is online");
    }

    #[test]
    fn test_status_follows_phase() {
        let mut s = snapshot();
        assert_eq!(status(&s), "chatting with Bob");
        s.phase = Phase::Idle;
        s.peer = None;
        assert_eq!(status(&s), "signed in as Ada (u1)");
        s.phase = Phase::Closed;
        assert_eq!(status(&s), "disconnected");
        s.phase = Phase::Unregistered;
        s.user_id = None;
        assert_eq!(status(&s), "registering...");
    }
}
