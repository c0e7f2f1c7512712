//! Turns view events into terminal output.

use std::collections::HashSet;
use std::fmt::Display;

use chrono::{Local, TimeZone};
use parley_core::{
    EMPTY_THREAD_PLACEHOLDER, SessionState, TextDirection, ViewEvent, sender_label, thread_title,
};
use parley_types::{Message, MessageId, UserId};
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::warn;

/// Print events until the sink is dropped.
pub async fn run(mut events: Receiver<ViewEvent>, me: UserId) {
    let mut printer = Printer::new(me, Local);
    loop {
        match events.recv().await {
            Ok(event) => {
                for line in printer.render(&event) {
                    println!("{line}");
                }
            }
            // The next message snapshot brings the screen back in line.
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "printer fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Incremental renderer. Remembers what is already on screen so each
/// snapshot only prints what changed.
pub struct Printer<Tz: TimeZone> {
    me: UserId,
    zone: Tz,
    peer: Option<UserId>,
    state: SessionState,
    shown: HashSet<MessageId>,
    picker_open: bool,
    menu: Option<MessageId>,
}

impl<Tz> Printer<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn new(me: UserId, zone: Tz) -> Self {
        Self {
            me,
            zone,
            peer: None,
            state: SessionState::Idle,
            shown: HashSet::new(),
            picker_open: false,
            menu: None,
        }
    }

    pub fn render(&mut self, event: &ViewEvent) -> Vec<String> {
        match event {
            ViewEvent::Session { state, peer } => self.session(*state, peer.as_ref()),
            ViewEvent::Messages { snapshot, .. } => self.messages(snapshot),
            ViewEvent::Composer { picker_open, .. } => {
                if *picker_open == self.picker_open {
                    return Vec::new();
                }
                self.picker_open = *picker_open;
                if *picker_open {
                    vec!["emoji picker open, /emoji <symbol> to insert".into()]
                } else {
                    vec!["emoji picker closed".into()]
                }
            }
            ViewEvent::Menu { target } => {
                if *target == self.menu {
                    return Vec::new();
                }
                self.menu = target.clone();
                match target {
                    Some(id) => vec![format!("menu for #{id}: /delete to remove, /menu to cancel")],
                    None => vec!["menu closed".into()],
                }
            }
            ViewEvent::Notice(notice) => vec![format!("! {notice}")],
            ViewEvent::NoticeDismissed => Vec::new(),
        }
    }

    fn session(&mut self, state: SessionState, peer: Option<&UserId>) -> Vec<String> {
        if peer != self.peer.as_ref() {
            self.peer = peer.cloned();
            self.shown.clear();
            self.menu = None;
        }
        let previous = std::mem::replace(&mut self.state, state);
        match (state, peer) {
            (SessionState::Loading, Some(peer)) => {
                vec![format!("== {} ==", thread_title(peer.as_str())), "loading...".into()]
            }
            (SessionState::Idle, None) => vec!["no conversation open, /peer <id> to start".into()],
            // An empty thread only gets its placeholder once it has loaded.
            (SessionState::Ready, _) if previous != SessionState::Ready && self.shown.is_empty() => {
                vec![EMPTY_THREAD_PLACEHOLDER.into()]
            }
            _ => Vec::new(),
        }
    }

    fn messages(&mut self, snapshot: &[Message]) -> Vec<String> {
        if snapshot.is_empty() {
            self.shown.clear();
            if self.state == SessionState::Ready {
                return vec![EMPTY_THREAD_PLACEHOLDER.into()];
            }
            return Vec::new();
        }

        let current: HashSet<&MessageId> = snapshot.iter().map(|m| &m.id).collect();
        let mut lines: Vec<String> = self
            .shown
            .iter()
            .filter(|id| !current.contains(id))
            .map(|id| format!("(#{id} deleted)"))
            .collect();
        lines.sort();

        let peer_name = self.peer.as_ref().map(UserId::as_str).unwrap_or("?");
        for message in snapshot.iter().filter(|m| !self.shown.contains(&m.id)) {
            lines.push(format_message(message, &self.me, peer_name, &self.zone));
        }

        self.shown = snapshot.iter().map(|m| m.id.clone()).collect();
        lines
    }
}

/// `[HH:MM:SS] label » text  #id`, with `«` marking right-to-left text.
pub fn format_message<Tz>(message: &Message, me: &UserId, peer_name: &str, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let time = message.created_at.with_timezone(zone).format("%H:%M:%S");
    let marker = match TextDirection::of(&message.text) {
        TextDirection::Rtl => '«',
        TextDirection::Ltr => '»',
    };
    format!(
        "[{time}] {} {marker} {}  #{}",
        sender_label(message, me, peer_name),
        message.text,
        message.id
    )
}
