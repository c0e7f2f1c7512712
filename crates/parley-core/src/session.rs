//! Conversation lifecycle for one current user and one selected peer.
//!
//! Remote work is split in two halves so several requests can be in flight
//! on a single event loop: `begin_*` updates local state and returns a ticket
//! describing the request to issue, `finish_*` reconciles the transport's
//! answer. Tickets remember which conversation (and, for loads, which
//! generation) they were issued for, and results that no longer match are
//! dropped. Nothing is inserted before the store confirms it. Sends and
//! deletes confirmed while a load is outstanding are replayed over its
//! result, since the fetch may have been answered before them.

use std::sync::Arc;

use parley_types::{ConversationKey, Message, MessageId, NewMessage, UserId};
use tracing::{debug, info, warn};

use crate::composer::{ComposerState, Interaction, InteractionSource, Region};
use crate::error::{Notice, Operation, TransportError};
use crate::menu::MenuState;
use crate::render::{RenderSink, ViewEvent};
use crate::store::{MessageStore, StoreChange};
use crate::transport::MessageTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No thread loaded.
    Idle,
    /// A history fetch is outstanding.
    Loading,
    /// The store reflects the selected thread.
    Ready,
}

/// Change confirmed by the store while a history fetch was outstanding.
/// The fetch may have been answered before it, so it is replayed on top.
#[derive(Debug, Clone)]
enum LocalEdit {
    Added(Message),
    Removed(MessageId),
}

/// Outstanding history fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    key: ConversationKey,
    user: UserId,
    peer: UserId,
}

impl LoadTicket {
    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn peer(&self) -> &UserId {
        &self.peer
    }

    pub fn key(&self) -> &ConversationKey {
        &self.key
    }
}

/// Outstanding message creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTicket {
    key: ConversationKey,
    /// Draft exactly as it was when the user pressed send.
    submitted: String,
    request: NewMessage,
}

impl SendTicket {
    pub fn request(&self) -> &NewMessage {
        &self.request
    }

    pub fn key(&self) -> &ConversationKey {
        &self.key
    }
}

/// Outstanding message deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTicket {
    key: ConversationKey,
    id: MessageId,
}

impl DeleteTicket {
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn key(&self) -> &ConversationKey {
        &self.key
    }
}

pub struct ConversationSession {
    current_user: UserId,
    peer: Option<UserId>,
    state: SessionState,
    /// Bumped on every peer change, reload and close. Loads carry it.
    generation: u64,
    /// Set once the selected thread has loaded at least once.
    loaded: bool,
    /// Confirmed sends and deletes since the outstanding load was issued.
    unsynced: Vec<LocalEdit>,
    store: MessageStore,
    composer: ComposerState,
    menu: MenuState,
    interactions: InteractionSource,
    last_notice: Option<Notice>,
    sink: Arc<dyn RenderSink>,
}

impl ConversationSession {
    pub fn new(current_user: UserId, sink: Arc<dyn RenderSink>) -> Self {
        Self {
            current_user,
            peer: None,
            state: SessionState::Idle,
            generation: 0,
            loaded: false,
            unsynced: Vec::new(),
            store: MessageStore::new(),
            composer: ComposerState::new(),
            menu: MenuState::new(),
            interactions: InteractionSource::new(),
            last_notice: None,
            sink,
        }
    }

    // -- Accessors --

    pub fn current_user(&self) -> &UserId {
        &self.current_user
    }

    pub fn peer(&self) -> Option<&UserId> {
        self.peer.as_ref()
    }

    pub fn key(&self) -> Option<ConversationKey> {
        self.peer
            .as_ref()
            .map(|peer| ConversationKey::new(self.current_user.clone(), peer.clone()))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn composer(&self) -> &ComposerState {
        &self.composer
    }

    pub fn menu(&self) -> &MenuState {
        &self.menu
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.last_notice.as_ref()
    }

    /// Handle for reporting pointer interactions to the emoji picker.
    pub fn interactions(&self) -> InteractionSource {
        self.interactions.clone()
    }

    // -- Conversation lifecycle --

    /// Switch to `peer`. Empties the store, closes overlays and returns the
    /// fetch to issue. Any load still in flight becomes stale.
    pub fn select_peer(&mut self, peer: UserId) -> LoadTicket {
        self.generation += 1;
        self.peer = Some(peer.clone());
        self.loaded = false;
        self.unsynced.clear();
        debug!(peer = %peer, generation = self.generation, "peer selected");

        self.reset_view();
        self.set_state(SessionState::Loading);

        LoadTicket {
            generation: self.generation,
            key: ConversationKey::new(self.current_user.clone(), peer.clone()),
            user: self.current_user.clone(),
            peer,
        }
    }

    /// Re-fetch the selected thread without clearing what is shown.
    pub fn reload(&mut self) -> Option<LoadTicket> {
        let peer = self.peer.clone()?;
        self.generation += 1;
        self.unsynced.clear();
        debug!(peer = %peer, generation = self.generation, "reloading thread");
        self.set_state(SessionState::Loading);

        Some(LoadTicket {
            generation: self.generation,
            key: ConversationKey::new(self.current_user.clone(), peer.clone()),
            user: self.current_user.clone(),
            peer,
        })
    }

    /// Close the conversation: discard messages, deselect the peer and
    /// invalidate outstanding loads.
    pub fn close(&mut self) {
        self.generation += 1;
        self.peer = None;
        self.loaded = false;
        self.unsynced.clear();
        debug!(generation = self.generation, "conversation closed");

        self.reset_view();
        self.set_state(SessionState::Idle);
    }

    /// Apply a history fetch result. Returns false if it was stale.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Message>, TransportError>,
    ) -> bool {
        if ticket.generation != self.generation {
            warn!(
                peer = %ticket.peer,
                generation = ticket.generation,
                current = self.generation,
                "discarding stale history response"
            );
            return false;
        }

        match result {
            Ok(messages) => {
                let fetched = messages.len();
                let messages: Vec<Message> = messages
                    .into_iter()
                    .filter(|m| {
                        let ours = m.belongs_to(&ticket.key);
                        if !ours {
                            warn!(id = %m.id, "dropping message from another thread");
                        }
                        ours
                    })
                    .collect();

                self.store.replace(messages);
                let replayed = self.unsynced.len();
                for edit in std::mem::take(&mut self.unsynced) {
                    match edit {
                        LocalEdit::Added(message) => self.store.append(message),
                        LocalEdit::Removed(id) => self.store.remove(&id),
                    };
                }
                self.loaded = true;
                info!(peer = %ticket.peer, fetched, replayed, kept = self.store.len(), "history loaded");
                self.emit_messages(StoreChange::Replaced { len: self.store.len() });

                let dangling = self.menu.target().is_some_and(|id| !self.store.contains(id));
                if dangling {
                    debug!("closing menu: its message is gone");
                    self.menu.close();
                    self.emit_menu();
                }
                self.set_state(SessionState::Ready);
            }
            Err(e) => {
                self.unsynced.clear();
                self.report(Operation::LoadHistory, &e);
                let back = if self.loaded { SessionState::Ready } else { SessionState::Idle };
                self.set_state(back);
            }
        }
        true
    }

    // -- Sending --

    /// Start sending the current draft. Returns `None` without issuing
    /// anything when no peer is selected or the draft is blank.
    pub fn begin_send(&mut self) -> Option<SendTicket> {
        let Some(peer) = self.peer.clone() else {
            debug!("send ignored: no conversation selected");
            return None;
        };
        let Some(text) = self.composer.trimmed() else {
            debug!("send ignored: blank draft");
            return None;
        };

        let request = NewMessage {
            sender: self.current_user.clone(),
            receiver: peer.clone(),
            text: text.to_string(),
        };
        Some(SendTicket {
            key: ConversationKey::new(self.current_user.clone(), peer),
            submitted: self.composer.draft().to_string(),
            request,
        })
    }

    /// Apply a creation result. Returns true if the message was confirmed.
    ///
    /// The confirmed message is shown only while its conversation is still
    /// selected. The draft is cleared only if it still holds what was sent.
    pub fn finish_send(&mut self, ticket: SendTicket, result: Result<Message, TransportError>) -> bool {
        match result {
            Ok(message) => {
                info!(id = %message.id, "message sent");

                if self.key().as_ref() == Some(&ticket.key) && message.belongs_to(&ticket.key) {
                    if self.state == SessionState::Loading {
                        self.unsynced.push(LocalEdit::Added(message.clone()));
                    }
                    let change = self.store.append(message);
                    if change.is_mutation() {
                        self.emit_messages(change);
                    } else {
                        debug!("send confirmation already applied");
                    }
                } else {
                    debug!(thread = %ticket.key, "send confirmed for an inactive conversation");
                }

                if self.composer.draft() == ticket.submitted {
                    self.composer.clear();
                    self.emit_composer();
                }
                true
            }
            Err(e) => {
                self.report(Operation::Send, &e);
                false
            }
        }
    }

    // -- Deleting --

    /// Start deleting `id` from the selected conversation.
    pub fn begin_delete(&mut self, id: MessageId) -> Option<DeleteTicket> {
        let Some(key) = self.key() else {
            debug!("delete ignored: no conversation selected");
            return None;
        };
        Some(DeleteTicket { key, id })
    }

    /// Start deleting whatever message the action menu is open for.
    pub fn begin_delete_selected(&mut self) -> Option<DeleteTicket> {
        let id = self.menu.target()?.clone();
        self.begin_delete(id)
    }

    /// Apply a deletion result. The action menu is closed either way.
    pub fn finish_delete(&mut self, ticket: DeleteTicket, result: Result<(), TransportError>) -> bool {
        let removed = match result {
            Ok(()) => {
                info!(id = %ticket.id, "message deleted");
                // Ids are unique across threads, so this is safe even if
                // the conversation changed meanwhile.
                if self.state == SessionState::Loading {
                    self.unsynced.push(LocalEdit::Removed(ticket.id.clone()));
                }
                let change = self.store.remove(&ticket.id);
                if change.is_mutation() {
                    self.emit_messages(change);
                }
                true
            }
            Err(e) => {
                self.report(Operation::Delete, &e);
                false
            }
        };

        if self.menu.close().is_some() {
            self.emit_menu();
        }
        removed
    }

    // -- Sequential helpers --

    /// Select `peer` and load its thread.
    pub async fn open<T: MessageTransport>(&mut self, peer: UserId, transport: &T) -> bool {
        let ticket = self.select_peer(peer);
        let result = transport.fetch_thread(&ticket.user, &ticket.peer).await;
        self.finish_load(ticket, result) && self.state == SessionState::Ready
    }

    /// Re-fetch the selected thread.
    pub async fn load_history<T: MessageTransport>(&mut self, transport: &T) -> bool {
        let Some(ticket) = self.reload() else {
            return false;
        };
        let result = transport.fetch_thread(&ticket.user, &ticket.peer).await;
        self.finish_load(ticket, result) && self.state == SessionState::Ready
    }

    /// Send the current draft.
    pub async fn send<T: MessageTransport>(&mut self, transport: &T) -> bool {
        let Some(ticket) = self.begin_send() else {
            return false;
        };
        let result = transport.create_message(ticket.request()).await;
        self.finish_send(ticket, result)
    }

    pub async fn delete<T: MessageTransport>(&mut self, id: MessageId, transport: &T) -> bool {
        let Some(ticket) = self.begin_delete(id) else {
            return false;
        };
        let result = transport.delete_message(ticket.id()).await;
        self.finish_delete(ticket, result)
    }

    // -- Composer --

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.composer.set_draft(text);
        self.emit_composer();
    }

    pub fn insert_emoji(&mut self, symbol: &str) {
        self.composer.insert_emoji(symbol);
        self.emit_composer();
    }

    pub fn toggle_picker(&mut self) -> bool {
        let open = self.composer.toggle_picker(&self.interactions);
        self.emit_composer();
        open
    }

    pub fn close_picker(&mut self) {
        if self.composer.close_picker() {
            self.emit_composer();
        }
    }

    /// Report a pointer interaction at `region`.
    pub fn interact(&mut self, region: Region) {
        self.interactions.emit(region);
        if self.composer.poll_interactions() {
            self.emit_composer();
        }
    }

    /// Resolves when the open picker sees an interaction outside itself.
    pub async fn outside_interaction(&mut self) -> Interaction {
        self.composer.outside_interaction().await
    }

    // -- Action menu --

    /// Open the action menu on one of the current user's messages.
    pub fn open_menu(&mut self, id: MessageId) -> bool {
        let own = self
            .store
            .get(&id)
            .is_some_and(|m| m.is_from(&self.current_user));
        if !own {
            debug!(id = %id, "menu refused: not an own message in this thread");
            return false;
        }
        self.menu.open_for(id);
        self.emit_menu();
        true
    }

    pub fn close_menu(&mut self) {
        if self.menu.close().is_some() {
            self.emit_menu();
        }
    }

    // -- Notices --

    pub fn dismiss_notice(&mut self) {
        if self.last_notice.take().is_some() {
            self.sink.notify(&ViewEvent::NoticeDismissed);
        }
    }

    // -- Internals --

    fn reset_view(&mut self) {
        let change = self.store.clear();
        self.emit_messages(change);
        if self.menu.close().is_some() {
            self.emit_menu();
        }
        if self.composer.close_picker() {
            self.emit_composer();
        }
    }

    fn report(&mut self, operation: Operation, error: &TransportError) {
        warn!(%operation, kind = ?error.kind(), "{}", error);
        let notice = Notice::from_error(operation, error);
        self.sink.notify(&ViewEvent::Notice(notice.clone()));
        self.last_notice = Some(notice);
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "session state");
        }
        self.state = state;
        self.sink.notify(&ViewEvent::Session {
            state,
            peer: self.peer.clone(),
        });
    }

    fn emit_messages(&self, change: StoreChange) {
        self.sink.notify(&ViewEvent::Messages {
            snapshot: self.store.snapshot(),
            scroll_to_newest: change.scroll_to_newest(),
        });
    }

    fn emit_composer(&self) {
        self.sink.notify(&ViewEvent::Composer {
            draft: self.composer.draft().to_string(),
            picker_open: self.composer.picker_open(),
            can_send: self.composer.can_send(),
        });
    }

    fn emit_menu(&self) {
        self.sink.notify(&ViewEvent::Menu {
            target: self.menu.target().cloned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};

    use crate::render::NullSink;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<ViewEvent>>,
    }

    impl RecordingSink {
        fn take(&self) -> Vec<ViewEvent> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }
    }

    impl RenderSink for RecordingSink {
        fn notify(&self, event: &ViewEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn message(id: &str, from: &str, to: &str, secs: i64) -> Message {
        Message {
            id: id.into(),
            sender: from.into(),
            receiver: to.into(),
            text: format!("text {id}"),
            created_at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        }
    }

    fn session() -> ConversationSession {
        ConversationSession::new("me".into(), Arc::new(NullSink))
    }

    fn ready_with(messages: Vec<Message>) -> ConversationSession {
        let mut s = session();
        let ticket = s.select_peer("p1".into());
        assert!(s.finish_load(ticket, Ok(messages)));
        s
    }

    #[test]
    fn test_select_peer_moves_to_loading() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::Idle);

        let ticket = s.select_peer("p1".into());
        assert_eq!(s.state(), SessionState::Loading);
        assert_eq!(ticket.user().as_str(), "me");
        assert_eq!(ticket.peer().as_str(), "p1");
        assert!(s.store().is_empty());

        s.finish_load(ticket, Ok(vec![message("a", "p1", "me", 1)]));
        assert_eq!(s.state(), SessionState::Ready);
        assert_eq!(s.store().len(), 1);
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let mut s = session();
        let first = s.select_peer("p1".into());
        let second = s.select_peer("p2".into());

        assert!(s.finish_load(second, Ok(vec![message("b", "p2", "me", 2)])));
        assert!(!s.finish_load(first, Ok(vec![message("a", "p1", "me", 1)])));

        let ids: Vec<&str> = s.store().all().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
        assert_eq!(s.peer().map(UserId::as_str), Some("p2"));
        assert_eq!(s.state(), SessionState::Ready);
    }

    #[test]
    fn test_stale_failure_does_not_report() {
        let mut s = session();
        let first = s.select_peer("p1".into());
        let _second = s.select_peer("p2".into());

        s.finish_load(first, Err(TransportError::Network("reset".into())));
        assert!(s.last_notice().is_none());
        assert_eq!(s.state(), SessionState::Loading);
    }

    #[test]
    fn test_initial_load_failure_returns_to_idle() {
        let mut s = session();
        let ticket = s.select_peer("p1".into());
        s.finish_load(ticket, Err(TransportError::Authentication("expired".into())));

        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.store().is_empty());
        let notice = s.last_notice().unwrap();
        assert_eq!(notice.operation, Operation::LoadHistory);
    }

    #[test]
    fn test_reload_failure_keeps_previous_messages() {
        let mut s = ready_with(vec![message("a", "me", "p1", 1)]);
        let ticket = s.reload().unwrap();
        assert_eq!(s.state(), SessionState::Loading);
        assert_eq!(s.store().len(), 1);

        s.finish_load(ticket, Err(TransportError::Network("timeout".into())));
        assert_eq!(s.state(), SessionState::Ready);
        assert_eq!(s.store().len(), 1);
    }

    #[test]
    fn test_load_drops_foreign_messages() {
        let s = ready_with(vec![message("a", "me", "p1", 1), message("x", "p9", "me", 2)]);
        assert_eq!(s.store().len(), 1);
        assert!(s.store().contains(&"a".into()));
    }

    #[test]
    fn test_blank_draft_never_sends() {
        let mut s = ready_with(vec![]);
        s.set_draft("   \n\t");
        assert!(s.begin_send().is_none());
        assert_eq!(s.composer().draft(), "   \n\t");
    }

    #[test]
    fn test_send_without_peer_is_ignored() {
        let mut s = session();
        s.set_draft("hello");
        assert!(s.begin_send().is_none());
    }

    #[test]
    fn test_send_trims_and_clears_on_success() {
        let mut s = ready_with(vec![]);
        s.set_draft("  hello  ");

        let ticket = s.begin_send().unwrap();
        assert_eq!(ticket.request().text, "hello");
        assert_eq!(ticket.request().sender.as_str(), "me");
        assert_eq!(ticket.request().receiver.as_str(), "p1");
        // Nothing shown before the store confirms.
        assert!(s.store().is_empty());

        let confirmed = message("m1", "me", "p1", 10);
        assert!(s.finish_send(ticket, Ok(confirmed.clone())));
        assert_eq!(s.store().all(), &[confirmed]);
        assert_eq!(s.composer().draft(), "");
    }

    #[test]
    fn test_failed_send_keeps_draft_and_store() {
        let mut s = ready_with(vec![message("a", "p1", "me", 1)]);
        s.set_draft("retry me");
        let before = s.store().snapshot();

        let ticket = s.begin_send().unwrap();
        assert!(!s.finish_send(ticket, Err(TransportError::Network("offline".into()))));

        assert_eq!(s.composer().draft(), "retry me");
        assert_eq!(s.store().all(), before.as_slice());
        assert_eq!(s.last_notice().unwrap().operation, Operation::Send);
    }

    #[test]
    fn test_draft_edited_during_send_is_kept() {
        let mut s = ready_with(vec![]);
        s.set_draft("first");
        let ticket = s.begin_send().unwrap();
        s.set_draft("first and more");

        s.finish_send(ticket, Ok(message("m1", "me", "p1", 1)));
        assert_eq!(s.composer().draft(), "first and more");
        assert_eq!(s.store().len(), 1);
    }

    #[test]
    fn test_send_confirmed_after_peer_change_is_not_shown() {
        let mut s = ready_with(vec![]);
        s.set_draft("for p1");
        let ticket = s.begin_send().unwrap();

        let load = s.select_peer("p2".into());
        s.finish_load(load, Ok(vec![]));
        s.finish_send(ticket, Ok(message("m1", "me", "p1", 1)));

        assert!(s.store().is_empty());
        assert_eq!(s.composer().draft(), "");
    }

    #[test]
    fn test_duplicate_confirmation_is_idempotent() {
        let mut s = ready_with(vec![]);
        s.set_draft("hello");
        let first = s.begin_send().unwrap();
        let second = first.clone();

        s.finish_send(first, Ok(message("m1", "me", "p1", 1)));
        s.finish_send(second, Ok(message("m1", "me", "p1", 1)));
        assert_eq!(s.store().len(), 1);
    }

    #[test]
    fn test_delete_open_menu_target() {
        let mut s = ready_with(vec![message("m1", "me", "p1", 1), message("m2", "p1", "me", 2)]);
        assert!(s.open_menu("m1".into()));

        let ticket = s.begin_delete_selected().unwrap();
        assert_eq!(ticket.id().as_str(), "m1");
        assert!(s.finish_delete(ticket, Ok(())));

        assert!(!s.store().contains(&"m1".into()));
        assert_eq!(s.menu().target(), None);
    }

    #[test]
    fn test_failed_delete_keeps_message_and_closes_menu() {
        let mut s = ready_with(vec![message("m1", "me", "p1", 1)]);
        s.open_menu("m1".into());

        let ticket = s.begin_delete_selected().unwrap();
        assert!(!s.finish_delete(ticket, Err(TransportError::NotFound("m1".into()))));

        assert!(s.store().contains(&"m1".into()));
        assert_eq!(s.menu().target(), None);
        assert_eq!(s.last_notice().unwrap().kind, crate::error::ErrorKind::NotFound);
    }

    #[test]
    fn test_delete_after_reload_removed_it() {
        let mut s = ready_with(vec![message("m1", "me", "p1", 1)]);
        let delete = s.begin_delete("m1".into()).unwrap();
        let reload = s.reload().unwrap();
        s.finish_load(reload, Ok(vec![]));

        assert!(s.finish_delete(delete, Ok(())));
        assert!(s.store().is_empty());
    }

    #[test]
    fn test_send_confirmed_before_slow_load_survives() {
        let mut s = session();
        let load = s.select_peer("p1".into());
        s.set_draft("hi");
        let send = s.begin_send().unwrap();

        assert!(s.finish_send(send, Ok(message("m1", "me", "p1", 10))));
        assert_eq!(s.composer().draft(), "");
        // Answered before the send reached the store.
        assert!(s.finish_load(load, Ok(vec![message("m0", "p1", "me", 1)])));

        let ids: Vec<&str> = s.store().all().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m0", "m1"]);
        assert_eq!(s.state(), SessionState::Ready);
    }

    #[test]
    fn test_delete_confirmed_before_slow_reload_stays_deleted() {
        let mut s = ready_with(vec![message("m1", "me", "p1", 1), message("m2", "p1", "me", 2)]);
        let reload = s.reload().unwrap();
        let delete = s.begin_delete("m1".into()).unwrap();
        assert!(s.finish_delete(delete, Ok(())));

        s.finish_load(reload, Ok(vec![message("m1", "me", "p1", 1), message("m2", "p1", "me", 2)]));
        let ids: Vec<&str> = s.store().all().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m2"]);
    }

    #[test]
    fn test_edits_are_not_replayed_over_later_loads() {
        let mut s = ready_with(vec![message("m1", "me", "p1", 1)]);
        let reload = s.reload().unwrap();
        let delete = s.begin_delete("m1".into()).unwrap();
        s.finish_delete(delete, Ok(()));
        s.finish_load(reload, Ok(vec![]));

        // The message came back on the store; a fresh reload shows it.
        let reload = s.reload().unwrap();
        s.finish_load(reload, Ok(vec![message("m1", "me", "p1", 1)]));
        assert!(s.store().contains(&"m1".into()));
    }

    #[test]
    fn test_reload_without_menu_target_closes_menu() {
        let sink = Arc::new(RecordingSink::default());
        let mut s = ConversationSession::new("me".into(), sink.clone());
        let load = s.select_peer("p1".into());
        s.finish_load(load, Ok(vec![message("m1", "me", "p1", 1)]));
        assert!(s.open_menu("m1".into()));
        sink.take();

        let reload = s.reload().unwrap();
        s.finish_load(reload, Ok(vec![]));
        assert!(s.store().is_empty());
        assert_eq!(s.menu().target(), None);
        assert!(sink.take().contains(&ViewEvent::Menu { target: None }));
        assert!(s.begin_delete_selected().is_none());
    }

    #[test]
    fn test_reload_keeping_menu_target_leaves_menu_open() {
        let mut s = ready_with(vec![message("m1", "me", "p1", 1)]);
        s.open_menu("m1".into());
        let reload = s.reload().unwrap();
        s.finish_load(reload, Ok(vec![message("m1", "me", "p1", 1)]));
        assert_eq!(s.menu().target(), Some(&"m1".into()));
    }

    #[test]
    fn test_menu_only_on_own_messages() {
        let mut s = ready_with(vec![message("m1", "me", "p1", 1), message("m2", "p1", "me", 2)]);
        assert!(!s.open_menu("m2".into()));
        assert!(!s.open_menu("nope".into()));
        assert!(s.open_menu("m1".into()));
    }

    #[test]
    fn test_peer_change_closes_overlays() {
        let mut s = ready_with(vec![message("m1", "me", "p1", 1)]);
        s.open_menu("m1".into());
        s.toggle_picker();
        s.set_draft("kept");

        s.select_peer("p2".into());
        assert_eq!(s.menu().target(), None);
        assert!(!s.composer().picker_open());
        assert_eq!(s.composer().draft(), "kept");
        assert_eq!(s.interactions().watchers(), 0);
    }

    #[test]
    fn test_close_invalidates_loads() {
        let mut s = session();
        let ticket = s.select_peer("p1".into());
        s.close();
        assert!(!s.finish_load(ticket, Ok(vec![message("a", "p1", "me", 1)])));
        assert!(s.store().is_empty());
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.peer(), None);
    }

    #[test]
    fn test_interaction_outside_picker() {
        let mut s = ready_with(vec![]);
        s.toggle_picker();
        s.interact(Region::EmojiPicker);
        assert!(s.composer().picker_open());
        s.interact(Region::MessageList);
        assert!(!s.composer().picker_open());
    }

    #[test]
    fn test_events_scroll_only_when_tail_grows() {
        let sink = Arc::new(RecordingSink::default());
        let mut s = ConversationSession::new("me".into(), sink.clone());
        let ticket = s.select_peer("p1".into());
        s.finish_load(ticket, Ok(vec![message("m1", "me", "p1", 5)]));
        sink.take();

        s.set_draft("hi");
        let send = s.begin_send().unwrap();
        s.finish_send(send, Ok(message("m2", "me", "p1", 9)));
        let delete = s.begin_delete("m1".into()).unwrap();
        s.finish_delete(delete, Ok(()));

        let scrolls: Vec<bool> = sink
            .take()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Messages { scroll_to_newest, .. } => Some(scroll_to_newest),
                _ => None,
            })
            .collect();
        assert_eq!(scrolls, vec![true, false]);
    }

    #[test]
    fn test_empty_thread_event() {
        let sink = Arc::new(RecordingSink::default());
        let mut s = ConversationSession::new("me".into(), sink.clone());
        let ticket = s.select_peer("p1".into());
        sink.take();
        s.finish_load(ticket, Ok(vec![]));

        let events = sink.take();
        assert!(events.contains(&ViewEvent::Messages {
            snapshot: vec![],
            scroll_to_newest: false
        }));
        assert!(events.contains(&ViewEvent::Session {
            state: SessionState::Ready,
            peer: Some("p1".into())
        }));
    }

    #[test]
    fn test_dismiss_notice() {
        let mut s = session();
        let ticket = s.select_peer("p1".into());
        s.finish_load(ticket, Err(TransportError::Network("down".into())));
        assert!(s.last_notice().is_some());
        s.dismiss_notice();
        assert!(s.last_notice().is_none());
    }
}
