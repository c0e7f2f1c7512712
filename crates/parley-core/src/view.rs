//! Single-task event loop around a [`ConversationSession`].
//!
//! User commands arrive over an unbounded channel; transport requests run
//! concurrently in a `FuturesUnordered` on the same task. Every mutation
//! happens inside the loop, one event at a time, so no locking is needed.
//! Finished requests are applied before newer commands.

use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use parley_types::{Message, MessageId, UserId};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::composer::Region;
use crate::error::TransportError;
use crate::session::{ConversationSession, DeleteTicket, LoadTicket, SendTicket};
use crate::transport::MessageTransport;

/// Everything a front end can ask the conversation view to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    SelectPeer(UserId),
    Reload,
    SetDraft(String),
    InsertEmoji(String),
    TogglePicker,
    ClosePicker,
    Interaction(Region),
    Send,
    OpenMenu(MessageId),
    CloseMenu,
    DeleteSelected,
    DismissNotice,
    Close,
    Shutdown,
}

enum Completion {
    Loaded(LoadTicket, Result<Vec<Message>, TransportError>),
    Sent(SendTicket, Result<Message, TransportError>),
    Deleted(DeleteTicket, Result<(), TransportError>),
}

/// Sending side of a running view.
#[derive(Clone)]
pub struct ViewHandle {
    tx: mpsc::UnboundedSender<UiCommand>,
}

impl ViewHandle {
    /// Queue a command. Returns false once the view has stopped.
    pub fn send(&self, command: UiCommand) -> bool {
        self.tx.send(command).is_ok()
    }
}

pub struct ConversationView<T> {
    session: ConversationSession,
    transport: Arc<T>,
    commands: mpsc::UnboundedReceiver<UiCommand>,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
}

impl<T: MessageTransport + 'static> ConversationView<T> {
    pub fn new(session: ConversationSession, transport: Arc<T>) -> (Self, ViewHandle) {
        let (tx, commands) = mpsc::unbounded_channel();
        let view = Self {
            session,
            transport,
            commands,
            in_flight: FuturesUnordered::new(),
        };
        (view, ViewHandle { tx })
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn pending_requests(&self) -> usize {
        self.in_flight.len()
    }

    /// Run until `Shutdown` or until every handle is dropped. Requests still
    /// in flight are abandoned. Returns the session for inspection.
    pub async fn run(mut self) -> ConversationSession {
        info!(user = %self.session.current_user(), "conversation view started");

        loop {
            tokio::select! {
                biased;

                Some(done) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.complete(done);
                }
                _ = self.session.outside_interaction() => {
                    self.session.close_picker();
                }
                command = self.commands.recv() => match command {
                    Some(UiCommand::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
            }
        }

        if !self.in_flight.is_empty() {
            debug!(abandoned = self.in_flight.len(), "dropping unfinished requests");
        }
        info!("conversation view stopped");
        self.session
    }

    /// Apply one command. Remote work is queued, not awaited.
    pub fn apply(&mut self, command: UiCommand) {
        match command {
            UiCommand::SelectPeer(peer) => {
                let ticket = self.session.select_peer(peer);
                self.spawn_load(ticket);
            }
            UiCommand::Reload => {
                if let Some(ticket) = self.session.reload() {
                    self.spawn_load(ticket);
                }
            }
            UiCommand::SetDraft(text) => self.session.set_draft(text),
            UiCommand::InsertEmoji(symbol) => self.session.insert_emoji(&symbol),
            UiCommand::TogglePicker => {
                self.session.toggle_picker();
            }
            UiCommand::ClosePicker => self.session.close_picker(),
            UiCommand::Interaction(region) => self.session.interact(region),
            UiCommand::Send => {
                if let Some(ticket) = self.session.begin_send() {
                    let transport = Arc::clone(&self.transport);
                    self.in_flight.push(Box::pin(async move {
                        let result = transport.create_message(ticket.request()).await;
                        Completion::Sent(ticket, result)
                    }));
                }
            }
            UiCommand::OpenMenu(id) => {
                self.session.open_menu(id);
            }
            UiCommand::CloseMenu => self.session.close_menu(),
            UiCommand::DeleteSelected => {
                if let Some(ticket) = self.session.begin_delete_selected() {
                    let transport = Arc::clone(&self.transport);
                    self.in_flight.push(Box::pin(async move {
                        let result = transport.delete_message(ticket.id()).await;
                        Completion::Deleted(ticket, result)
                    }));
                }
            }
            UiCommand::DismissNotice => self.session.dismiss_notice(),
            UiCommand::Close => self.session.close(),
            UiCommand::Shutdown => {}
        }
    }

    fn spawn_load(&mut self, ticket: LoadTicket) {
        let transport = Arc::clone(&self.transport);
        self.in_flight.push(Box::pin(async move {
            let result = transport.fetch_thread(ticket.user(), ticket.peer()).await;
            Completion::Loaded(ticket, result)
        }));
    }

    fn complete(&mut self, done: Completion) {
        match done {
            Completion::Loaded(ticket, result) => {
                self.session.finish_load(ticket, result);
            }
            Completion::Sent(ticket, result) => {
                self.session.finish_send(ticket, result);
            }
            Completion::Deleted(ticket, result) => {
                self.session.finish_delete(ticket, result);
            }
        }
    }
}
