//! Explicit routing of user interface events to client operations.
//!
//! The presentation layer owns an [`EventRouter`] and feeds it [`UiEvent`]s. The router depends
//! on [`NotesClient`]; the client knows nothing of the router.

use crate::{NotesClient, identity::IdentityProvider, note::NoteId};
use std::{collections::HashMap, fmt, sync::Arc};
#[cfg(feature = "tracing")]
use tracing::debug;

/// The kinds of events a handler can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SubmitForm,
    ClickOutsideForm,
    CloseModal,
    Archive,
    SignOut,
}

/// An event raised by the user interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// The new-note form was submitted.
    SubmitForm { title: String, text: String },
    /// The user clicked outside the open new-note form.
    ClickOutsideForm { title: String, text: String },
    /// The edit dialog of a note was closed.
    CloseModal {
        id: NoteId,
        title: String,
        text: String,
    },
    /// A note's archive action was clicked.
    Archive { id: NoteId },
    /// The sign-out button was clicked.
    SignOut,
}

impl UiEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            UiEvent::SubmitForm { .. } => EventKind::SubmitForm,
            UiEvent::ClickOutsideForm { .. } => EventKind::ClickOutsideForm,
            UiEvent::CloseModal { .. } => EventKind::CloseModal,
            UiEvent::Archive { .. } => EventKind::Archive,
            UiEvent::SignOut => EventKind::SignOut,
        }
    }
}

type Handler = Box<dyn FnMut(UiEvent) + Send>;

/// Table of event handlers, one per [`EventKind`].
#[derive(Default)]
pub struct EventRouter {
    handlers: HashMap<EventKind, Handler>,
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRouter")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router with the default handlers wired to `client`.
    ///
    /// Form submissions and outside clicks add a note, closing the dialog edits it and archiving
    /// deletes it. `SignOut` is only registered when a `provider` is given.
    pub fn for_client(client: NotesClient, provider: Option<Arc<dyn IdentityProvider>>) -> Self {
        let mut router = Self::new();

        let add_client = client.clone();
        router.register(EventKind::SubmitForm, move |event| {
            if let UiEvent::SubmitForm { title, text } = event {
                add_client.add(title, text);
            }
        });

        let outside_client = client.clone();
        router.register(EventKind::ClickOutsideForm, move |event| {
            if let UiEvent::ClickOutsideForm { title, text } = event {
                outside_client.add(title, text);
            }
        });

        let edit_client = client.clone();
        router.register(EventKind::CloseModal, move |event| {
            if let UiEvent::CloseModal { id, title, text } = event {
                edit_client.edit(&id, title, text);
            }
        });

        let delete_client = client.clone();
        router.register(EventKind::Archive, move |event| {
            if let UiEvent::Archive { id } = event {
                delete_client.delete(&id);
            }
        });

        if let Some(provider) = provider {
            router.register(EventKind::SignOut, move |_| {
                let task_client = client.clone();
                let provider = provider.clone();
                client.spawn_tracked(async move {
                    task_client.sign_out(provider.as_ref()).await;
                });
            });
        }

        router
    }

    /// Registers `handler` for `kind`, replacing any previous one.
    pub fn register<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(UiEvent) + Send + 'static,
    {
        self.handlers.insert(kind, Box::new(handler));
    }

    /// Removes the handler for `kind`. Returns whether one was registered.
    pub fn unregister(&mut self, kind: EventKind) -> bool {
        self.handlers.remove(&kind).is_some()
    }

    pub fn is_registered(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Hands `event` to its handler. Returns `false` if no handler is registered for its kind.
    pub fn dispatch(&mut self, event: UiEvent) -> bool {
        let kind = event.kind();
        match self.handlers.get_mut(&kind) {
            Some(handler) => {
                handler(event);
                true
            }
            None => {
                #[cfg(feature = "tracing")]
                debug!("No handler registered for {:?}", kind);
                false
            }
        }
    }
}
