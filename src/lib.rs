//! Client-side management of a signed-in user's notes.
//!
//! [`NotesClient`] keeps an ordered collection of notes in memory and writes the whole collection
//! to the user's remote document after every change. The remote store, the local cache and the
//! identity provider are traits, so the client runs natively on tokio or in the browser.
//!
//! ```
//! use notes_client::{NotesClient, store::MemoryDocumentStore};
//! use std::sync::Arc;
//!
//! # futures::executor::block_on(async {
//! let client = NotesClient::new(Arc::new(MemoryDocumentStore::new()));
//! client.load("user-1").await;
//!
//! let id = client.add("Groceries", "Milk, eggs").unwrap();
//! client.edit(&id, "Groceries", "Milk, eggs, bread");
//! client.flush().await;
//! assert_eq!(client.notes()[0].text, "Milk, eggs, bread");
//! # });
//! ```

pub mod api;
pub mod cache;
pub mod collection;
pub mod dispatch;
pub mod identity;
pub mod note;
pub mod option;
pub mod session;
pub mod store;
mod client;
mod util;

pub use client::{NotesClient, NotesClientError, SyncHandle, SyncOutcome};
pub use note::{Note, NoteId};
pub use option::NotesClientOptions;
pub use session::{SessionState, UserSession};
pub use util::callback;
