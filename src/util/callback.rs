//! Callbacks for authentication changes and collection updates.

use crate::{api::AuthUser, note::Note};
use parking_lot::Mutex;
use std::sync::Arc;

pub(crate) type OnAuthChangedInner = Box<dyn FnMut(Option<AuthUser>) + Send>;

/// The callback executed when the signed-in user changes. It takes [`Option<AuthUser>`](crate::api::AuthUser) as an argument,
/// `None` meaning the user signed out.
///
/// # Usage
/// ```
/// use notes_client::{api::AuthUser, callback::OnAuthChanged};
///
/// let on_auth_changed = OnAuthChanged::from(|user: Option<AuthUser>| {
///     // Show the notes page or the sign-in page
/// });
/// ```
#[derive(Clone)]
pub struct OnAuthChanged(pub(crate) Arc<Mutex<OnAuthChangedInner>>);

impl OnAuthChanged {
    pub(crate) fn call(&self, user: Option<AuthUser>) {
        (self.0.lock())(user)
    }
}

impl<F> From<F> for OnAuthChanged
where
    F: FnMut(Option<AuthUser>) + Send + 'static,
{
    fn from(f: F) -> Self {
        OnAuthChanged(Arc::new(Mutex::new(Box::new(f))))
    }
}

pub(crate) type OnNotesChangedInner = Box<dyn FnMut(&[Note]) + Send>;

/// The callback executed with a snapshot of the collection after every in-memory change.
///
/// # Usage
/// ```
/// use notes_client::{Note, callback::OnNotesChanged};
///
/// let on_notes_changed = OnNotesChanged::from(|notes: &[Note]| {
///     // Re-render the list
///     let _ = notes.len();
/// });
/// ```
#[derive(Clone)]
pub struct OnNotesChanged(pub(crate) Arc<Mutex<OnNotesChangedInner>>);

impl OnNotesChanged {
    pub(crate) fn call(&self, notes: &[Note]) {
        (self.0.lock())(notes)
    }
}

impl<F> From<F> for OnNotesChanged
where
    F: FnMut(&[Note]) + Send + 'static,
{
    fn from(f: F) -> Self {
        OnNotesChanged(Arc::new(Mutex::new(Box::new(f))))
    }
}
