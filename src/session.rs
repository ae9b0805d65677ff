use crate::api::AuthUser;

/// The signed-in user the collection belongs to.
///
/// A session starts when the identity provider reports a user and ends on sign-out.
/// Every session gets a new `generation` so results issued for an older session can be told apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    /// Key of the user's document.
    pub user_id: String,
    /// Name shown while signed in.
    pub display_name: String,
    pub(crate) generation: u64,
}

impl UserSession {
    pub(crate) fn new(user: AuthUser, generation: u64) -> Self {
        Self {
            user_id: user.uid,
            display_name: user.display_name,
            generation,
        }
    }
}

/// Lifecycle of the client.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Nobody is signed in.
    #[default]
    Unauthenticated,
    /// A user is signed in and their document is being fetched.
    Loading,
    /// The user's document has been applied to the collection.
    Ready,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, SessionState::Unauthenticated)
    }
}
