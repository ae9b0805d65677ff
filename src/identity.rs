//! Identity providers supplying the signed-in user.
//!
//! The provider is an external collaborator: it accepts credentials elsewhere and reports
//! the resulting user (or its absence) through [`OnAuthChanged`] callbacks.

use crate::{api::AuthUser, callback::OnAuthChanged};
#[cfg(not(target_family = "wasm"))]
use futures::future::BoxFuture;
#[cfg(target_family = "wasm")]
use futures::future::LocalBoxFuture;
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
#[cfg(feature = "tracing")]
use tracing::info;

#[cfg(not(target_family = "wasm"))]
pub type AuthFuture<'a, T> = BoxFuture<'a, T>;
#[cfg(target_family = "wasm")]
pub type AuthFuture<'a, T> = LocalBoxFuture<'a, T>;

/// Errors reported by an [`IdentityProvider`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The provider failed to end the session.
    #[error("Sign-out failed: {0}")]
    SignOut(String),
    /// The operation needs a signed-in user.
    #[error("No user is signed in")]
    NotAuthenticated,
}

/// Trait for the authentication service.
pub trait IdentityProvider: Send + Sync {
    /// Registers a callback invoked on every authentication change.
    ///
    /// The callback is also invoked once with the current state when it is registered.
    fn on_auth_changed(&self, callback: OnAuthChanged);

    /// Ends the current session with the provider.
    fn sign_out(&self) -> AuthFuture<'_, Result<(), AuthError>>;

    /// Returns the signed-in user, if any.
    fn current_user(&self) -> Option<AuthUser>;
}

#[derive(Default)]
struct ProviderState {
    user: Option<AuthUser>,
    callbacks: Vec<OnAuthChanged>,
}

/// In-process [`IdentityProvider`] where sign-in is driven by the host application.
///
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryIdentityProvider {
    state: Arc<Mutex<ProviderState>>,
    fail_sign_out: Arc<AtomicBool>,
}

impl std::fmt::Debug for MemoryIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryIdentityProvider")
            .field("user", &state.user)
            .field("callbacks", &state.callbacks.len())
            .finish()
    }
}

impl MemoryIdentityProvider {
    /// Creates a provider with nobody signed in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signs `user` in and notifies every registered callback.
    pub fn sign_in(&self, user: AuthUser) {
        #[cfg(feature = "tracing")]
        info!("User {} signed in", user.uid);
        self.state.lock().user = Some(user.clone());
        self.notify(Some(user));
    }

    /// Makes subsequent [`sign_out`](IdentityProvider::sign_out) calls fail.
    pub fn set_fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    fn notify(&self, user: Option<AuthUser>) {
        // Callbacks may call back into the provider, so they run without the lock held.
        let callbacks = self.state.lock().callbacks.clone();
        for callback in callbacks {
            callback.call(user.clone());
        }
    }
}

impl IdentityProvider for MemoryIdentityProvider {
    fn on_auth_changed(&self, callback: OnAuthChanged) {
        let user = {
            let mut state = self.state.lock();
            state.callbacks.push(callback.clone());
            state.user.clone()
        };
        callback.call(user);
    }

    fn sign_out(&self) -> AuthFuture<'_, Result<(), AuthError>> {
        Box::pin(async move {
            if self.fail_sign_out.load(Ordering::SeqCst) {
                return Err(AuthError::SignOut("sign-out rejected".to_string()));
            }
            let previous = self.state.lock().user.take();
            if previous.is_some() {
                #[cfg(feature = "tracing")]
                info!("User signed out");
                self.notify(None);
            }
            Ok(())
        })
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.state.lock().user.clone()
    }
}
