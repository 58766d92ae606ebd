// coursecart/src/session.rs

//! Process-wide sign-in state: auth tokens, the admin flag and the signed-in
//! user.
//!
//! Every read takes a whole [`SessionSnapshot`] under one lock, so an
//! outgoing request never pairs a new access token with a stale refresh
//! token or user. Writers replace the snapshot in one step and then run the
//! registered invalidation hooks outside the lock.

use crate::model::User;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{event, Level};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
  pub access_token: String,
  pub refresh_token: Option<String>,
  pub is_admin: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
  pub tokens: Option<SessionTokens>,
  pub user: Option<User>,
  /// Bumped on every write.
  pub generation: u64,
}

impl SessionSnapshot {
  pub fn bearer(&self) -> Option<String> {
    self.tokens.as_ref().map(|t| format!("Bearer {}", t.access_token))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
  /// Tokens were refreshed; the user is unchanged.
  TokensReplaced,
  SignedOut,
}

type InvalidationHook = Arc<dyn Fn(Invalidation) + Send + Sync + 'static>;

#[derive(Default)]
pub struct SessionStore {
  state: RwLock<SessionSnapshot>,
  hooks: RwLock<Vec<InvalidationHook>>,
}

impl std::fmt::Debug for SessionStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let state = self.state.read();
    f.debug_struct("SessionStore")
      .field("signed_in", &state.user.is_some())
      .field("generation", &state.generation)
      .field("hooks", &self.hooks.read().len())
      .finish()
  }
}

impl SessionStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn snapshot(&self) -> SessionSnapshot {
    self.state.read().clone()
  }

  pub fn token(&self) -> Option<String> {
    self.state.read().tokens.as_ref().map(|t| t.access_token.clone())
  }

  pub fn current_user(&self) -> Option<User> {
    self.state.read().user.clone()
  }

  pub fn is_admin(&self) -> bool {
    self.state.read().tokens.as_ref().map_or(false, |t| t.is_admin)
  }

  pub fn sign_in(&self, tokens: SessionTokens, user: User) {
    self.replace(|state| {
      state.tokens = Some(tokens);
      state.user = Some(user);
    });
    event!(Level::INFO, "Session started.");
  }

  /// Swaps in refreshed tokens, keeping the signed-in user.
  pub fn set_tokens(&self, tokens: SessionTokens) {
    self.replace(|state| state.tokens = Some(tokens));
    self.notify(Invalidation::TokensReplaced);
  }

  pub fn clear(&self) {
    self.replace(|state| {
      state.tokens = None;
      state.user = None;
    });
    event!(Level::INFO, "Session cleared.");
    self.notify(Invalidation::SignedOut);
  }

  /// Registers a hook run after tokens are replaced or the session is cleared.
  pub fn on_invalidate(&self, hook: impl Fn(Invalidation) + Send + Sync + 'static) {
    self.hooks.write().push(Arc::new(hook));
  }

  fn replace(&self, f: impl FnOnce(&mut SessionSnapshot)) {
    let mut state = self.state.write();
    f(&mut state);
    state.generation += 1;
  }

  fn notify(&self, why: Invalidation) {
    let hooks: Vec<InvalidationHook> = self.hooks.read().clone();
    for hook in hooks {
      hook(why);
    }
  }
}
