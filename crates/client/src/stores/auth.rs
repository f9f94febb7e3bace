use futures_channel::mpsc::UnboundedReceiver;
use teamspace_shared::User;

use super::Store;

/// The signed-in user, if any.
///
/// Written by the auth bindings: set after login or a successful `me`, cleared
/// on logout and when `me` answers 401. Session expiry is only ever inferred
/// from that 401.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthStore {
    user: Store<Option<User>>,
}

impl AuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<User> {
        self.user.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.get().is_some()
    }

    pub fn set_user(&self, user: User) {
        crate::log_info!("signed in as {}", user.email);
        self.user.set(Some(user));
    }

    pub fn clear(&self) {
        if self.is_authenticated() {
            crate::log_info!("signed out");
        }
        self.user.set(None);
    }

    pub fn changes(&self) -> UnboundedReceiver<Option<User>> {
        self.user.changes()
    }

    /// Underlying store, for the hook layer.
    pub fn store(&self) -> &Store<Option<User>> {
        &self.user
    }
}
