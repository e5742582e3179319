//! In-memory user state store.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::warn;
use waypost_model::User;

/// One mutable record per tracked user, keyed by user id.
///
/// Records are created on first observation and live for the process
/// lifetime; eviction and persistence are host concerns (see the storage
/// crate's repositories and [`UserStore::hydrate`]).
#[derive(Debug, Default)]
pub struct UserStore {
    users: Mutex<HashMap<String, User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create the record for `user_id`.
    ///
    /// When a known user publishes from a new device the stored device id is
    /// updated in place and the change logged; it is log-worthy, not an
    /// error. Returns a working copy for the current message; callers write
    /// it back with [`UserStore::save`].
    pub fn resolve(&self, user_id: &str, device_id: &str) -> User {
        let mut users = self.users.lock().expect("user store mutex poisoned");
        match users.get_mut(user_id) {
            Some(user) => {
                if user.device_id != device_id {
                    warn!(
                        user = %user_id,
                        from = %user.device_id,
                        to = %device_id,
                        "device changed"
                    );
                    user.device_id = device_id.to_string();
                }
                user.clone()
            }
            None => {
                let user = User::new(user_id, device_id);
                users.insert(user_id.to_string(), user.clone());
                user
            }
        }
    }

    /// Write a processed record back.
    pub fn save(&self, user: User) {
        let mut users = self.users.lock().expect("user store mutex poisoned");
        users.insert(user.user_id.clone(), user);
    }

    pub fn get(&self, user_id: &str) -> Option<User> {
        let users = self.users.lock().expect("user store mutex poisoned");
        users.get(user_id).cloned()
    }

    /// All records, for persistence snapshots.
    pub fn list(&self) -> Vec<User> {
        let users = self.users.lock().expect("user store mutex poisoned");
        users.values().cloned().collect()
    }

    /// Replace the store contents, e.g. when hydrating from storage.
    pub fn hydrate(&self, records: Vec<User>) {
        let mut users = self.users.lock().expect("user store mutex poisoned");
        users.clear();
        users.extend(records.into_iter().map(|u| (u.user_id.clone(), u)));
    }

    /// Drop every record (administrative purge).
    pub fn purge(&self) {
        self.users
            .lock()
            .expect("user store mutex poisoned")
            .clear();
    }

    pub fn len(&self) -> usize {
        self.users.lock().expect("user store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
