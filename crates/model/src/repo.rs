//! Repository traits for user and fence persistence.
//! Implemented by the storage layer, allowing the domain to remain decoupled.

use crate::{Fence, User};

pub trait UserRepository: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn save(&self, user: &User) -> Result<(), Self::Error>;
    fn get(&self, user_id: &str) -> Result<User, Self::Error>;
    fn list(&self) -> Result<Vec<User>, Self::Error>;
    /// Remove every stored user record.
    fn purge(&self) -> Result<(), Self::Error>;
}

pub trait FenceRepository: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn save(&self, fence: &Fence) -> Result<(), Self::Error>;
    fn get(&self, name: &str) -> Result<Fence, Self::Error>;
    fn list(&self) -> Result<Vec<Fence>, Self::Error>;
    fn delete(&self, name: &str) -> Result<(), Self::Error>;
}
