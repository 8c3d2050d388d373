//! Account identities, the role policy table, and the store registry consulted by the shift
//! workflow. Account management itself lives outside this service; the directory only answers
//! lookups.

mod identity;
pub mod policy;
mod stores;
mod users;

pub use identity::{resolve_actor, IdentityError, ACTOR_HEADER};
pub use policy::Permission;
pub use stores::{Store, StoreId};
pub use users::{Role, User, UserId};

/// Read-only view over the user store and the store registry.
pub trait Directory: Send + Sync {
    fn user(&self, id: UserId) -> Result<Option<User>, DirectoryError>;
    fn users(&self) -> Result<Vec<User>, DirectoryError>;
    fn store(&self, id: StoreId) -> Result<Option<Store>, DirectoryError>;
    fn stores(&self) -> Result<Vec<Store>, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
    #[error("invalid directory seed: {0}")]
    InvalidSeed(String),
}
