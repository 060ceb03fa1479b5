mod file;
mod memory;

pub use file::FileUserStorage;
pub use memory::MemoryUserStorage;

use crate::error::Result;
use crate::model::User;

/// Durable client storage for the single logged-in user.
///
/// Presence of a stored user means "logged in" on the next start.
pub trait UserStorage: Send + Sync {
    fn load(&self) -> Result<Option<User>>;

    fn save(&self, user: &User) -> Result<()>;

    /// Remove the stored user. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;
}
