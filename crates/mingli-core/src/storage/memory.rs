use std::sync::Mutex;

use super::UserStorage;
use crate::error::{MingliError, Result};
use crate::model::User;

/// In-process storage. Used by tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryUserStorage {
    slot: Mutex<Option<User>>,
}

impl MemoryUserStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(user: User) -> Self {
        Self {
            slot: Mutex::new(Some(user)),
        }
    }
}

impl UserStorage for MemoryUserStorage {
    fn load(&self) -> Result<Option<User>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| MingliError::Storage("session slot poisoned".into()))?;
        Ok(slot.clone())
    }

    fn save(&self, user: &User) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| MingliError::Storage("session slot poisoned".into()))?;
        *slot = Some(user.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| MingliError::Storage("session slot poisoned".into()))?;
        *slot = None;
        Ok(())
    }
}
