use std::path::{Path, PathBuf};

use super::UserStorage;
use crate::config::MingliConfig;
use crate::error::{MingliError, Result};
use crate::model::User;

/// Stores the current user as a JSON file, by default
/// `~/.config/mingli/current_user.json`.
pub struct FileUserStorage {
    path: PathBuf,
}

impl FileUserStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &MingliConfig) -> Result<Self> {
        Ok(Self::new(config.session_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UserStorage for FileUserStorage {
    fn load(&self) -> Result<Option<User>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            MingliError::Storage(format!("failed to read {}: {e}", self.path.display()))
        })?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        let user = serde_json::from_str(&contents)?;
        Ok(Some(user))
    }

    fn save(&self, user: &User) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MingliError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        let json = serde_json::to_string_pretty(user)?;
        std::fs::write(&self.path, json).map_err(|e| {
            MingliError::Storage(format!("failed to write {}: {e}", self.path.display()))
        })
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|e| {
                MingliError::Storage(format!("failed to remove {}: {e}", self.path.display()))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("mingli-test-{}-{name}", std::process::id()))
            .join("current_user.json")
    }

    fn user() -> User {
        User {
            id: 42,
            wechat_openid: "mock_user_1".into(),
            nickname: "测试用户".into(),
            avatar_url: None,
        }
    }

    #[test]
    fn test_missing_file_is_logged_out() {
        let storage = FileUserStorage::new(scratch_path("missing"));
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_save_load_clear() {
        let path = scratch_path("roundtrip");
        let storage = FileUserStorage::new(&path);
        storage.save(&user()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(user()));

        storage.clear().unwrap();
        assert!(!path.exists());
        assert!(storage.load().unwrap().is_none());
        // Clearing twice is fine
        storage.clear().unwrap();
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let path = scratch_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        let storage = FileUserStorage::new(&path);
        assert!(storage.load().is_err());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
