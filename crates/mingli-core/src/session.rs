//! The logged-in user, mirrored to durable storage.

use crate::api::ClientApi;
use crate::config::LoginConfig;
use crate::error::{MingliError, Result};
use crate::model::{CreateUserResponse, NewUser, User};
use crate::storage::UserStorage;

/// Raised when a user becomes available, either by login or by restore.
/// Subscribers react by loading that user's records.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    UserAvailable(User),
}

pub struct UserSession {
    storage: Box<dyn UserStorage>,
    login: LoginConfig,
    current: Option<User>,
}

impl UserSession {
    pub fn new(storage: Box<dyn UserStorage>, login: LoginConfig) -> Self {
        Self {
            storage,
            login,
            current: None,
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.current.as_ref().map(|u| u.id)
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }

    /// Adopt the persisted user, if any. The identity is trusted as stored;
    /// the server is not asked whether it still exists.
    pub fn restore(&mut self) -> Option<SessionEvent> {
        match self.storage.load() {
            Ok(Some(user)) => {
                tracing::debug!(user_id = user.id, "restored session");
                self.set_user(user.clone());
                Some(SessionEvent::UserAvailable(user))
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("ignoring unreadable session: {e}");
                None
            }
        }
    }

    /// Synthesize the identity sent to the create-user endpoint.
    pub fn pseudo_identity(&self) -> NewUser {
        NewUser::pseudo(
            &self.login.nickname,
            self.login.avatar_url.as_deref(),
            chrono::Utc::now(),
        )
    }

    /// Finish a login once the create-user call has answered. Persists the
    /// user before adopting it; any failure leaves memory and storage as
    /// they were.
    pub fn complete_login(
        &mut self,
        new_user: NewUser,
        response: Result<CreateUserResponse>,
    ) -> Result<SessionEvent> {
        let response = response.map_err(|e| MingliError::Login(e.to_string()))?;
        let id = match response {
            CreateUserResponse {
                success: true,
                user_id: Some(id),
            } => id,
            _ => return Err(MingliError::Login("server refused to create user".into())),
        };

        let user = User::from_new(id, new_user);
        self.storage
            .save(&user)
            .map_err(|e| MingliError::Login(format!("could not persist session: {e}")))?;
        self.set_user(user.clone());
        Ok(SessionEvent::UserAvailable(user))
    }

    /// Create a pseudo user on the server and adopt it.
    pub async fn login(&mut self, api: &impl ClientApi) -> Result<SessionEvent> {
        let new_user = self.pseudo_identity();
        let response = api.create_user(&new_user).await;
        self.complete_login(new_user, response)
    }

    /// Forget the user. Memory is cleared even when storage cannot be.
    pub fn logout(&mut self) -> Result<()> {
        self.clear_user();
        self.storage.clear()
    }

    fn set_user(&mut self, user: User) {
        self.current = Some(user);
    }

    fn clear_user(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryUserStorage;
    use crate::testing::{self, FakeApi};

    struct BrokenStorage;

    impl UserStorage for BrokenStorage {
        fn load(&self) -> Result<Option<User>> {
            Err(MingliError::Storage("unreadable".into()))
        }
        fn save(&self, _user: &User) -> Result<()> {
            Err(MingliError::Storage("read-only".into()))
        }
        fn clear(&self) -> Result<()> {
            Err(MingliError::Storage("read-only".into()))
        }
    }

    fn session(storage: impl UserStorage + 'static) -> UserSession {
        UserSession::new(Box::new(storage), LoginConfig::default())
    }

    #[test]
    fn test_restore_with_nothing_stored() {
        let mut session = session(MemoryUserStorage::new());
        assert!(session.restore().is_none());
        assert!(!session.is_logged_in());
    }

    #[test]
    fn test_restore_adopts_stored_user() {
        let mut session = session(MemoryUserStorage::with_user(testing::user(4)));
        let event = session.restore();
        assert_eq!(event, Some(SessionEvent::UserAvailable(testing::user(4))));
        assert_eq!(session.user_id(), Some(4));
    }

    #[test]
    fn test_restore_treats_unreadable_storage_as_absent() {
        let mut session = session(BrokenStorage);
        assert!(session.restore().is_none());
        assert!(session.current_user().is_none());
    }

    #[test]
    fn test_pseudo_identity_uses_configured_nickname() {
        let session = UserSession::new(
            Box::new(MemoryUserStorage::new()),
            LoginConfig {
                nickname: "Ann".into(),
                avatar_url: None,
            },
        );
        let new_user = session.pseudo_identity();
        assert!(new_user.wechat_openid.starts_with("mock_user_"));
        assert_eq!(new_user.nickname, "Ann");
        assert!(new_user.avatar_url.is_none());
    }

    #[tokio::test]
    async fn test_login_persists_user() {
        let api = FakeApi::new();
        let mut session = session(MemoryUserStorage::new());
        let SessionEvent::UserAvailable(user) = session.login(&api).await.unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(session.user_id(), Some(1));
        assert_eq!(api.count("create_user"), 1);
        // A fresh start finds the same user
        assert_eq!(session.storage.load().unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_login_network_failure_changes_nothing() {
        let api = FakeApi::new();
        api.set_fail_login(true);
        let mut session = session(MemoryUserStorage::new());
        let err = session.login(&api).await.unwrap_err();
        assert!(matches!(err, MingliError::Login(_)));
        assert!(session.current_user().is_none());
        assert!(session.storage.load().unwrap().is_none());
    }

    #[test]
    fn test_login_refused_by_server() {
        let mut session = session(MemoryUserStorage::new());
        let new_user = session.pseudo_identity();
        let refused = CreateUserResponse {
            success: false,
            user_id: None,
        };
        assert!(session.complete_login(new_user.clone(), Ok(refused)).is_err());

        let missing_id = CreateUserResponse {
            success: true,
            user_id: None,
        };
        assert!(session.complete_login(new_user, Ok(missing_id)).is_err());
        assert!(!session.is_logged_in());
    }

    #[test]
    fn test_login_unpersistable_user_is_not_adopted() {
        let mut session = session(BrokenStorage);
        let new_user = session.pseudo_identity();
        let ok = CreateUserResponse {
            success: true,
            user_id: Some(9),
        };
        let err = session.complete_login(new_user, Ok(ok)).unwrap_err();
        assert!(matches!(err, MingliError::Login(_)));
        assert!(!session.is_logged_in());
    }

    #[test]
    fn test_logout_clears_memory_and_storage() {
        let mut session = session(MemoryUserStorage::with_user(testing::user(2)));
        session.restore();
        session.logout().unwrap();
        assert!(!session.is_logged_in());
        assert!(session.storage.load().unwrap().is_none());
    }

    #[test]
    fn test_logout_clears_memory_when_storage_fails() {
        let mut session = session(BrokenStorage);
        session.set_user(testing::user(2));
        assert!(session.logout().is_err());
        assert!(!session.is_logged_in());
    }
}
