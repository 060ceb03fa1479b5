use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The logged-in account. One per client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub wechat_openid: String,
    pub nickname: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl User {
    pub fn from_new(id: i64, new_user: NewUser) -> Self {
        Self {
            id,
            wechat_openid: new_user.wechat_openid,
            nickname: new_user.nickname,
            avatar_url: new_user.avatar_url,
        }
    }
}

/// Body of `POST /api/users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub wechat_openid: String,
    pub nickname: String,
    pub avatar_url: Option<String>,
}

impl NewUser {
    /// Stand-in identity used instead of a real identity-provider login.
    /// The openid is unique per millisecond: `mock_user_<unix millis>`.
    pub fn pseudo(nickname: &str, avatar_url: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            wechat_openid: format!("mock_user_{}", now.timestamp_millis()),
            nickname: nickname.to_string(),
            avatar_url: avatar_url.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUserResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user_id: Option<i64>,
}
