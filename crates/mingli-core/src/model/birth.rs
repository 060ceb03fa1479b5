use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{MingliError, Result};

pub const MAX_NICKNAME_LENGTH: usize = 64;
pub const MAX_PLACE_LENGTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Label shown next to a record.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Male => "男",
            Self::Female => "女",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Male => Self::Female,
            Self::Female => Self::Male,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => write!(f, "male"),
            Self::Female => write!(f, "female"),
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "男" => Ok(Self::Male),
            "female" | "f" | "女" => Ok(Self::Female),
            _ => Err(format!("unknown gender: {s}")),
        }
    }
}

/// A person whose birth data is analysed. Owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthRecord {
    pub id: i64,
    pub user_id: i64,
    pub nickname: String,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    #[serde(with = "birth_time")]
    pub birth_time: NaiveTime,
    #[serde(default)]
    pub birth_place: Option<String>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// The editable part of a birth record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthDraft {
    pub nickname: String,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    #[serde(with = "birth_time")]
    pub birth_time: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
}

impl BirthDraft {
    pub fn from_record(record: &BirthRecord) -> Self {
        Self {
            nickname: record.nickname.clone(),
            gender: record.gender,
            birth_date: record.birth_date,
            birth_time: record.birth_time,
            birth_place: record.birth_place.clone(),
            longitude: record.longitude,
            latitude: record.latitude,
        }
    }

    /// Form-level requiredness only; the server decides everything else.
    pub fn validate(&self) -> Result<()> {
        let nickname = self.nickname.trim();
        if nickname.is_empty() {
            return Err(MingliError::Validation("nickname cannot be empty".into()));
        }
        if nickname.chars().count() > MAX_NICKNAME_LENGTH {
            return Err(MingliError::Validation(format!(
                "nickname exceeds maximum length of {MAX_NICKNAME_LENGTH} characters"
            )));
        }
        if let Some(ref place) = self.birth_place {
            if place.chars().count() > MAX_PLACE_LENGTH {
                return Err(MingliError::Validation(format!(
                    "birth place exceeds maximum length of {MAX_PLACE_LENGTH} characters"
                )));
            }
        }
        Ok(())
    }

    /// Trim text fields and drop an empty birth place.
    pub fn normalized(mut self) -> Self {
        self.nickname = self.nickname.trim().to_string();
        self.birth_place = self
            .birth_place
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        self
    }
}

/// Body of `POST /api/birth-info`: the draft plus its owner.
#[derive(Debug, Serialize)]
pub struct NewBirthRecord<'a> {
    pub user_id: i64,
    #[serde(flatten)]
    pub draft: &'a BirthDraft,
}

/// `{success}` acknowledgement returned by every mutation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MutationResponse {
    #[serde(default = "default_true")]
    pub success: bool,
}

fn default_true() -> bool {
    true
}

/// Parse a date typed by a user: `YYYY-MM-DD`.
pub fn parse_birth_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| MingliError::Validation(format!("invalid birth date '{s}', use YYYY-MM-DD")))
}

/// Parse a time typed by a user: `HH:MM` or `HH:MM:SS`.
pub fn parse_birth_time(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| MingliError::Validation(format!("invalid birth time '{s}', use HH:MM")))
}

/// Birth times travel as `HH:MM:SS`. Some backends send a TIME column as a
/// number of seconds since midnight, so that is accepted too.
mod birth_time {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTime {
        Text(String),
        Seconds(f64),
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!(
            "{:02}:{:02}:{:02}",
            time.hour(),
            time.minute(),
            time.second()
        ))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        match RawTime::deserialize(deserializer)? {
            RawTime::Text(s) => super::parse_birth_time(&s).map_err(serde::de::Error::custom),
            RawTime::Seconds(secs) => {
                let secs = secs as u32 % 86_400;
                NaiveTime::from_num_seconds_from_midnight_opt(secs, 0)
                    .ok_or_else(|| serde::de::Error::custom("birth time out of range"))
            }
        }
    }
}
