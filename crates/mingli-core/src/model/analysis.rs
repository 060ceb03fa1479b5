use serde::{Deserialize, Serialize};

use super::Entries;
use crate::error::Result;

/// The three divination methods offered by the service, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Bazi,
    Ziwei,
    Astrology,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 3] = [Self::Bazi, Self::Ziwei, Self::Astrology];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Bazi => "八字 BaZi",
            Self::Ziwei => "紫微 Zi Wei",
            Self::Astrology => "星盘 Astrology",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Bazi => 0,
            Self::Ziwei => 1,
            Self::Astrology => 2,
        }
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bazi => write!(f, "bazi"),
            Self::Ziwei => write!(f, "ziwei"),
            Self::Astrology => write!(f, "astrology"),
        }
    }
}

impl std::str::FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bazi" => Ok(Self::Bazi),
            "ziwei" => Ok(Self::Ziwei),
            "astrology" => Ok(Self::Astrology),
            _ => Err(format!("unknown analysis kind: {s}")),
        }
    }
}

/// Body of `POST /api/analysis/{kind}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub birth_info_id: i64,
    pub analysis_type: AnalysisKind,
}

/// The four pillars: year, month, day and hour stem-branch pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pillars {
    pub year: String,
    pub month: String,
    pub day: String,
    pub hour: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaziChart {
    pub bazi: Pillars,
    /// Five-element distribution: element → count.
    #[serde(default)]
    pub wuxing: Entries<u32>,
    #[serde(default)]
    pub analysis: Entries<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palace {
    #[serde(rename = "主星")]
    pub main_star: String,
    #[serde(rename = "副星", default)]
    pub minor_stars: Vec<String>,
    #[serde(rename = "位置")]
    pub position: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZiweiChart {
    /// Palace name → stars and branch position.
    pub mingpan: Entries<Palace>,
    #[serde(default)]
    pub analysis: Entries<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub sign: String,
    pub house: String,
    pub degree: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstrologyChart {
    pub sun_sign: String,
    pub moon_sign: String,
    pub rising_sign: String,
    #[serde(default)]
    pub planets: Entries<Placement>,
    /// House → life area. Not every backend sends it.
    #[serde(default)]
    pub houses: Entries<String>,
    #[serde(default)]
    pub analysis: Entries<String>,
}

/// A server-computed analysis. The shape depends on the kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Bazi(BaziChart),
    Ziwei(ZiweiChart),
    Astrology(AstrologyChart),
}

impl AnalysisResult {
    /// Decode a response body for the given kind.
    pub fn from_value(kind: AnalysisKind, value: serde_json::Value) -> Result<Self> {
        Ok(match kind {
            AnalysisKind::Bazi => Self::Bazi(serde_json::from_value(value)?),
            AnalysisKind::Ziwei => Self::Ziwei(serde_json::from_value(value)?),
            AnalysisKind::Astrology => Self::Astrology(serde_json::from_value(value)?),
        })
    }

    pub fn kind(&self) -> AnalysisKind {
        match self {
            Self::Bazi(_) => AnalysisKind::Bazi,
            Self::Ziwei(_) => AnalysisKind::Ziwei,
            Self::Astrology(_) => AnalysisKind::Astrology,
        }
    }

    /// Free-text reading: section title → paragraph.
    pub fn sections(&self) -> &Entries<String> {
        match self {
            Self::Bazi(c) => &c.analysis,
            Self::Ziwei(c) => &c.analysis,
            Self::Astrology(c) => &c.analysis,
        }
    }
}

/// A stored analysis from `GET /api/analysis/history/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisHistoryEntry {
    pub id: i64,
    pub birth_info_id: i64,
    pub analysis_type: AnalysisKind,
    #[serde(default)]
    pub analysis_result: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl AnalysisHistoryEntry {
    /// Decode the stored payload into a typed result.
    pub fn result(&self) -> Result<AnalysisResult> {
        AnalysisResult::from_value(self.analysis_type, self.analysis_result.clone())
    }
}
