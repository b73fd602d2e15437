use crate::utils::error::{DamageLabError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// 損壞等級 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct DamageLevel(u8);

impl DamageLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self> {
        Self::try_from(i64::from(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Minor wear and tear",
            2 => "Moderate damage",
            3 => "Heavy damage",
            4 => "Severe damage",
            _ => "Catastrophic destruction",
        }
    }

    pub fn all() -> impl Iterator<Item = DamageLevel> {
        (Self::MIN..=Self::MAX).map(DamageLevel)
    }
}

impl TryFrom<i64> for DamageLevel {
    type Error = DamageLabError;

    fn try_from(value: i64) -> Result<Self> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(DamageLabError::InvalidDamageLevelError { value })
        }
    }
}

impl From<DamageLevel> for u8 {
    fn from(level: DamageLevel) -> Self {
        level.0
    }
}

impl fmt::Display for DamageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DamageLevel {
    type Err = DamageLabError;

    fn from_str(s: &str) -> Result<Self> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|_| DamageLabError::InvalidConfigValueError {
                field: "damage_level".to_string(),
                value: s.to_string(),
                reason: "Damage level must be an integer".to_string(),
            })?;
        Self::try_from(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Original,
    Damaged,
    Restored,
    /// 街景抓取的原始圖
    Base,
}

impl Stage {
    pub fn dir_name(self) -> &'static str {
        match self {
            Stage::Original => "images",
            Stage::Damaged => "damaged_images",
            Stage::Restored => "restored_images",
            Stage::Base => "base_images",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Original => "original",
            Stage::Damaged => "damaged",
            Stage::Restored => "restored",
            Stage::Base => "base",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(Uuid);

impl ArtifactId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl std::str::FromStr for ArtifactId {
    type Err = DamageLabError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| DamageLabError::InvalidConfigValueError {
                field: "id".to_string(),
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

/// index 的主鍵：同一個 id 在不同階段代表同一張照片
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactKey {
    pub id: ArtifactId,
    pub stage: Stage,
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.id, self.stage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageArtifact {
    pub id: ArtifactId,
    pub stage: Stage,
    /// 相對於 store root 的路徑
    pub path: PathBuf,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_level: Option<DamageLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ArtifactKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ImageArtifact {
    pub fn key(&self) -> ArtifactKey {
        ArtifactKey {
            id: self.id,
            stage: self.stage,
        }
    }
}

/// 使用者上傳的檔案
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub damage_description: String,
    pub damage_level: DamageLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    pub original: ImageArtifact,
    pub restored: ImageArtifact,
    pub assessment: Assessment,
    /// 服務回傳的原始文字，未經修改
    pub raw_response: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DamageReport {
    pub original: ImageArtifact,
    pub damaged: ImageArtifact,
    pub level: DamageLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum CycleMode {
    /// 上傳的是完好的建築：先破壞再修復
    PreDamage,
    /// 上傳的是已損壞的建築：先修復再破壞
    PostDamage,
}

impl fmt::Display for CycleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleMode::PreDamage => f.write_str("pre-damage"),
            CycleMode::PostDamage => f.write_str("post-damage"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub mode: CycleMode,
    pub level: DamageLevel,
    pub original: ImageArtifact,
    pub damaged: ImageArtifact,
    pub restored: ImageArtifact,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreetViewReport {
    pub location: String,
    pub street_view: ImageArtifact,
    pub restored: ImageArtifact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_level_bounds() {
        assert!(DamageLevel::new(0).is_err());
        assert!(DamageLevel::new(6).is_err());
        assert_eq!(DamageLevel::new(3).unwrap().value(), 3);
        assert_eq!(DamageLevel::all().count(), 5);
        assert_eq!(DamageLevel::new(5).unwrap().label(), "Catastrophic destruction");
    }

    #[test]
    fn test_damage_level_serde_uses_plain_integer() {
        let level: DamageLevel = serde_json::from_str("4").unwrap();
        assert_eq!(level.value(), 4);
        assert_eq!(serde_json::to_string(&level).unwrap(), "4");

        assert!(serde_json::from_str::<DamageLevel>("9").is_err());
        assert!(serde_json::from_str::<DamageLevel>("-1").is_err());
    }

    #[test]
    fn test_damage_level_from_str() {
        assert_eq!("2".parse::<DamageLevel>().unwrap().value(), 2);
        assert!("seven".parse::<DamageLevel>().is_err());
        assert!("7".parse::<DamageLevel>().is_err());
    }

    #[test]
    fn test_stage_directories() {
        assert_eq!(Stage::Original.dir_name(), "images");
        assert_eq!(Stage::Damaged.dir_name(), "damaged_images");
        assert_eq!(Stage::Restored.dir_name(), "restored_images");
        assert_eq!(Stage::Base.dir_name(), "base_images");
    }

    #[test]
    fn test_artifact_id_round_trips_through_display() {
        let id = ArtifactId::generate();
        let parsed: ArtifactId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_malformed_artifact_id_is_invalid_value() {
        match "not-a-uuid".parse::<ArtifactId>() {
            Err(DamageLabError::InvalidConfigValueError { field, value, .. }) => {
                assert_eq!(field, "id");
                assert_eq!(value, "not-a-uuid");
            }
            other => panic!("expected invalid id error, got {:?}", other),
        }
    }
}
