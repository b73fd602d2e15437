use crate::adapters::http::openai::{DEFAULT_API_BASE, DEFAULT_EDIT_MODEL, DEFAULT_VISION_MODEL};
use crate::adapters::http::street_view::DEFAULT_STREET_VIEW_ENDPOINT;
use crate::core::store::DEFAULT_MAX_UPLOAD_BYTES;
use crate::utils::error::{DamageLabError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "damage-lab.toml";

pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const GOOGLE_MAPS_API_KEY_VAR: &str = "GOOGLE_MAPS_API_KEY";

/// 整個行程共用的設定，在 main 建立一次後明確傳給 client 與流程
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub service: ServiceConfig,
    pub maps: MapsConfig,
    pub store: StoreConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub edit_model: String,
    pub vision_model: String,
    pub temperature: f32,
    pub timeout_seconds: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            edit_model: DEFAULT_EDIT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            temperature: 0.0,
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapsConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub size: String,
    pub heading: f64,
    pub pitch: f64,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_STREET_VIEW_ENDPOINT.to_string(),
            api_key: None,
            size: "600x300".to_string(),
            heading: 151.78,
            pitch: -0.76,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub root: String,
    pub max_upload_bytes: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl LabConfig {
    /// 載入順序：指定的檔案 → 目前目錄的 damage-lab.toml → 預設值；最後補上環境變數
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };
        config.apply_env_fallbacks(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| DamageLabError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DamageLabError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})，找不到的保留原字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DamageLabError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 設定檔沒有提供（或是未展開的 `${...}`）的金鑰改由環境變數補上
    pub fn apply_env_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if !is_resolved(self.service.api_key.as_deref()) {
            self.service.api_key = lookup(OPENAI_API_KEY_VAR);
        }
        if !is_resolved(self.maps.api_key.as_deref()) {
            self.maps.api_key = lookup(GOOGLE_MAPS_API_KEY_VAR);
        }
        if self.service.api_base == DEFAULT_API_BASE {
            if let Some(base) = lookup(OPENAI_BASE_URL_VAR).filter(|base| !base.is_empty()) {
                self.service.api_base = base;
            }
        }
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

fn is_resolved(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.trim().is_empty() && !value.contains("${"))
}

impl Validate for LabConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("service.api_base", &self.service.api_base)?;
        validation::validate_non_empty_string("service.edit_model", &self.service.edit_model)?;
        validation::validate_non_empty_string("service.vision_model", &self.service.vision_model)?;
        validation::validate_range("service.temperature", self.service.temperature, 0.0, 2.0)?;
        if let Some(timeout) = self.service.timeout_seconds {
            validation::validate_range("service.timeout_seconds", timeout, 1, 3600)?;
        }

        validation::validate_url("maps.endpoint", &self.maps.endpoint)?;
        validation::validate_image_size("maps.size", &self.maps.size)?;
        validation::validate_range("maps.pitch", self.maps.pitch, -90.0, 90.0)?;
        if !(0.0..360.0).contains(&self.maps.heading) {
            return Err(DamageLabError::InvalidConfigValueError {
                field: "maps.heading".to_string(),
                value: self.maps.heading.to_string(),
                reason: "Heading must be in [0, 360)".to_string(),
            });
        }

        validation::validate_path("store.root", &self.store.root)?;
        if self.store.max_upload_bytes == 0 {
            return Err(DamageLabError::InvalidConfigValueError {
                field: "store.max_upload_bytes".to_string(),
                value: "0".to_string(),
                reason: "Value must be at least 1".to_string(),
            });
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}
