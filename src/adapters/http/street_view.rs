use crate::config::toml_config::MapsConfig;
use crate::domain::ports::MapImagery;
use crate::utils::error::{DamageLabError, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

pub const DEFAULT_STREET_VIEW_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/streetview";

#[derive(Debug, Clone)]
pub struct StreetViewClient {
    http: Client,
    config: MapsConfig,
}

impl StreetViewClient {
    pub fn new(config: MapsConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    /// 組出街景圖的網址；location 會被正確編碼
    pub fn format_url(&self, location: &str) -> Result<Url> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| DamageLabError::MissingConfigError {
                field: "maps.api_key (GOOGLE_MAPS_API_KEY)".to_string(),
            })?;

        let mut url = Url::parse(&self.config.endpoint).map_err(|e| {
            DamageLabError::InvalidConfigValueError {
                field: "maps.endpoint".to_string(),
                value: self.config.endpoint.clone(),
                reason: e.to_string(),
            }
        })?;

        url.query_pairs_mut()
            .append_pair("size", &self.config.size)
            .append_pair("location", location)
            .append_pair("heading", &self.config.heading.to_string())
            .append_pair("pitch", &self.config.pitch.to_string())
            .append_pair("key", api_key);

        Ok(url)
    }
}

#[async_trait]
impl MapImagery for StreetViewClient {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        let url = self.format_url(location)?;
        tracing::debug!("Requesting street view for '{}'", location);

        // 網址帶有 key，錯誤訊息不能附上網址
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| DamageLabError::HttpError(e.without_url()))?;
        let status = response.status();

        // 與 Maps API 的約定一樣，只接受 200
        if status != reqwest::StatusCode::OK {
            tracing::warn!("Street view request for '{}' returned {}", location, status);
            return Err(DamageLabError::MapImageryError {
                status: status.as_u16(),
                location: location.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DamageLabError::HttpError(e.without_url()))?;
        tracing::debug!("Street view returned {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}
