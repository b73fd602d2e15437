use crate::utils::error::{DamageLabError, Result};
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// 上傳檔案允許的副檔名
pub const UPLOAD_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(DamageLabError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(DamageLabError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(DamageLabError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(DamageLabError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(DamageLabError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// 檢查上傳檔名的副檔名（不分大小寫），回傳小寫的副檔名
pub fn validate_upload_extension(file_name: &str) -> Result<String> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| DamageLabError::UnsupportedUploadError {
            file: file_name.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        })?;

    if !UPLOAD_EXTENSIONS.contains(&extension.as_str()) {
        return Err(DamageLabError::UnsupportedUploadError {
            file: file_name.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                UPLOAD_EXTENSIONS.join(", ")
            ),
        });
    }

    Ok(extension)
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DamageLabError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(DamageLabError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 街景圖尺寸格式為 `寬x高`，例如 `600x300`
pub fn validate_image_size(field_name: &str, size: &str) -> Result<()> {
    let parsed = size
        .split_once('x')
        .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)));

    match parsed {
        Some((w, h)) if w > 0 && h > 0 => Ok(()),
        _ => Err(DamageLabError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: size.to_string(),
            reason: "Size must look like WIDTHxHEIGHT, e.g. 600x300".to_string(),
        }),
    }
}
