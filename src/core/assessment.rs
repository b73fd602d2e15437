use crate::domain::model::{Assessment, DamageLevel};
use crate::utils::error::{DamageLabError, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn fenced_block() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").ok())
        .as_ref()
}

/// 模型常把 JSON 包在 ```json 區塊裡，或在前後多講幾句話
fn extract_json(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();

    if let Some(block) = fenced_block()
        .and_then(|re| re.captures(trimmed))
        .and_then(|caps| caps.get(1))
    {
        return Some(block.as_str());
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (start < end).then(|| &trimmed[start..=end])
}

fn decode_error(reason: impl Into<String>, raw: &str) -> DamageLabError {
    DamageLabError::AssessmentDecodeError {
        reason: reason.into(),
        raw: raw.to_string(),
    }
}

/// 解析並驗證比較結果：需要非空的 `damage_description` 與 1..=5 的整數 `damage_level`
pub fn parse_assessment(raw: &str) -> Result<Assessment> {
    let json = extract_json(raw).ok_or_else(|| decode_error("no JSON object found", raw))?;

    let value: Value = serde_json::from_str(json)
        .map_err(|e| decode_error(format!("invalid JSON: {}", e), raw))?;
    let object = value
        .as_object()
        .ok_or_else(|| decode_error("response is not a JSON object", raw))?;

    let description = object
        .get("damage_description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| decode_error("missing or empty 'damage_description'", raw))?;

    let level = object
        .get("damage_level")
        .and_then(Value::as_i64)
        .ok_or_else(|| decode_error("'damage_level' is missing or not an integer", raw))?;
    let damage_level = DamageLevel::try_from(level)
        .map_err(|_| decode_error(format!("'damage_level' {} is outside 1..=5", level), raw))?;

    Ok(Assessment {
        damage_description: description.to_string(),
        damage_level,
    })
}
