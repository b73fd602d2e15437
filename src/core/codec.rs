use crate::utils::error::Result;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageFormat;

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(text.trim().as_bytes())?)
}

/// 從內容判斷圖片格式，不是圖片則回傳 None
pub fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

pub fn mime_type(bytes: &[u8]) -> &'static str {
    sniff_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("image/jpeg")
}

/// 儲存時使用的副檔名，JPEG 一律為 `jpg`
pub fn extension(bytes: &[u8]) -> &'static str {
    match sniff_format(bytes) {
        Some(ImageFormat::Jpeg) | None => "jpg",
        Some(format) => format.extensions_str().first().copied().unwrap_or("jpg"),
    }
}

pub fn data_url(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type(bytes), encode_base64(bytes))
}
