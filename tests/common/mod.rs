#![allow(dead_code)]

use async_trait::async_trait;
use damage_lab::core::prompts::DAMAGE_LEVEL_MARKER;
use damage_lab::domain::ports::{GenerationService, MapImagery};
use damage_lab::{DamageLabError, Result};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use std::io::Cursor;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;

pub fn image_bytes(format: ImageFormat, shade: u8) -> Vec<u8> {
    let img = ImageBuffer::from_pixel(8, 6, Rgb([shade, shade / 2, 255 - shade]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("encode test image");
    bytes
}

pub fn png_bytes(shade: u8) -> Vec<u8> {
    image_bytes(ImageFormat::Png, shade)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Damage(String),
    Restore(String),
    Compare(String),
}

/// 以真的 PNG 回應每次編輯，每次顏色都不同
pub struct ScriptedService {
    pub calls: Mutex<Vec<Call>>,
    pub compare_reply: String,
    next_shade: AtomicU8,
}

impl ScriptedService {
    pub fn new(compare_reply: impl Into<String>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            compare_reply: compare_reply.into(),
            next_shade: AtomicU8::new(40),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl GenerationService for ScriptedService {
    async fn edit(&self, image: &[u8], instruction: &str) -> Result<Vec<u8>> {
        assert!(
            image::guess_format(image).is_ok(),
            "edit input must be an image"
        );
        let call = if instruction.contains(DAMAGE_LEVEL_MARKER) {
            Call::Damage(instruction.to_string())
        } else {
            Call::Restore(instruction.to_string())
        };
        self.calls.lock().expect("calls lock").push(call);

        let shade = self.next_shade.fetch_add(50, Ordering::SeqCst);
        Ok(png_bytes(shade))
    }

    async fn compare(&self, _a: &[u8], _b: &[u8], instruction: &str) -> Result<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(Call::Compare(instruction.to_string()));
        Ok(self.compare_reply.clone())
    }
}

pub struct StaticMaps(pub std::result::Result<Vec<u8>, u16>);

#[async_trait]
impl MapImagery for StaticMaps {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        match &self.0 {
            Ok(bytes) => Ok(bytes.clone()),
            Err(status) => Err(DamageLabError::MapImageryError {
                status: *status,
                location: location.to_string(),
            }),
        }
    }
}

pub fn assert_valid_image(bytes: &[u8]) {
    image::load_from_memory(bytes).expect("artifact should decode as an image");
}
