pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::http::{OpenAiClient, StreetViewClient};
pub use adapters::storage::LocalStorage;
pub use config::LabConfig;
pub use core::{flows::DamageLab, store::ImageStore};
pub use utils::error::{DamageLabError, Result};
