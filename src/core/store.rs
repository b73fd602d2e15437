use crate::core::codec;
use crate::domain::model::{ArtifactId, ArtifactKey, DamageLevel, ImageArtifact, Stage, Upload};
use crate::domain::ports::Storage;
use crate::utils::error::{DamageLabError, Result};
use crate::utils::validation::validate_upload_extension;
use chrono::Utc;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub const INDEX_FILE: &str = "index.json";

/// 與雲端服務的上傳上限一致
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// `(id, stage)` 為主鍵的輕量索引，存成 store root 底下的 `index.json`
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ArtifactIndex {
    pub artifacts: Vec<ImageArtifact>,
}

impl ArtifactIndex {
    pub fn find(&self, key: ArtifactKey) -> Option<&ImageArtifact> {
        self.artifacts.iter().find(|artifact| artifact.key() == key)
    }

    pub fn contains(&self, key: ArtifactKey) -> bool {
        self.find(key).is_some()
    }
}

pub struct ImageStore<S: Storage> {
    storage: S,
    max_upload_bytes: usize,
    index: Mutex<Option<ArtifactIndex>>,
}

impl<S: Storage> ImageStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            index: Mutex::new(None),
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// 儲存使用者上傳的照片（只接受 jpg / jpeg / png）
    pub async fn save_upload(&self, upload: &Upload) -> Result<ImageArtifact> {
        validate_upload_extension(&upload.file_name)?;

        if upload.bytes.is_empty() {
            return Err(DamageLabError::UnsupportedUploadError {
                file: upload.file_name.clone(),
                reason: "File is empty".to_string(),
            });
        }

        if upload.bytes.len() > self.max_upload_bytes {
            return Err(DamageLabError::UnsupportedUploadError {
                file: upload.file_name.clone(),
                reason: format!(
                    "File is {} bytes, the limit is {} bytes",
                    upload.bytes.len(),
                    self.max_upload_bytes
                ),
            });
        }

        match codec::sniff_format(&upload.bytes) {
            Some(ImageFormat::Jpeg) | Some(ImageFormat::Png) => {}
            Some(other) => {
                return Err(DamageLabError::UnsupportedUploadError {
                    file: upload.file_name.clone(),
                    reason: format!("Content is {:?}, expected JPEG or PNG", other),
                })
            }
            None => {
                return Err(DamageLabError::UnsupportedUploadError {
                    file: upload.file_name.clone(),
                    reason: "Content is not a recognised image".to_string(),
                })
            }
        }

        let mut guard = self.index.lock().await;
        let index = self.loaded(&mut guard).await?;
        let mut artifact = new_artifact(ArtifactId::generate(), Stage::Original, &upload.bytes);
        artifact.label = Some(upload.file_name.clone());
        self.persist(index, artifact, &upload.bytes).await
    }

    /// 以新的 id 儲存
    pub async fn save(&self, bytes: &[u8], stage: Stage) -> Result<ImageArtifact> {
        self.save_labeled(bytes, stage, None).await
    }

    pub async fn save_labeled(
        &self,
        bytes: &[u8],
        stage: Stage,
        label: Option<String>,
    ) -> Result<ImageArtifact> {
        let mut guard = self.index.lock().await;
        let index = self.loaded(&mut guard).await?;
        let mut artifact = new_artifact(ArtifactId::generate(), stage, bytes);
        artifact.label = label;
        self.persist(index, artifact, bytes).await
    }

    /// 儲存由 `source` 產生的圖。沿用來源的 id；該階段已有檔案時改用新 id，不覆寫既有檔案
    pub async fn save_derived(
        &self,
        source: &ImageArtifact,
        stage: Stage,
        bytes: &[u8],
        damage_level: Option<DamageLevel>,
    ) -> Result<ImageArtifact> {
        let mut guard = self.index.lock().await;
        let index = self.loaded(&mut guard).await?;

        let slot = ArtifactKey {
            id: source.id,
            stage,
        };
        let id = if index.contains(slot) {
            tracing::debug!("{} already stored, using a fresh id", slot);
            ArtifactId::generate()
        } else {
            source.id
        };

        let mut artifact = new_artifact(id, stage, bytes);
        artifact.source = Some(source.key());
        artifact.damage_level = damage_level;
        artifact.label = source.label.clone();
        self.persist(index, artifact, bytes).await
    }

    pub async fn load(&self, artifact: &ImageArtifact) -> Result<Vec<u8>> {
        self.load_path(&artifact.path).await
    }

    pub async fn load_path(&self, path: &Path) -> Result<Vec<u8>> {
        self.storage.read_file(&storage_key(path)).await
    }

    pub async fn lookup(&self, id: ArtifactId, stage: Stage) -> Result<Option<ImageArtifact>> {
        let mut guard = self.index.lock().await;
        let index = self.loaded(&mut guard).await?;
        Ok(index.find(ArtifactKey { id, stage }).cloned())
    }

    pub async fn history(&self) -> Result<Vec<ImageArtifact>> {
        let mut guard = self.index.lock().await;
        let index = self.loaded(&mut guard).await?;
        Ok(index.artifacts.clone())
    }

    /// 同一個 id 的所有階段，以及直接由它衍生的圖
    pub async fn related(&self, id: ArtifactId) -> Result<Vec<ImageArtifact>> {
        let mut guard = self.index.lock().await;
        let index = self.loaded(&mut guard).await?;
        Ok(index
            .artifacts
            .iter()
            .filter(|artifact| {
                artifact.id == id || artifact.source.is_some_and(|source| source.id == id)
            })
            .cloned()
            .collect())
    }

    async fn loaded<'a>(&self, slot: &'a mut Option<ArtifactIndex>) -> Result<&'a mut ArtifactIndex> {
        if slot.is_none() {
            let index = if self.storage.exists(INDEX_FILE).await? {
                let bytes = self.storage.read_file(INDEX_FILE).await?;
                serde_json::from_slice(&bytes)?
            } else {
                ArtifactIndex::default()
            };
            tracing::debug!("Loaded artifact index with {} entries", index.artifacts.len());
            *slot = Some(index);
        }
        Ok(slot.get_or_insert_with(ArtifactIndex::default))
    }

    async fn persist(
        &self,
        index: &mut ArtifactIndex,
        artifact: ImageArtifact,
        bytes: &[u8],
    ) -> Result<ImageArtifact> {
        let key = storage_key(&artifact.path);
        tracing::debug!("Writing {} ({} bytes)", key, bytes.len());
        self.storage.write_file(&key, bytes).await?;

        // 寫入成功後才替換記憶體中的 index
        let mut next = index.clone();
        next.artifacts.push(artifact.clone());
        let json = serde_json::to_vec_pretty(&next)?;
        self.storage.write_file(INDEX_FILE, &json).await?;
        *index = next;

        Ok(artifact)
    }
}

fn new_artifact(id: ArtifactId, stage: Stage, bytes: &[u8]) -> ImageArtifact {
    let format = codec::extension(bytes).to_string();
    ImageArtifact {
        id,
        stage,
        path: PathBuf::from(stage.dir_name()).join(format!("{}.{}", id, format)),
        format,
        damage_level: None,
        source: None,
        label: None,
        created_at: Utc::now(),
    }
}

fn storage_key(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
