use crate::core::assessment::parse_assessment;
use crate::core::prompts::{assessment_prompt, damage_prompt, RESTORE_PROMPT};
use crate::core::store::ImageStore;
use crate::domain::model::{
    AssessmentReport, CycleMode, CycleReport, DamageLevel, DamageReport, ImageArtifact, Stage,
    StreetViewReport, Upload,
};
use crate::domain::ports::{GenerationService, MapImagery, Storage};
use crate::utils::error::Result;
use crate::utils::monitor::FlowMonitor;
use crate::utils::validation::validate_non_empty_string;

/// 四個流程共用的協調器：每一步都依序等待上一步的結果，不重試
pub struct DamageLab<S: Storage, G: GenerationService, M: MapImagery> {
    store: ImageStore<S>,
    generator: G,
    maps: M,
    monitor: FlowMonitor,
}

impl<S: Storage, G: GenerationService, M: MapImagery> DamageLab<S, G, M> {
    pub fn new(store: ImageStore<S>, generator: G, maps: M) -> Self {
        Self {
            store,
            generator,
            maps,
            monitor: FlowMonitor::default(),
        }
    }

    pub fn with_monitor(mut self, monitor: FlowMonitor) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn store(&self) -> &ImageStore<S> {
        &self.store
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn monitor(&self) -> &FlowMonitor {
        &self.monitor
    }

    pub async fn ingest(&self, upload: &Upload) -> Result<ImageArtifact> {
        let step = self.monitor.start_step("Saving upload...");
        let artifact = self.store.save_upload(upload).await?;
        step.finish();

        tracing::info!("📁 Stored {} as {}", upload.file_name, artifact.path.display());
        Ok(artifact)
    }

    pub async fn restore(&self, source: &ImageArtifact) -> Result<ImageArtifact> {
        let step = self.monitor.start_step("Restoring image...");
        let bytes = self.store.load(source).await?;
        let restored = self.generator.edit(&bytes, RESTORE_PROMPT).await?;
        let artifact = self
            .store
            .save_derived(source, Stage::Restored, &restored, None)
            .await?;
        step.finish();
        Ok(artifact)
    }

    pub async fn apply_damage(
        &self,
        source: &ImageArtifact,
        level: DamageLevel,
    ) -> Result<ImageArtifact> {
        let step = self
            .monitor
            .start_step(format!("Applying level {} damage...", level));
        let bytes = self.store.load(source).await?;
        let damaged = self.generator.edit(&bytes, &damage_prompt(level)).await?;
        let artifact = self
            .store
            .save_derived(source, Stage::Damaged, &damaged, Some(level))
            .await?;
        step.finish();
        Ok(artifact)
    }

    /// 以修復後的圖為基準評估 `damaged` 的損壞程度
    pub async fn assess_pair(
        &self,
        damaged: &ImageArtifact,
        restored: &ImageArtifact,
    ) -> Result<AssessmentReport> {
        let step = self.monitor.start_step("Assessing damage...");
        let damaged_bytes = self.store.load(damaged).await?;
        let restored_bytes = self.store.load(restored).await?;

        let raw_response = self
            .generator
            .compare(&damaged_bytes, &restored_bytes, &assessment_prompt())
            .await?;
        let assessment = parse_assessment(&raw_response).inspect_err(|_| {
            tracing::warn!(
                "Assessment unreadable, restored image kept at {}",
                restored.path.display()
            )
        })?;
        step.finish();

        tracing::info!(
            "🏚️ Assessed damage level {} ({})",
            assessment.damage_level,
            assessment.damage_level.label()
        );

        Ok(AssessmentReport {
            original: damaged.clone(),
            restored: restored.clone(),
            assessment,
            raw_response,
        })
    }

    /// 上傳 → 修復 → 比較
    pub async fn assess(&self, upload: &Upload) -> Result<AssessmentReport> {
        tracing::info!("🚀 Starting damage assessment for {}", upload.file_name);

        let original = self.ingest(upload).await?;
        let restored = self.restore(&original).await?;
        self.assess_pair(&original, &restored).await
    }

    /// 上傳 → 套用損壞
    pub async fn damage(&self, upload: &Upload, level: DamageLevel) -> Result<DamageReport> {
        tracing::info!(
            "🚀 Starting damage simulation for {} at level {}",
            upload.file_name,
            level
        );

        let original = self.ingest(upload).await?;
        let damaged = self.apply_damage(&original, level).await?;

        Ok(DamageReport {
            original,
            damaged,
            level,
        })
    }

    pub async fn full_cycle(
        &self,
        upload: &Upload,
        mode: CycleMode,
        level: DamageLevel,
    ) -> Result<CycleReport> {
        tracing::info!(
            "🚀 Starting {} cycle test for {} at level {}",
            mode,
            upload.file_name,
            level
        );

        let original = self.ingest(upload).await?;

        let (damaged, restored) = match mode {
            CycleMode::PreDamage => {
                let damaged = self.apply_damage(&original, level).await?;
                let restored = self.restore(&damaged).await?;
                (damaged, restored)
            }
            CycleMode::PostDamage => {
                let restored = self.restore(&original).await?;
                let damaged = self.apply_damage(&restored, level).await?;
                (damaged, restored)
            }
        };

        Ok(CycleReport {
            mode,
            level,
            original,
            damaged,
            restored,
        })
    }

    /// 抓取街景 → 存成 base → 修復；抓取失敗時不會寫入任何檔案
    pub async fn street_view(&self, location: &str) -> Result<StreetViewReport> {
        validate_non_empty_string("location", location)?;
        let location = location.trim();
        tracing::info!("🚀 Starting street view restoration for '{}'", location);

        let step = self.monitor.start_step("Fetching street view...");
        let bytes = self.maps.fetch(location).await?;
        let street_view = self
            .store
            .save_labeled(&bytes, Stage::Base, Some(location.to_string()))
            .await?;
        step.finish();

        let restored = self.restore(&street_view).await?;

        Ok(StreetViewReport {
            location: location.to_string(),
            street_view,
            restored,
        })
    }
}
