use clap::Parser;
use damage_lab::config::{Cli, Command};
use damage_lab::domain::model::{
    ArtifactId, AssessmentReport, CycleMode, CycleReport, DamageLevel, DamageReport,
    ImageArtifact, StreetViewReport, Upload,
};
use damage_lab::utils::monitor::FlowMonitor;
use damage_lab::utils::{logger, validation::Validate};
use damage_lab::{
    DamageLab, DamageLabError, ImageStore, LabConfig, LocalStorage, OpenAiClient, Result,
    StreetViewClient,
};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting damage-lab");

    let mut config = match LabConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };
    if let Some(store) = &cli.store {
        config.store.root = store.to_string_lossy().into_owned();
    }
    if cli.verbose {
        tracing::debug!(
            "Store root: {}, edit model: {}, vision model: {}",
            config.store.root,
            config.service.edit_model,
            config.service.vision_model
        );
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(e);
    }

    match run(&cli, &config).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => exit_with(e),
    }
}

fn exit_with(e: DamageLabError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ damage-lab failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    std::process::exit(e.severity().exit_code())
}

async fn run(cli: &Cli, config: &LabConfig) -> Result<String> {
    let storage = LocalStorage::new(&config.store.root);
    let root = storage.base_path().to_path_buf();
    let store = ImageStore::new(storage).with_max_upload_bytes(config.store.max_upload_bytes);

    let system_stats = cli.monitor || config.monitoring_enabled();
    if system_stats {
        tracing::info!("🔍 System monitoring enabled");
    }
    let spinner = !cli.verbose && !cli.json_logs && std::io::stderr().is_terminal();
    let monitor = FlowMonitor::new(system_stats).with_spinner(spinner);

    let generator = OpenAiClient::from_config(&config.service)?;
    let maps = StreetViewClient::new(config.maps.clone());
    let lab = DamageLab::new(store, generator, maps).with_monitor(monitor);

    let output = match &cli.command {
        Command::Assess { image } => {
            let report = lab.assess(&read_upload(image).await?).await?;
            render(cli.json, &report, |r| render_assessment(r, &root))?
        }
        Command::Damage { image, level } => {
            let level = DamageLevel::new(*level)?;
            let report = lab.damage(&read_upload(image).await?, level).await?;
            render(cli.json, &report, |r| render_damage(r, &root))?
        }
        Command::Cycle { image, mode, level } => {
            let level = DamageLevel::new(*level)?;
            let report = lab
                .full_cycle(&read_upload(image).await?, *mode, level)
                .await?;
            render(cli.json, &report, |r| render_cycle(r, &root))?
        }
        Command::StreetView { location } => {
            let report = lab.street_view(location).await?;
            render(cli.json, &report, |r| render_street_view(r, &root))?
        }
        Command::History { id } => {
            return history(lab.store(), id.as_deref(), cli.json, &root).await;
        }
    };

    lab.monitor().log_final_stats();
    Ok(output)
}

async fn read_upload(path: &Path) -> Result<Upload> {
    // 讀不到輸入圖是使用者輸入的問題，不是 store 的問題
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DamageLabError::UnsupportedUploadError {
            file: path.display().to_string(),
            reason: format!("Cannot read file: {}", e),
        })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Upload::new(file_name, bytes))
}

fn render<T: Serialize>(json: bool, report: &T, text: impl Fn(&T) -> String) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(report)?)
    } else {
        Ok(text(report))
    }
}

fn artifact_line(caption: &str, artifact: &ImageArtifact, root: &Path) -> String {
    format!("{:<28} {}", caption, root.join(&artifact.path).display())
}

fn render_assessment(report: &AssessmentReport, root: &Path) -> String {
    let level = report.assessment.damage_level;
    [
        artifact_line("Original Damaged Image:", &report.original, root),
        artifact_line("Restored Image:", &report.restored, root),
        String::new(),
        format!("Damage level: {} ({})", level, level.label()),
        format!("Description:  {}", report.assessment.damage_description),
        String::new(),
        "Raw response:".to_string(),
        report.raw_response.clone(),
    ]
    .join("\n")
}

fn render_damage(report: &DamageReport, root: &Path) -> String {
    [
        artifact_line("Original Building Image:", &report.original, root),
        artifact_line(
            &format!("Damaged Image (Level {}):", report.level),
            &report.damaged,
            root,
        ),
    ]
    .join("\n")
}

fn render_cycle(report: &CycleReport, root: &Path) -> String {
    let damaged_caption = format!("Damaged Image (Level {}):", report.level);
    let lines = match report.mode {
        CycleMode::PreDamage => [
            artifact_line("Original Intact Image:", &report.original, root),
            artifact_line(&damaged_caption, &report.damaged, root),
            artifact_line("Restored Image from Damage:", &report.restored, root),
        ],
        CycleMode::PostDamage => [
            artifact_line("Original Post-damage Image:", &report.original, root),
            artifact_line("Restored from Damage:", &report.restored, root),
            artifact_line(
                &format!("Damaged Restored (Level {}):", report.level),
                &report.damaged,
                root,
            ),
        ],
    };
    lines.join("\n")
}

fn render_street_view(report: &StreetViewReport, root: &Path) -> String {
    [
        format!("Street View: {}", report.location),
        artifact_line("Street View Image:", &report.street_view, root),
        artifact_line("Restored Image:", &report.restored, root),
    ]
    .join("\n")
}

async fn history(
    store: &ImageStore<LocalStorage>,
    id: Option<&str>,
    json: bool,
    root: &Path,
) -> Result<String> {
    let artifacts = match id {
        Some(id) => {
            let id: ArtifactId = id.parse()?;
            let related = store.related(id).await?;
            if related.is_empty() {
                return Err(DamageLabError::ArtifactNotFoundError { key: id.to_string() });
            }
            related
        }
        None => store.history().await?,
    };

    if json {
        return Ok(serde_json::to_string_pretty(&artifacts)?);
    }
    if artifacts.is_empty() {
        return Ok("No artifacts stored yet".to_string());
    }

    Ok(artifacts
        .iter()
        .map(|artifact| {
            format!(
                "{}  {:<8}  {:<5}  {}  {}",
                artifact.created_at.format("%Y-%m-%d %H:%M:%S"),
                artifact.stage.to_string(),
                artifact
                    .damage_level
                    .map(|level| format!("L{}", level))
                    .unwrap_or_default(),
                root.join(&artifact.path).display(),
                artifact.label.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}
