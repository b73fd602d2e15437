mod common;

use common::{assert_valid_image, image_bytes, png_bytes, Call, ScriptedService, StaticMaps};
use damage_lab::domain::model::{CycleMode, DamageLevel, Stage, Upload};
use damage_lab::{DamageLab, DamageLabError, ImageStore, LocalStorage};
use image::ImageFormat;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

type Lab = DamageLab<LocalStorage, ScriptedService, StaticMaps>;

fn lab(dir: &TempDir, compare_reply: &str, maps: StaticMaps) -> Lab {
    DamageLab::new(
        ImageStore::new(LocalStorage::new(dir.path())),
        ScriptedService::new(compare_reply),
        maps,
    )
}

fn no_maps() -> StaticMaps {
    StaticMaps(Err(404))
}

#[tokio::test]
async fn test_full_cycle_pre_damage_level_three() {
    let temp_dir = TempDir::new().unwrap();
    let lab = lab(&temp_dir, "", no_maps());
    let upload = Upload::new("intact.jpg", image_bytes(ImageFormat::Jpeg, 200));
    let level = DamageLevel::new(3).unwrap();

    let report = lab
        .full_cycle(&upload, CycleMode::PreDamage, level)
        .await
        .unwrap();

    // 三個檔案都要存在而且是合法的圖
    let original = lab.store().load(&report.original).await.unwrap();
    let damaged = lab.store().load(&report.damaged).await.unwrap();
    let restored = lab.store().load(&report.restored).await.unwrap();
    for (artifact, bytes) in [
        (&report.original, &original),
        (&report.damaged, &damaged),
        (&report.restored, &restored),
    ] {
        assert!(temp_dir.path().join(&artifact.path).is_file());
        assert_valid_image(bytes);
    }
    assert_ne!(damaged, original);

    assert_eq!(report.original.stage, Stage::Original);
    assert_eq!(report.damaged.stage, Stage::Damaged);
    assert_eq!(report.restored.stage, Stage::Restored);
    assert_eq!(report.damaged.damage_level, Some(level));

    // 同一個 id 串起三個階段
    assert_eq!(report.damaged.id, report.original.id);
    assert_eq!(report.restored.id, report.original.id);
    assert_eq!(report.restored.source, Some(report.damaged.key()));

    let calls = lab.generator().calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(&calls[0], Call::Damage(prompt) if prompt.ends_with("Damage level for this request: 3")));
    assert!(matches!(&calls[1], Call::Restore(_)));
}

#[tokio::test]
async fn test_full_cycle_post_damage_restores_then_damages() {
    let temp_dir = TempDir::new().unwrap();
    let lab = lab(&temp_dir, "", no_maps());
    let upload = Upload::new("ruin.png", png_bytes(10));

    let report = lab
        .full_cycle(&upload, CycleMode::PostDamage, DamageLevel::new(5).unwrap())
        .await
        .unwrap();

    assert_eq!(report.mode, CycleMode::PostDamage);
    assert_eq!(report.restored.source, Some(report.original.key()));
    assert_eq!(report.damaged.source, Some(report.restored.key()));

    let calls = lab.generator().calls();
    assert!(matches!(calls.as_slice(), [Call::Restore(_), Call::Damage(_)]));
}

#[tokio::test]
async fn test_apply_damage_embeds_each_level_once() {
    for level in DamageLevel::all() {
        let temp_dir = TempDir::new().unwrap();
        let lab = lab(&temp_dir, "", no_maps());

        let report = lab
            .damage(&Upload::new("front.png", png_bytes(120)), level)
            .await
            .unwrap();
        assert_eq!(report.level, level);
        assert_valid_image(&lab.store().load(&report.damaged).await.unwrap());

        let calls = lab.generator().calls();
        let [Call::Damage(prompt)] = calls.as_slice() else {
            panic!("expected exactly one damage call, got {:?}", calls);
        };
        let marker = format!("Damage level for this request: {}", level);
        assert_eq!(prompt.matches(marker.as_str()).count(), 1);
    }
}

#[tokio::test]
async fn test_assess_surfaces_service_reply_unmodified() {
    let reply = r#"{"damage_description":"cracked facade","damage_level":4}"#;
    let temp_dir = TempDir::new().unwrap();
    let lab = lab(&temp_dir, reply, no_maps());

    let report = lab
        .assess(&Upload::new("damaged.jpeg", image_bytes(ImageFormat::Jpeg, 60)))
        .await
        .unwrap();

    assert_eq!(report.raw_response, reply);
    assert_eq!(report.assessment.damage_description, "cracked facade");
    assert_eq!(report.assessment.damage_level.value(), 4);
    assert_eq!(report.original.stage, Stage::Original);
    assert_eq!(report.restored.id, report.original.id);

    let calls = lab.generator().calls();
    assert!(matches!(calls.as_slice(), [Call::Restore(_), Call::Compare(_)]));
    let Call::Compare(instruction) = &calls[1] else {
        unreachable!()
    };
    assert!(instruction.contains("\"damage_level\""));
}

#[tokio::test]
async fn test_assess_rejects_out_of_range_level() {
    let temp_dir = TempDir::new().unwrap();
    let lab = lab(
        &temp_dir,
        r#"{"damage_description":"gone","damage_level":9}"#,
        no_maps(),
    );

    let result = lab
        .assess(&Upload::new("damaged.png", png_bytes(60)))
        .await;

    assert!(matches!(
        result,
        Err(DamageLabError::AssessmentDecodeError { .. })
    ));
}

#[tokio::test]
async fn test_restoring_twice_keeps_both_results() {
    let temp_dir = TempDir::new().unwrap();
    let lab = lab(&temp_dir, "", no_maps());
    let original = lab
        .ingest(&Upload::new("front.png", png_bytes(90)))
        .await
        .unwrap();

    let first = assert_ok!(lab.restore(&original).await);
    let second = assert_ok!(lab.restore(&first).await);

    // 模型不保證冪等，只檢查兩次結果都是合法的圖
    assert_valid_image(&lab.store().load(&first).await.unwrap());
    assert_valid_image(&lab.store().load(&second).await.unwrap());
    assert_ne!(first.path, second.path);
    assert_eq!(second.stage, Stage::Restored);
}

#[tokio::test]
async fn test_unsupported_upload_is_rejected_before_any_call() {
    let temp_dir = TempDir::new().unwrap();
    let lab = lab(&temp_dir, "", no_maps());

    let result = lab
        .damage(
            &Upload::new("front.bmp", png_bytes(1)),
            DamageLevel::new(1).unwrap(),
        )
        .await;

    assert_err!(&result);
    assert!(lab.generator().calls().is_empty());
    assert!(lab.store().history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_street_view_stores_and_restores() {
    let temp_dir = TempDir::new().unwrap();
    let lab = lab(&temp_dir, "", StaticMaps(Ok(png_bytes(180))));

    let report = lab.street_view("  Flatiron Building  ").await.unwrap();

    assert_eq!(report.location, "Flatiron Building");
    assert_eq!(report.street_view.stage, Stage::Base);
    assert!(report.street_view.path.starts_with("base_images"));
    assert_eq!(report.street_view.label.as_deref(), Some("Flatiron Building"));
    assert_eq!(report.restored.stage, Stage::Restored);
    assert_eq!(report.restored.id, report.street_view.id);
    assert_valid_image(&lab.store().load(&report.restored).await.unwrap());
}

#[tokio::test]
async fn test_street_view_failure_writes_no_artifact() {
    let temp_dir = TempDir::new().unwrap();
    let lab = lab(&temp_dir, "", StaticMaps(Err(403)));

    let err = lab.street_view("Times Square").await.unwrap_err();

    assert!(err.user_friendly_message().contains("Status code: 403"));
    assert!(lab.generator().calls().is_empty());
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}
