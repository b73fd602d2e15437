mod common;

use common::{assert_valid_image, png_bytes};
use damage_lab::config::toml_config::MapsConfig;
use damage_lab::core::codec::encode_base64;
use damage_lab::domain::model::Stage;
use damage_lab::{
    DamageLab, DamageLabError, ImageStore, LocalStorage, OpenAiClient, StreetViewClient,
};
use httpmock::prelude::*;
use tempfile::TempDir;

fn maps_client(server: &MockServer) -> StreetViewClient {
    StreetViewClient::new(MapsConfig {
        endpoint: server.url("/maps/api/streetview"),
        api_key: Some("maps-test".to_string()),
        ..MapsConfig::default()
    })
}

#[tokio::test]
async fn test_street_view_flow_stores_base_and_restored() {
    let maps = MockServer::start();
    let openai = MockServer::start();
    let temp_dir = TempDir::new().unwrap();

    let street_mock = maps.mock(|when, then| {
        when.method(GET)
            .path("/maps/api/streetview")
            .query_param("size", "600x300")
            .query_param("location", "Flatiron Building, New York")
            .query_param("heading", "151.78")
            .query_param("pitch", "-0.76")
            .query_param_exists("key");
        then.status(200)
            .header("content-type", "image/png")
            .body(png_bytes(30));
    });
    let edit_mock = openai.mock(|when, then| {
        when.method(POST).path("/v1/images/edits");
        then.status(200).json_body(serde_json::json!({
            "data": [{"b64_json": encode_base64(&png_bytes(220))}]
        }));
    });

    let lab = DamageLab::new(
        ImageStore::new(LocalStorage::new(temp_dir.path())),
        OpenAiClient::new("sk-test").with_api_base(openai.url("/v1")),
        maps_client(&maps),
    );

    let report = lab
        .street_view("Flatiron Building, New York")
        .await
        .unwrap();

    street_mock.assert();
    edit_mock.assert();
    assert_eq!(report.street_view.stage, Stage::Base);
    assert_eq!(report.restored.stage, Stage::Restored);
    assert!(temp_dir.path().join(&report.street_view.path).is_file());
    assert_valid_image(&lab.store().load(&report.restored).await.unwrap());

    let history = lab.store().history().await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_street_view_non_200_writes_nothing() {
    let maps = MockServer::start();
    let openai = MockServer::start();
    let temp_dir = TempDir::new().unwrap();

    maps.mock(|when, then| {
        when.method(GET).path("/maps/api/streetview");
        then.status(403).body("The provided API key is invalid.");
    });
    let edit_mock = openai.mock(|when, then| {
        when.method(POST).path("/v1/images/edits");
        then.status(200);
    });

    let lab = DamageLab::new(
        ImageStore::new(LocalStorage::new(temp_dir.path())),
        OpenAiClient::new("sk-test").with_api_base(openai.url("/v1")),
        maps_client(&maps),
    );

    let err = lab.street_view("Times Square").await.unwrap_err();

    assert!(matches!(
        err,
        DamageLabError::MapImageryError { status: 403, .. }
    ));
    edit_mock.assert_hits(0);
    assert!(!temp_dir.path().join("index.json").exists());
    assert!(!temp_dir.path().join("base_images").exists());
}
