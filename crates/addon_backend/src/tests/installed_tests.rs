use super::*;
use crate::{build_registry, BackendSettings};
use serde_json::json;
use shared::{error::BridgeErrorKind, protocol::Command};
use std::{
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_addon_dir(label: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("addon_manager_{label}_{suffix}"));
    fs::create_dir_all(&dir).expect("temp addon dir");
    dir
}

fn settings_for(addon_dir: PathBuf) -> BackendSettings {
    BackendSettings {
        addon_dir,
        api_endpoint: "http://127.0.0.1:9".to_string(),
    }
}

#[tokio::test]
async fn counts_addon_folders_and_skips_files_and_hidden_entries() {
    let dir = temp_addon_dir("count");
    for name in ["CombatMetrics", "LibAddonMenu-2.0", "HarvestMapData"] {
        fs::create_dir_all(dir.join(name)).expect("addon folder");
    }
    fs::write(dir.join("CombatMetrics").join("CombatMetrics.txt"), "## Title: Combat Metrics\n")
        .expect("manifest");
    fs::create_dir_all(dir.join(".git")).expect("hidden folder");
    fs::write(dir.join("readme.txt"), "not an addon").expect("stray file");

    assert_eq!(count_installed_addons(&dir).await.expect("count"), 3);

    fs::remove_dir_all(dir).expect("cleanup");
}

#[tokio::test]
async fn empty_addon_folder_counts_zero() {
    let dir = temp_addon_dir("empty");

    assert_eq!(count_installed_addons(&dir).await.expect("count"), 0);

    fs::remove_dir_all(dir).expect("cleanup");
}

#[tokio::test]
async fn missing_addon_folder_is_reported_with_code() {
    let dir = temp_addon_dir("missing");
    fs::remove_dir_all(&dir).expect("remove");

    let err = count_installed_addons(&dir).await.expect_err("missing dir");
    assert!(matches!(err, ScanError::Missing { .. }));
    assert_eq!(err.code(), "addon_dir_missing");
}

#[tokio::test]
async fn count_command_resolves_through_the_registry() {
    let dir = temp_addon_dir("registry");
    fs::create_dir_all(dir.join("Azurah")).expect("addon folder");
    fs::create_dir_all(dir.join("SkyShards")).expect("addon folder");
    let registry = build_registry(&settings_for(dir.clone())).expect("registry");

    let value = registry
        .execute(&Command::get_installed_addon_count())
        .await
        .expect("count");
    assert_eq!(value, json!(2));

    fs::remove_dir_all(dir).expect("cleanup");
}

#[tokio::test]
async fn count_command_surfaces_missing_folder_as_backend_failure() {
    let dir = temp_addon_dir("registry_missing");
    fs::remove_dir_all(&dir).expect("remove");
    let registry = build_registry(&settings_for(dir)).expect("registry");

    let err = registry
        .execute(&Command::get_installed_addon_count())
        .await
        .expect_err("missing dir");
    assert_eq!(err.kind(), BridgeErrorKind::BackendExecution);
    assert_eq!(err.code(), Some("addon_dir_missing"));
}

#[tokio::test]
async fn count_command_rejects_arguments() {
    let dir = temp_addon_dir("registry_args");
    let registry = build_registry(&settings_for(dir.clone())).expect("registry");

    let err = registry
        .execute(&Command::with_args(
            shared::protocol::GET_INSTALLED_ADDON_COUNT,
            json!({ "dir": "/tmp" }),
        ))
        .await
        .expect_err("args rejected");
    assert_eq!(err.kind(), BridgeErrorKind::InvalidArgument);

    fs::remove_dir_all(dir).expect("cleanup");
}
