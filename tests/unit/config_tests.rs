use super::*;

use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!("termpal-config-{prefix}-{nanos}"));
        std::fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }

    fn store(&self) -> ConfigStore {
        ConfigStore::at(self.path.join("config.toml"))
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

#[test]
fn load_reports_not_found_for_missing_file() {
    let dir = TempDirGuard::new("missing");
    let err = dir.store().load().expect_err("missing config should error");
    assert!(err.is_not_found());
}

#[test]
fn load_reports_parse_error_for_broken_toml() {
    let dir = TempDirGuard::new("broken");
    let store = dir.store();
    std::fs::write(store.path(), "[ai\napi_key = ").expect("write broken config");
    let err = store.load().expect_err("broken config should error");
    assert!(!err.is_not_found());
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn load_fills_missing_keys_from_defaults() {
    let dir = TempDirGuard::new("partial");
    let store = dir.store();
    std::fs::write(
        store.path(),
        "[ai]\napi_key = \"sk-test\"\n[user]\ndefault_prompt_mode = \"chat\"\n",
    )
    .expect("write partial config");
    let config = store.load().expect("partial config should load");
    assert_eq!(config.ai.api_key, "sk-test");
    assert_eq!(config.ai.model, "gpt-4o-mini");
    assert_eq!(config.ai.max_tokens, 1000);
    assert_eq!(config.user.default_prompt_mode, "chat");
    assert_eq!(config.system.config_file, store.path());
}

#[test]
fn write_api_key_persists_defaults_and_key() {
    let dir = TempDirGuard::new("bootstrap");
    let store = dir.store();
    let written = store.write_api_key("  sk-new  ").expect("write api key");
    assert_eq!(written.ai.api_key, "sk-new");
    assert_eq!(written.user.default_prompt_mode, "exec");

    let reloaded = store.load().expect("reload written config");
    assert_eq!(reloaded, written);
    let text = std::fs::read_to_string(store.path()).expect("read config text");
    assert!(text.contains("sk-new"));
    assert!(text.contains("[user]"));
}

#[test]
fn write_api_key_keeps_existing_overrides() {
    let dir = TempDirGuard::new("overrides");
    let store = dir.store();
    std::fs::write(store.path(), "[ai]\nmodel = \"custom-model\"\n").expect("seed config");
    let written = store.write_api_key("sk-kept").expect("write api key");
    assert_eq!(written.ai.model, "custom-model");
    assert_eq!(written.ai.api_key, "sk-kept");
}

#[test]
fn configured_editor_wins_over_environment() {
    let dir = TempDirGuard::new("editor");
    let store = dir.store();
    std::fs::write(store.path(), "[system]\neditor = \"vim -n\"\n").expect("seed config");
    let config = store.load().expect("config should load");
    assert_eq!(config.system.editor, "vim -n");
    assert_eq!(config.system.config_file, store.path());
}

#[test]
fn fractional_temperature_survives_a_file_round_trip() {
    let file: ConfigFile = toml::from_str(
        "[ai]\napi_key = \"sk\"\nmodel = \"m\"\nbase_url = \"http://localhost\"\ntemperature = 0.7\nmax_tokens = 64\n\
         [user]\ndefault_prompt_mode = \"chat\"\n[system]\neditor = \"vi\"\n",
    )
    .expect("config file should parse");
    assert_eq!(file.ai.temperature, 0.7);

    let text = toml::to_string_pretty(&file).expect("config file should serialize");
    let reparsed: ConfigFile = toml::from_str(&text).expect("serialized file should parse");
    assert_eq!(reparsed, file);
}
