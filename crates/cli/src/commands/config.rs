use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use cotiza_core::config::ConfigOverrides;
use toml::Value;

use crate::commands::{load_config, CommandResult};

const COMMAND: &str = "config";

pub fn run(config_path: Option<PathBuf>) -> CommandResult {
    let config = match load_config(COMMAND, config_path.clone(), ConfigOverrides::default()) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = config_path.filter(|path| path.exists()).or_else(detect_config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let lines = [
        "effective config (source precedence: env > file > default):".to_string(),
        render_line(
            "locale.utc_offset",
            &config.locale.utc_offset,
            source("locale.utc_offset", &["COTIZA_LOCALE_UTC_OFFSET"]),
        ),
        render_line(
            "render.output_dir",
            &config.render.output_dir.display().to_string(),
            source("render.output_dir", &["COTIZA_RENDER_OUTPUT_DIR"]),
        ),
        render_line(
            "render.assets_dir",
            &config.render.assets_dir.display().to_string(),
            source("render.assets_dir", &["COTIZA_RENDER_ASSETS_DIR"]),
        ),
        render_line(
            "logging.level",
            &config.logging.level,
            source("logging.level", &["COTIZA_LOGGING_LEVEL", "COTIZA_LOG_LEVEL"]),
        ),
        render_line(
            "logging.format",
            &format!("{:?}", config.logging.format),
            source("logging.format", &["COTIZA_LOGGING_FORMAT", "COTIZA_LOG_FORMAT"]),
        ),
    ];

    CommandResult::success(COMMAND, lines.join("\n"))
}

fn detect_config_path() -> Option<PathBuf> {
    ["cotiza.toml", "config/cotiza.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
