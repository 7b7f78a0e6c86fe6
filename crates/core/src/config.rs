use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dates::{default_offset, parse_utc_offset};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub locale: LocaleConfig,
    pub render: RenderConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LocaleConfig {
    pub utc_offset: String,
}

#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub output_dir: PathBuf,
    pub assets_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub utc_offset: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub assets_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            locale: LocaleConfig { utc_offset: "-04:00".to_string() },
            render: RenderConfig {
                output_dir: PathBuf::from("tmp/pdf"),
                assets_dir: PathBuf::from("public"),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("cotiza.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// The validated offset used for "today" and document dates.
    pub fn utc_offset(&self) -> FixedOffset {
        parse_utc_offset(&self.locale.utc_offset).unwrap_or_else(default_offset)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(locale) = patch.locale {
            if let Some(utc_offset) = locale.utc_offset {
                self.locale.utc_offset = utc_offset;
            }
        }

        if let Some(render) = patch.render {
            if let Some(output_dir) = render.output_dir {
                self.render.output_dir = output_dir;
            }
            if let Some(assets_dir) = render.assets_dir {
                self.render.assets_dir = assets_dir;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("COTIZA_LOCALE_UTC_OFFSET") {
            self.locale.utc_offset = value;
        }

        if let Some(value) = read_env("COTIZA_RENDER_OUTPUT_DIR") {
            self.render.output_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("COTIZA_RENDER_ASSETS_DIR") {
            self.render.assets_dir = PathBuf::from(value);
        }

        let log_level = read_env("COTIZA_LOGGING_LEVEL").or_else(|| read_env("COTIZA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("COTIZA_LOGGING_FORMAT").or_else(|| read_env("COTIZA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(utc_offset) = overrides.utc_offset {
            self.locale.utc_offset = utc_offset;
        }
        if let Some(output_dir) = overrides.output_dir {
            self.render.output_dir = output_dir;
        }
        if let Some(assets_dir) = overrides.assets_dir {
            self.render.assets_dir = assets_dir;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_locale(&self.locale)?;
        validate_render(&self.render)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("cotiza.toml"), PathBuf::from("config/cotiza.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_locale(locale: &LocaleConfig) -> Result<(), ConfigError> {
    if parse_utc_offset(&locale.utc_offset).is_none() {
        return Err(ConfigError::Validation(format!(
            "locale.utc_offset `{}` is not a UTC offset (expected e.g. `-04:00` or `UTC-4`)",
            locale.utc_offset
        )));
    }

    Ok(())
}

fn validate_render(render: &RenderConfig) -> Result<(), ConfigError> {
    if render.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation("render.output_dir must not be empty".to_string()));
    }

    if render.assets_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation("render.assets_dir must not be empty".to_string()));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    locale: Option<LocalePatch>,
    render: Option<RenderPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LocalePatch {
    utc_offset: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderPatch {
    output_dir: Option<PathBuf>,
    assets_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
