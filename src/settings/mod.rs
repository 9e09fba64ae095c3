mod dotenv;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::generation::gemini::DEFAULT_GEMINI_BASE_URL;
use crate::imaging::MatteSettings;

pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_INPUT_DIMENSION: u32 = 2048;

const ENV_API_KEY: &str = "GOOGLE_API_KEY";
const ENV_API_KEY_ALIAS: &str = "GEMINI_API_KEY";
const ENV_BASE_URL: &str = "GEMINI_API_BASE_URL";
const ENV_IMAGE_MODEL: &str = "GEMINI_IMAGE_MODEL";
const ENV_TEXT_MODEL: &str = "GEMINI_TEXT_MODEL";
const ENV_TIMEOUT_SECS: &str = "GEMINI_TIMEOUT_SECS";
const ENV_MAX_INPUT_DIMENSION: &str = "TRYON_MAX_INPUT_DIMENSION";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioSettings {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub image_model: String,
    pub text_model: String,
    pub request_timeout_secs: u64,
    /// Longest side allowed for images sent to try-on; `None` sends full resolution.
    pub max_input_dimension: Option<u32>,
    pub matte: MatteSettings,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_input_dimension: Some(DEFAULT_MAX_INPUT_DIMENSION),
            matte: MatteSettings::default(),
        }
    }
}

impl StudioSettings {
    pub fn require_api_key(&self) -> Result<&str, SettingsError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(SettingsError::MissingApiKey)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// One configuration layer. `None` means "not set here".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StudioSettingsOverlay {
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub image_model: Option<String>,
    pub text_model: Option<String>,
    pub request_timeout_secs: Option<u64>,
    /// `Some(0)` disables the cap.
    pub max_input_dimension: Option<u32>,
    pub matte_tolerance: Option<u8>,
    pub matte_feather: Option<u8>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("failed to read studio settings '{path}': {message}")]
    ReadFile { path: String, message: String },
    #[error("failed to parse studio settings JSON '{path}': {message}")]
    ParseJson { path: String, message: String },
    #[error("failed to parse studio settings TOML '{path}': {message}")]
    ParseToml { path: String, message: String },
    #[error("studio settings root must be an object")]
    RootMustBeObject,
    #[error("studio settings field '{field}' has invalid type or value")]
    InvalidFieldType { field: String },
    #[error("Missing GOOGLE_API_KEY in environment, .env or settings file")]
    MissingApiKey,
}

/// Resolves settings from, highest first: `overrides`, process env,
/// `{app_root}/.env`, the settings file, built-in defaults.
pub fn load_studio_settings(
    app_root: &Path,
    explicit_path: Option<&str>,
    overrides: &StudioSettingsOverlay,
) -> Result<StudioSettings, SettingsError> {
    let file = load_settings_file_overlay(app_root, explicit_path)?;
    let dotenv_map = dotenv::load_dotenv_map(app_root).unwrap_or_default();
    let dotenv = overlay_from_env_lookup(|key| dotenv_map.get(key).cloned())?;
    let env = overlay_from_env_lookup(|key| std::env::var(key).ok())?;
    let merged = merge_studio_settings_overlays(&[overrides, &env, &dotenv, &file]);
    Ok(resolve_studio_settings(&merged))
}

pub fn load_settings_file_overlay(
    app_root: &Path,
    explicit_path: Option<&str>,
) -> Result<StudioSettingsOverlay, SettingsError> {
    if let Some(path) = explicit_path
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .map(|p| if p.is_absolute() { p } else { app_root.join(p) })
    {
        if !path.exists() {
            return Err(SettingsError::ReadFile {
                path: path.display().to_string(),
                message: String::from("file not found"),
            });
        }
        return load_overlay_by_extension(path.as_path());
    }

    let toml_path = app_root.join("config/studio.settings.toml");
    if toml_path.exists() {
        return load_overlay_from_toml_path(toml_path.as_path());
    }
    let json_path = app_root.join("config/studio.settings.json");
    if json_path.exists() {
        return load_overlay_from_json_path(json_path.as_path());
    }
    Ok(StudioSettingsOverlay::default())
}

/// Layers are ordered highest priority first.
pub fn merge_studio_settings_overlays(layers: &[&StudioSettingsOverlay]) -> StudioSettingsOverlay {
    fn pick<T: Clone>(
        layers: &[&StudioSettingsOverlay],
        field: impl Fn(&StudioSettingsOverlay) -> &Option<T>,
    ) -> Option<T> {
        layers.iter().find_map(|layer| field(*layer).clone())
    }

    StudioSettingsOverlay {
        api_key: pick(layers, |l| &l.api_key),
        api_base_url: pick(layers, |l| &l.api_base_url),
        image_model: pick(layers, |l| &l.image_model),
        text_model: pick(layers, |l| &l.text_model),
        request_timeout_secs: pick(layers, |l| &l.request_timeout_secs),
        max_input_dimension: pick(layers, |l| &l.max_input_dimension),
        matte_tolerance: pick(layers, |l| &l.matte_tolerance),
        matte_feather: pick(layers, |l| &l.matte_feather),
    }
}

pub fn resolve_studio_settings(overlay: &StudioSettingsOverlay) -> StudioSettings {
    let defaults = StudioSettings::default();
    StudioSettings {
        api_key: overlay.api_key.clone().or(defaults.api_key),
        api_base_url: overlay.api_base_url.clone().unwrap_or(defaults.api_base_url),
        image_model: overlay.image_model.clone().unwrap_or(defaults.image_model),
        text_model: overlay.text_model.clone().unwrap_or(defaults.text_model),
        request_timeout_secs: overlay
            .request_timeout_secs
            .unwrap_or(defaults.request_timeout_secs),
        max_input_dimension: match overlay.max_input_dimension {
            Some(0) => None,
            Some(v) => Some(v),
            None => defaults.max_input_dimension,
        },
        matte: MatteSettings {
            tolerance: overlay.matte_tolerance.unwrap_or(defaults.matte.tolerance),
            feather: overlay.matte_feather.unwrap_or(defaults.matte.feather),
        },
    }
}

pub fn parse_studio_settings_overlay_json(
    value: &Value,
) -> Result<StudioSettingsOverlay, SettingsError> {
    let root = value.as_object().ok_or(SettingsError::RootMustBeObject)?;
    let studio = root
        .get("studio")
        .unwrap_or(value)
        .as_object()
        .ok_or(SettingsError::RootMustBeObject)?;

    let mut out = StudioSettingsOverlay {
        api_key: optional_string(studio, "api_key")?,
        api_base_url: optional_string(studio, "api_base_url")?,
        image_model: optional_string(studio, "image_model")?,
        text_model: optional_string(studio, "text_model")?,
        request_timeout_secs: optional_number(studio, "request_timeout_secs")?,
        max_input_dimension: optional_number(studio, "max_input_dimension")?,
        ..StudioSettingsOverlay::default()
    };
    if let Some(matte) = studio.get("matte") {
        let matte = matte
            .as_object()
            .ok_or_else(|| SettingsError::InvalidFieldType {
                field: String::from("matte"),
            })?;
        out.matte_tolerance = optional_number_field(matte, "tolerance", "matte.tolerance")?;
        out.matte_feather = optional_number_field(matte, "feather", "matte.feather")?;
    }
    Ok(out)
}

fn overlay_from_env_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<StudioSettingsOverlay, SettingsError> {
    let get = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let number = |key: &str| -> Result<Option<u64>, SettingsError> {
        get(key)
            .map(|v| {
                v.parse::<u64>()
                    .map_err(|_| SettingsError::InvalidFieldType {
                        field: key.to_string(),
                    })
            })
            .transpose()
    };
    let max_input_dimension = number(ENV_MAX_INPUT_DIMENSION)?
        .map(|v| {
            u32::try_from(v).map_err(|_| SettingsError::InvalidFieldType {
                field: ENV_MAX_INPUT_DIMENSION.to_string(),
            })
        })
        .transpose()?;

    Ok(StudioSettingsOverlay {
        api_key: get(ENV_API_KEY).or_else(|| get(ENV_API_KEY_ALIAS)),
        api_base_url: get(ENV_BASE_URL),
        image_model: get(ENV_IMAGE_MODEL),
        text_model: get(ENV_TEXT_MODEL),
        request_timeout_secs: number(ENV_TIMEOUT_SECS)?,
        max_input_dimension,
        matte_tolerance: None,
        matte_feather: None,
    })
}

fn load_overlay_by_extension(path: &Path) -> Result<StudioSettingsOverlay, SettingsError> {
    match path
        .extension()
        .and_then(|v| v.to_str())
        .map(|v| v.to_ascii_lowercase())
    {
        Some(ext) if ext == "toml" => load_overlay_from_toml_path(path),
        _ => load_overlay_from_json_path(path),
    }
}

fn read_settings_file(path: &Path) -> Result<String, SettingsError> {
    fs::read_to_string(path).map_err(|error| SettingsError::ReadFile {
        path: path.display().to_string(),
        message: error.to_string(),
    })
}

fn load_overlay_from_json_path(path: &Path) -> Result<StudioSettingsOverlay, SettingsError> {
    let raw = read_settings_file(path)?;
    let parsed =
        serde_json::from_str::<Value>(raw.as_str()).map_err(|error| SettingsError::ParseJson {
            path: path.display().to_string(),
            message: error.to_string(),
        })?;
    parse_studio_settings_overlay_json(&parsed)
}

fn load_overlay_from_toml_path(path: &Path) -> Result<StudioSettingsOverlay, SettingsError> {
    let raw = read_settings_file(path)?;
    let parsed = toml::from_str::<toml::Value>(raw.as_str()).map_err(|error| {
        SettingsError::ParseToml {
            path: path.display().to_string(),
            message: error.to_string(),
        }
    })?;
    let json_value = serde_json::to_value(parsed).map_err(|error| SettingsError::ParseToml {
        path: path.display().to_string(),
        message: error.to_string(),
    })?;
    parse_studio_settings_overlay_json(&json_value)
}

fn optional_string(obj: &Map<String, Value>, field: &str) -> Result<Option<String>, SettingsError> {
    let Some(value) = obj.get(field) else {
        return Ok(None);
    };
    value
        .as_str()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| Some(v.to_string()))
        .ok_or_else(|| SettingsError::InvalidFieldType {
            field: field.to_string(),
        })
}

fn optional_number<T: TryFrom<u64>>(
    obj: &Map<String, Value>,
    field: &str,
) -> Result<Option<T>, SettingsError> {
    optional_number_field(obj, field, field)
}

fn optional_number_field<T: TryFrom<u64>>(
    obj: &Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<Option<T>, SettingsError> {
    let Some(value) = obj.get(key) else {
        return Ok(None);
    };
    value
        .as_u64()
        .and_then(|v| T::try_from(v).ok())
        .map(Some)
        .ok_or_else(|| SettingsError::InvalidFieldType {
            field: field.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;

    fn temp_app_root() -> PathBuf {
        let stamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        let root = std::env::temp_dir().join(format!("tryon_settings_{stamp}"));
        std::fs::create_dir_all(root.join("config")).expect("config dir should exist");
        root
    }

    #[test]
    fn parses_nested_json_overlay() {
        let overlay = parse_studio_settings_overlay_json(&json!({
            "studio": {
                "image_model": "gemini-image-x",
                "request_timeout_secs": 30,
                "max_input_dimension": 0,
                "matte": {"tolerance": 60, "feather": 10}
            }
        }))
        .expect("overlay should parse");

        assert_eq!(
            overlay,
            StudioSettingsOverlay {
                image_model: Some(String::from("gemini-image-x")),
                request_timeout_secs: Some(30),
                max_input_dimension: Some(0),
                matte_tolerance: Some(60),
                matte_feather: Some(10),
                ..StudioSettingsOverlay::default()
            }
        );
        let resolved = resolve_studio_settings(&overlay);
        assert_eq!(resolved.max_input_dimension, None);
        assert_eq!(resolved.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(resolved.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn rejects_invalid_field_types() {
        let err = parse_studio_settings_overlay_json(&json!({"matte": {"tolerance": 999}}))
            .expect_err("tolerance above u8 should fail");
        assert_eq!(
            err,
            SettingsError::InvalidFieldType {
                field: String::from("matte.tolerance")
            }
        );

        let err = parse_studio_settings_overlay_json(&json!({"image_model": 3}))
            .expect_err("numeric model should fail");
        assert_eq!(
            err,
            SettingsError::InvalidFieldType {
                field: String::from("image_model")
            }
        );

        assert_eq!(
            parse_studio_settings_overlay_json(&json!([1, 2])),
            Err(SettingsError::RootMustBeObject)
        );
    }

    #[test]
    fn env_lookup_builds_overlay_and_validates_numbers() {
        let vars = HashMap::from([
            (ENV_API_KEY_ALIAS, "alias-key"),
            (ENV_TIMEOUT_SECS, " 45 "),
            (ENV_TEXT_MODEL, ""),
        ]);
        let overlay = overlay_from_env_lookup(|k| vars.get(k).map(|v| v.to_string()))
            .expect("env overlay should parse");
        assert_eq!(overlay.api_key.as_deref(), Some("alias-key"));
        assert_eq!(overlay.request_timeout_secs, Some(45));
        assert_eq!(overlay.text_model, None);

        let bad = HashMap::from([(ENV_MAX_INPUT_DIMENSION, "huge")]);
        assert_eq!(
            overlay_from_env_lookup(|k| bad.get(k).map(|v| v.to_string())),
            Err(SettingsError::InvalidFieldType {
                field: ENV_MAX_INPUT_DIMENSION.to_string()
            })
        );
    }

    #[test]
    fn merge_prefers_earlier_layers() {
        let overrides = StudioSettingsOverlay {
            image_model: Some(String::from("override-model")),
            ..StudioSettingsOverlay::default()
        };
        let env = StudioSettingsOverlay {
            image_model: Some(String::from("env-model")),
            api_key: Some(String::from("env-key")),
            ..StudioSettingsOverlay::default()
        };
        let file = StudioSettingsOverlay {
            api_key: Some(String::from("file-key")),
            matte_feather: Some(4),
            ..StudioSettingsOverlay::default()
        };
        let merged = merge_studio_settings_overlays(&[&overrides, &env, &file]);
        assert_eq!(merged.image_model.as_deref(), Some("override-model"));
        assert_eq!(merged.api_key.as_deref(), Some("env-key"));
        assert_eq!(merged.matte_feather, Some(4));
    }

    #[test]
    fn loads_toml_settings_file_and_dotenv_from_app_root() {
        let app_root = temp_app_root();
        std::fs::write(
            app_root.join("config/studio.settings.toml"),
            "[studio]\nimage_model = \"toml-image\"\nmax_input_dimension = 1024\n\n[studio.matte]\ntolerance = 30\n",
        )
        .expect("settings file should exist");
        std::fs::write(
            app_root.join(".env"),
            "TRYON_TEST_UNUSED=1\n",
        )
        .expect(".env should exist");

        let file = load_settings_file_overlay(&app_root, None).expect("toml should load");
        assert_eq!(file.image_model.as_deref(), Some("toml-image"));
        assert_eq!(file.max_input_dimension, Some(1024));
        assert_eq!(file.matte_tolerance, Some(30));

        let overrides = StudioSettingsOverlay {
            api_key: Some(String::from("explicit")),
            image_model: Some(String::from("explicit-image")),
            ..StudioSettingsOverlay::default()
        };
        let settings =
            load_studio_settings(&app_root, None, &overrides).expect("settings should load");
        assert_eq!(settings.image_model, "explicit-image");
        assert_eq!(settings.require_api_key(), Ok("explicit"));
        assert_eq!(settings.matte.tolerance, 30);

        let _ = std::fs::remove_dir_all(app_root);
    }

    #[test]
    fn explicit_missing_settings_file_is_an_error() {
        let app_root = temp_app_root();
        let err = load_settings_file_overlay(&app_root, Some("config/missing.toml"))
            .expect_err("missing explicit file should fail");
        assert!(matches!(err, SettingsError::ReadFile { .. }));
        let _ = std::fs::remove_dir_all(app_root);
    }

    #[test]
    fn missing_api_key_is_reported() {
        let settings = StudioSettings {
            api_key: Some(String::from("   ")),
            ..StudioSettings::default()
        };
        assert_eq!(settings.require_api_key(), Err(SettingsError::MissingApiKey));
    }
}
