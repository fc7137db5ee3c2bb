use std::path::{Path, PathBuf};

use anyhow::Context;
use cadenza_core::ScaleKind;

#[derive(Debug, serde::Serialize, serde::Deserialize, Default)]
pub(crate) struct CliConfig {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Values used when a command leaves them out
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub(crate) struct Defaults {
    pub scale: ScaleKind,
    pub octaves: usize,
    pub chord_size: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            scale: ScaleKind::Major,
            octaves: 1,
            chord_size: 3,
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Default)]
pub(crate) struct OutputConfig {
    /// Emit JSON even without `--json`
    #[serde(default)]
    pub json: bool,
}

pub(crate) fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cadenza")
        .join("config.toml")
}

/// Missing or unreadable files fall back to defaults
pub(crate) fn load_config(path: &Path) -> CliConfig {
    let Ok(text) = std::fs::read_to_string(path) else {
        tracing::debug!("No config at {}, using defaults", path.display());
        return CliConfig::default();
    };
    match toml::from_str(&text) {
        Ok(config) => {
            tracing::debug!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
            CliConfig::default()
        }
    }
}

pub(crate) fn save_config(path: &Path, config: &CliConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let text = toml::to_string_pretty(config).context("serializing config")?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: CliConfig = toml::from_str("[defaults]\nscale = \"dorian\"\n").unwrap();
        assert_eq!(config.defaults.scale, ScaleKind::Dorian);
        assert_eq!(config.defaults.octaves, 1);
        assert_eq!(config.defaults.chord_size, 3);
        assert!(!config.output.json);
    }

    #[test]
    fn test_round_trip() {
        let mut config = CliConfig::default();
        config.defaults.scale = ScaleKind::MinorHarmonic;
        config.output.json = true;
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("minorHarmonic"));
        let back: CliConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.defaults.scale, ScaleKind::MinorHarmonic);
        assert!(back.output.json);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/cadenza/config.toml"));
        assert_eq!(config.defaults.scale, ScaleKind::Major);
    }
}
