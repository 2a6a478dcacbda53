use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use fbictl_common::{
    whole_seconds, ConfigError, Elevation, Fbi, FbictlError, OutputMode, Result, TerminateMode,
};
use fbictl_common::viewer::{DEFAULT_BINARY, DEFAULT_DEVICE, DEFAULT_FRAME_BUFFER};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewerConfig {
    #[serde(default = "default_binary")]
    pub binary: String,
    #[serde(default)]
    pub elevation: Elevation,
    #[serde(default = "default_frame_buffer")]
    pub frame_buffer: String,
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_mode: Option<String>,
    /// `None` keeps the builder's own default.
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_steps: Option<i64>,
    #[serde(default)]
    pub status_bar: bool,
    #[serde(default)]
    pub autozoom: bool,
    #[serde(default)]
    pub gamma_correction: bool,
    #[serde(default)]
    pub comments: bool,
    #[serde(default)]
    pub output: OutputMode,
    #[serde(default)]
    pub terminate: TerminateMode,
}

// Default values
fn default_binary() -> String {
    DEFAULT_BINARY.to_string()
}

fn default_frame_buffer() -> String {
    DEFAULT_FRAME_BUFFER.to_string()
}

fn default_device() -> String {
    DEFAULT_DEVICE.to_string()
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            elevation: Elevation::default(),
            frame_buffer: default_frame_buffer(),
            device: default_device(),
            video_mode: None,
            duration: None,
            scroll_steps: None,
            status_bar: false,
            autozoom: false,
            gamma_correction: false,
            comments: false,
            output: OutputMode::default(),
            terminate: TerminateMode::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_path()?)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            log::debug!("No configuration at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FbictlError::Config(ConfigError::FileRead {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "File not found"),
            }));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| FbictlError::Config(ConfigError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| FbictlError::Config(ConfigError::TomlParse {
                message: e.to_string(),
            }))?;

        config.validate()?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(FbictlError::Config(ConfigError::NoConfigDir))?
            .join("fbictl");

        Ok(config_dir.join("config.toml"))
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// A viewer builder seeded from this configuration.
    pub fn viewer(&self) -> Result<Fbi> {
        self.viewer.builder()
    }

    fn validate(&self) -> Result<()> {
        self.viewer.validate()
    }
}

impl ViewerConfig {
    pub fn builder(&self) -> Result<Fbi> {
        let mut fbi = Fbi::new()
            .with_binary(self.binary.as_str())
            .with_elevation(self.elevation.clone())
            .with_output(self.output)
            .with_terminate_mode(self.terminate)
            .with_frame_buffer(&self.frame_buffer)
            .for_device(self.device.as_str());

        if let Some(mode) = &self.video_mode {
            fbi = fbi.video_mode(mode.as_str());
        }
        if let Some(duration) = self.duration {
            fbi = fbi.display_for(whole_seconds(duration)?);
        }
        if let Some(steps) = self.scroll_steps {
            fbi = fbi.scroll_steps(steps);
        }
        if self.status_bar {
            fbi = fbi.show_status_bar();
        }
        if self.autozoom {
            fbi = fbi.with_autozoom();
        }
        if self.gamma_correction {
            fbi = fbi.with_gamma_correction();
        }
        if self.comments {
            fbi = fbi.with_comments();
        }

        Ok(fbi)
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("binary", &self.binary),
            ("frame_buffer", &self.frame_buffer),
            ("device", &self.device),
        ] {
            if value.trim().is_empty() {
                return Err(FbictlError::Config(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.clone(),
                }));
            }
        }

        if let Elevation::Command(helper) = &self.elevation {
            if helper.split_whitespace().count() > 1 {
                return Err(FbictlError::Config(ConfigError::InvalidValue {
                    field: "elevation".to_string(),
                    value: helper.clone(),
                }));
            }
        }

        if let Some(duration) = self.duration {
            if whole_seconds(duration).is_err() {
                return Err(FbictlError::Config(ConfigError::InvalidValue {
                    field: "duration".to_string(),
                    value: format!("{:?}", duration),
                }));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbictl_common::Flag;
    use tempfile::tempdir;
    use std::fs;

    #[test]
    fn test_defaults_match_builder_defaults() {
        let config = Config::default();
        let fbi = config.viewer().unwrap();

        assert_eq!(fbi.compile_options(), Fbi::new().compile_options());
        assert_eq!(fbi.display_duration(), Some(Duration::from_secs(10)));
        assert_eq!(fbi.elevation(), &Elevation::Sudo);
    }

    #[test]
    fn test_duration_deserialization() {
        let toml_str = r#"
            [viewer]
            duration = "1m 30s"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.viewer.duration, Some(Duration::from_secs(90)));

        let fbi = config.viewer().unwrap();
        assert_eq!(fbi.options().get(Flag::Timeout), Some("90"));
    }

    #[test]
    fn test_zero_duration_is_indefinite() {
        let config: Config = toml::from_str("[viewer]\nduration = \"0s\"\n").unwrap();
        let fbi = config.viewer().unwrap();
        assert_eq!(fbi.display_duration(), None);
    }

    #[test]
    fn test_viewer_settings() {
        let toml_str = r#"
            [viewer]
            binary = "fbi"
            elevation = "none"
            frame_buffer = "2"
            device = "/dev/fb1"
            video_mode = "1024x768-76"
            status_bar = true
            autozoom = true
            output = "discard"
            terminate = "by-name"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        config.validate().unwrap();

        let fbi = config.viewer().unwrap();
        assert_eq!(fbi.elevation(), &Elevation::None);
        assert_eq!(fbi.output(), OutputMode::Discard);
        assert_eq!(fbi.terminate_mode(), TerminateMode::ByName);
        assert_eq!(fbi.compile_options(), "-T2-d/dev/fb1-m1024x768-76-v-a");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.viewer.device = "  ".to_string();
        assert!(config.validate().is_err());

        config.viewer.device = default_device();
        config.viewer.duration = Some(Duration::from_millis(2500));
        match config.validate() {
            Err(FbictlError::Config(ConfigError::InvalidValue { field, .. })) => {
                assert_eq!(field, "duration");
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }

        config.viewer.duration = None;
        config.viewer.elevation = Elevation::Command("sudo -n".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_output_mode_fails() {
        let result: std::result::Result<Config, _> = toml::from_str("[viewer]\noutput = \"loud\"\n");
        assert!(result.is_err(), "Unknown output mode should fail to parse");
    }

    #[test]
    fn test_to_toml_round_trip() {
        let mut config = Config::default();
        config.viewer.duration = Some(Duration::from_secs(5));
        config.viewer.terminate = TerminateMode::ByName;

        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("duration = \"5s\""));
        assert!(rendered.contains("terminate = \"by-name\""));
        assert!(rendered.contains("elevation = \"sudo\""));

        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.viewer.duration, Some(Duration::from_secs(5)));
        assert_eq!(parsed.viewer.terminate, TerminateMode::ByName);
    }

    #[test]
    fn test_config_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let config_content = r#"
            [viewer]
            duration = "3s"
            scroll_steps = 25
            comments = true
        "#;

        fs::write(&config_path, config_content).unwrap();

        let config = Config::load_from_path(&config_path).unwrap();
        let fbi = config.viewer().unwrap();
        assert_eq!(
            fbi.compile_options(),
            "-T1-d/dev/fb0--noverbose  -t3-s25--comments  "
        );
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&config_path);
        assert!(result.is_err());

        match result.unwrap_err() {
            FbictlError::Config(ConfigError::FileRead { .. }) => {},
            _ => panic!("Expected ConfigError::FileRead"),
        }
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");

        let invalid_content = r#"
            [viewer]
            duration = "invalid"
        "#;

        fs::write(&config_path, invalid_content).unwrap();

        let result = Config::load_from_path(&config_path);
        assert!(result.is_err());

        match result.unwrap_err() {
            FbictlError::Config(ConfigError::TomlParse { .. }) => {},
            _ => panic!("Expected ConfigError::TomlParse"),
        }
    }
}
