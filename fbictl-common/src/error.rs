use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fbictl operations
#[derive(Error, Debug)]
pub enum FbictlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Process execution error: {0}")]
    Process(#[from] ProcessError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {path:?}")]
    FileRead { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse TOML configuration: {message}")]
    TomlParse { message: String },

    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Process execution errors
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Command execution failed: {command:?}")]
    Execution { command: String, source: std::io::Error },

    #[error("Program not found in PATH: {program}")]
    NotFound { program: String },

    #[error("Command returned non-zero exit code: {code}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Failed to signal process {pid}: {message}")]
    Signal { pid: u32, message: String },

    #[error("Command was killed")]
    Killed,
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("No image to display has been set")]
    MissingTarget,

    #[error("Invalid duration: {duration}")]
    InvalidDuration { duration: String },
}

// Convenience type alias
pub type Result<T> = std::result::Result<T, FbictlError>;

impl From<toml::de::Error> for FbictlError {
    fn from(err: toml::de::Error) -> Self {
        FbictlError::Config(ConfigError::TomlParse {
            message: err.to_string(),
        })
    }
}

impl From<toml::ser::Error> for FbictlError {
    fn from(err: toml::ser::Error) -> Self {
        FbictlError::Config(ConfigError::TomlParse {
            message: err.to_string(),
        })
    }
}

// Error reporting utilities
pub trait ErrorReporting {
    fn log_error(&self, context: &str);
    fn user_friendly_message(&self) -> String;
}

impl ErrorReporting for FbictlError {
    fn log_error(&self, context: &str) {
        log::error!("{}: {:?}", context, self);
    }

    fn user_friendly_message(&self) -> String {
        match self {
            FbictlError::Config(ConfigError::FileRead { path, .. }) => {
                format!("Configuration file not found: {:?}", path)
            }
            FbictlError::Config(ConfigError::TomlParse { message }) => {
                format!("Invalid configuration format: {}", message)
            }
            FbictlError::Process(ProcessError::NotFound { program }) => {
                format!("'{}' is not installed or not in PATH", program)
            }
            FbictlError::Process(ProcessError::NonZeroExit { code, stderr }) if !stderr.trim().is_empty() => {
                format!("Viewer command failed with exit code {}: {}", code, stderr.trim())
            }
            FbictlError::Validation(ValidationError::MissingTarget) => {
                "No image given. Pass the image to display.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_error_user_friendly_message() {
        let error = ConfigError::FileRead {
            path: PathBuf::from("/nonexistent/config.toml"),
            source: io::Error::new(io::ErrorKind::NotFound, "File not found"),
        };
        let fbictl_error = FbictlError::Config(error);

        let message = fbictl_error.user_friendly_message();
        assert!(message.contains("Configuration file not found"));
        assert!(message.contains("/nonexistent/config.toml"));
    }

    #[test]
    fn test_process_error_user_friendly_message() {
        let error = ProcessError::NonZeroExit {
            code: 1,
            stderr: String::new(),
        };
        let fbictl_error = FbictlError::Process(error);

        let message = fbictl_error.user_friendly_message();
        assert!(message.contains("Command returned non-zero exit code"));
        assert!(message.contains("1"));
    }

    #[test]
    fn test_process_error_includes_stderr() {
        let fbictl_error = FbictlError::Process(ProcessError::NonZeroExit {
            code: 1,
            stderr: "ioctl VT_GETSTATE: Inappropriate ioctl for device\n".to_string(),
        });

        let message = fbictl_error.user_friendly_message();
        assert!(message.contains("exit code 1"));
        assert!(message.ends_with("Inappropriate ioctl for device"));
    }

    #[test]
    fn test_missing_program_message() {
        let fbictl_error: FbictlError = ProcessError::NotFound {
            program: "fbi".to_string(),
        }
        .into();

        assert_eq!(
            fbictl_error.user_friendly_message(),
            "'fbi' is not installed or not in PATH"
        );
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_error = toml::from_str::<toml::Value>("viewer = [").unwrap_err();
        let fbictl_error: FbictlError = toml_error.into();

        match fbictl_error {
            FbictlError::Config(ConfigError::TomlParse { .. }) => {},
            _ => panic!("Expected ConfigError::TomlParse"),
        }
    }

    #[test]
    fn test_validation_error() {
        let error = ValidationError::InvalidDuration {
            duration: "soon".to_string(),
        };
        let fbictl_error = FbictlError::Validation(error);

        let message = fbictl_error.user_friendly_message();
        assert!(message.contains("Invalid duration"));
        assert!(message.contains("soon"));
    }
}
