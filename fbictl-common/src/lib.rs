pub mod options;
pub mod launcher;
pub mod viewer;
pub mod duration;
pub mod error;

#[cfg(test)]
mod recording;

pub use options::{Flag, OptionSet};
pub use launcher::{
    Elevation, ExitReport, Invocation, OutputMode, ProcessHandle, ProcessLauncher,
    SystemLauncher, SystemProcess, TerminateMode,
};
pub use viewer::{DisplayOutcome, Fbi};
pub use duration::{parse_duration, whole_seconds};
pub use error::{FbictlError, ConfigError, ProcessError, ValidationError, Result, ErrorReporting};
