//! Fluent builder for `fbi`, the Linux framebuffer image viewer.
//!
//! ```no_run
//! use fbictl_common::Fbi;
//!
//! Fbi::new()
//!     .with_autozoom()
//!     .display_for(5)
//!     .image("/srv/photos/cat.png")
//!     .display()?;
//! # Ok::<(), fbictl_common::FbictlError>(())
//! ```

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{FbictlError, ValidationError};
use crate::launcher::{
    Elevation, Invocation, OutputMode, ProcessHandle, ProcessLauncher, SystemLauncher,
    TerminateMode,
};
use crate::options::{Flag, OptionSet};
use crate::Result;

pub const DEFAULT_BINARY: &str = "fbi";
pub const DEFAULT_FRAME_BUFFER: &str = "1";
pub const DEFAULT_DEVICE: &str = "/dev/fb0";
pub const DEFAULT_DISPLAY_SECONDS: i64 = 10;

const KILL_BY_NAME: &str = "killall";

/// Result of [`Fbi::display`].
#[derive(Debug)]
pub enum DisplayOutcome<H> {
    /// No display period was set; the viewer keeps running.
    Running(H),
    /// The display period elapsed and the viewer was terminated.
    Terminated,
    /// The viewer quit on its own before the display period elapsed.
    Exited,
}

#[derive(Debug, Clone)]
pub struct Fbi<L = SystemLauncher> {
    options: OptionSet,
    image: Option<PathBuf>,
    display_for: i64,
    binary: String,
    elevation: Elevation,
    output: OutputMode,
    terminate_mode: TerminateMode,
    launcher: L,
}

impl Fbi<SystemLauncher> {
    pub fn new() -> Self {
        Self::with_launcher(SystemLauncher)
    }
}

impl Default for Fbi<SystemLauncher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ProcessLauncher> Fbi<L> {
    /// Builder that starts its processes through `launcher`.
    ///
    /// Starts out on frame buffer 1, device `/dev/fb0`, with the status
    /// bar hidden.
    pub fn with_launcher(launcher: L) -> Self {
        Self {
            options: OptionSet::new(),
            image: None,
            display_for: DEFAULT_DISPLAY_SECONDS,
            binary: DEFAULT_BINARY.to_string(),
            elevation: Elevation::default(),
            output: OutputMode::default(),
            terminate_mode: TerminateMode::default(),
            launcher,
        }
        .with_frame_buffer(DEFAULT_FRAME_BUFFER)
        .for_default_device()
        .without_status_bar()
    }

    /// Frame buffer to use. 1 is the local console.
    pub fn with_frame_buffer(mut self, frame_buffer: impl fmt::Display) -> Self {
        self.options.set(Flag::FrameBuffer, frame_buffer.to_string());
        self
    }

    /// Output device. Viewers started over ssh usually need something
    /// other than the default.
    pub fn for_device(mut self, device: impl Into<String>) -> Self {
        self.options.set(Flag::Device, device);
        self
    }

    pub fn for_default_device(self) -> Self {
        self.for_device(DEFAULT_DEVICE)
    }

    /// Video mode, which must be listed in `/etc/fb.modes`.
    pub fn video_mode(mut self, mode: impl Into<String>) -> Self {
        self.options.set(Flag::VideoMode, mode);
        self
    }

    pub fn show_status_bar(mut self) -> Self {
        self.options.enable(Flag::Verbose);
        self
    }

    pub fn without_status_bar(mut self) -> Self {
        self.options.enable(Flag::NoVerbose);
        self
    }

    /// Show large images without vertical offset; space scrolls down
    /// before moving to the next image.
    pub fn enable_text_reading(mut self) -> Self {
        self.options.enable(Flag::TextReading);
        self
    }

    pub fn without_text_reading(mut self) -> Self {
        self.options.remove(Flag::TextReading);
        self
    }

    /// Seconds before the viewer advances, and how long [`Fbi::display`]
    /// waits before terminating it. Zero or less keeps it open.
    pub fn display_for(mut self, seconds: i64) -> Self {
        self.options.set(Flag::Timeout, seconds.to_string());
        self.display_for = seconds;
        self
    }

    pub fn with_gamma_correction(mut self) -> Self {
        self.options.enable(Flag::Gamma);
        self
    }

    pub fn without_gamma_correction(mut self) -> Self {
        self.options.remove(Flag::Gamma);
        self
    }

    /// Scroll step in pixels.
    pub fn scroll_steps(mut self, steps: i64) -> Self {
        self.options.set(Flag::ScrollStep, steps.to_string());
        self
    }

    pub fn with_autozoom(mut self) -> Self {
        self.options.enable(Flag::Autozoom);
        self
    }

    pub fn disable_autozoom(mut self) -> Self {
        self.options.remove(Flag::Autozoom);
        self
    }

    /// Like autozoom, but only ever scales up.
    pub fn auto_up(mut self) -> Self {
        self.options.enable(Flag::AutoUp);
        self
    }

    pub fn no_auto_up(mut self) -> Self {
        self.options.remove(Flag::AutoUp);
        self
    }

    /// Like autozoom, but only ever scales down.
    pub fn auto_down(mut self) -> Self {
        self.options.enable(Flag::AutoDown);
        self
    }

    pub fn no_auto_down(mut self) -> Self {
        self.options.remove(Flag::AutoDown);
        self
    }

    pub fn in_random_order(mut self) -> Self {
        self.options.enable(Flag::Random);
        self
    }

    pub fn in_order(mut self) -> Self {
        self.options.remove(Flag::Random);
        self
    }

    /// Show comment tags instead of the file name.
    pub fn with_comments(mut self) -> Self {
        self.options.enable(Flag::Comments);
        self
    }

    pub fn without_comments(mut self) -> Self {
        self.options.remove(Flag::Comments);
        self
    }

    /// Image to display. Replaces any previous one.
    pub fn image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image = Some(path.into());
        self
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_elevation(mut self, elevation: Elevation) -> Self {
        self.elevation = elevation;
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn with_terminate_mode(mut self, mode: TerminateMode) -> Self {
        self.terminate_mode = mode;
        self
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn target(&self) -> Option<&Path> {
        self.image.as_deref()
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn elevation(&self) -> &Elevation {
        &self.elevation
    }

    pub fn output(&self) -> OutputMode {
        self.output
    }

    pub fn terminate_mode(&self) -> TerminateMode {
        self.terminate_mode
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// How long [`Fbi::display`] blocks, or `None` to leave the viewer open.
    pub fn display_duration(&self) -> Option<Duration> {
        u64::try_from(self.display_for)
            .ok()
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs)
    }

    pub fn compile_options(&self) -> String {
        self.options.compile()
    }

    /// Arguments passed to the viewer binary, target last.
    pub fn arguments(&self) -> Result<Vec<OsString>> {
        let image = self.image.as_ref()
            .ok_or(FbictlError::Validation(ValidationError::MissingTarget))?;

        let mut args = self.options.to_args();
        args.push(image.clone().into_os_string());
        Ok(args)
    }

    pub fn invocation(&self) -> Result<Invocation> {
        Ok(self.elevation.wrap(&self.binary, self.arguments()?))
    }

    pub fn kill_invocation(&self) -> Invocation {
        self.elevation.wrap(KILL_BY_NAME, vec![OsString::from(&self.binary)])
    }

    /// The equivalent shell command line, for diagnostics only.
    pub fn command_line(&self) -> String {
        let program = match self.elevation.helper() {
            Some(helper) => format!("{} {}", helper, self.binary),
            None => self.binary.clone(),
        };
        let target = self.image.as_deref()
            .map(|path| path.to_string_lossy().to_string())
            .unwrap_or_default();

        format!("{} {} {} > /dev/null 2>&1", program, self.compile_options(), target)
    }

    /// Starts the viewer.
    ///
    /// With a display period the call blocks for that long and then ends
    /// the viewer according to the terminate mode. Without one it returns
    /// straight away with a handle to the running viewer, whose stderr is
    /// discarded rather than captured.
    pub fn display(&self) -> Result<DisplayOutcome<L::Handle>> {
        let invocation = self.invocation()?;
        log::debug!("Equivalent shell command: {}", self.command_line());

        let mut handle = self.launcher.spawn(&invocation, self.spawn_output())?;

        let Some(duration) = self.display_duration() else {
            log::info!("Displaying {:?} until stopped (pid {})", self.image, handle.id());
            return Ok(DisplayOutcome::Running(handle));
        };

        log::info!("Displaying {:?} for {}s", self.image, duration.as_secs());
        self.launcher.pause(duration);

        let exited = match handle.try_status()? {
            Some(report) => {
                report.into_result()?;
                true
            }
            None => false,
        };

        match self.terminate_mode {
            TerminateMode::Process if exited => {
                log::info!("Viewer pid {} exited before the display period ended", handle.id());
                return Ok(DisplayOutcome::Exited);
            }
            TerminateMode::Process => handle.terminate()?,
            TerminateMode::ByName => self.terminate()?,
        }

        Ok(DisplayOutcome::Terminated)
    }

    // Nobody reads a captured stderr pipe once the handle of an open-ended
    // viewer is dropped, and a write to the closed pipe would kill it.
    fn spawn_output(&self) -> OutputMode {
        match (self.output, self.display_duration()) {
            (OutputMode::Capture, None) => OutputMode::Discard,
            (output, _) => output,
        }
    }

    /// Kills every process named like the viewer binary, not only the
    /// one started by this builder.
    pub fn terminate(&self) -> Result<()> {
        let invocation = self.kill_invocation();
        log::info!("Terminating all '{}' processes", self.binary);
        self.launcher.run(&invocation)?;
        Ok(())
    }
}
