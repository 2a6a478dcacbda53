use std::ffi::OsString;
use std::fmt;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FbictlError, ProcessError};
use crate::Result;

/// Helper used to run the viewer with the privileges the framebuffer needs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Elevation {
    None,
    #[default]
    Sudo,
    Command(String),
}

impl Elevation {
    pub fn helper(&self) -> Option<&str> {
        match self {
            Elevation::None => None,
            Elevation::Sudo => Some("sudo"),
            Elevation::Command(command) => Some(command.as_str()),
        }
    }

    /// Builds the invocation of `program`, prefixed by the helper if any.
    pub fn wrap(&self, program: &str, args: Vec<OsString>) -> Invocation {
        match self.helper() {
            None => Invocation::new(program, args),
            Some(helper) => {
                let mut wrapped = Vec::with_capacity(args.len() + 1);
                wrapped.push(OsString::from(program));
                wrapped.extend(args);
                Invocation::new(helper, wrapped)
            }
        }
    }
}

impl From<String> for Elevation {
    fn from(value: String) -> Self {
        match value.trim() {
            "" | "none" => Elevation::None,
            "sudo" => Elevation::Sudo,
            other => Elevation::Command(other.to_string()),
        }
    }
}

impl From<Elevation> for String {
    fn from(value: Elevation) -> Self {
        value.helper().unwrap_or("none").to_string()
    }
}

/// What happens to the viewer's stdout and stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Keep stderr for error reports, drop stdout.
    #[default]
    Capture,
    /// Drop everything, like `> /dev/null 2>&1`.
    Discard,
    /// Share the caller's stdout and stderr.
    Inherit,
}

impl OutputMode {
    fn stdout(self) -> Stdio {
        match self {
            OutputMode::Inherit => Stdio::inherit(),
            OutputMode::Capture | OutputMode::Discard => Stdio::null(),
        }
    }

    fn stderr(self) -> Stdio {
        match self {
            OutputMode::Capture => Stdio::piped(),
            OutputMode::Discard => Stdio::null(),
            OutputMode::Inherit => Stdio::inherit(),
        }
    }
}

/// How a timed display ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminateMode {
    /// Signal the launched process, unless it already exited.
    #[default]
    Process,
    /// `killall` every process named like the viewer binary.
    ByName,
}

/// A program plus its discrete arguments. Never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    /// `None` when the process was ended by a signal.
    pub code: Option<i32>,
    pub stderr: String,
}

impl ExitReport {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn into_result(self) -> Result<ExitReport> {
        match self.code {
            Some(0) => Ok(self),
            Some(code) => Err(FbictlError::Process(ProcessError::NonZeroExit {
                code,
                stderr: self.stderr,
            })),
            None => Err(FbictlError::Process(ProcessError::Killed)),
        }
    }
}

pub trait ProcessHandle {
    fn id(&self) -> u32;

    /// Exit report if the process has finished, without blocking.
    fn try_status(&mut self) -> Result<Option<ExitReport>>;

    /// Ends this process only. Does nothing if it already exited.
    fn terminate(&mut self) -> Result<()>;
}

/// Starts processes on behalf of the viewer.
pub trait ProcessLauncher {
    type Handle: ProcessHandle;

    /// Starts `invocation` and returns without waiting for it.
    fn spawn(&self, invocation: &Invocation, output: OutputMode) -> Result<Self::Handle>;

    /// Runs `invocation` to completion. A non-zero exit is an error.
    fn run(&self, invocation: &Invocation) -> Result<ExitReport>;

    /// Blocks the caller for the display period.
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Launches real processes with `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl SystemLauncher {
    fn command(invocation: &Invocation) -> Result<Command> {
        let program = which::which(&invocation.program).map_err(|_| {
            FbictlError::Process(ProcessError::NotFound {
                program: invocation.program.clone(),
            })
        })?;

        let mut cmd = Command::new(program);
        cmd.args(&invocation.args);
        Ok(cmd)
    }
}

impl ProcessLauncher for SystemLauncher {
    type Handle = SystemProcess;

    fn spawn(&self, invocation: &Invocation, output: OutputMode) -> Result<SystemProcess> {
        let mut cmd = Self::command(invocation)?;
        cmd.stdout(output.stdout()).stderr(output.stderr());

        log::debug!("Spawning: {:?}", cmd);

        let child = cmd.spawn()
            .map_err(|e| FbictlError::Process(ProcessError::Execution {
                command: invocation.command_line(),
                source: e,
            }))?;

        log::info!("Started '{}' with pid {}", invocation.program, child.id());
        Ok(SystemProcess { child, exit: None })
    }

    fn run(&self, invocation: &Invocation) -> Result<ExitReport> {
        let mut cmd = Self::command(invocation)?;

        log::debug!("Running: {:?}", cmd);

        let output = cmd.output()
            .map_err(|e| FbictlError::Process(ProcessError::Execution {
                command: invocation.command_line(),
                source: e,
            }))?;

        let report = ExitReport {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !report.success() {
            log::error!("'{}' failed with exit code {}: {}",
                invocation, report.code.unwrap_or(-1), report.stderr.trim());
        }

        report.into_result()
    }
}

/// A viewer started by [`SystemLauncher`].
#[derive(Debug)]
pub struct SystemProcess {
    child: Child,
    exit: Option<ExitReport>,
}

impl SystemProcess {
    fn record_exit(&mut self, status: ExitStatus) -> ExitReport {
        let mut stderr = Vec::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            if let Err(e) = pipe.read_to_end(&mut stderr) {
                log::warn!("Could not read stderr of pid {}: {}", self.child.id(), e);
            }
        }

        let report = ExitReport {
            code: status.code(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
        };
        self.exit = Some(report.clone());
        report
    }

    fn wait_error(&self, source: std::io::Error) -> FbictlError {
        FbictlError::Process(ProcessError::Execution {
            command: format!("wait for pid {}", self.child.id()),
            source,
        })
    }
}

impl ProcessHandle for SystemProcess {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn try_status(&mut self) -> Result<Option<ExitReport>> {
        if let Some(report) = &self.exit {
            return Ok(Some(report.clone()));
        }

        match self.child.try_wait() {
            Ok(Some(status)) => Ok(Some(self.record_exit(status))),
            Ok(None) => Ok(None),
            Err(e) => Err(self.wait_error(e)),
        }
    }

    fn terminate(&mut self) -> Result<()> {
        if self.try_status()?.is_some() {
            log::debug!("pid {} already exited", self.id());
            return Ok(());
        }

        let pid = self.id();
        let target = i32::try_from(pid)
            .ok()
            .and_then(rustix::process::Pid::from_raw)
            .ok_or_else(|| FbictlError::Process(ProcessError::Signal {
                pid,
                message: "not a valid process id".to_string(),
            }))?;

        // The elevation helper relays SIGTERM to the viewer it started.
        match rustix::process::kill_process(target, rustix::process::Signal::Term) {
            Ok(()) => {}
            Err(errno) if errno == rustix::io::Errno::SRCH => {
                log::debug!("pid {} vanished before it could be signalled", pid);
            }
            Err(errno) => {
                return Err(FbictlError::Process(ProcessError::Signal {
                    pid,
                    message: errno.to_string(),
                }));
            }
        }

        let status = self.child.wait().map_err(|e| self.wait_error(e))?;
        let report = self.record_exit(status);
        log::info!("Viewer pid {} terminated ({:?})", pid, report.code);
        Ok(())
    }
}
