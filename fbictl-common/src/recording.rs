//! Launcher double that records what would have been executed.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::launcher::{ExitReport, Invocation, OutputMode, ProcessHandle, ProcessLauncher};
use crate::Result;

pub(crate) const RECORDED_PID: u32 = 4242;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    Spawned(Invocation, OutputMode),
    Ran(Invocation),
    Paused(Duration),
    Signalled(u32),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingLauncher {
    events: Rc<RefCell<Vec<Event>>>,
    viewer_exit: Option<ExitReport>,
    run_exit: Option<ExitReport>,
}

impl RecordingLauncher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Spawned viewers report this status instead of running forever.
    pub(crate) fn viewer_exits_with(mut self, code: i32, stderr: &str) -> Self {
        self.viewer_exit = Some(ExitReport { code: Some(code), stderr: stderr.to_string() });
        self
    }

    /// Every `run` finishes with this status.
    pub(crate) fn runs_exit_with(mut self, code: i32, stderr: &str) -> Self {
        self.run_exit = Some(ExitReport { code: Some(code), stderr: stderr.to_string() });
        self
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub(crate) fn runs(&self) -> Vec<Invocation> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Ran(invocation) => Some(invocation),
                _ => None,
            })
            .collect()
    }
}

impl ProcessLauncher for RecordingLauncher {
    type Handle = RecordedProcess;

    fn spawn(&self, invocation: &Invocation, output: OutputMode) -> Result<RecordedProcess> {
        self.events.borrow_mut().push(Event::Spawned(invocation.clone(), output));
        Ok(RecordedProcess {
            events: Rc::clone(&self.events),
            exit: self.viewer_exit.clone(),
        })
    }

    fn run(&self, invocation: &Invocation) -> Result<ExitReport> {
        self.events.borrow_mut().push(Event::Ran(invocation.clone()));
        self.run_exit
            .clone()
            .unwrap_or(ExitReport { code: Some(0), stderr: String::new() })
            .into_result()
    }

    fn pause(&self, duration: Duration) {
        self.events.borrow_mut().push(Event::Paused(duration));
    }
}

#[derive(Debug)]
pub(crate) struct RecordedProcess {
    events: Rc<RefCell<Vec<Event>>>,
    exit: Option<ExitReport>,
}

impl ProcessHandle for RecordedProcess {
    fn id(&self) -> u32 {
        RECORDED_PID
    }

    fn try_status(&mut self) -> Result<Option<ExitReport>> {
        Ok(self.exit.clone())
    }

    fn terminate(&mut self) -> Result<()> {
        if self.exit.is_none() {
            self.events.borrow_mut().push(Event::Signalled(RECORDED_PID));
            self.exit = Some(ExitReport { code: None, stderr: String::new() });
        }
        Ok(())
    }
}
