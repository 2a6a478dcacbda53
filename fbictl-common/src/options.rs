//! Ordered option set handed to the viewer binary.
//!
//! Options are kept in first-insertion order, which is also the order in
//! which they are compiled and passed on the command line. Re-setting an
//! option keeps its position; removing it and setting it again moves it to
//! the end.

use std::ffi::OsString;
use std::fmt;

/// Flags understood by `fbi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    FrameBuffer,
    Device,
    VideoMode,
    Verbose,
    NoVerbose,
    TextReading,
    Timeout,
    Gamma,
    ScrollStep,
    Autozoom,
    AutoUp,
    AutoDown,
    Random,
    Comments,
}

impl Flag {
    pub const ALL: [Flag; 14] = [
        Flag::FrameBuffer,
        Flag::Device,
        Flag::VideoMode,
        Flag::Verbose,
        Flag::NoVerbose,
        Flag::TextReading,
        Flag::Timeout,
        Flag::Gamma,
        Flag::ScrollStep,
        Flag::Autozoom,
        Flag::AutoUp,
        Flag::AutoDown,
        Flag::Random,
        Flag::Comments,
    ];

    /// Option name as it appears on the command line, without dashes.
    pub const fn name(self) -> &'static str {
        match self {
            Flag::FrameBuffer => "T",
            Flag::Device => "d",
            Flag::VideoMode => "m",
            Flag::Verbose => "v",
            Flag::NoVerbose => "noverbose",
            Flag::TextReading => "P",
            Flag::Timeout => "t",
            Flag::Gamma => "g",
            Flag::ScrollStep => "s",
            Flag::Autozoom => "a",
            Flag::AutoUp => "autoup",
            Flag::AutoDown => "autodown",
            Flag::Random => "u",
            Flag::Comments => "comments",
        }
    }

    /// The flag that cannot be present together with this one.
    pub const fn conflicts_with(self) -> Option<Flag> {
        match self {
            Flag::Verbose => Some(Flag::NoVerbose),
            Flag::NoVerbose => Some(Flag::Verbose),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Flag> {
        Flag::ALL.into_iter().find(|flag| flag.name() == name)
    }

    pub fn is_long(self) -> bool {
        self.name().len() > 1
    }

    fn dashed(self) -> String {
        if self.is_long() {
            format!("--{}", self.name())
        } else {
            format!("-{}", self.name())
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    entries: Vec<(Flag, String)>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `flag` to `value`, evicting a conflicting flag first.
    pub fn set(&mut self, flag: Flag, value: impl Into<String>) {
        if let Some(other) = flag.conflicts_with() {
            self.remove(other);
        }

        let value = value.into();
        match self.entries.iter_mut().find(|(f, _)| *f == flag) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((flag, value)),
        }
    }

    /// Marks a valueless flag as present.
    pub fn enable(&mut self, flag: Flag) {
        self.set(flag, "");
    }

    /// Removes `flag`. Removing an absent flag does nothing.
    pub fn remove(&mut self, flag: Flag) -> Option<String> {
        let position = self.entries.iter().position(|(f, _)| *f == flag)?;
        Some(self.entries.remove(position).1)
    }

    pub fn get(&self, flag: Flag) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| *f == flag)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, flag: Flag) -> bool {
        self.get(flag).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Flag, &str)> {
        self.entries.iter().map(|(flag, value)| (*flag, value.as_str()))
    }

    /// Compiles the options into a single string, as they would appear in
    /// a shell command line.
    ///
    /// Long names become `--name value ` (trailing space included), short
    /// names become `-nvalue` with no separator at all. Adjacent short
    /// flags therefore run together, e.g. `-T1-d/dev/fb0`.
    pub fn compile(&self) -> String {
        let mut compiled = String::new();
        for (flag, value) in self.iter() {
            if flag.is_long() {
                compiled.push_str(&format!("--{} {} ", flag.name(), value));
            } else {
                compiled.push_str(&format!("-{}{}", flag.name(), value));
            }
        }
        compiled
    }

    /// Argument vector form: each flag is its own argument, followed by
    /// its value when it has one.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args = Vec::with_capacity(self.entries.len() * 2);
        for (flag, value) in self.iter() {
            args.push(OsString::from(flag.dashed()));
            if !value.is_empty() {
                args.push(OsString::from(value));
            }
        }
        args
    }
}
