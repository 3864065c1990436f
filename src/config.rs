use std::{fmt, path::PathBuf};

use crate::scheduler::{Policy, UnknownPolicy};

/// Startup configuration of a simulation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub ram_size: u64,
    pub disk_count: usize,
    pub policy: Policy,
    /// A file to read commands from instead of standard input.
    pub script: Option<PathBuf>,
}

/// Command-line arguments before the machine sizes are known.
///
/// Sizes that were not given on the command line are prompted for interactively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    pub ram_size: Option<u64>,
    pub disk_count: Option<usize>,
    pub policy: Policy,
    pub script: Option<PathBuf>,
}

impl Args {
    /// Parses `[--policy fifo|priority] [RAM_SIZE DISK_COUNT [SCRIPT]]`, without the program name.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut positional = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            if arg == "--policy" {
                let value = args.next().ok_or(Error::MissingValue("--policy"))?;
                parsed.policy = value.parse()?;
            } else if let Some(value) = arg.strip_prefix("--policy=") {
                parsed.policy = value.parse()?;
            } else if arg.starts_with("--") {
                return Err(Error::UnknownOption(arg));
            } else {
                positional.push(arg);
            }
        }

        let mut positional = positional.into_iter();
        if let Some(ram_size) = positional.next() {
            parsed.ram_size = Some(parse_ram_size(&ram_size)?);
            let disk_count = positional.next().ok_or(Error::MissingValue("disk count"))?;
            parsed.disk_count = Some(parse_disk_count(&disk_count)?);
        }
        parsed.script = positional.next().map(PathBuf::from);
        if let Some(extra) = positional.next() {
            return Err(Error::TooManyArguments(extra));
        }

        Ok(parsed)
    }

    /// Completes the configuration once both sizes are known.
    pub fn into_config(self, ram_size: u64, disk_count: usize) -> Config {
        Config {
            ram_size,
            disk_count,
            policy: self.policy,
            script: self.script,
        }
    }
}

/// Parses a memory arena size, which must be a positive number of bytes.
pub fn parse_ram_size(value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(Error::InvalidRamSize(value.trim().to_string())),
        Ok(size) => Ok(size),
    }
}

/// The largest disk count a session accepts. Every disk is built at startup.
pub const MAX_DISK_COUNT: usize = 1024;

/// Parses a disk count, which may be zero but not more than `MAX_DISK_COUNT`.
pub fn parse_disk_count(value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(count) if count <= MAX_DISK_COUNT => Ok(count),
        _ => Err(Error::InvalidDiskCount(value.trim().to_string())),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    InvalidRamSize(String),
    InvalidDiskCount(String),
    Policy(UnknownPolicy),
    MissingValue(&'static str),
    UnknownOption(String),
    TooManyArguments(String),
}

impl From<UnknownPolicy> for Error {
    fn from(err: UnknownPolicy) -> Self {
        Self::Policy(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRamSize(value) => {
                write!(f, "RAM size must be a positive integer, got '{value}'")
            }
            Self::InvalidDiskCount(value) => {
                write!(
                    f,
                    "disk count must be an integer from 0 to {MAX_DISK_COUNT}, got '{value}'"
                )
            }
            Self::Policy(err) => err.fmt(f),
            Self::MissingValue(what) => write!(f, "missing value for {what}"),
            Self::UnknownOption(option) => write!(f, "unknown option {option}"),
            Self::TooManyArguments(arg) => write!(f, "too many arguments at '{arg}'"),
        }
    }
}

impl std::error::Error for Error {}
