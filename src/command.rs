use std::fmt;

use crate::{disk::DiskId, kernel};

/// One line of the command protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `A priority ramSize`
    Spawn { priority: u32, ram_size: u64 },
    /// `t`
    Terminate,
    /// `d diskId filename`
    DiskRead { disk: DiskId, filename: String },
    /// `D diskId`
    DiskComplete { disk: DiskId },
    /// `Sr`
    ShowProcesses,
    /// `Si`
    ShowDisks,
    /// `Sm`
    ShowMemory,
    Help,
    Exit,
}

impl Command {
    /// Parses a line, returning `None` for a blank one.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return Ok(None);
        };

        let command = match name {
            "A" => {
                let priority = positive(tokens.next(), "priority")?;
                let ram_size = positive(tokens.next(), "ram size")?;
                Self::Spawn { priority, ram_size }
            }
            "t" => Self::Terminate,
            "d" => {
                let disk = disk_id(tokens.next())?;
                let filename = tokens
                    .next()
                    .ok_or(kernel::Error::InvalidArgument("filename"))?
                    .to_string();
                Self::DiskRead { disk, filename }
            }
            "D" => Self::DiskComplete {
                disk: disk_id(tokens.next())?,
            },
            "Sr" => Self::ShowProcesses,
            "Si" => Self::ShowDisks,
            "Sm" => Self::ShowMemory,
            "help" => Self::Help,
            "exit" => Self::Exit,
            _ => return Err(Error::Unknown(name.to_string())),
        };

        if let Some(extra) = tokens.next() {
            return Err(Error::Unexpected(extra.to_string()));
        }
        Ok(Some(command))
    }
}

fn positive<T>(token: Option<&str>, field: &'static str) -> Result<T>
where
    T: std::str::FromStr + Default + PartialEq,
{
    match token.map(str::parse::<T>) {
        Some(Ok(value)) if value != T::default() => Ok(value),
        _ => Err(kernel::Error::InvalidArgument(field).into()),
    }
}

fn disk_id(token: Option<&str>) -> Result<DiskId> {
    token
        .and_then(|token| token.parse().ok())
        .ok_or(Error::Invalid(kernel::Error::InvalidArgument("disk id")))
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The first token names no command.
    Unknown(String),
    /// A trailing token after a complete command.
    Unexpected(String),
    /// A missing or malformed argument.
    Invalid(kernel::Error),
}

impl From<kernel::Error> for Error {
    fn from(err: kernel::Error) -> Self {
        Self::Invalid(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(name) => write!(f, "unknown command '{name}'"),
            Self::Unexpected(token) => write!(f, "unexpected argument '{token}'"),
            Self::Invalid(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {}
