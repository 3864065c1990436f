use std::fmt;

use crate::{
    disk::{self, DiskId},
    memory,
    process::{self, Pid},
};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A missing, non-numeric or non-positive argument, naming the field.
    InvalidArgument(&'static str),
    InsufficientMemory { requested: u64 },
    UnknownPid(Pid),
    UnknownDisk(DiskId),
    NoRunningProcess,
    NoActiveRequest(DiskId),

    /// An allocator fault that has no command-level meaning.
    Memory(memory::Error),
}

impl From<memory::Error> for Error {
    fn from(err: memory::Error) -> Self {
        match err {
            memory::Error::InvalidSize => Self::InvalidArgument("ram size"),
            err => Self::Memory(err),
        }
    }
}

impl From<process::Error> for Error {
    fn from(err: process::Error) -> Self {
        match err {
            process::Error::InvalidArgument(field) => Self::InvalidArgument(field),
            process::Error::UnknownPid(pid) => Self::UnknownPid(pid),
        }
    }
}

impl From<disk::Error> for Error {
    fn from(err: disk::Error) -> Self {
        match err {
            disk::Error::UnknownDisk(id) => Self::UnknownDisk(id),
            disk::Error::NoActiveRequest(id) => Self::NoActiveRequest(id),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(field) => write!(f, "invalid {field}"),
            Self::InsufficientMemory { requested } => {
                write!(f, "not enough contiguous memory for {requested} bytes")
            }
            Self::UnknownPid(pid) => write!(f, "no process with PID {pid}"),
            Self::UnknownDisk(id) => write!(f, "no disk with id {id}"),
            Self::NoRunningProcess => write!(f, "no process is running"),
            Self::NoActiveRequest(id) => write!(f, "disk {id} has no active request"),
            Self::Memory(err) => write!(f, "memory fault: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Memory(err) => Some(err),
            _ => None,
        }
    }
}
