use std::{collections::BTreeMap, fmt};

use crate::{disk::DiskId, memory::BlockAddr};

/// An identifier of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(u64);

impl Pid {
    /// The first identifier handed out by a `ProcessTable`.
    pub const FIRST: Self = Self(1);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Ready,
    Running,
    WaitingIo,
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::WaitingIo => "WAITING_IO",
            Self::Terminated => "TERMINATED",
        };
        f.write_str(name)
    }
}

/// A disk read a process is blocked on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoRequest {
    pub disk: DiskId,
    pub filename: String,
}

/// A process control block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pcb {
    pub pid: Pid,
    pub priority: u32,
    pub ram_size: u64,
    pub state: ProcessState,
    /// Start of the memory block the process resides in.
    pub block: BlockAddr,
    pub io: Option<IoRequest>,
}

/// The set of live processes.
#[derive(Debug, Clone)]
pub struct ProcessTable {
    pcbs: BTreeMap<Pid, Pcb>,
    next_pid: Pid,
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self {
            pcbs: BTreeMap::new(),
            next_pid: Pid::FIRST,
        }
    }
}

impl ProcessTable {
    /// Returns the identifier the next admitted process will get.
    pub fn next_pid(&self) -> Pid {
        self.next_pid
    }

    /// Admits a new `Ready` process residing in the block at `block`.
    /// Identifiers are never reused.
    pub fn admit(&mut self, priority: u32, ram_size: u64, block: BlockAddr) -> Result<Pid> {
        if priority == 0 {
            return Err(Error::InvalidArgument("priority"));
        }
        if ram_size == 0 {
            return Err(Error::InvalidArgument("ram size"));
        }

        let pid = self.next_pid;
        self.next_pid = pid.next();
        self.pcbs.insert(
            pid,
            Pcb {
                pid,
                priority,
                ram_size,
                state: ProcessState::Ready,
                block,
                io: None,
            },
        );
        Ok(pid)
    }

    pub fn lookup(&self, pid: Pid) -> Result<&Pcb> {
        self.pcbs.get(&pid).ok_or(Error::UnknownPid(pid))
    }

    pub fn lookup_mut(&mut self, pid: Pid) -> Result<&mut Pcb> {
        self.pcbs.get_mut(&pid).ok_or(Error::UnknownPid(pid))
    }

    /// Removes a process, returning its final `Terminated` control block.
    pub fn remove(&mut self, pid: Pid) -> Result<Pcb> {
        let mut pcb = self.pcbs.remove(&pid).ok_or(Error::UnknownPid(pid))?;
        pcb.state = ProcessState::Terminated;
        pcb.io = None;
        Ok(pcb)
    }

    pub fn set_state(&mut self, pid: Pid, state: ProcessState) -> Result<()> {
        self.lookup_mut(pid)?.state = state;
        Ok(())
    }

    pub fn set_io(&mut self, pid: Pid, io: Option<IoRequest>) -> Result<()> {
        self.lookup_mut(pid)?.io = io;
        Ok(())
    }

    /// Returns the live processes in ascending pid order.
    pub fn iter(&self) -> impl Iterator<Item = &Pcb> {
        self.pcbs.values()
    }

    pub fn all_ready(&self) -> impl Iterator<Item = &Pcb> {
        self.iter().filter(|pcb| pcb.state == ProcessState::Ready)
    }

    pub fn running(&self) -> Option<&Pcb> {
        self.iter().find(|pcb| pcb.state == ProcessState::Running)
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.pcbs.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.pcbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pcbs.is_empty()
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    InvalidArgument(&'static str),
    UnknownPid(Pid),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(field) => write!(f, "{field} must be a positive integer"),
            Self::UnknownPid(pid) => write!(f, "no process with PID {pid}"),
        }
    }
}

impl std::error::Error for Error {}
