use std::{collections::VecDeque, fmt};

use crate::process::Pid;

/// An identifier of a disk, `0..count`.
pub type DiskId = usize;

/// A pending or active read on behalf of a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskRequest {
    pub pid: Pid,
    pub filename: String,
}

/// What happened to a request handed to a disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The disk was idle and is now serving the request.
    Active,
    /// The disk is busy; the request waits at `position` in the queue (0 is next).
    Queued { position: usize },
}

/// The outcome of retiring the active request of a disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub finished: DiskRequest,
    /// The request promoted from the queue, if any.
    pub dispatched: Option<DiskRequest>,
}

/// A serial device serving one request at a time, in arrival order.
#[derive(Debug, Clone)]
pub struct Disk {
    id: DiskId,
    active: Option<DiskRequest>,
    queue: VecDeque<DiskRequest>,
}

impl Disk {
    pub fn new(id: DiskId) -> Self {
        Self {
            id,
            active: None,
            queue: VecDeque::new(),
        }
    }

    pub fn id(&self) -> DiskId {
        self.id
    }

    /// Serves the request immediately if the disk is idle, queues it otherwise.
    pub fn request_read(&mut self, pid: Pid, filename: impl Into<String>) -> Dispatch {
        let request = DiskRequest {
            pid,
            filename: filename.into(),
        };
        if self.active.is_none() {
            self.active = Some(request);
            Dispatch::Active
        } else {
            self.queue.push_back(request);
            Dispatch::Queued {
                position: self.queue.len() - 1,
            }
        }
    }

    /// Retires the active request and starts serving the head of the queue.
    pub fn complete_active(&mut self) -> Result<Completion> {
        let finished = self.active.take().ok_or(Error::NoActiveRequest(self.id))?;
        self.active = self.queue.pop_front();
        Ok(Completion {
            finished,
            dispatched: self.active.clone(),
        })
    }

    pub fn active(&self) -> Option<&DiskRequest> {
        self.active.as_ref()
    }

    pub fn queue(&self) -> impl Iterator<Item = &DiskRequest> {
        self.queue.iter()
    }

    /// Returns the active request followed by the queued ones.
    pub fn requests(&self) -> impl Iterator<Item = &DiskRequest> {
        self.active.iter().chain(self.queue.iter())
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }
}

/// The disks of the system, addressed by `DiskId`.
#[derive(Debug, Clone, Default)]
pub struct Disks {
    disks: Vec<Disk>,
}

impl Disks {
    /// Constructs `count` idle disks with identifiers `0..count`.
    pub fn new(count: usize) -> Self {
        Self {
            disks: (0..count).map(Disk::new).collect(),
        }
    }

    pub fn get(&self, id: DiskId) -> Result<&Disk> {
        self.disks.get(id).ok_or(Error::UnknownDisk(id))
    }

    pub fn get_mut(&mut self, id: DiskId) -> Result<&mut Disk> {
        self.disks.get_mut(id).ok_or(Error::UnknownDisk(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Disk> {
        self.disks.iter()
    }

    pub fn len(&self) -> usize {
        self.disks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disks.is_empty()
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    UnknownDisk(DiskId),
    NoActiveRequest(DiskId),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownDisk(id) => write!(f, "no disk with id {id}"),
            Self::NoActiveRequest(id) => write!(f, "disk {id} has no active request"),
        }
    }
}

impl std::error::Error for Error {}
