mod error;
pub use error::{Error, Result};


use std::collections::HashMap;

use log::info;

use crate::{
    config::Config,
    disk::{Disk, DiskId, DiskRequest, Dispatch, Disks},
    memory::{self, BlockAddr, Memory, MemoryBlock},
    process::{IoRequest, Pcb, Pid, ProcessState, ProcessTable},
    scheduler::{Policy, Scheduler},
};

/// The outcome of `Kernel::spawn`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spawned {
    pub pid: Pid,
    pub priority: u32,
    pub ram_size: u64,
    pub block: BlockAddr,
    /// Whether the process got the CPU right away.
    pub running: bool,
}

/// The outcome of `Kernel::terminate_running`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminated {
    pub pid: Pid,
    pub next: Option<Pid>,
}

/// The outcome of `Kernel::request_disk_read`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoIssued {
    pub pid: Pid,
    pub disk: DiskId,
    pub filename: String,
    pub dispatch: Dispatch,
    pub next: Option<Pid>,
}

/// The outcome of `Kernel::complete_disk_request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoCompleted {
    pub disk: DiskId,
    pub finished: DiskRequest,
    pub dispatched: Option<DiskRequest>,
    /// The process that got the CPU because of the completion, if any.
    pub promoted: Option<Pid>,
}

/// A simulated single-CPU machine.
///
/// Every operation either succeeds completely or fails before mutating anything.
#[derive(Debug, Clone)]
pub struct Kernel {
    memory: Memory,
    processes: ProcessTable,
    disks: Disks,
    scheduler: Scheduler,
}

impl Kernel {
    /// Constructs a kernel with `ram_size` bytes of memory and `disk_count` disks, scheduling
    /// in arrival order.
    ///
    /// # Panics
    /// Panics if `ram_size` is zero.
    pub fn new(ram_size: u64, disk_count: usize) -> Self {
        Self::with_policy(ram_size, disk_count, Policy::default())
    }

    /// # Panics
    /// Panics if `ram_size` is zero.
    pub fn with_policy(ram_size: u64, disk_count: usize, policy: Policy) -> Self {
        Self {
            memory: Memory::new(ram_size),
            processes: ProcessTable::default(),
            disks: Disks::new(disk_count),
            scheduler: Scheduler::new(policy),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_policy(config.ram_size, config.disk_count, config.policy)
    }

    /// Creates a process, reserving its memory before admitting it.
    pub fn spawn(&mut self, priority: u32, ram_size: u64) -> Result<Spawned> {
        if priority == 0 {
            return Err(Error::InvalidArgument("priority"));
        }
        if ram_size == 0 {
            return Err(Error::InvalidArgument("ram size"));
        }

        let pid = self.processes.next_pid();
        let block = match self.memory.allocate(ram_size, pid) {
            Ok(block) => block,
            Err(memory::Error::NoSpace) => {
                return Err(Error::InsufficientMemory {
                    requested: ram_size,
                });
            }
            Err(err) => return Err(err.into()),
        };

        let admitted = match self.processes.admit(priority, ram_size, block) {
            Ok(admitted) => admitted,
            Err(err) => {
                self.memory.free(block)?;
                return Err(err.into());
            }
        };
        assert_eq!(admitted, pid, "admitted process must own its block");

        let promoted = self.scheduler.on_process_ready(pid, priority);
        self.mark_running(promoted)?;
        info!(
            "spawned process {pid} (priority {priority}, {ram_size} bytes at {block}), {} bytes free",
            self.memory.available()
        );

        self.debug_check();
        Ok(Spawned {
            pid,
            priority,
            ram_size,
            block,
            running: promoted == Some(pid),
        })
    }

    /// Terminates the running process, freeing its memory and promoting the next ready one.
    pub fn terminate_running(&mut self) -> Result<Terminated> {
        let pid = self.scheduler.running().ok_or(Error::NoRunningProcess)?;
        let block = self.processes.lookup(pid)?.block;

        self.memory.free(block)?;
        self.processes.remove(pid)?;
        let next = self.scheduler.on_running_terminated_or_blocked();
        self.mark_running(next)?;
        info!("terminated process {pid}");

        self.debug_check();
        Ok(Terminated { pid, next })
    }

    /// Blocks the running process on a read of `filename` from `disk`.
    pub fn request_disk_read(&mut self, disk: DiskId, filename: &str) -> Result<IoIssued> {
        let pid = self.scheduler.running().ok_or(Error::NoRunningProcess)?;
        self.disks.get(disk)?;
        if filename.is_empty() || filename.contains(char::is_whitespace) {
            return Err(Error::InvalidArgument("filename"));
        }

        let dispatch = self.disks.get_mut(disk)?.request_read(pid, filename);
        self.processes.set_state(pid, ProcessState::WaitingIo)?;
        self.processes.set_io(
            pid,
            Some(IoRequest {
                disk,
                filename: filename.to_string(),
            }),
        )?;
        let next = self.scheduler.on_running_terminated_or_blocked();
        self.mark_running(next)?;
        info!("process {pid} waiting on disk {disk} for {filename} ({dispatch:?})");

        self.debug_check();
        Ok(IoIssued {
            pid,
            disk,
            filename: filename.to_string(),
            dispatch,
            next,
        })
    }

    /// Retires the active request of `disk`, returning its process to the ready queue.
    pub fn complete_disk_request(&mut self, disk: DiskId) -> Result<IoCompleted> {
        let active = self
            .disks
            .get(disk)?
            .active()
            .ok_or(Error::NoActiveRequest(disk))?;
        let priority = self.processes.lookup(active.pid)?.priority;

        let completion = self.disks.get_mut(disk)?.complete_active()?;
        let pid = completion.finished.pid;
        self.processes.set_state(pid, ProcessState::Ready)?;
        self.processes.set_io(pid, None)?;
        let promoted = self.scheduler.on_process_ready(pid, priority);
        self.mark_running(promoted)?;
        info!(
            "disk {disk} finished {} for process {pid}",
            completion.finished.filename
        );

        self.debug_check();
        Ok(IoCompleted {
            disk,
            finished: completion.finished,
            dispatched: completion.dispatched,
            promoted,
        })
    }

    fn mark_running(&mut self, promoted: Option<Pid>) -> Result<()> {
        if let Some(pid) = promoted {
            self.processes.set_state(pid, ProcessState::Running)?;
        }
        Ok(())
    }

    /// Returns the running process followed by the ready queue in promotion order.
    pub fn processes(&self) -> Vec<&Pcb> {
        self.scheduler
            .running()
            .into_iter()
            .chain(self.scheduler.ready())
            .filter_map(|pid| self.processes.lookup(pid).ok())
            .collect()
    }

    /// Returns every live process in ascending pid order.
    pub fn process_table(&self) -> &ProcessTable {
        &self.processes
    }

    pub fn disks(&self) -> impl Iterator<Item = &Disk> {
        self.disks.iter()
    }

    /// Returns the memory layout in ascending address order.
    pub fn memory(&self) -> &[MemoryBlock] {
        self.memory.blocks()
    }

    pub fn running(&self) -> Option<Pid> {
        self.scheduler.running()
    }

    pub fn ready(&self) -> impl Iterator<Item = Pid> + '_ {
        self.scheduler.ready()
    }

    pub fn policy(&self) -> Policy {
        self.scheduler.policy()
    }

    /// Returns the memory arena size in bytes.
    pub fn ram_size(&self) -> u64 {
        self.memory.size()
    }

    pub fn disk_count(&self) -> usize {
        self.disks.len()
    }

    fn debug_check(&self) {
        if cfg!(debug_assertions) {
            self.check_invariants();
        }
    }

    /// Checks that every live process is in exactly one place and that memory is consistent.
    ///
    /// # Panics
    /// Panics on any violation.
    pub fn check_invariants(&self) {
        self.memory.check_invariants();

        // Memory ownership
        for block in self.memory.blocks() {
            if let Some(owner) = block.owner {
                let pcb = self
                    .processes
                    .lookup(owner)
                    .unwrap_or_else(|_| panic!("block at {} owned by dead {owner}", block.start));
                assert_eq!(pcb.block, block.start, "process {owner} owns a foreign block");
                assert_eq!(pcb.ram_size, block.size, "process {owner} has a mis-sized block");
            }
        }

        // Partition
        let mut seen: HashMap<Pid, usize> = HashMap::new();
        let mut expect = |pid: Pid, state: ProcessState, io: Option<(DiskId, &str)>| {
            *seen.entry(pid).or_default() += 1;
            let pcb = self
                .processes
                .lookup(pid)
                .unwrap_or_else(|_| panic!("dead process {pid} is scheduled"));
            assert_eq!(pcb.state, state, "process {pid} is in the wrong state");
            let pcb_io = pcb
                .io
                .as_ref()
                .map(|io| (io.disk, io.filename.as_str()));
            assert_eq!(pcb_io, io, "process {pid} has a mismatched request");
            assert_eq!(self.memory.owner_of(pcb.block), Some(pid));
        };

        if let Some(pid) = self.scheduler.running() {
            expect(pid, ProcessState::Running, None);
        } else {
            assert!(
                self.scheduler.ready().next().is_none(),
                "the CPU is idle while processes are ready"
            );
        }
        for pid in self.scheduler.ready() {
            expect(pid, ProcessState::Ready, None);
        }
        for disk in self.disks.iter() {
            for request in disk.requests() {
                expect(
                    request.pid,
                    ProcessState::WaitingIo,
                    Some((disk.id(), request.filename.as_str())),
                );
            }
        }

        for pcb in self.processes.iter() {
            assert_eq!(
                seen.get(&pcb.pid).copied(),
                Some(1),
                "process {} must be in exactly one queue",
                pcb.pid
            );
        }
        assert_eq!(seen.len(), self.processes.len());
    }
}
