use std::{collections::VecDeque, fmt, str::FromStr};

use log::debug;

use crate::process::Pid;

/// How the ready queue is ordered.
///
/// Both policies are non-preemptive: a process that becomes ready never displaces the
/// running one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Arrival order.
    #[default]
    Fifo,
    /// Higher priority first, arrival order among equal priorities.
    Priority,
}

impl FromStr for Policy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "fifo" => Ok(Self::Fifo),
            "priority" => Ok(Self::Priority),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fifo => f.write_str("fifo"),
            Self::Priority => f.write_str("priority"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPolicy(pub String);

impl fmt::Display for UnknownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown scheduling policy '{}'", self.0)
    }
}

impl std::error::Error for UnknownPolicy {}

#[derive(Debug, Clone, Copy)]
struct ReadyEntry {
    pid: Pid,
    priority: u32,
}

/// Decides which process owns the single CPU.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    policy: Policy,
    running: Option<Pid>,
    ready: VecDeque<ReadyEntry>,
}

impl Scheduler {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Enqueues a ready process. If the CPU is idle, the head of the ready queue is promoted
    /// and returned.
    pub fn on_process_ready(&mut self, pid: Pid, priority: u32) -> Option<Pid> {
        let entry = ReadyEntry { pid, priority };
        match self.policy {
            Policy::Fifo => self.ready.push_back(entry),
            Policy::Priority => {
                let idx = self
                    .ready
                    .iter()
                    .position(|queued| queued.priority < priority)
                    .unwrap_or(self.ready.len());
                self.ready.insert(idx, entry);
            }
        }

        if self.running.is_none() {
            self.promote()
        } else {
            None
        }
    }

    /// Releases the CPU from the running process and promotes the head of the ready queue,
    /// returning it.
    pub fn on_running_terminated_or_blocked(&mut self) -> Option<Pid> {
        if let Some(pid) = self.running.take() {
            debug!("process {pid} released the CPU");
        }
        self.promote()
    }

    fn promote(&mut self) -> Option<Pid> {
        let entry = self.ready.pop_front()?;
        debug!("process {} promoted to running", entry.pid);
        self.running = Some(entry.pid);
        self.running
    }

    pub fn running(&self) -> Option<Pid> {
        self.running
    }

    /// Returns the ready processes in the order they will be promoted.
    pub fn ready(&self) -> impl Iterator<Item = Pid> + '_ {
        self.ready.iter().map(|entry| entry.pid)
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(raw: u64) -> Pid {
        Pid::new(raw)
    }

    fn ready(scheduler: &Scheduler) -> Vec<Pid> {
        scheduler.ready().collect()
    }

    #[test]
    fn idle_cpu_promotes_immediately() {
        let mut scheduler = Scheduler::default();
        assert_eq!(scheduler.on_process_ready(pid(1), 5), Some(pid(1)));
        assert_eq!(scheduler.running(), Some(pid(1)));
        assert!(ready(&scheduler).is_empty());
    }

    #[test]
    fn busy_cpu_queues() {
        let mut scheduler = Scheduler::default();
        scheduler.on_process_ready(pid(1), 5);
        assert_eq!(scheduler.on_process_ready(pid(2), 3), None);
        assert_eq!(scheduler.running(), Some(pid(1)));
        assert_eq!(ready(&scheduler), [pid(2)]);
    }

    #[test]
    fn release_promotes_head() {
        let mut scheduler = Scheduler::default();
        scheduler.on_process_ready(pid(1), 1);
        scheduler.on_process_ready(pid(2), 1);
        scheduler.on_process_ready(pid(3), 1);

        assert_eq!(scheduler.on_running_terminated_or_blocked(), Some(pid(2)));
        assert_eq!(ready(&scheduler), [pid(3)]);
        assert_eq!(scheduler.on_running_terminated_or_blocked(), Some(pid(3)));
        assert_eq!(scheduler.on_running_terminated_or_blocked(), None);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn fifo_ignores_priority() {
        let mut scheduler = Scheduler::new(Policy::Fifo);
        scheduler.on_process_ready(pid(1), 1);
        scheduler.on_process_ready(pid(2), 1);
        scheduler.on_process_ready(pid(3), 9);
        assert_eq!(ready(&scheduler), [pid(2), pid(3)]);
    }

    #[test]
    fn priority_orders_ready_queue() {
        let mut scheduler = Scheduler::new(Policy::Priority);
        scheduler.on_process_ready(pid(1), 1);
        scheduler.on_process_ready(pid(2), 3);
        scheduler.on_process_ready(pid(3), 9);
        scheduler.on_process_ready(pid(4), 3);
        scheduler.on_process_ready(pid(5), 1);

        // Non-preemptive
        assert_eq!(scheduler.running(), Some(pid(1)));
        assert_eq!(ready(&scheduler), [pid(3), pid(2), pid(4), pid(5)]);
    }

    #[test]
    fn parse_policy() {
        assert_eq!("fifo".parse::<Policy>(), Ok(Policy::Fifo));
        assert_eq!("priority".parse::<Policy>(), Ok(Policy::Priority));
        assert_eq!(
            "lottery".parse::<Policy>(),
            Err(UnknownPolicy("lottery".to_string()))
        );
    }
}
