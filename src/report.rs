use std::io::{Result, Write};

use crate::{
    disk::DiskRequest,
    kernel::{IoCompleted, IoIssued, Kernel, Spawned, Terminated},
    process::ProcessState,
};

pub const HELP: &str = "\
A: Spawn new process - A priority ram_size
t: Terminate currently running process
d: Currently running process added to I/O queue from given disk to load given file - d number file_name
D: The hard disk #number has finished the work for one process - D number
Sr: Shows a process currently using the CPU and processes waiting in the ready-queue
Si: Shows what processes are currently using the hard disks and what processes are waiting to use them
Sm: Shows the state of memory
help: Lists all available commands
exit: Exits the simulation
";

pub fn spawned(out: &mut impl Write, spawned: &Spawned) -> Result<()> {
    writeln!(
        out,
        "Spawned new process with PID: {} RAM: {} Priority: {}",
        spawned.pid, spawned.ram_size, spawned.priority
    )?;
    if spawned.running {
        writeln!(out, "Process {} is now running", spawned.pid)?;
    }
    Ok(())
}

pub fn terminated(out: &mut impl Write, terminated: &Terminated) -> Result<()> {
    writeln!(out, "Terminated process {}", terminated.pid)?;
    if let Some(next) = terminated.next {
        writeln!(out, "Process {next} is now running")?;
    }
    Ok(())
}

pub fn io_issued(out: &mut impl Write, issued: &IoIssued) -> Result<()> {
    writeln!(
        out,
        "Process {} is waiting on disk {} for {}",
        issued.pid, issued.disk, issued.filename
    )?;
    if let Some(next) = issued.next {
        writeln!(out, "Process {next} is now running")?;
    }
    Ok(())
}

pub fn io_completed(out: &mut impl Write, completed: &IoCompleted) -> Result<()> {
    writeln!(
        out,
        "Disk {} finished reading {} for process {}",
        completed.disk, completed.finished.filename, completed.finished.pid
    )?;
    if let Some(DiskRequest { pid, filename }) = &completed.dispatched {
        writeln!(out, "Disk {} started reading {filename} for process {pid}", completed.disk)?;
    }
    if let Some(pid) = completed.promoted {
        writeln!(out, "Process {pid} is now running")?;
    }
    Ok(())
}

/// Renders the running process, marked with `>`, and the ready queue.
pub fn processes(out: &mut impl Write, kernel: &Kernel) -> Result<()> {
    writeln!(out, "  PID  |  PRIORITY")?;
    writeln!(out, "-------|------------")?;
    for pcb in kernel.processes() {
        let marker = match pcb.state {
            ProcessState::Running => ">",
            ProcessState::Ready | ProcessState::WaitingIo | ProcessState::Terminated => " ",
        };
        writeln!(out, "{marker} {:<5}|  {}", pcb.pid.to_string(), pcb.priority)?;
    }
    Ok(())
}

/// Renders every disk: the active request marked with `>`, then its queue. Idle disks get
/// their own row.
pub fn disks(out: &mut impl Write, kernel: &Kernel) -> Result<()> {
    writeln!(out, "Disk   |  PID  |  Filename")?;
    writeln!(out, "-------|-------|----------")?;
    for disk in kernel.disks() {
        let id = disk.id().to_string();
        match disk.active() {
            Some(active) => {
                writeln!(out, "{id:<7}|> {:<5}|  {}", active.pid.to_string(), active.filename)?;
                for queued in disk.queue() {
                    writeln!(out, "{id:<7}|  {:<5}|  {}", queued.pid.to_string(), queued.filename)?;
                }
            }
            None => writeln!(out, "{id:<7}|  -    |  (idle)")?,
        }
    }
    Ok(())
}

/// Renders the memory blocks in address order. Free blocks are owned by PID 0.
pub fn memory(out: &mut impl Write, kernel: &Kernel) -> Result<()> {
    writeln!(out, "#  | PID |  RAM Range")?;
    writeln!(out, "===|=====|================")?;
    for (idx, block) in kernel.memory().iter().enumerate() {
        let owner = block.owner.map_or(0, |pid| pid.get());
        writeln!(
            out,
            "{:<3}|  {:<3}|  {} - {}",
            idx.to_string(),
            owner.to_string(),
            block.start,
            block.last()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl Fn(&mut Vec<u8>, &Kernel) -> Result<()>, kernel: &Kernel) -> String {
        let mut out = Vec::new();
        f(&mut out, kernel).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn kernel() -> Kernel {
        let mut kernel = Kernel::new(1000, 2);
        kernel.spawn(5, 200).unwrap();
        kernel.spawn(3, 100).unwrap();
        kernel.spawn(4, 50).unwrap();
        kernel.request_disk_read(0, "report.txt").unwrap();
        kernel.request_disk_read(0, "a.txt").unwrap();
        kernel
    }

    #[test]
    fn render_processes() {
        assert_eq!(
            render(|out, kernel| processes(out, kernel), &kernel()),
            "  PID  |  PRIORITY\n\
             -------|------------\n\
             > 3    |  4\n"
        );
    }

    #[test]
    fn render_disks() {
        assert_eq!(
            render(|out, kernel| disks(out, kernel), &kernel()),
            "Disk   |  PID  |  Filename\n\
             -------|-------|----------\n\
             0      |> 1    |  report.txt\n\
             0      |  2    |  a.txt\n\
             1      |  -    |  (idle)\n"
        );
    }

    #[test]
    fn render_memory() {
        let mut kernel = kernel();
        kernel.terminate_running().unwrap();
        assert_eq!(
            render(|out, kernel| memory(out, kernel), &kernel),
            "#  | PID |  RAM Range\n\
             ===|=====|================\n\
             0  |  1  |  0 - 199\n\
             1  |  2  |  200 - 299\n\
             2  |  0  |  300 - 999\n"
        );
    }

    #[test]
    fn render_outcomes() {
        let mut kernel = Kernel::new(1000, 1);
        let mut out = Vec::new();
        spawned(&mut out, &kernel.spawn(5, 200).unwrap()).unwrap();
        spawned(&mut out, &kernel.spawn(3, 100).unwrap()).unwrap();
        io_issued(&mut out, &kernel.request_disk_read(0, "report.txt").unwrap()).unwrap();
        io_completed(&mut out, &kernel.complete_disk_request(0).unwrap()).unwrap();
        terminated(&mut out, &kernel.terminate_running().unwrap()).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Spawned new process with PID: 1 RAM: 200 Priority: 5\n\
             Process 1 is now running\n\
             Spawned new process with PID: 2 RAM: 100 Priority: 3\n\
             Process 1 is waiting on disk 0 for report.txt\n\
             Process 2 is now running\n\
             Disk 0 finished reading report.txt for process 1\n\
             Terminated process 2\n\
             Process 1 is now running\n"
        );
    }
}
