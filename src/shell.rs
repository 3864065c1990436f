use std::io::{self, BufRead, Write};

use log::warn;

use crate::{
    command::{self, Command},
    kernel::Kernel,
    report,
};

/// Whether the session should keep reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Executes command lines against a kernel, rendering results to `out`.
pub struct Shell<W: Write> {
    kernel: Kernel,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(kernel: Kernel, out: W) -> Self {
        Self { kernel, out }
    }

    /// Parses and executes one line. Rejected commands are reported and leave the kernel
    /// untouched; only failures to write the output are returned.
    pub fn execute_line(&mut self, line: &str) -> io::Result<Flow> {
        match Command::parse(line) {
            Ok(Some(command)) => self.execute(command),
            Ok(None) => Ok(Flow::Continue),
            Err(command::Error::Unknown(name)) => {
                warn!("unknown command '{name}'");
                writeln!(self.out, "Unknown command: {name}")?;
                writeln!(self.out, "Please run help to see all available commands")?;
                Ok(Flow::Continue)
            }
            Err(err) => {
                warn!("rejected '{}': {err}", line.trim());
                writeln!(self.out, "error: {err}")?;
                Ok(Flow::Continue)
            }
        }
    }

    pub fn execute(&mut self, command: Command) -> io::Result<Flow> {
        let out = &mut self.out;
        let res = match command {
            Command::Spawn { priority, ram_size } => self
                .kernel
                .spawn(priority, ram_size)
                .map(|spawned| report::spawned(out, &spawned)),
            Command::Terminate => self
                .kernel
                .terminate_running()
                .map(|terminated| report::terminated(out, &terminated)),
            Command::DiskRead { disk, filename } => self
                .kernel
                .request_disk_read(disk, &filename)
                .map(|issued| report::io_issued(out, &issued)),
            Command::DiskComplete { disk } => self
                .kernel
                .complete_disk_request(disk)
                .map(|completed| report::io_completed(out, &completed)),
            Command::ShowProcesses => Ok(report::processes(out, &self.kernel)),
            Command::ShowDisks => Ok(report::disks(out, &self.kernel)),
            Command::ShowMemory => Ok(report::memory(out, &self.kernel)),
            Command::Help => Ok(out.write_all(report::HELP.as_bytes())),
            Command::Exit => return Ok(Flow::Exit),
        };

        match res {
            Ok(written) => written?,
            Err(err) => {
                warn!("command failed: {err}");
                writeln!(out, "error: {err}")?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Executes lines from `input` until it is exhausted or `exit` is read. A prompt is
    /// written before each line when `prompt` is set.
    pub fn run<R: BufRead>(&mut self, input: R, prompt: bool) -> io::Result<()> {
        let mut lines = input.lines();
        loop {
            if prompt {
                write!(self.out, "> ")?;
                self.out.flush()?;
            }
            let Some(line) = lines.next() else {
                break;
            };
            if self.execute_line(&line?)? == Flow::Exit {
                break;
            }
        }
        self.out.flush()
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn into_inner(self) -> (Kernel, W) {
        (self.kernel, self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(script: &str) -> (Kernel, String) {
        let mut shell = Shell::new(Kernel::new(1000, 2), Vec::new());
        shell.run(script.as_bytes(), false).unwrap();
        let (kernel, out) = shell.into_inner();
        (kernel, String::from_utf8(out).unwrap())
    }

    #[test]
    fn session() {
        let (kernel, out) = run("A 5 200\nA 3 100\nt\nd 0 report.txt\n");
        assert_eq!(kernel.running(), None);
        assert!(out.contains("Terminated process 1\nProcess 2 is now running\n"));
        assert!(out.ends_with("Process 2 is waiting on disk 0 for report.txt\n"));
    }

    #[test]
    fn exit_stops_reading() {
        let (kernel, _) = run("A 5 200\nexit\nA 5 200\n");
        assert_eq!(kernel.process_table().len(), 1);
    }

    #[test]
    fn unknown_command() {
        let (_, out) = run("frobnicate\n");
        assert_eq!(
            out,
            "Unknown command: frobnicate\nPlease run help to see all available commands\n"
        );
    }

    #[test]
    fn failures_are_reported() {
        let (kernel, out) = run("t\nA 1 2000\nA x 1\nd 5 a.txt\nA 1 1\nd 5 a.txt\nD 0\n");
        assert_eq!(
            out.lines().filter(|line| line.starts_with("error: ")).count(),
            6
        );
        assert!(out.contains("error: no process is running\n"));
        assert!(out.contains("error: not enough contiguous memory for 2000 bytes\n"));
        assert!(out.contains("error: invalid priority\n"));
        assert!(out.contains("error: no disk with id 5\n"));
        assert!(out.contains("error: disk 0 has no active request\n"));
        assert_eq!(kernel.process_table().len(), 1);
    }

    #[test]
    fn queries_are_idempotent() {
        let (_, out) = run("A 5 200\nA 3 100\nd 1 a.txt\nSr\nSi\nSm\nSr\nSi\nSm\n");
        let reports: Vec<_> = out.split("  PID  |  PRIORITY").skip(1).collect();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0], reports[1]);
    }

    #[test]
    fn help() {
        let (_, out) = run("help\n");
        assert_eq!(out, report::HELP);
    }

    #[test]
    fn prompt() {
        let mut shell = Shell::new(Kernel::new(16, 0), Vec::new());
        shell.run("t\n".as_bytes(), true).unwrap();
        let (_, out) = shell.into_inner();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "> error: no process is running\n> "
        );
    }
}
