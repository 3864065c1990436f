pub mod command;
pub mod config;
pub mod disk;
pub mod kernel;
pub mod memory;
pub mod process;
pub mod report;
pub mod scheduler;
pub mod shell;
