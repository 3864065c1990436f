use std::{
    fs::File,
    io::{self, BufRead, BufReader, IsTerminal, Write},
};

use log::info;
use ossim::{
    config::{self, Args},
    kernel::Kernel,
    shell::Shell,
};

fn usage() -> ! {
    eprintln!("ossim [--policy fifo|priority] [RAM_SIZE DISK_COUNT [SCRIPT]]");
    std::process::exit(1);
}

/// Asks for a value on standard input until it parses.
fn prompt<T>(
    input: &mut impl BufRead,
    message: &str,
    parse: fn(&str) -> config::Result<T>,
) -> T {
    loop {
        print!("{message}");
        if let Err(e) = io::stdout().flush() {
            eprintln!("ossim: failed to write prompt: {e}");
            std::process::exit(1);
        }

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => {
                eprintln!("ossim: unexpected end of input");
                std::process::exit(1);
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("ossim: failed to read input: {e}");
                std::process::exit(1);
            }
        }

        match parse(&line) {
            Ok(value) => return value,
            Err(e) => eprintln!("ossim: {e}"),
        }
    }
}

fn main() {
    env_logger::init();

    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("ossim: {e}");
            usage();
        }
    };

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut input = stdin.lock();

    let ram_size = match args.ram_size {
        Some(size) => size,
        None => prompt(&mut input, "RAM Size (in bytes): ", config::parse_ram_size),
    };
    let disk_count = match args.disk_count {
        Some(count) => count,
        None => prompt(&mut input, "Number of disks: ", config::parse_disk_count),
    };
    let config = args.into_config(ram_size, disk_count);

    let kernel = Kernel::from_config(&config);
    info!(
        "starting with {} bytes of RAM, {} disks and {} scheduling",
        kernel.ram_size(),
        kernel.disk_count(),
        kernel.policy()
    );
    let mut shell = Shell::new(kernel, io::stdout().lock());

    let res = match &config.script {
        Some(path) => match File::open(path) {
            Ok(file) => shell.run(BufReader::new(file), false),
            Err(e) => {
                eprintln!("ossim: failed to open script {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => shell.run(input, interactive),
    };

    if let Err(e) = res {
        eprintln!("ossim: {e}");
        std::process::exit(1);
    }

    info!(
        "session ended with {} live processes",
        shell.kernel().process_table().len()
    );
}
