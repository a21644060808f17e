//! Hiztegia CLI binary.

use std::io::Write;
use std::process;

use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use hiztegia::cli::{HiztegiaArgs, execute_command};

fn main() {
    // Parse command line arguments using clap
    let args = HiztegiaArgs::parse();

    let log_level = match args.verbosity() {
        0 => LevelFilter::Error, // Quiet mode
        1 => LevelFilter::Warn,  // Default
        2 => LevelFilter::Info,  // Verbose
        _ => LevelFilter::Debug, // Very verbose (3+)
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            process::exit(1);
        }
    };

    // Execute the command
    if let Err(e) = runtime.block_on(execute_command(args)) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
