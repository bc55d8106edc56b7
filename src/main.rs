use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use mtar::{Tar, TarError};

mod cli;
use crate::cli::Cli;
use crate::cli::Commands;

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    match run(&cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: &Commands) -> Result<(), TarError> {
    match command {
        Commands::List { archive } => list(archive),
        Commands::Cat { archive, name } => cat(archive, name),
        Commands::Sample { archive } => sample(archive),
    }
}

fn list(archive: &Path) -> Result<(), TarError> {
    let mut tar = Tar::open_read(archive)?;

    loop {
        let header = match tar.read_header() {
            Ok(h) => h,
            Err(TarError::NullRecord) => break,
            Err(e) => return Err(e),
        };
        println!("{} ({} bytes)", header.name, header.size);
        tar.next()?;
    }

    tar.close()
}

fn cat(archive: &Path, name: &str) -> Result<(), TarError> {
    let mut tar = Tar::open_read(archive)?;
    let header = tar.find(name)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let mut chunk = [0u8; 4096];
    let mut remaining = header.size;
    while remaining > 0 {
        let n = remaining.min(chunk.len() as u64) as usize;
        tar.read_data(&mut chunk[..n])?;
        out.write_all(&chunk[..n])
            .map_err(|_| TarError::WriteFailure)?;
        remaining -= n as u64;
    }

    tar.close()
}

fn sample(archive: &Path) -> Result<(), TarError> {
    const STR1: &[u8] = b"Hello world";
    const STR2: &[u8] = b"Goodbye world";

    let mut tar = Tar::open_write(archive)?;

    tar.write_file_header("test1.txt", STR1.len() as u64)?;
    tar.write_data(STR1)?;
    tar.write_file_header("test2.txt", STR2.len() as u64)?;
    tar.write_data(STR2)?;

    tar.finalize()?;
    tar.close()
}
