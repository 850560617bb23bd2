//! Main entry point for the asarpack CLI app

use std::path::Path;
use std::process::ExitCode;

use asarpack::cli::{self, Commands};
use asarpack::extract;
use asarpack::pack::{self, PackOptions};

fn main() -> ExitCode {
    if let Err(e) = run_app() {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run_app() -> Result<(), asarpack::ArchiveError> {
    match cli::run() {
        Commands::Pack {
            dir,
            output,
            exclude_hidden,
            exclude,
            exclude_dir,
        } => {
            let output = cli::with_asar_suffix(&output);
            let options = PackOptions {
                exclude_hidden,
                file_exclude_pattern: exclude,
                dir_exclude_pattern: exclude_dir,
            };
            pack::pack(&dir, &output, &options)
        }
        Commands::List { archive } => {
            for path in extract::list_entries(&archive)? {
                println!("{path}");
            }
            Ok(())
        }
        Commands::Extract { archive, dest } => extract::unpack_all(&archive, &dest),
        Commands::ExtractFile { archive, entry } => {
            extract::unpack_single(&archive, &entry, Path::new(".")).map(|_| ())
        }
    }
}
