use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Create an archive from a directory.
    #[command(alias = "p")]
    Pack {
        /// The directory to pack.
        dir: PathBuf,

        /// The path for the output archive; `.asar` is appended when missing.
        output: PathBuf,

        /// Leave hidden files out and do not descend into hidden directories.
        #[arg(long)]
        exclude_hidden: bool,

        /// Regex matched against relative file paths; matching files are not packed.
        #[arg(long, value_name = "PATTERN")]
        exclude: Option<String>,

        /// Regex matched against relative directory paths; matching directories
        /// are skipped entirely, contents included.
        #[arg(long, value_name = "PATTERN")]
        exclude_dir: Option<String>,
    },

    /// List the contents of an archive without extracting it.
    #[command(alias = "l")]
    List {
        /// The archive file to list.
        archive: PathBuf,
    },

    /// Extract a whole archive into a directory (which must be empty).
    #[command(alias = "e")]
    Extract {
        /// The archive file to extract.
        archive: PathBuf,

        /// The directory to reconstruct the tree under.
        dest: PathBuf,
    },

    /// Extract a single entry into the current directory.
    #[command(alias = "ef")]
    ExtractFile {
        /// The archive file to read.
        archive: PathBuf,

        /// Slash-separated entry path, matched exactly.
        entry: String,
    },
}

/// Append the `.asar` suffix when the chosen output name lacks it.
pub fn with_asar_suffix(output: &Path) -> PathBuf {
    match output.extension() {
        Some(ext) if ext == "asar" => output.to_path_buf(),
        _ => {
            let mut s = OsString::from(output.as_os_str());
            s.push(".asar");
            PathBuf::from(s)
        }
    }
}

/// Parse command-line arguments and return the command to execute.
pub fn run() -> Commands {
    Args::parse().command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_appended_once() {
        assert_eq!(
            with_asar_suffix(Path::new("app")),
            PathBuf::from("app.asar")
        );
        assert_eq!(
            with_asar_suffix(Path::new("app.asar")),
            PathBuf::from("app.asar")
        );
        assert_eq!(
            with_asar_suffix(Path::new("app.tar")),
            PathBuf::from("app.tar.asar")
        );
    }
}
