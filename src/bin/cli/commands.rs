//! Command implementations for the CLI tool.

use std::path::{Path, PathBuf};

use newcpio::{EntryUpdate, Session};

use crate::exit_codes::{ExitCode, error_to_exit_code};

/// List command implementation
pub fn list(session: &Session) -> ExitCode {
    for entry in session.entries() {
        let user = format!("{}:{}", entry.uid, entry.gid);
        println!(
            "{:>7} {:>12} {:>11} {:>16} {}",
            format!("0o{:o}", entry.mode),
            user,
            entry.size,
            entry.file_type,
            entry.name
        );
    }
    ExitCode::Success
}

/// Unpack command implementation
///
/// Falls back to a fresh temporary directory when no output directory was
/// given; the core always receives an explicit target.
pub fn unpack(session: &Session, output: Option<&Path>, force: bool) -> ExitCode {
    let target: PathBuf = match output {
        Some(dir) => dir.to_path_buf(),
        None => {
            let tmp = tempfile::Builder::new()
                .prefix("newcpio-")
                .tempdir_in(std::env::temp_dir());
            match tmp {
                Ok(dir) => dir.keep(),
                Err(e) => {
                    eprintln!("Error creating output directory: {e}");
                    return ExitCode::IoError;
                }
            }
        }
    };
    println!("Saving files to {}", target.display());

    match session.unpack(&target, force) {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("Error: {e}");
            error_to_exit_code(&e)
        }
    }
}

/// Add command implementation
pub fn add(session: &mut Session, archive_path: &str, file: &Path) -> ExitCode {
    match session.add(file, archive_path) {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("Error: {e}");
            error_to_exit_code(&e)
        }
    }
}

/// Delete command implementation
pub fn delete(session: &mut Session, archive_path: &str) -> ExitCode {
    match session.delete(archive_path) {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("Error: {e}");
            error_to_exit_code(&e)
        }
    }
}

/// Modify command implementation
///
/// The data update, when requested, is read from a file on disk before the
/// container is touched.
pub fn modify(
    session: &mut Session,
    archive_path: &str,
    uid: Option<u32>,
    gid: Option<u32>,
    mode: Option<u32>,
    data: Option<&Path>,
) -> ExitCode {
    let mut update = EntryUpdate {
        uid,
        gid,
        mode,
        data: None,
    };
    if let Some(path) = data {
        update.data = match std::fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                eprintln!("Error reading {}: {e}", path.display());
                return ExitCode::IoError;
            }
        };
    }
    if update.is_empty() {
        eprintln!("Error: modify needs at least one of --uid/--gid/--mode/--data");
        return ExitCode::BadArgs;
    }

    match session.modify(archive_path, update) {
        Ok(true) => ExitCode::Success,
        Ok(false) => ExitCode::Warning,
        Err(e) => {
            eprintln!("Error: {e}");
            error_to_exit_code(&e)
        }
    }
}

/// Pack command implementation
pub fn pack(session: &mut Session, output: Option<&Path>, source_dir: &Path) -> ExitCode {
    let dest = output.unwrap_or_else(|| session.path()).to_path_buf();
    match session.pack(&dest, source_dir) {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("Error: {e}");
            error_to_exit_code(&e)
        }
    }
}
