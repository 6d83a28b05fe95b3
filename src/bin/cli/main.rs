//! CLI tool for editing newc CPIO archives (initramfs images).

mod commands;
mod exit_codes;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use newcpio::{Compression, Session};

use exit_codes::{ExitCode, error_to_exit_code};

/// newc CPIO archive editor
#[derive(Parser)]
#[command(name = "newcpio")]
#[command(author, version, about = "Read, edit, and rewrite newc CPIO archives", long_about = None)]
pub struct Cli {
    /// Archive file to operate on
    archive: PathBuf,

    /// Output path: save destination for edits, target directory for unpack
    #[arg(long, short = 'o', global = true)]
    output: Option<PathBuf>,

    /// Treat the archive as raw newc bytes instead of gzip-compressed
    #[arg(long = "no-gzip", short = 'G', global = true)]
    no_gzip: bool,

    /// Verbose logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the contents of the archive (alias: l)
    #[command(alias = "l")]
    List,

    /// Extract the contents of the archive (alias: x)
    #[command(alias = "x")]
    Unpack {
        /// Overwrite directory contents if the output directory is not empty
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Add a new entry to the archive (alias: a)
    #[command(alias = "a")]
    Add {
        /// Path to be used in the archive
        path: String,

        /// Local file path to store in the archive
        file: PathBuf,
    },

    /// Delete an entry from the archive (alias: d)
    #[command(alias = "d")]
    Delete {
        /// Path of the entry to be deleted
        path: String,
    },

    /// Change an entry inside the archive (alias: m)
    #[command(alias = "m")]
    Modify {
        /// Path of the entry to be modified
        path: String,

        /// Change the owner uid
        #[arg(long, short = 'u')]
        uid: Option<u32>,

        /// Change the owner gid
        #[arg(long, short = 'g')]
        gid: Option<u32>,

        /// Change file access flags, octal input (i.e. 755)
        #[arg(long, short = 'm', value_parser = parse_octal)]
        mode: Option<u32>,

        /// Replace file contents with the data from the given file
        #[arg(long, short = 'd')]
        data: Option<PathBuf>,
    },

    /// Pack files into an archive (not implemented)
    Pack {
        /// Directory tree to pack
        source_dir: PathBuf,
    },
}

/// Parses a mode argument as octal.
fn parse_octal(input: &str) -> Result<u32, String> {
    u32::from_str_radix(input, 8).map_err(|e| format!("not an octal mode: {e}"))
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .format_timestamp(None)
    .init();

    let compression = if cli.no_gzip {
        Compression::None
    } else {
        Compression::Gzip
    };

    let mut session = match Session::open(&cli.archive, compression, cli.output.clone()) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error opening archive: {e}");
            std::process::exit(error_to_exit_code(&e).code());
        }
    };

    let exit_code = match cli.command {
        Commands::List => commands::list(&session),

        Commands::Unpack { force } => commands::unpack(&session, cli.output.as_deref(), force),

        Commands::Add { path, file } => commands::add(&mut session, &path, &file),

        Commands::Delete { path } => commands::delete(&mut session, &path),

        Commands::Modify {
            path,
            uid,
            gid,
            mode,
            data,
        } => commands::modify(&mut session, &path, uid, gid, mode, data.as_deref()),

        Commands::Pack { source_dir } => {
            commands::pack(&mut session, cli.output.as_deref(), &source_dir)
        }
    };

    // Mutating commands persist their changes; the session routes the write
    // to -o when given, else back to the archive path.
    let exit_code = if session.is_dirty() && exit_code == ExitCode::Success {
        match session.save(None) {
            Ok(_) => exit_code,
            Err(e) => {
                eprintln!("Error saving archive: {e}");
                error_to_exit_code(&e)
            }
        }
    } else {
        exit_code
    };

    std::process::exit(exit_code.code());
}
