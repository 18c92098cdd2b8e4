//! convertroms takes original Atari 800XL OS and Atari BASIC ROM dumps
//! and converts them into C headers the emulator embeds at build time.

use atari_roms::prelude::*;
use clap::Parser;
use color_eyre::eyre::Result;
use env_logger::Env;
use std::{
    fs::write,
    io::{self, Write},
    path::{Path, PathBuf},
};
use strum::IntoEnumIterator;


/// convertroms takes original Atari ROM dumps and converts them into
/// C headers for embedding.
///
/// A 16KB OS ROM (ATARIXL.ROM) becomes original_os_xl.h and an 8KB
/// BASIC ROM (ATARIBAS.ROM) becomes original_basic.h. Files are recognized
/// by size or by their name. With no files given the current directory
/// is searched for the usual dump names.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(help = "ROM files to convert")]
    files: Vec<String>,

    #[arg(
        long,
        default_value = ".",
        help = "Directory the generated headers are written into"
    )]
    out_dir: PathBuf,

    #[arg(
        long,
        default_value_t = false,
        help = "Write placeholder headers with the ROM macros set to 0 instead of converting"
    )]
    placeholder: bool,
}

const USAGE: &str = "Convert original Atari ROM binary files to C header files for embedding.

Usage:
    convertroms ATARIXL.ROM ATARIBAS.ROM

This will create:
    - original_os_xl.h (16KB OS ROM)
    - original_basic.h (8KB BASIC ROM)

The ROMs should be:
    - ATARIXL.ROM: 16384 bytes (Atari 800XL OS ROM)
    - ATARIBAS.ROM: 8192 bytes (Atari BASIC ROM)";

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args: Args = Args::parse();

    let code = run(&args, Path::new("."), &mut io::stdout().lock())?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

// Runs a full batch and returns the process exit code. `cwd` is only
// used when searching for ROMs.
fn run(args: &Args, cwd: &Path, out: &mut dyn Write) -> Result<i32> {
    if args.placeholder {
        write_placeholders(&args.out_dir, out)?;
        return Ok(0);
    }

    let files: Vec<PathBuf> = if args.files.is_empty() {
        writeln!(out, "{USAGE}")?;
        writeln!(out, "\nSearching for ROM files in current directory...")?;

        let found = discover(cwd)?;
        if let Some(os) = &found.os {
            writeln!(out, "Found OS ROM: {}", display_name(os))?;
        }
        if let Some(basic) = &found.basic {
            writeln!(out, "Found BASIC ROM: {}", display_name(basic))?;
        }
        if found.is_empty() {
            writeln!(out, "No ROM files found. Please copy ROMs to this directory.")?;
            return Ok(1);
        }
        found.files()
    } else {
        args.files.iter().map(PathBuf::from).collect()
    };

    writeln!(out, "\nConverting ROM files...")?;
    for f in &files {
        convert_one(f, &args.out_dir, out)?;
    }

    writeln!(out, "\nDone! Copy the generated .h files to this directory.")?;
    writeln!(out, "Then rebuild the emulator project.")?;
    Ok(0)
}

// Problems with an individual file are reported and never fail the batch.
// Only failing to write the report itself is an error.
fn convert_one(file: &Path, out_dir: &Path, out: &mut dyn Write) -> io::Result<()> {
    let name = file.display();
    if !file.exists() {
        return writeln!(out, "Error: {name} not found");
    }

    let class = match classify_path(file) {
        Ok(c) => c,
        Err(e) => return writeln!(out, "Error: can't inspect {name}: {e}"),
    };

    match class {
        Classification::Convert(kind) => {
            writeln!(out, "\nProcessing {kind}:")?;
            let req = kind.request(file, out_dir);
            let res = convert_with(&req, |d| {
                for line in d.to_string().lines() {
                    if let Err(e) = writeln!(out, "  {line}") {
                        log::warn!("can't write report: {e}");
                    }
                }
            });
            if let Err(e) = res {
                log::debug!("conversion of {name} failed: {e:?}");
                writeln!(out, "  Error: {e}")?;
            }
        }
        Classification::Atari800Os => {
            writeln!(out, "\nNote: {name} appears to be Atari 800 OS (10KB)")?;
            writeln!(out, "  This emulator is designed for Atari 800XL (16KB OS)")?;
            writeln!(out, "  Skipping this file...")?;
        }
        Classification::Unknown { size } => {
            writeln!(out, "\nUnknown ROM type: {name} ({size} bytes)")?;
            writeln!(
                out,
                "  Expected: {OS_XL_SIZE} bytes (OS) or {BASIC_SIZE} bytes (BASIC)"
            )?;
        }
    }
    Ok(())
}

fn write_placeholders(out_dir: &Path, out: &mut dyn Write) -> Result<()> {
    for kind in RomKind::iter() {
        let path = out_dir.join(kind.output_name());
        write(&path, kind.placeholder_header())?;
        writeln!(out, "-> Created placeholder {}", path.display())?;
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}

#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Args::command().debug_assert();
}
