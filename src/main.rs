//Enable more cargo lint tests
#![warn(rust_2018_idioms)]

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use log::{error, info, warn};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use bzcodec::tools::cli::{bzopts_init, report, BzOpts, Mode, Output};
use bzcodec::{compress_stream, BzError, BzReader};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() -> ExitCode {
    let opts = bzopts_init();

    // Messages go to stderr so they never mix with data written to stdout.
    if TermLogger::init(
        opts.verbosity,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .is_err()
    {
        eprintln!("bzcodec: unable to start the logger");
    }
    report(&opts);

    let ok = if opts.files.is_empty() {
        process_stdin(&opts)
    } else {
        let mut ok = true;
        for name in &opts.files {
            if let Err(e) = process_file(&opts, name) {
                error!("{}: {}", name, e);
                ok = false;
            }
        }
        ok
    };

    info!("Done.");
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Filter stdin to stdout.
fn process_stdin(opts: &BzOpts) -> bool {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let result = run(opts, stdin.lock(), BufWriter::new(stdout.lock()));
    match result {
        Ok(()) => true,
        Err(e) => {
            error!("(stdin): {}", e);
            false
        }
    }
}

fn process_file(opts: &BzOpts, name: &str) -> Result<(), BzError> {
    let input = Path::new(name);
    if !input.is_file() {
        return Err(BzError::Param("input is not a regular file"));
    }
    let source = BufReader::new(File::open(input)?);

    if opts.op_mode == Mode::Test || opts.output == Output::Stdout {
        let stdout = io::stdout();
        run(opts, source, BufWriter::new(stdout.lock()))?;
        if opts.op_mode == Mode::Test {
            info!("{}: ok", name);
        }
        return Ok(());
    }

    let target = output_path(opts.op_mode, input);
    if target.exists() && !opts.force_overwrite {
        return Err(BzError::Param(
            "output file already exists, use --force to overwrite",
        ));
    }
    info!("{} -> {}", name, target.display());

    let sink = BufWriter::new(File::create(&target)?);
    if let Err(e) = run(opts, source, sink) {
        // Leave nothing half written behind.
        if fs::remove_file(&target).is_err() {
            warn!("Unable to remove partial output {}", target.display());
        }
        return Err(e);
    }

    if !opts.keep_input_files {
        fs::remove_file(input)?;
    }
    Ok(())
}

/// Run the selected operation from `source` into `sink`.
fn run<R: Read, W: Write>(opts: &BzOpts, source: R, mut sink: W) -> Result<(), BzError> {
    match opts.op_mode {
        Mode::Zip => {
            compress_stream(source, sink, &opts.compress_options())?;
        }
        Mode::Unzip => {
            let mut reader = BzReader::with_options(source, opts.decompress_options());
            io::copy(&mut reader, &mut sink)?;
            sink.flush()?;
        }
        Mode::Test => {
            let mut reader = BzReader::with_options(source, opts.decompress_options());
            io::copy(&mut reader, &mut io::sink())?;
        }
    }
    Ok(())
}

/// Name the output file: add `.bz2` when compressing, strip `.bz2` or `.bz` when decompressing,
/// and fall back to appending `.out`.
fn output_path(mode: Mode, input: &Path) -> PathBuf {
    if mode == Mode::Zip {
        let mut name = input.as_os_str().to_owned();
        name.push(".bz2");
        return PathBuf::from(name);
    }
    match input.extension().and_then(|e| e.to_str()) {
        Some("bz2") | Some("bz") => input.with_extension(""),
        _ => {
            let mut name = input.as_os_str().to_owned();
            name.push(".out");
            PathBuf::from(name)
        }
    }
}

#[cfg(test)]
mod test {
    use super::output_path;
    use bzcodec::tools::cli::Mode;
    use std::path::{Path, PathBuf};

    #[test]
    fn output_path_test() {
        assert_eq!(
            output_path(Mode::Zip, Path::new("a.txt")),
            PathBuf::from("a.txt.bz2")
        );
        assert_eq!(
            output_path(Mode::Unzip, Path::new("a.txt.bz2")),
            PathBuf::from("a.txt")
        );
        assert_eq!(
            output_path(Mode::Unzip, Path::new("a.bz")),
            PathBuf::from("a")
        );
        assert_eq!(
            output_path(Mode::Unzip, Path::new("a.dat")),
            PathBuf::from("a.dat.out")
        );
    }
}
