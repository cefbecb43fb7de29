//! Command line interface for the bzcodec binary, built on clap.
use std::fmt::{Display, Formatter};

use clap::Parser;
use log::{info, LevelFilter};

use crate::compression::compress::CompressOptions;
use crate::compression::decompress::DecompressOptions;

/// Zip, Unzip, Test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Zip,
    Unzip,
    Test,
}
impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Define the two output channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    File,
    Stdout,
}
impl Display for Output {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Command Line Interpretation - uses external CLAP crate.
#[derive(Parser, Debug)]
#[clap(
    name = "bzcodec",
    version,
    about = "A block-sorting file compressor using the bzip2 format",
    long_about = "
    Compresses, decompresses and tests bzip2 files. Output is bit-compatible with the
    standard bzip2 tool, so either can read what the other writes.

    If no file names are given, data is read from standard input and written to
    standard output."
)]
struct Args {
    /// Files to process
    #[clap()]
    files: Vec<String>,

    /// Force compression
    #[clap(short = 'z', long = "compress")]
    compress: bool,

    /// Force decompression
    #[clap(short = 'd', long = "decompress", conflicts_with = "compress")]
    decompress: bool,

    /// Test compressed file integrity
    #[clap(short = 't', long = "test", conflicts_with = "compress")]
    test: bool,

    /// Output to standard out
    #[clap(short = 'c', long = "stdout")]
    stdout: bool,

    /// Keep (don't delete) input files
    #[clap(short = 'k', long = "keep")]
    keep: bool,

    /// Overwrite existing output files
    #[clap(short = 'f', long = "force")]
    force: bool,

    /// Use less memory when decompressing
    #[clap(short = 's', long = "small")]
    small: bool,

    /// Block size, 1..9 for 100k..900k
    #[clap(short = 'b', long = "block-size", value_parser = clap::value_parser!(u8).range(1..=9))]
    block_size: Option<u8>,

    /// Alias for --block-size 1
    #[clap(long = "fast", conflicts_with = "best")]
    fast: bool,

    /// Alias for --block-size 9
    #[clap(long = "best")]
    best: bool,

    /// Effort spent on repetitive blocks before switching sort algorithm, 0..250 (0 = default 30)
    #[clap(long = "work-factor", value_parser = clap::value_parser!(u32).range(0..=250))]
    work_factor: Option<u32>,

    /// Always use the fallback sort, for very repetitive data
    #[clap(long = "exponential", conflicts_with = "work-factor")]
    exponential: bool,

    /// Be verbose (repeat for more)
    #[clap(short = 'v', long = "verbose", parse(from_occurrences))]
    verbose: u8,

    /// Suppress noncritical messages
    #[clap(short = 'q', long = "quiet", conflicts_with = "verbose")]
    quiet: bool,
}

/// Everything the binary needs to know, resolved from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BzOpts {
    /// Vec of names of files to read for input
    pub files: Vec<String>,
    /// Compress/Decompress/Test
    pub op_mode: Mode,
    /// Location where output is sent
    pub output: Output,
    /// Silently overwrite existing files with the same name
    pub force_overwrite: bool,
    /// Don't remove input files after processing
    pub keep_input_files: bool,
    /// Small memory footprint requested
    pub small: bool,
    /// Block size in units of 100k
    pub block_size: u8,
    /// Main sort effort before the fallback sort takes over
    pub work_factor: u32,
    /// Log level for the terminal logger
    pub verbosity: LevelFilter,
}

impl BzOpts {
    pub fn compress_options(&self) -> CompressOptions {
        CompressOptions::new(self.block_size).with_work_factor(self.work_factor)
    }

    pub fn decompress_options(&self) -> DecompressOptions {
        DecompressOptions { small: self.small }
    }
}

impl BzOpts {
    fn from_args(args: Args) -> Self {
        let op_mode = if args.test {
            Mode::Test
        } else if args.decompress {
            Mode::Unzip
        } else {
            Mode::Zip
        };

        let block_size = if args.fast {
            1
        } else if args.best {
            9
        } else {
            args.block_size.unwrap_or(9)
        };

        // Work factor 1 leaves the main sort no budget at all.
        let work_factor = if args.exponential {
            1
        } else {
            args.work_factor.unwrap_or(0)
        };

        let verbosity = if args.quiet {
            LevelFilter::Off
        } else {
            match args.verbose {
                0 => LevelFilter::Error,
                1 => LevelFilter::Warn,
                2 => LevelFilter::Info,
                3 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        };

        // Reading stdin with no files means writing stdout.
        let output = if args.stdout || args.files.is_empty() {
            Output::Stdout
        } else {
            Output::File
        };

        BzOpts {
            files: args.files,
            op_mode,
            output,
            force_overwrite: args.force,
            keep_input_files: args.keep,
            small: args.small,
            block_size,
            work_factor,
            verbosity,
        }
    }
}

/// Parse the command line.
pub fn bzopts_init() -> BzOpts {
    BzOpts::from_args(Args::parse())
}

/// Parse an explicit argument list, program name first.
pub fn bzopts_from<I, T>(args: I) -> Result<BzOpts, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Args::try_parse_from(args).map(BzOpts::from_args)
}

/// Report the settings, once the logger is up.
pub fn report(opts: &BzOpts) {
    info!("---- bzcodec Initialization Start ----");
    info!("Verbosity set to {}", opts.verbosity);
    info!("Operational mode set to {}", opts.op_mode);
    info!("Output to {}", opts.output);
    info!("Block size set to {}", opts.block_size);
    if opts.work_factor != 0 {
        info!("Work factor set to {}", opts.work_factor);
    }
    if opts.force_overwrite {
        info!("Forcing file overwriting")
    };
    if opts.keep_input_files {
        info!("Keeping input files")
    };
    info!("---- bzcodec Initialization End ----");
}

#[cfg(test)]
mod test {
    use super::{bzopts_from, Mode, Output};
    use log::LevelFilter;

    #[test]
    fn defaults_test() {
        let opts = bzopts_from(["bzcodec", "a.txt"]).unwrap();
        assert_eq!(opts.op_mode, Mode::Zip);
        assert_eq!(opts.output, Output::File);
        assert_eq!(opts.block_size, 9);
        assert_eq!(opts.work_factor, 0);
        assert_eq!(opts.verbosity, LevelFilter::Error);
        assert_eq!(opts.files, vec!["a.txt".to_string()]);
    }

    #[test]
    fn flags_test() {
        let opts = bzopts_from(["bzcodec", "-dkfs", "-vv", "--fast", "x.bz2"]).unwrap();
        assert_eq!(opts.op_mode, Mode::Unzip);
        assert!(opts.keep_input_files && opts.force_overwrite && opts.small);
        assert_eq!(opts.block_size, 1);
        assert_eq!(opts.verbosity, LevelFilter::Info);

        let opts = bzopts_from(["bzcodec", "-t", "-q", "-b", "4", "--exponential"]).unwrap();
        assert_eq!(opts.op_mode, Mode::Test);
        assert_eq!(opts.verbosity, LevelFilter::Off);
        assert_eq!(opts.output, Output::Stdout);
        assert_eq!(opts.compress_options().block_size, 4);
        assert_eq!(opts.compress_options().work_factor, 1);
    }

    #[test]
    fn rejects_bad_values_test() {
        assert!(bzopts_from(["bzcodec", "-b", "0"]).is_err());
        assert!(bzopts_from(["bzcodec", "--work-factor", "251"]).is_err());
        assert!(bzopts_from(["bzcodec", "-z", "-d"]).is_err());
    }
}
