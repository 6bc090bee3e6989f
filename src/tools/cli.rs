//! Command line interpretation and the options that drive a run.
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::{fmt::Display, fmt::Formatter};

use clap::Parser;
use log::{info, LevelFilter};

use super::freq_count::DEFAULT_CHUNK_SIZE;

/// Extension given to compressed files.
pub const EXTENSION: &str = "huf";

/// Encode or Decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Encode,
    Decode,
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

/// Verbosity of user information
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    Warnings,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::Off,
            Verbosity::Warnings => LevelFilter::Warn,
            Verbosity::Info => LevelFilter::Info,
            Verbosity::Debug => LevelFilter::Debug,
            Verbosity::Trace => LevelFilter::Trace,
        }
    }
}

/// All user settable options.
#[derive(Debug, Clone)]
pub struct HuffOpts {
    /// Encode/Decode
    pub op_mode: Mode,
    /// File to read for input
    pub input: PathBuf,
    /// Explicit output file name, otherwise derived from the input name
    pub output_file: Option<String>,
    /// Location where output is sent
    pub output: Output,
    /// Bytes read per chunk while streaming
    pub chunk_size: usize,
    /// Only encode the first `limit` bytes of the input
    pub limit: Option<u64>,
    /// Silently overwrite existing files with the same name
    pub force_overwrite: bool,
    /// Log the frequency table while encoding
    pub show_freqs: bool,
    /// Log the code word of every byte
    pub show_codes: bool,
    /// Verbosity of user information
    pub verbose: Verbosity,
}

impl HuffOpts {
    pub fn new() -> Self {
        Self {
            op_mode: Mode::Encode,
            input: PathBuf::new(),
            output_file: None,
            output: Output::File,
            chunk_size: DEFAULT_CHUNK_SIZE,
            limit: None,
            force_overwrite: false,
            show_freqs: false,
            show_codes: false,
            verbose: Verbosity::Warnings,
        }
    }

    /// Where a file-bound run writes. Encoding appends `.huf`; decoding strips it, or appends
    /// `.out` when the input does not carry the extension.
    pub fn output_path(&self) -> PathBuf {
        if let Some(name) = &self.output_file {
            return PathBuf::from(name);
        }
        match self.op_mode {
            Mode::Encode => append_extension(&self.input, EXTENSION),
            Mode::Decode if has_extension(&self.input) => self.input.with_extension(""),
            Mode::Decode => append_extension(&self.input, "out"),
        }
    }
}

fn has_extension(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(EXTENSION))
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

impl Default for HuffOpts {
    fn default() -> Self {
        Self::new()
    }
}

/// Command Line Interpretation - uses external CLAP crate.
#[derive(Parser, Debug)]
#[clap(
    version,
    about = "A static Huffman file compressor",
    long_about = "
    huffzip counts how often each byte occurs in the input, builds an optimal prefix code from
    those counts and rewrites the input with it. The code tree is stored at the front of the
    compressed file, so decoding needs nothing but the file itself.

    Without -z or -d, files ending in .huf are decoded and everything else is encoded."
)]
pub struct Args {
    /// Filename of file to process
    filename: String,

    /// Perform compression on the input file
    #[clap(short = 'z', long = "compress", conflicts_with = "decompress")]
    compress: bool,

    /// Perform decompression on the input file
    #[clap(short = 'd', long = "decompress")]
    decompress: bool,

    /// Write output to this file instead of the derived name
    #[clap(short = 'o', long = "output", conflicts_with = "stdout")]
    output: Option<String>,

    /// Send output to the terminal
    #[clap(short = 'c', long = "stdout")]
    stdout: bool,

    /// Force overwriting output file
    #[clap(short = 'f', long = "force")]
    force: bool,

    /// Bytes read per chunk (accepts K and M suffixes)
    #[clap(long = "chunk-size", value_parser = parse_size, default_value = "64K")]
    chunk_size: usize,

    /// Only compress the first LIMIT bytes of the input
    #[clap(long = "limit", value_parser = parse_size)]
    limit: Option<usize>,

    /// Log the byte frequency table (needs -vvv)
    #[clap(long = "show-freqs")]
    show_freqs: bool,

    /// Log the code word assigned to each byte (needs -vvv)
    #[clap(long = "show-codes")]
    show_codes: bool,

    /// Suppress everything but errors
    #[clap(short = 'q', long = "quiet")]
    quiet: bool,

    /// Sets verbosity. -v shows progress, -vvv is chatty
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Parse a byte count such as `4096`, `64K` or `1M`. Zero is rejected.
fn parse_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    let (digits, scale) = match s.char_indices().last() {
        Some((i, 'k' | 'K')) => (&s[..i], 1024),
        Some((i, 'm' | 'M')) => (&s[..i], 1024 * 1024),
        _ => (s, 1),
    };
    let n: usize = digits
        .parse()
        .map_err(|_| format!("`{}` is not a byte count", s))?;
    match n.checked_mul(scale) {
        Some(0) => Err("size must be greater than zero".to_string()),
        Some(size) => Ok(size),
        None => Err(format!("`{}` is too large", s)),
    }
}

/// Put command line information from CLAP into our internal structure.
pub fn opts_from_args(args: Args) -> HuffOpts {
    let mut opts = HuffOpts::new();

    opts.op_mode = if args.decompress {
        Mode::Decode
    } else if args.compress {
        Mode::Encode
    } else if has_extension(Path::new(&args.filename)) {
        Mode::Decode
    } else {
        Mode::Encode
    };
    opts.input = PathBuf::from(args.filename);
    opts.output_file = args.output;
    if args.stdout {
        opts.output = Output::Stdout
    };
    opts.force_overwrite = args.force;
    opts.chunk_size = args.chunk_size;
    opts.limit = args.limit.map(|l| l as u64);
    opts.show_freqs = args.show_freqs;
    opts.show_codes = args.show_codes;
    opts.verbose = match (args.quiet, args.verbose) {
        (true, _) => Verbosity::Quiet,
        (false, 0) => Verbosity::Warnings,
        (false, 1) => Verbosity::Info,
        (false, 2) => Verbosity::Debug,
        _ => Verbosity::Trace,
    };
    opts
}

/// Parse the process arguments, set the log level and report what we are about to do.
pub fn huffopts_init() -> HuffOpts {
    let opts = opts_from_args(Args::parse());
    log::set_max_level(opts.verbose.level_filter());

    info!("---- huffzip initialization start ----");
    info!("Verbosity set to {}", log::max_level());
    info!("Operational mode set to {}", opts.op_mode);
    info!("Getting input from the file {}", opts.input.display());
    match opts.output {
        Output::Stdout => info!("Sending output to stdout"),
        Output::File => info!("Sending output to the file {}", opts.output_path().display()),
    }
    info!("Chunk size set to {}", opts.chunk_size);
    if let Some(limit) = opts.limit {
        info!("Encoding at most {} bytes", limit)
    }
    if opts.force_overwrite {
        info!("Forcing file overwriting")
    };
    info!("---- huffzip initialization end ----");
    opts
}
