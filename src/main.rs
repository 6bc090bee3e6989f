//Enable more cargo lint tests
#![warn(rust_2018_idioms)]
#![warn(clippy::disallowed_types)]

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use std::process::ExitCode;

use huffzip::error::{HuffError, Stage, StageError};
use huffzip::tools::cli::{huffopts_init, HuffOpts, Mode, Output};
use huffzip::{decode_stream, decode_with, encode_stream_append, encode_with};

use log::{error, info, warn, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() -> ExitCode {
    // Logs go to stderr so that -c output stays clean. The real level is set by huffopts_init.
    if TermLogger::init(
        LevelFilter::Trace,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .is_err()
    {
        eprintln!("huffzip: logger was already initialized");
    }

    let options = huffopts_init();

    let input = options.input.clone();

    //----- Figure how what we need to do and go do it
    let result = match options.output {
        Output::File => run_to_file(&input, &options),
        Output::Stdout => run_to_stdout(&input, &options),
    };

    match result {
        Ok(()) => {
            info!("Done.");
            ExitCode::SUCCESS
        }
        Err(e) if matches!(e.kind, HuffError::EmptyInput) => {
            warn!("{} is empty, wrote an empty output", input.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Encode or decode into the file named by the options.
fn run_to_file(input: &Path, opts: &HuffOpts) -> Result<(), StageError> {
    let stage = match opts.op_mode {
        Mode::Encode => Stage::Profiling,
        Mode::Decode => Stage::HeaderReading,
    };
    let output = opts.output_path();

    if output.exists() && !opts.force_overwrite {
        return Err(StageError::new(
            stage,
            HuffError::SinkUnavailable {
                path: output,
                source: io::Error::new(io::ErrorKind::AlreadyExists, "file exists, use -f to overwrite"),
            },
        ));
    }

    match opts.op_mode {
        Mode::Encode => {
            let report = encode_with(input, &output, opts)?;
            info!(
                "{}: {} -> {} bytes ({} distinct values)",
                input.display(),
                report.bytes_in,
                report.bytes_out,
                report.distinct
            );
        }
        Mode::Decode => {
            let report = decode_with(input, &output, opts)?;
            info!(
                "{}: {} -> {} bytes",
                input.display(),
                report.bytes_in,
                report.bytes_out
            );
        }
    }
    Ok(())
}

/// Encode or decode onto stdout. Stdout cannot seek, so encoding uses the append-only variant.
fn run_to_stdout(input: &Path, opts: &HuffOpts) -> Result<(), StageError> {
    let stage = match opts.op_mode {
        Mode::Encode => Stage::Profiling,
        Mode::Decode => Stage::HeaderReading,
    };
    let mut source = File::open(input).map_err(|source| {
        StageError::new(
            stage,
            HuffError::SourceUnavailable {
                path: input.to_path_buf(),
                source,
            },
        )
    })?;
    let stdout = io::stdout();
    let mut sink = BufWriter::new(stdout.lock());

    match opts.op_mode {
        Mode::Encode => encode_stream_append(&mut source, &mut sink, opts).map(|_| ()),
        Mode::Decode => decode_stream(&mut source, &mut sink, opts).map(|_| ()),
    }
}
