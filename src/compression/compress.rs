use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, info};

use super::check_distinct;
use crate::bitstream::bitwriter::BitWriter;
use crate::error::{AtStage, HuffError, Stage, StageError};
use crate::huffman_coding::header::encode_header;
use crate::huffman_coding::huffman::{EncodingTable, HuffTree};
use crate::tools::cli::HuffOpts;
use crate::tools::freq_count::{profile, FreqTable};
use crate::tools::timer::Timer;

/*
    Encoding makes two passes over the source. The first counts bytes, the second re-reads the
    source from where the first started and writes code words.

    Output layout:
        header_length       u32 LE, tree bytes + 1
        tree                header_length - 1 bytes, padded with 0 bits
        trailing bit count  1 byte, pad bits at the end of the body
        body                code words of every source byte, in order

    The trailing bit count is only known after the body is written. Seekable sinks get a
    placeholder that is overwritten at the end; append-only sinks get the value computed up front
    from the frequencies and code lengths.
*/

/// Summary of a finished encode run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeReport {
    /// Source bytes encoded
    pub bytes_in: u64,
    /// Total bytes of compressed output
    pub bytes_out: u64,
    /// Distinct byte values in the source
    pub distinct: usize,
    /// Value of the header length field
    pub header_len: u32,
    /// Pad bits in the final body byte
    pub trailing_bits: u8,
}

impl EncodeReport {
    /// Output size as a fraction of the input size.
    pub fn ratio(&self) -> f64 {
        if self.bytes_in == 0 {
            return 0.0;
        }
        self.bytes_out as f64 / self.bytes_in as f64
    }
}

/// Everything derived from the profiling pass.
struct Plan {
    freqs: FreqTable,
    table: EncodingTable,
    header: Vec<u8>,
}

/// Compress `input` into `output` with default settings.
pub fn encode(input: &Path, output: &Path) -> Result<EncodeReport, StageError> {
    encode_with(input, output, &HuffOpts::default())
}

/// Compress `input` into `output`. An empty input leaves an empty output file behind and fails
/// with `EmptyInput`.
pub fn encode_with(input: &Path, output: &Path, opts: &HuffOpts) -> Result<EncodeReport, StageError> {
    let mut source = File::open(input)
        .map_err(|source| HuffError::SourceUnavailable {
            path: input.to_path_buf(),
            source,
        })
        .at(Stage::Profiling)?;
    check_distinct(input, output).at(Stage::Profiling)?;
    let mut sink = File::create(output)
        .map_err(|source| HuffError::SinkUnavailable {
            path: output.to_path_buf(),
            source,
        })
        .at(Stage::Profiling)?;
    info!("Encoding {} into {}", input.display(), output.display());
    encode_stream(&mut source, &mut sink, opts)
}

/// Compress from a seekable source into a seekable sink, backpatching the trailing bit count.
pub fn encode_stream<R, W>(source: &mut R, sink: &mut W, opts: &HuffOpts) -> Result<EncodeReport, StageError>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let mut timer = Timer::new();
    let start = source.stream_position().at(Stage::Profiling)?;
    let plan = plan(source, opts, &mut timer)?;

    // Header region, with a placeholder for the trailing bit count
    let header_len = write_prelude(sink, &plan.header, 0).at(Stage::HeaderWriting)?;
    let marker = sink
        .stream_position()
        .at(Stage::HeaderWriting)?
        .checked_sub(1)
        .ok_or_else(|| StageError::new(Stage::HeaderWriting, HuffError::corrupt("sink position went backwards")))?;
    timer.mark("write header");

    source.seek(SeekFrom::Start(start)).at(Stage::BodyWriting)?;
    let (bytes_in, body_bytes, padding) = write_body(source, &mut *sink, &plan, opts).at(Stage::BodyWriting)?;

    // Backpatch the trailing bit count, then leave the sink at its end
    sink.seek(SeekFrom::Start(marker)).at(Stage::BodyWriting)?;
    sink.write_all(&[padding]).at(Stage::BodyWriting)?;
    sink.seek(SeekFrom::End(0)).at(Stage::BodyWriting)?;
    sink.flush().at(Stage::BodyWriting)?;
    timer.mark("write body");

    if plan.table.trailing_bits(&plan.freqs) != Some(padding) {
        return Err(StageError::new(
            Stage::BodyWriting,
            HuffError::corrupt(format!("wrote {} pad bits, frequencies predicted otherwise", padding)),
        ));
    }

    let report = EncodeReport {
        bytes_in,
        bytes_out: 4 + header_len as u64 + body_bytes,
        distinct: plan.freqs.distinct(),
        header_len,
        trailing_bits: padding,
    };
    finish(&report, &timer);
    Ok(report)
}

/// Compress into a sink that cannot seek, such as stdout. The trailing bit count is computed from
/// the frequency table before any body bit is written.
pub fn encode_stream_append<R, W>(source: &mut R, sink: &mut W, opts: &HuffOpts) -> Result<EncodeReport, StageError>
where
    R: Read + Seek,
    W: Write,
{
    let mut timer = Timer::new();
    let start = source.stream_position().at(Stage::Profiling)?;
    let plan = plan(source, opts, &mut timer)?;

    let predicted = plan.table.trailing_bits(&plan.freqs).ok_or_else(|| {
        StageError::new(Stage::HeaderWriting, HuffError::corrupt("profiled byte has no code word"))
    })?;
    let header_len = write_prelude(sink, &plan.header, predicted).at(Stage::HeaderWriting)?;
    timer.mark("write header");

    source.seek(SeekFrom::Start(start)).at(Stage::BodyWriting)?;
    let (bytes_in, body_bytes, padding) = write_body(source, &mut *sink, &plan, opts).at(Stage::BodyWriting)?;
    sink.flush().at(Stage::BodyWriting)?;
    timer.mark("write body");

    if padding != predicted {
        return Err(StageError::new(
            Stage::BodyWriting,
            HuffError::corrupt(format!("predicted {} pad bits, wrote {}", predicted, padding)),
        ));
    }

    let report = EncodeReport {
        bytes_in,
        bytes_out: 4 + header_len as u64 + body_bytes,
        distinct: plan.freqs.distinct(),
        header_len,
        trailing_bits: padding,
    };
    finish(&report, &timer);
    Ok(report)
}

/// Profile the source, build the tree and serialize it.
fn plan<R: Read>(source: &mut R, opts: &HuffOpts, timer: &mut Timer) -> Result<Plan, StageError> {
    info!("Profiling source in chunks of {} bytes", opts.chunk_size);
    let freqs = profile(&mut *source, opts.chunk_size, opts.limit).at(Stage::Profiling)?;
    timer.mark("generate frequency table");
    if freqs.total() == 0 {
        return Err(StageError::new(Stage::Profiling, HuffError::EmptyInput));
    }
    info!(
        "Profiled {} bytes, {} distinct values",
        freqs.total(),
        freqs.distinct()
    );
    if opts.show_freqs {
        freqs.report();
    }

    let tree = HuffTree::from_freqs(&freqs).at(Stage::TreeBuilding)?;
    let table = tree.encoding_table();
    timer.mark("generate huffman tree");
    if opts.show_codes {
        table.report();
    }

    let header = encode_header(&tree).at(Stage::HeaderWriting)?;
    debug!("Tree header is {} bytes", header.len());
    Ok(Plan {
        freqs,
        table,
        header,
    })
}

/// Write the length field, the tree region and the trailing bit count byte.
/// Returns the value written to the length field.
fn write_prelude<W: Write>(sink: &mut W, header: &[u8], padding: u8) -> Result<u32, HuffError> {
    let header_len = u32::try_from(header.len() + 1)
        .map_err(|_| HuffError::corrupt("tree header does not fit the length field"))?;
    sink.write_all(&header_len.to_le_bytes())?;
    sink.write_all(header)?;
    sink.write_all(&[padding])?;
    Ok(header_len)
}

/// Stream the source again and write the code word of every byte.
/// Returns (source bytes read, body bytes written, pad bits in the final byte).
fn write_body<R: Read, W: Write>(
    source: &mut R,
    sink: W,
    plan: &Plan,
    opts: &HuffOpts,
) -> Result<(u64, u64, u8), HuffError> {
    let mut source = source.take(opts.limit.unwrap_or(u64::MAX));
    let mut bw = BitWriter::with_capacity(sink, opts.chunk_size);
    let mut buf = vec![0_u8; opts.chunk_size.max(1)];
    let mut bytes_in = 0_u64;

    loop {
        let size = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(size) => size,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        for &byte in &buf[..size] {
            let code = plan.table.get(byte).ok_or_else(|| {
                HuffError::corrupt(format!("byte {:#04x} was not seen while profiling", byte))
            })?;
            bw.write_code(code)?;
        }
        bytes_in += size as u64;
    }

    if bytes_in != plan.freqs.total() {
        return Err(HuffError::corrupt(format!(
            "profiled {} bytes but encoded {}",
            plan.freqs.total(),
            bytes_in
        )));
    }

    let padding = bw.flush_to_boundary()?;
    let body_bytes = bw.bytes_out();
    bw.finish()?;
    debug!("Body is {} bytes, last byte carries {} pad bits", body_bytes, padding);
    Ok((bytes_in, body_bytes, padding))
}

fn finish(report: &EncodeReport, timer: &Timer) {
    info!(
        "Encoded {} bytes into {} ({:.1}% of original)",
        report.bytes_in,
        report.bytes_out,
        report.ratio() * 100.0
    );
    timer.report();
}
