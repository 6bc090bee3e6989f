//! Error types for huffzip.
//!
//! Component-level failures are reported as a [`HuffError`]. The encode and decode pipelines wrap
//! them in a [`StageError`] so the caller can tell which stage of the run gave up.

use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

/// Every way a component of the codec can fail.
#[derive(Debug, thiserror::Error)]
pub enum HuffError {
    /// The input file could not be opened. Nothing has been written.
    #[error("cannot open input {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The output file could not be created.
    #[error("cannot open output {}: {source}", path.display())]
    SinkUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Zero bytes were profiled, so there is no tree to build.
    #[error("input is empty, there is nothing to encode")]
    EmptyInput,

    /// The tree description at the front of a compressed file breaks the header grammar.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// The body does not decode against the tree, or the encoder met a byte it never profiled.
    #[error("corrupt stream: {0}")]
    CorruptStream(String),

    /// Heap underflow. A correct tree build never triggers this.
    #[error("priority queue is empty")]
    EmptyQueue,

    /// Read or write failure on a handle that was opened successfully.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl HuffError {
    pub(crate) fn malformed<S: Into<String>>(msg: S) -> Self {
        HuffError::MalformedHeader(msg.into())
    }

    pub(crate) fn corrupt<S: Into<String>>(msg: S) -> Self {
        HuffError::CorruptStream(msg.into())
    }
}

/// Pipeline stages, in the order a run moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Profiling,
    TreeBuilding,
    HeaderWriting,
    BodyWriting,
    HeaderReading,
    BodyDecoding,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Profiling => "profiling",
            Stage::TreeBuilding => "tree building",
            Stage::HeaderWriting => "header writing",
            Stage::BodyWriting => "body writing",
            Stage::HeaderReading => "header reading",
            Stage::BodyDecoding => "body decoding",
        };
        write!(f, "{}", name)
    }
}

/// A [`HuffError`] tagged with the stage that produced it.
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {kind}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub kind: HuffError,
}

impl StageError {
    pub fn new(stage: Stage, kind: HuffError) -> Self {
        Self { stage, kind }
    }
}

/// Attach a stage to any result whose error converts into a [`HuffError`].
pub(crate) trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, StageError>;
}

impl<T, E: Into<HuffError>> AtStage<T> for Result<T, E> {
    fn at(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|e| StageError::new(stage, e.into()))
    }
}
