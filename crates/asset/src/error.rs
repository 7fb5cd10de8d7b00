//! Errors reported by the mesh loader.

use std::{fmt, io};

use thiserror::Error;

pub type MeshResult<T> = Result<T, MeshError>;

/// Which read of the source failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    /// First read: record counting.
    Sizing,
    /// Second read: table extraction.
    Extraction,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Sizing => f.write_str("sizing"),
            Pass::Extraction => f.write_str("extraction"),
        }
    }
}

/// Attribute table a face corner points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribute {
    Position,
    Texel,
    Normal,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Position => f.write_str("position"),
            Attribute::Texel => f.write_str("texel"),
            Attribute::Normal => f.write_str("normal"),
        }
    }
}

/// Why a recognised record line was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MalformedReason {
    /// Wrong number of whitespace-separated fields after the tag.
    FieldCount { expected: usize, found: usize },
    /// A face group did not split into exactly three `/`-separated indices.
    CornerFormat { group: String },
    /// A field could not be parsed as a number.
    NotANumber { token: String },
    /// The record holds bytes that are not UTF-8.
    NotUtf8,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::FieldCount { expected, found } => {
                write!(f, "expected {expected} fields, found {found}")
            }
            MalformedReason::CornerFormat { group } => {
                write!(f, "corner '{group}' is not of the form p/t/n")
            }
            MalformedReason::NotANumber { token } => write!(f, "'{token}' is not a number"),
            MalformedReason::NotUtf8 => f.write_str("record is not valid UTF-8"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MeshError {
    /// A `v`/`vt`/`vn`/`f` line has the wrong shape. `line` is 1-based.
    #[error("malformed record on line {line} ({reason}): '{content}'")]
    MalformedMesh {
        line: usize,
        content: String,
        reason: MalformedReason,
    },

    /// A face corner points outside the table it indexes. `index` is the raw 1-based value.
    #[error("face {face} corner {corner} references {attribute} {index}, table holds {len}")]
    DanglingReference {
        face: usize,
        corner: usize,
        attribute: Attribute,
        index: i64,
        len: usize,
    },

    /// The source could not be opened or read during one of the passes.
    #[error("mesh source '{name}' unavailable during {pass} pass")]
    SourceUnavailable {
        name: String,
        pass: Pass,
        #[source]
        cause: io::Error,
    },
}

impl MeshError {
    pub(crate) fn malformed(line_no: usize, content: &str, reason: MalformedReason) -> Self {
        Self::MalformedMesh {
            line: line_no + 1,
            content: content.to_string(),
            reason,
        }
    }

    pub(crate) fn unavailable(name: impl Into<String>, pass: Pass, cause: io::Error) -> Self {
        Self::SourceUnavailable {
            name: name.into(),
            pass,
            cause,
        }
    }
}
