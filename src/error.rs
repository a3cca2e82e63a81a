//! Error types for kontig.
//!
//! This module provides exhaustive, strongly-typed errors for all operations
//! in the library, enabling precise error handling and informative messages.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in kontig operations.
#[derive(Debug, Error)]
pub enum KontigError {
    /// K-mer length is outside the valid range.
    #[error("invalid k-mer length {k}: must be between 1 and {max}")]
    InvalidKmerLength { k: usize, max: usize },

    /// Minimizer length is outside the valid range for the current k.
    #[error("invalid minimizer length {g}: must be between 1 and k-1 (k = {k})")]
    InvalidMinimizerLength { g: usize, k: usize },

    /// Encountered a symbol outside {A, C, G, T}.
    #[error(transparent)]
    InvalidSymbol(#[from] InvalidSymbolError),

    /// Failed to read a sequence file.
    #[error("failed to read sequence file '{path}': {source}")]
    SequenceRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to parse a sequence record.
    #[error("failed to parse sequence record: {details}")]
    SequenceParse { details: String },

    /// Failed to read a persisted Bloom filter.
    #[error("failed to read Bloom filter file '{path}': {source}")]
    FilterRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to write a persisted Bloom filter.
    #[error("failed to write Bloom filter file '{path}': {source}")]
    FilterWrite {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// A persisted Bloom filter failed its magic or parameter check.
    #[error("invalid Bloom filter file '{path}': {details}")]
    InvalidFilterFormat { details: String, path: PathBuf },

    /// Failed to write the output graph.
    #[error("failed to write GFA output '{path}': {source}")]
    GfaWrite {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error for a symbol outside the DNA alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSymbolError {
    /// The invalid byte value.
    pub symbol: u8,
    /// Position of the invalid byte in the sequence.
    pub position: usize,
}

impl std::fmt::Display for InvalidSymbolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.symbol.is_ascii_graphic() || self.symbol == b' ' {
            write!(
                f,
                "invalid symbol '{}' (0x{:02x}) at position {}",
                self.symbol as char, self.symbol, self.position
            )
        } else {
            write!(
                f,
                "invalid symbol 0x{:02x} at position {}",
                self.symbol, self.position
            )
        }
    }
}

impl std::error::Error for InvalidSymbolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_symbol_error_display() {
        let err = InvalidSymbolError {
            symbol: b'N',
            position: 5,
        };
        assert_eq!(err.to_string(), "invalid symbol 'N' (0x4e) at position 5");
    }

    #[test]
    fn invalid_symbol_error_display_nonprintable() {
        let err = InvalidSymbolError {
            symbol: 0x07,
            position: 0,
        };
        assert_eq!(err.to_string(), "invalid symbol 0x07 at position 0");
    }

    #[test]
    fn kontig_error_from_invalid_symbol() {
        let err: KontigError = InvalidSymbolError {
            symbol: b'X',
            position: 3,
        }
        .into();
        assert!(matches!(err, KontigError::InvalidSymbol(_)));
    }

    #[test]
    fn invalid_kmer_length_display() {
        let err = KontigError::InvalidKmerLength { k: 99, max: 63 };
        assert_eq!(
            err.to_string(),
            "invalid k-mer length 99: must be between 1 and 63"
        );
    }
}
