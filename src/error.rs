//! Crate-wide error types, in the teacher's manual `Display` +
//! `std::error::Error` style (no derive macro): see `MoveError` in the
//! original `position.rs` for the precedent this follows.

use std::fmt;

/// A move rejected at the CFG board boundary. Origin: caller. The board is
/// left unchanged whenever this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    /// The point is not empty.
    Occupied,
    /// The move immediately retakes a ko.
    Ko,
    /// The move would leave its own group with zero liberties.
    Suicide,
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            MoveError::Occupied => "point is not empty",
            MoveError::Ko => "retakes ko",
            MoveError::Suicide => "suicide",
        };
        write!(f, "illegal move: {msg}")
    }
}

impl std::error::Error for MoveError {}

/// A non-fatal condition raised by the transposition table. Origin: table.
/// The search always has a best-move-so-far to fall back to; callers log
/// this and continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchWarning {
    /// `lookup_or_create` could not allocate a new node because
    /// `max_allocated_states` was reached.
    MemoryExhausted,
    /// The search's time or simulation budget elapsed.
    Timeout,
}

impl fmt::Display for SearchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchWarning::MemoryExhausted => {
                write!(f, "search memory exhausted, returning best move found so far")
            }
            SearchWarning::Timeout => write!(f, "search timed out, returning best move found so far"),
        }
    }
}

impl std::error::Error for SearchWarning {}

/// A malformed persisted file (`.pat3`, `.pts`). Origin: file loaders.
/// Surfaced to the outermost caller with a one-line reason; the loader
/// never partially applies a file it cannot fully parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub line: usize,
    pub reason: String,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed input at line {}: {}", self.line, self.reason)
    }
}

impl std::error::Error for LoadError {}
