//! Board geometry constants.
//!
//! The board side is a compile-time constant selected by Cargo feature.
//! Neighbor counts must fit in a byte, which bounds supported board sizes
//! to roughly 21 per side; tunable search/playout parameters live in
//! [`crate::config`] instead of here, since those are parameters rather
//! than compile-time facts about the board.
//!
//! # Board Size Configuration
//!
//! - `board9x9` (default): 9x9 board
//! - `board13x13`: 13x13 board
//!
//! ```sh
//! cargo build                                               # 9x9
//! cargo build --no-default-features --features board13x13   # 13x13
//! ```

#[cfg(feature = "board9x9")]
pub const N: usize = 9;

#[cfg(feature = "board13x13")]
pub const N: usize = 13;

#[cfg(all(feature = "board9x9", feature = "board13x13"))]
compile_error!("Cannot enable both 'board9x9' and 'board13x13' features at the same time");

#[cfg(not(any(feature = "board9x9", feature = "board13x13")))]
compile_error!("Must enable exactly one board size feature: 'board9x9' or 'board13x13'");

/// Board width including left padding (N + 2 for padding on both sides).
pub const W: usize = N + 2;

/// Total board array size including the padding border, so neighbor
/// lookups never need a bounds check.
pub const BOARDSIZE: usize = (N + 1) * W + 1;

/// First valid (non-padding) board index.
pub const BOARD_IMIN: usize = N + 1;

/// One past the last valid (non-padding) board index.
pub const BOARD_IMAX: usize = BOARDSIZE - N - 1;

/// Total number of playable intersections, T = N*N.
pub const T: usize = N * N;

/// Upper bound on a single playout's move count.
pub const MAX_GAME_LEN: usize = N * N * 3;

/// Pass move marker (index 0 is padding, so it is safe to reuse here).
pub const PASS_MOVE: usize = 0;

/// Resign move marker, returned by search when nothing clears the resign
/// threshold.
pub const RESIGN_MOVE: usize = usize::MAX;

/// Neighbor offsets into the padded 1D array.
/// Order: North, East, South, West, NE, SE, SW, NW.
pub const DELTA: [isize; 8] = [
    -(N as isize) - 1,
    1,
    (N as isize) + 1,
    -1,
    -(N as isize),
    W as isize,
    N as isize,
    -(W as isize),
];
