//! 3x3 and large pattern stores.
//!
//! The 3x3 store is grounded directly on the teacher's `pat_enumerate`/
//! `compute_code` dihedral-symmetry expansion (8-fold rotation/reflection
//! plus color swap), generalized from a bare membership bitset to a
//! weighted `HashMap<u16, u16>` keyed by the same absolute-color env8 code
//! [`crate::board::CfgBoard::hash3x3`] produces, per §4.3. The large
//! pattern store has no teacher counterpart (michi-c ships none); it is
//! grounded on the same dihedral-expansion idiom, applied to a fixed
//! extended neighborhood template instead of the bare 3x3 one.

use crate::board::{CfgBoard, Color, Point};
use crate::error::LoadError;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Source 3x3 patterns, `(shape, weight)`. Shape alphabet: `X` = mover,
/// `O` = opponent, `.` = empty, `#` = edge, `?` = wildcard (any),
/// `x` = not-X, `o` = not-O. Weights are illustrative defaults; real
/// engines tune these against game records.
const PAT3_SRC: &[(&str, u16)] = &[
    ("XOX...???", 20), // hane: enclosing
    ("XO....?.?", 12), // hane: non-cutting
    ("XO?X..x.?", 12), // hane: magari
    (".O.X.....", 6),  // katatsuke / diagonal attachment
    ("XO?O.o?o?", 14), // cut1: unprotected
    ("XO?O.X???", 10), // cut1: peeped
    ("?X?O.Oooo", 10), // cut2 (de)
    ("OX?o.O???", 8),  // cut keima
    ("X.?O.?##?", 8),  // side: chase
    ("OX?X.O###", 12), // side: block side cut
    ("?X?x.O###", 6),  // side: block side connection
    ("?XOx.x###", 6),  // side: sagari
    ("?OXX.O###", 12), // side: cut
];

/// Weighted 3x3 pattern table keyed by absolute-color env8 code.
pub struct Pat3Store {
    weights: HashMap<u16, u16>,
}

static PAT3_STORE: OnceLock<Pat3Store> = OnceLock::new();

fn pat3_store() -> &'static Pat3Store {
    PAT3_STORE.get_or_init(Pat3Store::build_default)
}

impl Pat3Store {
    fn build_default() -> Pat3Store {
        let mut weights = HashMap::new();
        for &(src, w) in PAT3_SRC {
            enumerate_symmetries(src, w, &mut weights);
        }
        Pat3Store { weights }
    }

    /// Parse a `.pat3` text file: one `<9-char shape> <weight>` pair per
    /// line, blank lines and `#`-prefixed comments ignored.
    pub fn load_from_str(text: &str) -> Result<Pat3Store, LoadError> {
        let mut weights = HashMap::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let shape = parts.next().ok_or_else(|| LoadError {
                line: lineno + 1,
                reason: "missing shape field".into(),
            })?;
            if shape.len() != 9 {
                return Err(LoadError {
                    line: lineno + 1,
                    reason: format!("shape must be 9 characters, got {}", shape.len()),
                });
            }
            let weight: u16 = parts
                .next()
                .ok_or_else(|| LoadError {
                    line: lineno + 1,
                    reason: "missing weight field".into(),
                })?
                .parse()
                .map_err(|_| LoadError {
                    line: lineno + 1,
                    reason: "weight is not a valid integer".into(),
                })?;
            enumerate_symmetries(shape, weight, &mut weights);
        }
        Ok(Pat3Store { weights })
    }

    /// Weight of the best-matching pattern at this env8 code, or 0.
    pub fn weight(&self, code: u16) -> u16 {
        self.weights.get(&code).copied().unwrap_or(0)
    }
}

impl Default for Pat3Store {
    fn default() -> Self {
        Pat3Store::build_default()
    }
}

/// True if `pt` matches any registered 3x3 pattern (default table).
pub fn pat3_match(board: &CfgBoard, pt: Point) -> bool {
    pat3_weight(board, pt) > 0
}

/// Weight of the best-matching 3x3 pattern at `pt` (default table).
pub fn pat3_weight(board: &CfgBoard, pt: Point) -> u16 {
    pat3_store().weight(board.hash3x3(pt))
}

fn enumerate_symmetries(src: &str, weight: u16, out: &mut HashMap<u16, u16>) {
    let mut shape: [u8; 9] = src.as_bytes().try_into().expect("pattern source must be 9 chars");
    enumerate_rotation(&shape, weight, out);
    rot90(&mut shape);
    enumerate_rotation(&shape, weight, out);
}

fn enumerate_rotation(src: &[u8; 9], weight: u16, out: &mut HashMap<u16, u16>) {
    let mut shape = *src;
    enumerate_vflip(&shape, weight, out);
    vertflip(&mut shape);
    enumerate_vflip(&shape, weight, out);
}

fn enumerate_vflip(src: &[u8; 9], weight: u16, out: &mut HashMap<u16, u16>) {
    let mut shape = *src;
    enumerate_hflip(&shape, weight, out);
    horizflip(&mut shape);
    enumerate_hflip(&shape, weight, out);
}

fn enumerate_hflip(src: &[u8; 9], weight: u16, out: &mut HashMap<u16, u16>) {
    let mut shape = *src;
    expand_wildcards(&shape, 0, weight, out);
    swapcolor(&mut shape);
    expand_wildcards(&shape, 0, weight, out);
}

fn expand_wildcards(src: &[u8; 9], i: usize, weight: u16, out: &mut HashMap<u16, u16>) {
    if i == 9 {
        let code = compute_code(src);
        let entry = out.entry(code).or_insert(0);
        if weight > *entry {
            *entry = weight;
        }
        return;
    }
    match src[i] {
        b'?' => {
            for &c in &[b'X', b'O', b'.', b'#'] {
                let mut next = *src;
                next[i] = c;
                expand_wildcards(&next, i + 1, weight, out);
            }
        }
        b'x' => {
            for &c in &[b'O', b'.', b'#'] {
                let mut next = *src;
                next[i] = c;
                expand_wildcards(&next, i + 1, weight, out);
            }
        }
        b'o' => {
            for &c in &[b'X', b'.', b'#'] {
                let mut next = *src;
                next[i] = c;
                expand_wildcards(&next, i + 1, weight, out);
            }
        }
        _ => expand_wildcards(src, i + 1, weight, out),
    }
}

/// Pattern cell layout:
/// ```text
/// 0 1 2
/// 3 4 5   (4 is the matched point itself, unused in the code)
/// 6 7 8
/// ```
/// Low byte = orthogonal neighbors (N,E,S,W), high byte = diagonal
/// neighbors (NE,SE,SW,NW) — identical layout to
/// [`crate::board::CfgBoard::hash3x3`].
fn compute_code(src: &[u8; 9]) -> u16 {
    let mut code: u16 = 0;
    code |= cell_code(src[1], 0);
    code |= cell_code(src[5], 1);
    code |= cell_code(src[7], 2);
    code |= cell_code(src[3], 3);
    code |= cell_code(src[2], 0) << 8;
    code |= cell_code(src[8], 1) << 8;
    code |= cell_code(src[6], 2) << 8;
    code |= cell_code(src[0], 3) << 8;
    code
}

fn cell_code(ch: u8, shift: u8) -> u16 {
    let c: u16 = match ch {
        b'O' => 0,
        b'X' => 1,
        b'.' => 2,
        b'#' => 3,
        other => panic!("unexpected pattern character {:?}", other as char),
    };
    let hi = (c >> 1) & 1;
    let lo = c & 1;
    ((hi << 4) | lo) << shift
}

fn swapcolor(src: &mut [u8; 9]) {
    for c in src.iter_mut() {
        *c = match *c {
            b'X' => b'O',
            b'O' => b'X',
            b'x' => b'o',
            b'o' => b'x',
            other => other,
        };
    }
}

fn horizflip(src: &mut [u8; 9]) {
    src.swap(0, 6);
    src.swap(1, 7);
    src.swap(2, 8);
}

fn vertflip(src: &mut [u8; 9]) {
    src.swap(0, 2);
    src.swap(3, 5);
    src.swap(6, 8);
}

fn rot90(src: &mut [u8; 9]) {
    let t = src[0];
    src[0] = src[2];
    src[2] = src[8];
    src[8] = src[6];
    src[6] = t;

    let t = src[1];
    src[1] = src[5];
    src[5] = src[7];
    src[7] = src[3];
    src[3] = t;
}

/// Offsets (as `(row, col)` deltas from the matched point) of the extended
/// neighborhood large patterns are fingerprinted over: the 8 immediate
/// neighbors plus the 4 points at Manhattan distance 2 along the cardinal
/// directions — 12 points total, a fixed template rather than the
/// reference engine's full ~17-point diamond.
const LARGE_OFFSETS: [(isize, isize); 12] = [
    (-1, 0), (1, 0), (0, -1), (0, 1),
    (-1, -1), (-1, 1), (1, -1), (1, 1),
    (-2, 0), (2, 0), (0, -2), (0, 2),
];

fn large_fingerprint(board: &CfgBoard, pt: Point, color: Color) -> String {
    use crate::constants::N;
    let row = (pt / (N + 1)) as isize;
    let col = (pt % (N + 1)) as isize;
    let mut s = String::with_capacity(LARGE_OFFSETS.len());
    for &(dr, dc) in &LARGE_OFFSETS {
        let r = row + dr;
        let c = col + dc;
        if r < 1 || c < 1 {
            s.push('#');
            continue;
        }
        let n = (r as usize) * (N + 1) + (c as usize);
        let ch = match board.slot(n).color() {
            None => '#',
            Some(sc) if sc == color => 'X',
            Some(_) => 'O',
        };
        s.push(ch);
    }
    s
}

/// A loaded dictionary of large (extended-neighborhood) patterns, each with
/// a numeric id and a win-probability estimate.
#[derive(Default)]
pub struct LargePatternStore {
    by_fingerprint: HashMap<String, (u32, f64)>,
}

impl LargePatternStore {
    pub fn empty() -> Self {
        LargePatternStore::default()
    }

    /// Parse a large-pattern text file: one `<id> <fingerprint> <probability>`
    /// triple per line.
    pub fn load_from_str(text: &str) -> Result<LargePatternStore, LoadError> {
        let mut by_fingerprint = HashMap::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let id: u32 = parts
                .next()
                .ok_or_else(|| LoadError { line: lineno + 1, reason: "missing id field".into() })?
                .parse()
                .map_err(|_| LoadError { line: lineno + 1, reason: "id is not a valid integer".into() })?;
            let fingerprint = parts
                .next()
                .ok_or_else(|| LoadError { line: lineno + 1, reason: "missing fingerprint field".into() })?
                .to_string();
            if fingerprint.len() != LARGE_OFFSETS.len() {
                return Err(LoadError {
                    line: lineno + 1,
                    reason: format!("fingerprint must be {} characters", LARGE_OFFSETS.len()),
                });
            }
            let probability: f64 = parts
                .next()
                .ok_or_else(|| LoadError { line: lineno + 1, reason: "missing probability field".into() })?
                .parse()
                .map_err(|_| LoadError { line: lineno + 1, reason: "probability is not a valid float".into() })?;
            by_fingerprint.insert(fingerprint, (id, probability));
        }
        Ok(LargePatternStore { by_fingerprint })
    }

    /// Estimated probability this is a strong move for `color`, or 0.0 if
    /// no large pattern matches.
    pub fn probability(&self, board: &CfgBoard, pt: Point, color: Color) -> f64 {
        let fp = large_fingerprint(board, pt, color);
        self.by_fingerprint.get(&fp).map(|&(_, p)| p).unwrap_or(0.0)
    }

    /// Ids of every loaded pattern matching `pt` for `color` (at most one,
    /// under this store's exact-fingerprint matching).
    pub fn matching_pattern_ids(&self, board: &CfgBoard, pt: Point, color: Color) -> Vec<u32> {
        let fp = large_fingerprint(board, pt, color);
        self.by_fingerprint.get(&fp).map(|&(id, _)| vec![id]).unwrap_or_default()
    }
}

/// Load a `.pat3` file from disk.
pub fn load_pat3_from(path: &std::path::Path) -> Result<Pat3Store, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError { line: 0, reason: e.to_string() })?;
    Pat3Store::load_from_str(&text)
}

/// Load a large-pattern file from disk.
pub fn load_large_patterns_from(path: &std::path::Path) -> Result<LargePatternStore, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError { line: 0, reason: e.to_string() })?;
    LargePatternStore::load_from_str(&text)
}

/// Convenience wrapper matching the large-pattern probability lookup
/// against the engine's loaded store (or 0.0 against an empty one).
pub fn large_pattern_probability(store: &LargePatternStore, board: &CfgBoard, pt: Point, color: Color) -> f64 {
    store.probability(board, pt, color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::parse_coord;

    #[test]
    fn default_table_has_many_entries() {
        let store = pat3_store();
        assert!(store.weights.len() > 1000, "expected dihedral+color-swap expansion to produce many codes");
    }

    #[test]
    fn hane_pattern_matches_after_moves() {
        let mut board = CfgBoard::new();
        board.play(parse_coord("C5").unwrap(), Color::Black).unwrap();
        board.play(parse_coord("D6").unwrap(), Color::White).unwrap();
        board.play(parse_coord("E5").unwrap(), Color::Black).unwrap();
        let pt = parse_coord("D5").unwrap();
        assert!(pat3_match(&board, pt));
    }

    #[test]
    fn pat3_file_round_trips() {
        let text = "XOX...??? 42\n";
        let store = Pat3Store::load_from_str(text).unwrap();
        assert!(!store.weights.is_empty());
    }

    #[test]
    fn large_pattern_store_matches_loaded_fingerprint() {
        let board = CfgBoard::new();
        let pt = parse_coord("E5").unwrap();
        let fp = large_fingerprint(&board, pt, Color::Black);
        let text = format!("7 {fp} 0.62\n");
        let store = LargePatternStore::load_from_str(&text).unwrap();
        assert_eq!(store.probability(&board, pt, Color::Black), 0.62);
        assert_eq!(store.matching_pattern_ids(&board, pt, Color::Black), vec![7]);
    }
}
