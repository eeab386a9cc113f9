//! Fixed-depth life-and-death queries over the CFG board: eyes, nakade,
//! ladders, and kill/save search.
//!
//! Grounded on `position.rs`'s `is_eyeish`/`is_eye` (folded here into a
//! single O(1) hash3x3 lookup table per color, per §4.2) and its
//! `fix_atari_ext`/`read_ladder_attack` pair, generalized from one-shot
//! flood-fill computation over raw stone arrays to operate on the CFG
//! board's persistent `Group` objects.

use crate::board::{neighbors4, CfgBoard, Color, Point, Slot};
use crate::constants::N;
use std::sync::OnceLock;

/// Decode whether a 3x3 hash3x3 code represents a true eye for `want`.
/// Orthogonal neighbors (low byte) must all be own-color or off-board;
/// diagonal neighbors (high byte) tolerate at most one off-color diagonal,
/// zero if none of the diagonals are off-board (§4.2).
fn decode_is_eye(code: u16, want: Color) -> bool {
    let own = match want {
        Color::Black => 1u8,
        Color::White => 0u8,
    };
    let opp = 1 - own;
    for k in 0..4 {
        let v = ((code >> (2 * k)) & 3) as u8;
        if v != 3 && v != own {
            return false;
        }
    }
    let mut at_edge = false;
    let mut false_count = 0;
    for k in 0..4 {
        let v = ((code >> (8 + 2 * k)) & 3) as u8;
        if v == 3 {
            at_edge = true;
        } else if v == opp {
            false_count += 1;
        }
    }
    let tolerance = if at_edge { 1 } else { 0 };
    false_count <= tolerance
}

struct EyeTables {
    black: Box<[bool]>,
    white: Box<[bool]>,
}

static EYE_TABLES: OnceLock<EyeTables> = OnceLock::new();

fn eye_tables() -> &'static EyeTables {
    EYE_TABLES.get_or_init(|| EyeTables {
        black: (0u32..=0xFFFF).map(|c| decode_is_eye(c as u16, Color::Black)).collect(),
        white: (0u32..=0xFFFF).map(|c| decode_is_eye(c as u16, Color::White)).collect(),
    })
}

/// True if `pt` is an empty point surrounded, eye-like, by `color`.
pub fn is_eye(board: &CfgBoard, pt: Point, color: Color) -> bool {
    if board.slot(pt) != Slot::Empty {
        return false;
    }
    let t = eye_tables();
    let code = board.hash3x3(pt) as usize;
    match color {
        Color::Black => t.black[code],
        Color::White => t.white[code],
    }
}

/// Flood-fill the maximal empty region containing `pt`, aborting early if
/// it grows past `max_size`.
pub(crate) fn flood_empty_region(board: &CfgBoard, pt: Point, max_size: usize) -> Option<Vec<Point>> {
    if board.slot(pt) != Slot::Empty {
        return None;
    }
    let mut region = vec![pt];
    let mut seen = vec![pt];
    let mut i = 0;
    while i < region.len() {
        let cur = region[i];
        i += 1;
        for n in neighbors4(cur) {
            if board.slot(n) == Slot::Empty && !seen.contains(&n) {
                seen.push(n);
                region.push(n);
                if region.len() > max_size {
                    return None;
                }
            }
        }
    }
    Some(region)
}

/// The single color bordering `region`, or `None` if the border is mixed.
pub(crate) fn region_border_color(board: &CfgBoard, region: &[Point]) -> Option<Color> {
    let mut color: Option<Color> = None;
    for &pt in region {
        for n in neighbors4(pt) {
            if region.contains(&n) {
                continue;
            }
            match board.slot(n).color() {
                None => {} // off-board
                Some(c) => match color {
                    None => color = Some(c),
                    Some(existing) if existing != c => return None,
                    _ => {}
                },
            }
        }
    }
    color
}

/// Minimum external liberty count (outside `region`) among groups of
/// `color` bordering `region`; used to judge whether an eye shape can be
/// forced.
fn min_external_liberties(board: &CfgBoard, region: &[Point], color: Color) -> Option<u32> {
    let mut min_libs = None;
    for &pt in region {
        for n in neighbors4(pt) {
            if let Some(id) = board.group_of[n] {
                let g = board.group(id).unwrap();
                if g.color != color {
                    continue;
                }
                let external = g.lib_count.saturating_sub(region.iter().filter(|&&r| g.liberties.get(r)).count() as u32);
                min_libs = Some(min_libs.map_or(external, |m: u32| m.min(external)));
            }
        }
    }
    min_libs
}

/// Two-point eye check: an adjacent pair of empty points solidly
/// surrounded by `color`. Returns whether the shape can be forced (the
/// surrounding group has little slack beyond the eye).
pub fn is_2pt_eye(board: &CfgBoard, pt: Point, color: Color) -> Option<bool> {
    let region = flood_empty_region(board, pt, 2)?;
    if region.len() != 2 {
        return None;
    }
    if region_border_color(board, &region)? != color {
        return None;
    }
    let can_force = min_external_liberties(board, &region, color).unwrap_or(u32::MAX) <= 1;
    Some(can_force)
}

/// Four-point eye check: a small (size-4) empty block solidly surrounded
/// by `color`.
pub fn is_4pt_eye(board: &CfgBoard, pt: Point, color: Color) -> Option<bool> {
    let region = flood_empty_region(board, pt, 4)?;
    if region.len() != 4 {
        return None;
    }
    if region_border_color(board, &region)? != color {
        return None;
    }
    let can_force = min_external_liberties(board, &region, color).unwrap_or(u32::MAX) <= 1;
    Some(can_force)
}

/// Size estimate of the dead shape `pt` is the vital point of, or 0. Shapes
/// are classified by region size and solid single-color border (straight/
/// bent three, pyramid four, crossed/bulky five, rabbity six all collapse
/// to "size N, one border color" here rather than being distinguished by
/// exact topology).
pub fn is_nakade(board: &CfgBoard, pt: Point) -> u32 {
    let region = match flood_empty_region(board, pt, 6) {
        Some(r) if !r.is_empty() => r,
        _ => return 0,
    };
    match region_border_color(board, &region) {
        Some(_) => region.len() as u32,
        None => 0,
    }
}

/// Depth cap for kill/save search and ladder reading, §4.2's "≈3·N".
pub fn default_depth_cap() -> usize {
    3 * N
}

/// Whether the group at `group_id` (already in atari or 2-liberty ladder
/// shape) can be captured by bounded alternating search. A thin wrapper
/// over [`get_killing_play`] at the spec's `3N` depth cap.
pub fn is_ladder(board: &CfgBoard, group_id: Point) -> bool {
    get_killing_play(board, group_id, default_depth_cap()).is_some()
}

/// Candidate liberties for a kill/save search: the group's own liberties,
/// plus the single liberty of any one-liberty neighbor group (a capturing
/// counter-move).
fn candidate_moves(board: &CfgBoard, group_id: Point) -> Vec<Point> {
    let group = board.group(group_id).unwrap();
    let mut moves: Vec<Point> = group.liberties.iter().collect();
    for &nid in &group.neighbor_ids {
        if let Some(ng) = board.group(nid) {
            if ng.lib_count == 1 {
                if let Some(lib) = ng.liberties.iter().next() {
                    if !moves.contains(&lib) {
                        moves.push(lib);
                    }
                }
            }
        }
    }
    moves
}

/// Recursive alternating search (§4.2): the attacker (opponent of the
/// group's color) tries to force capture within `depth_cap` plies. Returns
/// the first move found to work, or `None` if the group escapes.
pub fn get_killing_play(board: &CfgBoard, group_id: Point, depth_cap: usize) -> Option<Point> {
    let group = board.group(group_id)?;
    if group.lib_count == 0 || group.lib_count > 3 || depth_cap == 0 {
        return None;
    }
    let color = group.color;
    let attacker = color.opponent();
    let anchor = group.stones[0];

    for mv in candidate_moves(board, group_id) {
        if !board.can_play(mv, attacker, true) {
            continue;
        }
        let mut test = board.clone();
        if test.play(mv, attacker).is_err() {
            continue;
        }
        let still_alive = test.group_of[anchor];
        match still_alive {
            None => return Some(mv), // captured outright
            Some(new_id) => {
                let new_group = test.group(new_id).unwrap();
                if new_group.lib_count == 0 {
                    return Some(mv);
                }
                if get_saving_play(&test, new_id, depth_cap - 1).is_none() {
                    return Some(mv);
                }
            }
        }
    }
    None
}

/// Recursive alternating search (§4.2): the defender (the group's own
/// color) tries to reach safety within `depth_cap` plies. Returns the
/// first move found to work, or `None` if capture is forced.
pub fn get_saving_play(board: &CfgBoard, group_id: Point, depth_cap: usize) -> Option<Point> {
    let group = board.group(group_id)?;
    if group.lib_count == 0 || group.lib_count > 3 || depth_cap == 0 {
        return None;
    }
    let color = group.color;
    let anchor = group.stones[0];

    for mv in candidate_moves(board, group_id) {
        if !board.can_play(mv, color, true) {
            continue;
        }
        let mut test = board.clone();
        if test.play(mv, color).is_err() {
            continue;
        }
        let new_id = match test.group_of[anchor] {
            Some(id) => id,
            None => continue, // shouldn't happen: defender's own stone vanished
        };
        let new_group = test.group(new_id).unwrap();
        if new_group.lib_count >= 3 {
            return Some(mv);
        }
        if new_group.lib_count >= 2 && get_killing_play(&test, new_id, depth_cap - 1).is_none() {
            return Some(mv);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::parse_coord;

    fn at(s: &str) -> Point {
        parse_coord(s).unwrap()
    }

    #[test]
    fn center_eye_surrounded_by_black_is_an_eye() {
        let mut board = CfgBoard::new();
        for n in ["D4", "F4", "E3", "E5"] {
            let pt = at(n);
            board.play(pt, Color::Black).unwrap();
        }
        // E4's diagonals (D3,D5,F3,F5) are left empty: still within the
        // zero-tolerance budget only if none are white, which holds here.
        assert!(is_eye(&board, at("E4"), Color::Black));
    }

    #[test]
    fn point_next_to_empty_is_not_an_eye() {
        let board = CfgBoard::new();
        assert!(!is_eye(&board, at("E5"), Color::Black));
    }

    #[test]
    fn simple_ladder_is_captured() {
        let mut board = CfgBoard::new();
        // White stone at B2 in a ladder shape, black B1,A2,C2,A3 surrounding.
        board.play(at("B1"), Color::Black).unwrap();
        board.play(at("B2"), Color::White).unwrap();
        board.play(at("A2"), Color::Black).unwrap();
        board.play(at("C2"), Color::Black).unwrap();
        board.play(at("A3"), Color::Black).unwrap();
        let white_id = board.group_of[at("B2")].unwrap();
        let killing = get_killing_play(&board, white_id, default_depth_cap());
        assert_eq!(killing, Some(at("B3")));
        let saving = get_saving_play(&board, white_id, default_depth_cap());
        assert_eq!(saving, None);
    }
}
