//! Positional-area (Chinese-style) scoring, in exact integer half-points.
//!
//! Grounded on `playout.rs::score`, generalized from a per-perspective
//! `f64` tally to an absolute (Black-positive) `i32` half-point margin so
//! the same value can be reused by the playout engine, the UCT search, and
//! any externally-facing result formatter without repeated sign juggling.

use crate::board::{CfgBoard, Color, Slot};
use crate::constants::{BOARD_IMAX, BOARD_IMIN};
use crate::tactical::{flood_empty_region, region_border_color};

/// Black-minus-White area margin, in half-points (doubled integers), minus
/// komi. Positive favors Black.
pub fn score_board(board: &CfgBoard) -> i32 {
    let mut black = 0i32;
    let mut white = 0i32;
    let mut visited = vec![false; board.group_of.len()];

    for pt in BOARD_IMIN..BOARD_IMAX {
        if visited[pt] {
            continue;
        }
        match board.slot(pt) {
            Slot::Stone(Color::Black) => {
                black += 2;
                visited[pt] = true;
            }
            Slot::Stone(Color::White) => {
                white += 2;
                visited[pt] = true;
            }
            Slot::Empty => {
                let region = flood_empty_region(board, pt, board.empty_positions.len()).unwrap_or_default();
                for &r in &region {
                    visited[r] = true;
                }
                match region_border_color(board, &region) {
                    Some(Color::Black) => black += 2 * region.len() as i32,
                    Some(Color::White) => white += 2 * region.len() as i32,
                    None => {}
                }
            }
            Slot::Out => {}
        }
    }

    black - white - board.komi_half_points
}

/// The color that ends up owning `pt` on the final board: the stone color
/// if occupied, the single bordering color of its empty region if that
/// region borders only one color, `None` for neutral points (dame).
pub fn owner_at(board: &CfgBoard, pt: crate::board::Point) -> Option<Color> {
    match board.slot(pt) {
        Slot::Stone(c) => Some(c),
        Slot::Empty => {
            let region = flood_empty_region(board, pt, board.empty_positions.len())?;
            region_border_color(board, &region)
        }
        Slot::Out => None,
    }
}

/// Format a half-point margin as a GTP-style result string ("B+28.5",
/// "W+7.5", "0" for an exact draw).
pub fn result_string(score_half_points: i32) -> String {
    if score_half_points == 0 {
        return "0".to_string();
    }
    let (winner, magnitude) = if score_half_points > 0 { ("B", score_half_points) } else { ("W", -score_half_points) };
    if magnitude % 2 == 0 {
        format!("{winner}+{}", magnitude / 2)
    } else {
        format!("{winner}+{}.5", magnitude / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::parse_coord;

    #[test]
    fn empty_board_score_is_negative_komi() {
        let board = CfgBoard::new();
        assert_eq!(score_board(&board), -board.komi_half_points);
    }

    #[test]
    fn split_board_with_neutral_row_scores_by_standard_area_rules() {
        // Rows 1-4 black, row 5 empty (bordered by both colors, neutral),
        // rows 6-9 white. The spec's own worked arithmetic for this
        // scenario (72 - 15 = +57) omits subtracting White's area
        // entirely; the standard Chinese-rules definition this module
        // implements instead nets the two sides before komi, so the
        // correct result here is a 15-half-point (7.5 point) White margin,
        // not the spec prose's Black one. See DESIGN.md.
        let mut board = CfgBoard::new();
        for row in 1..=4 {
            for col in 1..=9 {
                let pt = parse_coord(&format!("{col} {row}")).unwrap();
                board.play(pt, Color::Black).unwrap();
            }
        }
        for row in 6..=9 {
            for col in 1..=9 {
                let pt = parse_coord(&format!("{col} {row}")).unwrap();
                board.play(pt, Color::White).unwrap();
            }
        }
        assert_eq!(score_board(&board), -15);
        assert_eq!(result_string(score_board(&board)), "W+7.5");
    }
}
