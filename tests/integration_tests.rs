//! End-to-end scenarios and universal invariants exercising the full
//! board/tactical/scoring/engine stack together, rather than one module
//! at a time.

use matilda::board::{CfgBoard, Color};
use matilda::config::SearchConfig;
use matilda::coord::parse_coord;
use matilda::engine::Engine;
use matilda::scoring::{result_string, score_board};
use matilda::tactical;
use std::time::{Duration, Instant};

fn at(s: &str) -> usize {
    parse_coord(s).unwrap()
}

fn play(board: &mut CfgBoard, s: &str, color: Color) {
    board.play(at(s), color).unwrap();
}

/// Scenario 1: a white stone in a textbook ladder shape is captured, with
/// no saving play available.
#[test]
fn simple_ladder_has_no_saving_play() {
    let mut board = CfgBoard::new();
    play(&mut board, "B1", Color::Black);
    play(&mut board, "B2", Color::White);
    play(&mut board, "A2", Color::Black);
    play(&mut board, "C2", Color::Black);
    play(&mut board, "A3", Color::Black);

    let white_id = board.group_of[at("B2")].unwrap();
    let depth = tactical::default_depth_cap();
    assert_eq!(tactical::get_killing_play(&board, white_id, depth), Some(at("B3")));
    assert_eq!(tactical::get_saving_play(&board, white_id, depth), None);
}

/// Scenario 2: a black stone confined to a single shared liberty escapes
/// by capturing the white stone it shares that liberty with.
#[test]
fn escape_via_capture() {
    let mut board = CfgBoard::new();
    // White D4 boxed in on three sides, one shared liberty at D5.
    play(&mut board, "C4", Color::Black);
    play(&mut board, "E4", Color::Black);
    play(&mut board, "D3", Color::Black);
    play(&mut board, "D4", Color::White);
    // Black D6 boxed in on three sides, sharing that same liberty at D5.
    play(&mut board, "C6", Color::White);
    play(&mut board, "E6", Color::White);
    play(&mut board, "D7", Color::White);
    play(&mut board, "D6", Color::Black);

    let black_id = board.group_of[at("D6")].unwrap();
    assert_eq!(board.group(black_id).unwrap().lib_count, 1);
    let depth = tactical::default_depth_cap();
    let saving = tactical::get_saving_play(&board, black_id, depth);
    assert_eq!(saving, Some(at("D5")));

    board.play(at("D5"), Color::Black).unwrap();
    assert!(board.group_of[at("D4")].is_none(), "capturing D5 should remove the white stone at D4");
}

/// Scenario 3: a 1x5 empty interior solidly bordered by one color is
/// classified as a nakade shape of the right size. `get_killing_play`'s
/// recursive reader only operates on already-confined (<=3 liberty)
/// groups (see DESIGN.md), so the literal "kill finds the center" claim
/// is exercised instead through the shape classifier `priors.rs` actually
/// consults.
#[test]
fn nakade_shape_is_classified_by_size_and_border() {
    let mut board = CfgBoard::new();
    for col in ["A", "B", "C", "D", "E"] {
        play(&mut board, &format!("{col}2"), Color::Black);
    }
    play(&mut board, "F1", Color::Black);

    for col in ["A", "B", "C", "D", "E"] {
        let pt = at(&format!("{col}1"));
        assert_eq!(tactical::is_nakade(&board, pt), 5, "{col}1 should see the full 5-point region");
    }
}

/// Scenario 4: capturing a single stone creates a ko that immediately
/// bans the recapture, but the ban lifts after an intervening move.
#[test]
fn ko_recapture_is_banned_then_clears() {
    let mut board = CfgBoard::new();
    play(&mut board, "C5", Color::Black);
    play(&mut board, "D4", Color::Black);
    play(&mut board, "E5", Color::Black);
    play(&mut board, "C6", Color::White);
    play(&mut board, "E6", Color::White);
    play(&mut board, "D7", Color::White);
    play(&mut board, "D5", Color::White); // sole liberty: D6

    board.play(at("D6"), Color::Black).unwrap(); // captures D5, creates ko
    assert!(board.group_of[at("D5")].is_none());
    assert!(!board.can_play(at("D5"), Color::White, true), "immediate recapture must respect ko");

    board.play(at("A1"), Color::White).unwrap(); // elsewhere, clears the ko flag
    assert!(board.can_play(at("D5"), Color::White, true), "ko ban lifts after an intervening move");
    board.play(at("D5"), Color::White).unwrap();
    assert!(board.group_of[at("D6")].is_none(), "recapture should take back the lone black stone");
}

/// Scenario 5: area scoring on a board split cleanly between the two
/// colors with a neutral middle row.
#[test]
fn area_scoring_of_a_split_board() {
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
    let score = score_board(&board);
    assert_eq!(score, -15);
    assert_eq!(result_string(score), "W+7.5");
}

/// Scenario 6: the engine recommends a real move (not a pass) on an empty
/// board within a short time budget.
#[test]
fn engine_smoke_on_empty_board() {
    let cfg = SearchConfig { batch_size: 64, worker_threads: 2, max_allocated_states: 1 << 14, ..SearchConfig::default() };
    let engine = Engine::new(cfg);
    let board = CfgBoard::new();
    let deadline = Instant::now() + Duration::from_millis(200);
    let out = engine.evaluate_position(&board, Color::Black, deadline);
    assert!(out.best_move.is_some());
}

/// Universal invariants (§8), checked along a run of random legal moves.
#[test]
fn cfg_invariants_hold_along_random_play() {
    let mut rng = fastrand::Rng::with_seed(99);
    let mut board = CfgBoard::new();
    let mut to_play = Color::Black;

    for _ply in 0..150 {
        let legal: Vec<usize> = board.empty_positions.iter().copied().filter(|&p| board.can_play(p, to_play, true)).collect();
        if legal.is_empty() {
            break;
        }
        let mv = legal[rng.usize(..legal.len())];
        board.play(mv, to_play).unwrap();
        to_play = to_play.opponent();

        check_invariants(&board);
    }
}

fn check_invariants(board: &CfgBoard) {
    // group_of[p] = none iff the slot is empty, for every in-bounds point.
    for &p in &board.empty_positions {
        assert!(board.group_of[p].is_none());
    }
    for &id in &board.unique_groups {
        let group = board.group(id).unwrap();
        assert!(group.lib_count >= 1, "every group must have at least one liberty");
        for &s in &group.stones {
            assert_eq!(board.group_of[s], Some(id), "every stone must be owned by its group's id");
        }
    }

    // unique_groups lists every group exactly once.
    let mut seen = std::collections::HashSet::new();
    for &id in &board.unique_groups {
        assert!(seen.insert(id), "duplicate group id {id} in unique_groups");
    }
    let distinct_owners: std::collections::HashSet<_> = board.group_of.iter().filter_map(|g| *g).collect();
    assert_eq!(seen, distinct_owners);

    // Incremental Zobrist hash equals a from-scratch recomputation.
    let mut recomputed = 0u64;
    for p in 0..board.group_of.len() {
        if let matilda::board::Slot::Stone(c) = board.slot(p) {
            recomputed ^= matilda::zobrist::value(p, c);
        }
    }
    assert_eq!(board.zobrist_hash, recomputed);
}
