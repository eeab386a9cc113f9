//! `.pts` point-list loader.
//!
//! A `.pts` file lists named coordinate sets for a board size — hoshi
//! (star points), handicap placements, and similar curated point lists.
//! One set per line: a name, then one or more coordinates in the num-num
//! format `coord.rs` accepts. Grounded on `patterns.rs`'s line-oriented
//! `load_from_str`/`LoadError` shape.

use crate::board::Point;
use crate::coord::parse_coord;
use crate::error::LoadError;
use std::collections::HashMap;

/// Named coordinate lists loaded from a `.pts` file.
#[derive(Debug, Clone, Default)]
pub struct PointSets {
    sets: HashMap<String, Vec<Point>>,
}

impl PointSets {
    pub fn load_from_str(text: &str) -> Result<PointSets, LoadError> {
        let mut sets = HashMap::new();

        for (lineno, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let name = fields.next().ok_or_else(|| LoadError { line: lineno + 1, reason: "missing set name".into() })?;

            let rest: Vec<&str> = fields.collect();
            if rest.is_empty() || rest.len() % 2 != 0 {
                return Err(LoadError { line: lineno + 1, reason: "coordinates must come in row/col pairs".into() });
            }

            let mut points = Vec::with_capacity(rest.len() / 2);
            for pair in rest.chunks(2) {
                let coord = format!("{} {}", pair[0], pair[1]);
                let pt = parse_coord(&coord).ok_or_else(|| LoadError { line: lineno + 1, reason: format!("invalid coordinate: {coord}") })?;
                points.push(pt);
            }

            sets.insert(name.to_string(), points);
        }

        Ok(PointSets { sets })
    }

    pub fn get(&self, name: &str) -> Option<&[Point]> {
        self.sets.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

pub fn load_points_from(path: &std::path::Path) -> Result<PointSets, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError { line: 0, reason: e.to_string() })?;
    PointSets::load_from_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_sets() {
        let text = "hoshi 3 3 3 7 7 3 7 7 5 5\nhandicap 3 3 7 7\n";
        let sets = PointSets::load_from_str(text).unwrap();
        assert_eq!(sets.get("hoshi").unwrap().len(), 5);
        assert_eq!(sets.get("handicap").unwrap().len(), 2);
    }

    #[test]
    fn ignores_comments_and_blank_lines() {
        let text = "# star points\n\nhoshi 5 5\n";
        let sets = PointSets::load_from_str(text).unwrap();
        assert_eq!(sets.get("hoshi").unwrap(), &[parse_coord("5 5").unwrap()]);
    }

    #[test]
    fn rejects_unpaired_coordinates() {
        let text = "hoshi 3 3 7\n";
        assert!(PointSets::load_from_str(text).is_err());
    }

    #[test]
    fn rejects_out_of_range_coordinate() {
        let text = "hoshi 99 99\n";
        assert!(PointSets::load_from_str(text).is_err());
    }

    #[test]
    fn unknown_set_name_is_none() {
        let sets = PointSets::load_from_str("hoshi 5 5\n").unwrap();
        assert!(sets.get("handicap").is_none());
    }
}
