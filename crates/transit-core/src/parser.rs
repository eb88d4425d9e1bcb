//! Result heading parser
//!
//! Turns the harvested result headings (`"Sun 5th House"`) into a
//! house-number → planets mapping. Every heading must name a house; a heading
//! that does not fails the whole parse.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;
use crate::types::{HousePlanetMap, RawResultLine};

static HOUSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*th\s*House").expect("house pattern is valid"));

const HOUSE_RANGE: std::ops::RangeInclusive<u8> = 1..=12;

/// Parse result headings into a [`HousePlanetMap`].
///
/// The planet is the first whitespace-delimited token of each line. Planets
/// keep the order in which their lines appear.
pub fn parse(lines: &[RawResultLine]) -> Result<HousePlanetMap, ParseError> {
    let mut map = HousePlanetMap::new();

    for (index, line) in lines.iter().enumerate() {
        let (planet, house) = parse_line(index, line)?;
        map.push(house, planet);
    }

    Ok(map)
}

fn parse_line(index: usize, line: &str) -> Result<(String, u8), ParseError> {
    let unrecognised = || ParseError::UnrecognisedLine {
        index,
        line: line.to_string(),
    };

    let planet = line.split_whitespace().next().ok_or_else(unrecognised)?;
    let digits = HOUSE_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .ok_or_else(unrecognised)?
        .as_str();

    let house = digits
        .parse::<u8>()
        .ok()
        .filter(|h| HOUSE_RANGE.contains(h))
        .ok_or_else(|| ParseError::HouseOutOfRange {
            index,
            house: digits.to_string(),
        })?;

    Ok((planet.to_string(), house))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<RawResultLine> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_groups_planets_by_house_in_order() {
        let map = parse(&lines(&["Sun 5th House", "Moon 5th House", "Mars 10th House"])).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.planets_in(5).unwrap(), ["Sun", "Moon"]);
        assert_eq!(map.planets_in(10).unwrap(), ["Mars"]);
        assert_eq!(
            serde_json::to_value(&map).unwrap(),
            serde_json::json!({ "5": ["Sun", "Moon"], "10": ["Mars"] })
        );
    }

    #[test]
    fn test_empty_input_gives_empty_map() {
        let map = parse(&[]).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_is_deterministic() {
        let input = lines(&[
            "Jupiter 4th House",
            "Saturn 12th House",
            "Venus 4th House",
            "Rahu 6th House",
            "Ketu 12th House",
        ]);
        let first = parse(&input).unwrap();
        for _ in 0..5 {
            assert_eq!(parse(&input).unwrap(), first);
        }
        assert_eq!(first.houses().collect::<Vec<_>>(), vec![4, 6, 12]);
    }

    #[test]
    fn test_spacing_variants_match() {
        let map = parse(&lines(&["Mercury 7 th   House", "Moon 9thHouse"])).unwrap();
        assert_eq!(map.planets_in(7).unwrap(), ["Mercury"]);
        assert_eq!(map.planets_in(9).unwrap(), ["Moon"]);
    }

    #[test]
    fn test_line_without_house_fails() {
        let err = parse(&lines(&["Sun 5th House", "Moon in transit"])).unwrap_err();
        assert!(matches!(err, ParseError::UnrecognisedLine { index: 1, .. }));
    }

    #[test]
    fn test_ordinal_suffix_other_than_th_fails() {
        let err = parse(&lines(&["Sun 1st House"])).unwrap_err();
        assert!(matches!(err, ParseError::UnrecognisedLine { index: 0, .. }));
    }

    #[test]
    fn test_blank_line_fails() {
        assert!(parse(&lines(&[""])).is_err());
    }

    #[test]
    fn test_house_outside_chart_fails() {
        let err = parse(&lines(&["Sun 13th House"])).unwrap_err();
        assert!(matches!(err, ParseError::HouseOutOfRange { ref house, .. } if house == "13"));
    }
}
