//! Decimal degrees to the form's degree/minute/direction encoding.

use crate::types::{AstroCoordinate, Axis, Direction};

/// Minute scale used by the target form (not 60).
const MINUTE_SCALE: f64 = 59.0;

/// Convert a decimal degree value on `axis` into the form's encoding.
///
/// Degrees are `|floor(value)|`, minutes are `|round((|value| - degrees) * 59)|`.
/// For a negative non-integer value the floor over-counts the degrees by one,
/// so the raw minute figure is negative; the form only ever sees its magnitude.
/// A minute value that rounds to 59 is kept as-is; nothing carries into degrees.
pub fn to_astro_format(value: f64, axis: Axis) -> AstroCoordinate {
    let degrees = value.floor().abs();
    let minutes = round_half_up((value.abs() - degrees) * MINUTE_SCALE).abs();

    let direction = match (axis, value < 0.0) {
        (Axis::Latitude, true) => Direction::South,
        (Axis::Latitude, false) => Direction::North,
        (Axis::Longitude, true) => Direction::West,
        (Axis::Longitude, false) => Direction::East,
    };

    AstroCoordinate {
        degrees: degrees as u32,
        minutes: minutes.min(MINUTE_SCALE) as u32,
        direction,
    }
}

/// Round to nearest, ties toward positive infinity (`-44.5` becomes `-44`).
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_north_latitude() {
        let c = to_astro_format(28.7, Axis::Latitude);
        assert_eq!(c.degrees, 28);
        assert_eq!(c.minutes, 41);
        assert_eq!(c.direction, Direction::North);
        assert_eq!(c.label(), "28N41");
    }

    #[test]
    fn test_zero_is_north_east_with_no_minutes() {
        let lat = to_astro_format(0.0, Axis::Latitude);
        assert_eq!((lat.degrees, lat.minutes, lat.direction), (0, 0, Direction::North));

        let lon = to_astro_format(0.0, Axis::Longitude);
        assert_eq!((lon.degrees, lon.minutes, lon.direction), (0, 0, Direction::East));
    }

    #[test]
    fn test_west_longitude() {
        let c = to_astro_format(-74.0, Axis::Longitude);
        assert_eq!(c.direction, Direction::West);
        assert_eq!(c.label(), "74W0");

        let c = to_astro_format(151.25, Axis::Longitude);
        assert_eq!(c.direction, Direction::East);
        assert_eq!(c.label(), "151E15");
    }

    #[test]
    fn test_negative_uses_floor_not_truncation() {
        // floor(-33.25) = -34: degrees 34, raw minutes round(-0.75 * 59) = -44.
        let c = to_astro_format(-33.25, Axis::Latitude);
        assert_eq!(c.degrees, 34);
        assert_eq!(c.direction, Direction::South);
        assert_eq!(c.minutes, 44);
        assert_eq!(c.label(), "34S44");

        let c = to_astro_format(-74.006, Axis::Longitude);
        assert_eq!((c.degrees, c.minutes), (75, 59));
        assert_eq!(c.direction, Direction::West);
    }

    #[test]
    fn test_half_minutes_round_toward_positive() {
        assert_eq!(round_half_up(44.5), 45.0);
        assert_eq!(round_half_up(-44.5), -44.0);
        assert_eq!(round_half_up(-44.25), -44.0);
        assert_eq!(round_half_up(-44.75), -45.0);
    }

    #[test]
    fn test_fraction_near_one_stays_at_59() {
        let c = to_astro_format(12.999, Axis::Latitude);
        assert_eq!(c.degrees, 12);
        assert_eq!(c.minutes, 59);
    }

    #[test]
    fn test_minutes_in_range_and_direction_follows_sign() {
        let mut d = -90.0;
        while d <= 90.0 {
            let c = to_astro_format(d, Axis::Latitude);
            assert!(c.minutes <= 59, "minutes out of range for {d}");
            let expected = if d < 0.0 { Direction::South } else { Direction::North };
            assert_eq!(c.direction, expected, "direction for {d}");
            d += 0.37;
        }
    }
}
