use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ─── Request defaults ─────────────────────────────────────────

/// Name entered on the form when the caller does not supply one.
pub const DEFAULT_NAME: &str = "API User";

/// Place label entered on the form when the caller does not supply one.
pub const DEFAULT_PLACE: &str = "API Location";

/// Seconds of the birth time; the HTTP interface never carries them.
pub const DEFAULT_SECONDS: u8 = 0;

// ─── Birth details ────────────────────────────────────────────

/// Sex options offered by the target form's `sex` select.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[default]
    Male,
    Female,
    Other,
}

impl Sex {
    /// Visible option text on the form.
    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
            Sex::Other => "Other",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Input record for one transit lookup. Owned by a single workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthDetails {
    pub name: String,
    pub day: u8,
    pub month: u8,
    pub year: u16,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub sex: Sex,
    pub place: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl BirthDetails {
    /// Birth details with the fixed name, place, sex and seconds used by the API.
    pub fn with_defaults(
        day: u8,
        month: u8,
        year: u16,
        hours: u8,
        minutes: u8,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            day,
            month,
            year,
            hours,
            minutes,
            seconds: DEFAULT_SECONDS,
            sex: Sex::default(),
            place: DEFAULT_PLACE.to_string(),
            latitude,
            longitude,
        }
    }
}

// ─── Coordinates ──────────────────────────────────────────────

/// Which geographic axis a decimal degree value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

/// Compass direction of a converted coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn letter(self) -> char {
        match self {
            Direction::North => 'N',
            Direction::South => 'S',
            Direction::East => 'E',
            Direction::West => 'W',
        }
    }
}

/// Degree/minute/direction tuple in the form's own encoding.
///
/// Minutes are on a 0..=59 scale derived by multiplying the fractional degree
/// by 59, matching the form's minute granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AstroCoordinate {
    pub degrees: u32,
    pub minutes: u32,
    pub direction: Direction,
}

impl AstroCoordinate {
    /// Compact rendering such as `28N41`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AstroCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.degrees, self.direction.letter(), self.minutes)
    }
}

// ─── Results ──────────────────────────────────────────────────

/// One trimmed result heading, e.g. `"Sun 5th House"`.
pub type RawResultLine = String;

/// House number (1..=12) to the planets placed in it, in order of appearance.
///
/// Serializes as a JSON object keyed by the house number, ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HousePlanetMap(BTreeMap<u8, Vec<String>>);

impl HousePlanetMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, house: u8, planet: impl Into<String>) {
        self.0.entry(house).or_default().push(planet.into());
    }

    /// Planets in the given house, if any were reported.
    pub fn planets_in(&self, house: u8) -> Option<&[String]> {
        self.0.get(&house).map(Vec::as_slice)
    }

    /// House numbers that hold at least one planet, ascending.
    pub fn houses(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &[String])> {
        self.0.iter().map(|(house, planets)| (*house, planets.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything one successful lookup produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOutcome {
    pub input: BirthDetails,
    pub house_planets: HousePlanetMap,
    pub raw_planet_info: Vec<RawResultLine>,
}
