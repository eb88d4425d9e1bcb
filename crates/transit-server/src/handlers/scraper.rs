//! GET /scraper — run one transit lookup.
//!
//! Query: `day`, `month`, `year`, `hour`, `min`, `lat`, `lon`, all required.
//! Name, place, sex and seconds are fixed (see `BirthDetails::with_defaults`).

use std::fmt::Display;
use std::ops::RangeInclusive;
use std::str::FromStr;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use transit_core::{BirthDetails, ScrapeOutcome};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ScraperQuery {
    pub day: Option<String>,
    pub month: Option<String>,
    pub year: Option<String>,
    pub hour: Option<String>,
    pub min: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
}

impl ScraperQuery {
    /// Presence check on all seven parameters, then numeric validation.
    pub fn into_birth_details(self) -> Result<BirthDetails, AppError> {
        let (Some(day), Some(month), Some(year), Some(hour), Some(min), Some(lat), Some(lon)) = (
            present(self.day),
            present(self.month),
            present(self.year),
            present(self.hour),
            present(self.min),
            present(self.lat),
            present(self.lon),
        ) else {
            return Err(AppError::MissingParameters);
        };

        Ok(BirthDetails::with_defaults(
            parse_in_range("day", &day, 1..=31)?,
            parse_in_range("month", &month, 1..=12)?,
            parse_in_range("year", &year, 1..=9999)?,
            parse_in_range("hour", &hour, 0..=23)?,
            parse_in_range("min", &min, 0..=59)?,
            parse_in_range("lat", &lat, -90.0..=90.0)?,
            parse_in_range("lon", &lon, -180.0..=180.0)?,
        ))
    }
}

/// Empty values count as missing.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_in_range<T>(name: &'static str, raw: &str, range: RangeInclusive<T>) -> Result<T, AppError>
where
    T: FromStr + PartialOrd + Display,
{
    let value = raw.parse::<T>().map_err(|_| AppError::InvalidParameter {
        name,
        reason: format!("{raw:?} is not a number"),
    })?;
    if !range.contains(&value) {
        return Err(AppError::InvalidParameter {
            name,
            reason: format!("{value} is outside {}..={}", range.start(), range.end()),
        });
    }
    Ok(value)
}

pub async fn scrape(
    State(state): State<AppState>,
    Query(query): Query<ScraperQuery>,
) -> Result<Json<ScrapeOutcome>, AppError> {
    let details = query.into_birth_details()?;
    let outcome = state.scraper.scrape(details).await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_query() -> ScraperQuery {
        ScraperQuery {
            day: Some("5".into()),
            month: Some("11".into()),
            year: Some("1990".into()),
            hour: Some("14".into()),
            min: Some("30".into()),
            lat: Some("28.7".into()),
            lon: Some("77.2".into()),
        }
    }

    #[test]
    fn test_builds_details_with_defaults() {
        let details = full_query().into_birth_details().unwrap();
        assert_eq!((details.day, details.month, details.year), (5, 11, 1990));
        assert_eq!((details.hours, details.minutes, details.seconds), (14, 30, 0));
        assert_eq!(details.latitude, 28.7);
        assert_eq!(details.name, "API User");
    }

    #[test]
    fn test_each_missing_parameter_is_rejected() {
        let clears: [fn(&mut ScraperQuery); 7] = [
            |q| q.day = None,
            |q| q.month = None,
            |q| q.year = None,
            |q| q.hour = None,
            |q| q.min = None,
            |q| q.lat = None,
            |q| q.lon = None,
        ];
        for clear in clears {
            let mut query = full_query();
            clear(&mut query);
            assert!(matches!(
                query.into_birth_details(),
                Err(AppError::MissingParameters)
            ));
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let query = ScraperQuery {
            lon: Some(String::new()),
            ..full_query()
        };
        assert!(matches!(
            query.into_birth_details(),
            Err(AppError::MissingParameters)
        ));
    }

    #[test]
    fn test_zero_hour_is_present() {
        let query = ScraperQuery {
            hour: Some("0".into()),
            ..full_query()
        };
        assert_eq!(query.into_birth_details().unwrap().hours, 0);
    }

    #[test]
    fn test_out_of_range_and_garbage_rejected() {
        let query = ScraperQuery {
            lat: Some("91".into()),
            ..full_query()
        };
        assert!(matches!(
            query.into_birth_details(),
            Err(AppError::InvalidParameter { name: "lat", .. })
        ));

        let query = ScraperQuery {
            month: Some("Nov".into()),
            ..full_query()
        };
        assert!(matches!(
            query.into_birth_details(),
            Err(AppError::InvalidParameter { name: "month", .. })
        ));
    }
}
