//! Shared parsing utilities for itinerary cells.
//!
//! The spreadsheet has been edited by hand over time, so date cells come in
//! two shapes: ISO (`2024-01-05`) and day-first (`05/01/2024`). Anything
//! else falls back to the run date and is flagged as such.

use chrono::{NaiveDate, NaiveDateTime};
use trip_map_itinerary_models::{Coordinates, DateFormat};

/// A date cell interpreted into a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub when: NaiveDateTime,
    pub format: DateFormat,
}

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parses a raw date cell.
///
/// A value containing exactly two `/` separators is read as `DD/MM/YYYY`;
/// anything else is read as ISO `YYYY-MM-DD`, with an optional time part.
/// Values matching neither become `today` at midnight with
/// [`DateFormat::Fallback`] and a logged warning.
#[must_use]
pub fn parse_stop_date(raw: &str, today: NaiveDate) -> ParsedDate {
    let value = raw.trim();

    let parsed = if value.matches('/').count() == 2 {
        NaiveDate::parse_from_str(value, "%d/%m/%Y")
            .ok()
            .map(|d| (midnight(d), DateFormat::DayFirst))
    } else {
        parse_iso(value).map(|dt| (dt, DateFormat::Iso))
    };

    if let Some((when, format)) = parsed {
        ParsedDate { when, format }
    } else {
        log::warn!("Unrecognized date '{value}', using {today} instead");
        ParsedDate {
            when: midnight(today),
            format: DateFormat::Fallback,
        }
    }
}

fn parse_iso(value: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(midnight(date));
    }
    ISO_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).unwrap_or_default()
}

/// Parses pre-resolved lat/lng cells. Returns `None` if either is missing,
/// unparseable, non-finite, out of range, or both are zero.
#[must_use]
pub fn parse_lat_lng(lat: &str, lng: &str) -> Option<Coordinates> {
    let latitude = lat.trim().parse::<f64>().ok()?;
    let longitude = lng.trim().parse::<f64>().ok()?;
    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    if latitude.abs() > 90.0 || longitude.abs() > 180.0 {
        return None;
    }
    // Unknown places used to be exported as 0,0.
    if latitude == 0.0 && longitude == 0.0 {
        return None;
    }
    Some(Coordinates::new(latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn parses_iso_date() {
        let parsed = parse_stop_date("2024-01-10", today());
        assert_eq!(parsed.format, DateFormat::Iso);
        assert_eq!(parsed.when.to_string(), "2024-01-10 00:00:00");
    }

    #[test]
    fn parses_iso_datetime() {
        let parsed = parse_stop_date("2024-01-10T14:30", today());
        assert_eq!(parsed.format, DateFormat::Iso);
        assert_eq!(parsed.when.to_string(), "2024-01-10 14:30:00");
    }

    #[test]
    fn parses_day_first_date() {
        let parsed = parse_stop_date(" 05/01/2024 ", today());
        assert_eq!(parsed.format, DateFormat::DayFirst);
        assert_eq!(parsed.when.date(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn day_first_sorts_before_later_iso() {
        let day_first = parse_stop_date("05/01/2024", today());
        let iso = parse_stop_date("2024-01-10", today());
        assert!(day_first.when < iso.when);
    }

    #[test]
    fn falls_back_to_today_for_garbage() {
        let parsed = parse_stop_date("next tuesday", today());
        assert_eq!(parsed.format, DateFormat::Fallback);
        assert_eq!(parsed.when.date(), today());
    }

    #[test]
    fn invalid_day_first_falls_back() {
        let parsed = parse_stop_date("31/02/2024", today());
        assert_eq!(parsed.format, DateFormat::Fallback);
    }

    #[test]
    fn parses_lat_lng_strings() {
        let coords = parse_lat_lng("48.8566", " 2.3522").unwrap();
        assert!((coords.latitude - 48.8566).abs() < f64::EPSILON);
        assert!((coords.longitude - 2.3522).abs() < f64::EPSILON);
    }

    #[test]
    fn keeps_zero_longitude() {
        assert!(parse_lat_lng("51.4779", "0").is_some());
    }

    #[test]
    fn rejects_null_island_and_garbage() {
        assert!(parse_lat_lng("0", "0").is_none());
        assert!(parse_lat_lng("", "2.35").is_none());
        assert!(parse_lat_lng("95", "2.35").is_none());
        assert!(parse_lat_lng("NaN", "2.35").is_none());
    }
}
