//! Trip-level statistics over a normalized itinerary.

use std::collections::BTreeSet;

use trip_map_itinerary_models::{Coordinates, NormalizedItinerary, TripKpis};

/// Mean Earth radius used for great-circle distances, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const SECONDS_PER_DAY: i64 = 86_400;

/// Great-circle distance between two points using the haversine formula.
#[must_use]
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = (to.latitude - from.latitude).to_radians();
    let dlng = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Sum of leg distances along the itinerary path.
#[must_use]
pub fn total_distance_km(itinerary: &NormalizedItinerary) -> f64 {
    itinerary
        .stops
        .windows(2)
        .map(|leg| haversine_km(leg[0].coordinates, leg[1].coordinates))
        .sum()
}

/// Number of distinct country identifiers across all stops.
#[must_use]
pub fn country_count(itinerary: &NormalizedItinerary) -> usize {
    itinerary
        .iter()
        .map(|s| s.country())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Days between the first and last stop, rounded up to a whole day.
#[must_use]
pub fn days_elapsed(itinerary: &NormalizedItinerary) -> i64 {
    let (Some(first), Some(last)) = (itinerary.stops.first(), itinerary.stops.last()) else {
        return 0;
    };

    let seconds = (last.when - first.when).num_seconds().max(0);
    (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
}

/// Computes all trip KPIs.
///
/// An itinerary with fewer than two stops yields all-zero KPIs, country
/// count included.
#[must_use]
pub fn aggregate(itinerary: &NormalizedItinerary) -> TripKpis {
    if itinerary.len() < 2 {
        return TripKpis::default();
    }

    TripKpis {
        total_distance_km: total_distance_km(itinerary),
        country_count: country_count(itinerary),
        days_elapsed: days_elapsed(itinerary),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use trip_map_itinerary_models::ItineraryRow;

    use super::*;
    use crate::normalize::{build_stop, finalize};

    const PARIS: Coordinates = Coordinates::new(48.8566, 2.3522);
    const VIENNA: Coordinates = Coordinates::new(48.2082, 16.3738);
    const PRAGUE: Coordinates = Coordinates::new(50.0755, 14.4378);

    fn itinerary(stops: &[(&str, &str, Coordinates)]) -> NormalizedItinerary {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        finalize(
            stops
                .iter()
                .map(|(place, date, coordinates)| {
                    let row = ItineraryRow {
                        place: (*place).to_string(),
                        date: (*date).to_string(),
                        ..ItineraryRow::default()
                    };
                    build_stop(row, *coordinates, today)
                })
                .collect(),
        )
    }

    #[test]
    fn haversine_paris_vienna() {
        let d = haversine_km(PARIS, VIENNA);
        assert!((d - 1033.5).abs() < 1.0, "got {d}");
    }

    #[test]
    fn haversine_is_symmetric_and_zero_on_same_point() {
        assert!((haversine_km(PARIS, VIENNA) - haversine_km(VIENNA, PARIS)).abs() < 1e-9);
        assert!(haversine_km(PRAGUE, PRAGUE).abs() < 1e-9);
    }

    #[test]
    fn two_stop_trip() {
        let trip = itinerary(&[
            ("Paris, France", "2024-01-01", PARIS),
            ("Vienna, Austria", "2024-01-05", VIENNA),
        ]);

        let kpis = aggregate(&trip);
        assert_eq!(kpis.days_elapsed, 4);
        assert_eq!(kpis.country_count, 2);
        assert!((kpis.total_distance_km - 1033.5).abs() < 1.0);
    }

    #[test]
    fn distance_sums_each_leg() {
        let trip = itinerary(&[
            ("Paris, France", "2024-01-01", PARIS),
            ("Vienna, Austria", "2024-01-05", VIENNA),
            ("Prague, Czechia", "2024-01-07", PRAGUE),
        ]);

        let expected = haversine_km(PARIS, VIENNA) + haversine_km(VIENNA, PRAGUE);
        assert!((total_distance_km(&trip) - expected).abs() < 1e-9);
        assert!((total_distance_km(&trip) - 1284.4).abs() < 2.0);
    }

    #[test]
    fn empty_and_single_stop_are_zero() {
        assert_eq!(aggregate(&NormalizedItinerary::default()), TripKpis::default());

        let single = aggregate(&itinerary(&[("Paris, France", "2024-01-01", PARIS)]));
        assert_eq!(single, TripKpis::default());
    }

    #[test]
    fn same_day_trip_has_zero_days() {
        let trip = itinerary(&[
            ("Paris, France", "2024-01-01", PARIS),
            ("Versailles, France", "2024-01-01", PARIS),
        ]);
        let kpis = aggregate(&trip);
        assert_eq!(kpis.days_elapsed, 0);
        assert_eq!(kpis.country_count, 1);
    }

    #[test]
    fn partial_days_round_up() {
        let trip = itinerary(&[
            ("A, X", "2024-01-01 08:00", PARIS),
            ("B, X", "2024-01-02 09:00", VIENNA),
        ]);
        assert_eq!(days_elapsed(&trip), 2);
    }

    #[test]
    fn countries_come_from_the_last_comma_segment() {
        let trip = itinerary(&[
            ("Lyon, France", "2024-01-01", PARIS),
            ("Paris,France ", "2024-01-02", PARIS),
            ("Vienna, Austria", "2024-01-03", VIENNA),
            ("Salzburg", "2024-01-04", VIENNA),
        ]);
        assert_eq!(country_count(&trip), 3);
    }
}
