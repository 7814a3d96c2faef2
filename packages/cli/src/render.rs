//! Plain-text rendering of a refreshed trip.

use std::fmt::Write as _;

use trip_map_itinerary::TripView;
use trip_map_itinerary_models::{DateFormat, ResolvedStop, TransportMode};

const CURRENT_MARKER: &str = "▶";

fn mode_label(mode: Option<&TransportMode>) -> String {
    match mode {
        None => String::new(),
        Some(TransportMode::Plane) => "plane".to_string(),
        Some(TransportMode::Train) => "train".to_string(),
        Some(TransportMode::Bus) => "bus".to_string(),
        Some(TransportMode::Car) => "car".to_string(),
        Some(TransportMode::Boat) => "boat".to_string(),
        Some(TransportMode::Bike) => "bike".to_string(),
        Some(TransportMode::Walk) => "walk".to_string(),
        Some(TransportMode::Other(raw)) => raw.clone(),
    }
}

fn stop_line(stop: &ResolvedStop) -> String {
    let marker = if stop.is_current { CURRENT_MARKER } else { " " };
    let date = match stop.date_format {
        DateFormat::Fallback => format!("{}?", stop.when.format("%Y-%m-%d")),
        DateFormat::Iso | DateFormat::DayFirst => stop.when.format("%Y-%m-%d").to_string(),
    };
    let mode = mode_label(stop.mode.as_ref());

    let mut line = format!("{marker} {date:<11} {:<28} {}", stop.place, stop.title);
    if !mode.is_empty() {
        let _ = write!(line, " [{mode}]");
    }
    line.trim_end().to_string()
}

/// One-line KPI summary.
#[must_use]
pub fn summary(view: &TripView) -> String {
    let k = &view.kpis;
    format!(
        "{} stops | {:.0} km | {} countries | {} days",
        view.itinerary.len(),
        k.total_distance_km,
        k.country_count,
        k.days_elapsed
    )
}

/// Timeline of every stop followed by the KPI summary.
#[must_use]
pub fn timeline(view: &TripView) -> String {
    let mut out = String::new();

    if view.itinerary.is_empty() {
        out.push_str("No stops to show.\n");
    }
    for stop in &view.itinerary {
        out.push_str(&stop_line(stop));
        out.push('\n');
        if !stop.description.is_empty() {
            let _ = writeln!(out, "              {}", stop.description);
        }
    }

    out.push('\n');
    out.push_str(&summary(view));
    out.push('\n');

    if let Some(current) = view.itinerary.current() {
        let _ = writeln!(
            out,
            "Currently in {} ({:.4}, {:.4})",
            current.place, current.coordinates.latitude, current.coordinates.longitude
        );
    }
    out
}
