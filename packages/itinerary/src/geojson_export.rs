//! GeoJSON rendering of a normalized itinerary.
//!
//! Produces one `Point` feature per stop and, when there are at least two
//! stops, a `LineString` feature tracing the path in itinerary order.
//! Positions are `[longitude, latitude]` as GeoJSON requires.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use trip_map_itinerary_models::{Coordinates, NormalizedItinerary, ResolvedStop};

fn position(coordinates: Coordinates) -> Vec<f64> {
    vec![coordinates.longitude, coordinates.latitude]
}

fn feature(geometry: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geometry)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn stop_feature(stop: &ResolvedStop) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("place".to_string(), JsonValue::from(stop.place.as_str()));
    properties.insert("title".to_string(), JsonValue::from(stop.title.as_str()));
    properties.insert("date".to_string(), JsonValue::from(stop.date.as_str()));
    properties.insert(
        "description".to_string(),
        JsonValue::from(stop.description.as_str()),
    );
    properties.insert(
        "transport".to_string(),
        stop.transport
            .as_deref()
            .map_or(JsonValue::Null, JsonValue::from),
    );
    properties.insert("isCurrent".to_string(), JsonValue::Bool(stop.is_current));

    feature(Value::Point(position(stop.coordinates)), properties)
}

/// Builds the feature collection for `itinerary`.
#[must_use]
pub fn to_feature_collection(itinerary: &NormalizedItinerary) -> FeatureCollection {
    let mut features: Vec<Feature> = itinerary.iter().map(stop_feature).collect();

    if itinerary.len() >= 2 {
        let line = itinerary.path().into_iter().map(position).collect();
        let mut properties = JsonObject::new();
        properties.insert("kind".to_string(), JsonValue::from("path"));
        features.push(feature(Value::LineString(line), properties));
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Serializes the feature collection as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if serialization fails.
pub fn to_geojson_string(itinerary: &NormalizedItinerary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&to_feature_collection(itinerary))
}
