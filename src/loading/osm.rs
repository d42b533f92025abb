//! Raw OSM entity views and tag parsing. Decoding files is the ingestion
//! collaborator's job; this module only interprets the tags it hands over.
//! Malformed tag values are recovered with logged defaults, never by failing
//! the batch.

use log::warn;
use serde::Deserialize;

use crate::model::graph::HighwayType;
use crate::units;

/// A node as delivered by the ingestion collaborator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawOsmNode {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
}

/// A way as delivered by the ingestion collaborator; one `build_edge` call
/// per consecutive node pair.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RawOsmWay {
    pub id: i64,
    pub highway: Option<String>,
    pub max_speed: Option<String>,
    pub one_way: Option<String>,
}

/// Which directions a way is drivable in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WayDirection {
    Both,
    Forward,
    Backward,
}

/// Interprets a `maxspeed` tag in km/h. Plain numbers and `mph` values are
/// understood; anything else falls back to the highway type's average speed.
pub fn parse_max_speed(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    let (number, mph) = match raw.strip_suffix("mph") {
        Some(number) => (number.trim_end(), true),
        None => (raw, false),
    };
    match number.parse::<u32>() {
        Ok(speed) if mph => Some(units::mph_to_kmh(f64::from(speed)).round() as u32),
        Ok(speed) => Some(speed),
        Err(_) => {
            warn!("unparseable maxspeed {raw:?}, falling back to the highway average");
            None
        }
    }
}

/// Interprets a `oneway` tag. Unknown values count as bidirectional.
pub fn parse_way_direction(raw: Option<&str>) -> WayDirection {
    match raw.map(str::trim) {
        None => WayDirection::Both,
        Some("yes" | "true" | "1") => WayDirection::Forward,
        Some("-1" | "reverse") => WayDirection::Backward,
        Some("no" | "false" | "0") => WayDirection::Both,
        Some(other) => {
            warn!("unknown oneway value {other:?}, treating the way as bidirectional");
            WayDirection::Both
        }
    }
}

/// Looks up a `highway` tag, logging unknown road categories.
pub fn parse_highway(raw: Option<&str>) -> Option<HighwayType> {
    let name = raw?;
    let highway = HighwayType::from_name(name);
    if highway.is_none() {
        warn!("unknown highway type {name:?}, using the default speed");
    }
    highway
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_speed_parses_numbers_and_mph() {
        assert_eq!(parse_max_speed("50"), Some(50));
        assert_eq!(parse_max_speed(" 30 "), Some(30));
        // 20 mph is about 32 km/h
        assert_eq!(parse_max_speed("20 mph"), Some(32));
        assert_eq!(parse_max_speed("walk"), None);
        assert_eq!(parse_max_speed("50;30"), None);
    }

    #[test]
    fn way_direction_defaults_to_bidirectional() {
        assert_eq!(parse_way_direction(None), WayDirection::Both);
        assert_eq!(parse_way_direction(Some("yes")), WayDirection::Forward);
        assert_eq!(parse_way_direction(Some("-1")), WayDirection::Backward);
        assert_eq!(parse_way_direction(Some("alternating")), WayDirection::Both);
    }

    #[test]
    fn highway_lookup() {
        assert_eq!(parse_highway(Some("motorway")), Some(HighwayType::Motorway));
        assert_eq!(parse_highway(Some("bridleway")), None);
        assert_eq!(parse_highway(None), None);
    }
}
