use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// GPX schema version declared on the root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpxVersion {
    #[serde(rename = "1.0")]
    V1_0,
    #[serde(rename = "1.1")]
    V1_1,
}

impl GpxVersion {
    /// Interpret the root `version` attribute. Anything but `1.0`/`1.1` is unset.
    pub fn from_attribute(value: &str) -> Option<Self> {
        match value.trim() {
            "1.0" => Some(Self::V1_0),
            "1.1" => Some(Self::V1_1),
            _ => None,
        }
    }
}

/// Parsed GPX document in its canonical (1.1) shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gpx {
    pub version: Option<GpxVersion>,
    pub creator: Option<String>,
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Document-level information (`<metadata>`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub author: Option<Author>,
    pub copyright: Option<Copyright>,
    #[serde(default)]
    pub links: Vec<Link>,
    pub time: Option<DateTime<Utc>>,
    pub keywords: Option<String>,
    pub bounds: Option<Bounds>,
}

/// A person or organization (`<author>`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: Option<String>,
    pub email: Option<String>,
    pub link: Option<Link>,
}

/// Copyright holder and license (`<copyright>`).
///
/// `author` is the holder's name as plain text, unrelated to [`Metadata::author`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Copyright {
    pub author: Option<String>,
    pub year: Option<i32>,
    pub license: Option<String>,
}

/// A GPX link element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub href: Option<String>,
    pub text: Option<String>,
    pub link_type: Option<String>,
}

/// Bounding rectangle. Only ever built with all four coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

/// A single GPX point (used for wpt, rtept, trkpt).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    pub ele: Option<f64>,
    pub time: Option<DateTime<Utc>>,
    pub magnetic_variation: Option<f64>,
    pub geoid_height: Option<f64>,
    pub name: Option<String>,
    pub cmt: Option<String>,
    pub desc: Option<String>,
    pub src: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    pub sym: Option<String>,
    pub point_type: Option<String>,
    pub fix: Option<String>,
    pub sat: Option<u32>,
    pub hdop: Option<f64>,
    pub vdop: Option<f64>,
    pub pdop: Option<f64>,
    pub age_of_dgps_data: Option<f64>,
    pub dgps_id: Option<u32>,
}

impl Waypoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            ele: None,
            time: None,
            magnetic_variation: None,
            geoid_height: None,
            name: None,
            cmt: None,
            desc: None,
            src: None,
            links: Vec::new(),
            sym: None,
            point_type: None,
            fix: None,
            sat: None,
            hdop: None,
            vdop: None,
            pdop: None,
            age_of_dgps_data: None,
            dgps_id: None,
        }
    }
}

/// A GPX route (<rte>).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub name: Option<String>,
    pub cmt: Option<String>,
    pub desc: Option<String>,
    pub src: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    pub number: Option<u32>,
    pub route_type: Option<String>,
    #[serde(default)]
    pub points: Vec<Waypoint>,
}

/// A GPX track (<trk>).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub name: Option<String>,
    pub cmt: Option<String>,
    pub desc: Option<String>,
    pub src: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    pub number: Option<u32>,
    pub track_type: Option<String>,
    #[serde(default)]
    pub segments: Vec<TrackSegment>,
}

/// A GPX track segment (<trkseg>).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSegment {
    #[serde(default)]
    pub points: Vec<Waypoint>,
}
