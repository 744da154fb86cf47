//! Version-independent core of the parser.
//!
//! The machine sees 1.1-shaped events only (see [`crate::legacy`] for the 1.0
//! rewrite). Containers push a typed [`Frame`] holding the value under
//! construction; leaves buffer their text and hand it to the enclosing frame
//! when they end. A closed frame is moved into its parent and never touched
//! again.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::element::{ContainerKind, ElementKind, Field, Leaf, accepts_child, leaf_target};
use crate::gpx_types::*;
use crate::parser::Attributes;
use crate::timestamp::parse_timestamp;

/// A container that is still open, with the value being built for it.
#[derive(Debug)]
enum Frame {
    Root(Gpx),
    Metadata(Metadata),
    /// `point` is `None` when the coordinates were missing or invalid; the
    /// children of such a point are consumed and discarded.
    Point {
        kind: ContainerKind,
        point: Option<Waypoint>,
    },
    Link(Link),
    Route(Route),
    Track(Track),
    Segment(TrackSegment),
    Author(Author),
    Copyright(Copyright),
    Bounds(Option<Bounds>),
}

#[derive(Debug)]
struct OpenLeaf {
    field: Field,
    text: String,
}

/// Event-driven builder for one document. Create a new one per document.
#[derive(Debug, Default)]
pub struct StateMachine {
    stack: Vec<Frame>,
    leaf: Option<OpenLeaf>,
    /// Depth inside an ignored subtree, 0 when not skipping.
    skip_depth: usize,
    finished: Option<Gpx>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, kind: ElementKind, attributes: &Attributes) {
        if self.skip_depth > 0 {
            self.skip_depth += 1;
            return;
        }

        match kind {
            ElementKind::Container(container) => self.open_container(container, attributes),
            ElementKind::Leaf(leaf) => self.open_leaf(leaf, attributes),
            ElementKind::Unknown => self.skip_depth = 1,
        }
    }

    pub fn text(&mut self, text: &str) {
        if self.skip_depth > 0 {
            return;
        }
        if let Some(leaf) = self.leaf.as_mut() {
            leaf.text.push_str(text);
        }
    }

    pub fn end(&mut self, kind: ElementKind) {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return;
        }

        match kind {
            ElementKind::Leaf(_) => {
                if let Some(leaf) = self.leaf.take() {
                    if let Some(frame) = self.stack.last_mut() {
                        frame.assign(leaf.field, leaf.text);
                    }
                }
            }
            ElementKind::Container(_) => self.close_container(),
            ElementKind::Unknown => {}
        }
    }

    /// Return the document built so far. Frames left open by a truncated
    /// event stream are folded into their parents first.
    pub fn finish(mut self) -> Gpx {
        while self.stack.len() > 1 {
            self.close_container();
        }
        match self.stack.pop() {
            Some(Frame::Root(gpx)) => gpx,
            _ => self.finished.unwrap_or_default(),
        }
    }

    fn open_container(&mut self, kind: ContainerKind, attributes: &Attributes) {
        let accepted = match self.stack.last() {
            None => kind == ContainerKind::Gpx && self.finished.is_none(),
            Some(parent) => self.leaf.is_none() && accepts_child(parent.kind(), kind),
        };
        if !accepted {
            debug!(?kind, "skipping misplaced element");
            self.skip_depth = 1;
            return;
        }
        self.stack.push(Frame::open(kind, attributes));
    }

    fn open_leaf(&mut self, leaf: Leaf, attributes: &Attributes) {
        let target = match self.stack.last() {
            Some(parent) if self.leaf.is_none() => leaf_target(parent.kind(), leaf),
            _ => None,
        };
        let Some(field) = target else {
            self.skip_depth = 1;
            return;
        };

        let text = if leaf == Leaf::Email {
            email_from_attributes(attributes).unwrap_or_default()
        } else {
            String::new()
        };
        self.leaf = Some(OpenLeaf { field, text });
    }

    fn close_container(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match self.stack.last_mut() {
            Some(parent) => parent.adopt(frame),
            None => {
                if let Frame::Root(gpx) = frame {
                    self.finished = Some(gpx);
                }
            }
        }
    }
}

impl Frame {
    fn open(kind: ContainerKind, attributes: &Attributes) -> Self {
        use ContainerKind as C;

        match kind {
            C::Gpx => Frame::Root(Gpx {
                version: attributes
                    .get("version")
                    .and_then(|v| GpxVersion::from_attribute(v)),
                creator: attributes.get("creator").cloned(),
                ..Default::default()
            }),
            C::Metadata => Frame::Metadata(Metadata::default()),
            C::Waypoint | C::RoutePoint | C::TrackPoint => Frame::Point {
                kind,
                point: parse_lat_lon(attributes).map(|(lat, lon)| Waypoint::new(lat, lon)),
            },
            C::Link => Frame::Link(Link {
                href: attributes.get("href").cloned(),
                ..Default::default()
            }),
            C::Route => Frame::Route(Route::default()),
            C::Track => Frame::Track(Track::default()),
            C::TrackSegment => Frame::Segment(TrackSegment::default()),
            C::Author => Frame::Author(Author::default()),
            C::Copyright => Frame::Copyright(Copyright {
                author: attributes.get("author").cloned(),
                ..Default::default()
            }),
            C::Bounds => Frame::Bounds(parse_bounds(attributes)),
        }
    }

    fn kind(&self) -> ContainerKind {
        match self {
            Frame::Root(_) => ContainerKind::Gpx,
            Frame::Metadata(_) => ContainerKind::Metadata,
            Frame::Point { kind, .. } => *kind,
            Frame::Link(_) => ContainerKind::Link,
            Frame::Route(_) => ContainerKind::Route,
            Frame::Track(_) => ContainerKind::Track,
            Frame::Segment(_) => ContainerKind::TrackSegment,
            Frame::Author(_) => ContainerKind::Author,
            Frame::Copyright(_) => ContainerKind::Copyright,
            Frame::Bounds(_) => ContainerKind::Bounds,
        }
    }

    /// Store a finished leaf value. `field` always comes from [`leaf_target`]
    /// for this frame's kind.
    fn assign(&mut self, field: Field, text: String) {
        match self {
            Frame::Metadata(metadata) => match field {
                Field::Name => metadata.name = Some(text),
                Field::Description => metadata.desc = Some(text),
                Field::Time => metadata.time = time_value(&text),
                Field::Keywords => metadata.keywords = Some(text),
                _ => {}
            },
            Frame::Point {
                point: Some(point), ..
            } => match field {
                Field::Elevation => point.ele = decimal(&text),
                Field::Time => point.time = time_value(&text),
                Field::MagneticVariation => point.magnetic_variation = decimal(&text),
                Field::GeoidHeight => point.geoid_height = decimal(&text),
                Field::Name => point.name = Some(text),
                Field::Comment => point.cmt = Some(text),
                Field::Description => point.desc = Some(text),
                Field::Source => point.src = Some(text),
                Field::Symbol => point.sym = Some(text),
                Field::Type => point.point_type = Some(text),
                Field::Fix => point.fix = Some(text),
                Field::Satellites => point.sat = number(&text),
                Field::Hdop => point.hdop = decimal(&text),
                Field::Vdop => point.vdop = decimal(&text),
                Field::Pdop => point.pdop = decimal(&text),
                Field::AgeOfDgpsData => point.age_of_dgps_data = decimal(&text),
                Field::DgpsId => point.dgps_id = number(&text),
                _ => {}
            },
            Frame::Route(route) => match field {
                Field::Name => route.name = Some(text),
                Field::Comment => route.cmt = Some(text),
                Field::Description => route.desc = Some(text),
                Field::Source => route.src = Some(text),
                Field::Number => route.number = number(&text),
                Field::Type => route.route_type = Some(text),
                _ => {}
            },
            Frame::Track(track) => match field {
                Field::Name => track.name = Some(text),
                Field::Comment => track.cmt = Some(text),
                Field::Description => track.desc = Some(text),
                Field::Source => track.src = Some(text),
                Field::Number => track.number = number(&text),
                Field::Type => track.track_type = Some(text),
                _ => {}
            },
            Frame::Link(link) => match field {
                Field::Href => link.href = Some(text.trim().to_string()),
                Field::Text => link.text = Some(text),
                Field::Type => link.link_type = Some(text),
                _ => {}
            },
            Frame::Author(author) => match field {
                Field::Name => author.name = Some(text),
                Field::Email => author.email = Some(text),
                _ => {}
            },
            Frame::Copyright(copyright) => match field {
                Field::Year => copyright.year = number(&text),
                Field::License => copyright.license = Some(text),
                _ => {}
            },
            _ => {}
        }
    }

    /// Move a closed child into this frame. Lists append, single values
    /// overwrite, so a repeated singular element keeps its last occurrence.
    fn adopt(&mut self, child: Frame) {
        match (self, child) {
            (Frame::Root(gpx), Frame::Metadata(metadata)) => gpx.metadata = Some(metadata),
            (Frame::Root(gpx), Frame::Point { point: Some(p), .. }) => gpx.waypoints.push(p),
            (Frame::Root(gpx), Frame::Route(route)) => gpx.routes.push(route),
            (Frame::Root(gpx), Frame::Track(track)) => gpx.tracks.push(track),
            (Frame::Metadata(metadata), Frame::Author(author)) => metadata.author = Some(author),
            (Frame::Metadata(metadata), Frame::Copyright(copyright)) => {
                metadata.copyright = Some(copyright)
            }
            (Frame::Metadata(metadata), Frame::Link(link)) => metadata.links.push(link),
            (Frame::Metadata(metadata), Frame::Bounds(Some(bounds))) => {
                metadata.bounds = Some(bounds)
            }
            (Frame::Author(author), Frame::Link(link)) => author.link = Some(link),
            (Frame::Point { point: Some(p), .. }, Frame::Link(link)) => p.links.push(link),
            (Frame::Route(route), Frame::Link(link)) => route.links.push(link),
            (Frame::Route(route), Frame::Point { point: Some(p), .. }) => route.points.push(p),
            (Frame::Track(track), Frame::Link(link)) => track.links.push(link),
            (Frame::Track(track), Frame::Segment(segment)) => track.segments.push(segment),
            (Frame::Segment(segment), Frame::Point { point: Some(p), .. }) => {
                segment.points.push(p)
            }
            _ => {}
        }
    }
}

fn number<T: FromStr>(text: &str) -> Option<T> {
    text.trim().parse().ok()
}

/// `f64::from_str` also takes `NaN` and `inf`, which are not decimals.
fn decimal(text: &str) -> Option<f64> {
    number(text).filter(|value: &f64| value.is_finite())
}

fn attribute_number(attributes: &Attributes, key: &str) -> Option<f64> {
    attributes.get(key).and_then(|value| decimal(value))
}

fn time_value(text: &str) -> Option<DateTime<Utc>> {
    let time = parse_timestamp(text);
    if time.is_none() {
        debug!(text, "ignoring unparsable timestamp");
    }
    time
}

/// Parse lat/lon attributes from a point element's start tag.
fn parse_lat_lon(attributes: &Attributes) -> Option<(f64, f64)> {
    let coords = attribute_number(attributes, "lat").zip(attribute_number(attributes, "lon"));
    if coords.is_none() {
        debug!(
            lat = attributes.get("lat").map(String::as_str),
            lon = attributes.get("lon").map(String::as_str),
            "dropping point with missing or invalid coordinates"
        );
    }
    coords
}

fn parse_bounds(attributes: &Attributes) -> Option<Bounds> {
    let bounds = (|| {
        Some(Bounds {
            min_lat: attribute_number(attributes, "minlat")?,
            min_lon: attribute_number(attributes, "minlon")?,
            max_lat: attribute_number(attributes, "maxlat")?,
            max_lon: attribute_number(attributes, "maxlon")?,
        })
    })();
    if bounds.is_none() {
        debug!("ignoring incomplete bounds");
    }
    bounds
}

/// GPX 1.1 splits an address into `id` and `domain` attributes.
fn email_from_attributes(attributes: &Attributes) -> Option<String> {
    let id = attributes.get("id")?;
    let domain = attributes.get("domain")?;
    Some(format!("{id}@{domain}"))
}
