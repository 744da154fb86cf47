//! Closed set of GPX element kinds and the tables that give them meaning.
//!
//! Leaf names such as `name` or `desc` are shared by several parents, so the
//! field a leaf fills is looked up by `(parent, leaf)` in [`leaf_target`]
//! rather than decided by the leaf alone.

/// Elements whose children span several events. Each one gets its own
/// frame on the parser stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Gpx,
    Metadata,
    Waypoint,
    RoutePoint,
    TrackPoint,
    Link,
    Route,
    Track,
    TrackSegment,
    Author,
    Copyright,
    Bounds,
}

/// Elements holding a single text value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leaf {
    Name,
    Desc,
    Cmt,
    Time,
    Type,
    Number,
    Ele,
    Sym,
    Fix,
    Sat,
    Hdop,
    Vdop,
    Pdop,
    AgeOfDgpsData,
    DgpsId,
    Src,
    MagVar,
    GeoidHeight,
    Year,
    License,
    Email,
    Text,
    Keywords,
    /// GPX 1.0 only.
    Url,
    /// GPX 1.0 only.
    UrlName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Container(ContainerKind),
    Leaf(Leaf),
    /// Anything unrecognised. Its whole subtree is skipped.
    Unknown,
}

impl ElementKind {
    /// Classify an element by its local name.
    pub fn from_name(name: &str) -> Self {
        use ContainerKind as C;

        match name {
            "gpx" => Self::Container(C::Gpx),
            "metadata" => Self::Container(C::Metadata),
            "wpt" => Self::Container(C::Waypoint),
            "rtept" => Self::Container(C::RoutePoint),
            "trkpt" => Self::Container(C::TrackPoint),
            "link" => Self::Container(C::Link),
            "rte" => Self::Container(C::Route),
            "trk" => Self::Container(C::Track),
            "trkseg" => Self::Container(C::TrackSegment),
            "author" => Self::Container(C::Author),
            "copyright" => Self::Container(C::Copyright),
            "bounds" => Self::Container(C::Bounds),
            "name" => Self::Leaf(Leaf::Name),
            "desc" => Self::Leaf(Leaf::Desc),
            "cmt" => Self::Leaf(Leaf::Cmt),
            "time" => Self::Leaf(Leaf::Time),
            "type" => Self::Leaf(Leaf::Type),
            "number" => Self::Leaf(Leaf::Number),
            "ele" => Self::Leaf(Leaf::Ele),
            "sym" => Self::Leaf(Leaf::Sym),
            "fix" => Self::Leaf(Leaf::Fix),
            "sat" => Self::Leaf(Leaf::Sat),
            "hdop" => Self::Leaf(Leaf::Hdop),
            "vdop" => Self::Leaf(Leaf::Vdop),
            "pdop" => Self::Leaf(Leaf::Pdop),
            "ageofdgpsdata" => Self::Leaf(Leaf::AgeOfDgpsData),
            "dgpsid" => Self::Leaf(Leaf::DgpsId),
            "src" => Self::Leaf(Leaf::Src),
            "magvar" => Self::Leaf(Leaf::MagVar),
            "geoidheight" => Self::Leaf(Leaf::GeoidHeight),
            "year" => Self::Leaf(Leaf::Year),
            "license" => Self::Leaf(Leaf::License),
            "email" => Self::Leaf(Leaf::Email),
            "text" => Self::Leaf(Leaf::Text),
            "keywords" => Self::Leaf(Leaf::Keywords),
            "url" => Self::Leaf(Leaf::Url),
            "urlname" => Self::Leaf(Leaf::UrlName),
            _ => Self::Unknown,
        }
    }
}

/// Destination of a leaf's text inside the enclosing container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Comment,
    Description,
    Source,
    Type,
    Number,
    Time,
    Keywords,
    Elevation,
    MagneticVariation,
    GeoidHeight,
    Symbol,
    Fix,
    Satellites,
    Hdop,
    Vdop,
    Pdop,
    AgeOfDgpsData,
    DgpsId,
    Href,
    Text,
    Email,
    Year,
    License,
}

/// Which field of `parent` a `leaf` child fills. `None` means the leaf has no
/// meaning there and is ignored.
pub fn leaf_target(parent: ContainerKind, leaf: Leaf) -> Option<Field> {
    use ContainerKind as C;

    match parent {
        C::Metadata => match leaf {
            Leaf::Name => Some(Field::Name),
            Leaf::Desc => Some(Field::Description),
            Leaf::Time => Some(Field::Time),
            Leaf::Keywords => Some(Field::Keywords),
            _ => None,
        },
        C::Waypoint | C::RoutePoint | C::TrackPoint => match leaf {
            Leaf::Ele => Some(Field::Elevation),
            Leaf::Time => Some(Field::Time),
            Leaf::MagVar => Some(Field::MagneticVariation),
            Leaf::GeoidHeight => Some(Field::GeoidHeight),
            Leaf::Name => Some(Field::Name),
            Leaf::Cmt => Some(Field::Comment),
            Leaf::Desc => Some(Field::Description),
            Leaf::Src => Some(Field::Source),
            Leaf::Sym => Some(Field::Symbol),
            Leaf::Type => Some(Field::Type),
            Leaf::Fix => Some(Field::Fix),
            Leaf::Sat => Some(Field::Satellites),
            Leaf::Hdop => Some(Field::Hdop),
            Leaf::Vdop => Some(Field::Vdop),
            Leaf::Pdop => Some(Field::Pdop),
            Leaf::AgeOfDgpsData => Some(Field::AgeOfDgpsData),
            Leaf::DgpsId => Some(Field::DgpsId),
            _ => None,
        },
        C::Route | C::Track => match leaf {
            Leaf::Name => Some(Field::Name),
            Leaf::Cmt => Some(Field::Comment),
            Leaf::Desc => Some(Field::Description),
            Leaf::Src => Some(Field::Source),
            Leaf::Number => Some(Field::Number),
            Leaf::Type => Some(Field::Type),
            _ => None,
        },
        C::Link => match leaf {
            Leaf::Text | Leaf::UrlName => Some(Field::Text),
            Leaf::Type => Some(Field::Type),
            Leaf::Url => Some(Field::Href),
            _ => None,
        },
        C::Author => match leaf {
            Leaf::Name => Some(Field::Name),
            Leaf::Email => Some(Field::Email),
            _ => None,
        },
        C::Copyright => match leaf {
            Leaf::Year => Some(Field::Year),
            Leaf::License => Some(Field::License),
            _ => None,
        },
        C::Gpx | C::TrackSegment | C::Bounds => None,
    }
}

/// Whether a `child` container may open directly inside `parent`.
pub fn accepts_child(parent: ContainerKind, child: ContainerKind) -> bool {
    use ContainerKind as C;

    matches!(
        (parent, child),
        (C::Gpx, C::Metadata | C::Waypoint | C::Route | C::Track)
            | (C::Metadata, C::Author | C::Copyright | C::Link | C::Bounds)
            | (C::Author, C::Link)
            | (C::Waypoint | C::RoutePoint | C::TrackPoint, C::Link)
            | (C::Route, C::Link | C::RoutePoint)
            | (C::Track, C::Link | C::TrackSegment)
            | (C::TrackSegment, C::TrackPoint)
    )
}
