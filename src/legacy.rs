//! Version adapters sitting between the tokenizer and [`StateMachine`].
//!
//! GPX 1.0 keeps document information directly under `<gpx>` and describes
//! links with `<url>`/`<urlname>` leaves. [`LegacyAdapter`] rewrites those
//! events into the 1.1 shape by opening synthetic `metadata`, `author` and
//! `link` frames on the machine, so the machine itself only knows 1.1.

use tracing::debug;

use crate::element::{ContainerKind, ElementKind, Leaf};
use crate::gpx_types::GpxVersion;
use crate::machine::StateMachine;
use crate::parser::Attributes;

#[derive(Debug, Default)]
pub enum Adapter {
    /// GPX 1.1, or a document whose version could not be determined.
    #[default]
    Current,
    Legacy(LegacyAdapter),
}

impl Adapter {
    pub fn for_version(version: Option<GpxVersion>) -> Self {
        match version {
            Some(GpxVersion::V1_0) => Self::Legacy(LegacyAdapter::default()),
            Some(GpxVersion::V1_1) | None => Self::Current,
        }
    }

    pub fn start(&mut self, kind: ElementKind, attributes: &Attributes, machine: &mut StateMachine) {
        match self {
            Self::Current => machine.start(current_kind(kind), attributes),
            Self::Legacy(adapter) => adapter.start(kind, attributes, machine),
        }
    }

    pub fn end(&mut self, kind: ElementKind, machine: &mut StateMachine) {
        match self {
            Self::Current => machine.end(current_kind(kind)),
            Self::Legacy(adapter) => adapter.end(machine),
        }
    }
}

/// `url` and `urlname` do not exist in GPX 1.1.
fn current_kind(kind: ElementKind) -> ElementKind {
    match kind {
        ElementKind::Leaf(Leaf::Url | Leaf::UrlName) => ElementKind::Unknown,
        other => other,
    }
}

/// An element open in the source document.
#[derive(Debug)]
struct SourceElement {
    /// Kind the machine was given for this element's start, and gets again on its end.
    forwarded: ElementKind,
    /// Synthetic frames opened on the machine for this element's children, outermost first.
    synthetic: Vec<ContainerKind>,
}

#[derive(Debug, Default)]
pub struct LegacyAdapter {
    open: Vec<SourceElement>,
    metadata_closed: bool,
}

impl LegacyAdapter {
    pub fn start(&mut self, kind: ElementKind, attributes: &Attributes, machine: &mut StateMachine) {
        let forwarded = match self.open.last().map(|parent| parent.forwarded) {
            Some(parent) => {
                let (wrappers, forwarded) = self.rewrite(parent, kind);
                if let Some(wrappers) = wrappers {
                    self.reconcile(wrappers, machine);
                }
                forwarded
            }
            None => kind,
        };

        machine.start(forwarded, attributes);
        self.open.push(SourceElement {
            forwarded,
            synthetic: Vec::new(),
        });
    }

    pub fn end(&mut self, machine: &mut StateMachine) {
        let Some(element) = self.open.pop() else {
            return;
        };
        for kind in element.synthetic.into_iter().rev() {
            machine.end(ElementKind::Container(kind));
        }
        machine.end(element.forwarded);
    }

    /// Synthetic frames `kind` must sit in below `parent`, and the kind to
    /// forward for it. `None` leaves the currently open synthetic frames as
    /// they are, which is what ignored elements get.
    fn rewrite(
        &self,
        parent: ElementKind,
        kind: ElementKind,
    ) -> (Option<&'static [ContainerKind]>, ElementKind) {
        use ContainerKind as C;
        use ElementKind::{Container, Leaf as L};

        const METADATA: &[ContainerKind] = &[C::Metadata];
        const AUTHOR: &[ContainerKind] = &[C::Metadata, C::Author];
        const METADATA_LINK: &[ContainerKind] = &[C::Metadata, C::Link];
        const LINK: &[ContainerKind] = &[C::Link];
        const NONE: &[ContainerKind] = &[];

        let wrappers: &'static [ContainerKind] = match (parent, kind) {
            (_, ElementKind::Unknown) => return (None, kind),
            (Container(C::Gpx), L(Leaf::Name | Leaf::Desc | Leaf::Time | Leaf::Keywords))
            | (Container(C::Gpx), Container(C::Bounds)) => METADATA,
            (Container(C::Gpx), Container(C::Author)) => {
                return self.document_field(AUTHOR, L(Leaf::Name));
            }
            (Container(C::Gpx), L(Leaf::Email)) => AUTHOR,
            (Container(C::Gpx), L(Leaf::Url | Leaf::UrlName)) => METADATA_LINK,
            (
                Container(C::Gpx),
                Container(C::Metadata | C::Waypoint | C::Route | C::Track),
            ) => return (Some(NONE), kind),
            // Nothing else has a place directly under a 1.0 <gpx>.
            (Container(C::Gpx), _) => return (None, ElementKind::Unknown),
            (
                Container(C::Waypoint | C::RoutePoint | C::TrackPoint | C::Route | C::Track),
                L(Leaf::Url | Leaf::UrlName),
            ) => LINK,
            _ => NONE,
        };

        if wrappers.first() == Some(&C::Metadata) {
            return self.document_field(wrappers, kind);
        }
        (Some(wrappers), kind)
    }

    /// Document information is only taken before the first waypoint, route
    /// or track closed the synthetic metadata.
    fn document_field(
        &self,
        wrappers: &'static [ContainerKind],
        kind: ElementKind,
    ) -> (Option<&'static [ContainerKind]>, ElementKind) {
        if self.metadata_closed && !self.parent_synthetic().contains(&ContainerKind::Metadata) {
            debug!(?kind, "ignoring GPX 1.0 document information after waypoints, routes or tracks");
            return (None, ElementKind::Unknown);
        }
        (Some(wrappers), kind)
    }

    fn parent_synthetic(&self) -> &[ContainerKind] {
        self.open
            .last()
            .map(|parent| parent.synthetic.as_slice())
            .unwrap_or_default()
    }

    /// Close and open synthetic frames on the parent so they match `wanted`.
    fn reconcile(&mut self, wanted: &[ContainerKind], machine: &mut StateMachine) {
        let Some(parent) = self.open.last_mut() else {
            return;
        };

        let shared = parent
            .synthetic
            .iter()
            .zip(wanted)
            .take_while(|(open, want)| open == want)
            .count();

        while parent.synthetic.len() > shared {
            if let Some(kind) = parent.synthetic.pop() {
                if kind == ContainerKind::Metadata {
                    self.metadata_closed = true;
                }
                machine.end(ElementKind::Container(kind));
            }
        }
        for &kind in &wanted[shared..] {
            machine.start(ElementKind::Container(kind), &Attributes::new());
            parent.synthetic.push(kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpx_types::Gpx;

    struct Feed {
        adapter: Adapter,
        machine: StateMachine,
    }

    impl Feed {
        fn new() -> Self {
            Self {
                adapter: Adapter::for_version(Some(GpxVersion::V1_0)),
                machine: StateMachine::new(),
            }
        }

        fn open(&mut self, name: &str, pairs: &[(&str, &str)]) -> &mut Self {
            let attributes: Attributes = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            self.adapter
                .start(ElementKind::from_name(name), &attributes, &mut self.machine);
            self
        }

        fn close(&mut self, name: &str) -> &mut Self {
            self.adapter
                .end(ElementKind::from_name(name), &mut self.machine);
            self
        }

        fn leaf(&mut self, name: &str, text: &str) -> &mut Self {
            self.open(name, &[]);
            self.machine.text(text);
            self.close(name)
        }

        fn finish(self) -> Gpx {
            self.machine.finish()
        }
    }

    #[test]
    fn test_top_level_fields_move_into_metadata() {
        let mut feed = Feed::new();
        feed.open("gpx", &[("version", "1.0")])
            .leaf("name", "Old file")
            .leaf("desc", "From 2004")
            .leaf("author", "Jane")
            .leaf("email", "jane@example.com")
            .leaf("url", "http://example.com")
            .leaf("urlname", "Home")
            .leaf("time", "2004-05-06T07:08:09Z")
            .leaf("keywords", "hiking")
            .open(
                "bounds",
                &[("minlat", "1"), ("minlon", "2"), ("maxlat", "3"), ("maxlon", "4")],
            )
            .close("bounds")
            .close("gpx");

        let gpx = feed.finish();
        let metadata = gpx.metadata.unwrap();
        assert_eq!(metadata.name.as_deref(), Some("Old file"));
        assert_eq!(metadata.desc.as_deref(), Some("From 2004"));
        let author = metadata.author.unwrap();
        assert_eq!(author.name.as_deref(), Some("Jane"));
        assert_eq!(author.email.as_deref(), Some("jane@example.com"));
        assert_eq!(metadata.links.len(), 1);
        assert_eq!(metadata.links[0].href.as_deref(), Some("http://example.com"));
        assert_eq!(metadata.links[0].text.as_deref(), Some("Home"));
        assert!(metadata.time.is_some());
        assert_eq!(metadata.keywords.as_deref(), Some("hiking"));
        assert!(metadata.bounds.is_some());
    }

    #[test]
    fn test_point_url_becomes_link() {
        let mut feed = Feed::new();
        feed.open("gpx", &[("version", "1.0")])
            .open("wpt", &[("lat", "1"), ("lon", "2")])
            .leaf("name", "Spot")
            .leaf("url", "http://sample-link.com")
            .leaf("urlname", "Sample Link")
            .leaf("sym", "Flag")
            .close("wpt")
            .close("gpx");

        let gpx = feed.finish();
        let point = &gpx.waypoints[0];
        assert_eq!(point.links.len(), 1);
        assert_eq!(point.links[0].href.as_deref(), Some("http://sample-link.com"));
        assert_eq!(point.links[0].text.as_deref(), Some("Sample Link"));
        assert_eq!(point.sym.as_deref(), Some("Flag"));
        assert_eq!(point.name.as_deref(), Some("Spot"));
    }

    #[test]
    fn test_separated_urls_make_separate_links() {
        let mut feed = Feed::new();
        feed.open("gpx", &[("version", "1.0")])
            .open("rte", &[])
            .leaf("url", "http://a.example")
            .leaf("name", "between")
            .leaf("url", "http://b.example")
            .close("rte")
            .close("gpx");

        let gpx = feed.finish();
        let links = &gpx.routes[0].links;
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].href.as_deref(), Some("http://b.example"));
    }

    #[test]
    fn test_no_metadata_without_document_fields() {
        let mut feed = Feed::new();
        feed.open("gpx", &[("version", "1.0")])
            .open("wpt", &[("lat", "1"), ("lon", "2")])
            .close("wpt")
            .close("gpx");

        let gpx = feed.finish();
        assert!(gpx.metadata.is_none());
        assert_eq!(gpx.waypoints.len(), 1);
    }

    #[test]
    fn test_late_document_fields_ignored() {
        let mut feed = Feed::new();
        feed.open("gpx", &[("version", "1.0")])
            .leaf("name", "First")
            .open("wpt", &[("lat", "1"), ("lon", "2")])
            .close("wpt")
            .leaf("name", "Late")
            .close("gpx");

        let gpx = feed.finish();
        assert_eq!(gpx.metadata.unwrap().name.as_deref(), Some("First"));
        assert_eq!(gpx.waypoints.len(), 1);
    }

    #[test]
    fn test_unknown_top_level_element_keeps_metadata_open() {
        let mut feed = Feed::new();
        feed.open("gpx", &[("version", "1.0")])
            .leaf("name", "Trip")
            .leaf("foo", "x")
            .open("extensions", &[])
            .leaf("name", "vendor")
            .close("extensions")
            .leaf("desc", "D")
            .leaf("time", "2004-05-06T07:08:09Z")
            .leaf("author", "Jane")
            .close("gpx");

        let metadata = feed.finish().metadata.unwrap();
        assert_eq!(metadata.name.as_deref(), Some("Trip"));
        assert_eq!(metadata.desc.as_deref(), Some("D"));
        assert!(metadata.time.is_some());
        assert_eq!(metadata.author.unwrap().name.as_deref(), Some("Jane"));
    }

    #[test]
    fn test_unknown_element_inside_point_keeps_link_open() {
        let mut feed = Feed::new();
        feed.open("gpx", &[("version", "1.0")])
            .open("wpt", &[("lat", "1"), ("lon", "2")])
            .leaf("url", "http://sample-link.com")
            .leaf("course", "10")
            .leaf("urlname", "Sample Link")
            .close("wpt")
            .close("gpx");

        let links = &feed.finish().waypoints[0].links;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].text.as_deref(), Some("Sample Link"));
    }

    #[test]
    fn test_current_adapter_ignores_url() {
        let mut adapter = Adapter::for_version(Some(GpxVersion::V1_1));
        let mut machine = StateMachine::new();
        let none = Attributes::new();
        let point: Attributes = [("lat", "1"), ("lon", "2")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        adapter.start(ElementKind::from_name("gpx"), &none, &mut machine);
        adapter.start(ElementKind::from_name("wpt"), &point, &mut machine);
        adapter.start(ElementKind::from_name("url"), &none, &mut machine);
        machine.text("http://ignored.example");
        adapter.end(ElementKind::from_name("url"), &mut machine);
        adapter.end(ElementKind::from_name("wpt"), &mut machine);
        adapter.end(ElementKind::from_name("gpx"), &mut machine);

        let gpx = machine.finish();
        assert!(gpx.waypoints[0].links.is_empty());
    }
}
