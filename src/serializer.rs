use std::fmt::Display;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{GpxError, Result};
use crate::gpx_types::*;
use crate::timestamp::format_timestamp;

type XmlWriter = Writer<Vec<u8>>;

/// Write a document as unindented GPX 1.1, whatever version it was read from.
pub fn serialize_gpx(gpx: &Gpx) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("gpx");
    root.push_attribute(("version", "1.1"));
    if let Some(creator) = &gpx.creator {
        root.push_attribute(("creator", creator.as_str()));
    }
    writer.write_event(Event::Start(root))?;

    if let Some(metadata) = &gpx.metadata {
        write_metadata(&mut writer, metadata)?;
    }
    for wpt in &gpx.waypoints {
        write_point(&mut writer, "wpt", wpt)?;
    }
    for rte in &gpx.routes {
        write_route(&mut writer, rte)?;
    }
    for trk in &gpx.tracks {
        write_track(&mut writer, trk)?;
    }

    end(&mut writer, "gpx")?;
    String::from_utf8(writer.into_inner()).map_err(|e| GpxError::General(e.to_string()))
}

fn write_metadata(writer: &mut XmlWriter, metadata: &Metadata) -> Result<()> {
    start(writer, BytesStart::new("metadata"))?;
    write_optional(writer, "name", metadata.name.as_ref())?;
    write_optional(writer, "desc", metadata.desc.as_ref())?;
    if let Some(author) = &metadata.author {
        write_author(writer, author)?;
    }
    if let Some(copyright) = &metadata.copyright {
        write_copyright(writer, copyright)?;
    }
    for link in &metadata.links {
        write_link(writer, link)?;
    }
    write_optional(writer, "time", metadata.time.as_ref().map(format_timestamp))?;
    write_optional(writer, "keywords", metadata.keywords.as_ref())?;
    if let Some(bounds) = &metadata.bounds {
        let mut element = BytesStart::new("bounds");
        element.push_attribute(("minlat", bounds.min_lat.to_string().as_str()));
        element.push_attribute(("minlon", bounds.min_lon.to_string().as_str()));
        element.push_attribute(("maxlat", bounds.max_lat.to_string().as_str()));
        element.push_attribute(("maxlon", bounds.max_lon.to_string().as_str()));
        writer.write_event(Event::Empty(element))?;
    }
    end(writer, "metadata")
}

fn write_author(writer: &mut XmlWriter, author: &Author) -> Result<()> {
    start(writer, BytesStart::new("author"))?;
    write_optional(writer, "name", author.name.as_ref())?;
    if let Some(email) = &author.email {
        write_email(writer, email)?;
    }
    if let Some(link) = &author.link {
        write_link(writer, link)?;
    }
    end(writer, "author")
}

/// Addresses are split into `id`/`domain` as GPX 1.1 expects; anything
/// without an `@` is kept as text.
fn write_email(writer: &mut XmlWriter, email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((id, domain)) => {
            let mut element = BytesStart::new("email");
            element.push_attribute(("id", id));
            element.push_attribute(("domain", domain));
            writer.write_event(Event::Empty(element))?;
            Ok(())
        }
        None => write_text_element(writer, "email", email),
    }
}

fn write_copyright(writer: &mut XmlWriter, copyright: &Copyright) -> Result<()> {
    // `author` is required on <copyright>, so it is written even when unknown.
    let mut element = BytesStart::new("copyright");
    element.push_attribute(("author", copyright.author.as_deref().unwrap_or_default()));
    start(writer, element)?;
    write_optional(writer, "year", copyright.year)?;
    write_optional(writer, "license", copyright.license.as_ref())?;
    end(writer, "copyright")
}

fn write_link(writer: &mut XmlWriter, link: &Link) -> Result<()> {
    let mut element = BytesStart::new("link");
    if let Some(href) = &link.href {
        element.push_attribute(("href", href.as_str()));
    }
    start(writer, element)?;
    write_optional(writer, "text", link.text.as_ref())?;
    write_optional(writer, "type", link.link_type.as_ref())?;
    end(writer, "link")
}

fn write_point(writer: &mut XmlWriter, tag: &str, pt: &Waypoint) -> Result<()> {
    let mut element = BytesStart::new(tag);
    element.push_attribute(("lat", pt.lat.to_string().as_str()));
    element.push_attribute(("lon", pt.lon.to_string().as_str()));
    start(writer, element)?;

    write_optional(writer, "ele", pt.ele)?;
    write_optional(writer, "time", pt.time.as_ref().map(format_timestamp))?;
    write_optional(writer, "magvar", pt.magnetic_variation)?;
    write_optional(writer, "geoidheight", pt.geoid_height)?;
    write_optional(writer, "name", pt.name.as_ref())?;
    write_optional(writer, "cmt", pt.cmt.as_ref())?;
    write_optional(writer, "desc", pt.desc.as_ref())?;
    write_optional(writer, "src", pt.src.as_ref())?;
    for link in &pt.links {
        write_link(writer, link)?;
    }
    write_optional(writer, "sym", pt.sym.as_ref())?;
    write_optional(writer, "type", pt.point_type.as_ref())?;
    write_optional(writer, "fix", pt.fix.as_ref())?;
    write_optional(writer, "sat", pt.sat)?;
    write_optional(writer, "hdop", pt.hdop)?;
    write_optional(writer, "vdop", pt.vdop)?;
    write_optional(writer, "pdop", pt.pdop)?;
    write_optional(writer, "ageofdgpsdata", pt.age_of_dgps_data)?;
    write_optional(writer, "dgpsid", pt.dgps_id)?;

    end(writer, tag)
}

fn write_route(writer: &mut XmlWriter, rte: &Route) -> Result<()> {
    start(writer, BytesStart::new("rte"))?;
    write_optional(writer, "name", rte.name.as_ref())?;
    write_optional(writer, "cmt", rte.cmt.as_ref())?;
    write_optional(writer, "desc", rte.desc.as_ref())?;
    write_optional(writer, "src", rte.src.as_ref())?;
    for link in &rte.links {
        write_link(writer, link)?;
    }
    write_optional(writer, "number", rte.number)?;
    write_optional(writer, "type", rte.route_type.as_ref())?;
    for pt in &rte.points {
        write_point(writer, "rtept", pt)?;
    }
    end(writer, "rte")
}

fn write_track(writer: &mut XmlWriter, trk: &Track) -> Result<()> {
    start(writer, BytesStart::new("trk"))?;
    write_optional(writer, "name", trk.name.as_ref())?;
    write_optional(writer, "cmt", trk.cmt.as_ref())?;
    write_optional(writer, "desc", trk.desc.as_ref())?;
    write_optional(writer, "src", trk.src.as_ref())?;
    for link in &trk.links {
        write_link(writer, link)?;
    }
    write_optional(writer, "number", trk.number)?;
    write_optional(writer, "type", trk.track_type.as_ref())?;
    for seg in &trk.segments {
        start(writer, BytesStart::new("trkseg"))?;
        for pt in &seg.points {
            write_point(writer, "trkpt", pt)?;
        }
        end(writer, "trkseg")?;
    }
    end(writer, "trk")
}

fn start(writer: &mut XmlWriter, element: BytesStart<'_>) -> Result<()> {
    writer.write_event(Event::Start(element))?;
    Ok(())
}

fn end(writer: &mut XmlWriter, tag: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn write_text_element(writer: &mut XmlWriter, tag: &str, text: &str) -> Result<()> {
    start(writer, BytesStart::new(tag))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    end(writer, tag)
}

fn write_optional<T: Display>(writer: &mut XmlWriter, tag: &str, value: Option<T>) -> Result<()> {
    match value {
        Some(value) => write_text_element(writer, tag, &value.to_string()),
        None => Ok(()),
    }
}
