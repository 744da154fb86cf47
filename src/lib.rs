pub mod element;
pub mod error;
pub mod formatter;
pub mod gpx_types;
pub mod legacy;
pub mod machine;
pub mod options;
pub mod parser;
pub mod serializer;
pub mod timestamp;

use wasm_bindgen::prelude::*;

pub use crate::error::GpxError;
pub use crate::formatter::format_xml;
pub use crate::gpx_types::*;
pub use crate::options::SerializeOptions;
pub use crate::parser::{Attributes, GpxParser, parse_gpx, parse_gpx_bytes};
pub use crate::serializer::serialize_gpx;

/// Write a document as indented GPX 1.1 text.
pub fn to_xml_string(gpx: &Gpx) -> Result<String, GpxError> {
    to_xml_string_with(gpx, &SerializeOptions::default())
}

pub fn to_xml_string_with(gpx: &Gpx, opts: &SerializeOptions) -> Result<String, GpxError> {
    let raw = serialize_gpx(gpx)?;
    Ok(if opts.format { format_xml(&raw) } else { raw })
}

/// Parse a GPX 1.0 or 1.1 string, returned as a JS object.
#[wasm_bindgen(js_name = parseGpx)]
pub fn parse_gpx_js(gpx_string: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let gpx = parse_gpx(gpx_string)?;
    serde_wasm_bindgen::to_value(&gpx).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Parse a GPX 1.0 or 1.1 string, returned as a JSON string.
#[wasm_bindgen(js_name = parseGpxToJson)]
pub fn parse_gpx_to_json(gpx_string: &str) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let gpx = parse_gpx(gpx_string)?;
    serde_json::to_string(&gpx).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Write a JS object shaped like the result of `parseGpx` as GPX 1.1.
#[wasm_bindgen(js_name = serializeGpx)]
pub fn serialize_gpx_js(gpx: JsValue, options: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let gpx: Gpx =
        serde_wasm_bindgen::from_value(gpx).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(to_xml_string_with(&gpx, &opts)?)
}

/// Parse GPX 1.0 or 1.1 and write it back as canonical GPX 1.1.
#[wasm_bindgen(js_name = normalizeGpx)]
pub fn normalize_gpx(gpx_string: &str, options: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let gpx = parse_gpx(gpx_string)?;
    Ok(to_xml_string_with(&gpx, &opts)?)
}

fn parse_options(options: JsValue) -> Result<SerializeOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(SerializeOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
