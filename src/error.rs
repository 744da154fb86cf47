use wasm_bindgen::JsValue;

/// Fatal failures. Content-level anomalies never end up here; they leave the
/// affected field absent instead.
#[derive(Debug, thiserror::Error)]
pub enum GpxError {
    /// The tokenizer could not be set up for the given input.
    #[error("initialization error: {0}")]
    Initialization(String),

    /// The tokenizer reported malformed XML.
    #[error("parsing error: {0}")]
    Parsing(String),

    #[error("error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, GpxError>;

impl From<quick_xml::Error> for GpxError {
    fn from(e: quick_xml::Error) -> Self {
        match e {
            quick_xml::Error::Io(e) => Self::General(e.to_string()),
            other => Self::Parsing(other.to_string()),
        }
    }
}

impl From<std::io::Error> for GpxError {
    fn from(e: std::io::Error) -> Self {
        Self::General(e.to_string())
    }
}

impl From<GpxError> for JsValue {
    fn from(e: GpxError) -> Self {
        js_sys::Error::new(&e.to_string()).into()
    }
}
