use serde::Deserialize;

/// Options for writing a GPX document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializeOptions {
    /// Indent the output with tabs, one element per line (default: true)
    #[serde(default = "default_true")]
    pub format: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self { format: true }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let opts: SerializeOptions = serde_json::from_str("{}").unwrap();
        assert!(opts.format);
    }

    #[test]
    fn test_camel_case_fields() {
        let opts: SerializeOptions = serde_json::from_str(r#"{"format": false}"#).unwrap();
        assert!(!opts.format);
    }
}
