use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};

/// Configuration of the [`crate::PrestateTracer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrestateTracerConfig {
    /// If true, the tracer reports the changed state as a `{pre, post}` pair instead of the
    /// full prestate.
    pub diff_mode: bool,
}

impl PrestateTracerConfig {
    /// Decodes the JSON configuration. A missing or `null` configuration is the default.
    pub fn from_json(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some("null") => Ok(Self::default()),
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| eyre!("invalid prestate tracer config: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        assert_eq!(PrestateTracerConfig::from_json(None).unwrap(), Default::default());
        assert_eq!(PrestateTracerConfig::from_json(Some("null")).unwrap(), Default::default());
        assert!(PrestateTracerConfig::from_json(Some(r#"{"diffMode":true}"#)).unwrap().diff_mode);
        assert!(!PrestateTracerConfig::from_json(Some("{}")).unwrap().diff_mode);
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(PrestateTracerConfig::from_json(Some(r#"{"diffMode":"#)).is_err());
        assert!(PrestateTracerConfig::from_json(Some(r#"{"diffMode":1}"#)).is_err());
    }
}
