//! Parser options
//!
//! Field names follow the camelCase keys test harnesses pass, so an
//! options record can be read straight from JSON.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Parse with the module goal (strict, `import`/`export`, top-level `await`)
    pub module: bool,
    /// Enable proposal-stage syntax (import attributes, `import()` options)
    pub next: bool,
    /// Attach `loc` to every node
    pub loc: bool,
    /// Attach `range: [start, end]` to every node
    pub ranges: bool,
    /// Attach `raw` source text to literals
    pub raw: bool,
    /// Treat the whole script as strict code
    pub implied_strict: bool,
    /// Turn off the Annex B web compatibility relaxations
    pub disable_web_compat: bool,
    /// Allow `return` outside of functions
    pub global_return: bool,
}

impl Options {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn module() -> Self {
        Options {
            module: true,
            ..Options::default()
        }
    }

    pub(crate) fn web_compat(&self) -> bool {
        !self.disable_web_compat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_reads_camel_case_and_ignores_unknown() {
        let options = Options::from_json(r#"{"disableWebCompat": true, "loc": true, "lexical": true}"#);
        assert_eq!(
            options.ok(),
            Some(Options {
                disable_web_compat: true,
                loc: true,
                ..Options::default()
            })
        );
    }

    #[test]
    fn test_from_json_rejects_malformed_input() {
        assert!(Options::from_json("{module:").is_err());
    }
}
