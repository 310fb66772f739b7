//! Environment files for functions
//!
//! Dotenv syntax via `dotenvy`: `KEY=VALUE` per line, `#` comments,
//! an optional `export ` prefix and quoted values.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, IoResultExt, Result};

pub fn parse_env_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let raw = std::fs::read_to_string(path).with_path(path)?;
    parse_env(&raw).map_err(|source| Error::EnvFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse env file contents; later keys win over earlier ones
pub fn parse_env(raw: &str) -> std::result::Result<BTreeMap<String, String>, dotenvy::Error> {
    dotenvy::from_read_iter(raw.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env() {
        let vars = parse_env(
            "# comment\n\nAPI_URL=https://example.com/?a=b\nexport TOKEN=\"secret value\"\nNAME='x'\nEMPTY=\n",
        )
        .unwrap();
        assert_eq!(vars["API_URL"], "https://example.com/?a=b");
        assert_eq!(vars["TOKEN"], "secret value");
        assert_eq!(vars["NAME"], "x");
        assert_eq!(vars["EMPTY"], "");
        assert_eq!(vars.len(), 4);
    }

    #[test]
    fn test_parse_env_errors() {
        assert!(parse_env("A=1\nB\n").is_err());
        assert!(parse_env("BAD-KEY=1").is_err());
        assert!(parse_env("=1").is_err());
    }

    #[test]
    fn test_parse_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "A=1\noops\n").unwrap();
        let err = parse_env_file(&path).unwrap_err();
        assert!(matches!(err, Error::EnvFile { .. }));
        assert!(err.to_string().starts_with("invalid env file"));

        let missing = parse_env_file(&dir.path().join("missing.env")).unwrap_err();
        assert!(matches!(missing, Error::Io { .. }));
    }
}
