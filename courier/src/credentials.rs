//! Loading the credential store and the validity map from JSON files.

use std::{collections::HashMap, io::ErrorKind, path::Path};

use anyhow::Context;
use courier_common::tracing;
use courier_dispatch::{CredentialStore, ValidityMap};

/// Read a JSON object of `login: secret` pairs.
///
/// # Errors
/// If the file cannot be read or is not a JSON object of strings.
pub async fn load_credentials(path: &Path) -> anyhow::Result<CredentialStore> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Cannot read credentials from {}", path.display()))?;

    parse_credentials(&content)
        .with_context(|| format!("Invalid credentials file {}", path.display()))
}

/// Parse a JSON object of `login: secret` pairs.
///
/// # Errors
/// If `content` is not a JSON object of strings.
pub fn parse_credentials(content: &str) -> anyhow::Result<CredentialStore> {
    let secrets: HashMap<String, String> = serde_json::from_str(content)?;
    Ok(secrets.into_iter().collect())
}

/// Read a JSON object of `email: bool` pairs.
///
/// A missing file means nothing is known about any address, so every address
/// is treated as deliverable.
///
/// # Errors
/// If the file exists but cannot be read or parsed.
pub async fn load_validity(path: Option<&Path>) -> anyhow::Result<ValidityMap> {
    let Some(path) = path else {
        return Ok(ValidityMap::new());
    };

    match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content)
            .with_context(|| format!("Invalid validity map {}", path.display())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(
                path = %path.display(),
                "Validity map not found, treating every address as deliverable"
            );
            Ok(ValidityMap::new())
        }
        Err(e) => {
            Err(e).with_context(|| format!("Cannot read validity map from {}", path.display()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_credentials() {
        let store =
            parse_credentials(r#"{"a@office.test": "app-password", "b@office.test": ""}"#)
                .unwrap();

        assert_eq!(store.len(), 2);
        assert!(store.credential("a@office.test").is_some());
        assert!(store.credential("b@office.test").is_none());
    }

    #[test]
    fn test_credentials_must_be_strings() {
        assert!(parse_credentials(r#"{"a@office.test": 5}"#).is_err());
    }

    #[tokio::test]
    async fn test_missing_validity_map_is_empty() {
        let map = load_validity(Some(Path::new("/definitely/not/validity.json")))
            .await
            .unwrap();
        assert!(map.is_empty());
        assert!(load_validity(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validity_map_is_parsed() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"bad@x.test": false, "ok@x.test": true}"#).unwrap();

        let map = load_validity(Some(file.path())).await.unwrap();

        assert!(!map.is_deliverable("bad@x.test"));
        assert!(map.is_deliverable("ok@x.test"));
        assert!(map.is_deliverable("new@x.test"));
    }
}
