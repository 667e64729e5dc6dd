use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// JWT pair persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

impl AuthTokens {
    /// Load tokens from disk
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .context("Could not read auth file")?;

        let tokens: Self = serde_json::from_str(&contents)
            .context("Could not parse auth file")?;

        Ok(Some(tokens))
    }

    /// Save tokens to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .context("Could not create config directory")?;
        }

        let contents = serde_json::to_string_pretty(self)
            .context("Could not serialize tokens")?;

        fs::write(path, contents)
            .context("Could not write auth file")?;

        Ok(())
    }

    /// Delete stored tokens
    pub fn delete(path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path)
                .context("Could not delete auth file")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_persist_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("auth.json");

        assert_eq!(AuthTokens::load(&path).unwrap(), None);

        let tokens = AuthTokens {
            access_token: "a.b.c".into(),
            refresh_token: "r.s.t".into(),
        };
        tokens.save(&path).unwrap();
        assert_eq!(AuthTokens::load(&path).unwrap(), Some(tokens));

        AuthTokens::delete(&path).unwrap();
        assert_eq!(AuthTokens::load(&path).unwrap(), None);
        AuthTokens::delete(&path).unwrap();
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        fs::write(&path, "not json").unwrap();

        assert!(AuthTokens::load(&path).is_err());
    }
}
