use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const APP_DIR: &str = "blog-tui";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the blog API, without trailing slash.
    pub api_url: String,
    /// Applied to every HTTP request so a hung call cannot pin a pending flag.
    pub request_timeout: Duration,
    pub token_path: PathBuf,
    pub log_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("BLOG_API_URL")
            .unwrap_or_else(|| "http://localhost:8000/api".to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs: u64 = lookup("BLOG_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string()) // seconds
            .parse()
            .context("BLOG_REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;
        if timeout_secs == 0 {
            bail!("BLOG_REQUEST_TIMEOUT_SECS must be greater than zero");
        }

        let (config_dir, cache_dir) = match lookup("BLOG_CONFIG_DIR") {
            Some(dir) => (PathBuf::from(&dir), PathBuf::from(dir)),
            None => (
                dirs::config_dir()
                    .context("Could not find config directory")?
                    .join(APP_DIR),
                dirs::cache_dir()
                    .context("Could not find cache directory")?
                    .join(APP_DIR),
            ),
        };

        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(timeout_secs),
            token_path: config_dir.join("auth.json"),
            log_path: cache_dir.join("blog-tui.log"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = config_from(&[("BLOG_CONFIG_DIR", "/tmp/blog")]).unwrap();
        assert_eq!(config.api_url, "http://localhost:8000/api");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.token_path, PathBuf::from("/tmp/blog/auth.json"));
        assert_eq!(config.log_path, PathBuf::from("/tmp/blog/blog-tui.log"));
    }

    #[test]
    fn overrides_are_read() {
        let config = config_from(&[
            ("BLOG_API_URL", "https://blog.example.com/api/"),
            ("BLOG_REQUEST_TIMEOUT_SECS", "5"),
            ("BLOG_CONFIG_DIR", "/tmp/blog"),
        ])
        .unwrap();
        assert_eq!(config.api_url, "https://blog.example.com/api");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_bad_timeout() {
        assert!(config_from(&[
            ("BLOG_REQUEST_TIMEOUT_SECS", "soon"),
            ("BLOG_CONFIG_DIR", "/tmp/blog")
        ])
        .is_err());
        assert!(config_from(&[
            ("BLOG_REQUEST_TIMEOUT_SECS", "0"),
            ("BLOG_CONFIG_DIR", "/tmp/blog")
        ])
        .is_err());
    }
}
