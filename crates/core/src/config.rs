//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::constants::{
    ATTACHMENTS_DIR_NAME, DEFAULT_MAX_UPLOAD_BYTES, GRAFFITI_DIR_NAME, POSTS_DIR_NAME,
};
use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    content_data_dir: PathBuf,
    media_dir: PathBuf,
    public_base_url: String,
    max_upload_bytes: u64,
    graffiti_enabled: bool,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `public_base_url` is the externally reachable base of this service,
    /// used when issuing media URLs; a trailing slash is trimmed so URL
    /// joining stays predictable.
    pub fn new(
        content_data_dir: PathBuf,
        media_dir: PathBuf,
        public_base_url: String,
        max_upload_bytes: u64,
        graffiti_enabled: bool,
    ) -> CoreResult<Self> {
        let public_base_url = public_base_url.trim().trim_end_matches('/').to_string();
        if public_base_url.is_empty() {
            return Err(CoreError::InvalidInput(
                "public_base_url cannot be empty".into(),
            ));
        }

        if max_upload_bytes == 0 {
            return Err(CoreError::InvalidInput(
                "max_upload_bytes must be greater than zero".into(),
            ));
        }

        Ok(Self {
            content_data_dir,
            media_dir,
            public_base_url,
            max_upload_bytes,
            graffiti_enabled,
        })
    }

    pub fn content_data_dir(&self) -> &Path {
        &self.content_data_dir
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.content_data_dir.join(POSTS_DIR_NAME)
    }

    pub fn attachments_dir(&self) -> PathBuf {
        self.content_data_dir.join(ATTACHMENTS_DIR_NAME)
    }

    pub fn graffiti_dir(&self) -> PathBuf {
        self.content_data_dir.join(GRAFFITI_DIR_NAME)
    }

    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Global graffiti kill-switch: when false, stored drawings are not
    /// interleaved into rendered pages. Submission gating is per-post.
    pub fn graffiti_enabled(&self) -> bool {
        self.graffiti_enabled
    }
}

/// Parse a maximum upload size, in whole megabytes, from an optional
/// environment value.
///
/// If `value` is `None` or empty/whitespace, returns the default cap.
pub fn max_upload_bytes_from_env_value(value: Option<String>) -> CoreResult<u64> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(value) = value else {
        return Ok(DEFAULT_MAX_UPLOAD_BYTES);
    };

    let megabytes: u64 = value.parse().map_err(|_| {
        CoreError::InvalidInput(format!(
            "max upload size must be a whole number of megabytes, got {:?}",
            value
        ))
    })?;

    if megabytes == 0 {
        return Err(CoreError::InvalidInput(
            "max upload size must be at least 1 megabyte".into(),
        ));
    }

    Ok(megabytes * 1024 * 1024)
}

/// Parse the graffiti kill-switch from an optional environment value.
///
/// Absent or empty means enabled; recognised false values are `0`, `false`,
/// `off` and `no` (case-insensitive).
pub fn graffiti_enabled_from_env_value(value: Option<String>) -> bool {
    let value = value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());

    match value.as_deref() {
        Some("0") | Some("false") | Some("off") | Some("no") => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_base_url(url: &str) -> CoreResult<CoreConfig> {
        CoreConfig::new(
            PathBuf::from("content_data"),
            PathBuf::from("media_data"),
            url.to_string(),
            DEFAULT_MAX_UPLOAD_BYTES,
            true,
        )
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let cfg = config_with_base_url("http://localhost:3000/").unwrap();
        assert_eq!(cfg.public_base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_empty_base_url_rejected() {
        assert!(config_with_base_url("   ").is_err());
    }

    #[test]
    fn test_storage_dirs_derive_from_content_dir() {
        let cfg = config_with_base_url("http://localhost:3000").unwrap();
        assert_eq!(cfg.posts_dir(), PathBuf::from("content_data/posts"));
        assert_eq!(
            cfg.attachments_dir(),
            PathBuf::from("content_data/attachments")
        );
        assert_eq!(cfg.graffiti_dir(), PathBuf::from("content_data/graffiti"));
    }

    #[test]
    fn test_max_upload_bytes_default() {
        assert_eq!(
            max_upload_bytes_from_env_value(None).unwrap(),
            DEFAULT_MAX_UPLOAD_BYTES
        );
        assert_eq!(
            max_upload_bytes_from_env_value(Some("  ".into())).unwrap(),
            DEFAULT_MAX_UPLOAD_BYTES
        );
    }

    #[test]
    fn test_max_upload_bytes_parses_megabytes() {
        assert_eq!(
            max_upload_bytes_from_env_value(Some("5".into())).unwrap(),
            5 * 1024 * 1024
        );
    }

    #[test]
    fn test_max_upload_bytes_rejects_bad_values() {
        assert!(max_upload_bytes_from_env_value(Some("0".into())).is_err());
        assert!(max_upload_bytes_from_env_value(Some("two".into())).is_err());
    }

    #[test]
    fn test_graffiti_enabled_parsing() {
        assert!(graffiti_enabled_from_env_value(None));
        assert!(graffiti_enabled_from_env_value(Some("1".into())));
        assert!(graffiti_enabled_from_env_value(Some("true".into())));
        assert!(!graffiti_enabled_from_env_value(Some("0".into())));
        assert!(!graffiti_enabled_from_env_value(Some("FALSE".into())));
        assert!(!graffiti_enabled_from_env_value(Some("off".into())));
    }
}
