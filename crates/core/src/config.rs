//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the workflow. Nothing
//! below the binaries reads environment variables.

use crate::constants::DEFAULT_STORE_DIR;
use crate::{BookingError, BookingResult};
use bloodtest_verification::QrOptions;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    store_dir: PathBuf,
    qr_options: QrOptions,
}

impl CoreConfig {
    /// Create a new `CoreConfig` with the default QR layout.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::InvalidInput` if `store_dir` is empty.
    pub fn new(store_dir: PathBuf) -> BookingResult<Self> {
        if store_dir.as_os_str().is_empty() {
            return Err(BookingError::InvalidInput(
                "session store directory cannot be empty".into(),
            ));
        }

        Ok(Self {
            store_dir,
            qr_options: QrOptions::default(),
        })
    }

    /// Replace the QR layout used by the bill viewer.
    pub fn with_qr_options(mut self, qr_options: QrOptions) -> Self {
        self.qr_options = qr_options;
        self
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    pub fn qr_options(&self) -> &QrOptions {
        &self.qr_options
    }
}

/// Resolve the session store directory from an optional raw value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_STORE_DIR`].
pub fn store_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_dir_is_rejected() {
        let err = CoreConfig::new(PathBuf::new()).expect_err("should reject empty dir");
        assert!(matches!(err, BookingError::InvalidInput(msg) if msg.contains("cannot be empty")));
    }

    #[test]
    fn store_dir_defaults_when_unset_or_blank() {
        assert_eq!(store_dir_from_env_value(None), PathBuf::from(DEFAULT_STORE_DIR));
        assert_eq!(
            store_dir_from_env_value(Some("   ".into())),
            PathBuf::from(DEFAULT_STORE_DIR)
        );
    }

    #[test]
    fn store_dir_uses_trimmed_value() {
        assert_eq!(
            store_dir_from_env_value(Some(" /tmp/session ".into())),
            PathBuf::from("/tmp/session")
        );
    }

    #[test]
    fn qr_options_can_be_overridden() {
        let cfg = CoreConfig::new(PathBuf::from("session"))
            .expect("valid config")
            .with_qr_options(QrOptions {
                width: 320,
                margin: 4,
            });
        assert_eq!(cfg.qr_options().width, 320);
        assert_eq!(cfg.qr_options().margin, 4);
    }
}
