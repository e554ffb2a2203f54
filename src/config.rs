//! Fragment size configuration.
//!
//! The fragment size is read once, before the first transfer, and is carried
//! by value from then on. [`FragmentationConfig::from_env`] consults
//! [`FRAGMENT_SIZE_ENV`], falling back to [`LEGACY_FRAGMENT_SIZE_ENV`] and
//! finally to [`DEFAULT_FRAGMENT_SIZE`].

use std::num::NonZeroUsize;

use log::{debug, warn};
use thiserror::Error;

/// Environment key holding the fragment size in elements.
pub const FRAGMENT_SIZE_ENV: &str = "FRAGMENT_SIZE";

/// Older environment key still honoured when [`FRAGMENT_SIZE_ENV`] is unset.
pub const LEGACY_FRAGMENT_SIZE_ENV: &str = "FRAGMENTATION_FRAG_SIZE";

/// Fragment size used when no key is set.
pub const DEFAULT_FRAGMENT_SIZE: NonZeroUsize = NonZeroUsize::new(8192).unwrap();

/// Errors raised while resolving the fragment size.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The value is not an unsigned integer.
    #[error("{key}={value:?} is not a valid fragment size")]
    Unparsable { key: &'static str, value: String },
    /// The value is zero.
    #[error("{key} must be a positive element count")]
    NonPositive { key: &'static str },
}

/// Settings controlling how transfers are split into fragments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FragmentationConfig {
    fragment_size: NonZeroUsize,
}

impl FragmentationConfig {
    /// Create a configuration splitting transfers into fragments of
    /// `fragment_size` elements.
    #[must_use]
    pub const fn new(fragment_size: NonZeroUsize) -> Self { Self { fragment_size } }

    /// Return the fragment size in elements.
    #[must_use]
    pub const fn fragment_size(&self) -> NonZeroUsize { self.fragment_size }

    /// Resolve the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the selected key holds a value that is
    /// not a positive integer. Values that are not valid UTF-8 are
    /// reported as [`ConfigError::Unparsable`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| {
            std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
        })
    }

    /// Resolve the configuration using `lookup` in place of the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the selected key holds a value that is
    /// not a positive integer.
    ///
    /// # Examples
    ///
    /// ```
    /// use fragmux::FragmentationConfig;
    ///
    /// let config = FragmentationConfig::from_lookup(|key| {
    ///     (key == "FRAGMENT_SIZE").then(|| "4096".to_owned())
    /// })
    /// .unwrap();
    /// assert_eq!(config.fragment_size().get(), 4096);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(FRAGMENT_SIZE_ENV) {
            return parse_fragment_size(FRAGMENT_SIZE_ENV, &value);
        }
        if let Some(value) = lookup(LEGACY_FRAGMENT_SIZE_ENV) {
            warn!("{LEGACY_FRAGMENT_SIZE_ENV} is deprecated; set {FRAGMENT_SIZE_ENV} instead");
            return parse_fragment_size(LEGACY_FRAGMENT_SIZE_ENV, &value);
        }
        debug!("fragment size defaulted to {DEFAULT_FRAGMENT_SIZE}");
        Ok(Self::default())
    }
}

impl Default for FragmentationConfig {
    fn default() -> Self { Self::new(DEFAULT_FRAGMENT_SIZE) }
}

fn parse_fragment_size(
    key: &'static str,
    value: &str,
) -> Result<FragmentationConfig, ConfigError> {
    let parsed: usize = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Unparsable {
            key,
            value: value.to_owned(),
        })?;
    let fragment_size = NonZeroUsize::new(parsed).ok_or(ConfigError::NonPositive { key })?;
    debug!("fragment size set to {fragment_size} by {key}");
    Ok(FragmentationConfig::new(fragment_size))
}
