//! Error types for compact payload parsing.
//!
//! Structural violations (bad envelope, wrong discriminator) are raised as
//! [`Error`] values at the conversion boundary. Value-level problems — an
//! unparseable numeral, an unrecognizable date, a row that is shorter than
//! the field list — never raise: they degrade to `Null` (or a profile
//! default, see [`crate::postprocess`]) so that one bad cell cannot reject
//! an otherwise usable response.
//!
//! ## Examples
//!
//! ```rust
//! use compact_rows::{parse, Error, Value};
//!
//! let result = parse(&Value::Null);
//! assert_eq!(result.unwrap_err(), Error::NullPayload);
//! ```

use std::fmt;
use thiserror::Error;

/// All errors that can occur while parsing a compact payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The payload was null or absent.
    #[error("compact payload must not be null")]
    NullPayload,

    /// The payload was not an object, or its `format` discriminator was
    /// missing or not the literal string `"compact"`.
    #[error("invalid compact payload: `format` must be \"compact\"")]
    InvalidFormat,

    /// The `fields` property was missing or not an array of strings.
    #[error("invalid compact payload: `fields` must be an array of strings")]
    InvalidFields,

    /// The `rows` property was missing or not an array.
    #[error("invalid compact payload: `rows` must be an array")]
    InvalidRows,

    /// Custom error with a display message.
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Creates a custom error from a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use compact_rows::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
