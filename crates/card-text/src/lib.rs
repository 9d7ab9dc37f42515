//! Card Text - plain text helpers shared by the translator and the layout engine
//!
//! This crate provides:
//! - Locale tolerant decimal parsing (`1.5` and `1,5` are the same number)
//! - Numeric format strings (`0.00`, `#,##0`, `000`)
//! - Zero padding for counters
//! - Word / space / newline segmentation of literal text
//!
//! # Example
//!
//! ```
//! use card_text::{format_number, parse_decimal, zero_pad};
//!
//! assert_eq!(parse_decimal("2,5").unwrap(), 2.5);
//! assert_eq!(format_number("#,##0.00", 1234.5), "1,234.50");
//! assert_eq!(zero_pad(510, 8), "00000510");
//! ```

mod number;
mod segment;

pub use number::{format_number, format_plain, parse_decimal, parse_integer, zero_pad};
pub use segment::{segment_text, Segment};

use thiserror::Error;

/// Errors that can occur while interpreting numeric text
#[derive(Debug, Error, PartialEq)]
pub enum TextError {
    #[error("Not a number: {0:?}")]
    InvalidNumber(String),

    #[error("Not an integer: {0:?}")]
    InvalidInteger(String),
}

/// Result type for text operations
pub type Result<T> = std::result::Result<T, TextError>;
