//! Utility functions for NoteSpace Core
//!
//! This module provides common utility functions used across the codebase.

pub mod date_format;

pub use date_format::{format_timestamp, DateFormatOptions, DateStyle, DisplayLocale};
