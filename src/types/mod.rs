//! Value types
//!
//! This module defines the values accepted by field and index setters.

pub mod value;

pub use value::XmlValue;
