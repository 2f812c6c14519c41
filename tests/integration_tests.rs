//! Integration tests for simplexml
//!
//! These tests drive the public API end to end: loading, navigation,
//! namespaces, path queries and output.

mod fixtures;
mod namespaces;
mod navigation;
mod output;
mod xpath;
