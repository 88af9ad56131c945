//! Chart-driven decomposition of JSON documents into tables
//!
//! The driver validates the chart, decomposes nested types depth-first,
//! synthesizes one component table per declared field-group, overlays each
//! with a layer, aggregates the layers into a cake, and mirrors the whole
//! walk into schema rows. Resolution of property items (paths and reference
//! tokens) lives in `resolve`; the mutually recursive component and schema
//! synthesizers in `component` and `schema`.

pub mod driver;
pub mod validate;

pub(crate) mod component;
pub(crate) mod resolve;
pub(crate) mod schema;

pub use driver::from_json;
pub use validate::validate;
