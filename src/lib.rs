//! SGQ: non-conformance (RNC) toolkit
//!
//! Imports RNC spreadsheets in either the single-record form layout or the
//! tabular layout, normalizes them into [`RncRecord`]s, keeps the working set
//! in a document store with a local JSON cache as fallback, and computes the
//! quality dashboard views.
//!
//! [`RncRecord`]: entities::rnc::RncRecord

pub mod analytics;
pub mod cli;
pub mod core;
pub mod entities;
pub mod import;
pub mod logging;
pub mod store;
