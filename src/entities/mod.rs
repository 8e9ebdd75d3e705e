//! Entity type definitions

pub mod rnc;

pub use rnc::{RncRecord, RncStatus, RncType};
