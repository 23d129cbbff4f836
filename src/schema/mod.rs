//! Patient report schema
//!
//! This module defines the flat JSON shape of patient records and the adapter
//! that turns a report (or any JSON object keyed by modality) into a typed
//! [`Reading`](crate::types::Reading).

mod adapter;
mod report;

pub use adapter::*;
pub use report::*;
