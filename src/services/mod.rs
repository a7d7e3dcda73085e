//! Gateway services

pub mod access;

pub use access::{AccessOutcome, AccessRequest, MediaAccessService};
