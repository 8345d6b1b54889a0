//! Deletion of remote assets that no record references

mod service;

pub use service::{ReconciliationService, SweepReport};
