//! Media upload pipeline
//!
//! `Stager` writes inbound assets to local disk, `UploadCoordinator` drives one upload
//! through staging, remote puts and the record commit, compensating on failure.

pub mod coordinator;
pub mod stager;
pub mod types;

pub use coordinator::{
    compensation_plan, CompensatingAction, Outcome, UploadCoordinator, UploadJournal, UploadState,
};
pub use stager::Stager;
pub use types::{IncomingAsset, UploadSubmission};
