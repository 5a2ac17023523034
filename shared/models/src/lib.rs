//! # Care Planner Domain Models
//!
//! Types shared by the report pipeline, the knowledge store and the HTTP API.
//!
//! ## Key Models
//!
//! - **PatientDetails** / **ClinicalSummary**: fields pulled out of a report
//! - **HospitalInfo**: the treating hospital and its pricing tier
//! - **Plan**: treatment sections, cost estimate and appointment recommendation
//! - **HospitalListing**: registry entry for referral suggestions
//!
//! Every extracted field is either a captured value or the configured
//! missing-value sentinel ([`NOT_MENTIONED`] by default).

pub mod hospital;
pub mod patient;
pub mod plan;
pub mod report;


pub use hospital::*;
pub use patient::*;
pub use plan::*;
pub use report::*;
