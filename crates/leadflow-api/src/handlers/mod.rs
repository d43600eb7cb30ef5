//! HTTP request handlers.
//!
//! Client-facing bodies follow one envelope: `success`, `message`, and
//! either `data`, `errors` or an error `code` from the `E1001`-`E3002`
//! taxonomy. Internal failure detail never reaches a response body.

pub mod health;
pub mod info;
pub mod leads;

pub use health::{health_check, liveness_check, readiness_check};
pub use info::api_info;
pub use leads::create_lead;
