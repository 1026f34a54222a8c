//! Security utilities.
//!
//! - Credential scrubbing so SAS tokens never reach logs or traces

pub mod credential_scrubber;

pub use credential_scrubber::{display_container, scrub_credentials};
