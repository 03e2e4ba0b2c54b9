//! Async REST client for the dubhub backend.
//!
//! Covers translation start and status, password and one-time-code
//! login, signup, account updates and wallet top-up.

mod client;
mod error;
pub mod validate;

pub use client::{ApiClient, JobStatusReport, LoginSession, OtpChallenge};
pub use error::ApiError;
