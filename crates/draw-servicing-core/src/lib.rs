//! Computational core for construction-loan draw servicing.
//!
//! The engine (risk scoring, amortization, payment application) and the
//! assistant dispatcher are pure and synchronous. Storage and model access
//! only happen through the traits in [`ports`] and [`assistant::session`].

pub mod error;
pub mod ports;
pub mod time_value;
pub mod types;

#[cfg(feature = "risk")]
pub mod risk;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "assistant")]
pub mod assistant;

#[cfg(feature = "servicing")]
pub mod servicing;

pub use error::DrawServicingError;
pub use types::*;

/// Standard result type for all draw-servicing operations
pub type DrawServicingResult<T> = Result<T, DrawServicingError>;
