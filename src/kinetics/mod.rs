//! Rate-law library.
//!
//! - [`enzyme`]: generic saturation and repression laws
//! - [`rates`]: the model's individual fluxes built from them
//! - [`stress`]: time profile of the ACS stress multiplier

pub mod enzyme;
pub mod rates;
pub mod stress;

pub use enzyme::{hill_inhibition, hill_repression, michaelis_menten, monod};
pub use stress::StressProfile;
