//! Runtime glue around the state machine
//!
//! For each inbound event: take the user's exclusion token, load the
//! session, run the pure transition, persist the result, and optionally
//! perform the resulting actions, all before the token is released.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{Dispatcher, RuntimeError, SweepStats};
pub use traits::*;
