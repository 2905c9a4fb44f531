//! Conversation state machine
//!
//! Pure transitions in the Elm Architecture style: the engine receives the
//! current session and an event, and returns the next session together
//! with the ordered actions to perform. It never touches storage or the
//! network.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Action;
pub use event::{Event, InboundEvent};
pub use state::{Session, Stage, UserId};
pub use transition::{transition, Outcome, TransitionResult};
