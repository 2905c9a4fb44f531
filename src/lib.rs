//! Quizgate - a scripted conversational gate
//!
//! Users restart a short quiz, pass one or more secret-phrase gates, and
//! receive a payload at the end. The conversation logic is a pure state
//! machine; everything with side effects sits behind the store and
//! messenger traits.

pub mod classifier;
pub mod config;
pub mod console;
pub mod guard;
pub mod normalize;
pub mod runtime;
pub mod script;
pub mod state_machine;
pub mod store;
