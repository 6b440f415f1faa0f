//! Load dispatch domain models
//!
//! Loads, their status lifecycle, and the rules that advance a load from
//! geofence crossings.

pub mod load;
pub mod matching;
pub mod state_machine;

pub use load::{LoadStatus, TrackedLoad};
pub use matching::{LocationMatcher, SubstringMatcher};
pub use state_machine::{LoadStateMachine, StatusChange};
