//! Roster module
//!
//! The orchestrating state machine over the member services.
//!
//! ```text
//!  search / change_page / refresh ──► MemberQueryEngine ──┐
//!  create / update / delete ───────► MemberMutationService │
//!                                                          ▼
//!                           RosterState (page, total, status, birthdays)
//!                                                          │
//!                                      BirthdayNotifier ◄──┘
//! ```

pub mod controller;
pub mod debounce;
pub mod state;

pub use controller::{RosterController, RosterParts};
pub use debounce::SearchDebouncer;
pub use state::{LoadOutcome, RosterPage, RosterState, RosterStatus};
