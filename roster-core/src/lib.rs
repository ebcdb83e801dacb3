//! Roster Core - church member roster engine
//!
//! # Overview
//!
//! Keeps a paginated, searchable view of the member table (jemaat) in
//! sync with a hosted backend, applies create/update/delete with their
//! photo side effects, and derives upcoming birthdays and exports.
//!
//! # Module layout
//!
//! ```text
//! roster-core/src/
//! ├── core/          # configuration
//! ├── auth/          # session context and role checks
//! ├── db/            # member repository over the row store
//! ├── services/      # query, mutation, photo, birthday, export
//! ├── roster/        # roster controller and state
//! ├── store/         # in-process collaborators (memory, filesystem)
//! └── utils/         # dates, logging
//! ```
//!
//! The backend itself is reached through the collaborator traits in
//! `shared::backend`; `roster-client` implements them over HTTP.

pub mod auth;
pub mod core;
pub mod db;
pub mod roster;
pub mod services;
pub mod store;
pub mod utils;

// Re-export public types
pub use auth::{AuthContext, Session};
pub use core::Config;
pub use roster::{LoadOutcome, RosterController, RosterParts, RosterState, RosterStatus};
pub use services::{
    BirthdayNotifier, MemberExporter, MemberMutationService, MemberQueryEngine, PhotoAssetManager,
};
pub use utils::{AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
