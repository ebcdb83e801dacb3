//! Services
//!
//! - [`MemberQueryEngine`] - paginated, searchable member reads
//! - [`PhotoAssetManager`] - photo upload and cleanup
//! - [`MemberMutationService`] - create / update / delete across row and blob stores
//! - [`BirthdayNotifier`] - rolling birthday window
//! - [`MemberExporter`] - admin export projection

pub mod birthday;
pub mod export;
pub mod guard;
pub mod member;
pub mod photo;
pub mod query;

pub use birthday::{BirthdayNotifier, BirthdayWindow};
pub use export::{EXPORT_HEADERS, ExportRow, MemberExporter};
pub use guard::{MutationGuard, MutationPermit};
pub use member::MemberMutationService;
pub use photo::PhotoAssetManager;
pub use query::MemberQueryEngine;
