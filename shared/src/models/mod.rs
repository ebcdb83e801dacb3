//! Data models shared between the roster engine and its collaborators

pub mod identity;
pub mod member;
pub mod page;
pub mod serde_helpers;

// Re-exports
pub use identity::{ADMIN_ROLE, AdminRole, Identity};
pub use member::{
    Gender, Member, MemberCreate, MemberInsert, MemberPatch, MemberUpdate, NOT_AVAILABLE,
    PhotoUpload,
};
pub use page::{PaginatedResponse, total_pages};
