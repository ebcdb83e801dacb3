//! Per-member mutation serialization
//!
//! At most one update/delete per member id is in flight. A second attempt
//! is rejected with `MemberBusy` rather than queued.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shared::error::{AppError, AppResult};

#[derive(Clone, Default)]
pub struct MutationGuard {
    in_flight: Arc<DashMap<String, ()>>,
}

impl MutationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id`; the claim is released when the permit is dropped
    pub fn acquire(&self, id: &str) -> AppResult<MutationPermit> {
        match self.in_flight.entry(id.to_string()) {
            Entry::Occupied(_) => {
                tracing::debug!(member_id = %id, "Mutation rejected, member busy");
                Err(AppError::member_busy(id))
            }
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(MutationPermit {
                    id: id.to_string(),
                    in_flight: self.in_flight.clone(),
                })
            }
        }
    }

    pub fn is_busy(&self, id: &str) -> bool {
        self.in_flight.contains_key(id)
    }
}

/// Claim on one member id
pub struct MutationPermit {
    id: String,
    in_flight: Arc<DashMap<String, ()>>,
}

impl Drop for MutationPermit {
    fn drop(&mut self) {
        self.in_flight.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[test]
    fn test_second_claim_is_rejected_until_release() {
        let guard = MutationGuard::new();
        let permit = guard.acquire("m1").unwrap();
        assert!(guard.is_busy("m1"));

        let err = guard.acquire("m1").err().unwrap();
        assert_eq!(err.code, ErrorCode::MemberBusy);
        // other members are independent
        assert!(guard.acquire("m2").is_ok());

        drop(permit);
        assert!(!guard.is_busy("m1"));
        assert!(guard.acquire("m1").is_ok());
    }
}
