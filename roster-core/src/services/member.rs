//! Member Mutation Service
//!
//! Create / update / delete across two stores with no shared transaction.
//! Step ordering per operation:
//!
//! ```text
//! create:  validate → upload photo → insert row
//! update:  validate → load row → delete old photo → upload new → patch row
//! delete:  load row → delete owner's photos → delete row
//! ```
//!
//! Accepted inconsistencies: a failed insert orphans the uploaded photo
//! (logged with its URL); a failed row delete after the photo was removed
//! is reported as `MemberDeleteIncomplete` (warning severity).

use std::sync::Arc;

use shared::backend::RowStore;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Member, MemberCreate, MemberInsert, MemberPatch, MemberUpdate, PhotoUpload};
use shared::util::non_empty;

use super::guard::MutationGuard;
use super::photo::PhotoAssetManager;
use crate::auth::AuthContext;
use crate::db::repository::member as repo;
use crate::utils::time::{self, Clock};

/// Birth date in storage form plus the age derived from it
struct BirthFields {
    birthday: String,
    age: u32,
}

pub struct MemberMutationService {
    store: Arc<dyn RowStore>,
    table: String,
    photos: PhotoAssetManager,
    auth: Arc<AuthContext>,
    clock: Arc<dyn Clock>,
    guard: MutationGuard,
}

impl MemberMutationService {
    pub fn new(
        store: Arc<dyn RowStore>,
        table: impl Into<String>,
        photos: PhotoAssetManager,
        auth: Arc<AuthContext>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            table: table.into(),
            photos,
            auth,
            clock,
            guard: MutationGuard::new(),
        }
    }

    pub fn photos(&self) -> &PhotoAssetManager {
        &self.photos
    }

    /// Whether an update/delete of `id` is in flight
    pub fn is_busy(&self, id: &str) -> bool {
        self.guard.is_busy(id)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    fn validate_name(name: &str) -> AppResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::required("full_name"));
        }
        Ok(name.to_string())
    }

    /// Digits only; empty means absent
    fn validate_phone(phone: Option<String>) -> AppResult<Option<String>> {
        match non_empty(phone) {
            Some(p) if !p.chars().all(|c| c.is_ascii_digit()) => {
                Err(AppError::new(ErrorCode::InvalidPhone).with_detail("phone", p))
            }
            other => Ok(other),
        }
    }

    fn birth_fields(&self, display: Option<String>) -> AppResult<Option<BirthFields>> {
        let Some(display) = non_empty(display) else {
            return Ok(None);
        };
        let birthday = time::to_storage_format(&display)?;
        let age = time::parse_storage_date(&birthday)
            .map(|birth| time::age_on(birth, self.clock.today()))
            .unwrap_or(0);
        Ok(Some(BirthFields { birthday, age }))
    }

    fn to_insert(&self, data: MemberCreate, registered_by: String) -> AppResult<MemberInsert> {
        let full_name = Self::validate_name(&data.full_name)?;
        let gender = data.gender.ok_or_else(|| AppError::required("gender"))?;
        let phone = Self::validate_phone(data.phone)?;
        let birth = self.birth_fields(data.birthday)?;

        Ok(MemberInsert {
            full_name,
            gender,
            phone,
            address: non_empty(data.address),
            email: non_empty(data.email),
            birthday: birth.as_ref().map(|b| b.birthday.clone()),
            age: birth.map(|b| b.age),
            photo: None,
            is_new: data.is_new,
            is_baptized: data.is_baptized,
            marital_status: non_empty(data.marital_status),
            ok_dikunjungi: data.ok_dikunjungi,
            ok_hotline: data.ok_hotline,
            registered_by: Some(registered_by),
        })
    }

    /// Empty text fields in an update leave the stored value unchanged
    fn to_patch(&self, data: MemberUpdate, existing: &Member) -> AppResult<MemberPatch> {
        let full_name = match data.full_name {
            Some(name) => Some(Self::validate_name(&name)?),
            None => None,
        };
        let phone = Self::validate_phone(data.phone)?;

        let mut patch = MemberPatch {
            full_name,
            gender: data.gender,
            phone,
            address: non_empty(data.address),
            email: non_empty(data.email),
            is_new: data.is_new,
            is_baptized: data.is_baptized,
            marital_status: non_empty(data.marital_status),
            ok_dikunjungi: data.ok_dikunjungi,
            ok_hotline: data.ok_hotline,
            ..Default::default()
        };

        if let Some(birth) = self.birth_fields(data.birthday)? {
            // age is only rewritten together with a changed birth date
            if existing.birthday.as_deref() != Some(birth.birthday.as_str()) || existing.age.is_none() {
                patch.birthday = Some(birth.birthday);
                patch.age = Some(birth.age);
            }
        }
        Ok(patch)
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Create a member; the photo (if any) is uploaded before the row exists
    pub async fn create(&self, data: MemberCreate, photo: Option<PhotoUpload>) -> AppResult<Member> {
        let user = self.auth.require_user()?;
        let mut insert = self.to_insert(data, user.id)?;

        if let Some(photo) = &photo {
            let url = self.photos.upload(photo, insert.phone.as_deref()).await?;
            insert.photo = Some(url);
        }

        match repo::create(self.store.as_ref(), &self.table, &insert).await {
            Ok(member) => {
                tracing::info!(member_id = %member.id, name = %member.full_name, "Member created");
                Ok(member)
            }
            Err(e) => {
                if let Some(url) = &insert.photo {
                    tracing::warn!(url = %url, error = %e, "Member insert failed, photo orphaned");
                }
                Err(e.into_persistence_error())
            }
        }
    }

    /// Update a member; a new photo replaces the old one
    pub async fn update(
        &self,
        id: &str,
        data: MemberUpdate,
        photo: Option<PhotoUpload>,
    ) -> AppResult<Member> {
        self.auth.require_admin()?;
        let _permit = self.guard.acquire(id)?;

        // reject a bad photo before anything is touched
        if let Some(photo) = &photo {
            self.photos.validate(photo)?;
        }

        let existing = repo::find_by_id(self.store.as_ref(), &self.table, id)
            .await
            .map_err(|e| e.into_query_error())?
            .ok_or_else(|| AppError::member_not_found(id))?;

        if data.is_empty() && photo.is_none() {
            return Ok(existing);
        }

        let mut patch = self.to_patch(data, &existing)?;

        if let Some(photo) = &photo {
            // the old object must be gone before the upload so the store
            // never serves a cached object at a reused key
            if let Some(old_url) = &existing.photo {
                self.photos.delete_by_url(old_url).await;
            }
            let owner = patch.phone.as_deref().or(existing.owner_key());
            match self.photos.upload(photo, owner).await {
                Ok(url) => patch.photo = Some(url),
                Err(e) => {
                    if let Some(old_url) = &existing.photo {
                        tracing::warn!(
                            member_id = %id,
                            url = %old_url,
                            "Photo replace failed, record still references the removed photo"
                        );
                    }
                    return Err(e);
                }
            }
        }

        match repo::update(self.store.as_ref(), &self.table, id, &patch).await {
            Ok(member) => {
                tracing::info!(member_id = %id, photo_replaced = photo.is_some(), "Member updated");
                Ok(member)
            }
            Err(e) => {
                if let Some(url) = &patch.photo {
                    tracing::warn!(member_id = %id, url = %url, error = %e, "Member update failed, photo orphaned");
                }
                Err(e.into_persistence_error())
            }
        }
    }

    /// Delete a member and reclaim its photos
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.auth.require_admin()?;
        let _permit = self.guard.acquire(id)?;

        let existing = repo::find_by_id(self.store.as_ref(), &self.table, id)
            .await
            .map_err(|e| e.into_query_error())?
            .ok_or_else(|| AppError::member_not_found(id))?;

        let mut photo_removed = false;
        if let Some(url) = &existing.photo {
            match existing.owner_key() {
                Some(owner) => {
                    photo_removed = self.photos.delete_by_owner_key(owner).await > 0;
                    // photo stored under a former phone number
                    if !PhotoAssetManager::is_owned_by(url, owner) {
                        photo_removed |= self.photos.delete_by_url(url).await;
                    }
                }
                None => photo_removed = self.photos.delete_by_url(url).await,
            }
        }

        match repo::delete(self.store.as_ref(), &self.table, id).await {
            Ok(true) => {
                tracing::info!(member_id = %id, photo_removed, "Member deleted");
                Ok(())
            }
            Ok(false) => Err(AppError::member_not_found(id)),
            Err(e) if photo_removed => {
                tracing::warn!(member_id = %id, error = %e, "Member photo removed but row delete failed");
                Err(AppError::new(ErrorCode::MemberDeleteIncomplete)
                    .with_detail("member_id", id)
                    .with_detail("photo_removed", true)
                    .with_detail("cause", e.to_string()))
            }
            Err(e) => Err(e.into_persistence_error()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{MemoryBlobStore, MemoryRowStore, StaticAuthProvider};
    use crate::utils::time::FixedClock;
    use chrono::NaiveDate;
    use shared::models::Identity;

    fn service() -> MemberMutationService {
        let auth = AuthContext::new(Arc::new(StaticAuthProvider::admin(Identity {
            id: "admin".into(),
            email: None,
        })));
        MemberMutationService::new(
            Arc::new(MemoryRowStore::new()),
            "jemaat",
            PhotoAssetManager::new(Arc::new(MemoryBlobStore::new("http://blobs"))),
            Arc::new(auth),
            Arc::new(FixedClock(NaiveDate::from_ymd_opt(2023, 3, 1).unwrap())),
        )
    }

    #[test]
    fn test_validate_phone() {
        assert_eq!(MemberMutationService::validate_phone(None).unwrap(), None);
        assert_eq!(MemberMutationService::validate_phone(Some("  ".into())).unwrap(), None);
        assert_eq!(
            MemberMutationService::validate_phone(Some("0812".into())).unwrap().as_deref(),
            Some("0812")
        );
        let err = MemberMutationService::validate_phone(Some("+62 812".into())).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPhone);
    }

    #[test]
    fn test_birth_fields() {
        let svc = service();
        assert!(svc.birth_fields(None).unwrap().is_none());

        let birth = svc.birth_fields(Some("29-02-2000".into())).unwrap().unwrap();
        assert_eq!(birth.birthday, "2000-02-29");
        // anniversary observed on 1 March in common years
        assert_eq!(birth.age, 23);

        let err = svc.birth_fields(Some("29-02-2001".into())).err().unwrap();
        assert_eq!(err.code, ErrorCode::InvalidBirthDate);
    }

    #[test]
    fn test_patch_keeps_age_for_unchanged_birthday() {
        let svc = service();
        let existing: Member = serde_json::from_value(serde_json::json!({
            "id": "m1",
            "created_at": "2024-05-01T08:30:00Z",
            "full_name": "Rut",
            "gender": "female",
            "birthday": "2000-02-29",
            "age": 22,
        }))
        .unwrap();

        let same = MemberUpdate {
            birthday: Some("29/02/2000".into()),
            full_name: Some(" Rut T. ".into()),
            ..Default::default()
        };
        let patch = svc.to_patch(same, &existing).unwrap();
        assert_eq!(patch.full_name.as_deref(), Some("Rut T."));
        assert!(patch.birthday.is_none());
        assert!(patch.age.is_none());

        let unpadded = MemberUpdate {
            birthday: Some("2000-2-29".into()),
            ..Default::default()
        };
        let patch = svc.to_patch(unpadded, &existing).unwrap();
        assert!(patch.birthday.is_none());

        let changed = MemberUpdate {
            birthday: Some("01-03-2000".into()),
            ..Default::default()
        };
        let patch = svc.to_patch(changed, &existing).unwrap();
        assert_eq!(patch.birthday.as_deref(), Some("2000-03-01"));
        assert_eq!(patch.age, Some(23));
    }
}
