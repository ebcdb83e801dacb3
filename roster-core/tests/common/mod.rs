//! Shared wiring for the roster integration tests
#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use roster_core::services::BirthdayWindow;
use roster_core::store::{MemoryBlobStore, MemoryRowStore, StaticAuthProvider};
use roster_core::utils::time::FixedClock;
use roster_core::{AuthContext, Config, MemberMutationService, RosterController, RosterParts};
use serde_json::{Value, json};
use shared::models::{Gender, Identity, MemberCreate};

pub const TABLE: &str = "jemaat";
pub const BIRTHDAY_RPC: &str = "upcoming_birthdays";
pub const PUBLIC_BASE: &str = "https://cdn.gereja.id/photos";

/// Smallest byte string the photo validator recognizes as PNG
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn identity(id: &str) -> Identity {
    Identity {
        id: id.into(),
        email: Some(format!("{id}@gereja.id")),
    }
}

pub fn config() -> Config {
    Config {
        member_table: TABLE.into(),
        birthday_rpc: BIRTHDAY_RPC.into(),
        page_size: 9,
        search_debounce_ms: 300,
        birthday_window_days: 7,
        max_photo_bytes: 5 * 1024 * 1024,
        timezone: "Asia/Jakarta".into(),
        ..Config::default()
    }
}

pub fn member_row(name: &str, phone: Option<&str>, birthday: Option<&str>) -> Value {
    json!({
        "full_name": name,
        "gender": "female",
        "phone": phone,
        "birthday": birthday,
        "age": null,
        "photo": null,
        "is_new": false,
        "is_baptis": true,
    })
}

pub fn new_member(name: &str, phone: Option<&str>) -> MemberCreate {
    MemberCreate {
        full_name: name.into(),
        gender: Some(Gender::Male),
        phone: phone.map(str::to_string),
        birthday: Some("03-01-1990".into()),
        ..Default::default()
    }
}

pub struct Harness {
    pub rows: Arc<MemoryRowStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub provider: Arc<StaticAuthProvider>,
    pub auth: Arc<AuthContext>,
    pub mutations: Arc<MemberMutationService>,
    pub roster: RosterController,
}

impl Harness {
    pub async fn new(provider: StaticAuthProvider, today: NaiveDate) -> Self {
        let config = config();
        let rows = Arc::new(MemoryRowStore::new().with_birthday_rpc(
            BIRTHDAY_RPC,
            TABLE,
            BirthdayWindow::new(config.birthday_window_days),
        ));
        let blobs = Arc::new(MemoryBlobStore::new(PUBLIC_BASE));
        let provider = Arc::new(provider);
        let auth = Arc::new(AuthContext::new(provider.clone()));
        auth.refresh().await.unwrap();

        let parts = RosterParts::from_config(
            &config,
            rows.clone(),
            blobs.clone(),
            auth.clone(),
            Arc::new(FixedClock(today)),
        );
        let mutations = parts.mutations.clone();

        Self {
            rows,
            blobs,
            provider,
            auth,
            mutations,
            roster: RosterController::new(parts),
        }
    }

    pub async fn admin() -> Self {
        Self::new(StaticAuthProvider::admin(identity("admin")), ymd(2024, 6, 1)).await
    }

    /// Seed `count` members named `Member 00`, `Member 01`, ... (oldest first)
    pub fn seed_members(&self, count: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                let row = self
                    .rows
                    .seed(TABLE, member_row(&format!("Member {i:02}"), None, None))
                    .unwrap();
                row["id"].as_str().unwrap().to_string()
            })
            .collect()
    }
}
