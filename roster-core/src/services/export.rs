//! Member export projection
//!
//! Produces display-ready rows for members registered within a date range.
//! Writing the spreadsheet itself is left to the caller.

use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;
use shared::backend::RowStore;
use shared::error::{AppError, AppResult};
use shared::models::{Member, NOT_AVAILABLE};

use crate::auth::AuthContext;
use crate::db::repository::member as repo;
use crate::utils::time::{self, parse_storage_date};

/// Column headers, in [`ExportRow`] field order
pub const EXPORT_HEADERS: [&str; 12] = [
    "Nama Lengkap",
    "Jenis Kelamin",
    "Umur",
    "No. Telepon",
    "Alamat",
    "Tanggal Lahir",
    "Status Jemaat",
    "Status Baptis",
    "Status Pernikahan",
    "Foto",
    "Dikunjungi",
    "Hotline",
];

/// One exported member, all values already formatted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub full_name: String,
    pub gender: String,
    pub age: u32,
    pub phone: String,
    pub address: String,
    /// `dd/mm/yyyy`
    pub birthday: String,
    pub member_status: String,
    pub baptism_status: String,
    pub marital_status: String,
    pub photo: String,
    pub visit: String,
    pub hotline: String,
}

fn yes_no(flag: bool) -> String {
    if flag { "Bersedia" } else { "Tidak" }.to_string()
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl ExportRow {
    pub fn from_member(member: &Member) -> Self {
        Self {
            full_name: member.full_name.clone(),
            gender: member.gender.map(|g| g.label()).unwrap_or_default().to_string(),
            age: member.age.unwrap_or(0),
            phone: text(&member.phone),
            address: text(&member.address),
            birthday: member
                .birthday
                .as_deref()
                .and_then(parse_storage_date)
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            member_status: if member.is_new { "Baru" } else { "Lama" }.to_string(),
            baptism_status: if member.is_baptized {
                "Sudah Baptis"
            } else {
                "Belum Baptis"
            }
            .to_string(),
            marital_status: text(&member.marital_status),
            photo: text(&member.photo),
            visit: yes_no(member.ok_dikunjungi),
            hotline: yes_no(member.ok_hotline),
        }
    }

    /// Values in header order
    pub fn cells(&self) -> [String; 12] {
        [
            self.full_name.clone(),
            self.gender.clone(),
            self.age.to_string(),
            self.phone.clone(),
            self.address.clone(),
            self.birthday.clone(),
            self.member_status.clone(),
            self.baptism_status.clone(),
            self.marital_status.clone(),
            self.photo.clone(),
            self.visit.clone(),
            self.hotline.clone(),
        ]
    }
}

pub struct MemberExporter {
    store: Arc<dyn RowStore>,
    table: String,
    auth: Arc<AuthContext>,
    tz: Tz,
}

impl MemberExporter {
    pub fn new(store: Arc<dyn RowStore>, table: impl Into<String>, auth: Arc<AuthContext>, tz: Tz) -> Self {
        Self {
            store,
            table: table.into(),
            auth,
            tz,
        }
    }

    /// Members registered from `start` through `end` (inclusive, local days)
    pub async fn export(&self, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<ExportRow>> {
        self.auth.require_admin()?;
        if start > end {
            return Err(AppError::validation(format!(
                "Start date {} is after end date {}",
                start, end
            ))
            .with_detail("start", start.to_string())
            .with_detail("end", end.to_string()));
        }

        let from = time::day_start(start, self.tz);
        let to = time::day_end(end, self.tz);
        let members = repo::find_created_between(self.store.as_ref(), &self.table, from, to)
            .await
            .map_err(|e| e.into_query_error())?;

        tracing::info!(%start, %end, count = members.len(), "Members exported");
        Ok(members.iter().map(ExportRow::from_member).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Gender;

    fn member() -> Member {
        serde_json::from_value(serde_json::json!({
            "id": "m1",
            "created_at": "2024-05-01T08:30:00Z",
            "full_name": "Yohanes Sitorus",
            "gender": "male",
            "phone": "0811",
            "birthday": "1990-01-03",
            "age": 34,
            "is_new": false,
            "is_baptis": true,
            "ok_dikunjungi": true
        }))
        .unwrap()
    }

    #[test]
    fn test_export_row_labels() {
        let row = ExportRow::from_member(&member());
        assert_eq!(row.gender, Gender::Male.label());
        assert_eq!(row.birthday, "03/01/1990");
        assert_eq!(row.member_status, "Lama");
        assert_eq!(row.baptism_status, "Sudah Baptis");
        assert_eq!(row.visit, "Bersedia");
        assert_eq!(row.hotline, "Tidak");
        assert_eq!(row.address, "");
        assert_eq!(row.cells()[2], "34");
        assert_eq!(row.cells().len(), EXPORT_HEADERS.len());
    }

    #[test]
    fn test_export_row_missing_birthday() {
        let mut m = member();
        m.birthday = None;
        m.age = None;
        let row = ExportRow::from_member(&m);
        assert_eq!(row.birthday, NOT_AVAILABLE);
        assert_eq!(row.age, 0);
    }

    #[test]
    fn test_export_row_without_gender() {
        let mut m = member();
        m.gender = None;
        assert_eq!(ExportRow::from_member(&m).gender, "");
    }
}
