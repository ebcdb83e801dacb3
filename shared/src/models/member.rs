//! Member Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::serde_helpers::{bool_false, flexible_id, flexible_id_opt, lenient_opt};

/// Display value for absent or invalid data
pub const NOT_AVAILABLE: &str = "N/A";

/// Gender (jenis kelamin)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[serde(alias = "Male", alias = "laki-laki", alias = "Laki-laki")]
    Male,
    #[serde(alias = "Female", alias = "perempuan", alias = "Perempuan")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    /// Label used in exports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Male => "Laki-laki",
            Self::Female => "Perempuan",
        }
    }
}

/// Member entity (jemaat)
///
/// `birthday` is kept in store-native ISO form (`YYYY-MM-DD`); `age` is
/// written together with it and is not recomputed on read. Older rows may
/// carry no gender (or an unrecognized one); those read as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub full_name: String,
    #[serde(default, deserialize_with = "lenient_opt")]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default, deserialize_with = "bool_false")]
    pub is_new: bool,
    #[serde(default, rename = "is_baptis", deserialize_with = "bool_false")]
    pub is_baptized: bool,
    #[serde(default)]
    pub marital_status: Option<String>,
    #[serde(default, deserialize_with = "bool_false")]
    pub ok_dikunjungi: bool,
    #[serde(default, deserialize_with = "bool_false")]
    pub ok_hotline: bool,
    #[serde(default, deserialize_with = "flexible_id_opt")]
    pub registered_by: Option<String>,
}

impl Member {
    /// Age for display; `0` and absent both mean unknown
    pub fn display_age(&self) -> String {
        match self.age {
            Some(age) if age > 0 => age.to_string(),
            _ => NOT_AVAILABLE.to_string(),
        }
    }

    /// Prefix under which this member's photo objects are stored
    pub fn owner_key(&self) -> Option<&str> {
        self.phone.as_deref().filter(|p| !p.is_empty())
    }
}

/// Create member payload (form input)
///
/// `birthday` is in display form (`DD-MM-YYYY`, slash or space separators
/// tolerated). `gender` is optional here so a missing value surfaces as a
/// validation error instead of a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberCreate {
    pub full_name: String,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub birthday: Option<String>,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_baptized: bool,
    pub marital_status: Option<String>,
    #[serde(default)]
    pub ok_dikunjungi: bool,
    #[serde(default)]
    pub ok_hotline: bool,
}

/// Update member payload (form input); `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberUpdate {
    pub full_name: Option<String>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub birthday: Option<String>,
    pub is_new: Option<bool>,
    pub is_baptized: Option<bool>,
    pub marital_status: Option<String>,
    pub ok_dikunjungi: Option<bool>,
    pub ok_hotline: Option<bool>,
}

impl MemberUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.gender.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.email.is_none()
            && self.birthday.is_none()
            && self.is_new.is_none()
            && self.is_baptized.is_none()
            && self.marital_status.is_none()
            && self.ok_dikunjungi.is_none()
            && self.ok_hotline.is_none()
    }
}

/// Row written on insert (id and created_at are assigned by the store)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberInsert {
    pub full_name: String,
    pub gender: Gender,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub birthday: Option<String>,
    pub age: Option<u32>,
    pub photo: Option<String>,
    pub is_new: bool,
    #[serde(rename = "is_baptis")]
    pub is_baptized: bool,
    pub marital_status: Option<String>,
    pub ok_dikunjungi: bool,
    pub ok_hotline: bool,
    pub registered_by: Option<String>,
}

/// Partial row written on update; absent fields are not sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
    #[serde(rename = "is_baptis", skip_serializing_if = "Option::is_none")]
    pub is_baptized: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok_dikunjungi: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok_hotline: Option<bool>,
}

/// Photo attached to a create/update request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    /// Original file name, used for the extension
    pub file_name: String,
    pub content: Vec<u8>,
}

impl PhotoUpload {
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }

    /// Lower-cased extension of the original file name
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> serde_json::Value {
        serde_json::json!({
            "id": "7f1c",
            "created_at": "2024-05-01T08:30:00.123456+00:00",
            "full_name": "Maria Siregar",
            "gender": "female",
            "phone": "081234567890",
            "address": null,
            "email": null,
            "birthday": "1990-01-03",
            "age": 34,
            "photo": null,
            "is_new": true,
            "is_baptis": null,
            "marital_status": "Menikah",
            "ok_dikunjungi": true,
            "ok_hotline": null,
            "registered_by": "u-1"
        })
    }

    #[test]
    fn test_member_from_row() {
        let member: Member = serde_json::from_value(sample_row()).unwrap();
        assert_eq!(member.full_name, "Maria Siregar");
        assert_eq!(member.gender, Some(Gender::Female));
        assert!(member.is_new);
        assert!(!member.is_baptized);
        assert!(!member.ok_hotline);
        assert_eq!(member.owner_key(), Some("081234567890"));
        assert_eq!(member.display_age(), "34");
    }

    #[test]
    fn test_member_rejects_missing_name() {
        let mut row = sample_row();
        row.as_object_mut().unwrap().remove("full_name");
        assert!(serde_json::from_value::<Member>(row).is_err());
    }

    #[test]
    fn test_display_age_sentinel() {
        let mut member: Member = serde_json::from_value(sample_row()).unwrap();
        member.age = Some(0);
        assert_eq!(member.display_age(), NOT_AVAILABLE);
        member.age = None;
        assert_eq!(member.display_age(), NOT_AVAILABLE);
    }

    #[test]
    fn test_gender_aliases() {
        let g: Gender = serde_json::from_str("\"Laki-laki\"").unwrap();
        assert_eq!(g, Gender::Male);
        let g: Gender = serde_json::from_str("\"perempuan\"").unwrap();
        assert_eq!(g, Gender::Female);
        assert!(serde_json::from_str::<Gender>("\"x\"").is_err());
    }

    #[test]
    fn test_legacy_gender_reads_as_none() {
        let mut row = sample_row();
        row["gender"] = serde_json::Value::Null;
        let member: Member = serde_json::from_value(row.clone()).unwrap();
        assert_eq!(member.gender, None);

        row["gender"] = serde_json::json!("unknown");
        let member: Member = serde_json::from_value(row.clone()).unwrap();
        assert_eq!(member.gender, None);

        row.as_object_mut().unwrap().remove("gender");
        let member: Member = serde_json::from_value(row).unwrap();
        assert_eq!(member.gender, None);
    }

    #[test]
    fn test_patch_skips_absent_fields() {
        let patch = MemberPatch {
            full_name: Some("Budi".into()),
            is_baptized: Some(true),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["is_baptis"], true);
    }

    #[test]
    fn test_photo_extension() {
        assert_eq!(PhotoUpload::new("Me.JPG", vec![]).extension().as_deref(), Some("jpg"));
        assert_eq!(PhotoUpload::new("noext", vec![]).extension(), None);
    }
}
