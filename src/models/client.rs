use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::warn;

use super::Document;

pub const GENDERS: [&str; 3] = ["Male", "Female", "Other"];
pub const MARITAL_STATUSES: [&str; 2] = ["Married", "Unmarried"];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(remote = "Self", default, rename_all = "camelCase")]
pub struct Client {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub client_name: String,
    pub surname: String,
    pub contact: String,
    pub email: String,
    pub gender: String,
    #[serde(deserialize_with = "lenient_date")]
    pub dob: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_u32")]
    pub age: Option<u32>,
    pub nationality: String,
    pub marital_status: String,
    pub education: String,
    pub occupation: String,

    pub father_name: String,
    pub father_surname: String,
    pub father_phone: String,
    pub father_email: String,
    pub mother_name: String,
    pub mother_surname: String,
    pub mother_phone: String,
    pub mother_email: String,
    pub spouse_name: String,
    pub spouse_surname: String,
    pub spouse_phone: String,
    pub spouse_email: String,

    pub address: String,
    #[serde(deserialize_with = "lenient_string")]
    pub family_members: String,

    pub aadhaar_number: String,
    pub pan_number: String,
    pub passport_number: String,
    pub license_number: String,
    pub voter_id_number: String,

    pub photo: Option<String>,
    #[serde(deserialize_with = "known_documents")]
    pub documents: Vec<Document>,
    pub created_at: Option<String>,
}

impl Client {
    pub fn is_married(&self) -> bool {
        self.marital_status.eq_ignore_ascii_case("married")
    }

    /// Name used in listings, report footers and file names.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.client_name.trim(), self.surname.trim());
        let full = full.trim();
        if full.is_empty() {
            "Unnamed client".to_string()
        } else {
            full.to_string()
        }
    }
}

/// Older records spell these fields differently.
const LEGACY_KEYS: [(&str, &str); 2] = [("phone", "contact"), ("Nationality", "nationality")];

impl<'de> Deserialize<'de> for Client {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut map = Map::<String, Value>::deserialize(deserializer)?;
        // null means "not set"; let the defaults apply
        map.retain(|_, v| !v.is_null());
        for (legacy, current) in LEGACY_KEYS {
            if let Some(value) = map.remove(legacy) {
                let unset = map.get(current).is_none_or(|v| v.as_str() == Some(""));
                if unset {
                    map.insert(current.to_string(), value);
                }
            }
        }
        Client::deserialize(Value::Object(map)).map_err(D::Error::custom)
    }
}

/// Documents whose type this desk does not know are dropped, not fatal.
fn known_documents<'de, D>(deserializer: D) -> Result<Vec<Document>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Document>(entry) {
            Ok(document) => Some(document),
            Err(e) => {
                warn!(error = %e, "skipping unrecognised document");
                None
            }
        })
        .collect())
}

/// Accepts `"2000-06-15"`, a full ISO timestamp, an empty string or null.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let s = s.trim();
        let day = s.get(..10).unwrap_or(s);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

/// Form backends echo numbers back as strings; accept either.
fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<NumberOrString> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(NumberOrString::Number(n)) if n >= 0.0 => Some(n as u32),
        Some(NumberOrString::Text(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<NumberOrString> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(NumberOrString::Number(n)) => format!("{}", n),
        Some(NumberOrString::Text(s)) => s,
        None => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentType;

    #[test]
    fn parses_backend_record_with_loose_types() {
        let json = r#"{
            "_id": "65f0c1",
            "clientName": "Asha",
            "surname": "Verma",
            "phone": "9876543210",
            "dob": "2000-06-15T00:00:00.000Z",
            "age": "24",
            "Nationality": "Indian",
            "familyMembers": 4,
            "photo": "https://cdn.example.com/asha.jpg",
            "documents": [{"documentType": "aadhaarFront", "imageUrl": "https://cdn.example.com/a.jpg"}],
            "__v": 0
        }"#;
        let client: Client = serde_json::from_str(json).unwrap();
        assert_eq!(client.id.as_deref(), Some("65f0c1"));
        assert_eq!(client.contact, "9876543210");
        assert_eq!(client.dob, NaiveDate::from_ymd_opt(2000, 6, 15));
        assert_eq!(client.age, Some(24));
        assert_eq!(client.nationality, "Indian");
        assert_eq!(client.family_members, "4");
        assert_eq!(client.documents[0].document_type, DocumentType::AadhaarFront);
        assert_eq!(client.display_name(), "Asha Verma");
    }

    #[test]
    fn null_strings_decode_as_empty() {
        let json = r#"{"clientName": "Asha", "education": null, "spouseName": null, "photo": null, "documents": null}"#;
        let client: Client = serde_json::from_str(json).unwrap();
        assert_eq!(client.client_name, "Asha");
        assert_eq!(client.education, "");
        assert_eq!(client.spouse_name, "");
        assert_eq!(client.photo, None);
        assert!(client.documents.is_empty());
    }

    #[test]
    fn unknown_document_types_are_skipped() {
        let json = r#"{"documents": [
            {"documentType": "biometric", "imageUrl": "https://cdn/b.jpg"},
            {"documentType": "panFront", "imageUrl": "https://cdn/p.jpg"},
            {"imageUrl": "https://cdn/x.jpg"}
        ]}"#;
        let client: Client = serde_json::from_str(json).unwrap();
        assert_eq!(client.documents.len(), 1);
        assert_eq!(client.documents[0].document_type, DocumentType::PanFront);
    }

    #[test]
    fn legacy_and_current_keys_can_coexist() {
        let json = r#"{"phone": "1112223333", "contact": "9876543210", "Nationality": "Indian", "nationality": ""}"#;
        let client: Client = serde_json::from_str(json).unwrap();
        assert_eq!(client.contact, "9876543210");
        assert_eq!(client.nationality, "Indian");
    }

    #[test]
    fn missing_and_null_fields_fall_back_to_defaults() {
        let client: Client = serde_json::from_str(r#"{"dob": null, "age": null, "email": "a@b.co"}"#).unwrap();
        assert_eq!(client.dob, None);
        assert_eq!(client.age, None);
        assert!(client.documents.is_empty());
        assert_eq!(client.display_name(), "Unnamed client");
    }
}
