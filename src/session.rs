use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::capture::CapturedImage;
use crate::models::{Client, ClientField, DocumentType};
use crate::validation::{ValidationErrors, compute_age, live_field_error, normalize_phone, validate_client};

/// The photo a draft will be saved with.
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoState {
    None,
    /// Already stored on the backend; not re-uploaded.
    Existing(String),
    /// Taken or picked during this session; uploaded on save.
    Captured(CapturedImage),
}

/// What a document slot currently holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DocumentSlot<'a> {
    Stored(&'a str),
    Pending(&'a CapturedImage),
}

/// One entry of the `documents` JSON part.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DocumentDescriptor {
    #[serde(rename_all = "camelCase")]
    Upload { document_type: DocumentType, upload_index: usize },
    #[serde(rename_all = "camelCase")]
    Stored { document_type: DocumentType, image_url: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveTarget {
    Create,
    Update(String),
}

/// Everything needed to build the multipart body of a create or update.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientUpload {
    pub target: SaveTarget,
    pub fields: Vec<(&'static str, String)>,
    pub photo: Option<CapturedImage>,
    pub document_files: Vec<CapturedImage>,
    pub document_descriptors: Vec<DocumentDescriptor>,
}

/// Single-owner edit draft. Discarded on cancel; turned into a [`ClientUpload`] on save.
#[derive(Debug, Clone)]
pub struct EditSession {
    target: SaveTarget,
    draft: Client,
    photo: PhotoState,
    stored_documents: BTreeMap<DocumentType, String>,
    pending_documents: BTreeMap<DocumentType, CapturedImage>,
    errors: ValidationErrors,
}

impl EditSession {
    pub fn new_client() -> Self {
        Self {
            target: SaveTarget::Create,
            draft: Client::default(),
            photo: PhotoState::None,
            stored_documents: BTreeMap::new(),
            pending_documents: BTreeMap::new(),
            errors: ValidationErrors::default(),
        }
    }

    /// Start editing a persisted record. A record without an id is treated as new.
    pub fn edit(client: &Client) -> Self {
        let target = match &client.id {
            Some(id) => SaveTarget::Update(id.clone()),
            None => SaveTarget::Create,
        };
        let photo = match client.photo.as_deref().filter(|p| !p.is_empty()) {
            Some(url) => PhotoState::Existing(url.to_string()),
            None => PhotoState::None,
        };
        let mut stored_documents = BTreeMap::new();
        for doc in &client.documents {
            if let Some(url) = doc.image_url.as_deref().filter(|u| !u.is_empty()) {
                stored_documents.entry(doc.document_type).or_insert_with(|| url.to_string());
            }
        }
        Self {
            target,
            draft: client.clone(),
            photo,
            stored_documents,
            pending_documents: BTreeMap::new(),
            errors: ValidationErrors::default(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.target == SaveTarget::Create
    }

    pub fn client(&self) -> &Client {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn photo(&self) -> &PhotoState {
        &self.photo
    }

    pub fn has_photo(&self) -> bool {
        self.photo != PhotoState::None
    }

    /// Apply a keystroke-level edit. Phones keep digits only; `dob` re-derives `age`;
    /// `age` is only editable while no `dob` is set.
    pub fn set_field(&mut self, field: ClientField, value: &str, today: NaiveDate) {
        match field {
            ClientField::Dob => {
                let dob = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok();
                self.set_dob(dob, today);
            }
            ClientField::Age => {
                if self.draft.dob.is_none() {
                    self.draft.age = value.trim().parse().ok();
                }
            }
            _ => {
                let value = if field.is_phone() { normalize_phone(value) } else { value.to_string() };
                match live_field_error(field, &value) {
                    Some(msg) => self.errors.insert(field.key(), msg),
                    None => self.errors.clear(field.key()),
                }
                if let Some(slot) = field.text_mut(&mut self.draft) {
                    *slot = value;
                }
            }
        }
    }

    pub fn set_dob(&mut self, dob: Option<NaiveDate>, today: NaiveDate) {
        self.draft.dob = dob;
        if let Some(dob) = dob {
            self.draft.age = compute_age(dob, today);
            debug!(%dob, age = ?self.draft.age, "derived age");
        }
    }

    /// Record a problem found outside field editing, e.g. a rejected upload.
    pub fn flag(&mut self, key: &'static str, message: impl Into<String>) {
        self.errors.insert(key, message);
    }

    pub fn capture_photo(&mut self, image: CapturedImage) {
        self.errors.clear("photo");
        self.photo = PhotoState::Captured(image);
    }

    /// Drop a photo captured this session, falling back to the stored one.
    pub fn discard_photo(&mut self) {
        self.photo = match self.draft.photo.as_deref().filter(|p| !p.is_empty()) {
            Some(url) => PhotoState::Existing(url.to_string()),
            None => PhotoState::None,
        };
    }

    /// Recapturing a type replaces whatever it held.
    pub fn capture_document(&mut self, document_type: DocumentType, image: CapturedImage) {
        self.errors.clear(document_type.key());
        self.pending_documents.insert(document_type, image);
    }

    /// Removed documents are left out of the next save, which deletes them server-side.
    pub fn remove_document(&mut self, document_type: DocumentType) {
        self.pending_documents.remove(&document_type);
        self.stored_documents.remove(&document_type);
    }

    pub fn document(&self, document_type: DocumentType) -> Option<DocumentSlot<'_>> {
        if let Some(image) = self.pending_documents.get(&document_type) {
            return Some(DocumentSlot::Pending(image));
        }
        self.stored_documents
            .get(&document_type)
            .map(|url| DocumentSlot::Stored(url.as_str()))
    }

    /// Every occupied slot in type order.
    pub fn documents(&self) -> Vec<(DocumentType, DocumentSlot<'_>)> {
        DocumentType::ALL
            .into_iter()
            .filter_map(|ty| self.document(ty).map(|slot| (ty, slot)))
            .collect()
    }

    pub fn validate(&mut self, today: NaiveDate) -> bool {
        self.errors = validate_client(&self.draft, self.has_photo(), today);
        self.errors.is_empty()
    }

    /// Validate and assemble the upload. Updates carry every scalar field; creates only
    /// the non-empty ones. The photo goes along only when it was replaced.
    pub fn build_upload(&mut self, today: NaiveDate) -> Result<ClientUpload, ValidationErrors> {
        if let Some(dob) = self.draft.dob {
            self.draft.age = compute_age(dob, today);
        }
        if !self.validate(today) {
            return Err(self.errors.clone());
        }

        let is_new = self.is_new();
        let fields = ClientField::ALL
            .into_iter()
            .map(|f| (f.key(), f.value(&self.draft).trim().to_string()))
            .filter(|(_, v)| !is_new || !v.is_empty())
            .collect();

        let photo = match &self.photo {
            PhotoState::Captured(image) => Some(image.clone()),
            _ => None,
        };

        let mut document_files = Vec::new();
        let mut document_descriptors = Vec::new();
        for (document_type, slot) in self.documents() {
            match slot {
                DocumentSlot::Pending(image) => {
                    document_descriptors.push(DocumentDescriptor::Upload {
                        document_type,
                        upload_index: document_files.len(),
                    });
                    document_files.push(image.clone());
                }
                DocumentSlot::Stored(url) => document_descriptors.push(DocumentDescriptor::Stored {
                    document_type,
                    image_url: url.to_string(),
                }),
            }
        }

        Ok(ClientUpload {
            target: self.target.clone(),
            fields,
            photo,
            document_files,
            document_descriptors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn stored() -> Client {
        Client {
            id: Some("c1".into()),
            client_name: "Asha".into(),
            father_name: "Mohan".into(),
            gender: "Female".into(),
            contact: "9876543210".into(),
            nationality: "Indian".into(),
            address: "12 MG Road".into(),
            dob: NaiveDate::from_ymd_opt(2000, 6, 15),
            age: Some(24),
            photo: Some("https://cdn/asha.jpg".into()),
            documents: vec![
                Document { document_type: DocumentType::PanFront, image_url: Some("https://cdn/pan.jpg".into()) },
                Document { document_type: DocumentType::AadhaarFront, image_url: Some("https://cdn/aadhaar.jpg".into()) },
            ],
            ..Client::default()
        }
    }

    fn jpeg(name: &str) -> CapturedImage {
        CapturedImage::jpeg(name, vec![0xFF, 0xD8, 0xFF])
    }

    #[test]
    fn unchanged_photo_is_not_uploaded() {
        let mut session = EditSession::edit(&stored());
        session.set_field(ClientField::Occupation, "Engineer", today());
        let upload = session.build_upload(today()).unwrap();
        assert_eq!(upload.target, SaveTarget::Update("c1".into()));
        assert_eq!(upload.photo, None);
        assert!(upload.fields.contains(&("occupation", "Engineer".to_string())));
        // Updates send empty fields too.
        assert!(upload.fields.contains(&("education", String::new())));
    }

    #[test]
    fn replaced_photo_is_uploaded() {
        let mut session = EditSession::edit(&stored());
        session.capture_photo(jpeg("photo"));
        let upload = session.build_upload(today()).unwrap();
        assert_eq!(upload.photo.map(|p| p.file_name), Some("photo.jpg".to_string()));
    }

    #[test]
    fn dob_edits_rederive_age() {
        let mut session = EditSession::edit(&stored());
        session.set_field(ClientField::Dob, "1990-01-02", today());
        assert_eq!(session.client().age, Some(34));

        session.set_field(ClientField::Age, "50", today());
        assert_eq!(session.client().age, Some(34), "age is derived while a dob is set");
    }

    #[test]
    fn age_is_recomputed_at_save_time() {
        let mut session = EditSession::edit(&stored());
        let later = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let upload = session.build_upload(later).unwrap();
        assert!(upload.fields.contains(&("age", "25".to_string())));
    }

    #[test]
    fn phone_input_keeps_digits_and_flags_bad_prefixes() {
        let mut session = EditSession::new_client();
        session.set_field(ClientField::Contact, "(555) 123-4567 ext", today());
        assert_eq!(session.client().contact, "5551234567");
        assert_eq!(session.errors().get("contact"), Some("Should start with 6-9"));
        session.set_field(ClientField::Contact, "9876543210", today());
        assert_eq!(session.errors().get("contact"), None);
    }

    #[test]
    fn documents_are_described_in_type_order() {
        let mut session = EditSession::edit(&stored());
        session.capture_document(DocumentType::CvPage1, jpeg("cvPage1"));
        session.capture_document(DocumentType::AadhaarFront, jpeg("old"));
        session.capture_document(DocumentType::AadhaarFront, jpeg("aadhaarFront"));

        let upload = session.build_upload(today()).unwrap();
        assert_eq!(
            upload.document_descriptors,
            vec![
                DocumentDescriptor::Upload { document_type: DocumentType::AadhaarFront, upload_index: 0 },
                DocumentDescriptor::Stored {
                    document_type: DocumentType::PanFront,
                    image_url: "https://cdn/pan.jpg".into()
                },
                DocumentDescriptor::Upload { document_type: DocumentType::CvPage1, upload_index: 1 },
            ]
        );
        let names: Vec<&str> = upload.document_files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["aadhaarFront.jpg", "cvPage1.jpg"]);
    }

    #[test]
    fn removed_documents_are_left_out() {
        let mut session = EditSession::edit(&stored());
        session.remove_document(DocumentType::PanFront);
        let upload = session.build_upload(today()).unwrap();
        assert_eq!(upload.document_descriptors.len(), 1);
        assert_eq!(session.document(DocumentType::PanFront), None);
    }

    #[test]
    fn descriptors_serialise_in_backend_shape() {
        let json = serde_json::to_string(&vec![
            DocumentDescriptor::Upload { document_type: DocumentType::PanBack, upload_index: 2 },
            DocumentDescriptor::Stored { document_type: DocumentType::CvPage2, image_url: "u".into() },
        ])
        .unwrap();
        assert_eq!(
            json,
            r#"[{"documentType":"panBack","uploadIndex":2},{"documentType":"cvPage2","imageUrl":"u"}]"#
        );
    }

    #[test]
    fn new_client_needs_a_photo_and_sends_only_filled_fields() {
        let mut session = EditSession::new_client();
        for (field, value) in [
            (ClientField::ClientName, "Asha"),
            (ClientField::FatherName, "Mohan"),
            (ClientField::Gender, "Female"),
            (ClientField::Contact, "9876543210"),
            (ClientField::Nationality, "Indian"),
            (ClientField::Address, "12 MG Road"),
            (ClientField::Age, "30"),
        ] {
            session.set_field(field, value, today());
        }
        let errors = session.build_upload(today()).unwrap_err();
        assert!(errors.get("photo").is_some());

        session.capture_photo(jpeg("photo"));
        let upload = session.build_upload(today()).unwrap();
        assert_eq!(upload.target, SaveTarget::Create);
        assert!(upload.fields.iter().all(|(_, v)| !v.is_empty()));
        assert!(upload.fields.contains(&("age", "30".to_string())));
        assert!(upload.photo.is_some());
    }
}
