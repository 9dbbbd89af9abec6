use serde::{Deserialize, Serialize};

/// Identity artifacts a client can have on file. Declaration order is the
/// placement order used everywhere documents are listed or printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentType {
    AadhaarFront,
    AadhaarBack,
    PanFront,
    PanBack,
    PassportFront,
    PassportBack,
    LicenseFront,
    LicenseBack,
    VoterFront,
    VoterBack,
    Marksheet,
    CvPage1,
    CvPage2,
}

impl DocumentType {
    pub const ALL: [DocumentType; 13] = [
        DocumentType::AadhaarFront,
        DocumentType::AadhaarBack,
        DocumentType::PanFront,
        DocumentType::PanBack,
        DocumentType::PassportFront,
        DocumentType::PassportBack,
        DocumentType::LicenseFront,
        DocumentType::LicenseBack,
        DocumentType::VoterFront,
        DocumentType::VoterBack,
        DocumentType::Marksheet,
        DocumentType::CvPage1,
        DocumentType::CvPage2,
    ];

    /// Wire name, also used as the captured file stem.
    pub fn key(&self) -> &'static str {
        match self {
            DocumentType::AadhaarFront => "aadhaarFront",
            DocumentType::AadhaarBack => "aadhaarBack",
            DocumentType::PanFront => "panFront",
            DocumentType::PanBack => "panBack",
            DocumentType::PassportFront => "passportFront",
            DocumentType::PassportBack => "passportBack",
            DocumentType::LicenseFront => "licenseFront",
            DocumentType::LicenseBack => "licenseBack",
            DocumentType::VoterFront => "voterFront",
            DocumentType::VoterBack => "voterBack",
            DocumentType::Marksheet => "marksheet",
            DocumentType::CvPage1 => "cvPage1",
            DocumentType::CvPage2 => "cvPage2",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::AadhaarFront => "Aadhaar Card (Front)",
            DocumentType::AadhaarBack => "Aadhaar Card (Back)",
            DocumentType::PanFront => "PAN Card (Front)",
            DocumentType::PanBack => "PAN Card (Back)",
            DocumentType::PassportFront => "Passport (Front)",
            DocumentType::PassportBack => "Passport (Back)",
            DocumentType::LicenseFront => "Driving License (Front)",
            DocumentType::LicenseBack => "Driving License (Back)",
            DocumentType::VoterFront => "Voter ID (Front)",
            DocumentType::VoterBack => "Voter ID (Back)",
            DocumentType::Marksheet => "Marksheet",
            DocumentType::CvPage1 => "CV (Page 1)",
            DocumentType::CvPage2 => "CV (Page 2)",
        }
    }

    pub fn group(&self) -> DocumentGroup {
        match self {
            DocumentType::AadhaarFront | DocumentType::AadhaarBack => DocumentGroup::Aadhaar,
            DocumentType::PanFront | DocumentType::PanBack => DocumentGroup::Pan,
            DocumentType::PassportFront | DocumentType::PassportBack => DocumentGroup::Passport,
            DocumentType::LicenseFront | DocumentType::LicenseBack => DocumentGroup::License,
            DocumentType::VoterFront | DocumentType::VoterBack => DocumentGroup::Voter,
            DocumentType::Marksheet => DocumentGroup::Marksheet,
            DocumentType::CvPage1 | DocumentType::CvPage2 => DocumentGroup::Cv,
        }
    }
}

/// A persisted document as returned by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_type: DocumentType,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Report grouping of document types; each group starts on a fresh page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentGroup {
    Aadhaar,
    Pan,
    Passport,
    License,
    Voter,
    Marksheet,
    Cv,
}

impl DocumentGroup {
    pub const ALL: [DocumentGroup; 7] = [
        DocumentGroup::Aadhaar,
        DocumentGroup::Pan,
        DocumentGroup::Passport,
        DocumentGroup::License,
        DocumentGroup::Voter,
        DocumentGroup::Marksheet,
        DocumentGroup::Cv,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            DocumentGroup::Aadhaar => "Aadhaar Card",
            DocumentGroup::Pan => "PAN Card",
            DocumentGroup::Passport => "Passport",
            DocumentGroup::License => "Driving License",
            DocumentGroup::Voter => "Voter ID",
            DocumentGroup::Marksheet => "Marksheet",
            DocumentGroup::Cv => "Curriculum Vitae",
        }
    }

    /// Images per page: front/back pairs share a page, single sheets get a page each.
    pub fn per_page(&self) -> usize {
        match self {
            DocumentGroup::Marksheet | DocumentGroup::Cv => 1,
            _ => 2,
        }
    }

    pub fn contains(&self, document_type: DocumentType) -> bool {
        document_type.group() == *self
    }
}
