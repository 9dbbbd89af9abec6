use super::Client;

/// Every scalar attribute of a client record, in form/report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClientField {
    ClientName,
    Surname,
    Gender,
    Dob,
    Age,
    Nationality,
    MaritalStatus,
    Education,
    Occupation,
    FamilyMembers,
    Contact,
    Email,
    Address,
    FatherName,
    FatherSurname,
    FatherPhone,
    FatherEmail,
    MotherName,
    MotherSurname,
    MotherPhone,
    MotherEmail,
    SpouseName,
    SpouseSurname,
    SpousePhone,
    SpouseEmail,
    AadhaarNumber,
    PanNumber,
    PassportNumber,
    LicenseNumber,
    VoterIdNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSection {
    Personal,
    Contact,
    Family,
    GovernmentIds,
}

impl FieldSection {
    pub const ALL: [FieldSection; 4] = [
        FieldSection::Personal,
        FieldSection::Contact,
        FieldSection::Family,
        FieldSection::GovernmentIds,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            FieldSection::Personal => "Personal Information",
            FieldSection::Contact => "Contact Information",
            FieldSection::Family => "Family Information",
            FieldSection::GovernmentIds => "Government IDs",
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = ClientField> + '_ {
        ClientField::ALL.into_iter().filter(move |f| f.section() == *self)
    }
}

impl ClientField {
    pub const ALL: [ClientField; 30] = [
        ClientField::ClientName,
        ClientField::Surname,
        ClientField::Gender,
        ClientField::Dob,
        ClientField::Age,
        ClientField::Nationality,
        ClientField::MaritalStatus,
        ClientField::Education,
        ClientField::Occupation,
        ClientField::FamilyMembers,
        ClientField::Contact,
        ClientField::Email,
        ClientField::Address,
        ClientField::FatherName,
        ClientField::FatherSurname,
        ClientField::FatherPhone,
        ClientField::FatherEmail,
        ClientField::MotherName,
        ClientField::MotherSurname,
        ClientField::MotherPhone,
        ClientField::MotherEmail,
        ClientField::SpouseName,
        ClientField::SpouseSurname,
        ClientField::SpousePhone,
        ClientField::SpouseEmail,
        ClientField::AadhaarNumber,
        ClientField::PanNumber,
        ClientField::PassportNumber,
        ClientField::LicenseNumber,
        ClientField::VoterIdNumber,
    ];

    /// Multipart form key understood by the backend.
    pub fn key(&self) -> &'static str {
        match self {
            ClientField::ClientName => "clientName",
            ClientField::Surname => "surname",
            ClientField::Gender => "gender",
            ClientField::Dob => "dob",
            ClientField::Age => "age",
            ClientField::Nationality => "nationality",
            ClientField::MaritalStatus => "maritalStatus",
            ClientField::Education => "education",
            ClientField::Occupation => "occupation",
            ClientField::FamilyMembers => "familyMembers",
            ClientField::Contact => "contact",
            ClientField::Email => "email",
            ClientField::Address => "address",
            ClientField::FatherName => "fatherName",
            ClientField::FatherSurname => "fatherSurname",
            ClientField::FatherPhone => "fatherPhone",
            ClientField::FatherEmail => "fatherEmail",
            ClientField::MotherName => "motherName",
            ClientField::MotherSurname => "motherSurname",
            ClientField::MotherPhone => "motherPhone",
            ClientField::MotherEmail => "motherEmail",
            ClientField::SpouseName => "spouseName",
            ClientField::SpouseSurname => "spouseSurname",
            ClientField::SpousePhone => "spousePhone",
            ClientField::SpouseEmail => "spouseEmail",
            ClientField::AadhaarNumber => "aadhaarNumber",
            ClientField::PanNumber => "panNumber",
            ClientField::PassportNumber => "passportNumber",
            ClientField::LicenseNumber => "licenseNumber",
            ClientField::VoterIdNumber => "voterIdNumber",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ClientField::ClientName => "Client Name",
            ClientField::Surname => "Surname",
            ClientField::Gender => "Gender",
            ClientField::Dob => "Date of Birth",
            ClientField::Age => "Age",
            ClientField::Nationality => "Nationality",
            ClientField::MaritalStatus => "Marital Status",
            ClientField::Education => "Education",
            ClientField::Occupation => "Occupation",
            ClientField::FamilyMembers => "Family Members",
            ClientField::Contact => "Contact",
            ClientField::Email => "Email",
            ClientField::Address => "Address",
            ClientField::FatherName => "Father Name",
            ClientField::FatherSurname => "Father Surname",
            ClientField::FatherPhone => "Father Phone",
            ClientField::FatherEmail => "Father Email",
            ClientField::MotherName => "Mother Name",
            ClientField::MotherSurname => "Mother Surname",
            ClientField::MotherPhone => "Mother Phone",
            ClientField::MotherEmail => "Mother Email",
            ClientField::SpouseName => "Spouse Name",
            ClientField::SpouseSurname => "Spouse Surname",
            ClientField::SpousePhone => "Spouse Phone",
            ClientField::SpouseEmail => "Spouse Email",
            ClientField::AadhaarNumber => "Aadhaar Number",
            ClientField::PanNumber => "PAN Number",
            ClientField::PassportNumber => "Passport Number",
            ClientField::LicenseNumber => "License Number",
            ClientField::VoterIdNumber => "Voter ID Number",
        }
    }

    pub fn section(&self) -> FieldSection {
        use ClientField::*;
        match self {
            ClientName | Surname | Gender | Dob | Age | Nationality | MaritalStatus | Education
            | Occupation | FamilyMembers => FieldSection::Personal,
            Contact | Email | Address => FieldSection::Contact,
            FatherName | FatherSurname | FatherPhone | FatherEmail | MotherName | MotherSurname
            | MotherPhone | MotherEmail | SpouseName | SpouseSurname | SpousePhone | SpouseEmail => {
                FieldSection::Family
            }
            AadhaarNumber | PanNumber | PassportNumber | LicenseNumber | VoterIdNumber => {
                FieldSection::GovernmentIds
            }
        }
    }

    pub fn is_phone(&self) -> bool {
        matches!(
            self,
            ClientField::Contact | ClientField::FatherPhone | ClientField::MotherPhone | ClientField::SpousePhone
        )
    }

    pub fn is_email(&self) -> bool {
        matches!(
            self,
            ClientField::Email | ClientField::FatherEmail | ClientField::MotherEmail | ClientField::SpouseEmail
        )
    }

    pub fn is_spouse(&self) -> bool {
        matches!(
            self,
            ClientField::SpouseName | ClientField::SpouseSurname | ClientField::SpousePhone | ClientField::SpouseEmail
        )
    }

    /// Spouse details only exist for married clients.
    pub fn applies_to(&self, client: &Client) -> bool {
        !self.is_spouse() || client.is_married()
    }

    /// Raw stored value as a string (dates as `YYYY-MM-DD`, empty when unset).
    pub fn value(&self, client: &Client) -> String {
        match self {
            ClientField::Dob => client.dob.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            ClientField::Age => client.age.map(|a| a.to_string()).unwrap_or_default(),
            _ => self.text(client).cloned().unwrap_or_default(),
        }
    }

    /// Mutable access to text-backed fields. `Dob` and `Age` are typed and return `None`.
    pub fn text_mut<'a>(&self, client: &'a mut Client) -> Option<&'a mut String> {
        Some(match self {
            ClientField::ClientName => &mut client.client_name,
            ClientField::Surname => &mut client.surname,
            ClientField::Gender => &mut client.gender,
            ClientField::Dob | ClientField::Age => return None,
            ClientField::Nationality => &mut client.nationality,
            ClientField::MaritalStatus => &mut client.marital_status,
            ClientField::Education => &mut client.education,
            ClientField::Occupation => &mut client.occupation,
            ClientField::FamilyMembers => &mut client.family_members,
            ClientField::Contact => &mut client.contact,
            ClientField::Email => &mut client.email,
            ClientField::Address => &mut client.address,
            ClientField::FatherName => &mut client.father_name,
            ClientField::FatherSurname => &mut client.father_surname,
            ClientField::FatherPhone => &mut client.father_phone,
            ClientField::FatherEmail => &mut client.father_email,
            ClientField::MotherName => &mut client.mother_name,
            ClientField::MotherSurname => &mut client.mother_surname,
            ClientField::MotherPhone => &mut client.mother_phone,
            ClientField::MotherEmail => &mut client.mother_email,
            ClientField::SpouseName => &mut client.spouse_name,
            ClientField::SpouseSurname => &mut client.spouse_surname,
            ClientField::SpousePhone => &mut client.spouse_phone,
            ClientField::SpouseEmail => &mut client.spouse_email,
            ClientField::AadhaarNumber => &mut client.aadhaar_number,
            ClientField::PanNumber => &mut client.pan_number,
            ClientField::PassportNumber => &mut client.passport_number,
            ClientField::LicenseNumber => &mut client.license_number,
            ClientField::VoterIdNumber => &mut client.voter_id_number,
        })
    }

    fn text<'a>(&self, client: &'a Client) -> Option<&'a String> {
        Some(match self {
            ClientField::ClientName => &client.client_name,
            ClientField::Surname => &client.surname,
            ClientField::Gender => &client.gender,
            ClientField::Dob | ClientField::Age => return None,
            ClientField::Nationality => &client.nationality,
            ClientField::MaritalStatus => &client.marital_status,
            ClientField::Education => &client.education,
            ClientField::Occupation => &client.occupation,
            ClientField::FamilyMembers => &client.family_members,
            ClientField::Contact => &client.contact,
            ClientField::Email => &client.email,
            ClientField::Address => &client.address,
            ClientField::FatherName => &client.father_name,
            ClientField::FatherSurname => &client.father_surname,
            ClientField::FatherPhone => &client.father_phone,
            ClientField::FatherEmail => &client.father_email,
            ClientField::MotherName => &client.mother_name,
            ClientField::MotherSurname => &client.mother_surname,
            ClientField::MotherPhone => &client.mother_phone,
            ClientField::MotherEmail => &client.mother_email,
            ClientField::SpouseName => &client.spouse_name,
            ClientField::SpouseSurname => &client.spouse_surname,
            ClientField::SpousePhone => &client.spouse_phone,
            ClientField::SpouseEmail => &client.spouse_email,
            ClientField::AadhaarNumber => &client.aadhaar_number,
            ClientField::PanNumber => &client.pan_number,
            ClientField::PassportNumber => &client.passport_number,
            ClientField::LicenseNumber => &client.license_number,
            ClientField::VoterIdNumber => &client.voter_id_number,
        })
    }
}
