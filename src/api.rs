use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::capture::CapturedImage;
use crate::config::Config;
use crate::error::IntakeError;
use crate::models::Client;
use crate::session::{ClientUpload, SaveTarget};

/// Typed access to the client backend
pub struct ApiClient {
    http: reqwest::Client,
    clients_url: String,
    api_url: String,
}

/// Body of a mutating call: `{success, message, client?}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiOutcome {
    pub success: Option<bool>,
    pub message: Option<String>,
    #[serde(deserialize_with = "echoed_client")]
    pub client: Option<Client>,
}

/// The echoed record is informational; the call already succeeded if it fails to decode.
fn echoed_client<'de, D>(deserializer: D) -> Result<Option<Client>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match serde_json::from_value(value) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "ignoring undecodable client in response");
            None
        }
    }))
}

impl ApiOutcome {
    pub fn message_or(&self, fallback: &str) -> String {
        self.message.clone().unwrap_or_else(|| fallback.to_string())
    }
}

/// One multipart field, kept inspectable until it is turned into a [`Form`].
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text { name: &'static str, value: String },
    File { name: &'static str, image: CapturedImage },
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, IntakeError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            clients_url: config.clients_url().trim_end_matches('/').to_string(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Underlying HTTP client, shared with the image fetcher.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn client_url(&self, id: &str) -> String {
        format!("{}/{}", self.clients_url, id)
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>, IntakeError> {
        let response = self.http.get(&self.clients_url).send().await?;
        let clients = parse_client_list(&read_body(response).await?)?;
        debug!(count = clients.len(), "fetched client list");
        Ok(clients)
    }

    pub async fn get_client(&self, id: &str) -> Result<Client, IntakeError> {
        let response = self.http.get(self.client_url(id)).send().await?;
        parse_client(&read_body(response).await?)
    }

    /// `POST` for new records, `PUT` for existing ones. Nothing is sent if the form
    /// cannot be built; a failure leaves the caller's draft untouched.
    pub async fn save_client(&self, upload: &ClientUpload) -> Result<ApiOutcome, IntakeError> {
        let form = into_form(form_parts(upload)?)?;
        let request = match &upload.target {
            SaveTarget::Create => self.http.post(&self.clients_url),
            SaveTarget::Update(id) => self.http.put(self.client_url(id)),
        };
        let outcome = parse_outcome(&read_body(request.multipart(form).send().await?).await?)?;
        info!(save = ?upload.target, "client saved");
        Ok(outcome)
    }

    pub async fn delete_client(&self, id: &str) -> Result<ApiOutcome, IntakeError> {
        let response = self.http.delete(self.client_url(id)).send().await?;
        let outcome = parse_outcome(&read_body(response).await?)?;
        info!(%id, "client deleted");
        Ok(outcome)
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<ApiOutcome, IntakeError> {
        let response = self
            .http
            .post(format!("{}/signup", self.api_url))
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await?;
        parse_outcome(&read_body(response).await?)
    }
}

/// Body text of a successful response; anything else becomes [`IntakeError::Api`].
async fn read_body(response: Response) -> Result<String, IntakeError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        warn!(status = status.as_u16(), "backend rejected request");
        Err(IntakeError::Api {
            status: status.as_u16(),
            message: error_message(status, &body),
        })
    }
}

/// The backend's `message` (or `error`) when it sent one.
pub fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
}

/// `{ "client": {...} }` or the bare object.
pub fn parse_client(body: &str) -> Result<Client, IntakeError> {
    let mut value: Value = serde_json::from_str(body)?;
    let record = match value.get_mut("client") {
        Some(inner) if inner.is_object() => inner.take(),
        _ => value,
    };
    Ok(serde_json::from_value(record)?)
}

/// `{ "clients": [...] }` or a bare array.
pub fn parse_client_list(body: &str) -> Result<Vec<Client>, IntakeError> {
    let mut value: Value = serde_json::from_str(body)?;
    let list = match value.get_mut("clients") {
        Some(inner) => inner.take(),
        None => value,
    };
    let entries: Vec<Value> = serde_json::from_value(list)?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "skipping undecodable client");
                None
            }
        })
        .collect())
}

/// A 2xx body that still says `success: false` is treated as a failure.
pub fn parse_outcome(body: &str) -> Result<ApiOutcome, IntakeError> {
    if body.trim().is_empty() {
        return Ok(ApiOutcome::default());
    }
    let outcome: ApiOutcome = match serde_json::from_str(body) {
        Ok(outcome) => outcome,
        Err(e) => {
            debug!(error = %e, "non-JSON success body");
            ApiOutcome::default()
        }
    };
    if outcome.success == Some(false) {
        return Err(IntakeError::Api {
            status: StatusCode::OK.as_u16(),
            message: outcome.message_or("Request was not successful"),
        });
    }
    Ok(outcome)
}

/// Multipart layout of a save: scalar fields, `photo` only when replaced, one `documents`
/// file part per pending capture, then the `documents` descriptor list as JSON.
pub fn form_parts(upload: &ClientUpload) -> Result<Vec<FormPart>, IntakeError> {
    let mut parts: Vec<FormPart> = upload
        .fields
        .iter()
        .map(|(name, value)| FormPart::Text { name: *name, value: value.clone() })
        .collect();

    if let Some(photo) = &upload.photo {
        parts.push(FormPart::File { name: "photo", image: photo.clone() });
    }
    for image in &upload.document_files {
        parts.push(FormPart::File { name: "documents", image: image.clone() });
    }

    // An update without descriptors must still say so, or stored documents survive.
    let send_descriptors = !upload.document_descriptors.is_empty() || upload.target != SaveTarget::Create;
    if send_descriptors {
        parts.push(FormPart::Text {
            name: "documents",
            value: serde_json::to_string(&upload.document_descriptors)?,
        });
    }
    Ok(parts)
}

fn into_form(parts: Vec<FormPart>) -> Result<Form, IntakeError> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name, value),
            FormPart::File { name, image } => {
                let file = Part::bytes(image.bytes)
                    .file_name(image.file_name)
                    .mime_str(image.mime.as_ref())?;
                form.part(name, file)
            }
        };
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentType;
    use crate::session::DocumentDescriptor;

    fn upload(target: SaveTarget) -> ClientUpload {
        ClientUpload {
            target,
            fields: vec![("clientName", "Asha".into()), ("contact", "9876543210".into())],
            photo: None,
            document_files: Vec::new(),
            document_descriptors: Vec::new(),
        }
    }

    fn names(parts: &[FormPart]) -> Vec<&str> {
        parts
            .iter()
            .map(|p| match p {
                FormPart::Text { name, .. } | FormPart::File { name, .. } => *name,
            })
            .collect()
    }

    #[test]
    fn update_without_new_photo_has_no_photo_part() {
        let parts = form_parts(&upload(SaveTarget::Update("c1".into()))).unwrap();
        assert_eq!(names(&parts), vec!["clientName", "contact", "documents"]);
        assert_eq!(
            parts.last(),
            Some(&FormPart::Text { name: "documents", value: "[]".into() })
        );
    }

    #[test]
    fn create_without_documents_skips_the_descriptor_part() {
        let mut up = upload(SaveTarget::Create);
        up.photo = Some(CapturedImage::jpeg("photo", vec![1, 2, 3]));
        let parts = form_parts(&up).unwrap();
        assert_eq!(names(&parts), vec!["clientName", "contact", "photo"]);
    }

    #[test]
    fn document_files_precede_their_descriptors() {
        let mut up = upload(SaveTarget::Update("c1".into()));
        up.document_files = vec![CapturedImage::jpeg("panFront", vec![9])];
        up.document_descriptors = vec![DocumentDescriptor::Upload {
            document_type: DocumentType::PanFront,
            upload_index: 0,
        }];
        let parts = form_parts(&up).unwrap();
        assert_eq!(names(&parts), vec!["clientName", "contact", "documents", "documents"]);
        assert!(matches!(&parts[2], FormPart::File { image, .. } if image.file_name == "panFront.jpg"));
        assert!(matches!(&parts[3], FormPart::Text { value, .. } if value.contains("\"uploadIndex\":0")));
        assert!(into_form(parts).is_ok());
    }

    #[test]
    fn client_is_read_wrapped_or_bare() {
        let wrapped = parse_client(r#"{"client":{"_id":"c1","clientName":"Asha","age":"31"}}"#).unwrap();
        let bare = parse_client(r#"{"_id":"c1","clientName":"Asha","age":31}"#).unwrap();
        assert_eq!(wrapped, bare);
        assert_eq!(wrapped.age, Some(31));
    }

    #[test]
    fn client_list_is_read_wrapped_or_bare() {
        assert_eq!(parse_client_list(r#"{"clients":[{"clientName":"A"},{"clientName":"B"}]}"#).unwrap().len(), 2);
        assert_eq!(parse_client_list(r#"[{"clientName":"A"}]"#).unwrap().len(), 1);
        assert!(parse_client_list(r#"{"clients":"nope"}"#).is_err());
    }

    #[test]
    fn error_bodies_surface_their_message() {
        assert_eq!(error_message(StatusCode::BAD_REQUEST, r#"{"message":"Email exists"}"#), "Email exists");
        assert_eq!(error_message(StatusCode::NOT_FOUND, r#"{"error":"No such client"}"#), "No such client");
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "<html>"),
            "Request failed with status 502"
        );
    }

    #[test]
    fn unsuccessful_outcome_is_an_error() {
        let err = parse_outcome(r#"{"success":false,"message":"Duplicate contact"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Duplicate contact");
        let ok = parse_outcome(r#"{"success":true,"message":"Saved"}"#).unwrap();
        assert_eq!(ok.message_or("done"), "Saved");
        assert_eq!(parse_outcome("").unwrap(), ApiOutcome::default());
    }

    #[test]
    fn saved_outcome_survives_an_odd_echoed_client() {
        let ok = parse_outcome(
            r#"{"success":true,"message":"Saved","client":{"_id":"c1","clientName":"Asha","education":null}}"#,
        )
        .unwrap();
        assert_eq!(ok.client.map(|c| c.education), Some(String::new()));

        let ok = parse_outcome(r#"{"success":true,"message":"Saved","client":"c1"}"#).unwrap();
        assert_eq!(ok.message_or("done"), "Saved");
        assert_eq!(ok.client, None);

        assert_eq!(parse_outcome("Created").unwrap(), ApiOutcome::default());
    }

    #[test]
    fn client_list_tolerates_nulls_and_unknown_documents() {
        let body = r#"[
            {"_id":"1","clientName":"Asha","spouseName":null},
            {"_id":"2","clientName":"Ravi","documents":[{"documentType":"biometric","imageUrl":"u"}]},
            "garbage"
        ]"#;
        let clients = parse_client_list(body).unwrap();
        let ids: Vec<_> = clients.iter().filter_map(|c| c.id.as_deref()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(clients[1].documents.is_empty());
    }
}
