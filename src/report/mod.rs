mod fetcher;
mod layout;
mod render;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::error::{ImageUnavailable, IntakeError};
use crate::models::{Client, ClientField, Document, DocumentGroup, DocumentType, FieldSection};
use crate::validation::format_phone;

pub use fetcher::{EmbeddedImage, HttpImageFetcher, ImageSource};
pub use layout::Page;
use layout::{ImageSlot, PagePlanner, PlacedDocument};

pub const NOT_PROVIDED: &str = "Not provided";

/// Passes of a report run, in order. Each runs once; there is no retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStage {
    Init,
    Header,
    PersonalSections,
    DocumentGroups,
    Footer,
    Done,
}

/// A finished report: the planned pages, the embedded images and the PDF bytes.
#[derive(Debug, Clone)]
pub struct Report {
    pub file_name: String,
    pub pages: Vec<Page>,
    pub images: Vec<EmbeddedImage>,
    pub bytes: Vec<u8>,
    /// Document slots that fell back to a placeholder.
    pub unavailable: Vec<DocumentType>,
}

impl Report {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Write the PDF into `dir`, creating it if needed.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, IntakeError> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        info!(path = %path.display(), pages = self.page_count(), "report written");
        Ok(path)
    }
}

/// `"{clientName}_{suffix}.pdf"` with path-hostile characters replaced.
pub fn report_file_name(client: &Client, suffix: &str) -> String {
    let name = client.client_name.trim();
    let name = if name.is_empty() { "client" } else { name };
    let clean: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') { c } else { '_' })
        .collect();
    format!("{}_{}.pdf", clean, suffix)
}

/// Value as printed in the report.
fn display_value(field: ClientField, client: &Client) -> String {
    let raw = field.value(client);
    let raw = raw.trim();
    if raw.is_empty() {
        NOT_PROVIDED.to_string()
    } else if field.is_phone() {
        format_phone(raw)
    } else {
        raw.to_string()
    }
}

pub struct ReportBuilder<'a> {
    source: &'a dyn ImageSource,
    title: String,
    stage: ReportStage,
    planner: PagePlanner,
    images: Vec<EmbeddedImage>,
    unavailable: Vec<DocumentType>,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(source: &'a dyn ImageSource, title: &str) -> Self {
        Self {
            source,
            title: title.to_string(),
            stage: ReportStage::Init,
            planner: PagePlanner::new(),
            images: Vec::new(),
            unavailable: Vec::new(),
        }
    }

    pub fn stage(&self) -> ReportStage {
        self.stage
    }

    fn enter(&mut self, stage: ReportStage) {
        debug!(from = ?self.stage, to = ?stage, "report stage");
        self.stage = stage;
    }

    /// Run every pass for `client`. Image failures degrade to placeholders; only a
    /// missing subject is fatal.
    pub async fn build(
        mut self,
        client: Option<&Client>,
        suffix: &str,
        generated_at: NaiveDateTime,
    ) -> Result<Report, IntakeError> {
        let client = client.ok_or(IntakeError::MissingSubject)?;
        let subject = client.display_name();

        self.enter(ReportStage::Header);
        self.header(client, &subject).await;

        self.enter(ReportStage::PersonalSections);
        self.sections(client);

        self.enter(ReportStage::DocumentGroups);
        for group in DocumentGroup::ALL {
            self.document_group(group, &client.documents).await;
        }

        self.enter(ReportStage::Footer);
        self.planner
            .add_footers(&generated_at.format("%Y-%m-%d %H:%M").to_string(), &subject);

        self.enter(ReportStage::Done);
        let pages = self.planner.into_pages();
        let bytes = render::render_pdf(&pages, &self.images, &subject);
        if !self.unavailable.is_empty() {
            warn!(missing = ?self.unavailable, "report generated with placeholder images");
        }
        Ok(Report {
            file_name: report_file_name(client, suffix),
            pages,
            images: self.images,
            bytes,
            unavailable: self.unavailable,
        })
    }

    fn embed(&mut self, image: EmbeddedImage) -> ImageSlot {
        let slot = ImageSlot::Ready {
            id: self.images.len(),
            width: image.width,
            height: image.height,
        };
        self.images.push(image);
        slot
    }

    async fn header(&mut self, client: &Client, subject: &str) {
        let portrait = match client.photo.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => match self.source.fetch(url).await {
                Ok(image) => self.embed(image),
                Err(e) => {
                    warn!(%url, error = %e, "portrait unavailable");
                    ImageSlot::Unavailable
                }
            },
            None => ImageSlot::Unavailable,
        };
        let subtitle = match client.created_at.as_deref().and_then(|s| s.get(..10)) {
            Some(day) => format!("Registered {}", day),
            None => "Client intake record".to_string(),
        };
        self.planner.add_header(&self.title, subject, &subtitle, portrait);
    }

    fn sections(&mut self, client: &Client) {
        for section in FieldSection::ALL {
            self.planner.add_section(section.title());
            for field in section.fields().filter(|f| f.applies_to(client)) {
                self.planner.add_row(field.label(), &display_value(field, client));
            }
        }
    }

    async fn document_group(&mut self, group: DocumentGroup, documents: &[Document]) {
        let mut members: Vec<&Document> = Vec::new();
        for doc in documents.iter().filter(|d| group.contains(d.document_type)) {
            if members.iter().all(|m| m.document_type != doc.document_type) {
                members.push(doc);
            }
        }
        if members.is_empty() {
            return;
        }

        let source = self.source;
        let fetched = join_all(members.iter().map(|doc| async move {
            match doc.image_url.as_deref().filter(|url| !url.is_empty()) {
                Some(url) => source.fetch(url).await,
                None => Err(ImageUnavailable::Network("no image on file".to_string())),
            }
        }))
        .await;

        let mut placed = Vec::with_capacity(members.len());
        for (doc, result) in members.iter().zip(fetched) {
            let slot = match result {
                Ok(image) => self.embed(image),
                Err(e) => {
                    warn!(document = doc.document_type.key(), error = %e, "document image unavailable");
                    self.unavailable.push(doc.document_type);
                    ImageSlot::Unavailable
                }
            };
            placed.push(PlacedDocument { document_type: doc.document_type, slot });
        }
        self.planner.place_document_group(group.title(), placed, group.per_page());
    }
}
