mod client;
mod document;
mod field;

pub use client::{Client, GENDERS, MARITAL_STATUSES};
pub use document::{Document, DocumentGroup, DocumentType};
pub use field::{ClientField, FieldSection};
