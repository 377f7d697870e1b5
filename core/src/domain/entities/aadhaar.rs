//! Aadhaar document upload and the record extracted from it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A document picked by the user
#[derive(Clone, PartialEq, Eq)]
pub struct AadhaarDocument {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl AadhaarDocument {
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }

    /// Check if the file is a PDF, by extension or by the `%PDF` signature
    pub fn is_pdf(&self) -> bool {
        self.file_name.to_ascii_lowercase().ends_with(".pdf") || self.content.starts_with(b"%PDF")
    }
}

impl fmt::Debug for AadhaarDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AadhaarDocument")
            .field("file_name", &self.file_name)
            .field("size", &self.content.len())
            .finish()
    }
}

/// The upload form: a password-protected e-Aadhaar PDF and its password
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AadhaarUpload {
    pub document: Option<AadhaarDocument>,
    pub password: String,
}

impl AadhaarUpload {
    pub fn new(document: AadhaarDocument, password: impl Into<String>) -> Self {
        Self {
            document: Some(document),
            password: password.into(),
        }
    }
}

impl fmt::Debug for AadhaarUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AadhaarUpload")
            .field("document", &self.document)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Fields read from an Aadhaar document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AadhaarRecord {
    pub name: String,
    /// As printed on the card (DD-MM-YYYY)
    pub dob: String,
    pub aadhaar_number: String,
    pub address: String,
}
