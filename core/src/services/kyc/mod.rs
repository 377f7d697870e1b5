//! Aadhaar document step: check the upload, extract the card details and
//! normalize the Aadhaar number

use async_trait::async_trait;
use std::sync::Arc;

use ob_shared::validation::validators;

use crate::domain::entities::aadhaar::{AadhaarDocument, AadhaarRecord, AadhaarUpload};
use crate::errors::KycError;

/// Reads the details printed on an e-Aadhaar PDF
#[async_trait]
pub trait AadhaarDocumentService: Send + Sync {
    async fn extract(&self, document: &AadhaarDocument, password: &str) -> Result<AadhaarRecord, KycError>;
}

/// Runs the document step of KYC
pub struct AadhaarVerification {
    extractor: Arc<dyn AadhaarDocumentService>,
}

impl AadhaarVerification {
    pub fn new(extractor: Arc<dyn AadhaarDocumentService>) -> Self {
        Self { extractor }
    }

    /// Local checks on the upload form, before anything is read
    pub fn check_upload(upload: &AadhaarUpload) -> Result<&AadhaarDocument, KycError> {
        let document = upload.document.as_ref().ok_or(KycError::MissingDocument)?;
        if !document.is_pdf() {
            return Err(KycError::UnsupportedDocument);
        }
        if upload.password.trim().is_empty() {
            return Err(KycError::MissingPassword);
        }
        Ok(document)
    }

    /// Check the upload, extract the record and normalize its Aadhaar number
    pub async fn verify(&self, upload: &AadhaarUpload) -> Result<AadhaarRecord, KycError> {
        let document = Self::check_upload(upload)?;

        let mut record = self
            .extractor
            .extract(document, upload.password.trim())
            .await
            .map_err(|err| {
                tracing::warn!(
                    file = %document.file_name,
                    error = %err,
                    event = "aadhaar_extraction_failed",
                    "Could not read Aadhaar document"
                );
                err
            })?;

        let number = validators::normalize_aadhaar(&record.aadhaar_number);
        if !validators::is_valid_aadhaar(&number) {
            return Err(KycError::InvalidAadhaarNumber);
        }
        record.aadhaar_number = number;

        tracing::info!(
            file = %document.file_name,
            aadhaar_last4 = &record.aadhaar_number[8..],
            event = "aadhaar_extracted",
            "Aadhaar details extracted"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct MockExtractor {
        record: Option<AadhaarRecord>,
        calls: Mutex<Vec<String>>,
    }

    impl MockExtractor {
        fn returning(aadhaar_number: &str) -> Self {
            Self {
                record: Some(AadhaarRecord {
                    name: "Rahul".to_string(),
                    dob: "15-08-1995".to_string(),
                    aadhaar_number: aadhaar_number.to_string(),
                    address: "123, Green Park, New Delhi, India".to_string(),
                }),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                record: None,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AadhaarDocumentService for MockExtractor {
        async fn extract(&self, _document: &AadhaarDocument, password: &str) -> Result<AadhaarRecord, KycError> {
            self.calls.lock().unwrap().push(password.to_string());
            self.record.clone().ok_or(KycError::ExtractionFailed {
                detail: "wrong password".to_string(),
            })
        }
    }

    fn pdf() -> AadhaarDocument {
        AadhaarDocument::new("aadhaar.pdf", b"%PDF-1.7".to_vec())
    }

    #[tokio::test]
    async fn test_verify_normalizes_number() {
        let extractor = Arc::new(MockExtractor::returning("1234 5458 9012"));
        let kyc = AadhaarVerification::new(extractor.clone());

        let record = kyc.verify(&AadhaarUpload::new(pdf(), " secret ")).await.unwrap();
        assert_eq!(record.aadhaar_number, "123454589012");
        assert_eq!(record.name, "Rahul");
        assert_eq!(extractor.calls.lock().unwrap().as_slice(), ["secret"]);
    }

    #[tokio::test]
    async fn test_upload_guards() {
        let extractor = Arc::new(MockExtractor::returning("123454589012"));
        let kyc = AadhaarVerification::new(extractor.clone());

        let err = kyc.verify(&AadhaarUpload::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Please select an Aadhaar PDF file");

        let err = kyc.verify(&AadhaarUpload::new(pdf(), "  ")).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter the password for the Aadhaar PDF");

        let image = AadhaarDocument::new("aadhaar.png", vec![0x89, 0x50]);
        let err = kyc.verify(&AadhaarUpload::new(image, "secret")).await.unwrap_err();
        assert_eq!(err, KycError::UnsupportedDocument);

        assert!(extractor.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_extraction_errors() {
        let kyc = AadhaarVerification::new(Arc::new(MockExtractor::failing()));
        let err = kyc.verify(&AadhaarUpload::new(pdf(), "secret")).await.unwrap_err();
        assert!(matches!(err, KycError::ExtractionFailed { .. }));

        let kyc = AadhaarVerification::new(Arc::new(MockExtractor::returning("1234")));
        let err = kyc.verify(&AadhaarUpload::new(pdf(), "secret")).await.unwrap_err();
        assert_eq!(err.to_string(), "Enter a valid 12-digit Aadhar number.");
    }
}
