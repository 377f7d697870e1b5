//! Aadhaar document extraction
//!
//! No OCR backend is wired up yet; [`StaticAadhaarExtractor`] returns a fixed
//! record after a simulated processing delay, which is enough to drive the
//! prefill path of the profile form.

use async_trait::async_trait;
use std::time::Duration;

use ob_core::domain::entities::{AadhaarDocument, AadhaarRecord};
use ob_core::errors::KycError;
use ob_core::services::AadhaarDocumentService;

/// Simulated extraction time
pub const DEFAULT_EXTRACTION_DELAY: Duration = Duration::from_secs(2);

/// Extractor that returns the same record for every document
pub struct StaticAadhaarExtractor {
    record: AadhaarRecord,
    delay: Duration,
    expected_password: Option<String>,
}

impl StaticAadhaarExtractor {
    pub fn new(record: AadhaarRecord) -> Self {
        Self {
            record,
            delay: DEFAULT_EXTRACTION_DELAY,
            expected_password: None,
        }
    }

    /// Extractor returning the sample card used in demos
    pub fn demo() -> Self {
        Self::new(AadhaarRecord {
            name: "Rahul".to_string(),
            dob: "15-08-1995".to_string(),
            aadhaar_number: "1234 5458 9012".to_string(),
            address: "123, Green Park, New Delhi, India".to_string(),
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Reject every password except `password`, like an encrypted PDF would
    pub fn with_expected_password(mut self, password: impl Into<String>) -> Self {
        self.expected_password = Some(password.into());
        self
    }
}

#[async_trait]
impl AadhaarDocumentService for StaticAadhaarExtractor {
    async fn extract(
        &self,
        document: &AadhaarDocument,
        password: &str,
    ) -> Result<AadhaarRecord, KycError> {
        tracing::debug!(
            file = %document.file_name,
            size = document.content.len(),
            "Extracting Aadhaar details"
        );
        tokio::time::sleep(self.delay).await;

        if let Some(expected) = &self.expected_password {
            if expected != password {
                return Err(KycError::ExtractionFailed {
                    detail: "incorrect document password".to_string(),
                });
            }
        }
        Ok(self.record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ob_core::domain::entities::AadhaarUpload;
    use ob_core::services::AadhaarVerification;
    use std::sync::Arc;

    fn upload(password: &str) -> AadhaarUpload {
        AadhaarUpload::new(
            AadhaarDocument::new("e-aadhaar.pdf", b"%PDF-1.5 ...".to_vec()),
            password,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_record_is_normalized() {
        let kyc = AadhaarVerification::new(Arc::new(StaticAadhaarExtractor::demo()));

        let record = kyc.verify(&upload("RAHU1995")).await.unwrap();
        assert_eq!(record.name, "Rahul");
        assert_eq!(record.dob, "15-08-1995");
        assert_eq!(record.aadhaar_number, "123454589012");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_password_fails_extraction() {
        let extractor = StaticAadhaarExtractor::demo().with_expected_password("RAHU1995");
        let kyc = AadhaarVerification::new(Arc::new(extractor));

        let err = kyc.verify(&upload("WRONG")).await.unwrap_err();
        assert!(matches!(err, KycError::ExtractionFailed { .. }));
        assert!(kyc.verify(&upload("RAHU1995")).await.is_ok());
    }
}
