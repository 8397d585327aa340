//! Uploaded prescription files and stored prescription records.
//!
//! An upload followed by a metadata write is a two-phase commit: the uploaded
//! file stays provisional until the record referencing it is created, and is
//! deleted again if that write fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::CommerceError;
use crate::ids::{ArtifactId, CustomerId, PrescriptionId};
use crate::prescription::PrescriptionCategory;

/// A file selected by the buyer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// Reference to a file held by the upload collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredArtifact {
    pub id: ArtifactId,
    pub url: String,
    pub file_name: String,
}

/// A prescription record kept for a signed-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPrescription {
    pub id: PrescriptionId,
    pub customer_id: CustomerId,
    pub category: PrescriptionCategory,
    /// Display name chosen by the customer.
    pub name: String,
    pub file: StoredArtifact,
}

/// Input for creating a stored prescription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPrescription {
    pub customer_id: CustomerId,
    pub category: PrescriptionCategory,
    pub name: String,
    pub file: StoredArtifact,
}

/// File storage collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactUploader: Send + Sync {
    /// Store a file and return its reference.
    async fn upload(&self, file: UploadFile) -> Result<StoredArtifact, CommerceError>;

    /// Remove a previously stored file.
    async fn delete(&self, id: &ArtifactId) -> Result<(), CommerceError>;
}

/// Stored prescription collaborator, scoped by customer and category.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrescriptionStore: Send + Sync {
    async fn list(
        &self,
        customer_id: &CustomerId,
        category: PrescriptionCategory,
    ) -> Result<Vec<StoredPrescription>, CommerceError>;

    async fn create(&self, input: NewPrescription) -> Result<StoredPrescription, CommerceError>;

    async fn delete(&self, id: &PrescriptionId) -> Result<(), CommerceError>;
}

/// Upload `file`, surfacing any failure as [`CommerceError::Upload`].
pub async fn upload_artifact(
    uploader: &dyn ArtifactUploader,
    file: UploadFile,
) -> Result<StoredArtifact, CommerceError> {
    let file_name = file.file_name.clone();
    match uploader.upload(file).await {
        Ok(artifact) => {
            info!(file = %file_name, artifact = %artifact.id, "prescription file uploaded");
            Ok(artifact)
        }
        Err(CommerceError::Upload(message)) => Err(CommerceError::Upload(message)),
        Err(other) => Err(CommerceError::Upload(other.to_string())),
    }
}

/// An uploaded file that has not yet been referenced by a record.
pub struct ProvisionalArtifact<'a> {
    artifact: StoredArtifact,
    uploader: &'a dyn ArtifactUploader,
}

impl<'a> ProvisionalArtifact<'a> {
    /// Phase one: upload.
    pub async fn upload(
        uploader: &'a dyn ArtifactUploader,
        file: UploadFile,
    ) -> Result<ProvisionalArtifact<'a>, CommerceError> {
        let artifact = upload_artifact(uploader, file).await?;
        Ok(Self { artifact, uploader })
    }

    pub fn artifact(&self) -> &StoredArtifact {
        &self.artifact
    }

    /// Phase two succeeded; keep the file.
    pub fn commit(self) -> StoredArtifact {
        self.artifact
    }

    /// Phase two failed; delete the file. A failed delete is logged, not returned,
    /// so the caller still sees the original error.
    pub async fn rollback(self) {
        match self.uploader.delete(&self.artifact.id).await {
            Ok(()) => info!(artifact = %self.artifact.id, "rolled back provisional upload"),
            Err(e) => error!(
                artifact = %self.artifact.id,
                error = %e,
                "failed to delete orphaned upload"
            ),
        }
    }
}

/// Upload a prescription file and register it for the customer.
///
/// If registration fails the uploaded file is deleted before the error is returned.
pub async fn upload_and_register(
    uploader: &dyn ArtifactUploader,
    store: &dyn PrescriptionStore,
    file: UploadFile,
    customer_id: &CustomerId,
    category: PrescriptionCategory,
    name: impl Into<String>,
) -> Result<StoredPrescription, CommerceError> {
    let provisional = ProvisionalArtifact::upload(uploader, file).await?;

    let input = NewPrescription {
        customer_id: customer_id.clone(),
        category,
        name: name.into(),
        file: provisional.artifact().clone(),
    };

    match store.create(input).await {
        Ok(record) => {
            provisional.commit();
            info!(prescription = %record.id, category = category.as_str(), "prescription registered");
            Ok(record)
        }
        Err(e) => {
            warn!(error = %e, "prescription registration failed, compensating");
            provisional.rollback().await;
            Err(match e {
                CommerceError::PrescriptionStore(message) => CommerceError::PrescriptionStore(message),
                other => CommerceError::PrescriptionStore(other.to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn artifact() -> StoredArtifact {
        StoredArtifact {
            id: ArtifactId::new("file-1"),
            url: "https://files.example.com/rx.pdf".to_string(),
            file_name: "rx.pdf".to_string(),
        }
    }

    fn file() -> UploadFile {
        UploadFile::new("rx.pdf", "application/pdf", vec![1, 2, 3])
    }

    #[tokio::test]
    async fn test_registration_failure_deletes_upload() {
        let mut uploader = MockArtifactUploader::new();
        uploader.expect_upload().times(1).returning(|_| Ok(artifact()));
        uploader
            .expect_delete()
            .with(eq(ArtifactId::new("file-1")))
            .times(1)
            .returning(|_| Ok(()));

        let mut store = MockPrescriptionStore::new();
        store
            .expect_create()
            .times(1)
            .returning(|_| Err(CommerceError::PrescriptionStore("db down".into())));

        let result = upload_and_register(
            &uploader,
            &store,
            file(),
            &CustomerId::new("c1"),
            PrescriptionCategory::ContactLenses,
            "2025 exam",
        )
        .await;

        assert!(matches!(result, Err(CommerceError::PrescriptionStore(_))));
    }

    #[tokio::test]
    async fn test_successful_registration_keeps_upload() {
        let mut uploader = MockArtifactUploader::new();
        uploader.expect_upload().times(1).returning(|_| Ok(artifact()));
        uploader.expect_delete().times(0);

        let mut store = MockPrescriptionStore::new();
        store.expect_create().times(1).returning(|input| {
            Ok(StoredPrescription {
                id: PrescriptionId::new("rx-9"),
                customer_id: input.customer_id,
                category: input.category,
                name: input.name,
                file: input.file,
            })
        });

        let record = upload_and_register(
            &uploader,
            &store,
            file(),
            &CustomerId::new("c1"),
            PrescriptionCategory::Eyeglasses,
            "Glasses",
        )
        .await
        .unwrap();

        assert_eq!(record.file, artifact());
    }

    #[tokio::test]
    async fn test_upload_failure_never_touches_store() {
        let mut uploader = MockArtifactUploader::new();
        uploader
            .expect_upload()
            .returning(|_| Err(CommerceError::remote("storage quota")));
        let mut store = MockPrescriptionStore::new();
        store.expect_create().times(0);

        let result = upload_and_register(
            &uploader,
            &store,
            file(),
            &CustomerId::new("c1"),
            PrescriptionCategory::Eyeglasses,
            "Glasses",
        )
        .await;

        assert!(matches!(result, Err(CommerceError::Upload(_))));
    }

    #[tokio::test]
    async fn test_failed_compensation_still_returns_original_error() {
        let mut uploader = MockArtifactUploader::new();
        uploader.expect_upload().returning(|_| Ok(artifact()));
        uploader
            .expect_delete()
            .times(1)
            .returning(|_| Err(CommerceError::Upload("gone".into())));
        let mut store = MockPrescriptionStore::new();
        store
            .expect_create()
            .returning(|_| Err(CommerceError::PrescriptionStore("conflict".into())));

        let err = upload_and_register(
            &uploader,
            &store,
            file(),
            &CustomerId::new("c1"),
            PrescriptionCategory::Eyeglasses,
            "Glasses",
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "Prescription store error: conflict");
    }
}
