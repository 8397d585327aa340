//! In-memory upload and prescription-store collaborators (for development/testing).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::CommerceError;
use crate::ids::{ArtifactId, CustomerId, PrescriptionId};
use crate::prescription::{
    ArtifactUploader, NewPrescription, PrescriptionCategory, PrescriptionStore, StoredArtifact,
    StoredPrescription, UploadFile,
};

/// Keeps uploaded files in a map.
#[derive(Default)]
pub struct MemoryUploader {
    files: Mutex<HashMap<ArtifactId, UploadFile>>,
    fail_uploads: AtomicBool,
}

impl MemoryUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upload fail.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Number of files currently held.
    pub fn len(&self) -> usize {
        self.files.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ArtifactUploader for MemoryUploader {
    async fn upload(&self, file: UploadFile) -> Result<StoredArtifact, CommerceError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(CommerceError::Upload("file storage unavailable".to_string()));
        }
        if file.bytes.is_empty() {
            return Err(CommerceError::Upload(format!("{} is empty", file.file_name)));
        }
        let id = ArtifactId::generate();
        let artifact = StoredArtifact {
            id: id.clone(),
            url: format!("memory://uploads/{}/{}", id, file.file_name),
            file_name: file.file_name.clone(),
        };
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, file);
        Ok(artifact)
    }

    async fn delete(&self, id: &ArtifactId) -> Result<(), CommerceError> {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);
        Ok(())
    }
}

/// Keeps prescription records in insertion order.
#[derive(Default)]
pub struct MemoryPrescriptionStore {
    records: Mutex<Vec<StoredPrescription>>,
    fail_creates: AtomicBool,
}

impl MemoryPrescriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent create fail.
    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PrescriptionStore for MemoryPrescriptionStore {
    async fn list(
        &self,
        customer_id: &CustomerId,
        category: PrescriptionCategory,
    ) -> Result<Vec<StoredPrescription>, CommerceError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records
            .iter()
            .filter(|r| &r.customer_id == customer_id && r.category == category)
            .cloned()
            .collect())
    }

    async fn create(&self, input: NewPrescription) -> Result<StoredPrescription, CommerceError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(CommerceError::PrescriptionStore(
                "prescription store unavailable".to_string(),
            ));
        }
        let record = StoredPrescription {
            id: PrescriptionId::generate(),
            customer_id: input.customer_id,
            category: input.category,
            name: input.name,
            file: input.file,
        };
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &PrescriptionId) -> Result<(), CommerceError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let before = records.len();
        records.retain(|r| &r.id != id);
        if records.len() == before {
            return Err(CommerceError::PrescriptionStore(format!("no prescription {}", id)));
        }
        Ok(())
    }
}
