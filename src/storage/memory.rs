//! In-memory storage implementation
//!
//! Used by tests and by one-shot runs that do not need to persist anything.

use crate::state::{CrawlJob, JobStatus};
use crate::storage::traits::{DocumentStore, JobStore, StorageError, StorageResult};
use crate::storage::{Document, DocumentFilter};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStorage {
    documents: Mutex<Vec<Document>>,
    jobs: Mutex<HashMap<String, CrawlJob>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStorage {
    fn upsert_if_absent(&self, doc: &Document) -> StorageResult<bool> {
        let mut documents = self.documents.lock().map_err(|_| StorageError::Poisoned)?;
        if documents.iter().any(|d| d.url == doc.url) {
            return Ok(false);
        }
        documents.push(doc.clone());
        Ok(true)
    }

    fn find_all(&self, filter: &DocumentFilter) -> StorageResult<Vec<Document>> {
        let documents = self.documents.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(documents
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect())
    }

    fn count(&self, filter: &DocumentFilter) -> StorageResult<u64> {
        let documents = self.documents.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(documents.iter().filter(|d| filter.matches(d)).count() as u64)
    }
}

impl JobStore for MemoryStorage {
    fn insert_job(&self, job: &CrawlJob) -> StorageResult<()> {
        let mut jobs = self.jobs.lock().map_err(|_| StorageError::Poisoned)?;
        if jobs.contains_key(&job.id) {
            return Err(StorageError::DuplicateJob(job.id.clone()));
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    fn get_job(&self, id: &str) -> StorageResult<Option<CrawlJob>> {
        let jobs = self.jobs.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(jobs.get(id).cloned())
    }

    fn update_job(&self, job: &CrawlJob) -> StorageResult<()> {
        let mut jobs = self.jobs.lock().map_err(|_| StorageError::Poisoned)?;
        match jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job.clone();
                Ok(())
            }
            None => Err(StorageError::JobNotFound(job.id.clone())),
        }
    }

    fn delete_completed_before(&self, cutoff: DateTime<Utc>) -> StorageResult<u64> {
        let mut jobs = self.jobs.lock().map_err(|_| StorageError::Poisoned)?;
        let before = jobs.len();
        jobs.retain(|_, job| !(job.status == JobStatus::Completed && job.updated_at < cutoff));
        Ok((before - jobs.len()) as u64)
    }
}
