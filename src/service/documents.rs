//! Document reads and writes.
//!
//! Reads go cache first, then the store on a miss, populating the cache.
//! Writes go to the store first and then invalidate the cache entry before
//! returning, never the other way round. Cache failures only cost latency:
//! a failed lookup is a miss and a failed populate or invalidate is logged.

use std::sync::Arc;
use uuid::Uuid;

use crate::cache::DocumentCache;
use crate::db::DocumentRepository;
use crate::error::AppError;
use crate::models::{AccessMode, Document, DocumentPatch, NewDocument};
use crate::policy::{self, decide, Action, Principal};

pub struct DocumentService {
    store: DocumentRepository,
    cache: Arc<dyn DocumentCache>,
}

impl DocumentService {
    pub fn new(store: DocumentRepository, cache: Arc<dyn DocumentCache>) -> Self {
        Self { store, cache }
    }

    /// Returns the document if `principal` may view it.
    ///
    /// A missing document is `NotFound` for every principal; an existing one
    /// the principal may not see is `Forbidden`.
    pub async fn read(&self, id: Uuid, principal: &Principal) -> Result<Document, AppError> {
        let document = self.read_through(id).await?;
        decide(principal, document.as_ref(), Action::View).into_result(Action::View)?;
        document.ok_or_else(|| AppError::not_found("document"))
    }

    /// Every document `principal` may view, read straight from the store.
    pub async fn list(&self, principal: &Principal) -> Result<Vec<Document>, AppError> {
        let documents = self.store.list().await?;
        Ok(policy::visible(principal, documents))
    }

    pub async fn create(
        &self,
        principal: &Principal,
        input: NewDocument,
    ) -> Result<Document, AppError> {
        decide(principal, None, Action::Create).into_result(Action::Create)?;
        let user = principal
            .as_user()
            .ok_or_else(|| AppError::forbidden("authentication required"))?;

        let title = validate_title(&input.title)?;
        let role = match (input.access, input.role) {
            (_, Some(role)) => Some(role),
            (AccessMode::Role, None) => Some(user.role_id),
            _ => None,
        };

        let mut document = Document::new(title, user.user_id)
            .with_content(input.content)
            .with_access(input.access);
        document.role = role;

        let created = self.store.create(&document).await?;
        tracing::info!(document_id = %created.id, owner = %created.owner_id, "document created");
        Ok(created)
    }

    pub async fn update(
        &self,
        id: Uuid,
        principal: &Principal,
        patch: DocumentPatch,
    ) -> Result<Document, AppError> {
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }

        let mut document = self.authorize_mutation(id, principal).await?;
        document.apply(DocumentPatch {
            title: patch.title.map(|t| t.trim().to_string()),
            ..patch
        });
        if document.access == AccessMode::Role && document.role.is_none() {
            document.role = principal.role_id();
        }

        let updated = self.store.update(&document).await?;
        self.evict(id).await;
        tracing::info!(document_id = %id, "document updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid, principal: &Principal) -> Result<Document, AppError> {
        self.authorize_mutation(id, principal).await?;

        let deleted = self.store.delete(id).await?;
        self.evict(id).await;
        tracing::info!(document_id = %id, "document deleted");
        Ok(deleted)
    }

    /// Mutations always decide on fresh store state, never on a cached copy.
    async fn authorize_mutation(
        &self,
        id: Uuid,
        principal: &Principal,
    ) -> Result<Document, AppError> {
        let document = self.store.find(id).await?;
        decide(principal, document.as_ref(), Action::Mutate).into_result(Action::Mutate)?;
        document.ok_or_else(|| AppError::not_found("document"))
    }

    async fn read_through(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        match self.cache.get(id).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<Document>(&bytes) {
                Ok(document) => {
                    tracing::debug!(document_id = %id, "cache hit");
                    return Ok(Some(document));
                }
                Err(e) => {
                    tracing::warn!(document_id = %id, error = %e, "discarding unreadable cache entry");
                    self.evict(id).await;
                }
            },
            Ok(None) => tracing::debug!(document_id = %id, "cache miss"),
            Err(e) => {
                tracing::warn!(document_id = %id, error = %e, "cache lookup failed, reading from store")
            }
        }

        let Some(document) = self.store.find(id).await? else {
            return Ok(None);
        };
        self.populate(&document).await;
        Ok(Some(document))
    }

    async fn populate(&self, document: &Document) {
        let bytes = match serde_json::to_vec(document) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(document_id = %document.id, error = %e, "failed to serialize snapshot");
                return;
            }
        };
        if let Err(e) = self.cache.put(document.id, bytes).await {
            tracing::warn!(document_id = %document.id, error = %e, "cache populate failed");
            return;
        }

        // A write may have committed and invalidated between our store read
        // and the put; the snapshot is only kept if the row is unchanged.
        match self.store.find(document.id).await {
            Ok(Some(current)) if current == *document => {}
            Ok(_) => {
                tracing::debug!(document_id = %document.id, "dropping snapshot superseded by a write");
                self.evict(document.id).await;
            }
            Err(e) => {
                tracing::warn!(document_id = %document.id, error = %e, "could not confirm snapshot");
                self.evict(document.id).await;
            }
        }
    }

    async fn evict(&self, id: Uuid) {
        if let Err(e) = self.cache.invalidate(id).await {
            tracing::warn!(document_id = %id, error = %e, "cache invalidation failed");
        }
    }
}

fn validate_title(title: &str) -> Result<&str, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation("title must not be empty"));
    }
    Ok(title)
}
