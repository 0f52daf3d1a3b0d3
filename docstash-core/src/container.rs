//! The concurrent document container.
//!
//! A [`DocumentContainer`] is a named collection of JSON bodies keyed by
//! case-insensitive identifiers. It is shared between threads by reference
//! (usually behind an `Arc`) and needs no external locking: single-key
//! operations are atomic on the underlying sharded map, and updates use a
//! compare-and-swap retry loop so concurrent writers never lose each other's
//! writes or resurrect deleted documents.
//!
//! Every successful mutation awaits [`DirtyTracker::mark_dirty`] before
//! returning, so a successful return means the durability layer has been told.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docstash::{prelude::*, memory::InMemoryDirtyTracker};
//!
//! let tracker = Arc::new(InMemoryDirtyTracker::new());
//! let users = DocumentContainer::new("users", tracker.clone());
//! let cancel = CancellationSignal::new();
//!
//! users.add_item("u1", r#"{"name":"a"}"#, &cancel).await?;
//! users.update_item("U1", r#"{"name":"b"}"#, &cancel).await?;
//!
//! assert_eq!(users.get_item("u1")?.as_deref(), Some(r#"{"name":"b"}"#));
//! assert_eq!(tracker.mark_count("users").await, 2);
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use dashmap::{DashMap, mapref::entry::Entry};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    cancel::CancellationSignal,
    document::{Document, DocumentExt, decode_body},
    durability::DirtyTracker,
    error::{ContainerError, ContainerResult},
    evaluator::{DocumentEvaluator, compare_by_field},
    id::DocumentId,
    options::ContainerOptions,
    query::Query,
    queryable::Queryable,
};

const LOG_TARGET: &str = "docstash::container";

type DocumentMap = DashMap<DocumentId, Arc<str>>;

/// A named, concurrently accessible collection of serialized documents.
///
/// # Lifecycle
///
/// A container is `Active` from construction until [`dispose`](Self::dispose)
/// is called, after which every operation fails with
/// [`ContainerError::Disposed`]. The transition happens once and never reverts.
#[derive(Debug)]
pub struct DocumentContainer {
    name: String,
    documents: DocumentMap,
    disposed: AtomicBool,
    tracker: Arc<dyn DirtyTracker>,
}

impl DocumentContainer {
    /// Creates an empty container with default options.
    ///
    /// Empty containers are logged as a warning since they usually point at
    /// a missing or truncated load.
    pub fn new(name: impl Into<String>, tracker: Arc<dyn DirtyTracker>) -> Self {
        Self::assemble(name.into(), tracker, Vec::new(), &ContainerOptions::default())
    }

    /// Creates a container pre-populated from an initial snapshot.
    ///
    /// If an identifier appears more than once (ignoring case) the first value
    /// wins and each duplicate is logged; construction never fails on snapshot
    /// content.
    pub fn from_snapshot<I, K, V>(name: impl Into<String>, tracker: Arc<dyn DirtyTracker>, snapshot: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let snapshot = collect_snapshot(snapshot);
        Self::assemble(name.into(), tracker, snapshot, &ContainerOptions::default())
    }

    /// Creates a builder for a container with custom options.
    pub fn builder(name: impl Into<String>, tracker: Arc<dyn DirtyTracker>) -> DocumentContainerBuilder {
        DocumentContainerBuilder::new(name, tracker)
    }

    fn assemble(
        name: String,
        tracker: Arc<dyn DirtyTracker>,
        snapshot: Vec<(String, String)>,
        options: &ContainerOptions,
    ) -> Self {
        let capacity = snapshot.len().max(options.initial_capacity.unwrap_or(0));
        let documents = match options.shard_amount {
            Some(shards) => DocumentMap::with_capacity_and_shard_amount(capacity, shards),
            None => DocumentMap::with_capacity(capacity),
        };

        if snapshot.is_empty() {
            tracing::warn!(target: LOG_TARGET, container = %name, "Container initialized without documents");
        } else {
            let total = snapshot.len();

            for (id, body) in snapshot {
                match documents.entry(DocumentId::new(id)) {
                    Entry::Occupied(existing) => {
                        tracing::warn!(
                            target: LOG_TARGET,
                            container = %name,
                            id = %existing.key(),
                            "Duplicate document id in snapshot, keeping first value"
                        );
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(Arc::from(body));
                    }
                }
            }

            tracing::debug!(
                target: LOG_TARGET,
                container = %name,
                loaded = documents.len(),
                total,
                "Container loaded from snapshot"
            );
        }

        Self {
            name,
            documents,
            disposed: AtomicBool::new(false),
            tracker,
        }
    }

    /// Returns the container name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` once [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn ensure_active(&self) -> ContainerResult<()> {
        if self.is_disposed() {
            return Err(ContainerError::Disposed(self.name.clone()));
        }

        Ok(())
    }

    fn not_found(&self, id: &str) -> ContainerError {
        ContainerError::NotFound(id.to_string(), self.name.clone())
    }

    async fn mark_dirty(&self, cancel: &CancellationSignal) -> ContainerResult<()> {
        cancel.run(self.tracker.mark_dirty(&self.name, cancel)).await
    }

    /// Inserts a document if its identifier is not taken.
    ///
    /// # Errors
    ///
    /// - [`ContainerError::AlreadyExists`] if the id is present; the stored value is untouched.
    /// - [`ContainerError::Durability`] or [`ContainerError::Cancelled`] after the insert was applied.
    pub async fn add_item(
        &self,
        id: impl Into<String>,
        value: impl Into<String>,
        cancel: &CancellationSignal,
    ) -> ContainerResult<String> {
        self.ensure_active()?;

        let value = value.into();
        let inserted = match self.documents.entry(DocumentId::new(id)) {
            Entry::Occupied(existing) => Err(ContainerError::AlreadyExists(
                existing.key().to_string(),
                self.name.clone(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(Arc::from(value.as_str()));
                Ok(())
            }
        };
        inserted?;

        self.mark_dirty(cancel).await?;
        Ok(value)
    }

    /// Looks up a document body. A missing id is `Ok(None)`.
    pub fn get_item(&self, id: &str) -> ContainerResult<Option<String>> {
        self.ensure_active()?;

        Ok(
            self.documents
                .get(&DocumentId::new(id))
                .map(|entry| entry.value().to_string())
        )
    }

    /// Looks up a document body, failing with [`ContainerError::NotFound`] if it is missing.
    pub fn get_item_strict(&self, id: &str) -> ContainerResult<String> {
        self.get_item(id)?.ok_or_else(|| self.not_found(id))
    }

    /// Returns `true` if a document with this id is present.
    pub fn contains_item(&self, id: &str) -> ContainerResult<bool> {
        self.ensure_active()?;
        Ok(self.documents.contains_key(&DocumentId::new(id)))
    }

    /// Replaces the body stored under `key` if it is present.
    ///
    /// Reads the current value, then swaps only if the entry still holds that
    /// exact value. Losing the race to another writer retries; finding the key
    /// gone ends the loop. Returns whether the swap happened.
    fn compare_and_swap(&self, key: &DocumentId, body: &Arc<str>) -> bool {
        loop {
            let Some(current) = self.documents.get(key).map(|entry| Arc::clone(entry.value())) else {
                return false;
            };

            match self.documents.get_mut(key) {
                Some(mut entry) if Arc::ptr_eq(entry.value(), &current) => {
                    *entry.value_mut() = Arc::clone(body);
                    return true;
                }
                Some(_) => {
                    tracing::trace!(target: LOG_TARGET, container = %self.name, id = %key, "Update lost race, retrying");
                }
                None => return false,
            }
        }
    }

    /// Replaces a document body if the id is present.
    ///
    /// Returns `Ok(None)` without notifying the tracker if the id is missing,
    /// including when a concurrent delete removed it mid-update.
    pub async fn update_item(
        &self,
        id: &str,
        value: impl Into<String>,
        cancel: &CancellationSignal,
    ) -> ContainerResult<Option<String>> {
        self.ensure_active()?;

        let value = value.into();
        let body: Arc<str> = Arc::from(value.as_str());

        if !self.compare_and_swap(&DocumentId::new(id), &body) {
            return Ok(None);
        }

        self.mark_dirty(cancel).await?;
        Ok(Some(value))
    }

    /// Replaces a document body, failing with [`ContainerError::NotFound`] if the id is missing.
    pub async fn update_item_strict(
        &self,
        id: &str,
        value: impl Into<String>,
        cancel: &CancellationSignal,
    ) -> ContainerResult<String> {
        self.update_item(id, value, cancel)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    /// Removes a document.
    ///
    /// # Errors
    ///
    /// [`ContainerError::NotFound`] if the id is missing.
    pub async fn delete_item(&self, id: &str, cancel: &CancellationSignal) -> ContainerResult<()> {
        self.ensure_active()?;

        if self.documents.remove(&DocumentId::new(id)).is_none() {
            return Err(self.not_found(id));
        }

        self.mark_dirty(cancel).await
    }

    /// Removes every document and notifies the tracker once.
    pub async fn delete_all_items(&self, cancel: &CancellationSignal) -> ContainerResult<()> {
        self.ensure_active()?;

        self.documents.clear();
        tracing::debug!(target: LOG_TARGET, container = %self.name, "All documents deleted");

        self.mark_dirty(cancel).await
    }

    /// Copies every document body. Order is unspecified.
    ///
    /// The copy is taken shard by shard under the map's own read locks, so it
    /// is consistent within each shard but not a single point-in-time view of
    /// the whole map: a write racing the copy may show up in one shard and not
    /// another.
    pub fn get_all_items(&self) -> ContainerResult<Vec<String>> {
        self.ensure_active()?;

        Ok(
            self.documents
                .iter()
                .map(|entry| entry.value().to_string())
                .collect()
        )
    }

    /// Copies every document id, spelled as first inserted. Order is unspecified.
    ///
    /// Like [`get_all_items`](Self::get_all_items), the copy is consistent per
    /// shard, not across the whole map.
    pub fn get_all_ids(&self) -> ContainerResult<Vec<String>> {
        self.ensure_active()?;

        Ok(
            self.documents
                .iter()
                .map(|entry| entry.key().as_str().to_string())
                .collect()
        )
    }

    /// Copies every `(id, body)` pair, e.g. for the durability layer to persist.
    ///
    /// Each pair is read atomically, and each shard is copied under its read
    /// lock, but shards are visited one after another. A flusher that needs a
    /// quiescent image must stop writers first; otherwise the next dirty mark
    /// from a racing writer triggers another flush that picks up its change.
    pub fn get_all_entries(&self) -> ContainerResult<Vec<(String, String)>> {
        self.ensure_active()?;
        Ok(self.entries())
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.documents
            .iter()
            .map(|entry| (entry.key().as_str().to_string(), entry.value().to_string()))
            .collect()
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> ContainerResult<usize> {
        self.ensure_active()?;
        Ok(self.documents.len())
    }

    /// Returns `true` if the container holds no documents.
    pub fn is_empty(&self) -> ContainerResult<bool> {
        self.ensure_active()?;
        Ok(self.documents.is_empty())
    }

    /// Decodes every stored body into `T` and returns them as a [`Queryable`].
    ///
    /// Bodies that fail to decode are logged and skipped.
    pub fn build_queryable<T: DeserializeOwned>(&self) -> ContainerResult<Queryable<T>> {
        self.ensure_active()?;

        Ok(
            self.entries()
                .into_iter()
                .filter_map(|(id, body)| self.decode_or_skip(&id, || decode_body::<T>(&body)))
                .collect()
        )
    }

    /// Runs a JSON-level [`Query`] and decodes the matching bodies into `T`.
    ///
    /// The filter and sort see the raw JSON; offset and limit apply after
    /// sorting. Bodies that are not valid JSON, or that match but fail to
    /// decode into `T`, are logged and skipped.
    pub fn query<T: DeserializeOwned>(&self, query: &Query) -> ContainerResult<Queryable<T>> {
        self.ensure_active()?;

        let mut matched = self
            .entries()
            .into_iter()
            .filter_map(|(id, body)| {
                let json = self.decode_or_skip(&id, || decode_body::<Value>(&body))?;
                let keep = query
                    .filter
                    .as_ref()
                    .is_none_or(|expr| DocumentEvaluator::matches(&json, expr));

                keep.then_some((id, json))
            })
            .collect::<Vec<_>>();

        if let Some(sort) = &query.sort {
            matched.sort_by(|(_, a), (_, b)| compare_by_field(a, b, &sort.field, sort.direction));
        }

        Ok(
            matched
                .into_iter()
                .skip(query.offset.unwrap_or(0))
                .take(query.limit.unwrap_or(usize::MAX))
                .filter_map(|(id, json)| {
                    self.decode_or_skip(&id, || serde_json::from_value::<T>(json).map_err(Into::into))
                })
                .collect()
        )
    }

    fn decode_or_skip<T>(&self, id: &str, decode: impl FnOnce() -> ContainerResult<T>) -> Option<T> {
        match decode() {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(
                    target: LOG_TARGET,
                    container = %self.name,
                    id,
                    error = %error,
                    "Skipping document that failed to deserialize"
                );
                None
            }
        }
    }

    /// Serializes and inserts a typed document under its own id.
    pub async fn add_document<D: Document>(&self, document: &D, cancel: &CancellationSignal) -> ContainerResult<()> {
        let body = document.to_body()?;
        self.add_item(document.id(), body, cancel).await.map(|_| ())
    }

    /// Fetches and decodes a typed document.
    ///
    /// Unlike [`build_queryable`](Self::build_queryable), a body that fails to
    /// decode is an error for this call.
    pub fn get_document<D: Document>(&self, id: &str) -> ContainerResult<Option<D>> {
        self.get_item(id)?
            .map(|body| D::from_body(&body))
            .transpose()
    }

    /// Serializes a typed document and replaces the stored one with the same id.
    ///
    /// # Errors
    ///
    /// [`ContainerError::NotFound`] if no document with this id exists.
    pub async fn update_document<D: Document>(&self, document: &D, cancel: &CancellationSignal) -> ContainerResult<()> {
        let body = document.to_body()?;
        self.update_item_strict(document.id(), body, cancel).await.map(|_| ())
    }

    /// Tears the container down.
    ///
    /// Safe to call concurrently and repeatedly: exactly one call flips the
    /// container to disposed, clears the map and returns `true`. Every other
    /// call returns `false` with no side effects. Nothing is flushed.
    pub fn dispose(&self) -> bool {
        if self
            .disposed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let dropped = self.documents.len();
        self.documents.clear();

        tracing::debug!(target: LOG_TARGET, container = %self.name, dropped, "Container disposed");
        true
    }
}

fn collect_snapshot<I, K, V>(snapshot: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    snapshot
        .into_iter()
        .map(|(id, body)| (id.into(), body.into()))
        .collect()
}

/// Builder for [`DocumentContainer`] instances with custom options.
///
/// ```ignore
/// let container = DocumentContainer::builder("orders", tracker)
///     .with_snapshot(loaded_pairs)
///     .with_shard_amount(16)
///     .build()?;
/// ```
pub struct DocumentContainerBuilder {
    name: String,
    tracker: Arc<dyn DirtyTracker>,
    snapshot: Vec<(String, String)>,
    options: ContainerOptions,
}

impl DocumentContainerBuilder {
    /// Creates a builder with no snapshot and default options.
    pub fn new(name: impl Into<String>, tracker: Arc<dyn DirtyTracker>) -> Self {
        Self {
            name: name.into(),
            tracker,
            snapshot: Vec::new(),
            options: ContainerOptions::default(),
        }
    }

    /// Sets the initial `(id, body)` pairs, in load order.
    pub fn with_snapshot<I, K, V>(mut self, snapshot: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.snapshot = collect_snapshot(snapshot);
        self
    }

    /// Replaces all options at once.
    pub fn with_options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    /// Pre-sizes the map for at least `capacity` documents.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.options.initial_capacity = Some(capacity);
        self
    }

    /// Sets the number of map shards. Must be a power of two greater than one.
    pub fn with_shard_amount(mut self, shards: usize) -> Self {
        self.options.shard_amount = Some(shards);
        self
    }

    /// Builds the container.
    ///
    /// # Errors
    ///
    /// [`ContainerError::Configuration`] if the options are invalid.
    pub fn build(self) -> ContainerResult<DocumentContainer> {
        self.options.validate()?;

        Ok(DocumentContainer::assemble(self.name, self.tracker, self.snapshot, &self.options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::durability::NoopDirtyTracker;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use std::sync::{Mutex, atomic::AtomicUsize};

    #[derive(Debug, Default)]
    struct CountingTracker {
        marks: AtomicUsize,
        names: Mutex<Vec<String>>,
    }

    impl CountingTracker {
        fn marks(&self) -> usize {
            self.marks.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DirtyTracker for CountingTracker {
        async fn mark_dirty(&self, container: &str, _cancel: &CancellationSignal) -> ContainerResult<()> {
            self.marks.fetch_add(1, Ordering::SeqCst);
            self.names.lock().unwrap().push(container.to_string());
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FailingTracker;

    #[async_trait]
    impl DirtyTracker for FailingTracker {
        async fn mark_dirty(&self, _container: &str, _cancel: &CancellationSignal) -> ContainerResult<()> {
            Err(ContainerError::Durability("disk full".into()))
        }
    }

    #[derive(Debug)]
    struct StalledTracker;

    #[async_trait]
    impl DirtyTracker for StalledTracker {
        async fn mark_dirty(&self, _container: &str, _cancel: &CancellationSignal) -> ContainerResult<()> {
            futures::future::pending::<()>().await;
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        id: String,
        name: String,
        age: u32,
    }

    impl Document for User {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn counting() -> (Arc<CountingTracker>, DocumentContainer) {
        let tracker = Arc::new(CountingTracker::default());
        let container = DocumentContainer::new("users", tracker.clone());
        (tracker, container)
    }

    #[tokio::test]
    async fn add_then_get_strict_returns_value() {
        let (tracker, container) = counting();
        let cancel = CancellationSignal::new();

        let stored = container.add_item("u1", "{\"name\":\"a\"}", &cancel).await.unwrap();

        assert_eq!(stored, "{\"name\":\"a\"}");
        assert_eq!(container.get_item_strict("u1").unwrap(), "{\"name\":\"a\"}");
        assert_eq!(tracker.marks(), 1);
        assert_eq!(tracker.names.lock().unwrap().as_slice(), ["users".to_string()]);
    }

    #[tokio::test]
    async fn duplicate_add_fails_and_keeps_original() {
        let (tracker, container) = counting();
        let cancel = CancellationSignal::new();

        container.add_item("u1", "first", &cancel).await.unwrap();
        let err = container.add_item("U1", "second", &cancel).await.unwrap_err();

        assert!(matches!(err, ContainerError::AlreadyExists(id, name) if id == "u1" && name == "users"));
        assert_eq!(container.get_item("u1").unwrap().as_deref(), Some("first"));
        assert_eq!(tracker.marks(), 1);
    }

    #[tokio::test]
    async fn lookups_ignore_case() {
        let container = DocumentContainer::new("c", Arc::new(NoopDirtyTracker));
        let cancel = CancellationSignal::new();

        container.add_item("Abc", "v", &cancel).await.unwrap();

        assert_eq!(container.get_item("abc").unwrap().as_deref(), Some("v"));
        assert!(container.contains_item("ABC").unwrap());
        assert_eq!(container.get_all_ids().unwrap(), vec!["Abc".to_string()]);

        container.add_item("ΟΣ", "upper", &cancel).await.unwrap();

        assert_eq!(container.get_item("οσ").unwrap().as_deref(), Some("upper"));
        assert!(matches!(
            container.add_item("οσ", "lower", &cancel).await,
            Err(ContainerError::AlreadyExists(..))
        ));
        assert_eq!(container.len().unwrap(), 2);
    }

    #[tokio::test]
    async fn missing_keys() {
        let (tracker, container) = counting();
        let cancel = CancellationSignal::new();

        assert_eq!(container.get_item("nope").unwrap(), None);
        assert!(matches!(container.get_item_strict("nope"), Err(ContainerError::NotFound(..))));
        assert_eq!(container.update_item("nope", "v", &cancel).await.unwrap(), None);
        assert!(matches!(
            container.update_item_strict("nope", "v", &cancel).await,
            Err(ContainerError::NotFound(..))
        ));
        assert!(matches!(
            container.delete_item("nope", &cancel).await,
            Err(ContainerError::NotFound(..))
        ));
        assert_eq!(tracker.marks(), 0);
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let (tracker, container) = counting();
        let cancel = CancellationSignal::new();

        container.add_item("u1", "v", &cancel).await.unwrap();
        container.delete_item("U1", &cancel).await.unwrap();

        assert_eq!(container.get_item("u1").unwrap(), None);
        assert_eq!(tracker.marks(), 2);
    }

    #[tokio::test]
    async fn delete_all_notifies_once() {
        let tracker = Arc::new(CountingTracker::default());
        let container = DocumentContainer::from_snapshot(
            "bulk",
            tracker.clone(),
            (0..50).map(|i| (format!("k{i}"), format!("{i}"))),
        );

        container.delete_all_items(&CancellationSignal::new()).await.unwrap();

        assert!(container.get_all_ids().unwrap().is_empty());
        assert_eq!(tracker.marks(), 1);
    }

    #[test]
    fn snapshot_duplicates_keep_first_value() {
        let container = DocumentContainer::from_snapshot(
            "legacy",
            Arc::new(NoopDirtyTracker),
            vec![("Id", "first"), ("other", "x"), ("ID", "second")],
        );

        assert_eq!(container.len().unwrap(), 2);
        assert_eq!(container.get_item("id").unwrap().as_deref(), Some("first"));
    }

    #[test]
    fn builder_rejects_bad_shard_amount() {
        let result = DocumentContainer::builder("c", Arc::new(NoopDirtyTracker))
            .with_shard_amount(3)
            .build();

        assert!(matches!(result, Err(ContainerError::Configuration(_))));
    }

    #[test]
    fn builder_applies_snapshot_and_options() {
        let container = DocumentContainer::builder("c", Arc::new(NoopDirtyTracker))
            .with_snapshot([("a", "1"), ("b", "2")])
            .with_initial_capacity(128)
            .with_shard_amount(8)
            .build()
            .unwrap();

        let mut entries = container.get_all_entries().unwrap();
        entries.sort();

        assert_eq!(entries, vec![("a".into(), "1".into()), ("b".into(), "2".into())]);
    }

    #[tokio::test]
    async fn operations_fail_after_dispose() {
        let (_, container) = counting();
        let cancel = CancellationSignal::new();
        container.add_item("u1", "v", &cancel).await.unwrap();

        assert!(container.dispose());
        assert!(!container.dispose());
        assert!(container.is_disposed());

        assert!(matches!(container.add_item("u2", "v", &cancel).await, Err(ContainerError::Disposed(_))));
        assert!(matches!(container.get_item("u1"), Err(ContainerError::Disposed(_))));
        assert!(matches!(container.update_item("u1", "w", &cancel).await, Err(ContainerError::Disposed(_))));
        assert!(matches!(container.delete_item("u1", &cancel).await, Err(ContainerError::Disposed(_))));
        assert!(matches!(container.get_all_items(), Err(ContainerError::Disposed(_))));
        assert!(matches!(container.build_queryable::<Value>(), Err(ContainerError::Disposed(_))));
    }

    #[tokio::test]
    async fn tracker_failure_propagates_after_mutation() {
        let container = DocumentContainer::new("c", Arc::new(FailingTracker));
        let err = container
            .add_item("k", "v", &CancellationSignal::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ContainerError::Durability(_)));
        assert!(err.is_post_mutation());
        assert_eq!(container.get_item("k").unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn cancellation_keeps_mutation_visible() {
        let container = DocumentContainer::from_snapshot("c", Arc::new(StalledTracker), [("k", "old")]);
        let cancel = CancellationSignal::new();
        cancel.cancel();

        let err = container.update_item("k", "new", &cancel).await.unwrap_err();

        assert!(matches!(err, ContainerError::Cancelled));
        assert_eq!(container.get_item("k").unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn queryable_skips_malformed_bodies() {
        let container = DocumentContainer::from_snapshot(
            "users",
            Arc::new(NoopDirtyTracker),
            [
                ("u1", r#"{"id":"u1","name":"Ann","age":31}"#),
                ("u2", r#"{"id":"u2","name":"#),
            ],
        );

        let users = container.build_queryable::<User>().unwrap().into_vec();

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Ann");
    }

    #[tokio::test]
    async fn typed_helpers_round_trip() {
        let (tracker, container) = counting();
        let cancel = CancellationSignal::new();
        let mut user = User { id: "u1".into(), name: "Ann".into(), age: 31 };

        container.add_document(&user, &cancel).await.unwrap();
        user.age = 32;
        container.update_document(&user, &cancel).await.unwrap();

        assert_eq!(container.get_document::<User>("U1").unwrap(), Some(user));
        assert_eq!(tracker.marks(), 2);
    }

    #[test]
    fn get_document_reports_bad_body() {
        let container = DocumentContainer::from_snapshot("c", Arc::new(NoopDirtyTracker), [("u1", "[]")]);

        assert!(matches!(
            container.get_document::<User>("u1"),
            Err(ContainerError::Serialization(_))
        ));
    }

    #[test]
    fn query_filters_sorts_and_pages() {
        use crate::query::{Filter, SortDirection};

        let container = DocumentContainer::from_snapshot(
            "users",
            Arc::new(NoopDirtyTracker),
            [
                ("a", r#"{"id":"a","name":"Ann","age":31}"#),
                ("b", r#"{"id":"b","name":"Bob","age":17}"#),
                ("c", r#"{"id":"c","name":"Cid","age":45}"#),
                ("d", r#"{"id":"d","name":"Dee","age":52}"#),
                ("e", "not json"),
            ],
        );

        let query = Query::builder()
            .filter(Filter::gte("age", 18))
            .sort("age", SortDirection::Desc)
            .offset(1)
            .limit(2)
            .build();

        let names = container
            .query::<User>(&query)
            .unwrap()
            .select(|user| user.name)
            .into_vec();

        assert_eq!(names, vec!["Cid".to_string(), "Ann".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_keep_exactly_one_winner() {
        let container = Arc::new(DocumentContainer::from_snapshot(
            "race",
            Arc::new(NoopDirtyTracker),
            [("k", "initial")],
        ));

        for round in 0..50 {
            let v1 = format!("left-{round}");
            let v2 = format!("right-{round}");

            let left = {
                let container = container.clone();
                let v1 = v1.clone();
                tokio::spawn(async move { container.update_item("k", v1, &CancellationSignal::new()).await })
            };
            let right = {
                let container = container.clone();
                let v2 = v2.clone();
                tokio::spawn(async move { container.update_item("k", v2, &CancellationSignal::new()).await })
            };

            assert_eq!(left.await.unwrap().unwrap(), Some(v1.clone()));
            assert_eq!(right.await.unwrap().unwrap(), Some(v2.clone()));

            let stored = container.get_item("k").unwrap().unwrap();
            assert!(stored == v1 || stored == v2, "unexpected value {stored}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_dispose_has_single_winner() {
        let container = Arc::new(DocumentContainer::from_snapshot(
            "c",
            Arc::new(NoopDirtyTracker),
            [("k", "v")],
        ));

        let handles = (0..8)
            .map(|_| {
                let container = container.clone();
                tokio::spawn(async move { container.dispose() })
            })
            .collect::<Vec<_>>();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        assert!(container.is_disposed());
    }
}
