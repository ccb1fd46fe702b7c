// Document Repository Port (generic CRUD over a backing document store)

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// A persistable entity: a flat JSON document with an `id` field plus
/// `created_at`/`updated_at` timestamps maintained by the repository.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Collection the documents of this type live in
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

/// A single field condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
}

impl Condition {
    /// Evaluate this condition against a document field value.
    ///
    /// Incomparable values (missing field, mixed types) never match, except
    /// for `Ne` which matches whenever equality cannot be established.
    pub fn matches(&self, actual: Option<&Value>) -> bool {
        match self {
            Condition::Eq(expected) => actual == Some(expected),
            Condition::Ne(expected) => actual != Some(expected),
            Condition::Gt(expected) => compare_values(actual, expected) == Some(Ordering::Greater),
            Condition::Gte(expected) => matches!(
                compare_values(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Condition::Lt(expected) => compare_values(actual, expected) == Some(Ordering::Less),
            Condition::Lte(expected) => matches!(
                compare_values(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

fn compare_values(actual: Option<&Value>, expected: &Value) -> Option<Ordering> {
    match (actual?, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Query over a collection: equality/comparison conditions, `+field`/`-field`
/// sort, pagination and field projection. Anything the store cannot interpret
/// (unknown sort field, malformed spec) falls back to defaults instead of
/// erroring.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub conditions: BTreeMap<String, Condition>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub projections: Vec<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.conditions.insert(field.into(), condition);
        self
    }

    /// Sort spec: `"+field"` ascending, `"-field"` descending.
    pub fn sort(mut self, spec: impl Into<String>) -> Self {
        self.sort = Some(spec.into());
        self
    }

    pub fn paginate(mut self, page: u32, per_page: u32) -> Self {
        self.page = Some(page);
        self.per_page = Some(per_page);
        self
    }

    /// Restrict returned documents to the named fields.
    ///
    /// The projection is applied to the stored JSON before decoding, so it
    /// must retain every field the entity type requires.
    pub fn project(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.projections = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Resolved sort field and direction; defaults to ascending creation time.
    pub fn sort_spec(&self) -> (String, bool) {
        let default = ("created_at".to_string(), true);
        let Some(spec) = self.sort.as_deref() else {
            return default;
        };
        let (ascending, field) = match spec.split_at_checked(1) {
            Some(("+", field)) => (true, field),
            Some(("-", field)) => (false, field),
            _ => (true, spec),
        };
        if field.is_empty() {
            return default;
        }
        (field.to_string(), ascending)
    }

    /// Apply the projection (if any) to a raw document.
    pub fn apply_projection(&self, mut document: Value) -> Value {
        if self.projections.is_empty() {
            return document;
        }
        if let Value::Object(ref mut map) = document {
            map.retain(|key, _| self.projections.iter().any(|p| p == key));
        }
        document
    }
}

/// Repository interface over a document collection.
///
/// All operations are safe to call concurrently for different ids; same-id
/// operations are serialized by the backing store's own atomicity. The
/// repository adds no locking of its own.
#[async_trait]
pub trait DocumentRepository<T: Document>: Send + Sync {
    /// Assign id and timestamps, persist, and return the stored entity.
    /// `fields` must be a JSON object.
    async fn create(&self, fields: Value) -> Result<T>;

    /// Load by id; `NotFound` if absent.
    async fn by_id(&self, id: &str) -> Result<T>;

    /// List documents matching `query`.
    async fn all(&self, query: Query) -> Result<Vec<T>>;

    /// Apply a partial field update as one indivisible store operation
    /// (no read-modify-write window) and return the updated entity.
    /// `NotFound` if the id does not exist.
    async fn atomic_update(&self, id: &str, partial: Value) -> Result<T>;

    /// Remove and return the prior entity; `NotFound` if absent.
    async fn destroy(&self, id: &str) -> Result<T>;
}

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use crate::port::{IdProvider, TimeProvider};
    use serde_json::json;
    use std::marker::PhantomData;
    use std::sync::{Arc, Mutex};

    /// In-memory document repository for unit tests.
    ///
    /// A `Mutex` around the whole collection makes every operation atomic,
    /// which matches the store guarantee the SQLite adapter gets from
    /// single-statement SQL.
    pub struct InMemoryDocumentRepository<T: Document> {
        documents: Mutex<BTreeMap<String, Value>>,
        ids: Arc<dyn IdProvider>,
        clock: Arc<dyn TimeProvider>,
        _marker: PhantomData<fn() -> T>,
    }

    impl<T: Document> InMemoryDocumentRepository<T> {
        pub fn new(ids: Arc<dyn IdProvider>, clock: Arc<dyn TimeProvider>) -> Self {
            Self {
                documents: Mutex::new(BTreeMap::new()),
                ids,
                clock,
                _marker: PhantomData,
            }
        }

        pub fn len(&self) -> usize {
            self.documents.lock().expect("lock poisoned").len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn not_found(id: &str) -> AppError {
            AppError::NotFound(format!("{} {} not found", T::COLLECTION, id))
        }

        fn decode(&self, document: Value) -> Result<T> {
            Ok(serde_json::from_value(document)?)
        }
    }

    #[async_trait]
    impl<T: Document> DocumentRepository<T> for InMemoryDocumentRepository<T> {
        async fn create(&self, fields: Value) -> Result<T> {
            let Value::Object(mut body) = fields else {
                return Err(AppError::Validation(
                    "document fields must be a JSON object".to_string(),
                ));
            };
            let id = self.ids.generate_id();
            let now = self.clock.now_millis();
            body.insert("id".to_string(), Value::String(id.clone()));
            body.insert("created_at".to_string(), json!(now));
            body.insert("updated_at".to_string(), json!(now));

            let document = Value::Object(body);
            self.documents
                .lock()
                .expect("lock poisoned")
                .insert(id, document.clone());
            self.decode(document)
        }

        async fn by_id(&self, id: &str) -> Result<T> {
            let documents = self.documents.lock().expect("lock poisoned");
            let document = documents.get(id).cloned().ok_or_else(|| Self::not_found(id))?;
            drop(documents);
            self.decode(document)
        }

        async fn all(&self, query: Query) -> Result<Vec<T>> {
            let documents = self.documents.lock().expect("lock poisoned");
            let mut matches: Vec<Value> = documents
                .values()
                .filter(|doc| {
                    query
                        .conditions
                        .iter()
                        .all(|(field, condition)| condition.matches(doc.get(field)))
                })
                .cloned()
                .collect();
            drop(documents);

            let (sort_field, ascending) = query.sort_spec();
            matches.sort_by(|a, b| {
                let ordering = match (a.get(&sort_field), b.get(&sort_field)) {
                    (Some(x), Some(y)) => match (x, y) {
                        (Value::Number(x), Value::Number(y)) => x
                            .as_f64()
                            .partial_cmp(&y.as_f64())
                            .unwrap_or(Ordering::Equal),
                        (Value::String(x), Value::String(y)) => x.cmp(y),
                        _ => Ordering::Equal,
                    },
                    _ => Ordering::Equal,
                };
                // id as tie-breaker for stable ordering
                let ordering = ordering.then_with(|| {
                    let x = a.get("id").and_then(Value::as_str).unwrap_or_default();
                    let y = b.get("id").and_then(Value::as_str).unwrap_or_default();
                    x.cmp(y)
                });
                if ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });

            if let Some(per_page) = query.per_page {
                let page = query.page.unwrap_or(1).max(1);
                let start = ((page - 1) * per_page) as usize;
                matches = matches
                    .into_iter()
                    .skip(start)
                    .take(per_page as usize)
                    .collect();
            }

            matches
                .into_iter()
                .map(|doc| self.decode(query.apply_projection(doc)))
                .collect()
        }

        async fn atomic_update(&self, id: &str, partial: Value) -> Result<T> {
            let Value::Object(patch) = partial else {
                return Err(AppError::Validation(
                    "partial update must be a JSON object".to_string(),
                ));
            };
            let mut documents = self.documents.lock().expect("lock poisoned");
            let document = documents.get_mut(id).ok_or_else(|| Self::not_found(id))?;
            if let Some(body) = document.as_object_mut() {
                for (key, value) in patch {
                    body.insert(key, value);
                }
                body.insert("updated_at".to_string(), json!(self.clock.now_millis()));
            }
            let updated = document.clone();
            drop(documents);
            self.decode(updated)
        }

        async fn destroy(&self, id: &str) -> Result<T> {
            let document = self
                .documents
                .lock()
                .expect("lock poisoned")
                .remove(id)
                .ok_or_else(|| Self::not_found(id))?;
            self.decode(document)
        }
    }
}
