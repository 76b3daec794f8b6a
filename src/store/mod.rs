//! Document store seam.
//!
//! Records are JSON objects kept in named collections. The directory and the
//! ledger only ever talk to a [`Collection`]; which backend sits behind it is
//! decided once at startup by [`Store::connect`].

pub mod memory;
pub mod mysql;
pub mod sql;

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::MySqlPool;
use thiserror::Error;
use tracing::info;

use crate::config::StoreBackend;
use memory::MemoryCollection;
use mysql::MySqlCollection;

/// A stored record. Always a JSON object.
pub type Document = Map<String, Value>;

/// Field carrying the store-assigned identifier.
pub const ID_FIELD: &str = "_id";

pub const EMPLOYEES: &str = "employees";
pub const ATTENDANCE: &str = "attendance";

/// Store-assigned surrogate key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
#[display(fmt = "{}", _0)]
pub struct DocumentId(pub u64);

impl FromStr for DocumentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(DocumentId)
    }
}

/// Conjunction of field equality tests.
///
/// A `null` value also matches documents where the field is absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: DocumentId) -> Self {
        Self::new().eq(ID_FIELD, id.0)
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses.iter().all(|(field, expected)| match doc.get(field) {
            Some(actual) => actual == expected,
            None => expected.is_null(),
        })
    }

    /// Seed document for an upsert: every non-identifier equality clause.
    pub fn seed(&self) -> Document {
        self.clauses
            .iter()
            .filter(|(field, _)| field != ID_FIELD)
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }
}

/// Fields that must be unique together across a collection.
///
/// Keys compare as exact strings. Documents missing any of the fields, or
/// holding anything other than a string there, are not indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueIndex {
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

impl UniqueIndex {
    pub fn key_of(&self, doc: &Document) -> Option<Vec<Value>> {
        self.fields
            .iter()
            .map(|field| doc.get(*field).filter(|v| v.is_string()).cloned())
            .collect()
    }
}

pub const EMPLOYEE_EMAIL_INDEX: UniqueIndex = UniqueIndex {
    name: "uq_employees_email",
    fields: &["email"],
};

/// Longest key strings (in characters) either backend accepts.
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_DATE_LEN: usize = 64;

pub const ATTENDANCE_DAY_INDEX: UniqueIndex = UniqueIndex {
    name: "uq_attendance_email_date",
    fields: &["email", "date"],
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: DocumentId,
}

impl InsertOneResult {
    pub fn new(inserted_id: DocumentId) -> Self {
        Self {
            acknowledged: true,
            inserted_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<DocumentId>,
    pub upserted_count: u64,
}

impl UpdateResult {
    pub fn matched(modified: bool) -> Self {
        Self {
            acknowledged: true,
            matched_count: 1,
            modified_count: u64::from(modified),
            upserted_id: None,
            upserted_count: 0,
        }
    }

    pub fn unmatched() -> Self {
        Self {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_id: None,
            upserted_count: 0,
        }
    }

    pub fn upserted(id: DocumentId) -> Self {
        Self {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(id),
            upserted_count: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key in {collection} violates {index}")]
    DuplicateKey {
        collection: String,
        index: String,
    },

    #[error("invalid field name `{0}`")]
    InvalidField(String),

    #[error("collection {0} lock poisoned")]
    Poisoned(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey { .. })
    }
}

/// Find/insert/update/delete by filter, answering with counts.
#[async_trait]
pub trait Collection: Send + Sync {
    fn name(&self) -> &str;

    /// All matching documents in natural (insertion) order.
    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError>;

    async fn insert_one(&self, doc: Document) -> Result<InsertOneResult, StoreError>;

    /// Merges `set` into the first match (`$set` semantics). With `upsert`,
    /// a miss inserts `filter.seed()` merged with `set`.
    async fn update_one(
        &self,
        filter: &Filter,
        set: Document,
        upsert: bool,
    ) -> Result<UpdateResult, StoreError>;

    async fn delete_one(&self, filter: &Filter) -> Result<DeleteResult, StoreError>;
}

/// Applies `set` onto `doc`, returning whether anything changed.
pub fn merge_set(doc: &mut Document, set: Document) -> bool {
    let mut changed = false;
    for (field, value) in set {
        if field == ID_FIELD {
            continue;
        }
        if doc.get(&field) != Some(&value) {
            doc.insert(field, value);
            changed = true;
        }
    }
    changed
}

#[derive(Clone)]
enum Backend {
    Memory,
    MySql(MySqlPool),
}

/// Process-wide store handle, shared by every worker.
#[derive(Clone)]
pub struct Store {
    employees: Arc<dyn Collection>,
    attendance: Arc<dyn Collection>,
    backend: Backend,
}

impl Store {
    pub fn memory() -> Self {
        Self {
            employees: Arc::new(MemoryCollection::new(EMPLOYEES, vec![EMPLOYEE_EMAIL_INDEX])),
            attendance: Arc::new(MemoryCollection::new(ATTENDANCE, vec![ATTENDANCE_DAY_INDEX])),
            backend: Backend::Memory,
        }
    }

    pub async fn connect(backend: &StoreBackend) -> Result<Self, StoreError> {
        match backend {
            StoreBackend::Memory => {
                info!("Using in-memory document store");
                Ok(Self::memory())
            }
            StoreBackend::MySql { url } => {
                let pool = MySqlPool::connect(url).await?;
                mysql::ensure_schema(&pool).await?;
                info!("Connected to MySQL document store");

                Ok(Self {
                    employees: Arc::new(MySqlCollection::new(
                        pool.clone(),
                        EMPLOYEES,
                        EMPLOYEE_EMAIL_INDEX,
                        mysql::EMPLOYEE_KEYS,
                    )),
                    attendance: Arc::new(MySqlCollection::new(
                        pool.clone(),
                        ATTENDANCE,
                        ATTENDANCE_DAY_INDEX,
                        mysql::ATTENDANCE_KEYS,
                    )),
                    backend: Backend::MySql(pool),
                })
            }
        }
    }

    pub fn employees(&self) -> Arc<dyn Collection> {
        Arc::clone(&self.employees)
    }

    pub fn attendance(&self) -> Arc<dyn Collection> {
        Arc::clone(&self.attendance)
    }

    /// Round trip to confirm the backend answers.
    pub async fn ping(&self) -> Result<(), StoreError> {
        match &self.backend {
            Backend::Memory => Ok(()),
            Backend::MySql(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
        }
    }

    pub async fn close(&self) {
        if let Backend::MySql(pool) = &self.backend {
            pool.close().await;
            info!("MySQL pool closed");
        }
    }
}
