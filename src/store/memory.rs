use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::{
    Collection, DeleteResult, Document, DocumentId, Filter, ID_FIELD, InsertOneResult,
    StoreError, UniqueIndex, UpdateResult, merge_set,
};

#[derive(Default)]
struct Inner {
    next_id: u64,
    docs: Vec<Document>,
}

/// Process-local collection.
///
/// Every write takes the lock for its whole check-and-apply, so unique
/// indexes hold under concurrent writers.
pub struct MemoryCollection {
    name: String,
    indexes: Vec<UniqueIndex>,
    inner: RwLock<Inner>,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>, indexes: Vec<UniqueIndex>) -> Self {
        Self {
            name: name.into(),
            indexes,
            inner: RwLock::new(Inner {
                next_id: 1,
                docs: Vec::new(),
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Poisoned(self.name.clone()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Poisoned(self.name.clone()))
    }

    /// Rejects `candidate` if another document (other than `skip`) shares a
    /// unique key with it.
    fn check_unique(
        &self,
        docs: &[Document],
        candidate: &Document,
        skip: Option<usize>,
    ) -> Result<(), StoreError> {
        for index in &self.indexes {
            let Some(key) = index.key_of(candidate) else {
                continue;
            };
            let clash = docs
                .iter()
                .enumerate()
                .filter(|(pos, _)| Some(*pos) != skip)
                .any(|(_, doc)| index.key_of(doc).as_ref() == Some(&key));
            if clash {
                return Err(StoreError::DuplicateKey {
                    collection: self.name.clone(),
                    index: index.name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn insert_locked(&self, inner: &mut Inner, mut doc: Document) -> Result<DocumentId, StoreError> {
        doc.remove(ID_FIELD);
        self.check_unique(&inner.docs, &doc, None)?;

        let id = DocumentId(inner.next_id);
        inner.next_id += 1;
        doc.insert(ID_FIELD.to_string(), Value::from(id.0));
        inner.docs.push(doc);
        Ok(id)
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .docs
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let inner = self.read()?;
        Ok(inner.docs.iter().find(|doc| filter.matches(doc)).cloned())
    }

    async fn insert_one(&self, doc: Document) -> Result<InsertOneResult, StoreError> {
        let mut inner = self.write()?;
        let id = self.insert_locked(&mut inner, doc)?;
        Ok(InsertOneResult::new(id))
    }

    async fn update_one(
        &self,
        filter: &Filter,
        set: Document,
        upsert: bool,
    ) -> Result<UpdateResult, StoreError> {
        let mut inner = self.write()?;

        match inner.docs.iter().position(|doc| filter.matches(doc)) {
            Some(pos) => {
                let mut updated = inner.docs[pos].clone();
                if !merge_set(&mut updated, set) {
                    return Ok(UpdateResult::matched(false));
                }
                self.check_unique(&inner.docs, &updated, Some(pos))?;
                inner.docs[pos] = updated;
                Ok(UpdateResult::matched(true))
            }
            None if upsert => {
                let mut doc = filter.seed();
                merge_set(&mut doc, set);
                let id = self.insert_locked(&mut inner, doc)?;
                Ok(UpdateResult::upserted(id))
            }
            None => Ok(UpdateResult::unmatched()),
        }
    }

    async fn delete_one(&self, filter: &Filter) -> Result<DeleteResult, StoreError> {
        let mut inner = self.write()?;

        match inner.docs.iter().position(|doc| filter.matches(doc)) {
            Some(pos) => {
                inner.docs.remove(pos);
                Ok(DeleteResult::new(1))
            }
            None => Ok(DeleteResult::new(0)),
        }
    }
}
