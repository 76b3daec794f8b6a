use async_trait::async_trait;

use crate::store::{
    Collection, DeleteResult, Document, Filter, InsertOneResult, StoreError, UpdateResult,
};

/// A collection where every lookup misses but every write collides, as if
/// another request inserted the same key in between.
pub struct LostRace;

impl LostRace {
    fn collision() -> StoreError {
        StoreError::DuplicateKey {
            collection: "lost_race".to_string(),
            index: "uq_lost_race".to_string(),
        }
    }
}

#[async_trait]
impl Collection for LostRace {
    fn name(&self) -> &str {
        "lost_race"
    }

    async fn find(&self, _filter: &Filter) -> Result<Vec<Document>, StoreError> {
        Ok(Vec::new())
    }

    async fn find_one(&self, _filter: &Filter) -> Result<Option<Document>, StoreError> {
        Ok(None)
    }

    async fn insert_one(&self, _doc: Document) -> Result<InsertOneResult, StoreError> {
        Err(Self::collision())
    }

    async fn update_one(
        &self,
        _filter: &Filter,
        _set: Document,
        _upsert: bool,
    ) -> Result<UpdateResult, StoreError> {
        Err(Self::collision())
    }

    async fn delete_one(&self, _filter: &Filter) -> Result<DeleteResult, StoreError> {
        Ok(DeleteResult::new(0))
    }
}
