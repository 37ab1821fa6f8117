//! Core resource service.
//!
//! # Responsibility
//! - Validate entities and assign ids and timestamps.
//! - Delegate persistence to a [`ResourceRepository`].
//!
//! # Invariants
//! - Invalid entities never reach the repository.
//! - Caller-supplied `id`/timestamps are overwritten on create.
//! - Errors from the repository are forwarded unchanged.

use crate::context::CallContext;
use crate::error::ResourceResult;
use crate::model::{new_entity_id, now_epoch_ms, Entity, PageMetadata, ResultPage};
use crate::repo::ResourceRepository;
use crate::service::ResourceService;
use std::marker::PhantomData;

/// Innermost service of the chain.
pub struct CoreService<E, R> {
    repo: R,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity, R: ResourceRepository<E>> CoreService<E, R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            _entity: PhantomData,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }
}

impl<E: Entity, R: ResourceRepository<E>> ResourceService<E> for CoreService<E, R> {
    fn create(&self, ctx: &CallContext, _token: &str, mut entity: E) -> ResourceResult<String> {
        entity.validate()?;

        let now = now_epoch_ms();
        entity.set_id(new_entity_id());
        entity.set_timestamps(now, now);

        self.repo.save(ctx, &entity)
    }

    fn view(&self, ctx: &CallContext, _token: &str, id: &str) -> ResourceResult<E> {
        self.repo.retrieve_by_id(ctx, id)
    }

    fn list(
        &self,
        ctx: &CallContext,
        _token: &str,
        page: &PageMetadata<E::Filter>,
    ) -> ResourceResult<ResultPage<E>> {
        self.repo.retrieve_all(ctx, page)
    }

    fn update(&self, ctx: &CallContext, _token: &str, entity: E) -> ResourceResult<()> {
        entity.validate_changes()?;
        let changes = entity.sparse_changes(now_epoch_ms());
        self.repo.update(ctx, &changes)
    }

    fn delete(&self, ctx: &CallContext, _token: &str, id: &str) -> ResourceResult<()> {
        self.repo.delete(ctx, id)
    }
}
