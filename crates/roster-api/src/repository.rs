//! Entity repositories.
//!
//! The GraphQL layer only sees [`Repository`]. [`GraphRepository`] persists
//! through the node store; [`InMemoryRepository`] keeps property maps in
//! process and applies the same merge, filter and ordering rules.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use roster_core::{GraphEntity, PropertyMap};
use roster_graph::{CallContext, GraphError, MultiSearchSpec, NodeStore, SearchSpec};
use tokio::sync::RwLock;

use crate::error::{ApiError, Result};

/// Label-wide listing parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityQuery {
    /// Property equality filters, all of which must hold.
    pub filters: PropertyMap,
    pub order_by: Vec<String>,
    pub descending: bool,
    /// 0 means unbounded.
    pub limit: u64,
}

impl EntityQuery {
    pub fn filter(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(property.into(), value.into());
        self
    }

    pub fn order_by(mut self, property: impl Into<String>) -> Self {
        self.order_by.push(property.into());
        self
    }

    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }
}

/// Persistence capability for one entity type.
#[async_trait]
pub trait Repository<E: GraphEntity>: Send + Sync {
    /// Create or update `entity` by its id and return the stored state.
    async fn upsert(&self, ctx: &CallContext, entity: &E) -> Result<E>;

    async fn find_one(&self, ctx: &CallContext, id: &str) -> Result<E>;

    async fn find_many(&self, ctx: &CallContext, query: &EntityQuery) -> Result<Vec<E>>;
}

// ── Graph-backed ─────────────────────────────────────────────────

/// Repository backed by the graph node store.
pub struct GraphRepository<E> {
    nodes: NodeStore,
    _entity: PhantomData<fn() -> E>,
}

impl<E> GraphRepository<E> {
    pub fn new(nodes: NodeStore) -> Self {
        Self {
            nodes,
            _entity: PhantomData,
        }
    }
}

impl<E> Clone for GraphRepository<E> {
    fn clone(&self) -> Self {
        Self::new(self.nodes.clone())
    }
}

#[async_trait]
impl<E: GraphEntity> Repository<E> for GraphRepository<E> {
    async fn upsert(&self, ctx: &CallContext, entity: &E) -> Result<E> {
        let spec = SearchSpec::by_key(E::LABEL, entity.id());
        let stored = self
            .nodes
            .upsert(ctx, &spec, &entity.to_properties())
            .await?;
        tracing::info!(label = %E::LABEL, id = entity.id(), "Upserted node");
        Ok(E::from_properties(&stored)?)
    }

    async fn find_one(&self, ctx: &CallContext, id: &str) -> Result<E> {
        let spec = SearchSpec::by_key(E::LABEL, id);
        match self.nodes.find_one(ctx, &spec, E::LABEL.properties()).await {
            Ok(props) => Ok(E::from_properties(&props)?),
            Err(GraphError::NotFound { .. }) => Err(ApiError::NotFound {
                label: E::LABEL.as_str(),
                id: id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_many(&self, ctx: &CallContext, query: &EntityQuery) -> Result<Vec<E>> {
        let mut spec = MultiSearchSpec::new(E::LABEL)
            .descending(query.descending)
            .limit(query.limit);
        for (property, value) in &query.filters {
            spec = spec.filter(property.clone(), value.clone());
        }
        for property in &query.order_by {
            spec = spec.order_by(property.clone());
        }

        let rows = self.nodes.find_many(ctx, &spec).await?;
        rows.iter()
            .map(|props| E::from_properties(props).map_err(ApiError::from))
            .collect()
    }
}

// ── In-memory ────────────────────────────────────────────────────

/// Process-local repository keyed by entity id.
pub struct InMemoryRepository<E> {
    nodes: RwLock<BTreeMap<String, PropertyMap>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> InMemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(BTreeMap::new()),
            _entity: PhantomData,
        }
    }

    pub async fn len(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nodes.read().await.is_empty()
    }
}

impl<E> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: GraphEntity> Repository<E> for InMemoryRepository<E> {
    async fn upsert(&self, ctx: &CallContext, entity: &E) -> Result<E> {
        ctx.check()?;
        let mut nodes = self.nodes.write().await;
        let stored = nodes.entry(entity.id().to_string()).or_default();
        stored.extend(entity.to_properties());
        let entity = E::from_properties(stored)?;
        tracing::debug!(label = %E::LABEL, id = entity.id(), "Stored entity in memory");
        Ok(entity)
    }

    async fn find_one(&self, ctx: &CallContext, id: &str) -> Result<E> {
        ctx.check()?;
        let nodes = self.nodes.read().await;
        let props = nodes.get(id).ok_or_else(|| ApiError::NotFound {
            label: E::LABEL.as_str(),
            id: id.to_string(),
        })?;
        Ok(E::from_properties(props)?)
    }

    async fn find_many(&self, ctx: &CallContext, query: &EntityQuery) -> Result<Vec<E>> {
        ctx.check()?;
        for property in query.filters.keys().chain(&query.order_by) {
            if E::LABEL.property(property).is_none() {
                return Err(GraphError::InvalidArgument(format!(
                    "{property:?} is not a property of {}",
                    E::LABEL
                ))
                .into());
            }
        }

        let nodes = self.nodes.read().await;
        let mut matched: Vec<&PropertyMap> = nodes
            .values()
            .filter(|props| {
                query
                    .filters
                    .iter()
                    .all(|(k, v)| props.get(k) == Some(v))
            })
            .collect();

        if !query.order_by.is_empty() {
            matched.sort_by(|a, b| {
                let ord = compare_by(a, b, &query.order_by);
                if query.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }
        if query.limit > 0 {
            matched.truncate(usize::try_from(query.limit).unwrap_or(usize::MAX));
        }

        matched
            .into_iter()
            .map(|props| E::from_properties(props).map_err(ApiError::from))
            .collect()
    }
}

/// Compare on each key in turn. An absent property sorts before any value.
fn compare_by(a: &PropertyMap, b: &PropertyMap, keys: &[String]) -> Ordering {
    keys.iter()
        .map(|key| a.get(key).cmp(&b.get(key)))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}
