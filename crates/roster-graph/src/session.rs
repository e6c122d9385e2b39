//! Scoped session execution against a graph store.
//!
//! Every call opens one session, runs one statement in one transaction,
//! and closes the session again before returning, whatever the outcome.

use std::sync::Arc;

use async_trait::async_trait;
use roster_core::PropertyMap;

use crate::client::GraphError;
use crate::context::CallContext;
use crate::record::{to_property_map, RawRecord};
use crate::statement::Statement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

/// A graph store client able to hand out sessions.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn open_session(&self, mode: AccessMode) -> Result<Box<dyn StoreSession>, GraphError>;
}

/// One open session. Must be closed with [`StoreSession::close`].
#[async_trait]
pub trait StoreSession: Send {
    /// Run `statement` in its own transaction and collect every record.
    async fn run(&mut self, statement: &Statement) -> Result<Vec<RawRecord>, GraphError>;

    async fn close(self: Box<Self>) -> Result<(), GraphError>;
}

/// Runs compiled statements with scoped sessions.
#[derive(Clone)]
pub struct SessionExecutor {
    store: Arc<dyn GraphStore>,
}

impl SessionExecutor {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Run a write statement that must return exactly one record.
    pub async fn run_write(
        &self,
        ctx: &CallContext,
        statement: &Statement,
    ) -> Result<PropertyMap, GraphError> {
        let records = self.execute(ctx, AccessMode::Write, statement).await?;
        single(statement, records, AccessMode::Write)
    }

    /// Run a read statement that must match exactly one record.
    pub async fn run_read_one(
        &self,
        ctx: &CallContext,
        statement: &Statement,
    ) -> Result<PropertyMap, GraphError> {
        let records = self.execute(ctx, AccessMode::Read, statement).await?;
        single(statement, records, AccessMode::Read)
    }

    /// Run a read statement and collect every record. No records is not an error.
    pub async fn run_read_many(
        &self,
        ctx: &CallContext,
        statement: &Statement,
    ) -> Result<Vec<PropertyMap>, GraphError> {
        let records = self.execute(ctx, AccessMode::Read, statement).await?;
        records.iter().map(to_property_map).collect()
    }

    async fn execute(
        &self,
        ctx: &CallContext,
        mode: AccessMode,
        statement: &Statement,
    ) -> Result<Vec<RawRecord>, GraphError> {
        ctx.check()?;
        tracing::debug!(
            label = %statement.label,
            mode = ?mode,
            statement = %statement.text,
            "Running statement"
        );

        let mut session = self.store.open_session(mode).await?;

        let outcome = tokio::select! {
            biased;
            reason = ctx.done() => Err(reason),
            result = session.run(statement) => result,
        };

        let (key, value) = statement.subject_parts();
        if let Err(e) = session.close().await {
            tracing::warn!(
                label = %statement.label,
                key = %key,
                value = %value,
                error = %e,
                "Failed to close session"
            );
        }

        match &outcome {
            Ok(records) => tracing::debug!(
                label = %statement.label,
                records = records.len(),
                "Statement completed"
            ),
            Err(e) => tracing::warn!(
                label = %statement.label,
                key = %key,
                value = %value,
                mode = ?mode,
                error = %e,
                "Statement failed"
            ),
        }
        outcome
    }
}

fn single(
    statement: &Statement,
    records: Vec<RawRecord>,
    mode: AccessMode,
) -> Result<PropertyMap, GraphError> {
    let label = statement.label.to_string();
    let (key, value) = statement.subject_parts();
    match records.as_slice() {
        [record] => to_property_map(record),
        [] => Err(match mode {
            AccessMode::Write => GraphError::NoResultProduced { label, key, value },
            AccessMode::Read => GraphError::NotFound { label, key, value },
        }),
        many => Err(GraphError::AmbiguousResult {
            label,
            key,
            value,
            count: many.len(),
        }),
    }
}
