//! Read operations for graph nodes.

use roster_core::PropertyMap;

use crate::client::GraphError;
use crate::context::CallContext;
use crate::statement::{self, MultiSearchSpec, SearchSpec};
use crate::store::NodeStore;

impl NodeStore {
    // ── Single Node Lookups ──────────────────────────────────────

    /// Fetch the requested properties of the one node matched by `spec`.
    ///
    /// Fails with `NotFound` when nothing matches and `AmbiguousResult`
    /// when more than one node does.
    pub async fn find_one<S: AsRef<str> + Sync>(
        &self,
        ctx: &CallContext,
        spec: &SearchSpec,
        return_properties: &[S],
    ) -> Result<PropertyMap, GraphError> {
        let stmt = statement::find_one(spec, return_properties)?;
        self.executor.run_read_one(ctx, &stmt).await
    }

    // ── List Queries ─────────────────────────────────────────────

    /// Fetch every node matching `spec`. An empty result is not an error.
    pub async fn find_many(
        &self,
        ctx: &CallContext,
        spec: &MultiSearchSpec,
    ) -> Result<Vec<PropertyMap>, GraphError> {
        let stmt = statement::find_many(spec)?;
        self.executor.run_read_many(ctx, &stmt).await
    }
}
