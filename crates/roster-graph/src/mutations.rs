//! Write operations for graph nodes.
//!
//! Upserts use MERGE on the search key, so creating and updating a node are
//! the same statement.

use roster_core::PropertyMap;

use crate::client::GraphError;
use crate::context::CallContext;
use crate::statement::{self, SearchSpec};
use crate::store::NodeStore;

impl NodeStore {
    /// Create or update the node matched by `spec`, setting every entry of
    /// `properties`, and return the written properties.
    pub async fn upsert(
        &self,
        ctx: &CallContext,
        spec: &SearchSpec,
        properties: &PropertyMap,
    ) -> Result<PropertyMap, GraphError> {
        let stmt = statement::upsert(spec, properties)?;
        self.executor.run_write(ctx, &stmt).await
    }
}
