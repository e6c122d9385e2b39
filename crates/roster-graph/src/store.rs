//! The node store handed to repositories.

use std::sync::Arc;

use crate::client::GraphClient;
use crate::session::{GraphStore, SessionExecutor};

/// Upsert and lookup of single-label nodes as property maps.
///
/// Holds no state beyond the injected store client. Clone is cheap.
#[derive(Clone)]
pub struct NodeStore {
    pub(crate) executor: SessionExecutor,
}

impl NodeStore {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            executor: SessionExecutor::new(store),
        }
    }
}

impl From<GraphClient> for NodeStore {
    fn from(client: GraphClient) -> Self {
        Self::new(Arc::new(client))
    }
}

impl From<SessionExecutor> for NodeStore {
    fn from(executor: SessionExecutor) -> Self {
        Self { executor }
    }
}
