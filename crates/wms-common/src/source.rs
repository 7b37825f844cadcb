//! Feature store access shared by the dimension readers and the mapping layer.

use crate::{BoundingBox, FeatureCollection, Query, Schema, WmsResult};

/// A queryable feature store with filter pushdown.
///
/// Implementations may block on I/O. Failures surface as `WmsError::Store`.
pub trait FeatureSource: Send + Sync {
    /// Schema of the features this source returns.
    fn schema(&self) -> WmsResult<Schema>;

    /// Run a query and return the matching rows in query order.
    fn features(&self, query: &Query) -> WmsResult<FeatureCollection>;

    /// Number of rows the query would return.
    fn count(&self, query: &Query) -> WmsResult<usize> {
        Ok(self.features(query)?.len())
    }

    /// Envelope of the rows the query would return.
    fn bounds(&self, query: &Query) -> WmsResult<BoundingBox> {
        Ok(self.features(query)?.bounds())
    }
}
