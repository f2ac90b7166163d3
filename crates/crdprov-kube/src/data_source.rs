//! Data source reading a live object

use crdprov_core::schema::prune_nulls;
use crdprov_core::{CoreError, CrdKind, DataSourceData, SchemaValidator};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::backend::ClusterBackend;
use crate::error::{KubeError, Result};

pub struct CrdDataSource<'a, B: ?Sized> {
    kind: &'static CrdKind,
    backend: &'a B,
}

impl<'a, B> CrdDataSource<'a, B>
where
    B: ClusterBackend + ?Sized,
{
    pub fn new(kind: &'static CrdKind, backend: &'a B) -> Self {
        Self { kind, backend }
    }

    /// Look up the object named by `metadata.name` / `metadata.namespace`
    ///
    /// Unlike a resource read, a missing object is an error.
    pub async fn read(&self, config: &JsonValue) -> Result<DataSourceData> {
        let validator = SchemaValidator::new(self.kind.data_source_schema())?;
        let mut config = config.clone();
        prune_nulls(&mut config);

        let diags = validator.validate(&config);
        if diags.has_errors() {
            return Err(CoreError::InvalidConfig(diags).into());
        }

        let query = DataSourceData::from_value(&config)?;
        let target = query.object_ref();
        debug!(kind = self.kind.kind, id = %target, "reading data source");

        let live = self
            .backend
            .get(self.kind, &target)
            .await?
            .ok_or_else(|| KubeError::NotFound {
                kind: self.kind.kind.to_string(),
                id: target.id(),
            })?;

        Ok(DataSourceData::from_object(self.kind, &live)?)
    }
}
