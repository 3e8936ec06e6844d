use futures::future::join_all;
use std::sync::Arc;
use log::{ error, info };

use crate::applier::SchemaApplier;
use crate::builder;
use crate::cluster::SearchCluster;
use crate::config::SchemaManagementConfig;
use crate::declaration::EntityDeclaration;
use crate::error::SchemaResult;
use crate::reader;
use crate::schema::IndexSchema;
use crate::strategy::{ resolve, SchemaAction, SchemaStrategy };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Skipped,
    Unchanged,
    Created,
    Updated,
    Recreated,
}

impl From<&SchemaAction> for SyncOutcome {
    fn from(action: &SchemaAction) -> Self {
        match action {
            SchemaAction::Skip => SyncOutcome::Skipped,
            SchemaAction::Unchanged => SyncOutcome::Unchanged,
            SchemaAction::Create => SyncOutcome::Created,
            SchemaAction::Update(_) => SyncOutcome::Updated,
            SchemaAction::DropAndCreate { .. } => SyncOutcome::Recreated,
        }
    }
}

/// Brings index schemas on a cluster in line with their declarations.
///
/// Each index is handled as one strict sequence (read, diff, apply). There is
/// no locking across processes: two processes initializing the same index at
/// once must be coordinated by the caller.
pub struct IndexSchemaManager {
    cluster: Arc<dyn SearchCluster>,
    config: SchemaManagementConfig,
}

impl IndexSchemaManager {
    pub fn new(cluster: Arc<dyn SearchCluster>, config: SchemaManagementConfig) -> Self {
        Self { cluster, config }
    }

    pub fn config(&self) -> &SchemaManagementConfig {
        &self.config
    }

    pub async fn synchronize(&self, declaration: &EntityDeclaration) -> SchemaResult<SyncOutcome> {
        let desired = builder::build(declaration)?;
        self.synchronize_schema(&desired).await
    }

    pub async fn synchronize_schema(&self, desired: &IndexSchema) -> SchemaResult<SyncOutcome> {
        let index = desired.index_name.as_str();
        let strategy = self.config.strategy_for(index);
        info!("Synchronizing schema of index '{}' with strategy '{}'", index, strategy);

        let action = match strategy {
            SchemaStrategy::None => SchemaAction::Skip,
            // The deployed schema is irrelevant, it is about to be dropped.
            SchemaStrategy::DropAndCreate => SchemaAction::DropAndCreate {
                exists: self.cluster.index_exists(index).await?,
            },
            _ => {
                let current = reader::read(self.cluster.as_ref(), index, &desired.mapping_type).await?;
                resolve(strategy, desired, current.as_ref(), self.config.force_drop_on_incompatible)?
            }
        };

        let applier = SchemaApplier::new(
            self.cluster.as_ref(),
            self.config.required_status,
            self.config.status_timeout
        );
        applier.apply(desired, &action).await?;

        let outcome = SyncOutcome::from(&action);
        info!("Index '{}' synchronized: {:?}", index, outcome);
        Ok(outcome)
    }

    /// Synchronizes independent indices concurrently. A failure is reported for
    /// its own index only and never stops the others.
    pub async fn synchronize_all(
        &self,
        declarations: &[EntityDeclaration]
    ) -> Vec<(String, SchemaResult<SyncOutcome>)> {
        let tasks = declarations.iter().map(|declaration| async move {
            (declaration.index_name.clone(), self.synchronize(declaration).await)
        });
        let results = join_all(tasks).await;

        let failures: Vec<&str> = results
            .iter()
            .filter(|(_, result)| result.is_err())
            .map(|(index, _)| index.as_str())
            .collect();
        if failures.is_empty() {
            info!("✅ Synchronized schemas of {} indices", results.len());
        } else {
            error!("Schema synchronization failed for {} of {} indices: {:?}", failures.len(), results.len(), failures);
        }
        results
    }
}
