use std::time::Duration;
use log::{ debug, error, info };

use crate::cluster::SearchCluster;
use crate::config::IndexStatus;
use crate::error::{ ApplyStep, SchemaError, SchemaResult };
use crate::schema::IndexSchema;
use crate::strategy::{ SchemaAction, SchemaUpdate };

/// Executes schema actions against a cluster. Steps run in order and a failed
/// step aborts the remaining ones; nothing already applied is rolled back.
pub struct SchemaApplier<'a> {
    cluster: &'a dyn SearchCluster,
    required_status: IndexStatus,
    status_timeout: Duration,
}

fn failed(index: &str, step: ApplyStep) -> impl FnOnce(SchemaError) -> SchemaError + '_ {
    move |source| {
        error!("Step '{}' failed for index '{}': {}", step, index, source);
        SchemaError::ApplyFailed {
            index: index.to_string(),
            step,
            source: Box::new(source),
        }
    }
}

impl<'a> SchemaApplier<'a> {
    pub fn new(cluster: &'a dyn SearchCluster, required_status: IndexStatus, status_timeout: Duration) -> Self {
        Self {
            cluster,
            required_status,
            status_timeout,
        }
    }

    pub async fn apply(&self, desired: &IndexSchema, action: &SchemaAction) -> SchemaResult<()> {
        let index = desired.index_name.as_str();
        match action {
            SchemaAction::Skip | SchemaAction::Unchanged => {
                debug!("Nothing to apply for index '{}'", index);
                Ok(())
            }
            SchemaAction::Create => self.create(desired).await,
            SchemaAction::DropAndCreate { exists } => {
                if *exists {
                    self.cluster.delete_index(index).await.map_err(failed(index, ApplyStep::DeleteIndex))?;
                }
                self.create(desired).await
            }
            SchemaAction::Update(update) => self.update(desired, update).await,
        }
    }

    async fn create(&self, desired: &IndexSchema) -> SchemaResult<()> {
        let index = desired.index_name.as_str();
        self.cluster
            .create_index(index, &desired.create_index_body()).await
            .map_err(failed(index, ApplyStep::CreateIndex))?;
        self.wait_for_status(index).await
    }

    async fn update(&self, desired: &IndexSchema, update: &SchemaUpdate) -> SchemaResult<()> {
        let index = desired.index_name.as_str();
        if update.has_analysis_changes() {
            info!("Updating analysis settings of index '{}'", index);
            self.cluster.close_index(index).await.map_err(failed(index, ApplyStep::CloseIndex))?;
            self.cluster
                .put_analysis(index, &update.analysis.to_json()).await
                .map_err(failed(index, ApplyStep::PutSettings))?;
            self.cluster.open_index(index).await.map_err(failed(index, ApplyStep::OpenIndex))?;
            self.wait_for_status(index).await?;
        }
        if update.has_mapping_changes() {
            info!("Adding {} fields to the mapping of index '{}'", update.fields.len(), index);
            self.cluster
                .put_mapping(index, &desired.mapping_type, &update.mapping_json()).await
                .map_err(failed(index, ApplyStep::PutMapping))?;
        }
        Ok(())
    }

    async fn wait_for_status(&self, index: &str) -> SchemaResult<()> {
        self.cluster
            .wait_for_status(index, self.required_status, self.status_timeout).await
            .map_err(failed(index, ApplyStep::WaitForStatus))
    }
}
