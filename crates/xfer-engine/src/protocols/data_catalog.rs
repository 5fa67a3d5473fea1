use crate::config::{DataCatalogOptions, TransferConfig};
use crate::context::PlannerContext;
use crate::error::TransferError;
use crate::strategy::{Protocol, SingleFileProtocol};
use tracing::debug;
use xfer_model::{
    FileTransfer, JobUnderConstruction, TransformationCatalogEntry, TransformationName,
};

/// Site environment variable naming the data catalog client install
pub const DC_HOME: &str = "DC_HOME";

/// Direction of a data catalog transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataCatalogOperation {
    /// Fetch a dataset out of the catalog service
    Retrieve,
    /// Register a produced file with the catalog service
    Ingest,
}

/// Domain data catalog client
///
/// The executable always lives at `$DC_HOME/bin/dc-client` on the
/// execution site; the transformation catalog is never consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataCatalogClient {
    operation: DataCatalogOperation,
    service: DataCatalogOptions,
}

impl DataCatalogClient {
    /// Registry key of the retrieve client
    pub const RETRIEVE_KEY: &'static str = "dc-retrieve";

    /// Registry key of the ingest client
    pub const INGEST_KEY: &'static str = "dc-ingest";

    /// Client for `operation` against the configured service
    #[must_use]
    pub fn new(config: &TransferConfig, operation: DataCatalogOperation) -> Self {
        Self {
            operation,
            service: config.data_catalog.clone(),
        }
    }

    /// Retrieve client
    #[must_use]
    pub fn retrieve(config: &TransferConfig) -> Self {
        Self::new(config, DataCatalogOperation::Retrieve)
    }

    /// Ingest client
    #[must_use]
    pub fn ingest(config: &TransferConfig) -> Self {
        Self::new(config, DataCatalogOperation::Ingest)
    }

    /// Operation performed
    #[inline]
    #[must_use]
    pub fn operation(&self) -> DataCatalogOperation {
        self.operation
    }
}

impl Protocol for DataCatalogClient {
    fn key(&self) -> &'static str {
        match self.operation {
            DataCatalogOperation::Retrieve => Self::RETRIEVE_KEY,
            DataCatalogOperation::Ingest => Self::INGEST_KEY,
        }
    }

    fn description(&self) -> &'static str {
        match self.operation {
            DataCatalogOperation::Retrieve => "data catalog retrieve client",
            DataCatalogOperation::Ingest => "data catalog ingest client",
        }
    }

    fn transformation(&self) -> TransformationName {
        TransformationName::namespaced("windward", "dc-transfer")
    }

    fn resolve_executable(
        &self,
        ctx: &PlannerContext,
        site: &str,
    ) -> Option<TransformationCatalogEntry> {
        let home = ctx
            .resolver()
            .sites()
            .environment_variable(site, DC_HOME)
            .filter(|h| !h.trim().is_empty());
        let Some(home) = home else {
            debug!(site, variable = DC_HOME, "data catalog home not set");
            return None;
        };
        let path = format!("{}/bin/dc-client", home.trim().trim_end_matches('/'));
        Some(TransformationCatalogEntry::new(self.transformation(), site, path))
    }
}

impl SingleFileProtocol for DataCatalogClient {
    fn argument_string(
        &self,
        _ctx: &PlannerContext,
        _job: &mut JobUnderConstruction,
        file: &FileTransfer,
    ) -> Result<String, TransferError> {
        let service = format!("--host {} --port {}", self.service.host, self.service.port);
        Ok(match self.operation {
            DataCatalogOperation::Retrieve => format!(
                "{service} retrieve {} '{}'",
                file.lfn(),
                file.destination().url
            ),
            DataCatalogOperation::Ingest => format!(
                "{service} ingest '{}' {}",
                file.source().url,
                file.lfn()
            ),
        })
    }
}
