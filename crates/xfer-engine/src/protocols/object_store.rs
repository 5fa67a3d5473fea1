use crate::config::{ObjectStoreOptions, TransferConfig};
use crate::context::PlannerContext;
use crate::error::TransferError;
use crate::strategy::{Protocol, SingleFileProtocol};
use tracing::error;
use xfer_model::{absolute_path, FileTransfer, JobClass, JobUnderConstruction, TransformationName};

/// Object storage client. Puts staged inputs into the owner site's bucket
/// and gets outputs back out of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStore {
    options: ObjectStoreOptions,
}

impl ObjectStore {
    /// Registry key
    pub const KEY: &'static str = "object-store";

    /// Client configured from `config`
    #[must_use]
    pub fn new(config: &TransferConfig) -> Self {
        Self {
            options: config.object_store.clone(),
        }
    }
}

impl Protocol for ObjectStore {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn description(&self) -> &'static str {
        "object storage put/get client"
    }

    fn always_third_party(&self) -> bool {
        true
    }

    fn transformation(&self) -> TransformationName {
        TransformationName::namespaced("amazon", "s3cmd")
    }
}

impl SingleFileProtocol for ObjectStore {
    fn argument_string(
        &self,
        _ctx: &PlannerContext,
        job: &mut JobUnderConstruction,
        file: &FileTransfer,
    ) -> Result<String, TransferError> {
        let bucket = self.options.bucket_for(&job.non_third_party_site);
        let command = match job.class {
            JobClass::StageIn => format!(
                "put {} {bucket}/{}",
                absolute_path(&file.source().url),
                file.lfn()
            ),
            JobClass::StageOut => format!(
                "get {bucket}/{} {}",
                file.lfn(),
                absolute_path(&file.destination().url)
            ),
            class => {
                error!(job = %job.name, %class, "object store only moves stage-in and stage-out files");
                return Err(TransferError::UnsupportedJobClass {
                    strategy: Self::KEY,
                    class,
                    job: job.name.clone(),
                });
            }
        };
        Ok(match self.options.extra_arguments.as_deref() {
            Some(extra) if !extra.trim().is_empty() => format!("{} {command}", extra.trim()),
            _ => command,
        })
    }
}
