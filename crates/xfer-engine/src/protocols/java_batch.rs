use crate::config::TransferConfig;
use crate::context::PlannerContext;
use crate::manifest::{absolute_manifest_path, ManifestFormat};
use crate::strategy::{MultiFileProtocol, Protocol};
use xfer_model::{JobUnderConstruction, TransformationName};

/// Java batch client for the reliable transfer service. Always third-party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaBatch;

impl JavaBatch {
    /// Registry key
    pub const KEY: &'static str = "java-batch";

    /// Client for `config`; all options are read when the manifest is written
    #[inline]
    #[must_use]
    pub fn new(_config: &TransferConfig) -> Self {
        Self
    }
}

impl Protocol for JavaBatch {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn description(&self) -> &'static str {
        "Java reliable transfer client with option preamble"
    }

    fn preserves_execute_bit(&self) -> bool {
        true
    }

    fn always_third_party(&self) -> bool {
        true
    }

    fn transformation(&self) -> TransformationName {
        TransformationName::namespaced("globus", "rft")
    }
}

impl MultiFileProtocol for JavaBatch {
    fn manifest_format(&self, ctx: &PlannerContext) -> ManifestFormat {
        ManifestFormat::FixedPreamble(ctx.config().java_batch.clone())
    }

    fn argument_string(&self, _ctx: &PlannerContext, job: &mut JobUnderConstruction) -> String {
        job.manifest.as_deref().map_or_else(String::new, |path| {
            format!("-f {}", absolute_manifest_path(path).display())
        })
    }
}
