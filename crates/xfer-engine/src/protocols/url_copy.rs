use crate::config::TransferConfig;
use crate::context::PlannerContext;
use crate::error::TransferError;
use crate::strategy::{Protocol, SingleFileProtocol};
use xfer_model::{keys, FileTransfer, JobUnderConstruction, Namespace, TransformationName};

/// Classic single-copy client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlCopy {
    quote: bool,
    streams: u32,
}

impl UrlCopy {
    /// Registry key
    pub const KEY: &'static str = "url-copy";

    /// Client configured from `config`
    #[must_use]
    pub fn new(config: &TransferConfig) -> Self {
        Self {
            quote: config.single_quote,
            streams: config.throttle.streams,
        }
    }
}

impl Protocol for UrlCopy {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn description(&self) -> &'static str {
        "single URL copy client, one file per job"
    }

    fn transformation(&self) -> TransformationName {
        TransformationName::namespaced("globus", "guc")
    }
}

impl SingleFileProtocol for UrlCopy {
    fn argument_string(
        &self,
        _ctx: &PlannerContext,
        job: &mut JobUnderConstruction,
        file: &FileTransfer,
    ) -> Result<String, TransferError> {
        let options = job
            .profiles
            .remove(Namespace::Pegasus, keys::TRANSFER_ARGUMENTS)
            .unwrap_or_else(|| format!("-vb -p {}", self.streams));
        let (src, dst) = (&file.source().url, &file.destination().url);
        Ok(if self.quote {
            format!("{options} '{src}' '{dst}'")
        } else {
            format!("{options} {src} {dst}")
        })
    }
}
