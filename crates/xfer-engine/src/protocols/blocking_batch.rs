use crate::config::{BlockingBatchOptions, TransferConfig};
use crate::context::PlannerContext;
use crate::error::ConfigError;
use crate::manifest::{absolute_manifest_path, ManifestFormat};
use crate::strategy::{MultiFileProtocol, Protocol};
use xfer_model::{keys, JobUnderConstruction, Namespace, TransformationName};

/// Blocking batch client talking to a reliable transfer service.
///
/// The service keeps file permissions, so no execute-bit jobs are added.
/// The transfer file travels with the job as a side file instead of stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockingBatch {
    endpoint: String,
    options: BlockingBatchOptions,
}

impl BlockingBatch {
    /// Registry key
    pub const KEY: &'static str = "blocking-batch";

    /// Client configured from `config`
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingEndpoint`] without a service endpoint
    pub fn new(config: &TransferConfig) -> Result<Self, ConfigError> {
        let endpoint = config
            .blocking_batch
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(ConfigError::MissingEndpoint)?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            options: config.blocking_batch.clone(),
        })
    }
}

impl Protocol for BlockingBatch {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn description(&self) -> &'static str {
        "C based blocking reliable transfer client"
    }

    fn preserves_execute_bit(&self) -> bool {
        true
    }

    fn transformation(&self) -> TransformationName {
        TransformationName::namespaced("globus", "crft")
    }
}

impl MultiFileProtocol for BlockingBatch {
    fn manifest_format(&self, _ctx: &PlannerContext) -> ManifestFormat {
        ManifestFormat::PlainPairs
    }

    fn argument_string(&self, _ctx: &PlannerContext, job: &mut JobUnderConstruction) -> String {
        let mut args = vec![
            "--monitor --create --submit --verbose".to_string(),
            format!("--endpoint {}", self.endpoint),
        ];
        let optional = [
            ("parallel", self.options.parallel),
            ("concurrent", self.options.concurrent),
            ("tcp-bs", self.options.tcp_buffer_size),
        ];
        args.extend(
            optional
                .into_iter()
                .filter_map(|(flag, value)| value.map(|v| format!("--{flag} {v}"))),
        );
        if let Some(stdin) = &job.stdin {
            args.push(format!("--transfer-file {stdin}"));
        }
        args.join(" ")
    }

    fn post_process(&self, _ctx: &PlannerContext, job: &mut JobUnderConstruction) {
        if let Some(path) = &job.manifest {
            job.scheduling
                .transfer_input_files
                .insert(absolute_manifest_path(path).display().to_string());
        }
        job.stdin = None;
        job.profiles.remove(Namespace::Condor, keys::REMOTE_INITIALDIR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use std::path::PathBuf;
    use xfer_model::JobClass;
    use xfer_test_utils::Fixture;

    #[test]
    fn requires_endpoint() {
        assert!(matches!(
            BlockingBatch::new(&TransferConfig::new()),
            Err(ConfigError::MissingEndpoint)
        ));
        assert!(BlockingBatch::new(&TransferConfig::new().with_endpoint("  ")).is_err());
    }

    #[test]
    fn arguments_include_only_configured_options() {
        let fx = Fixture::new();
        let mut config = TransferConfig::new().with_endpoint("rft.example.org:8443");
        config.blocking_batch.parallel = Some(4);
        let ctx = testing::context(&fx, config.clone());
        let protocol = BlockingBatch::new(&config).unwrap();

        let mut job = JobUnderConstruction::new("tx", JobClass::StageIn, "a", "site1");
        job.stdin = Some("tx.in".to_string());
        assert_eq!(
            protocol.argument_string(&ctx, &mut job),
            "--monitor --create --submit --verbose --endpoint rft.example.org:8443 \
             --parallel 4 --transfer-file tx.in"
        );
    }

    #[test]
    fn post_process_ships_manifest_as_side_file() {
        let fx = Fixture::new();
        let config = TransferConfig::new().with_endpoint("rft.example.org:8443");
        let ctx = testing::context(&fx, config.clone());
        let protocol = BlockingBatch::new(&config).unwrap();

        let mut job = JobUnderConstruction::new("tx", JobClass::StageIn, "a", "site1");
        let manifest = fx.submit_dir().join("tx.in");
        job.stdin = Some("tx.in".to_string());
        job.manifest = Some(manifest.clone());
        job.profiles.set(Namespace::Condor, keys::REMOTE_INITIALDIR, "/scratch");
        protocol.post_process(&ctx, &mut job);

        assert_eq!(job.stdin, None);
        assert!(!job.profiles.contains(Namespace::Condor, keys::REMOTE_INITIALDIR));
        let shipped: Vec<PathBuf> = job
            .scheduling
            .transfer_input_files
            .iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(shipped, vec![manifest]);
    }
}
