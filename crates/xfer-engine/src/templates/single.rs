use crate::base;
use crate::context::PlannerContext;
use crate::error::TransferError;
use crate::graph::Refiner;
use crate::strategy::{Protocol, SingleFileProtocol, TransferImplementation, TransferRequest};
use tracing::{error, info_span};
use xfer_model::TransferJob;

/// One job per file
#[derive(Debug, Clone)]
pub struct SingleFileTemplate<P> {
    protocol: P,
}

impl<P: SingleFileProtocol> SingleFileTemplate<P> {
    /// Wrap `protocol`
    #[inline]
    #[must_use]
    pub fn new(protocol: P) -> Self {
        Self { protocol }
    }

    /// The wrapped protocol
    #[inline]
    #[must_use]
    pub fn protocol(&self) -> &P {
        &self.protocol
    }
}

impl<P: SingleFileProtocol> TransferImplementation for SingleFileTemplate<P> {
    fn key(&self) -> &'static str {
        self.protocol.key()
    }

    fn description(&self) -> &'static str {
        self.protocol.description()
    }

    fn preserves_execute_bit(&self) -> bool {
        self.protocol.preserves_execute_bit()
    }

    fn always_third_party(&self) -> bool {
        self.protocol.always_third_party()
    }

    fn create_transfer_job(
        &self,
        ctx: &PlannerContext,
        driver: &mut dyn Refiner,
        request: &TransferRequest<'_>,
    ) -> Result<TransferJob, TransferError> {
        let _span = info_span!(
            "transfer_job",
            job = request.job_name,
            class = %request.class,
            strategy = self.protocol.key()
        )
        .entered();

        let [file] = request.files else {
            error!(
                job = request.job_name,
                count = request.files.len(),
                "single-file strategy given wrong number of files"
            );
            return Err(TransferError::InvalidBatchSize {
                strategy: self.protocol.key(),
                job: request.job_name.to_string(),
                count: request.files.len(),
            });
        };

        let mut job = base::prepare_job(ctx, &*driver, &self.protocol, request)?;
        job.arguments = self.protocol.argument_string(ctx, &mut job, file)?;
        base::finish_job(ctx, driver, &self.protocol, request, job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransferConfig;
    use crate::graph::WorkflowGraph;
    use crate::testing;
    use xfer_model::{FileTransfer, JobClass, JobUnderConstruction, TransformationName};
    use xfer_test_utils::{compute_job, executable, stage_in_file, Fixture};

    #[derive(Debug)]
    struct Echo;

    impl Protocol for Echo {
        fn key(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "test protocol"
        }

        fn transformation(&self) -> TransformationName {
            TransformationName::namespaced("globus", "guc")
        }
    }

    impl SingleFileProtocol for Echo {
        fn argument_string(
            &self,
            _ctx: &PlannerContext,
            _job: &mut JobUnderConstruction,
            file: &FileTransfer,
        ) -> Result<String, TransferError> {
            Ok(format!("{} {}", file.source().url, file.destination().url))
        }
    }

    #[test]
    fn rejects_more_than_one_file_without_touching_graph() {
        let fx = Fixture::new();
        let ctx = testing::context(&fx, TransferConfig::new());
        let mut g = WorkflowGraph::new();
        let compute = compute_job("analyze", "site1");
        let files = [stage_in_file("a.dat", "site1"), stage_in_file("b.dat", "site1")];
        let req = TransferRequest::new(&compute, &files, "tx_analyze", JobClass::StageIn);

        let err = SingleFileTemplate::new(Echo)
            .create_transfer_job(&ctx, &mut g, &req)
            .unwrap_err();
        assert!(matches!(err, TransferError::InvalidBatchSize { strategy: "echo", count: 2, .. }));
        assert_eq!(g.node_count(), 0);
    }

    #[test]
    fn rejects_empty_batch() {
        let fx = Fixture::new();
        let ctx = testing::context(&fx, TransferConfig::new());
        let mut g = WorkflowGraph::new();
        let compute = compute_job("analyze", "site1");
        let req = TransferRequest::new(&compute, &[], "tx_analyze", JobClass::StageIn);
        let err = SingleFileTemplate::new(Echo)
            .create_transfer_job(&ctx, &mut g, &req)
            .unwrap_err();
        assert!(matches!(err, TransferError::InvalidBatchSize { count: 0, .. }));
    }

    #[test]
    fn builds_job_and_fixup() {
        let fx = Fixture::new();
        let ctx = testing::context(&fx, TransferConfig::new());
        let mut g = WorkflowGraph::new();
        let compute = compute_job("analyze", "site1");
        let files = [executable("run.exe", "site1")];
        let req = TransferRequest::new(&compute, &files, "tx_analyze", JobClass::StageIn)
            .with_exec_files(&files);

        let job = SingleFileTemplate::new(Echo)
            .create_transfer_job(&ctx, &mut g, &req)
            .unwrap();
        assert_eq!(job.site(), "site1");
        assert_eq!(job.non_third_party_site(), "site1");
        assert_eq!(
            job.arguments(),
            format!("{} {}", files[0].source().url, files[0].destination().url)
        );
        assert!(g.contains("chmod_analyze_0"));
        assert!(g.has_edge("tx_analyze", "chmod_analyze_0"));
        assert!(g.has_edge("chmod_analyze_0", "analyze"));
    }
}
