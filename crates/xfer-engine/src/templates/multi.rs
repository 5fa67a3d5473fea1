use crate::base;
use crate::context::PlannerContext;
use crate::error::TransferError;
use crate::graph::Refiner;
use crate::manifest::write_manifest_file;
use crate::strategy::{MultiFileProtocol, Protocol, TransferImplementation, TransferRequest};
use tracing::info_span;
use xfer_model::TransferJob;

/// One job per batch, driven by a manifest in the submit directory
#[derive(Debug, Clone)]
pub struct MultiFileTemplate<P> {
    protocol: P,
}

impl<P: MultiFileProtocol> MultiFileTemplate<P> {
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

impl<P: MultiFileProtocol> TransferImplementation for MultiFileTemplate<P> {
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

        let mut job = base::prepare_job(ctx, &*driver, &self.protocol, request)?;

        let format = self.protocol.manifest_format(ctx);
        let path = write_manifest_file(ctx.submit_dir(), &job.name, &format, request.files)?;
        job.stdin = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        job.manifest = Some(path);

        // Arguments may read profiles, so they come after layering.
        job.arguments = self.protocol.argument_string(ctx, &mut job);
        self.protocol.post_process(ctx, &mut job);
        base::finish_job(ctx, driver, &self.protocol, request, job)
    }
}
