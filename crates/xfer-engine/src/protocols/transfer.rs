use crate::config::{Throttle, TransferConfig};
use crate::context::PlannerContext;
use crate::manifest::ManifestFormat;
use crate::strategy::{MultiFileProtocol, Protocol};
use xfer_catalog::SynthesisPolicy;
use xfer_model::{keys, JobClass, JobUnderConstruction, Namespace, TransformationName, LOCAL_SITE};

/// Default-entry synthesis for the wrapper family
pub static WRAPPER_SYNTHESIS: SynthesisPolicy = SynthesisPolicy {
    home_variable: "PEGASUS_HOME",
    required_variables: &["LD_LIBRARY_PATH"],
    optional_variables: &["GLOBUS_LOCATION"],
};

/// General-purpose batch transfer wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferWrapper {
    throttle: Throttle,
}

impl TransferWrapper {
    /// Registry key
    pub const KEY: &'static str = "transfer";

    /// Wrapper throttled by `config`
    #[must_use]
    pub fn new(config: &TransferConfig) -> Self {
        Self {
            throttle: config.throttle,
        }
    }

    /// Scheduler category for jobs of `class`
    #[must_use]
    pub fn category(class: JobClass) -> &'static str {
        match class {
            JobClass::StageIn => "stage-in",
            JobClass::StageOut => "stage-out",
            JobClass::InterSite => "stage-inter",
            JobClass::Setup => "transfer",
        }
    }

    /// Options shared by the wrapper family. An explicit
    /// `transfer.arguments` profile wins and is consumed.
    pub(crate) fn options(&self, job: &mut JobUnderConstruction) -> String {
        if let Some(custom) = job
            .profiles
            .remove(Namespace::Pegasus, keys::TRANSFER_ARGUMENTS)
        {
            return custom;
        }
        let mut args = format!("-P {} -p {}", self.throttle.processes, self.throttle.streams);
        if self.throttle.force {
            args.push_str(" -f");
        }
        args
    }

    pub(crate) fn finish(job: &mut JobUnderConstruction) {
        if !job.profiles.contains(Namespace::Dagman, keys::CATEGORY) {
            job.profiles
                .set(Namespace::Dagman, keys::CATEGORY, Self::category(job.class));
        }
        if job.class == JobClass::Setup && job.site != LOCAL_SITE {
            job.scheduling.transfer_executable = true;
        }
    }
}

impl Protocol for TransferWrapper {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn description(&self) -> &'static str {
        "general purpose batch transfer wrapper"
    }

    fn transformation(&self) -> TransformationName {
        TransformationName::namespaced("pegasus", "transfer")
    }

    fn synthesis_policy(&self) -> Option<&'static SynthesisPolicy> {
        Some(&WRAPPER_SYNTHESIS)
    }
}

impl MultiFileProtocol for TransferWrapper {
    fn manifest_format(&self, _ctx: &PlannerContext) -> ManifestFormat {
        ManifestFormat::CommentedBlocks
    }

    fn argument_string(&self, _ctx: &PlannerContext, job: &mut JobUnderConstruction) -> String {
        self.options(job)
    }

    fn post_process(&self, _ctx: &PlannerContext, job: &mut JobUnderConstruction) {
        Self::finish(job);
    }
}
