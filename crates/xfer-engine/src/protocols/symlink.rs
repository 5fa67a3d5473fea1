use super::transfer::{TransferWrapper, WRAPPER_SYNTHESIS};
use crate::config::TransferConfig;
use crate::context::PlannerContext;
use crate::manifest::ManifestFormat;
use crate::strategy::{MultiFileProtocol, Protocol};
use xfer_catalog::SynthesisPolicy;
use xfer_model::{JobUnderConstruction, TransformationName};

/// Symlink-only variant of the wrapper.
///
/// Meant for same-site `file://` pairs; callers check the URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symlink {
    wrapper: TransferWrapper,
}

impl Symlink {
    /// Registry key
    pub const KEY: &'static str = "symlink";

    /// Variant throttled by `config`
    #[must_use]
    pub fn new(config: &TransferConfig) -> Self {
        Self {
            wrapper: TransferWrapper::new(config),
        }
    }
}

impl Protocol for Symlink {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn description(&self) -> &'static str {
        "symlink variant of the batch transfer wrapper"
    }

    fn preserves_execute_bit(&self) -> bool {
        self.wrapper.preserves_execute_bit()
    }

    fn transformation(&self) -> TransformationName {
        TransformationName::namespaced("pegasus", "symlink")
    }

    fn synthesis_policy(&self) -> Option<&'static SynthesisPolicy> {
        Some(&WRAPPER_SYNTHESIS)
    }
}

impl MultiFileProtocol for Symlink {
    fn manifest_format(&self, ctx: &PlannerContext) -> ManifestFormat {
        self.wrapper.manifest_format(ctx)
    }

    fn argument_string(&self, _ctx: &PlannerContext, job: &mut JobUnderConstruction) -> String {
        self.wrapper.options(job)
    }

    fn post_process(&self, _ctx: &PlannerContext, job: &mut JobUnderConstruction) {
        TransferWrapper::finish(job);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use xfer_model::{JobClass, LOCAL_SITE};
    use xfer_test_utils::Fixture;

    #[test]
    fn synthesizes_symlink_binary_from_home() {
        let fx = Fixture::new();
        let ctx = testing::context(&fx, TransferConfig::new());
        let entry = Symlink::new(&TransferConfig::new())
            .resolve_executable(&ctx, LOCAL_SITE)
            .unwrap();
        assert_eq!(entry.physical_path, "/opt/pegasus/bin/symlink");
    }

    #[test]
    fn shares_wrapper_arguments() {
        let fx = Fixture::new();
        let ctx = testing::context(&fx, TransferConfig::new());
        let mut job = JobUnderConstruction::new("tx", JobClass::StageIn, "a", "site1");
        let symlink = Symlink::new(&TransferConfig::new());
        assert_eq!(symlink.argument_string(&ctx, &mut job), "-P 4 -p 1");
        assert!(!symlink.preserves_execute_bit());
    }
}
