//! Planner context
//!
//! Everything construction needs besides the driver: configuration, the
//! disabled-chmod set, catalog and site handles, and the local proxy path.
//! Built once per planning run and passed by reference.

use crate::config::{DisabledChmodSites, TransferConfig};
use crate::error::ConfigError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use xfer_catalog::{CatalogResolver, SiteEntry, SiteStore, TransformationCatalog};
use xfer_model::{keys, LOCAL_SITE};

/// Shared read-only state for one planning run
#[derive(Debug, Clone)]
pub struct PlannerContext {
    config: TransferConfig,
    disabled_chmod: DisabledChmodSites,
    resolver: CatalogResolver,
    proxy: Option<PathBuf>,
}

impl PlannerContext {
    /// Validate `config` and bind it to the catalog and site store.
    ///
    /// The proxy path comes from the configuration, or failing that from the
    /// `X509_USER_PROXY` environment of the `local` site.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid
    pub fn new(
        config: TransferConfig,
        catalog: Arc<dyn TransformationCatalog>,
        sites: Arc<dyn SiteStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let disabled_chmod = DisabledChmodSites::parse(&config.disable_chmod_sites);
        let proxy = config.proxy.clone().or_else(|| {
            sites
                .environment_variable(LOCAL_SITE, keys::X509_USER_PROXY)
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
        });
        tracing::debug!(
            disabled_chmod_sites = disabled_chmod.len(),
            proxy = ?proxy,
            "planner context ready"
        );
        Ok(Self {
            config,
            disabled_chmod,
            resolver: CatalogResolver::new(catalog, sites),
            proxy,
        })
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Sites where fix-ups become no-ops
    #[inline]
    #[must_use]
    pub fn disabled_chmod(&self) -> &DisabledChmodSites {
        &self.disabled_chmod
    }

    /// Catalog resolver
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &CatalogResolver {
        &self.resolver
    }

    /// Site metadata for `site`
    #[must_use]
    pub fn site(&self, site: &str) -> Option<SiteEntry> {
        self.resolver.sites().lookup(site)
    }

    /// Local proxy path, if any
    #[inline]
    #[must_use]
    pub fn proxy(&self) -> Option<&Path> {
        self.proxy.as_deref()
    }

    /// Directory manifests are written into
    #[inline]
    #[must_use]
    pub fn submit_dir(&self) -> &Path {
        &self.config.submit_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xfer_catalog::{InMemoryCatalog, InMemorySiteStore};
    use xfer_model::JobClass;

    fn sites(local_proxy: Option<&str>) -> Arc<InMemorySiteStore> {
        let mut local = SiteEntry::new(LOCAL_SITE);
        if let Some(p) = local_proxy {
            local = local.with_env(keys::X509_USER_PROXY, p);
        }
        Arc::new(InMemorySiteStore::from_sites([local]))
    }

    #[test]
    fn proxy_falls_back_to_local_site_environment() {
        let ctx = PlannerContext::new(
            TransferConfig::new(),
            Arc::new(InMemoryCatalog::new()),
            sites(Some("/tmp/x509up_u1000")),
        )
        .unwrap();
        assert_eq!(ctx.proxy(), Some(Path::new("/tmp/x509up_u1000")));
    }

    #[test]
    fn configured_proxy_wins() {
        let ctx = PlannerContext::new(
            TransferConfig::new().with_proxy("/home/u/proxy"),
            Arc::new(InMemoryCatalog::new()),
            sites(Some("/tmp/x509up_u1000")),
        )
        .unwrap();
        assert_eq!(ctx.proxy(), Some(Path::new("/home/u/proxy")));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = PlannerContext::new(
            TransferConfig::new().with_implementation(JobClass::Setup, "bogus"),
            Arc::new(InMemoryCatalog::new()),
            sites(None),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownImplementation { .. }));
    }
}
