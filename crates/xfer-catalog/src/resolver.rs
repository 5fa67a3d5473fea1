//! Executable resolution
//!
//! [`CatalogResolver`] answers "which executable performs this transfer on
//! this site". A catalog hit wins. On a miss, strategies that declare a
//! [`SynthesisPolicy`] get a default entry built from the site environment
//! and registered back into the catalog so the next lookup hits.

use crate::catalog::TransformationCatalog;
use crate::site::SiteStore;
use std::sync::Arc;
use tracing::debug;
use xfer_model::{
    Namespace, Profiles, TransformationCatalogEntry, TransformationName,
    TransformationType,
};

/// How to build a default entry when the catalog has none
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisPolicy {
    /// Site environment variable naming the install home
    pub home_variable: &'static str,
    /// Environment variables that must be set on the site
    pub required_variables: &'static [&'static str],
    /// Environment variables copied when present
    pub optional_variables: &'static [&'static str],
}

/// Result of a synthesis attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    /// A default entry was built
    Synthesized(TransformationCatalogEntry),
    /// The site lacks what the policy needs
    Unavailable {
        /// Which variable was missing
        reason: String,
    },
}

/// Where a resolved entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrigin {
    /// Found in the catalog
    Catalog,
    /// Built from the site environment during this call
    Synthesized,
}

/// A resolved transformation entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The entry
    pub entry: TransformationCatalogEntry,
    /// Its origin
    pub origin: EntryOrigin,
}

/// Catalog lookup with optional synthesis fallback
#[derive(Debug, Clone)]
pub struct CatalogResolver {
    catalog: Arc<dyn TransformationCatalog>,
    sites: Arc<dyn SiteStore>,
}

impl CatalogResolver {
    /// Create a resolver over a catalog and site store
    #[inline]
    #[must_use]
    pub fn new(catalog: Arc<dyn TransformationCatalog>, sites: Arc<dyn SiteStore>) -> Self {
        Self { catalog, sites }
    }

    /// The catalog handle
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn TransformationCatalog> {
        &self.catalog
    }

    /// The site store handle
    #[inline]
    #[must_use]
    pub fn sites(&self) -> &Arc<dyn SiteStore> {
        &self.sites
    }

    /// First installed catalog entry for `name` on `site`.
    ///
    /// Stageable entries are never used as executables. A backend failure is
    /// logged and treated as a miss.
    #[must_use]
    pub fn resolve(
        &self,
        name: &TransformationName,
        site: &str,
    ) -> Option<TransformationCatalogEntry> {
        match self
            .catalog
            .lookup(name, site, Some(TransformationType::Installed))
        {
            Ok(entries) => {
                let found = entries.into_iter().next();
                if found.is_none() {
                    debug!(transformation = %name, site, "catalog miss");
                }
                found
            }
            Err(e) => {
                debug!(transformation = %name, site, error = %e, "catalog lookup failed");
                None
            }
        }
    }

    /// Catalog entry, or a synthesized default when `policy` allows one
    #[must_use]
    pub fn resolve_or_synthesize(
        &self,
        name: &TransformationName,
        site: &str,
        policy: Option<&SynthesisPolicy>,
    ) -> Option<Resolution> {
        if let Some(entry) = self.resolve(name, site) {
            return Some(Resolution {
                entry,
                origin: EntryOrigin::Catalog,
            });
        }
        let policy = policy?;
        match self.synthesize(name, site, policy) {
            SynthesisOutcome::Synthesized(entry) => Some(Resolution {
                entry,
                origin: EntryOrigin::Synthesized,
            }),
            SynthesisOutcome::Unavailable { reason } => {
                debug!(transformation = %name, site, %reason, "cannot synthesize default entry");
                None
            }
        }
    }

    /// Build a default entry at `<home>/bin/<name>` and register it.
    ///
    /// Registration is non-committing and its failure is only logged.
    pub fn synthesize(
        &self,
        name: &TransformationName,
        site: &str,
        policy: &SynthesisPolicy,
    ) -> SynthesisOutcome {
        let Some(site_entry) = self.sites.lookup(site) else {
            return SynthesisOutcome::Unavailable {
                reason: format!("site {site} is not in the site store"),
            };
        };

        let home = match site_entry.environment_variable(policy.home_variable) {
            Some(home) if !home.trim().is_empty() => home.trim(),
            _ => {
                return SynthesisOutcome::Unavailable {
                    reason: format!("{} not set for site {site}", policy.home_variable),
                }
            }
        };

        if policy.required_variables.is_empty() {
            return SynthesisOutcome::Unavailable {
                reason: format!("no required environment declared for {name}"),
            };
        }

        let mut profiles = Profiles::new();
        for var in policy.required_variables {
            match site_entry.environment_variable(var) {
                Some(value) if !value.trim().is_empty() => {
                    profiles.set(Namespace::Env, *var, value);
                }
                _ => {
                    return SynthesisOutcome::Unavailable {
                        reason: format!("{var} not set for site {site}"),
                    }
                }
            }
        }
        for var in policy.optional_variables {
            if let Some(value) = site_entry.environment_variable(var) {
                profiles.set(Namespace::Env, *var, value);
            }
        }

        let entry = TransformationCatalogEntry {
            name: name.clone(),
            site: site.to_string(),
            physical_path: format!("{}/bin/{}", home.trim_end_matches('/'), name.name),
            kind: TransformationType::Installed,
            profiles,
            sysinfo: site_entry.sysinfo.clone(),
        };
        debug!(
            transformation = %name,
            site,
            path = %entry.physical_path,
            "synthesized default entry"
        );

        if let Err(e) = self.catalog.insert(entry.clone(), false) {
            debug!(transformation = %name, site, error = %e, "unable to register synthesized entry");
        }
        SynthesisOutcome::Synthesized(entry)
    }
}
