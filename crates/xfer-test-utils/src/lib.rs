//! Testing utilities for the XFER workspace
//!
//! Shared fixtures: a populated transformation catalog, a site store, and
//! builders for compute jobs and file transfers.

#![allow(missing_docs)]

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use xfer_catalog::{
    GatewayKind, InMemoryCatalog, InMemorySiteStore, SiteEntry, SiteStore, TransformationCatalog,
};
use xfer_model::{
    ComputeJob, FileKind, FileTransfer, TransformationCatalogEntry, TransformationName,
    LOCAL_SITE,
};

/// Sites with a full catalog
pub const CATALOGED_SITES: [&str; 3] = [LOCAL_SITE, "site1", "site2"];

/// Site with install-home environment but no catalog entries
pub const BARE_SITE: &str = "siteX";

pub const PEGASUS_HOME: &str = "/opt/pegasus";
pub const BARE_PEGASUS_HOME: &str = "/usr/local/pegasus";
pub const DC_HOME: &str = "/opt/dc";

/// Transformations installed on every cataloged site, with their paths
pub const INSTALLED: [(&str, &str, &str); 7] = [
    ("pegasus", "transfer", "/opt/pegasus/bin/transfer"),
    ("pegasus", "dirmanager", "/opt/pegasus/bin/dirmanager"),
    ("pegasus", "seqexec", "/opt/pegasus/bin/seqexec"),
    ("globus", "guc", "/usr/bin/globus-url-copy"),
    ("globus", "crft", "/opt/globus/bin/crft"),
    ("globus", "rft", "/opt/globus/bin/rft"),
    ("amazon", "s3cmd", "/usr/bin/s3cmd"),
];

pub fn transfer_gateway(site: &str) -> String {
    format!("{site}.example.org/jobmanager-fork")
}

pub fn standard_catalog() -> InMemoryCatalog {
    InMemoryCatalog::from_entries(CATALOGED_SITES.iter().flat_map(|site| {
        INSTALLED.iter().map(move |(ns, name, path)| {
            TransformationCatalogEntry::new(TransformationName::namespaced(*ns, *name), *site, *path)
        })
    }))
}

pub fn standard_sites() -> InMemorySiteStore {
    let cataloged = CATALOGED_SITES.iter().map(|site| {
        SiteEntry::new(*site)
            .with_env("PEGASUS_HOME", PEGASUS_HOME)
            .with_env("LD_LIBRARY_PATH", "/opt/globus/lib")
            .with_env("DC_HOME", DC_HOME)
            .with_gateway(GatewayKind::Transfer, transfer_gateway(site))
            .with_gateway(GatewayKind::Compute, format!("{site}.example.org/jobmanager-pbs"))
    });
    let bare = SiteEntry::new(BARE_SITE)
        .with_env("PEGASUS_HOME", BARE_PEGASUS_HOME)
        .with_env("LD_LIBRARY_PATH", "/usr/local/lib");
    InMemorySiteStore::from_sites(cataloged.chain(std::iter::once(bare)))
}

/// Catalog, site store and a scratch submit directory
#[derive(Debug)]
pub struct Fixture {
    catalog: Arc<InMemoryCatalog>,
    sites: Arc<InMemorySiteStore>,
    submit: TempDir,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            catalog: Arc::new(standard_catalog()),
            sites: Arc::new(standard_sites()),
            submit: tempfile::tempdir().unwrap(),
        }
    }

    /// Add or replace a site
    pub fn with_site(self, site: SiteEntry) -> Self {
        self.sites.insert(site);
        self
    }

    pub fn catalog(&self) -> Arc<dyn TransformationCatalog> {
        self.catalog.clone()
    }

    pub fn sites(&self) -> Arc<dyn SiteStore> {
        self.sites.clone()
    }

    /// Concrete catalog, for inspecting inserts
    pub fn catalog_store(&self) -> &InMemoryCatalog {
        &self.catalog
    }

    pub fn submit_dir(&self) -> &Path {
        self.submit.path()
    }
}

pub fn compute_job(name: &str, site: &str) -> ComputeJob {
    ComputeJob::new(name, site)
}

pub fn scratch_url(site: &str, lfn: &str) -> String {
    format!("gsiftp://{site}.example.org/scratch/{lfn}")
}

/// `file:///inputs/<lfn>` on `local` to scratch on `site`
pub fn stage_in_file(lfn: &str, site: &str) -> FileTransfer {
    FileTransfer::new(
        lfn,
        (LOCAL_SITE, format!("file:///inputs/{lfn}")),
        (site, scratch_url(site, lfn)),
    )
}

/// Scratch on `site` to `file:///outputs/<lfn>` on `local`
pub fn stage_out_file(lfn: &str, site: &str) -> FileTransfer {
    FileTransfer::new(
        lfn,
        (site, scratch_url(site, lfn)),
        (LOCAL_SITE, format!("file:///outputs/{lfn}")),
    )
}

/// Scratch on `from` to scratch on `to`
pub fn inter_site_file(lfn: &str, from: &str, to: &str) -> FileTransfer {
    FileTransfer::new(lfn, (from, scratch_url(from, lfn)), (to, scratch_url(to, lfn)))
}

/// A staged-in executable
pub fn executable(lfn: &str, site: &str) -> FileTransfer {
    stage_in_file(lfn, site).with_kind(FileKind::Executable)
}

/// `n` stage-in data files named `f0.dat`, `f1.dat`, ...
pub fn stage_in_files(n: usize, site: &str) -> Vec<FileTransfer> {
    (0..n)
        .map(|i| stage_in_file(&format!("f{i}.dat"), site))
        .collect()
}
