//! Sites and catalog entries loaded from a file

use crate::catalog::InMemoryCatalog;
use crate::error::CatalogError;
use crate::site::{InMemorySiteStore, SiteEntry};
use serde::{Deserialize, Serialize};
use std::path::Path;
use xfer_model::TransformationCatalogEntry;

/// Serialized form of a site store plus a transformation catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Sites
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
    /// Catalog entries
    #[serde(default)]
    pub transformations: Vec<TransformationCatalogEntry>,
}

impl CatalogSnapshot {
    /// Load a snapshot; `.json` files are parsed as JSON, anything else as YAML
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str(&text).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&text).map_err(|e| e.to_string())
        };
        parsed.map_err(|reason| CatalogError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Split into in-memory backends
    #[must_use]
    pub fn into_stores(self) -> (InMemoryCatalog, InMemorySiteStore) {
        (
            InMemoryCatalog::from_entries(self.transformations),
            InMemorySiteStore::from_sites(self.sites),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TransformationCatalog;
    use crate::site::SiteStore;
    use std::io::Write;
    use xfer_model::TransformationName;

    const YAML: &str = r"
sites:
  - handle: site1
    profiles:
      env:
        PEGASUS_HOME: /opt/pegasus
    grid_gateways:
      - kind: transfer
        contact: site1/jobmanager-fork
transformations:
  - name:
      namespace: pegasus
      name: dirmanager
    site: site1
    physical_path: /opt/pegasus/bin/dirmanager
";

    #[test]
    fn loads_yaml_snapshot() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let snapshot = CatalogSnapshot::load(file.path()).unwrap();
        let (catalog, sites) = snapshot.into_stores();

        let name = TransformationName::namespaced("pegasus", "dirmanager");
        assert_eq!(catalog.lookup(&name, "site1", None).unwrap().len(), 1);
        assert_eq!(
            sites.environment_variable("site1", "PEGASUS_HOME").as_deref(),
            Some("/opt/pegasus")
        );
    }

    #[test]
    fn parse_error_names_path() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = CatalogSnapshot::load(file.path()).unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }
}
