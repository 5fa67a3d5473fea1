//! Transformations and their catalog entries

use crate::profiles::Profiles;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully qualified logical transformation: `namespace::name:version`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransformationName {
    /// Optional namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Logical name
    pub name: String,
    /// Optional version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl TransformationName {
    /// Create a name with no namespace or version
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
            version: None,
        }
    }

    /// Create a name inside a namespace
    #[inline]
    #[must_use]
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
            version: None,
        }
    }

    /// With version
    #[inline]
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl fmt::Display for TransformationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.namespace {
            write!(f, "{ns}::")?;
        }
        f.write_str(&self.name)?;
        if let Some(v) = &self.version {
            write!(f, ":{v}")?;
        }
        Ok(())
    }
}

/// How an executable is made available on a site
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransformationType {
    /// Already installed at the physical path
    #[default]
    Installed,
    /// Must be staged to the site before use
    Stageable,
}

/// Architecture and OS an executable is built for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SysInfo {
    /// CPU architecture
    pub arch: String,
    /// Operating system
    pub os: String,
}

impl Default for SysInfo {
    fn default() -> Self {
        Self {
            arch: "x86_64".to_string(),
            os: "linux".to_string(),
        }
    }
}

/// One transformation bound to one site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationCatalogEntry {
    /// Logical transformation
    pub name: TransformationName,
    /// Site handle
    pub site: String,
    /// Path of the executable on the site
    pub physical_path: String,
    /// Installed or stageable
    #[serde(default, rename = "type")]
    pub kind: TransformationType,
    /// Profiles attached to this entry
    #[serde(default)]
    pub profiles: Profiles,
    /// System descriptor
    #[serde(default)]
    pub sysinfo: SysInfo,
}

impl TransformationCatalogEntry {
    /// Create an installed entry with no profiles
    #[must_use]
    pub fn new(
        name: TransformationName,
        site: impl Into<String>,
        physical_path: impl Into<String>,
    ) -> Self {
        Self {
            name,
            site: site.into(),
            physical_path: physical_path.into(),
            kind: TransformationType::Installed,
            profiles: Profiles::default(),
            sysinfo: SysInfo::default(),
        }
    }

    /// With transformation type
    #[inline]
    #[must_use]
    pub fn with_kind(mut self, kind: TransformationType) -> Self {
        self.kind = kind;
        self
    }

    /// With profiles
    #[inline]
    #[must_use]
    pub fn with_profiles(mut self, profiles: Profiles) -> Self {
        self.profiles = profiles;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_omits_missing_parts() {
        assert_eq!(TransformationName::new("transfer").to_string(), "transfer");
        assert_eq!(
            TransformationName::namespaced("pegasus", "transfer").to_string(),
            "pegasus::transfer"
        );
        assert_eq!(
            TransformationName::namespaced("pegasus", "transfer")
                .with_version("2.0")
                .to_string(),
            "pegasus::transfer:2.0"
        );
    }

    #[test]
    fn entry_defaults_to_installed() {
        let e = TransformationCatalogEntry::new(
            TransformationName::namespaced("pegasus", "transfer"),
            "site1",
            "/opt/pegasus/bin/transfer",
        );
        assert_eq!(e.kind, TransformationType::Installed);
        assert!(e.profiles.is_empty());
    }
}
