//! Namespaced profiles
//!
//! Profiles are key/value settings grouped by namespace. Jobs accumulate them
//! from several layers (site, catalog entry, global configuration); a later
//! layer overrides an earlier one key by key.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Well-known profile keys
pub mod keys {
    /// Pegasus: job explicitly asks for its proxy to be transferred
    pub const TRANSFER_PROXY: &str = "transfer.proxy";
    /// Pegasus: replaces the computed arguments of a transfer job
    pub const TRANSFER_ARGUMENTS: &str = "transfer.arguments";
    /// Pegasus: execution style of the site (`condor`, `glidein`, ...)
    pub const STYLE: &str = "style";
    /// Pegasus: whether the launcher wrapper is applied
    pub const GRIDSTART: &str = "gridstart";
    /// Env: location of the user proxy
    pub const X509_USER_PROXY: &str = "X509_USER_PROXY";
    /// Env: command run by the launcher before the job
    pub const GRIDSTART_PREJOB: &str = "GRIDSTART_PREJOB";
    /// Condor: execution universe
    pub const UNIVERSE: &str = "universe";
    /// Condor: job priority
    pub const PRIORITY: &str = "priority";
    /// Condor: working directory on the remote side
    pub const REMOTE_INITIALDIR: &str = "remote_initialdir";
    /// Condor: marks a placeholder job
    pub const NOOP_JOB: &str = "noop_job";
    /// Condor: exit code reported by a placeholder job
    pub const NOOP_JOB_EXIT_CODE: &str = "noop_job_exit_code";
    /// Dagman: throttling category
    pub const CATEGORY: &str = "category";
}

/// Profile namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// Environment variables
    Env,
    /// Scheduler attributes
    Condor,
    /// Planner settings
    Pegasus,
    /// Grid resource attributes
    Globus,
    /// Workflow manager settings
    Dagman,
}

impl Namespace {
    /// All namespaces
    pub const ALL: [Namespace; 5] = [
        Namespace::Env,
        Namespace::Condor,
        Namespace::Pegasus,
        Namespace::Globus,
        Namespace::Dagman,
    ];
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Namespace::Env => "env",
            Namespace::Condor => "condor",
            Namespace::Pegasus => "pegasus",
            Namespace::Globus => "globus",
            Namespace::Dagman => "dagman",
        };
        f.write_str(s)
    }
}

/// Profiles grouped by namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profiles {
    /// Environment variables
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Scheduler attributes
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub condor: BTreeMap<String, String>,
    /// Planner settings
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub pegasus: BTreeMap<String, String>,
    /// Grid resource attributes
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub globus: BTreeMap<String, String>,
    /// Workflow manager settings
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dagman: BTreeMap<String, String>,
}

impl Profiles {
    /// Create an empty profile set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With one profile set
    #[inline]
    #[must_use]
    pub fn with(mut self, ns: Namespace, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(ns, key, value);
        self
    }

    fn namespace(&self, ns: Namespace) -> &BTreeMap<String, String> {
        match ns {
            Namespace::Env => &self.env,
            Namespace::Condor => &self.condor,
            Namespace::Pegasus => &self.pegasus,
            Namespace::Globus => &self.globus,
            Namespace::Dagman => &self.dagman,
        }
    }

    fn namespace_mut(&mut self, ns: Namespace) -> &mut BTreeMap<String, String> {
        match ns {
            Namespace::Env => &mut self.env,
            Namespace::Condor => &mut self.condor,
            Namespace::Pegasus => &mut self.pegasus,
            Namespace::Globus => &mut self.globus,
            Namespace::Dagman => &mut self.dagman,
        }
    }

    /// Set a profile, returning the value it replaced
    pub fn set(
        &mut self,
        ns: Namespace,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.namespace_mut(ns).insert(key.into(), value.into())
    }

    /// Look up a profile
    #[must_use]
    pub fn get(&self, ns: Namespace, key: &str) -> Option<&str> {
        self.namespace(ns).get(key).map(String::as_str)
    }

    /// Remove a profile, returning its value
    pub fn remove(&mut self, ns: Namespace, key: &str) -> Option<String> {
        self.namespace_mut(ns).remove(key)
    }

    /// Whether a profile is set
    #[must_use]
    pub fn contains(&self, ns: Namespace, key: &str) -> bool {
        self.namespace(ns).contains_key(key)
    }

    /// Interpret a profile as a boolean flag; absent means false
    #[must_use]
    pub fn flag(&self, ns: Namespace, key: &str) -> bool {
        self.get(ns, key)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// Overlay `other` onto `self`; keys in `other` win
    pub fn merge(&mut self, other: &Profiles) {
        for ns in Namespace::ALL {
            let target = self.namespace_mut(ns);
            for (k, v) in other.namespace(ns) {
                target.insert(k.clone(), v.clone());
            }
        }
    }

    /// Total number of profiles across namespaces
    #[must_use]
    pub fn len(&self) -> usize {
        Namespace::ALL.iter().map(|ns| self.namespace(*ns).len()).sum()
    }

    /// Whether no profile is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over `(namespace, key, value)` triples
    pub fn iter(&self) -> impl Iterator<Item = (Namespace, &str, &str)> {
        Namespace::ALL.into_iter().flat_map(move |ns| {
            self.namespace(ns)
                .iter()
                .map(move |(k, v)| (ns, k.as_str(), v.as_str()))
        })
    }
}

impl FromIterator<(Namespace, String, String)> for Profiles {
    fn from_iter<T: IntoIterator<Item = (Namespace, String, String)>>(iter: T) -> Self {
        let mut profiles = Profiles::new();
        for (ns, k, v) in iter {
            profiles.set(ns, k, v);
        }
        profiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn later_layer_overrides_key_by_key() {
        let mut base = Profiles::new()
            .with(Namespace::Env, "PATH", "/site/bin")
            .with(Namespace::Env, "HOME", "/home/site");
        let overlay = Profiles::new().with(Namespace::Env, "PATH", "/entry/bin");
        base.merge(&overlay);

        assert_eq!(base.get(Namespace::Env, "PATH"), Some("/entry/bin"));
        assert_eq!(base.get(Namespace::Env, "HOME"), Some("/home/site"));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn flag_parses_case_insensitively() {
        let p = Profiles::new()
            .with(Namespace::Pegasus, keys::TRANSFER_PROXY, "True")
            .with(Namespace::Pegasus, keys::GRIDSTART, "none");
        assert!(p.flag(Namespace::Pegasus, keys::TRANSFER_PROXY));
        assert!(!p.flag(Namespace::Pegasus, keys::GRIDSTART));
        assert!(!p.flag(Namespace::Condor, keys::TRANSFER_PROXY));
    }

    #[test]
    fn iter_visits_every_namespace() {
        let p = Profiles::new()
            .with(Namespace::Condor, "priority", "10")
            .with(Namespace::Dagman, "category", "stage-in");
        let seen: Vec<_> = p.iter().map(|(ns, k, _)| (ns, k.to_string())).collect();
        assert_eq!(
            seen,
            vec![
                (Namespace::Condor, "priority".to_string()),
                (Namespace::Dagman, "category".to_string()),
            ]
        );
    }

    #[test]
    fn deserializes_from_toml_like_tables() {
        let p: Profiles =
            serde_json::from_str(r#"{"env":{"LD_LIBRARY_PATH":"/opt/lib"}}"#).unwrap();
        assert_eq!(p.get(Namespace::Env, "LD_LIBRARY_PATH"), Some("/opt/lib"));
        assert!(p.condor.is_empty());
    }
}
