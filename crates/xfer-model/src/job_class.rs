//! Transfer job classes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of data movement a transfer job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobClass {
    /// Move inputs onto the execution site
    StageIn,
    /// Move outputs off the execution site
    StageOut,
    /// Move data between two execution sites
    InterSite,
    /// Stage executables and other setup material
    Setup,
}

impl JobClass {
    /// All job classes, in declaration order
    pub const ALL: [JobClass; 4] = [
        JobClass::StageIn,
        JobClass::StageOut,
        JobClass::InterSite,
        JobClass::Setup,
    ];

    /// Stable string form, also used in configuration files
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            JobClass::StageIn => "stage-in",
            JobClass::StageOut => "stage-out",
            JobClass::InterSite => "inter-site",
            JobClass::Setup => "setup",
        }
    }
}

impl fmt::Display for JobClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown job class name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job class: {0}")]
pub struct ParseJobClassError(pub String);

impl FromStr for JobClass {
    type Err = ParseJobClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "stage-in" | "stagein" => Ok(JobClass::StageIn),
            "stage-out" | "stageout" => Ok(JobClass::StageOut),
            "inter-site" | "intersite" | "inter-pool" => Ok(JobClass::InterSite),
            "setup" => Ok(JobClass::Setup),
            other => Err(ParseJobClassError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        for class in JobClass::ALL {
            assert_eq!(class.to_string().parse::<JobClass>(), Ok(class));
        }
    }

    #[test]
    fn parse_accepts_underscores() {
        assert_eq!("stage_out".parse::<JobClass>(), Ok(JobClass::StageOut));
        assert!("compute".parse::<JobClass>().is_err());
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&JobClass::InterSite).unwrap();
        assert_eq!(json, "\"inter-site\"");
    }
}
