//! File transfer requests
//!
//! A [`FileTransfer`] names one logical file and every location it can be
//! read from or written to. The first source and first destination are the
//! preferred pair; the rest model replicas.

use serde::{Deserialize, Serialize};

/// What a transferred file is used for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Ordinary data file
    #[default]
    Data,
    /// Staged executable; needs its execute bit set after transfer
    Executable,
    /// Anything else
    Other,
}

/// A URL paired with the site that hosts it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteUrl {
    /// Site handle
    pub site: String,
    /// Full URL including scheme
    pub url: String,
}

impl SiteUrl {
    /// Create a new site/URL pair
    #[inline]
    #[must_use]
    pub fn new(site: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            url: url.into(),
        }
    }
}

impl<S: Into<String>, U: Into<String>> From<(S, U)> for SiteUrl {
    fn from((site, url): (S, U)) -> Self {
        Self::new(site, url)
    }
}

/// One logical file to move
///
/// Always holds at least one source and one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFileTransfer")]
pub struct FileTransfer {
    lfn: String,
    sources: Vec<SiteUrl>,
    destinations: Vec<SiteUrl>,
    kind: FileKind,
}

#[derive(Deserialize)]
struct RawFileTransfer {
    lfn: String,
    sources: Vec<SiteUrl>,
    destinations: Vec<SiteUrl>,
    #[serde(default)]
    kind: FileKind,
}

/// Error for a deserialized file transfer with no source or destination
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("file {lfn} needs at least one source and one destination")]
pub struct IncompleteFileTransfer {
    /// Logical file name of the rejected request
    pub lfn: String,
}

impl TryFrom<RawFileTransfer> for FileTransfer {
    type Error = IncompleteFileTransfer;

    fn try_from(raw: RawFileTransfer) -> Result<Self, Self::Error> {
        if raw.sources.is_empty() || raw.destinations.is_empty() {
            return Err(IncompleteFileTransfer { lfn: raw.lfn });
        }
        Ok(Self {
            lfn: raw.lfn,
            sources: raw.sources,
            destinations: raw.destinations,
            kind: raw.kind,
        })
    }
}

impl FileTransfer {
    /// Create a transfer with one source and one destination
    #[must_use]
    pub fn new(
        lfn: impl Into<String>,
        source: impl Into<SiteUrl>,
        destination: impl Into<SiteUrl>,
    ) -> Self {
        Self {
            lfn: lfn.into(),
            sources: vec![source.into()],
            destinations: vec![destination.into()],
            kind: FileKind::Data,
        }
    }

    /// With file kind
    #[inline]
    #[must_use]
    pub fn with_kind(mut self, kind: FileKind) -> Self {
        self.kind = kind;
        self
    }

    /// With an alternate source location
    #[inline]
    #[must_use]
    pub fn with_source(mut self, source: impl Into<SiteUrl>) -> Self {
        self.sources.push(source.into());
        self
    }

    /// With an alternate destination location
    #[inline]
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<SiteUrl>) -> Self {
        self.destinations.push(destination.into());
        self
    }

    /// Logical file name
    #[inline]
    #[must_use]
    pub fn lfn(&self) -> &str {
        &self.lfn
    }

    /// File kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// Whether this file is a staged executable
    #[inline]
    #[must_use]
    pub fn is_executable(&self) -> bool {
        self.kind == FileKind::Executable
    }

    /// Preferred source location
    #[inline]
    #[must_use]
    pub fn source(&self) -> &SiteUrl {
        &self.sources[0]
    }

    /// Preferred destination location
    #[inline]
    #[must_use]
    pub fn destination(&self) -> &SiteUrl {
        &self.destinations[0]
    }

    /// All source locations
    #[inline]
    #[must_use]
    pub fn sources(&self) -> &[SiteUrl] {
        &self.sources
    }

    /// All destination locations
    #[inline]
    #[must_use]
    pub fn destinations(&self) -> &[SiteUrl] {
        &self.destinations
    }
}

/// Strip the scheme and authority from a URL, leaving the absolute path.
///
/// `file:///local/out.dat` becomes `/local/out.dat` and
/// `gsiftp://host:2811/data/x` becomes `/data/x`. Strings without a scheme
/// are returned unchanged.
#[must_use]
pub fn absolute_path(url: &str) -> &str {
    match url.find("://") {
        Some(idx) => {
            let rest = &url[idx + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "/",
            }
        }
        None => url,
    }
}
