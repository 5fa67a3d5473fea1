//! Manifest formats
//!
//! Multi-file strategies hand their transfer list to the job as a manifest
//! file named `<job>.in` in the submit directory. Three line formats exist:
//!
//! - [`ManifestFormat::PlainPairs`]: `<source> <dest>` per line
//! - [`ManifestFormat::CommentedBlocks`]: `#<site>` / URL lines, source then dest
//! - [`ManifestFormat::FixedPreamble`]: ten commented option lines, then
//!   alternating source and destination URL lines

use crate::config::JavaBatchOptions;
use crate::error::TransferError;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use xfer_model::FileTransfer;

/// Suffix of manifest files
pub const MANIFEST_SUFFIX: &str = ".in";

/// Line format of a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestFormat {
    /// `<source> <dest>` per file
    PlainPairs,
    /// `#<sourceSite>`, `<source>`, `#<destSite>`, `<dest>` per file
    CommentedBlocks,
    /// Option preamble followed by alternating source/dest lines
    FixedPreamble(JavaBatchOptions),
}

/// Manifest parse failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("manifest line {line}: {reason}")]
pub struct ManifestParseError {
    /// 1-based line number
    pub line: usize,
    /// What was wrong
    pub reason: String,
}

impl ManifestParseError {
    fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

fn preamble(opts: &JavaBatchOptions) -> [(&'static str, String); 10] {
    let subject = |s: &Option<String>| s.clone().unwrap_or_else(|| "null".to_string());
    [
        ("#true=binary false=ascii", opts.binary.to_string()),
        ("#Block Size in Bytes", opts.block_size.to_string()),
        ("#TCP Buffer Sizes in Bytes", opts.tcp_buffer_size.to_string()),
        ("#Number of parallel streams", opts.streams.to_string()),
        ("#Data Channel Authentication (DCAU)", opts.dcau.to_string()),
        ("#Concurrency of the request", opts.concurrency.to_string()),
        ("#Grid Subject name of the source gridftp server", subject(&opts.source_subject)),
        (
            "#Grid Subject name of the destination gridftp server",
            subject(&opts.destination_subject),
        ),
        ("#Transfer all or none of the transfers", opts.all_or_none.to_string()),
        ("#Maximum number of retries", opts.retries.to_string()),
    ]
}

impl ManifestFormat {
    /// Write the preferred source/destination pair of every file
    ///
    /// # Errors
    /// Returns error if the writer fails
    pub fn write<W: Write + ?Sized>(&self, w: &mut W, files: &[FileTransfer]) -> io::Result<()> {
        match self {
            ManifestFormat::PlainPairs => {
                for f in files {
                    writeln!(w, "{} {}", f.source().url, f.destination().url)?;
                }
            }
            ManifestFormat::CommentedBlocks => {
                for f in files {
                    writeln!(w, "#{}", f.source().site)?;
                    writeln!(w, "{}", f.source().url)?;
                    writeln!(w, "#{}", f.destination().site)?;
                    writeln!(w, "{}", f.destination().url)?;
                }
            }
            ManifestFormat::FixedPreamble(opts) => {
                for (comment, value) in preamble(opts) {
                    writeln!(w, "{comment}")?;
                    writeln!(w, "{value}")?;
                }
                writeln!(w, "#Source/Dest URL Pairs")?;
                for f in files {
                    writeln!(w, "{}", f.source().url)?;
                    writeln!(w, "{}", f.destination().url)?;
                }
            }
        }
        Ok(())
    }

    /// Recover the `(source, dest)` URL pairs, in order
    ///
    /// # Errors
    /// Returns error on a malformed line or an unpaired URL
    pub fn parse(&self, text: &str) -> Result<Vec<(String, String)>, ManifestParseError> {
        match self {
            ManifestFormat::PlainPairs => text
                .lines()
                .enumerate()
                .filter(|(_, l)| !l.trim().is_empty())
                .map(|(i, l)| {
                    let mut parts = l.split_whitespace();
                    match (parts.next(), parts.next(), parts.next()) {
                        (Some(s), Some(d), None) => Ok((s.to_string(), d.to_string())),
                        _ => Err(ManifestParseError::new(i + 1, "expected `<source> <dest>`")),
                    }
                })
                .collect(),
            ManifestFormat::CommentedBlocks => {
                let urls = text
                    .lines()
                    .enumerate()
                    .filter(|(_, l)| !l.trim().is_empty() && !l.starts_with('#'));
                pair_up(urls)
            }
            ManifestFormat::FixedPreamble(_) => {
                let mut lines = text.lines().enumerate();
                for (comment, _) in preamble(&JavaBatchOptions::default()) {
                    match lines.next() {
                        Some((_, l)) if l == comment => {}
                        Some((i, _)) => {
                            return Err(ManifestParseError::new(i + 1, format!("expected `{comment}`")))
                        }
                        None => return Err(ManifestParseError::new(0, "truncated preamble")),
                    }
                    if lines.next().is_none() {
                        return Err(ManifestParseError::new(0, "truncated preamble"));
                    }
                }
                pair_up(lines.filter(|(_, l)| !l.trim().is_empty() && !l.starts_with('#')))
            }
        }
    }
}

fn pair_up<'a>(
    mut urls: impl Iterator<Item = (usize, &'a str)>,
) -> Result<Vec<(String, String)>, ManifestParseError> {
    let mut pairs = Vec::new();
    while let Some((i, src)) = urls.next() {
        let Some((_, dst)) = urls.next() else {
            return Err(ManifestParseError::new(i + 1, "source URL without destination"));
        };
        pairs.push((src.trim().to_string(), dst.trim().to_string()));
    }
    Ok(pairs)
}

/// Path of the manifest for `job_name` under `dir`
#[must_use]
pub fn manifest_path(dir: &Path, job_name: &str) -> PathBuf {
    dir.join(format!("{job_name}{MANIFEST_SUFFIX}"))
}

/// `path` made absolute against the current directory
#[must_use]
pub fn absolute_manifest_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
}

/// Write `files` to `<dir>/<job_name>.in`
///
/// # Errors
/// Returns [`TransferError::ManifestWrite`] if the file cannot be written
pub fn write_manifest_file(
    dir: &Path,
    job_name: &str,
    format: &ManifestFormat,
    files: &[FileTransfer],
) -> Result<PathBuf, TransferError> {
    let path = manifest_path(dir, job_name);
    let result = File::create(&path).and_then(|file| {
        let mut w = BufWriter::new(file);
        format.write(&mut w, files)?;
        w.flush()
    });
    match result {
        Ok(()) => {
            debug!(job = job_name, path = %path.display(), files = files.len(), "wrote manifest");
            Ok(path)
        }
        Err(source) => {
            error!(job = job_name, path = %path.display(), error = %source, "unable to write manifest");
            Err(TransferError::ManifestWrite {
                path,
                job: job_name.to_string(),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn files() -> Vec<FileTransfer> {
        vec![
            FileTransfer::new("a", ("local", "file:///in/a"), ("site1", "gsiftp://site1/s/a")),
            FileTransfer::new("b", ("local", "file:///in/b"), ("site1", "gsiftp://site1/s/b")),
        ]
    }

    fn render(format: &ManifestFormat) -> String {
        let mut out = Vec::new();
        format.write(&mut out, &files()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn plain_pairs_layout() {
        assert_eq!(
            render(&ManifestFormat::PlainPairs),
            "file:///in/a gsiftp://site1/s/a\nfile:///in/b gsiftp://site1/s/b\n"
        );
    }

    #[test]
    fn commented_blocks_layout() {
        assert_eq!(
            render(&ManifestFormat::CommentedBlocks),
            "#local\nfile:///in/a\n#site1\ngsiftp://site1/s/a\n\
             #local\nfile:///in/b\n#site1\ngsiftp://site1/s/b\n"
        );
    }

    #[test]
    fn fixed_preamble_layout() {
        let text = render(&ManifestFormat::FixedPreamble(JavaBatchOptions::default()));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "#true=binary false=ascii");
        assert_eq!(lines[1], "true");
        assert_eq!(lines[3], "16000");
        assert_eq!(lines[13], "null");
        assert_eq!(lines[19], "3");
        assert_eq!(lines[20], "#Source/Dest URL Pairs");
        assert_eq!(&lines[21..], &["file:///in/a", "gsiftp://site1/s/a", "file:///in/b", "gsiftp://site1/s/b"]);
    }

    #[test]
    fn parse_rejects_unpaired_url() {
        let err = ManifestFormat::CommentedBlocks
            .parse("#local\nfile:///in/a\n")
            .unwrap_err();
        assert_eq!(err.line, 2);
        assert!(ManifestFormat::PlainPairs.parse("only-one-url\n").is_err());
    }

    #[test]
    fn write_manifest_file_uses_job_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest_file(dir.path(), "tx_a", &ManifestFormat::PlainPairs, &files()).unwrap();
        assert_eq!(path, dir.path().join("tx_a.in"));
        assert_eq!(std::fs::read_to_string(path).unwrap().lines().count(), 2);
    }

    #[test]
    fn write_manifest_file_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no/such/dir");
        let err = write_manifest_file(&missing, "tx_a", &ManifestFormat::PlainPairs, &files()).unwrap_err();
        match err {
            TransferError::ManifestWrite { path, job, .. } => {
                assert_eq!(path, missing.join("tx_a.in"));
                assert_eq!(job, "tx_a");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
