//! Batching templates
//!
//! A template owns one protocol and drives the shared construction steps
//! around it. [`SingleFileTemplate`] builds one job per file;
//! [`MultiFileTemplate`] builds one job per batch through a manifest.

mod multi;
mod single;

pub use multi::MultiFileTemplate;
pub use single::SingleFileTemplate;
