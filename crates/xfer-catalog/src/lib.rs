//! # XFER Catalog
//!
//! Where transfer executables come from.
//!
//! - [`TransformationCatalog`]: lookup and best-effort insert of catalog entries
//! - [`SiteStore`]: per-site environment, profiles and grid gateways
//! - [`CatalogResolver`]: catalog lookup with an optional default-entry
//!   synthesis fallback driven by a [`SynthesisPolicy`]
//! - [`CatalogSnapshot`]: sites and entries loaded from a YAML or JSON file

pub mod catalog;
pub mod error;
pub mod resolver;
pub mod site;
pub mod snapshot;

pub use catalog::{InMemoryCatalog, TransformationCatalog};
pub use error::CatalogError;
pub use resolver::{CatalogResolver, EntryOrigin, Resolution, SynthesisOutcome, SynthesisPolicy};
pub use site::{GatewayKind, GridGateway, InMemorySiteStore, SiteEntry, SiteStore};
pub use snapshot::CatalogSnapshot;
