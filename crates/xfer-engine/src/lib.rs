//! # XFER Engine
//!
//! Builds the transfer jobs a workflow planner inserts around compute jobs:
//! stage-in before, stage-out after, inter-site between sites, and setup.
//!
//! ## Architecture
//!
//! ```text
//! TransferEngine ──▶ Implementations (one per job class, from config)
//!                        │
//!        ┌───────────────┼──────────────────┐
//!        ▼               ▼                  ▼
//!  SingleFileTemplate  MultiFileTemplate  Composite ──▶ JobAggregator
//!        │               │
//!        └──── Protocol ─┘ (url-copy, transfer, object-store, ...)
//!                        │
//!                        ▼
//!      base: routing, profile layering, proxy, priority, fix-ups
//! ```
//!
//! Jobs and edges are handed to the workflow through the [`Refiner`] trait.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use xfer_catalog::{InMemoryCatalog, InMemorySiteStore, SiteEntry};
//! use xfer_engine::{PlannerContext, Refiner, TransferConfig, TransferEngine, WorkflowGraph};
//! use xfer_model::{ComputeJob, FileTransfer, JobClass, TransformationCatalogEntry, TransformationName};
//!
//! let catalog = InMemoryCatalog::from_entries([TransformationCatalogEntry::new(
//!     TransformationName::namespaced("globus", "guc"),
//!     "site1",
//!     "/usr/bin/globus-url-copy",
//! )]);
//! let sites = InMemorySiteStore::from_sites([SiteEntry::new("site1")]);
//! let config = TransferConfig::new()
//!     .with_submit_dir(std::env::temp_dir())
//!     .with_implementations("url-copy");
//! let ctx = PlannerContext::new(config, Arc::new(catalog), Arc::new(sites)).unwrap();
//! let engine = TransferEngine::new(ctx).unwrap();
//!
//! let mut graph = WorkflowGraph::new();
//! let compute = ComputeJob::new("analyze", "site1");
//! graph.add_job(compute.clone().into()).unwrap();
//! let file = FileTransfer::new("a.dat", ("local", "file:///data/a.dat"), ("site1", "gsiftp://site1/scratch/a.dat"));
//!
//! let job = engine
//!     .create_transfer_job(&mut graph, &compute, &[file], "tx_analyze", JobClass::StageIn)
//!     .unwrap();
//! assert_eq!(job.site(), "site1");
//! assert!(job.arguments().ends_with("'gsiftp://site1/scratch/a.dat'"));
//! ```

pub mod aggregator;
pub mod base;
pub mod composite;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod plan;
pub mod protocols;
pub mod registry;
pub mod strategy;
pub mod templates;

pub use aggregator::JobAggregator;
pub use composite::Composite;
pub use config::{DisabledChmodSites, TransferConfig};
pub use context::PlannerContext;
pub use engine::TransferEngine;
pub use error::{ConfigError, GraphError, TransferError};
pub use graph::{Refiner, WorkflowGraph};
pub use manifest::ManifestFormat;
pub use registry::{ImplementationRegistry, Implementations};
pub use strategy::{
    MultiFileProtocol, Protocol, SingleFileProtocol, TransferImplementation, TransferRequest,
};
pub use templates::{MultiFileTemplate, SingleFileTemplate};
