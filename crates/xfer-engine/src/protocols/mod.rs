//! Protocol strategies
//!
//! Each protocol names the transformation that performs its transfers and
//! renders its argument string. Batching, routing and fix-ups are left to
//! the templates in [`crate::templates`].
//!
//! | Key | Batching | Keeps x-bit | Always third-party |
//! |---|---|---|---|
//! | `url-copy` | single | no | no |
//! | `blocking-batch` | multi | yes | no |
//! | `java-batch` | multi | yes | yes |
//! | `transfer` | multi | no | no |
//! | `symlink` | multi | no | no |
//! | `object-store` | single | no | yes |
//! | `dc-retrieve`, `dc-ingest` | single | no | no |

mod blocking_batch;
mod data_catalog;
mod java_batch;
mod object_store;
mod symlink;
mod transfer;
mod url_copy;

pub use blocking_batch::BlockingBatch;
pub use data_catalog::{DataCatalogClient, DataCatalogOperation, DC_HOME};
pub use java_batch::JavaBatch;
pub use object_store::ObjectStore;
pub use symlink::Symlink;
pub use transfer::{TransferWrapper, WRAPPER_SYNTHESIS};
pub use url_copy::UrlCopy;
