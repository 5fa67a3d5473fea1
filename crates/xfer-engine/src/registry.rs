//! Implementation registry
//!
//! Maps configuration keys to constructors. The set of implementations is
//! fixed at compile time; configuration only picks among them.

use crate::composite::Composite;
use crate::config::TransferConfig;
use crate::error::ConfigError;
use crate::protocols::{
    BlockingBatch, DataCatalogClient, JavaBatch, ObjectStore, Symlink, TransferWrapper, UrlCopy,
};
use crate::strategy::TransferImplementation;
use crate::templates::{MultiFileTemplate, SingleFileTemplate};
use xfer_model::JobClass;

type Constructor = fn(&TransferConfig) -> Result<Box<dyn TransferImplementation>, ConfigError>;

struct Registration {
    key: &'static str,
    description: &'static str,
    construct: Constructor,
}

fn url_copy(config: &TransferConfig) -> Result<Box<dyn TransferImplementation>, ConfigError> {
    Ok(Box::new(SingleFileTemplate::new(UrlCopy::new(config))))
}

fn blocking_batch(config: &TransferConfig) -> Result<Box<dyn TransferImplementation>, ConfigError> {
    Ok(Box::new(MultiFileTemplate::new(BlockingBatch::new(config)?)))
}

fn java_batch(config: &TransferConfig) -> Result<Box<dyn TransferImplementation>, ConfigError> {
    Ok(Box::new(MultiFileTemplate::new(JavaBatch::new(config))))
}

fn transfer(config: &TransferConfig) -> Result<Box<dyn TransferImplementation>, ConfigError> {
    Ok(Box::new(MultiFileTemplate::new(TransferWrapper::new(config))))
}

fn symlink(config: &TransferConfig) -> Result<Box<dyn TransferImplementation>, ConfigError> {
    Ok(Box::new(MultiFileTemplate::new(Symlink::new(config))))
}

fn object_store(config: &TransferConfig) -> Result<Box<dyn TransferImplementation>, ConfigError> {
    Ok(Box::new(SingleFileTemplate::new(ObjectStore::new(config))))
}

fn dc_retrieve(config: &TransferConfig) -> Result<Box<dyn TransferImplementation>, ConfigError> {
    Ok(Box::new(SingleFileTemplate::new(DataCatalogClient::retrieve(config))))
}

fn dc_ingest(config: &TransferConfig) -> Result<Box<dyn TransferImplementation>, ConfigError> {
    Ok(Box::new(SingleFileTemplate::new(DataCatalogClient::ingest(config))))
}

fn composite(config: &TransferConfig) -> Result<Box<dyn TransferImplementation>, ConfigError> {
    Ok(Box::new(Composite::new(config)))
}

static REGISTRY: &[Registration] = &[
    Registration {
        key: UrlCopy::KEY,
        description: "single URL copy client, one file per job",
        construct: url_copy,
    },
    Registration {
        key: BlockingBatch::KEY,
        description: "C based blocking reliable transfer client (needs blocking_batch.endpoint)",
        construct: blocking_batch,
    },
    Registration {
        key: JavaBatch::KEY,
        description: "Java reliable transfer client, always third-party",
        construct: java_batch,
    },
    Registration {
        key: TransferWrapper::KEY,
        description: "general purpose batch transfer wrapper",
        construct: transfer,
    },
    Registration {
        key: Symlink::KEY,
        description: "symlink variant of the batch transfer wrapper",
        construct: symlink,
    },
    Registration {
        key: ObjectStore::KEY,
        description: "object storage put/get client, always third-party",
        construct: object_store,
    },
    Registration {
        key: DataCatalogClient::RETRIEVE_KEY,
        description: "data catalog retrieve client",
        construct: dc_retrieve,
    },
    Registration {
        key: DataCatalogClient::INGEST_KEY,
        description: "data catalog ingest client",
        construct: dc_ingest,
    },
    Registration {
        key: Composite::KEY,
        description: "routes patterns to the batch wrapper and raw datasets to the data catalog",
        construct: composite,
    },
];

/// Static table of transfer implementations
#[derive(Debug, Clone, Copy)]
pub struct ImplementationRegistry;

impl ImplementationRegistry {
    fn find(key: &str) -> Option<&'static Registration> {
        REGISTRY.iter().find(|r| r.key == key)
    }

    /// Whether `key` is registered
    #[must_use]
    pub fn contains(key: &str) -> bool {
        Self::find(key).is_some()
    }

    /// Registered keys in table order
    pub fn keys() -> impl Iterator<Item = &'static str> {
        REGISTRY.iter().map(|r| r.key)
    }

    /// `(key, description)` pairs in table order
    pub fn describe() -> impl Iterator<Item = (&'static str, &'static str)> {
        REGISTRY.iter().map(|r| (r.key, r.description))
    }

    /// Construct the implementation registered under `key` for `class`
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownImplementation`] for an unregistered
    /// key, or the constructor's own error
    pub fn create(
        key: &str,
        class: JobClass,
        config: &TransferConfig,
    ) -> Result<Box<dyn TransferImplementation>, ConfigError> {
        let registration = Self::find(key).ok_or_else(|| ConfigError::UnknownImplementation {
            class,
            key: key.to_string(),
        })?;
        (registration.construct)(config)
    }
}

/// One implementation per job class, chosen from configuration
#[derive(Debug)]
pub struct Implementations {
    stage_in: Box<dyn TransferImplementation>,
    stage_out: Box<dyn TransferImplementation>,
    inter_site: Box<dyn TransferImplementation>,
    setup: Box<dyn TransferImplementation>,
}

impl Implementations {
    /// Construct the implementation selected for every class
    ///
    /// # Errors
    /// Returns error if a selected key is unknown or its constructor fails
    pub fn from_config(config: &TransferConfig) -> Result<Self, ConfigError> {
        let build = |class| {
            let key = config.implementations.get(class);
            let implementation = ImplementationRegistry::create(key, class, config)?;
            tracing::debug!(%class, key, "selected transfer implementation");
            Ok::<_, ConfigError>(implementation)
        };
        Ok(Self {
            stage_in: build(JobClass::StageIn)?,
            stage_out: build(JobClass::StageOut)?,
            inter_site: build(JobClass::InterSite)?,
            setup: build(JobClass::Setup)?,
        })
    }

    /// Implementation for `class`
    #[must_use]
    pub fn get(&self, class: JobClass) -> &dyn TransferImplementation {
        match class {
            JobClass::StageIn => self.stage_in.as_ref(),
            JobClass::StageOut => self.stage_out.as_ref(),
            JobClass::InterSite => self.inter_site.as_ref(),
            JobClass::Setup => self.setup.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_constructs() {
        let config = TransferConfig::new().with_endpoint("rft.example.org:8443");
        for key in ImplementationRegistry::keys() {
            let implementation = ImplementationRegistry::create(key, JobClass::StageIn, &config).unwrap();
            assert_eq!(implementation.key(), key);
        }
        assert_eq!(ImplementationRegistry::keys().count(), 9);
    }

    #[test]
    fn unknown_key_names_class() {
        let err = ImplementationRegistry::create("ftp", JobClass::Setup, &TransferConfig::new()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownImplementation { class: JobClass::Setup, .. }));
    }

    #[test]
    fn capabilities_follow_protocol() {
        let config = TransferConfig::new().with_endpoint("rft.example.org:8443");
        let get = |key| ImplementationRegistry::create(key, JobClass::StageIn, &config).unwrap();
        assert!(get("blocking-batch").preserves_execute_bit());
        assert!(get("java-batch").always_third_party());
        assert!(get("object-store").always_third_party());
        assert!(!get("transfer").preserves_execute_bit());
        assert!(!get("composite").always_third_party());
    }

    #[test]
    fn selection_per_class() {
        let config = TransferConfig::new()
            .with_implementation(JobClass::StageIn, "url-copy")
            .with_implementation(JobClass::StageOut, "object-store");
        let implementations = Implementations::from_config(&config).unwrap();
        assert_eq!(implementations.get(JobClass::StageIn).key(), "url-copy");
        assert_eq!(implementations.get(JobClass::StageOut).key(), "object-store");
        assert_eq!(implementations.get(JobClass::Setup).key(), "transfer");
    }
}
