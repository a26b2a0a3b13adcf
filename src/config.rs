//! # Extensible YAML-backed configuration service.
//!
//! [`DynamicConfig`] is a container-managed service that other services
//! join through `config` injection points. Each point names a section; all
//! points across all services that declare the same section name share one
//! typed instance. The first registrant allocates it, later registrants
//! merely receive it.
//!
//! The loader declares its own `--config` flag (default `config.yaml`) and
//! reads the document during its Start phase: every top-level key matching
//! a registered section is decoded into the shared instance; unrecognized
//! keys are ignored. In the file, the YAML consists of one object per
//! section:
//!
//! ```yaml
//! database:
//!   url: postgres://localhost/app
//! limits:
//!   max_connections: 32
//! ```
//!
//! [`DynamicConfig::apply`] is the public handoff for alternative loaders:
//! it dispatches one section's structured value into the registered
//! instance.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{BoxError, KernelError};
use crate::inject::{Flag, InjectionPoint, Section};
use crate::kernel::{Service, Startable};

type Decoder = Box<dyn Fn(serde_yaml::Value) -> Result<(), KernelError> + Send + Sync>;

struct SectionEntry {
    /// The shared `Arc<RwLock<C>>`, kept downcastable for later registrants.
    shared: Arc<dyn Any + Send + Sync>,
    decode: Decoder,
}

/// YAML configuration loader; one shared typed instance per section name.
#[derive(Default)]
pub struct DynamicConfig {
    filename: Flag<String>,
    entries: Mutex<HashMap<String, SectionEntry>>,
}

impl Service for DynamicConfig {
    fn injection_points(&self) -> Vec<InjectionPoint> {
        vec![InjectionPoint::flag("config", &self.filename)
            .described("Configuration file")
            .with_default("config.yaml")]
    }

    fn as_startable(&self) -> Option<&dyn Startable> {
        Some(self)
    }
}

#[async_trait]
impl Startable for DynamicConfig {
    async fn start(&self) -> Result<(), BoxError> {
        let path = self.filename.get().clone();
        let document =
            std::fs::read_to_string(&path).map_err(|source| KernelError::ConfigFile {
                path: path.clone(),
                source: Box::new(source),
            })?;
        self.load_str(&path, &document)?;
        Ok(())
    }
}

impl DynamicConfig {
    /// Registers a section slot, allocating the shared instance on first
    /// use. Fails when the section is already registered with a different
    /// target type.
    pub(crate) fn register_slot<C>(
        &self,
        section: &str,
        slot: Section<C>,
    ) -> Result<(), KernelError>
    where
        C: DeserializeOwned + Default + Send + Sync + 'static,
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.get(section) {
            let shared = Arc::clone(&entry.shared)
                .downcast::<RwLock<C>>()
                .map_err(|_| KernelError::SectionConflict(section.to_string()))?;
            slot.fill(shared);
            return Ok(());
        }

        let shared = Arc::new(RwLock::new(C::default()));
        let sink = Arc::clone(&shared);
        let name = section.to_string();
        entries.insert(
            section.to_string(),
            SectionEntry {
                shared: Arc::clone(&shared) as Arc<dyn Any + Send + Sync>,
                decode: Box::new(move |value| {
                    let decoded: C = serde_yaml::from_value(value).map_err(|source| {
                        KernelError::ConfigDecode {
                            section: name.clone(),
                            source,
                        }
                    })?;
                    *sink.write().unwrap_or_else(PoisonError::into_inner) = decoded;
                    Ok(())
                }),
            },
        );
        tracing::debug!(section, "registered config section");
        slot.fill(shared);
        Ok(())
    }

    /// Dispatches one section's structured value into the shared instance
    /// registered for that name; values for unregistered sections are
    /// ignored.
    pub fn apply(&self, section: &str, value: serde_yaml::Value) -> Result<(), KernelError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(section) {
            Some(entry) => (entry.decode)(value),
            None => {
                tracing::debug!(section, "ignoring unregistered config section");
                Ok(())
            }
        }
    }

    /// Parses a whole document and applies every top-level section.
    ///
    /// `path` is only used for error context. An empty document is valid
    /// and applies nothing.
    pub fn load_str(&self, path: &str, document: &str) -> Result<(), KernelError> {
        let root: serde_yaml::Value =
            serde_yaml::from_str(document).map_err(|source| KernelError::ConfigFile {
                path: path.to_string(),
                source: Box::new(source),
            })?;

        let mapping = match root {
            serde_yaml::Value::Null => return Ok(()),
            serde_yaml::Value::Mapping(mapping) => mapping,
            _ => {
                return Err(KernelError::ConfigFile {
                    path: path.to_string(),
                    source: "document root is not a mapping".into(),
                })
            }
        };

        for (key, value) in mapping {
            let Some(section) = key.as_str() else {
                tracing::debug!(path, "skipping non-string section key");
                continue;
            };
            self.apply(section, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct DbSettings {
        url: String,
        #[serde(default)]
        pool: u32,
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Limits {
        max_connections: u32,
    }

    #[test]
    fn test_registrants_of_one_section_share_the_instance() {
        let config = DynamicConfig::default();
        let first: Section<DbSettings> = Section::new();
        let second: Section<DbSettings> = Section::new();

        config.register_slot("database", first.clone()).expect("first");
        config
            .register_slot("database", second.clone())
            .expect("second");

        assert!(Arc::ptr_eq(first.handle(), second.handle()));
    }

    #[test]
    fn test_one_decode_populates_every_observer() {
        let config = DynamicConfig::default();
        let first: Section<DbSettings> = Section::new();
        let second: Section<DbSettings> = Section::new();
        config.register_slot("database", first.clone()).expect("first");
        config
            .register_slot("database", second.clone())
            .expect("second");

        config
            .load_str(
                "<test>",
                "database:\n  url: postgres://localhost/app\n  pool: 8\n",
            )
            .expect("load");

        assert_eq!(first.read().url, "postgres://localhost/app");
        assert_eq!(second.read().pool, 8);
    }

    #[test]
    fn test_type_conflict_on_one_section_is_rejected() {
        let config = DynamicConfig::default();
        let db: Section<DbSettings> = Section::new();
        let limits: Section<Limits> = Section::new();

        config.register_slot("database", db).expect("db");
        let err = config.register_slot("database", limits).unwrap_err();
        assert_eq!(err.as_label(), "config_section_conflict");
    }

    #[test]
    fn test_unregistered_sections_are_ignored() {
        let config = DynamicConfig::default();
        let db: Section<DbSettings> = Section::new();
        config.register_slot("database", db.clone()).expect("db");

        config
            .load_str("<test>", "other:\n  whatever: 1\ndatabase:\n  url: x\n")
            .expect("load");
        assert_eq!(db.read().url, "x");
    }

    #[test]
    fn test_empty_document_is_valid() {
        let config = DynamicConfig::default();
        config.load_str("<test>", "").expect("empty");
    }

    #[test]
    fn test_undecodable_section_fails() {
        let config = DynamicConfig::default();
        let limits: Section<Limits> = Section::new();
        config.register_slot("limits", limits).expect("limits");

        let err = config
            .load_str("<test>", "limits:\n  max_connections: not-a-number\n")
            .unwrap_err();
        assert_eq!(err.as_label(), "config_decode");
    }

    #[tokio::test]
    async fn test_start_reads_the_flagged_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "limits:\n  max_connections: 64").expect("write");

        let config = DynamicConfig::default();
        // bind the flag cell the way launch would after parsing
        config
            .filename
            .bind(file.path().to_string_lossy().to_string());

        let limits: Section<Limits> = Section::new();
        config.register_slot("limits", limits.clone()).expect("limits");

        config.start().await.expect("start");
        assert_eq!(limits.read().max_connections, 64);
    }

    #[tokio::test]
    async fn test_missing_file_fails_start() {
        let config = DynamicConfig::default();
        config
            .filename
            .bind("definitely-not-here.yaml".to_string());

        let err = config.start().await.unwrap_err();
        assert!(err.to_string().contains("definitely-not-here.yaml"));
    }
}
