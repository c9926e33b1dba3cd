//! Instance registry loaded from the config directory.

use super::{InstanceConfig, MonitorConfig, ResolvedInstance};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Tracked instances, in load order.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    instances: Vec<ResolvedInstance>,
    by_id: HashMap<String, usize>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every instance from `config_dir/instances/*.toml`.
    ///
    /// Files are read in name order. A malformed file or a repeated id
    /// fails the whole load.
    pub fn load_from_dir(config_dir: impl AsRef<Path>, defaults: &MonitorConfig) -> Result<Self> {
        let instances_dir = config_dir.as_ref().join("instances");
        info!(dir = %instances_dir.display(), "Loading instance registry");

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&instances_dir)
            .with_context(|| format!("Failed to read {}", instances_dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|e| e == "toml"))
            .collect();
        paths.sort();

        let mut registry = Self::new();
        for path in paths {
            let mut config = InstanceConfig::from_file(&path)
                .with_context(|| format!("Failed to load instance config {}", path.display()))?;
            config.expand_env_vars();
            let resolved = config.resolve(defaults)?;
            debug!(
                instance = %resolved.id,
                market = %resolved.market,
                file = %path.display(),
                "Loaded instance config"
            );
            registry.insert(resolved)?;
        }

        info!(instances = registry.len(), "Instance registry loaded");
        Ok(registry)
    }

    /// Add an instance. Ids must be unique.
    pub fn insert(&mut self, instance: ResolvedInstance) -> Result<()> {
        if self.by_id.contains_key(&instance.id) {
            anyhow::bail!("Duplicate instance id '{}'", instance.id);
        }
        self.by_id.insert(instance.id.clone(), self.instances.len());
        self.instances.push(instance);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ResolvedInstance> {
        self.by_id.get(id).map(|&i| &self.instances[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedInstance> {
        self.instances.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.instances.iter().map(|i| i.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl IntoIterator for InstanceRegistry {
    type Item = ResolvedInstance;
    type IntoIter = std::vec::IntoIter<ResolvedInstance>;

    fn into_iter(self) -> Self::IntoIter {
        self.instances.into_iter()
    }
}
