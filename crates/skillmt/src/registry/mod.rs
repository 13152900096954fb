//! Discovery of skill directories and binding of their tools to compiled-in
//! implementations.
//!
//! Layout of a skill directory:
//!
//! ```text
//! skills/
//!   medieval_builder/
//!     README.md       prompt text (optional)
//!     tool_def.json   one tool, or {"tools": [...]}
//!     skill.toml      implementations = ["MedievalBuilderSkill"]
//!     config.json     private configuration (optional)
//! ```
//!
//! Loading never fails as a whole: directories or tools that cannot be
//! loaded are logged and skipped.
//!
//! Implementations are only ever taken from the [`SkillCatalog`], but
//! configuration is read from disk: point the registry at directories you
//! control.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::instrument;

use crate::definition::SkillDefinition;
use crate::error::{RegistryError, ValidationError};
use crate::retrieval::IndexEntry;
use crate::schema::validate_args;
use crate::skill::{SkillCatalog, SkillPlugin};

pub mod discovery;
pub mod manifest;

pub use discovery::{SkillDir, read_skill_dir, skill_dirs};
pub use manifest::ImplementationManifest;

/// A bound tool: its definition and the plugin instance that runs it.
#[derive(Clone)]
pub struct SkillEntry {
    pub definition: SkillDefinition,
    pub plugin: Arc<dyn SkillPlugin>,
    /// Name of the factory that produced `plugin`.
    pub implementation: String,
    /// Directory the definition came from, if loaded from disk.
    pub source: Option<PathBuf>,
}

impl std::fmt::Debug for SkillEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillEntry")
            .field("definition", &self.definition)
            .field("implementation", &self.implementation)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct SkillRegistry {
    root: Option<PathBuf>,
    catalog: SkillCatalog,
    entries: IndexMap<String, SkillEntry>,
    index: Vec<IndexEntry>,
    prompts: Vec<String>,
}

impl SkillRegistry {
    /// An empty registry with no backing directory.
    pub fn new(catalog: SkillCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Discover and bind every skill under `root`.
    pub fn load<P: AsRef<Path>>(root: P, catalog: SkillCatalog) -> Self {
        let mut registry = Self {
            root: Some(root.as_ref().to_path_buf()),
            catalog,
            ..Self::default()
        };
        registry.scan();
        registry
    }

    /// Rebuild from the same root and catalog. Existing plugin instances are
    /// dropped and constructed afresh.
    pub fn reload(&mut self) {
        self.entries.clear();
        self.prompts.clear();
        self.index.clear();
        self.scan();
    }

    #[instrument(name = "skill_registry.scan", skip_all)]
    fn scan(&mut self) {
        let Some(root) = self.root.clone() else {
            return;
        };
        if !root.is_dir() {
            log::warn!("Skills directory does not exist: {}", root.display());
            return;
        }

        log::debug!("Scanning skills under {}", root.display());
        for path in skill_dirs(&root) {
            match read_skill_dir(&path) {
                Ok(Some(dir)) => self.bind_dir(dir),
                Ok(None) => log::debug!(
                    "Skipping {}: needs both {} and {}",
                    path.display(),
                    discovery::DEFINITION_FILENAME,
                    discovery::IMPLEMENTATION_FILENAME
                ),
                Err(e) => log::warn!("Skipping skill directory: {}", e),
            }
        }
        self.rebuild_index();
        log::info!("Loaded {} skill(s) from {}", self.entries.len(), root.display());
    }

    fn bind_dir(&mut self, dir: SkillDir) {
        let config_path = dir.config_path();
        let mut bound = 0;

        for definition in &dir.definitions {
            match self.bind_tool(&dir, definition, &config_path) {
                Ok(()) => bound += 1,
                Err(e) => log::warn!("{}", e),
            }
        }

        if bound > 0 {
            if let Some(readme) = &dir.readme {
                self.prompts
                    .push(format!("--- Skill: {} ---\n{}\n", dir.name, readme));
            }
            self.prompts.push(format!(
                "--- ToolDef: {} ---\n{}\n",
                dir.name, dir.definition_text
            ));
        }
    }

    fn bind_tool(
        &mut self,
        dir: &SkillDir,
        definition: &SkillDefinition,
        config_path: &Path,
    ) -> Result<(), RegistryError> {
        for candidate in &dir.manifest.implementations {
            let Some(factory) = self.catalog.get(candidate) else {
                log::warn!(
                    "Implementation '{}' named in {} is not compiled in",
                    candidate,
                    dir.path.display()
                );
                continue;
            };
            if !factory.provides(&definition.name) {
                log::debug!(
                    "Implementation '{}' does not expose tool '{}'",
                    candidate,
                    definition.name
                );
                continue;
            }
            match factory.create(Some(config_path)) {
                Ok(plugin) => {
                    self.insert(SkillEntry {
                        definition: definition.clone(),
                        plugin,
                        implementation: candidate.clone(),
                        source: Some(dir.path.clone()),
                    });
                    log::info!("Loaded skill: {} ({})", definition.name, candidate);
                    return Ok(());
                }
                Err(e) => log::warn!(
                    "Failed to construct '{}' for tool '{}': {}",
                    candidate,
                    definition.name,
                    e
                ),
            }
        }

        Err(RegistryError::NoImplementation {
            tool: definition.name.clone(),
            path: dir.path.clone(),
        })
    }

    /// Insert or overwrite by name. An overwritten tool keeps its position.
    fn insert(&mut self, entry: SkillEntry) {
        let name = entry.definition.name.clone();
        if let Some(previous) = self.entries.insert(name.clone(), entry) {
            log::warn!(
                "Tool '{}' from {:?} overwritten by a later registration",
                name,
                previous.source
            );
        }
    }

    /// Register a tool programmatically. Same overwrite rule as discovery.
    pub fn register(
        &mut self,
        definition: SkillDefinition,
        plugin: Arc<dyn SkillPlugin>,
        implementation: impl Into<String>,
    ) {
        self.insert(SkillEntry {
            definition,
            plugin,
            implementation: implementation.into(),
            source: None,
        });
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .entries
            .values()
            .map(|e| IndexEntry::new(&e.definition))
            .collect();
    }

    /// Check `args` against the tool's schema. Tools without a registered
    /// schema pass.
    pub fn validate(&self, tool: &str, args: &Map<String, Value>) -> Result<(), ValidationError> {
        match self.definition(tool).and_then(|d| d.parameters.as_ref()) {
            Some(schema) => validate_args(schema, args),
            None => Ok(()),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SkillEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn definition(&self, name: &str) -> Option<&SkillDefinition> {
        self.entries.get(name).map(|e| &e.definition)
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &SkillDefinition> {
        self.entries.values().map(|e| &e.definition)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    /// Prompt fragments (README and raw tool definitions) in directory order.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn index(&self) -> &[IndexEntry] {
        &self.index
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn catalog(&self) -> &SkillCatalog {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
