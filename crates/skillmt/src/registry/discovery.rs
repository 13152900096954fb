use std::path::{Path, PathBuf};

use crate::definition::{SkillDefinition, parse_tool_defs};
use crate::error::RegistryError;
use crate::registry::manifest::ImplementationManifest;

pub const PROMPT_FILENAME: &str = "README.md";
pub const DEFINITION_FILENAME: &str = "tool_def.json";
pub const IMPLEMENTATION_FILENAME: &str = "skill.toml";
pub const CONFIG_FILENAME: &str = "config.json";

/// Everything read from one skill directory, before implementations are bound.
#[derive(Debug, Clone)]
pub struct SkillDir {
    pub name: String,
    pub path: PathBuf,
    pub readme: Option<String>,
    pub definition_text: String,
    pub definitions: Vec<SkillDefinition>,
    pub manifest: ImplementationManifest,
}

impl SkillDir {
    pub fn config_path(&self) -> PathBuf {
        self.path.join(CONFIG_FILENAME)
    }
}

/// Immediate subdirectories of `root`, sorted by file name. Symlinks to
/// directories count as directories.
pub fn skill_dirs(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }

    let mut dirs = Vec::new();
    for entry in ignore::WalkBuilder::new(root)
        .max_depth(Some(1))
        .standard_filters(false)
        .follow_links(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build()
    {
        match entry {
            Ok(entry) => {
                if entry.depth() == 1 && entry.file_type().is_some_and(|t| t.is_dir()) {
                    dirs.push(entry.into_path());
                }
            }
            Err(e) => log::warn!("Failed to list {}: {}", root.display(), e),
        }
    }
    dirs
}

/// Read the artifacts of a candidate skill directory.
///
/// Returns `Ok(None)` when the definition or implementation artifact is
/// absent; the directory simply isn't a skill.
pub fn read_skill_dir(path: &Path) -> Result<Option<SkillDir>, RegistryError> {
    let def_path = path.join(DEFINITION_FILENAME);
    let impl_path = path.join(IMPLEMENTATION_FILENAME);
    if !def_path.is_file() || !impl_path.is_file() {
        return Ok(None);
    }

    let definition_text = read(&def_path)?;
    let definitions = parse_tool_defs(&definition_text).map_err(|source| {
        RegistryError::Definition {
            path: def_path.clone(),
            source,
        }
    })?;

    let manifest = ImplementationManifest::parse(&read(&impl_path)?).map_err(|source| {
        RegistryError::Manifest {
            path: impl_path.clone(),
            source,
        }
    })?;

    let readme_path = path.join(PROMPT_FILENAME);
    let readme = if readme_path.is_file() {
        Some(read(&readme_path)?)
    } else {
        None
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Some(SkillDir {
        name,
        path: path.to_path_buf(),
        readme,
        definition_text,
        definitions,
        manifest,
    }))
}

fn read(path: &Path) -> Result<String, RegistryError> {
    std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_skill(root: &Path, name: &str, with_def: bool, with_impl: bool) {
        let dir = root.join(name);
        fs::create_dir(&dir).unwrap();
        if with_def {
            fs::write(
                dir.join(DEFINITION_FILENAME),
                format!(r#"{{"name": "{name}", "description": "tool {name}"}}"#),
            )
            .unwrap();
        }
        if with_impl {
            fs::write(dir.join(IMPLEMENTATION_FILENAME), r#"implementations = ["X"]"#).unwrap();
        }
    }

    #[test]
    fn test_skill_dirs_sorted_and_dirs_only() {
        let root = TempDir::new().unwrap();
        write_skill(root.path(), "zeta", true, true);
        write_skill(root.path(), "alpha", true, true);
        fs::write(root.path().join("notes.txt"), "not a skill").unwrap();

        let dirs = skill_dirs(root.path());
        let names: Vec<_> = dirs
            .iter()
            .map(|d| d.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_skill_dirs_follows_symlinked_dirs() {
        let store = TempDir::new().unwrap();
        write_skill(store.path(), "linked", true, true);
        let root = TempDir::new().unwrap();
        write_skill(root.path(), "local", true, true);
        std::os::unix::fs::symlink(store.path().join("linked"), root.path().join("linked"))
            .unwrap();

        let dirs = skill_dirs(root.path());
        assert_eq!(
            dirs,
            vec![root.path().join("linked"), root.path().join("local")]
        );
        assert!(read_skill_dir(&dirs[0]).unwrap().is_some());
    }

    #[test]
    fn test_skill_dirs_nonexistent_root() {
        assert!(skill_dirs(Path::new("/nonexistent/skills/root")).is_empty());
    }

    #[test]
    fn test_missing_artifacts_are_not_skills() {
        let root = TempDir::new().unwrap();
        write_skill(root.path(), "no-def", false, true);
        write_skill(root.path(), "no-impl", true, false);

        assert!(read_skill_dir(&root.path().join("no-def")).unwrap().is_none());
        assert!(read_skill_dir(&root.path().join("no-impl")).unwrap().is_none());
    }

    #[test]
    fn test_read_complete_dir() {
        let root = TempDir::new().unwrap();
        write_skill(root.path(), "builder", true, true);
        fs::write(root.path().join("builder").join(PROMPT_FILENAME), "# Builder").unwrap();

        let dir = read_skill_dir(&root.path().join("builder")).unwrap().unwrap();
        assert_eq!(dir.name, "builder");
        assert_eq!(dir.readme.as_deref(), Some("# Builder"));
        assert_eq!(dir.definitions.len(), 1);
        assert_eq!(dir.manifest.implementations, vec!["X"]);
        assert!(dir.config_path().ends_with("builder/config.json"));
    }

    #[test]
    fn test_malformed_definition_is_error() {
        let root = TempDir::new().unwrap();
        write_skill(root.path(), "broken", false, true);
        fs::write(root.path().join("broken").join(DEFINITION_FILENAME), "{").unwrap();

        let err = read_skill_dir(&root.path().join("broken")).unwrap_err();
        assert!(matches!(err, RegistryError::Definition { .. }));
    }
}
