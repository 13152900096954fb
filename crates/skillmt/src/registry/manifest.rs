use serde::Deserialize;

/// Contents of a skill directory's `skill.toml`.
///
/// ```toml
/// implementations = ["MedievalBuilderSkill"]
/// ```
///
/// Candidates are tried in order for every tool the directory declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImplementationManifest {
    #[serde(default)]
    pub implementations: Vec<String>,
}

impl ImplementationManifest {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
