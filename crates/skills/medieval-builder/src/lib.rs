//! `spawn_medieval_building`: places a catalogued building asset in the
//! editor through a [`SpawnBridge`].
//!
//! The skill's `config.json` maps building types to assets, either at the top
//! level or under `"catalog"`:
//!
//! ```json
//! {"catalog": {"blacksmith": {"asset_path": "/Game/Medieval/SM_Blacksmith", "offset_z": 10}}}
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use skillmt::{SkillConfig, SkillError, SkillFactory, SkillPlugin};

pub mod bridge;
pub mod remote_control;

pub use bridge::{MockBridge, SpawnBridge, SpawnOutcome, SpawnRequest};
pub use remote_control::RemoteControlBridge;

pub const IMPLEMENTATION_NAME: &str = "MedievalBuilderSkill";
pub const SPAWN_TOOL: &str = "spawn_medieval_building";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BuildingAsset {
    pub asset_path: String,
    #[serde(default)]
    pub offset_z: f64,
}

/// Building type → asset lookup table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildingCatalog(BTreeMap<String, BuildingAsset>);

impl BuildingCatalog {
    pub fn from_config(config: &SkillConfig) -> Result<Self, SkillError> {
        let table = match config.get("catalog") {
            Some(Value::Object(catalog)) => catalog.clone(),
            _ => config.0.clone(),
        };
        let entries: BTreeMap<String, BuildingAsset> =
            serde_json::from_value(Value::Object(table))
                .map_err(|e| SkillError::Config(format!("invalid building catalog: {}", e)))?;
        Ok(Self(entries))
    }

    pub fn get(&self, building_type: &str) -> Option<&BuildingAsset> {
        self.0.get(building_type)
    }

    pub fn types(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

#[derive(Debug, Deserialize)]
struct SpawnArgs {
    building_type: String,
    location: [f64; 3],
    #[serde(default)]
    rotation_yaw: Option<f64>,
}

pub struct MedievalBuilder {
    catalog: BuildingCatalog,
    bridge: Arc<dyn SpawnBridge>,
}

impl MedievalBuilder {
    pub fn new(catalog: BuildingCatalog, bridge: Arc<dyn SpawnBridge>) -> Self {
        Self { catalog, bridge }
    }

    async fn spawn(&self, args: &Map<String, Value>) -> Result<Value, SkillError> {
        let args: SpawnArgs = serde_json::from_value(Value::Object(args.clone()))
            .map_err(|e| SkillError::InvalidArgs(e.to_string()))?;

        let Some(asset) = self.catalog.get(&args.building_type) else {
            return Ok(json!({
                "status": "error",
                "msg": format!(
                    "unknown building type '{}'. available types: {:?}",
                    args.building_type,
                    self.catalog.types()
                ),
            }));
        };

        let [x, y, z] = args.location;
        let request = SpawnRequest {
            asset_path: asset.asset_path.clone(),
            location: [x, y, z + asset.offset_z],
            rotation: [0.0, args.rotation_yaw.unwrap_or(0.0), 0.0],
            label: Some(format!("Medieval_{}", args.building_type)),
        };
        let outcome = self.bridge.spawn_actor(&request).await;
        Ok(serde_json::to_value(outcome)?)
    }
}

#[async_trait]
impl SkillPlugin for MedievalBuilder {
    async fn execute(&self, tool: &str, args: &Map<String, Value>) -> Result<Value, SkillError> {
        match tool {
            SPAWN_TOOL => self.spawn(args).await,
            other => Err(SkillError::UnsupportedOperation(other.to_string())),
        }
    }
}

/// Factory registered in the catalog as `MedievalBuilderSkill`.
pub struct MedievalBuilderFactory {
    bridge: Arc<dyn SpawnBridge>,
}

impl MedievalBuilderFactory {
    pub fn new(bridge: Arc<dyn SpawnBridge>) -> Self {
        Self { bridge }
    }
}

impl Default for MedievalBuilderFactory {
    fn default() -> Self {
        Self::new(Arc::new(MockBridge))
    }
}

impl SkillFactory for MedievalBuilderFactory {
    fn name(&self) -> &str {
        IMPLEMENTATION_NAME
    }

    fn operations(&self) -> &[&str] {
        &[SPAWN_TOOL]
    }

    fn create(&self, config_path: Option<&Path>) -> Result<Arc<dyn SkillPlugin>, SkillError> {
        let config = SkillConfig::load(config_path)?;
        let catalog = BuildingCatalog::from_config(&config)?;
        if catalog.types().is_empty() {
            log::warn!("{} has an empty building catalog", IMPLEMENTATION_NAME);
        }
        Ok(Arc::new(MedievalBuilder::new(catalog, self.bridge.clone())))
    }
}
