//! Skill registry and dispatch core.
//!
//! Skills are directories on disk declaring one or more tools
//! (`tool_def.json`) and naming the compiled-in implementation that runs
//! them (`skill.toml`). This crate discovers those directories, validates
//! untrusted tool arguments against the declared schemas, ranks tools
//! against a free-text query, and dispatches validated calls.
//!
//! ```no_run
//! # async fn demo(catalog: skillmt::SkillCatalog) {
//! use serde_json::json;
//!
//! let registry = skillmt::SkillRegistry::load("skills", catalog);
//! let tools = registry.retrieve("place a house", 3);
//! let args = json!({"building_type": "blacksmith", "location": [0, 0, 0]});
//! let result = registry
//!     .execute("spawn_medieval_building", args.as_object().unwrap())
//!     .await;
//! # }
//! ```

pub mod definition;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod retrieval;
pub mod schema;
pub mod skill;

pub use definition::{
    ParameterSchema, PropertySpec, PropertyType, SkillDefinition, parse_tool_defs,
    tool_def_schema,
};
pub use dispatch::{error_result, is_error};
pub use error::{RegistryError, SkillError, ValidationError};
pub use registry::{SkillEntry, SkillRegistry};
pub use retrieval::{IndexEntry, ScoredSkill};
pub use schema::validate_args;
pub use skill::{SkillCatalog, SkillConfig, SkillFactory, SkillPlugin};
