//! Spawn bridge speaking Unreal Editor's Remote Control HTTP API
//! (`PUT /remote/object/call`).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use url::Url;

use crate::bridge::{SpawnBridge, SpawnOutcome, SpawnRequest};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:30010";

const ASSET_LIBRARY: &str = "/Script/EditorScriptingUtilities.Default__EditorAssetLibrary";
const LEVEL_LIBRARY: &str = "/Script/EditorScriptingUtilities.Default__EditorLevelLibrary";

pub struct RemoteControlBridge {
    client: reqwest::Client,
    call_url: Url,
}

impl RemoteControlBridge {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let call_url = base_url
            .join("remote/object/call")
            .unwrap_or_else(|_| base_url.clone());
        Ok(Self { client, call_url })
    }

    async fn call(&self, body: &Value) -> Result<Value, reqwest::Error> {
        self.client
            .put(self.call_url.clone())
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
    }

    async fn try_spawn(&self, request: &SpawnRequest) -> Result<SpawnOutcome, reqwest::Error> {
        let exists = self.call(&asset_exists_call(&request.asset_path)).await?;
        if return_value(&exists).and_then(Value::as_bool) != Some(true) {
            return Ok(SpawnOutcome::Error {
                code: Some("ASSET_MISSING".into()),
                msg: format!(
                    "asset not found in project: {}. check the skill's config.json",
                    request.asset_path
                ),
            });
        }

        let spawned = self.call(&spawn_call(request)).await?;
        let Some(actor_path) = return_value(&spawned)
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
        else {
            return Ok(SpawnOutcome::error("failed to spawn actor"));
        };

        let label = match &request.label {
            Some(label) => {
                self.call(&set_label_call(actor_path, label)).await?;
                label.clone()
            }
            None => actor_path.rsplit('.').next().unwrap_or(actor_path).to_string(),
        };

        Ok(SpawnOutcome::Success {
            actor_label: label,
            location: request.location,
        })
    }
}

#[async_trait]
impl SpawnBridge for RemoteControlBridge {
    async fn spawn_actor(&self, request: &SpawnRequest) -> SpawnOutcome {
        match self.try_spawn(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Remote control call to {} failed: {}", self.call_url, e);
                SpawnOutcome::error(e.to_string())
            }
        }
    }
}

fn object_call(object_path: &str, function: &str, parameters: Value) -> Value {
    json!({
        "objectPath": object_path,
        "functionName": function,
        "parameters": parameters,
        "generateTransaction": true,
    })
}

fn asset_exists_call(asset_path: &str) -> Value {
    object_call(ASSET_LIBRARY, "DoesAssetExist", json!({"AssetPath": asset_path}))
}

fn spawn_call(request: &SpawnRequest) -> Value {
    let [x, y, z] = request.location;
    let [pitch, yaw, roll] = request.rotation;
    object_call(
        LEVEL_LIBRARY,
        "SpawnActorFromObject",
        json!({
            "ObjectToUse": request.asset_path,
            "Location": {"X": x, "Y": y, "Z": z},
            "Rotation": {"Pitch": pitch, "Yaw": yaw, "Roll": roll},
        }),
    )
}

fn set_label_call(actor_path: &str, label: &str) -> Value {
    object_call(actor_path, "SetActorLabel", json!({"NewActorLabel": label}))
}

fn return_value(response: &Value) -> Option<&Value> {
    response.get("ReturnValue")
}
