use async_trait::async_trait;
use std::sync::Arc;

use crate::common::ControlResult;
use crate::domains::localization::{LocalizationSource, Scene, TrackedSample};
use crate::domains::transport::StateChannel;

/// Localization service reached over REST: `GET <base>` for the whole scene,
/// `GET <base>?RigidBody=<name>` for one object.
pub struct RestLocalizationSource {
    channel: Arc<dyn StateChannel>,
}

impl RestLocalizationSource {
    pub fn new(channel: Arc<dyn StateChannel>) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl LocalizationSource for RestLocalizationSource {
    async fn snapshot(&self) -> ControlResult<Scene> {
        let value = self.channel.fetch_state().await?;
        Scene::from_json(&value)
    }

    async fn rigid_body(&self, name: &str) -> ControlResult<TrackedSample> {
        let value = self
            .channel
            .fetch_query(&rigid_body_query(name))
            .await?;
        let scene = Scene::from_json(&value)?;
        Ok(scene.get(name).cloned().unwrap_or(TrackedSample::Untracked))
    }
}

/// `?RigidBody=<name>` with the name form-encoded.
fn rigid_body_query(name: &str) -> String {
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("RigidBody", name)
        .finish();
    format!("?{}", encoded)
}
