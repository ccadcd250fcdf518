use async_trait::async_trait;

use super::{Scene, TrackedSample};
use crate::common::ControlResult;

/// Port to the localization service. Adapters decide how snapshots are fetched.
#[async_trait]
pub trait LocalizationSource: Send + Sync {
    async fn snapshot(&self) -> ControlResult<Scene>;

    /// Single rigid body by name. Unknown names read as untracked.
    async fn rigid_body(&self, name: &str) -> ControlResult<TrackedSample>;
}
