use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::mode::Mode;
use super::records::*;
use crate::common::{ControlError, ControlResult, Deadline};
use crate::domains::localization::StateVector;
use crate::domains::logger::DynLogger;
use crate::domains::transport::StateChannel;

#[derive(Debug, Clone)]
pub struct ProtocolSettings {
    /// Sleep between two polls of the remote resource.
    pub poll_interval: Duration,
    /// Pause after clearing a stale request so the clear reaches the service first.
    pub clear_settle: Duration,
    pub ack_field: String,
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            clear_settle: Duration::from_millis(200),
            ack_field: DEFAULT_ACK_FIELD.to_string(),
        }
    }
}

/// One request burst against the per-robot resource; used to correlate log lines.
#[derive(Debug, Clone)]
pub struct ProtocolSession {
    pub id: Uuid,
    pub endpoint: String,
}

impl ProtocolSession {
    fn begin(endpoint: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            endpoint: endpoint.to_string(),
        }
    }
}

impl fmt::Display for ProtocolSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id.simple().to_string();
        write!(f, "session {} @ {}", &id[..8], self.endpoint)
    }
}

/// Client for the synthesis service's single-slot mailbox protocol.
///
/// The remote resource moves `idle -> collect_synth -> distribute_control` in
/// response to flags this client writes; every wait is bounded by a `Deadline`.
pub struct SynthesisProtocolClient {
    channel: Arc<dyn StateChannel>,
    settings: ProtocolSettings,
    logger: DynLogger,
}

impl SynthesisProtocolClient {
    pub fn new(channel: Arc<dyn StateChannel>, settings: ProtocolSettings, logger: DynLogger) -> Self {
        Self {
            channel,
            settings,
            logger,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.channel.endpoint()
    }

    pub async fn mode(&self) -> ControlResult<Mode> {
        let view = self.read_view().await?;
        Ok(view.require_mode()?.clone())
    }

    /// Requests a new controller and waits until the service distributes control.
    pub async fn synthesize_controller(
        &self,
        obstacles: &str,
        target: &str,
        is_last_request: bool,
        deadline: &Deadline,
    ) -> ControlResult<()> {
        let session = ProtocolSession::begin(self.endpoint());
        self.channel.submit(&to_payload(&ClearSynthRequest::default())?).await?;
        deadline.sleep(self.settings.clear_settle).await;

        let request = SynthRequest {
            target_set: target,
            obst_set: obstacles,
            is_last_synth_request: WireFlag(is_last_request),
            is_synth_requested: WireFlag(true),
        };
        self.logger.info(&format!(
            "{}: synthesis requested (target={}, obstacles={}, last={})",
            session, target, obstacles, is_last_request
        ));
        self.channel.submit(&to_payload(&request)?).await?;

        self.wait_for_mode(Mode::DistributeControl, &session, deadline).await?;
        self.logger.info(&format!("{}: synthesis complete", session));
        Ok(())
    }

    /// Fetches the action menu for `state` from an already synthesized controller.
    pub async fn get_controls(
        &self,
        state: &str,
        is_last_request: bool,
        deadline: &Deadline,
    ) -> ControlResult<String> {
        let session = ProtocolSession::begin(self.endpoint());
        self.wait_for_mode(Mode::DistributeControl, &session, deadline).await?;

        let request = ControlRequest {
            current_state: state,
            is_control_requested: WireFlag(true),
            is_last_control_request: WireFlag(is_last_request),
        };
        self.logger.info(&format!("{}: control requested for state {}", session, state));
        self.channel.submit(&to_payload(&request)?).await?;

        self.collect_actions(&session, deadline).await
    }

    /// Synthesis and control request in a single write; skips observing `distribute_control`.
    pub async fn synthesize_and_get_controls(
        &self,
        obstacles: &str,
        target: &str,
        state: &str,
        deadline: &Deadline,
    ) -> ControlResult<String> {
        let session = ProtocolSession::begin(self.endpoint());
        let request = CombinedRequest {
            synth: SynthRequest {
                target_set: target,
                obst_set: obstacles,
                is_last_synth_request: WireFlag(false),
                is_synth_requested: WireFlag(true),
            },
            control: ControlRequest {
                current_state: state,
                is_control_requested: WireFlag(true),
                is_last_control_request: WireFlag(true),
            },
        };
        self.logger.info(&format!(
            "{}: combined synthesis+control request for state {}",
            session, state
        ));
        self.channel.submit(&to_payload(&request)?).await?;

        self.collect_actions(&session, deadline).await
    }

    /// Final control request that lets the service close the current control session.
    pub async fn close_session(&self, deadline: &Deadline) -> ControlResult<()> {
        let origin = StateVector::ORIGIN.to_wire(true);
        self.get_controls(&origin, true, deadline).await.map(|_| ())
    }

    async fn read_view(&self) -> ControlResult<DictionaryView> {
        let value = self.channel.fetch_state_fresh().await?;
        DictionaryView::from_json(&value)
    }

    async fn wait_for_mode(
        &self,
        wanted: Mode,
        session: &ProtocolSession,
        deadline: &Deadline,
    ) -> ControlResult<()> {
        let mut last_seen: Option<Mode> = None;
        loop {
            let view = self.read_view().await?;
            let mode = view.require_mode()?;
            if *mode == wanted {
                return Ok(());
            }
            if last_seen.as_ref() != Some(mode) {
                if let Mode::Unknown(raw) = mode {
                    self.logger.warn(&format!("{}: unrecognised mode '{}'", session, raw));
                }
                self.logger.info(&format!("{}: mode is {}, waiting for {}", session, mode, wanted));
                last_seen = Some(mode.clone());
            }
            deadline.check(&format!("mode {}", wanted))?;
            deadline.sleep(self.settings.poll_interval).await;
        }
    }

    async fn collect_actions(
        &self,
        session: &ProtocolSession,
        deadline: &Deadline,
    ) -> ControlResult<String> {
        let mut ready_field_seen = false;
        loop {
            let view = self.read_view().await?;
            match view.control_ready {
                Some(true) => {
                    let actions = view.actions_list.ok_or_else(|| {
                        ControlError::violation("control ready but 'actions_list' is missing")
                    })?;
                    self.channel
                        .submit(&acknowledgement(&self.settings.ack_field))
                        .await?;
                    self.logger.info(&format!("{}: received actions '{}'", session, actions));
                    return Ok(actions);
                }
                Some(false) => ready_field_seen = true,
                None => {}
            }
            if deadline.expired() {
                if !ready_field_seen {
                    return Err(ControlError::OutOfDomain {
                        reason: "the service never reported control readiness; \
                                 re-orient the robot towards a heading near 0"
                            .to_string(),
                    });
                }
                deadline.check("is_control_ready")?;
            }
            deadline.sleep(self.settings.poll_interval).await;
        }
    }
}
