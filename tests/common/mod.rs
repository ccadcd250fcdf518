#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use symctl::application::{ControlCycleOrchestrator, CycleSettings};
use symctl::common::{ControlError, ControlResult, TransportError};
use symctl::config::ProtocolVariant;
use symctl::domains::actuation::{Actuator, ControlAction};
use symctl::domains::geometry::{Covering, ThetaCalibration};
use symctl::domains::localization::{LocalizationSource, Scene, TrackedSample};
use symctl::domains::logger::{DomainLogger, DynLogger};
use symctl::domains::selection::{ActionSelector, SelectionPolicy};
use symctl::domains::synthesis::{ProtocolSettings, SynthesisProtocolClient};
use symctl::domains::transport::{JsonEndpoint, StateChannel};

pub struct CaptureLogger {
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl CaptureLogger {
    pub fn new() -> Self {
        Self { messages: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.lock().unwrap().iter().any(|m| m.contains(needle))
    }
}

impl DomainLogger for CaptureLogger {
    fn info(&self, msg: &str) { self.messages.lock().unwrap().push(format!("INFO:{}", msg)); }
    fn warn(&self, msg: &str) { self.messages.lock().unwrap().push(format!("WARN:{}", msg)); }
    fn error(&self, msg: &str) { self.messages.lock().unwrap().push(format!("ERR:{}", msg)); }
}

pub fn quiet_logger() -> DynLogger {
    symctl::adapters::outbound::init_noop_logger()
}

pub fn fast_protocol() -> ProtocolSettings {
    ProtocolSettings {
        poll_interval: Duration::from_millis(1),
        clear_settle: Duration::from_millis(1),
        ..ProtocolSettings::default()
    }
}

/// How the fake service answers a control request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Readiness {
    /// `is_control_ready` turns true with the configured menu.
    Ready,
    /// `is_control_ready` is written but stays false.
    StaysFalse,
    /// `is_control_ready` never appears.
    Absent,
}

struct DictionaryState {
    fields: BTreeMap<String, String>,
    synth_polls_left: u32,
    writes: Vec<Value>,
    modes_seen: Vec<String>,
}

/// In-memory stand-in for the per-robot synthesis dictionary.
/// Moves idle -> collect_synth -> distribute_control after a few polls once a
/// synthesis request is written, and publishes `menu` when control is requested.
pub struct ScriptedDictionary {
    state: Mutex<DictionaryState>,
    menu: String,
    readiness: Readiness,
    synth_polls: u32,
    ack_field: String,
    pub reads: AtomicU32,
}

impl ScriptedDictionary {
    pub fn new(menu: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("mode".to_string(), "idle".to_string());
        Self {
            state: Mutex::new(DictionaryState {
                fields,
                synth_polls_left: 0,
                writes: Vec::new(),
                modes_seen: vec!["idle".to_string()],
            }),
            menu: menu.to_string(),
            readiness: Readiness::Ready,
            synth_polls: 2,
            ack_field: "is_control_received".to_string(),
            reads: AtomicU32::new(0),
        }
    }

    pub fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn with_synth_polls(mut self, polls: u32) -> Self {
        self.synth_polls = polls;
        self
    }

    pub fn starting_in(self, mode: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.fields.insert("mode".to_string(), mode.to_string());
            state.modes_seen = vec![mode.to_string()];
        }
        self
    }

    pub fn without_mode(self) -> Self {
        self.state.lock().unwrap().fields.remove("mode");
        self
    }

    pub fn writes(&self) -> Vec<Value> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn modes_seen(&self) -> Vec<String> {
        self.state.lock().unwrap().modes_seen.clone()
    }

    pub fn field(&self, name: &str) -> Option<String> {
        self.state.lock().unwrap().fields.get(name).cloned()
    }

    fn set_mode(state: &mut DictionaryState, mode: &str) {
        if state.fields.get("mode").map(String::as_str) != Some(mode) {
            state.modes_seen.push(mode.to_string());
        }
        state.fields.insert("mode".to_string(), mode.to_string());
    }

    fn advance(&self, state: &mut DictionaryState) {
        if state.fields.get("mode").map(String::as_str) == Some("collect_synth") {
            if state.synth_polls_left == 0 {
                Self::set_mode(state, "distribute_control");
            } else {
                state.synth_polls_left -= 1;
            }
        }
        let distributing = state.fields.get("mode").map(String::as_str) == Some("distribute_control");
        let requested = state.fields.get("is_control_requested").map(String::as_str) == Some("true");
        if distributing && requested {
            match self.readiness {
                Readiness::Ready => {
                    state.fields.insert("is_control_ready".to_string(), "true".to_string());
                    state.fields.insert("actions_list".to_string(), self.menu.clone());
                }
                Readiness::StaysFalse => {
                    state.fields.insert("is_control_ready".to_string(), "false".to_string());
                }
                Readiness::Absent => {}
            }
        }
    }

    fn snapshot(state: &DictionaryState) -> Value {
        let map: Map<String, Value> = state
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }
}

#[async_trait]
impl StateChannel for ScriptedDictionary {
    async fn fetch_state(&self) -> ControlResult<Value> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        self.advance(&mut state);
        Ok(Self::snapshot(&state))
    }

    async fn fetch_state_fresh(&self) -> ControlResult<Value> {
        self.fetch_state().await
    }

    async fn fetch_query(&self, _query: &str) -> ControlResult<Value> {
        self.fetch_state().await
    }

    async fn submit(&self, payload: &Value) -> ControlResult<()> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(payload.clone());
        if let Some(map) = payload.as_object() {
            for (k, v) in map {
                if let Some(s) = v.as_str() {
                    state.fields.insert(k.clone(), s.to_string());
                }
            }
        }
        let acked = state.fields.get(&self.ack_field).map(String::as_str) == Some("true");
        if acked {
            state.fields.insert("is_control_requested".to_string(), "false".to_string());
            state.fields.insert("is_control_ready".to_string(), "false".to_string());
            state.fields.remove(&self.ack_field);
        } else if payload.get("is_synth_requested").and_then(Value::as_str) == Some("true") {
            Self::set_mode(&mut state, "collect_synth");
            state.synth_polls_left = self.synth_polls;
        } else if payload.get("is_synth_requested").and_then(Value::as_str) == Some("false")
            && payload.get("is_control_requested").is_none()
        {
            Self::set_mode(&mut state, "idle");
        }
        Ok(())
    }

    fn endpoint(&self) -> &str {
        "memory://pfaces/DeepRacer1"
    }
}

/// Raw endpoint that fails a scripted number of times before answering.
pub struct FlakyEndpoint {
    failures_left: Mutex<u32>,
    error: TransportError,
    value: Mutex<Value>,
    pub calls: AtomicU32,
    pub writes: Mutex<Vec<Value>>,
    pub queries: Mutex<Vec<String>>,
}

impl FlakyEndpoint {
    pub fn new(failures: u32, error: TransportError, value: Value) -> Self {
        Self {
            failures_left: Mutex::new(failures),
            error,
            value: Mutex::new(value),
            calls: AtomicU32::new(0),
            writes: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_next(&self, failures: u32) {
        *self.failures_left.lock().unwrap() = failures;
    }

    pub fn set_value(&self, value: Value) {
        *self.value.lock().unwrap() = value;
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn attempt(&self) -> Result<(), TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut left = self.failures_left.lock().unwrap();
        if *left > 0 {
            *left -= 1;
            return Err(self.error.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl JsonEndpoint for FlakyEndpoint {
    async fn get_json(&self, query: &str, _timeout: Duration) -> Result<Value, TransportError> {
        self.queries.lock().unwrap().push(query.to_string());
        self.attempt()?;
        Ok(self.value.lock().unwrap().clone())
    }

    async fn write_json(&self, body: &Value, _timeout: Duration) -> Result<(), TransportError> {
        self.attempt()?;
        self.writes.lock().unwrap().push(body.clone());
        Ok(())
    }

    fn base_url(&self) -> &str {
        "http://flaky.test/resource"
    }
}

/// Endpoint that never answers within any reasonable timeout.
pub struct HangingEndpoint;

#[async_trait]
impl JsonEndpoint for HangingEndpoint {
    async fn get_json(&self, _query: &str, _timeout: Duration) -> Result<Value, TransportError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Value::Null)
    }

    async fn write_json(&self, _body: &Value, _timeout: Duration) -> Result<(), TransportError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    fn base_url(&self) -> &str {
        "http://hanging.test/resource"
    }
}

pub struct RecordingActuator {
    pub emitted: Mutex<Vec<ControlAction>>,
    fail_drive: AtomicBool,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self { emitted: Mutex::new(Vec::new()), fail_drive: AtomicBool::new(false) }
    }

    pub fn failing_drive() -> Self {
        Self { emitted: Mutex::new(Vec::new()), fail_drive: AtomicBool::new(true) }
    }

    pub fn emitted(&self) -> Vec<ControlAction> {
        self.emitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Actuator for RecordingActuator {
    async fn emit(&self, action: &ControlAction) -> ControlResult<()> {
        if !action.is_stop() && self.fail_drive.load(Ordering::SeqCst) {
            return Err(ControlError::Transport {
                attempts: 1,
                cause: TransportError::Connection("actuator offline".to_string()),
            });
        }
        self.emitted.lock().unwrap().push(*action);
        Ok(())
    }
}

/// Localization source serving a fixed scene, or failing when told to.
pub struct FakeLocalization {
    scene: Mutex<Scene>,
    failing: AtomicBool,
    pub snapshots: AtomicU32,
}

impl FakeLocalization {
    pub fn new(scene: Scene) -> Self {
        Self { scene: Mutex::new(scene), failing: AtomicBool::new(false), snapshots: AtomicU32::new(0) }
    }

    pub fn set_scene(&self, scene: Scene) {
        *self.scene.lock().unwrap() = scene;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl LocalizationSource for FakeLocalization {
    async fn snapshot(&self) -> ControlResult<Scene> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ControlError::Transport {
                attempts: 3,
                cause: TransportError::Connection("connection refused".to_string()),
            });
        }
        Ok(self.scene.lock().unwrap().clone())
    }

    async fn rigid_body(&self, name: &str) -> ControlResult<TrackedSample> {
        let scene = self.snapshot().await?;
        Ok(scene.get(name).cloned().unwrap_or(TrackedSample::Untracked))
    }
}

pub fn scene(objects: &[(&str, &str)]) -> Scene {
    let mut scene = Scene::default();
    for (name, raw) in objects {
        scene.insert(*name, raw);
    }
    scene
}

pub fn cycle_settings() -> CycleSettings {
    CycleSettings {
        robot: "DeepRacer1".to_string(),
        covering: Covering::Single,
        protocol: ProtocolVariant::Combined,
        parenthesize_state: true,
        cycle_deadline: Duration::from_secs(2),
        stop_after_last_target: false,
    }
}

/// Orchestrator wired to in-memory fakes, with handles kept for inspection.
pub struct Rig {
    pub localization: Arc<FakeLocalization>,
    pub dictionary: Arc<ScriptedDictionary>,
    pub actuator: Arc<RecordingActuator>,
    pub orchestrator: ControlCycleOrchestrator,
}

pub fn rig(scene: Scene, dictionary: ScriptedDictionary, settings: CycleSettings) -> Rig {
    rig_with(scene, dictionary, RecordingActuator::new(), settings, quiet_logger())
}

pub fn rig_with(
    scene: Scene,
    dictionary: ScriptedDictionary,
    actuator: RecordingActuator,
    settings: CycleSettings,
    logger: DynLogger,
) -> Rig {
    let localization = Arc::new(FakeLocalization::new(scene));
    let dictionary = Arc::new(dictionary);
    let actuator = Arc::new(actuator);
    let orchestrator = ControlCycleOrchestrator::new(
        localization.clone(),
        SynthesisProtocolClient::new(dictionary.clone(), fast_protocol(), logger.clone()),
        ActionSelector::new(SelectionPolicy::FirstContinuityMatch, logger.clone()),
        ThetaCalibration::default(),
        actuator.clone(),
        settings,
        logger,
    );
    Rig { localization, dictionary, actuator, orchestrator }
}
