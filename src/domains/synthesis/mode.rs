use std::fmt;

/// Phase of the remote per-robot resource. The client can only request transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Idle,
    CollectSynth,
    DistributeControl,
    Unknown(String),
}

impl Mode {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "idle" => Mode::Idle,
            "collect_synth" => Mode::CollectSynth,
            "distribute_control" => Mode::DistributeControl,
            other => Mode::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Mode::Idle => "idle",
            Mode::CollectSynth => "collect_synth",
            Mode::DistributeControl => "distribute_control",
            Mode::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
