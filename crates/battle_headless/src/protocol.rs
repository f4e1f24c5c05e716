//! JSON protocol for headless battle control.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Battle state updates and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0",...}`
//! 2. Controller sends commands as JSON lines
//! 3. Runner answers every command with one or more responses
//! 4. When the match ends, a `finished` response follows the step that ended it
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","frame":0,"population":300}
//! -> {"cmd":"step","count":60}
//! <- {"type":"ack","cmd":"step"}
//! -> {"cmd":"frame","elapsed_ms":16.0}
//! <- {"type":"ack","cmd":"frame"}
//! -> {"cmd":"scoreboard"}
//! <- {"type":"scoreboard","frame":61,"entries":[{"id":4,"kills":3,"alive":true},...]}
//! -> {"cmd":"step","count":100000}
//! <- {"type":"finished","frame":2210,"outcome":{"result":"winner",...},...}
//! -> {"cmd":"reset","population":50}
//! <- {"type":"ack","cmd":"reset"}
//! ```

use battle_core::components::{Agent, AgentId, AgentKind, Shape, WeaponKind};
use battle_core::progression::{Outcome, ScoreEntry};
use battle_core::simulation::RunState;
use serde::{Deserialize, Serialize};

/// Protocol version reported in the `ready` response.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (Controller -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance the simulation `count` times by `dt` frame units each.
    Step {
        #[serde(default = "default_step_count")]
        count: u32,
        #[serde(default = "default_step_dt")]
        dt: f32,
    },

    /// Advance by a wall-clock delta, converted through the frame clock.
    Frame { elapsed_ms: f32 },

    /// Report a display-refresh timestamp. Steps by the time since the
    /// previous tick; the first tick after start, reset or resume only
    /// sets the reference.
    Tick { now_ms: f64 },

    /// Rebuild the population. Omitting `population` keeps the current size.
    Reset {
        #[serde(default)]
        population: Option<u32>,
    },

    /// Stop advancing until resumed.
    Pause,

    /// Resume after a pause, optionally measuring from `now_ms`.
    Resume {
        #[serde(default)]
        now_ms: Option<f64>,
    },

    /// Set the wall-clock speed multiplier.
    Speed { multiplier: f32 },

    /// Query current battle state without advancing time.
    Query,

    /// Query the kill ranking.
    Scoreboard,

    /// Report the current state hash (for determinism verification).
    Hash,

    /// Quit the runner.
    Quit,
}

fn default_step_count() -> u32 {
    1
}

fn default_step_dt() -> f32 {
    1.0
}

// ============================================================================
// Output Responses (Runner -> Controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        version: String,
        frame: u64,
        population: usize,
    },

    /// Acknowledgment of a command.
    Ack { cmd: String },

    /// Error processing a command.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// Current battle state.
    State {
        frame: u64,
        status: MatchStatus,
        population: usize,
        alive: usize,
        projectile_count: usize,
        agents: Vec<AgentState>,
        hash: u64,
    },

    /// Kill ranking.
    Scoreboard {
        frame: u64,
        entries: Vec<ScoreEntry>,
    },

    /// The match has ended.
    Finished {
        frame: u64,
        outcome: Outcome,
        headline: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },

    /// State hash for determinism verification.
    Hash { frame: u64, hash: u64 },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// State Types
// ============================================================================

/// Lifecycle of the match as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Running,
    Paused,
    Finished,
}

impl From<RunState> for MatchStatus {
    fn from(state: RunState) -> Self {
        match state {
            RunState::Running => Self::Running,
            RunState::Paused => Self::Paused,
            RunState::Finished { .. } => Self::Finished,
        }
    }
}

/// State of a single agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub id: AgentId,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub hp: i32,
    pub max_hp: i32,
    pub alive: bool,
    pub kills: u32,
    pub weapon: WeaponKind,
    pub kind: AgentKind,
    pub shape: Shape,
    pub color: String,
    /// Letter drawn on heroes and the special character.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<char>,
}

impl From<&Agent> for AgentState {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            x: agent.position.x,
            y: agent.position.y,
            radius: agent.radius,
            hp: agent.health.current,
            max_hp: agent.health.max,
            alive: agent.alive,
            kills: agent.kills,
            weapon: agent.weapon.kind,
            kind: agent.kind,
            shape: agent.shape,
            color: agent.color.to_string(),
            badge: agent.kind.badge(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(frame: u64, population: usize) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            frame,
            population,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Create a finished response with the winner banner text.
    pub fn finished(frame: u64, outcome: Outcome) -> Self {
        let (headline, details) = match outcome.winner() {
            Some(report) => (report.headline(), Some(report.details())),
            None => ("Draw!".to_string(), None),
        };
        Self::Finished {
            frame,
            outcome,
            headline,
            details,
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Step { .. } => "step",
            Self::Frame { .. } => "frame",
            Self::Tick { .. } => "tick",
            Self::Reset { .. } => "reset",
            Self::Pause => "pause",
            Self::Resume { .. } => "resume",
            Self::Speed { .. } => "speed",
            Self::Query => "query",
            Self::Scoreboard => "scoreboard",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}
