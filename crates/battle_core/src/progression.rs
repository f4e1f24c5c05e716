//! Post-kill progression and the win condition.
//!
//! Every credited kill makes the killer larger and faster. A match ends
//! when at most one agent is left standing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::{Agent, AgentId, AgentKind, Shape, WeaponKind};
use crate::math::Vec2;
use crate::random::RandomSource;

/// Radius gained per kill.
pub const BUFF_RADIUS_GAIN: f32 = 1.6;

/// Radius cap.
pub const BUFF_MAX_RADIUS: f32 = 40.0;

/// Below this speed a fresh heading is picked before scaling.
pub const BUFF_MIN_SPEED: f32 = 0.12;

/// Speed used when a new heading is picked.
pub const BUFF_RESTART_SPEED: f32 = 0.6;

/// Speed multiplier per kill.
pub const BUFF_SPEED_SCALE: f32 = 1.16;

/// Flat speed bonus per kill.
pub const BUFF_SPEED_BONUS: f32 = 0.12;

/// Speed cap after a buff.
pub const BUFF_MAX_SPEED: f32 = 6.0;

/// Number of entries reported by the scoreboard.
pub const SCOREBOARD_SIZE: usize = 10;

/// Credit a kill to `agent`.
pub fn apply_buff(agent: &mut Agent, rng: &mut dyn RandomSource) {
    agent.kills += 1;
    agent.radius = (agent.radius + BUFF_RADIUS_GAIN).min(BUFF_MAX_RADIUS);

    let mut velocity = agent.velocity;
    if velocity.length() < BUFF_MIN_SPEED {
        velocity = Vec2::from_angle(rng.angle(), BUFF_RESTART_SPEED);
    }

    let speed = (velocity.length() * BUFF_SPEED_SCALE + BUFF_SPEED_BONUS).min(BUFF_MAX_SPEED);
    agent.velocity = Vec2::from_angle(velocity.angle(), speed);
}

/// Details of the last agent standing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinnerReport {
    /// Winning agent.
    pub id: AgentId,
    /// Credited kills.
    pub kills: u32,
    /// Weapon carried.
    pub weapon: WeaponKind,
    /// Display shape.
    pub shape: Shape,
    /// Special tag.
    pub kind: AgentKind,
}

impl WinnerReport {
    /// Build a report from the surviving agent.
    #[must_use]
    pub fn from_agent(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            kills: agent.kills,
            weapon: agent.weapon.kind,
            shape: agent.shape,
            kind: agent.kind,
        }
    }

    /// Headline shown by front-ends. Player numbers are 1-based.
    #[must_use]
    pub fn headline(&self) -> String {
        format!("Player #{} Wins!", self.id + 1)
    }

    /// Detail line shown under the headline.
    #[must_use]
    pub fn details(&self) -> String {
        format!(
            "Kills: {} \u{2014} Weapon: {} \u{2014} Shape: {}",
            self.kills, self.weapon, self.shape
        )
    }
}

impl fmt::Display for WinnerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.headline(), self.details())
    }
}

/// How a finished match ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    /// Exactly one agent survived.
    Winner(WinnerReport),
    /// Nobody survived.
    Draw,
}

impl Outcome {
    /// Winner details, if any.
    #[must_use]
    pub fn winner(&self) -> Option<&WinnerReport> {
        match self {
            Outcome::Winner(report) => Some(report),
            Outcome::Draw => None,
        }
    }
}

/// Check whether the match is over.
///
/// Returns `None` while two or more agents are alive.
#[must_use]
pub fn evaluate_outcome(agents: &[Agent]) -> Option<Outcome> {
    let mut alive = agents.iter().filter(|agent| agent.alive);
    match (alive.next(), alive.next()) {
        (None, _) => Some(Outcome::Draw),
        (Some(agent), None) => Some(Outcome::Winner(WinnerReport::from_agent(agent))),
        (Some(_), Some(_)) => None,
    }
}

/// One row of the kill ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Agent id.
    pub id: AgentId,
    /// Credited kills.
    pub kills: u32,
    /// Whether the agent is still alive.
    pub alive: bool,
}

/// Top agents by kills, ties broken by id. Dead agents stay ranked.
#[must_use]
pub fn scoreboard(agents: &[Agent], limit: usize) -> Vec<ScoreEntry> {
    let mut entries: Vec<ScoreEntry> = agents
        .iter()
        .map(|agent| ScoreEntry {
            id: agent.id,
            kills: agent.kills,
            alive: agent.alive,
        })
        .collect();
    entries.sort_by(|a, b| b.kills.cmp(&a.kills).then(a.id.cmp(&b.id)));
    entries.truncate(limit);
    entries
}
