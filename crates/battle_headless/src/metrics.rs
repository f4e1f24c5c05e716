//! Match metrics collection for balance analysis.
//!
//! A [`MetricsCollector`] is fed the [`StepEvents`] of every step and turns
//! them into a [`GameMetrics`] record once the match ends. Records from a
//! batch are folded into a [`BatchSummary`].

use std::collections::HashMap;

use battle_core::combat::KillCause;
use battle_core::components::{AgentId, AgentKind};
use battle_core::progression::{Outcome, WinnerReport};
use battle_core::simulation::StepEvents;
use serde::{Deserialize, Serialize};

/// Complete metrics for a single match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Random seed used.
    pub seed: u64,
    /// Starting population.
    pub population: u32,
    /// Total match duration in frames.
    pub duration_frames: u64,
    /// Last agent standing (None = draw or timeout).
    pub winner: Option<WinnerReport>,
    /// Nobody survived.
    pub draw: bool,
    /// The frame limit was reached before a winner emerged.
    pub timed_out: bool,
    /// Deaths by cause.
    pub kills: KillTally,
    /// Projectiles fired.
    pub shots_fired: u64,
    /// Total damage from projectiles and melee swings.
    pub damage_dealt: u64,
    /// Hero annihilations.
    pub explosions: u32,
    /// Frame of the first death.
    pub first_kill_frame: Option<u64>,
    /// Timed events log.
    pub events: Vec<TimedEvent>,
    /// Final simulation state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// Create a new game metrics instance.
    #[must_use]
    pub fn new(game_id: impl Into<String>, seed: u64, population: u32) -> Self {
        Self {
            game_id: game_id.into(),
            seed,
            population,
            ..Default::default()
        }
    }

    /// Record a timed event.
    pub fn record_event(&mut self, frame: u64, event_type: EventType, agent: AgentId, details: &str) {
        self.events.push(TimedEvent {
            frame,
            event_type,
            agent,
            details: details.to_string(),
        });
    }

    /// Finalize the match with its outcome. `None` means the frame limit hit first.
    pub fn finalize(&mut self, duration: u64, outcome: Option<Outcome>) {
        self.duration_frames = duration;
        match outcome {
            Some(Outcome::Winner(report)) => self.winner = Some(report),
            Some(Outcome::Draw) => self.draw = true,
            None => self.timed_out = true,
        }
    }

    /// Check if the match was won by a hero.
    #[must_use]
    pub fn hero_won(&self) -> bool {
        self.winner.is_some_and(|w| w.kind.is_hero())
    }

    /// Check if the match was won by the special character.
    #[must_use]
    pub fn special_won(&self) -> bool {
        self.winner
            .is_some_and(|w| w.kind == AgentKind::SpecialCharacter)
    }
}

/// Deaths counted per cause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillTally {
    /// Lethal projectile hits.
    pub projectile: u32,
    /// Lethal melee swings.
    pub melee: u32,
    /// Agents touched by a hero.
    pub hero_contact: u32,
    /// Heroes lost to annihilation.
    pub annihilation: u32,
    /// Agents caught in an explosion.
    pub explosion: u32,
}

impl KillTally {
    /// Count one death.
    pub fn record(&mut self, cause: KillCause) {
        let slot = match cause {
            KillCause::Projectile => &mut self.projectile,
            KillCause::Melee => &mut self.melee,
            KillCause::HeroContact => &mut self.hero_contact,
            KillCause::Annihilation => &mut self.annihilation,
            KillCause::Explosion => &mut self.explosion,
        };
        *slot += 1;
    }

    /// All deaths.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.projectile + self.melee + self.hero_contact + self.annihilation + self.explosion
    }
}

/// A timed event during the match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Frame when the event occurred.
    pub frame: u64,
    /// Type of event.
    pub event_type: EventType,
    /// Agent involved.
    pub agent: AgentId,
    /// Event details.
    pub details: String,
}

/// Types of events that can be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    /// First death of the match.
    FirstBlood,
    /// A hero died.
    HeroDown,
    /// Two heroes annihilated each other.
    Annihilation,
    /// The match ended.
    MatchEnded,
}

/// Summary statistics across multiple matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total matches played.
    pub total_games: u32,
    /// Matches won by each weapon.
    pub wins_by_weapon: HashMap<String, u32>,
    /// Win rates by weapon.
    pub win_rates: HashMap<String, f64>,
    /// Matches won by a hero.
    pub hero_wins: u32,
    /// Matches won by the special character.
    pub special_wins: u32,
    /// Draws count.
    pub draws: u32,
    /// Matches stopped by the frame limit.
    pub timeouts: u32,
    /// Average match duration in frames.
    pub avg_duration_frames: f64,
    /// Shortest match.
    pub min_duration_frames: u64,
    /// Longest match.
    pub max_duration_frames: u64,
    /// Average kills credited to the winner.
    pub avg_winner_kills: f64,
    /// Average hero annihilations per match.
    pub avg_explosions: f64,
}

impl BatchSummary {
    /// Calculate summary from a list of game metrics.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_games: games.len() as u32,
            ..Default::default()
        };

        let mut duration_sum = 0u64;
        let mut min_duration = u64::MAX;
        let mut max_duration = 0u64;
        let mut winner_kills = Vec::new();
        let mut explosions = 0u64;

        for game in games {
            duration_sum += game.duration_frames;
            min_duration = min_duration.min(game.duration_frames);
            max_duration = max_duration.max(game.duration_frames);
            explosions += u64::from(game.explosions);

            if let Some(winner) = &game.winner {
                *summary
                    .wins_by_weapon
                    .entry(winner.weapon.to_string())
                    .or_default() += 1;
                winner_kills.push(winner.kills);
            }
            if game.hero_won() {
                summary.hero_wins += 1;
            }
            if game.special_won() {
                summary.special_wins += 1;
            }
            if game.draw {
                summary.draws += 1;
            }
            if game.timed_out {
                summary.timeouts += 1;
            }
        }

        let count = games.len() as f64;
        summary.avg_duration_frames = duration_sum as f64 / count;
        summary.min_duration_frames = min_duration;
        summary.max_duration_frames = max_duration;
        summary.avg_explosions = explosions as f64 / count;

        for (weapon, wins) in &summary.wins_by_weapon {
            summary
                .win_rates
                .insert(weapon.clone(), *wins as f64 / summary.total_games as f64);
        }

        if !winner_kills.is_empty() {
            summary.avg_winner_kills =
                winner_kills.iter().map(|&k| u64::from(k)).sum::<u64>() as f64 / winner_kills.len() as f64;
        }

        summary
    }

    /// Get the weapon whose win rate exceeds `threshold` (if any).
    #[must_use]
    pub fn dominant_weapon(&self, threshold: f64) -> Option<&String> {
        self.win_rates
            .iter()
            .filter(|(_, rate)| **rate > threshold)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(weapon, _)| weapon)
    }
}

/// Metrics collector that tracks events during a match.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    /// Current match metrics.
    metrics: GameMetrics,
    /// Current frame.
    current_frame: u64,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    #[must_use]
    pub fn new(game_id: &str, seed: u64, population: u32) -> Self {
        Self {
            metrics: GameMetrics::new(game_id, seed, population),
            current_frame: 0,
        }
    }

    /// Update the current frame.
    pub fn set_frame(&mut self, frame: u64) {
        self.current_frame = frame;
    }

    /// Fold in the events of one step.
    pub fn on_step(&mut self, events: &StepEvents, kinds: impl Fn(AgentId) -> Option<AgentKind>) {
        self.metrics.shots_fired += u64::from(events.shots_fired);
        self.metrics.damage_dealt += events
            .damage
            .iter()
            .map(|d| u64::from(d.damage))
            .sum::<u64>();

        for kill in &events.kills {
            if self.metrics.first_kill_frame.is_none() {
                self.metrics.first_kill_frame = Some(self.current_frame);
                self.metrics.record_event(
                    self.current_frame,
                    EventType::FirstBlood,
                    kill.victim,
                    "First blood",
                );
            }
            self.metrics.kills.record(kill.cause);
            if kinds(kill.victim).is_some_and(AgentKind::is_hero) {
                self.metrics.record_event(
                    self.current_frame,
                    EventType::HeroDown,
                    kill.victim,
                    &format!("{:?}", kill.cause),
                );
            }
        }

        for explosion in &events.explosions {
            self.metrics.explosions += 1;
            self.metrics.record_event(
                self.current_frame,
                EventType::Annihilation,
                explosion.heroes.0,
                &format!("heroes {} and {}", explosion.heroes.0, explosion.heroes.1),
            );
        }
    }

    /// Finalize and return the metrics.
    #[must_use]
    pub fn finalize(mut self, outcome: Option<Outcome>, state_hash: u64) -> GameMetrics {
        let agent = outcome
            .and_then(|o| o.winner().map(|w| w.id))
            .unwrap_or_default();
        let details = match &outcome {
            Some(Outcome::Winner(report)) => report.to_string(),
            Some(Outcome::Draw) => "Draw".to_string(),
            None => "Frame limit reached".to_string(),
        };
        self.metrics
            .record_event(self.current_frame, EventType::MatchEnded, agent, &details);
        self.metrics.finalize(self.current_frame, outcome);
        self.metrics.final_state_hash = state_hash;
        self.metrics
    }

    /// Get current metrics (immutable).
    #[must_use]
    pub fn current(&self) -> &GameMetrics {
        &self.metrics
    }
}
