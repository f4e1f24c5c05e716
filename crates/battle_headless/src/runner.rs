//! Headless battle runner implementation.
//!
//! A synchronous command loop around one [`Simulation`]. Every input line
//! is parsed into a [`Command`], applied, and answered with one or more
//! [`Response`] lines.

use std::io::{self, BufRead, Write};

use battle_core::clock::FrameClock;
use battle_core::error::SimError;
use battle_core::simulation::Simulation;
use thiserror::Error;

use crate::protocol::{AgentState, Command, MatchStatus, Response};

/// Errors that stop the runner loop.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The simulation could not be created.
    #[error("failed to create simulation: {0}")]
    Simulation(#[from] SimError),
    /// Reading commands or writing responses failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Headless runner configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Output state after every `step` and `frame` command (vs only on query).
    pub auto_state_output: bool,
    /// Include every agent in `state` responses.
    pub include_agents: bool,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            auto_state_output: false,
            include_agents: true,
        }
    }
}

/// Headless runner for scripted battles.
#[derive(Debug)]
pub struct HeadlessRunner {
    config: HeadlessConfig,
    sim: Simulation,
    clock: FrameClock,
    finish_reported: bool,
}

impl HeadlessRunner {
    /// Create a runner around `sim` with default config.
    pub fn new(sim: Simulation) -> Self {
        Self::with_config(sim, HeadlessConfig::default())
    }

    /// Create a runner with custom configuration.
    pub fn with_config(sim: Simulation, config: HeadlessConfig) -> Self {
        let clock = FrameClock::new(sim.config().timing);
        Self {
            config,
            sim,
            clock,
            finish_reported: false,
        }
    }

    /// The wrapped simulation.
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Greeting sent before the first command.
    pub fn ready(&self) -> Response {
        Response::ready(self.sim.frame(), self.sim.snapshot().population)
    }

    /// Apply one command and return its responses.
    pub fn handle(&mut self, command: &Command) -> Vec<Response> {
        let name = command.name();
        let mut responses = Vec::new();

        match *command {
            Command::Step { count, dt } => {
                for _ in 0..count {
                    if self.sim.is_finished() {
                        break;
                    }
                    self.sim.step(dt);
                }
                responses.push(Response::ack(name));
                self.push_progress(&mut responses);
            }
            Command::Frame { elapsed_ms } => {
                if !self.clock.is_paused() {
                    self.sim.step(self.clock.dt_for(elapsed_ms));
                }
                responses.push(Response::ack(name));
                self.push_progress(&mut responses);
            }
            Command::Tick { now_ms } => {
                if let Some(dt) = self.clock.tick(now_ms) {
                    if !self.sim.is_finished() {
                        self.sim.step(dt);
                    }
                }
                responses.push(Response::ack(name));
                self.push_progress(&mut responses);
            }
            Command::Reset { population } => {
                let population = population.unwrap_or(self.sim.config().population);
                self.sim.reset(population);
                self.clock = FrameClock::new(self.clock_timing());
                self.finish_reported = false;
                responses.push(Response::ack(name));
            }
            Command::Pause => {
                self.sim.pause();
                self.clock.pause();
                responses.push(Response::ack(name));
            }
            Command::Resume { now_ms } => {
                self.sim.resume();
                self.clock.resume(now_ms);
                responses.push(Response::ack(name));
            }
            Command::Speed { multiplier } => {
                if multiplier.is_finite() && multiplier > 0.0 {
                    self.clock.set_speed(multiplier);
                    responses.push(Response::ack(name));
                } else {
                    responses.push(Response::error(
                        format!("speed multiplier must be positive, got {multiplier}"),
                        Some(name),
                    ));
                }
            }
            Command::Query => responses.push(self.state_response()),
            Command::Scoreboard => responses.push(Response::Scoreboard {
                frame: self.sim.frame(),
                entries: self.sim.scoreboard(),
            }),
            Command::Hash => responses.push(Response::Hash {
                frame: self.sim.frame(),
                hash: self.sim.state_hash(),
            }),
            Command::Quit => responses.push(Response::Bye),
        }

        responses
    }

    /// Parse and apply one input line.
    ///
    /// Blank lines produce no output; malformed lines produce an error response.
    pub fn handle_line(&mut self, line: &str) -> Vec<Response> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }
        match Command::from_json(line) {
            Ok(command) => {
                tracing::debug!(cmd = command.name(), "Command received");
                self.handle(&command)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Malformed command");
                vec![Response::error(format!("invalid command: {e}"), None)]
            }
        }
    }

    /// Run the command loop until `quit` or end of input.
    ///
    /// Reads JSON commands from `input`, writes responses to `output`.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<(), RunnerError> {
        output.write_all(self.ready().to_json_line().as_bytes())?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            let responses = self.handle_line(&line);
            let quit = responses.iter().any(|r| matches!(r, Response::Bye));

            for response in &responses {
                output.write_all(response.to_json_line().as_bytes())?;
            }
            output.flush()?;

            if quit {
                tracing::info!(frame = self.sim.frame(), "Runner quit");
                return Ok(());
            }
        }

        tracing::info!(frame = self.sim.frame(), "Input closed");
        Ok(())
    }

    fn clock_timing(&self) -> battle_core::config::TimingConfig {
        let mut timing = self.sim.config().timing;
        timing.speed = self.clock.speed();
        timing
    }

    fn push_progress(&mut self, responses: &mut Vec<Response>) {
        if self.config.auto_state_output {
            responses.push(self.state_response());
        }
        if let Some(outcome) = self.sim.outcome() {
            if !self.finish_reported {
                self.finish_reported = true;
                responses.push(Response::finished(self.sim.frame(), outcome));
            }
        }
    }

    fn state_response(&self) -> Response {
        let snapshot = self.sim.snapshot();
        let agents = if self.config.include_agents {
            snapshot.agents.iter().map(AgentState::from).collect()
        } else {
            Vec::new()
        };
        Response::State {
            frame: snapshot.frame,
            status: MatchStatus::from(snapshot.run_state),
            population: snapshot.population,
            alive: snapshot.alive,
            projectile_count: snapshot.projectile_count,
            agents,
            hash: self.sim.state_hash(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_test_utils::fixtures::{gunner_at, scripted_simulation, seeded_simulation};

    fn responses_for(runner: &mut HeadlessRunner, line: &str) -> Vec<Response> {
        runner.handle_line(line)
    }

    #[test]
    fn test_step_command_advances_frames() {
        let mut runner = HeadlessRunner::new(seeded_simulation(20, 1));
        let responses = responses_for(&mut runner, r#"{"cmd":"step","count":5}"#);
        assert_eq!(responses[0], Response::ack("step"));
        assert_eq!(runner.simulation().frame(), 5);
    }

    #[test]
    fn test_frame_command_uses_clock() {
        let mut runner = HeadlessRunner::new(seeded_simulation(20, 1));
        runner.handle(&Command::Speed { multiplier: 2.0 });
        runner.handle(&Command::Frame { elapsed_ms: 16.0 });
        assert_eq!(runner.simulation().frame(), 1);
    }

    #[test]
    fn test_pause_blocks_steps() {
        let mut runner = HeadlessRunner::new(seeded_simulation(20, 1));
        runner.handle(&Command::Pause);
        runner.handle(&Command::Step { count: 3, dt: 1.0 });
        runner.handle(&Command::Frame { elapsed_ms: 16.0 });
        assert_eq!(runner.simulation().frame(), 0);

        runner.handle(&Command::Resume { now_ms: None });
        runner.handle(&Command::Step { count: 3, dt: 1.0 });
        assert_eq!(runner.simulation().frame(), 3);
    }

    #[test]
    fn test_tick_steps_from_wall_clock() {
        let mut runner = HeadlessRunner::new(seeded_simulation(20, 1));
        runner.handle(&Command::Tick { now_ms: 1000.0 });
        assert_eq!(runner.simulation().frame(), 0);
        runner.handle(&Command::Tick { now_ms: 1016.0 });
        assert_eq!(runner.simulation().frame(), 1);
    }

    #[test]
    fn test_resume_measures_from_given_timestamp() {
        let mut runner = HeadlessRunner::new(seeded_simulation(20, 1));
        runner.handle(&Command::Tick { now_ms: 0.0 });
        runner.handle(&Command::Pause);
        runner.handle(&Command::Tick { now_ms: 5000.0 });
        assert_eq!(runner.simulation().frame(), 0);

        runner.handle(&Command::Resume { now_ms: Some(10_000.0) });
        runner.handle(&Command::Tick { now_ms: 10_016.0 });
        assert_eq!(runner.simulation().frame(), 1);
    }

    #[test]
    fn test_invalid_speed_rejected() {
        let mut runner = HeadlessRunner::new(seeded_simulation(5, 1));
        let responses = runner.handle(&Command::Speed { multiplier: -1.0 });
        assert!(matches!(responses[0], Response::Error { .. }));
    }

    #[test]
    fn test_malformed_line_reports_error() {
        let mut runner = HeadlessRunner::new(seeded_simulation(5, 1));
        let responses = responses_for(&mut runner, "{not json");
        assert!(matches!(&responses[0], Response::Error { cmd: None, .. }));
        assert!(responses_for(&mut runner, "   ").is_empty());
    }

    #[test]
    fn test_finished_reported_once() {
        let mut sim = scripted_simulation();
        sim.spawn_agent(gunner_at(500.0, 350.0));
        let mut runner = HeadlessRunner::new(sim);

        let responses = runner.handle(&Command::Step { count: 10, dt: 1.0 });
        assert_eq!(runner.simulation().frame(), 1);
        assert!(responses
            .iter()
            .any(|r| matches!(r, Response::Finished { headline, .. } if headline == "Player #1 Wins!")));

        let again = runner.handle(&Command::Step { count: 1, dt: 1.0 });
        assert!(!again.iter().any(|r| matches!(r, Response::Finished { .. })));
    }

    #[test]
    fn test_reset_restarts_match() {
        let mut runner = HeadlessRunner::new(seeded_simulation(10, 3));
        runner.handle(&Command::Step { count: 4, dt: 1.0 });
        runner.handle(&Command::Reset { population: Some(25) });

        let snapshot = runner.simulation().snapshot();
        assert_eq!(snapshot.frame, 0);
        assert_eq!(snapshot.population, 25);
    }

    #[test]
    fn test_query_and_scoreboard() {
        let mut runner = HeadlessRunner::new(seeded_simulation(12, 3));
        match &runner.handle(&Command::Query)[0] {
            Response::State { population, alive, agents, .. } => {
                assert_eq!(*population, 12);
                assert_eq!(*alive, 12);
                assert_eq!(agents.len(), 12);
            }
            other => panic!("unexpected response: {other:?}"),
        }
        match &runner.handle(&Command::Scoreboard)[0] {
            Response::Scoreboard { entries, .. } => assert_eq!(entries.len(), 10),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_run_session() {
        let mut runner = HeadlessRunner::new(seeded_simulation(10, 8));
        let input = "{\"cmd\":\"step\",\"count\":2}\n{\"cmd\":\"hash\"}\n{\"cmd\":\"quit\"}\n{\"cmd\":\"step\"}\n";
        let mut output = Vec::new();

        runner.run(input.as_bytes(), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].contains(r#""type":"ready""#));
        assert!(lines.iter().any(|l| l.contains(r#""type":"hash""#)));
        assert!(lines.last().unwrap().contains(r#""type":"bye""#));
        assert_eq!(runner.simulation().frame(), 2);
    }
}
