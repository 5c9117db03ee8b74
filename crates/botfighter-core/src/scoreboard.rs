//! Score, kill, wave and phase bookkeeping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the run is in progress.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Ticks advance normally
    #[default]
    Running,
    /// Every player ship is destroyed; only a restart leaves this phase
    GameOver,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::GameOver => write!(f, "game over"),
        }
    }
}

/// Counters exposed in every snapshot.
///
/// `score` only ever counts coin values. Enemy kills by player bullets are
/// tracked separately in `kills`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    score: u64,
    kills: u32,
    wave: u32,
    phase: GamePhase,
}

impl Scoreboard {
    /// Fresh counters: score 0, wave 1, running.
    #[must_use]
    pub fn new() -> Self {
        Self {
            score: 0,
            kills: 0,
            wave: 1,
            phase: GamePhase::Running,
        }
    }

    /// Coin score.
    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Enemies destroyed by player bullets.
    #[must_use]
    pub fn kills(&self) -> u32 {
        self.kills
    }

    /// Current wave, starting at 1.
    #[must_use]
    pub fn wave(&self) -> u32 {
        self.wave
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Whether the run has ended.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Credit a collected coin.
    pub fn collect_coin(&mut self, value: u32) {
        self.score += u64::from(value);
    }

    /// Credit an enemy kill.
    pub fn record_kill(&mut self) {
        self.kills += 1;
    }

    /// Move to the next wave and return it.
    pub fn advance_wave(&mut self) -> u32 {
        self.wave += 1;
        self.wave
    }

    /// Enter [`GamePhase::GameOver`].
    pub fn end_game(&mut self) {
        self.phase = GamePhase::GameOver;
    }
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new()
    }
}
