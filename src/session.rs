use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::grid::Grid;
use crate::summary::{RoundStats, SessionSummary};

/// Grid sizes played in one session, in order
pub const ROUND_SIZES: [usize; 3] = [3, 4, 5];

pub const DEFAULT_COMPLETION_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pause between clearing a grid and the next round starting
    pub completion_delay: Duration,
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            completion_delay: DEFAULT_COMPLETION_DELAY,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active { size: usize },
    /// Grid cleared, waiting out the completion pause
    Cleared { size: usize, advance_at: Instant },
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "Idle"),
            Phase::Active { size } => write!(f, "Active({size})"),
            Phase::Cleared { size, .. } => write!(f, "Cleared({size})"),
            Phase::Finished => write!(f, "Finished"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundComplete {
    pub size: usize,
    pub stats: RoundStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// No round is active
    Ignored,
    Matched { value: usize },
    Mismatch { value: usize, expected: usize },
    RoundComplete(RoundComplete),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    NextRound { size: usize },
    Finished(SessionSummary),
}

/// Round controller. Owns the grid, counters and per-size results; all
/// mutation goes through `start`, `click` and `tick`.
#[derive(Debug)]
pub struct Session {
    phase: Phase,
    grid: Grid,
    expected_next: usize,
    error_count: u32,
    started_at: Option<Instant>,
    stats: BTreeMap<usize, RoundStats>,
    completion_delay: Duration,
    rng: StdRng,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        // preview board shown before the first start
        let grid = Grid::generate(ROUND_SIZES[0], &mut rng);

        Self {
            phase: Phase::Idle,
            grid,
            expected_next: 1,
            error_count: 0,
            started_at: None,
            stats: BTreeMap::new(),
            completion_delay: config.completion_delay,
            rng,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn expected_next(&self) -> usize {
        self.expected_next
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn stats(&self) -> &BTreeMap<usize, RoundStats> {
        &self.stats
    }

    pub fn in_progress(&self) -> bool {
        matches!(self.phase, Phase::Active { .. })
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn current_size(&self) -> usize {
        match self.phase {
            Phase::Active { size } | Phase::Cleared { size, .. } => size,
            Phase::Idle => ROUND_SIZES[0],
            Phase::Finished => ROUND_SIZES[ROUND_SIZES.len() - 1],
        }
    }

    /// Starts a new session. Only honoured from `Idle` or `Finished`.
    pub fn start(&mut self, now: Instant) -> bool {
        match self.phase {
            Phase::Idle | Phase::Finished => {
                self.stats.clear();
                self.begin_round(ROUND_SIZES[0], now);
                true
            }
            _ => {
                debug!(phase = %self.phase, "start ignored");
                false
            }
        }
    }

    fn begin_round(&mut self, size: usize, now: Instant) {
        self.grid = Grid::generate(size, &mut self.rng);
        self.expected_next = 1;
        self.error_count = 0;
        self.started_at = Some(now);
        self.phase = Phase::Active { size };
        info!(size, "round started");
    }

    pub fn click(&mut self, value: usize, now: Instant) -> ClickOutcome {
        let size = match self.phase {
            Phase::Active { size } => size,
            _ => return ClickOutcome::Ignored,
        };

        if value != self.expected_next {
            self.error_count += 1;
            debug!(value, expected = self.expected_next, errors = self.error_count, "mismatch");
            return ClickOutcome::Mismatch {
                value,
                expected: self.expected_next,
            };
        }

        self.grid.mark_matched(value);
        self.expected_next += 1;

        if self.expected_next <= self.grid.total() {
            return ClickOutcome::Matched { value };
        }

        let stats = RoundStats {
            elapsed_secs: self.round_elapsed(now),
            error_count: self.error_count,
        };
        self.stats.insert(size, stats);
        self.phase = Phase::Cleared {
            size,
            advance_at: now + self.completion_delay,
        };
        info!(
            size,
            elapsed_secs = stats.elapsed_secs,
            errors = stats.error_count,
            "round complete"
        );

        ClickOutcome::RoundComplete(RoundComplete { size, stats })
    }

    /// Performs the pending round transition once the completion pause has
    /// run out. Any other tick is purely observational.
    pub fn tick(&mut self, now: Instant) -> Option<Transition> {
        let (size, advance_at) = match self.phase {
            Phase::Cleared { size, advance_at } => (size, advance_at),
            _ => return None,
        };
        if now < advance_at {
            return None;
        }

        match ROUND_SIZES.iter().position(|&s| s == size) {
            Some(i) if i + 1 < ROUND_SIZES.len() => {
                let next = ROUND_SIZES[i + 1];
                self.begin_round(next, now);
                Some(Transition::NextRound { size: next })
            }
            _ => {
                self.phase = Phase::Finished;
                self.started_at = None;
                let summary = self.summary();
                info!(summary = %summary.to_text(), "session finished");
                Some(Transition::Finished(summary))
            }
        }
    }

    fn round_elapsed(&self, now: Instant) -> u64 {
        self.started_at
            .map(|t| now.saturating_duration_since(t).as_secs())
            .unwrap_or(0)
    }

    /// Whole seconds for the status display
    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        match self.phase {
            Phase::Active { .. } => self.round_elapsed(now),
            Phase::Cleared { size, .. } => self
                .stats
                .get(&size)
                .map(|s| s.elapsed_secs)
                .unwrap_or(0),
            Phase::Idle | Phase::Finished => 0,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary::from_stats(&self.stats)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
