use chrono::{DateTime, Utc};

use crate::{BoardGrid, Coord2, ExperimentError, Result, StateGrid};

/// Lifecycle of the experiment page, one trial at a time.
///
/// Valid transitions:
/// - Idle -> Loading
/// - Loading -> AwaitingResponse | Stalled
/// - AwaitingResponse -> Scoring
/// - Scoring -> Submitting
/// - Submitting -> Advancing | Stalled
/// - Advancing -> Loading | Complete
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    AwaitingResponse,
    Scoring,
    Submitting,
    Advancing,
    Complete,
    Stalled,
}

impl Phase {
    pub const fn accepts_judgment(self) -> bool {
        matches!(self, Self::AwaitingResponse)
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::Idle
    }
}

/// Maps a key name to the judgment it encodes.
///
/// Exactly two keys are recognized; every other key means "not a response"
/// and must leave the trial untouched.
pub fn judgment_for_key(key: &str) -> Option<bool> {
    match key {
        "p" | "P" => Some(true),
        "q" | "Q" => Some(false),
        _ => None,
    }
}

/// The participant's scored answer for one trial.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Judgment {
    pub user_response: bool,
    pub correct: bool,
    pub reaction_time_ms: i64,
}

/// Where this trial sits in the stimulus sequence.
///
/// Some backend revisions send `trial_id`/`num_stimuli`, others only a
/// ready-made percentage; both are carried and the server value wins.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TrialProgress {
    pub trial_id: Option<u32>,
    pub num_stimuli: Option<u32>,
    pub server_percent: Option<f64>,
}

impl TrialProgress {
    pub fn percent(&self) -> f64 {
        if let Some(percent) = self.server_percent {
            return percent.clamp(0.0, 100.0);
        }
        match (self.trial_id, self.num_stimuli) {
            (Some(trial_id), Some(num_stimuli)) if num_stimuli > 0 => {
                f64::from(trial_id) / f64::from(num_stimuli) * 100.0
            }
            _ => 0.0,
        }
    }

    pub fn is_last_trial(&self) -> bool {
        matches!(
            (self.trial_id, self.num_stimuli),
            (Some(trial_id), Some(num_stimuli)) if trial_id + 1 >= num_stimuli
        )
    }
}

/// What happens after a trial is acknowledged by the backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AdvanceDecision {
    NextTrial,
    Finished,
}

/// Everything the client holds for the trial currently on screen.
///
/// All per-trial mutation goes through this object; there is no ambient
/// trial state anywhere else.
#[derive(Clone, Debug, PartialEq)]
pub struct TrialSession {
    progress: TrialProgress,
    board: BoardGrid,
    state: StateGrid,
    solved: Option<StateGrid>,
    probe: Option<Coord2>,
    presented_at: Option<DateTime<Utc>>,
    judgment: Option<Judgment>,
    solution_shown: bool,
}

impl TrialSession {
    pub fn new(
        board: BoardGrid,
        state: StateGrid,
        solved: Option<StateGrid>,
        progress: TrialProgress,
    ) -> Result<Self> {
        if board.size() != state.size() {
            return Err(ExperimentError::SizeMismatch);
        }
        if let Some(solved) = &solved {
            if solved.size() != state.size() {
                return Err(ExperimentError::SizeMismatch);
            }
        }
        let probe = state.probe_position();
        Ok(Self {
            progress,
            board,
            state,
            solved,
            probe,
            presented_at: None,
            judgment: None,
            solution_shown: false,
        })
    }

    pub fn progress(&self) -> TrialProgress {
        self.progress
    }

    pub fn board(&self) -> &BoardGrid {
        &self.board
    }

    pub fn state(&self) -> &StateGrid {
        &self.state
    }

    /// Grid the participant currently sees; the solved overlay replaces the
    /// regular state while it is active.
    pub fn visible_state(&self) -> &StateGrid {
        match &self.solved {
            Some(solved) if self.solution_shown => solved,
            _ => &self.state,
        }
    }

    pub fn probe(&self) -> Option<Coord2> {
        self.probe
    }

    /// Ground truth under the probe; a stimulus without a probe marker can
    /// still be judged, it just never contains a mine to find.
    pub fn mine_present(&self) -> bool {
        self.probe.is_some_and(|pos| self.board.mine_at(pos))
    }

    /// Called once the stimulus is on screen; reaction time counts from here.
    pub fn mark_presented(&mut self, now: DateTime<Utc>) {
        if self.presented_at.is_none() {
            self.presented_at = Some(now);
        }
    }

    pub fn judgment(&self) -> Option<Judgment> {
        self.judgment
    }

    /// Records the participant's judgment and scores it.
    ///
    /// Only the first judgment per trial is accepted; repeated calls (and
    /// calls before the stimulus was presented) return `None`.
    pub fn accept_judgment(&mut self, user_response: bool, now: DateTime<Utc>) -> Option<Judgment> {
        if self.judgment.is_some() {
            return None;
        }
        let presented_at = self.presented_at?;
        let judgment = Judgment {
            user_response,
            correct: self.mine_present() == user_response,
            reaction_time_ms: (now - presented_at).num_milliseconds().max(0),
        };
        self.judgment = Some(judgment);
        // feedback rendering takes over from the overlay
        self.solution_shown = false;
        Some(judgment)
    }

    /// Swaps the solved overlay in or out; returns whether anything changed.
    pub fn toggle_solution(&mut self) -> bool {
        if self.solved.is_none() {
            return false;
        }
        self.solution_shown = !self.solution_shown;
        true
    }

    pub fn solution_shown(&self) -> bool {
        self.solution_shown
    }

    /// Replaces the visible state after an interactive move was accepted by
    /// the backend. The trial keeps asking about the same cell even if the
    /// move wiped the probe marker.
    pub fn apply_move_state(&mut self, next: StateGrid) -> Result<()> {
        if next.size() != self.board.size() {
            return Err(ExperimentError::SizeMismatch);
        }
        self.probe = next.probe_position().or(self.probe);
        self.state = next;
        Ok(())
    }

    pub fn advance_decision(&self) -> AdvanceDecision {
        if self.progress.is_last_trial() {
            AdvanceDecision::Finished
        } else {
            AdvanceDecision::NextTrial
        }
    }
}
