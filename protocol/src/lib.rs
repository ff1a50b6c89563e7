//! Wire types shared between the experiment backend and the web client.
//!
//! Grids travel as row-major 2D integer arrays; everything else is plain
//! JSON. Sentinel integers are decoded into tagged types here or at the
//! client's grid boundary, never deeper in.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the grid reacts to pointer input.
///
/// Anything the client does not recognize renders read-only, so a newer
/// backend can ship modes an older client simply ignores.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    Standard,
    Exploratory,
    #[default]
    #[serde(other)]
    Disabled,
}

impl InteractionMode {
    pub const fn is_interactive(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Payload of `GET /get_stimulus`.
///
/// Backend revisions disagree on progress reporting: some send
/// `trial_id`/`num_stimuli`, some a ready-made `progress_percent`. All
/// three are optional and the client copes with either.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
    #[serde(default)]
    pub trial_id: Option<u32>,
    #[serde(default)]
    pub num_stimuli: Option<u32>,
    #[serde(default)]
    pub progress_percent: Option<f64>,
    pub game_board: Vec<Vec<i32>>,
    pub game_state: Vec<Vec<i32>>,
    #[serde(default)]
    pub game_state_solved: Option<Vec<Vec<i32>>>,
    #[serde(default)]
    pub interaction_mode: InteractionMode,
}

/// A grid gesture, as the `/move` endpoint expects it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum MoveAction {
    Reveal,
    Flag,
    MarkSafe,
}

impl From<MoveAction> for u8 {
    fn from(action: MoveAction) -> Self {
        match action {
            MoveAction::Reveal => 0,
            MoveAction::Flag => 1,
            MoveAction::MarkSafe => 2,
        }
    }
}

impl TryFrom<u8> for MoveAction {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Reveal),
            1 => Ok(Self::Flag),
            2 => Ok(Self::MarkSafe),
            code => Err(format!("unknown action code {code}")),
        }
    }
}

/// Body of `POST /move`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCommand {
    pub x: u8,
    pub y: u8,
    pub action: MoveAction,
}

/// Reply to `POST /move`.
///
/// `result` is whatever the backend's move handler returned and keeps its
/// JavaScript truthiness semantics; older revisions name the grid field
/// `state` instead of `game_state`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveReply {
    #[serde(default)]
    pub result: Value,
    #[serde(default, alias = "state")]
    pub game_state: Option<Vec<Vec<i32>>>,
}

impl MoveReply {
    /// A falsy `result` means the move was refused and the board must not
    /// be re-rendered.
    pub fn result_is_truthy(&self) -> bool {
        match &self.result {
            Value::Null => false,
            Value::Bool(value) => *value,
            Value::Number(value) => value.as_f64().is_some_and(|n| n != 0.0),
            Value::String(value) => !value.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbePosition {
    pub x: u8,
    pub y: u8,
}

/// Scored trial record, posted once to `POST /send_response`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialReport {
    #[serde(default)]
    pub trial_id: Option<u32>,
    pub game_board: Vec<Vec<i32>>,
    pub game_state: Vec<Vec<i32>>,
    pub probe_position: Option<ProbePosition>,
    pub mine_present: bool,
    pub user_response: bool,
    pub response_correct: bool,
    /// Milliseconds between stimulus presentation and the judgment key.
    pub reaction_time: i64,
}

/// Acknowledgment for a submitted trial.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Bootstrap blob the backend embeds in the free-play page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameBoot {
    pub game_state: Vec<Vec<i32>>,
    #[serde(default)]
    pub interaction_mode: InteractionMode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stimulus_decodes_the_full_backend_payload() {
        let stimulus: Stimulus = serde_json::from_value(json!({
            "trial_id": 2,
            "num_stimuli": 6,
            "game_board": [[-1, 0], [0, 0]],
            "game_state": [[-5, 0], [0, 0]],
            "game_state_solved": [[-5, 1], [1, 1]],
            "interaction_mode": "exploratory",
        }))
        .unwrap();

        assert_eq!(stimulus.trial_id, Some(2));
        assert_eq!(stimulus.num_stimuli, Some(6));
        assert_eq!(stimulus.progress_percent, None);
        assert_eq!(stimulus.interaction_mode, InteractionMode::Exploratory);
        assert_eq!(stimulus.game_state[0][0], -5);
    }

    #[test]
    fn stimulus_accepts_percentage_only_progress() {
        let stimulus: Stimulus = serde_json::from_value(json!({
            "progress_percent": 40.0,
            "game_board": [[0]],
            "game_state": [[-1]],
        }))
        .unwrap();

        assert_eq!(stimulus.trial_id, None);
        assert_eq!(stimulus.progress_percent, Some(40.0));
        assert_eq!(stimulus.game_state_solved, None);
        assert_eq!(stimulus.interaction_mode, InteractionMode::Disabled);
    }

    #[test]
    fn unknown_interaction_modes_render_read_only() {
        let mode: InteractionMode = serde_json::from_value(json!("observer")).unwrap();
        assert_eq!(mode, InteractionMode::Disabled);
        assert!(!mode.is_interactive());
        assert!(InteractionMode::Exploratory.is_interactive());
    }

    #[test]
    fn move_actions_use_the_wire_integers() {
        let body = serde_json::to_value(MoveCommand {
            x: 3,
            y: 1,
            action: MoveAction::MarkSafe,
        })
        .unwrap();
        assert_eq!(body, json!({"x": 3, "y": 1, "action": 2}));

        assert_eq!(MoveAction::try_from(0).unwrap(), MoveAction::Reveal);
        assert!(MoveAction::try_from(7).is_err());
    }

    #[test]
    fn move_reply_accepts_the_state_alias() {
        let reply: MoveReply = serde_json::from_value(json!({
            "result": true,
            "state": [[0, 1]],
        }))
        .unwrap();
        assert_eq!(reply.game_state, Some(vec![vec![0, 1]]));
    }

    #[test]
    fn move_reply_truthiness_mirrors_javascript() {
        let truthy = |value: Value| MoveReply {
            result: value,
            game_state: None,
        };

        assert!(!truthy(Value::Null).result_is_truthy());
        assert!(!truthy(json!(false)).result_is_truthy());
        assert!(!truthy(json!(0)).result_is_truthy());
        assert!(!truthy(json!("")).result_is_truthy());
        assert!(truthy(json!(true)).result_is_truthy());
        assert!(truthy(json!(1)).result_is_truthy());
        assert!(truthy(json!("Revealed")).result_is_truthy());
        assert!(truthy(json!({"ok": true})).result_is_truthy());
    }

    #[test]
    fn trial_report_serializes_every_scored_field() {
        let report = TrialReport {
            trial_id: Some(4),
            game_board: vec![vec![-1, 0], vec![0, 0]],
            game_state: vec![vec![-5, 0], vec![0, 0]],
            probe_position: Some(ProbePosition { x: 0, y: 0 }),
            mine_present: true,
            user_response: false,
            response_correct: false,
            reaction_time: 843,
        };

        let body = serde_json::to_value(&report).unwrap();
        assert_eq!(body["trial_id"], json!(4));
        assert_eq!(body["probe_position"], json!({"x": 0, "y": 0}));
        assert_eq!(body["mine_present"], json!(true));
        assert_eq!(body["user_response"], json!(false));
        assert_eq!(body["response_correct"], json!(false));
        assert_eq!(body["reaction_time"], json!(843));
    }

    #[test]
    fn ack_defaults_to_failure_when_fields_are_missing() {
        let ack: Ack = serde_json::from_value(json!({})).unwrap();
        assert!(!ack.success);
        assert_eq!(ack.message, None);

        let ack: Ack = serde_json::from_value(json!({
            "success": false,
            "message": "Failed to save trial data.",
        }))
        .unwrap();
        assert!(!ack.success);
        assert!(ack.message.is_some());
    }
}
