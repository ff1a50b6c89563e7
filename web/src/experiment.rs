use clap::{Args, ValueEnum};
use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use minelab_core::{
    AdvanceDecision, BoardGrid, Coord2, Phase, StateGrid, TrialProgress, TrialSession,
    judgment_for_key,
};
use minelab_protocol::{
    Ack, InteractionMode, MoveCommand, MoveReply, ProbePosition, Stimulus, TrialReport,
};
use wasm_bindgen::JsCast;
use web_sys::KeyboardEvent;
use yew::prelude::*;

use crate::api;
use crate::board::{BoardView, CellCommand, played_cells, scored_cells};
use crate::utils::{navigate_to, utc_now};

/// Total tries per request before the experiment gives up visibly.
const MAX_ATTEMPTS: u8 = 3;
const RETRY_DELAY_MS: u32 = 1_000;

/// How the participant reaches the next trial after feedback.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum AdvanceMode {
    /// Next trial starts after the inter-stimulus interval
    Timed,
    /// Next trial waits for the space key
    Manual,
}

#[derive(Args, Properties, Debug, Clone, PartialEq)]
pub(crate) struct ExperimentProps {
    /// How the next trial is reached after feedback
    #[arg(long, value_enum, default_value = "timed")]
    pub advance: AdvanceMode,

    /// Inter-stimulus interval in milliseconds
    #[arg(long, default_value_t = 900)]
    pub isi_ms: u32,

    /// Route opened once the last trial was submitted
    #[arg(long, default_value = "/survey")]
    pub survey_route: String,
}

pub(crate) enum Msg {
    Begin,
    StimulusReady(Result<Stimulus, String>),
    Key(String),
    Submit,
    Submitted(Result<Ack, String>),
    Advance,
    Cell(CellCommand),
    MoveDone(Result<MoveReply, String>),
    Retry,
}

/// Drives one trial after another: fetch, render, judge, score, submit,
/// advance. All per-trial state lives in the [`TrialSession`]; this
/// component only holds the phase and the wiring around it.
pub(crate) struct ExperimentView {
    phase: Phase,
    session: Option<TrialSession>,
    mode: InteractionMode,
    attempts: u8,
    move_in_flight: bool,
    last_move: Option<Coord2>,
    isi_timer: Option<Timeout>,
    retry_timer: Option<Timeout>,
    _keydown: EventListener,
}

impl ExperimentView {
    fn start_fetch(&mut self, ctx: &Context<Self>) {
        self.phase = Phase::Loading;
        ctx.link().send_future(async {
            Msg::StimulusReady(api::fetch_stimulus().await.map_err(|err| err.to_string()))
        });
    }

    fn start_submit(&mut self, ctx: &Context<Self>) {
        let Some(report) = self.session.as_ref().and_then(build_report) else {
            log::error!("no scored trial to submit");
            self.phase = Phase::Stalled;
            return;
        };
        self.phase = Phase::Submitting;
        ctx.link().send_future(async move {
            Msg::Submitted(api::post_report(&report).await.map_err(|err| err.to_string()))
        });
    }

    /// Bounded-retry policy for fetch/submit failures; after the last
    /// attempt the experiment stalls visibly instead of silently.
    fn retry_or_stall(&mut self, ctx: &Context<Self>) {
        if self.attempts >= MAX_ATTEMPTS {
            self.phase = Phase::Stalled;
            return;
        }
        let link = ctx.link().clone();
        self.retry_timer = Some(Timeout::new(RETRY_DELAY_MS, move || {
            link.send_message(Msg::Retry)
        }));
    }

    fn on_stimulus(&mut self, stimulus: Stimulus) {
        match start_session(&stimulus) {
            Ok(mut session) => {
                log::debug!(
                    "trial {:?} of {:?} loaded",
                    session.progress().trial_id,
                    session.progress().num_stimuli
                );
                session.mark_presented(utc_now());
                self.mode = stimulus.interaction_mode;
                self.session = Some(session);
                self.phase = Phase::AwaitingResponse;
                self.attempts = 0;
                self.last_move = None;
            }
            Err(err) => {
                // malformed data will not improve on retry
                log::error!("undecodable stimulus: {err}");
                self.phase = Phase::Stalled;
            }
        }
    }

    fn on_key(&mut self, ctx: &Context<Self>, key: &str) -> bool {
        if self.phase.accepts_judgment() {
            let Some(session) = self.session.as_mut() else {
                return false;
            };
            if let Some(response) = judgment_for_key(key) {
                if session.accept_judgment(response, utc_now()).is_some() {
                    self.phase = Phase::Scoring;
                    ctx.link().send_message(Msg::Submit);
                    return true;
                }
                return false;
            }
            if matches!(key, "s" | "S") {
                return session.toggle_solution();
            }
            return false;
        }

        if self.phase == Phase::Advancing
            && ctx.props().advance == AdvanceMode::Manual
            && key == " "
        {
            ctx.link().send_message(Msg::Advance);
        }
        false
    }

    fn on_submitted(&mut self, ctx: &Context<Self>, ack: Ack) -> bool {
        if !ack.success {
            // the backend refused the data; re-posting risks duplicate rows
            log::error!("backend rejected trial submission: {:?}", ack.message);
            self.phase = Phase::Stalled;
            return true;
        }

        self.attempts = 0;
        self.phase = Phase::Advancing;
        let decision = self
            .session
            .as_ref()
            .map_or(AdvanceDecision::NextTrial, TrialSession::advance_decision);
        match decision {
            AdvanceDecision::Finished => {
                self.phase = Phase::Complete;
                navigate_to(&ctx.props().survey_route);
            }
            AdvanceDecision::NextTrial => {
                if ctx.props().advance == AdvanceMode::Timed {
                    let link = ctx.link().clone();
                    self.isi_timer = Some(Timeout::new(ctx.props().isi_ms, move || {
                        link.send_message(Msg::Advance)
                    }));
                }
            }
        }
        true
    }

    fn on_move_reply(&mut self, reply: MoveReply) -> bool {
        self.move_in_flight = false;
        if !reply.result_is_truthy() {
            return false;
        }
        let Some(rows) = reply.game_state else {
            return false;
        };
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        match StateGrid::from_rows(&rows).and_then(|next| session.apply_move_state(next)) {
            Ok(()) => true,
            Err(err) => {
                log::error!("unusable move reply: {err}");
                false
            }
        }
    }

    fn view_banner(&self, ctx: &Context<Self>) -> Html {
        match self.phase {
            Phase::Stalled => html! {
                <p class="banner error">
                    {"Something went wrong talking to the server. Please reload the page."}
                </p>
            },
            Phase::Advancing if ctx.props().advance == AdvanceMode::Manual => html! {
                <p class="banner">{"Press space for the next round"}</p>
            },
            Phase::AwaitingResponse => html! {
                <p class="hint">
                    {"Press P if the highlighted cell hides a mine, Q if it does not."}
                </p>
            },
            _ => Html::default(),
        }
    }
}

impl Component for ExperimentView {
    type Message = Msg;
    type Properties = ExperimentProps;

    fn create(ctx: &Context<Self>) -> Self {
        // one persistent listener for the whole run; the phase decides
        // whether a key means anything
        let link = ctx.link().clone();
        let keydown = EventListener::new(&gloo::utils::document(), "keydown", move |event| {
            if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
                link.send_message(Msg::Key(event.key()));
            }
        });
        ctx.link().send_message(Msg::Begin);

        Self {
            phase: Phase::Idle,
            session: None,
            mode: InteractionMode::Disabled,
            attempts: 0,
            move_in_flight: false,
            last_move: None,
            isi_timer: None,
            retry_timer: None,
            _keydown: keydown,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Begin => {
                self.attempts = 1;
                self.start_fetch(ctx);
                true
            }
            Msg::StimulusReady(Ok(stimulus)) => {
                self.on_stimulus(stimulus);
                true
            }
            Msg::StimulusReady(Err(err)) => {
                log::error!("stimulus fetch failed: {err}");
                self.retry_or_stall(ctx);
                true
            }
            Msg::Key(key) => self.on_key(ctx, &key),
            Msg::Submit => {
                self.attempts = 1;
                self.start_submit(ctx);
                true
            }
            Msg::Submitted(Ok(ack)) => self.on_submitted(ctx, ack),
            Msg::Submitted(Err(err)) => {
                log::error!("trial submission failed: {err}");
                self.retry_or_stall(ctx);
                true
            }
            Msg::Advance => {
                self.isi_timer = None;
                self.attempts = 1;
                self.start_fetch(ctx);
                true
            }
            Msg::Cell(command) => {
                if !self.phase.accepts_judgment() || self.move_in_flight {
                    return false;
                }
                self.move_in_flight = true;
                self.last_move = Some(command.pos);
                let command = MoveCommand {
                    x: command.pos.0,
                    y: command.pos.1,
                    action: command.action,
                };
                ctx.link().send_future(async move {
                    Msg::MoveDone(api::post_move(&command).await.map_err(|err| err.to_string()))
                });
                false
            }
            Msg::MoveDone(Ok(reply)) => self.on_move_reply(reply),
            Msg::MoveDone(Err(err)) => {
                self.move_in_flight = false;
                log::error!("move request failed: {err}");
                false
            }
            Msg::Retry => {
                self.attempts += 1;
                match self.phase {
                    Phase::Loading => self.start_fetch(ctx),
                    Phase::Submitting => self.start_submit(ctx),
                    _ => {}
                }
                false
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let percent = self
            .session
            .as_ref()
            .map_or(0.0, |session| session.progress().percent());
        // the grid is only live while a judgment is still open
        let mode = if self.phase.accepts_judgment() {
            self.mode
        } else {
            InteractionMode::Disabled
        };
        let on_action = ctx.link().callback(Msg::Cell);

        let board = match self.session.as_ref() {
            Some(session) => {
                let cells = if session.judgment().is_some() {
                    scored_cells(session)
                } else {
                    played_cells(session.visible_state(), self.last_move)
                };
                html! { <BoardView {cells} {mode} {on_action}/> }
            }
            None => html! { <p class="loading">{"Loading…"}</p> },
        };

        html! {
            <div class="experiment">
                <progress max="100" value={format!("{percent:.0}")}/>
                { board }
                { self.view_banner(ctx) }
            </div>
        }
    }
}

fn start_session(stimulus: &Stimulus) -> minelab_core::Result<TrialSession> {
    let board = BoardGrid::from_rows(&stimulus.game_board)?;
    let state = StateGrid::from_rows(&stimulus.game_state)?;
    let solved = stimulus
        .game_state_solved
        .as_deref()
        .map(StateGrid::from_rows)
        .transpose()?;
    let progress = TrialProgress {
        trial_id: stimulus.trial_id,
        num_stimuli: stimulus.num_stimuli,
        server_percent: stimulus.progress_percent,
    };
    TrialSession::new(board, state, solved, progress)
}

fn build_report(session: &TrialSession) -> Option<TrialReport> {
    let judgment = session.judgment()?;
    Some(TrialReport {
        trial_id: session.progress().trial_id,
        game_board: session.board().to_rows(),
        game_state: session.state().to_rows(),
        probe_position: session.probe().map(|(x, y)| ProbePosition { x, y }),
        mine_present: session.mine_present(),
        user_response: judgment.user_response,
        response_correct: judgment.correct,
        reaction_time: judgment.reaction_time_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn t(millis: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(millis).unwrap()
    }

    fn stimulus() -> Stimulus {
        Stimulus {
            trial_id: Some(1),
            num_stimuli: Some(5),
            progress_percent: None,
            game_board: vec![vec![-1, 0], vec![0, 0]],
            game_state: vec![vec![-5, 0], vec![0, 0]],
            game_state_solved: None,
            interaction_mode: InteractionMode::Exploratory,
        }
    }

    #[test]
    fn sessions_decode_straight_from_the_wire_payload() {
        let session = start_session(&stimulus()).unwrap();
        assert_eq!(session.probe(), Some((0, 0)));
        assert!(session.mine_present());
        assert_eq!(session.progress().percent(), 20.0);
    }

    #[test]
    fn mismatched_payload_shapes_are_refused() {
        let mut bad = stimulus();
        bad.game_board = vec![vec![-1, 0]];
        assert!(start_session(&bad).is_err());
    }

    #[test]
    fn report_carries_the_scored_judgment_and_wire_grids() {
        let mut session = start_session(&stimulus()).unwrap();
        assert!(build_report(&session).is_none());

        session.mark_presented(t(0));
        session.accept_judgment(false, t(843)).unwrap();

        let report = build_report(&session).unwrap();
        assert_eq!(report.trial_id, Some(1));
        assert_eq!(report.game_board, vec![vec![-1, 0], vec![0, 0]]);
        assert_eq!(report.game_state, vec![vec![-5, 0], vec![0, 0]]);
        assert_eq!(report.probe_position, Some(ProbePosition { x: 0, y: 0 }));
        assert!(report.mine_present);
        assert!(!report.user_response);
        assert!(!report.response_correct);
        assert_eq!(report.reaction_time, 843);
    }
}
