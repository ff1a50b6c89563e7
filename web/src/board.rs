use bitflags::bitflags;
use minelab_core::{Coord, Coord2, StateCell, StateGrid, TrialSession};
use minelab_protocol::{InteractionMode, MoveAction};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use yew::prelude::*;

/// What one cell shows on screen, after the trial phase is folded in.
///
/// The plain variants mirror the decoded state grid; the remaining ones
/// only appear while feedback is on screen.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum ViewCell {
    Hidden,
    Revealed(u8),
    Mine,
    TriggeredMine,
    Flagged,
    MarkedSafe,
    Probe,
    ProbeRight { on_mine: bool },
    ProbeWrong { on_mine: bool },
}

pub(crate) fn plain_cell(cell: StateCell) -> ViewCell {
    match cell {
        StateCell::Unrevealed => ViewCell::Hidden,
        StateCell::Revealed(count) => ViewCell::Revealed(count),
        StateCell::RevealedMine => ViewCell::Mine,
        StateCell::Flagged => ViewCell::Flagged,
        StateCell::MarkedSafe => ViewCell::MarkedSafe,
        StateCell::Probe => ViewCell::Probe,
    }
}

/// Feedback mapping: every mine is shown, and the probe cell carries the
/// verdict. Correct and incorrect differ by background family; the
/// tick/cross icon only appears when the probe cell is not itself a mine.
pub(crate) fn scored_cell(
    cell: StateCell,
    has_mine: bool,
    is_probe: bool,
    correct: bool,
) -> ViewCell {
    if is_probe {
        return if correct {
            ViewCell::ProbeRight { on_mine: has_mine }
        } else {
            ViewCell::ProbeWrong { on_mine: has_mine }
        };
    }
    if has_mine {
        return ViewCell::Mine;
    }
    plain_cell(cell)
}

pub(crate) fn plain_cells(state: &StateGrid) -> Array2<ViewCell> {
    state.cells().map(|&cell| plain_cell(cell))
}

/// Like [`plain_cells`], but the cell the last gesture landed on shows as
/// the triggered mine when it came back revealed-mine.
pub(crate) fn played_cells(state: &StateGrid, acted: Option<Coord2>) -> Array2<ViewCell> {
    let mut cells = plain_cells(state);
    if let Some(pos) = acted {
        let index = [usize::from(pos.0), usize::from(pos.1)];
        if let Some(cell) = cells.get_mut(index) {
            if *cell == ViewCell::Mine {
                *cell = ViewCell::TriggeredMine;
            }
        }
    }
    cells
}

pub(crate) fn scored_cells(session: &TrialSession) -> Array2<ViewCell> {
    let correct = session.judgment().is_some_and(|judgment| judgment.correct);
    let probe = session.probe();
    Array2::from_shape_fn(session.state().cells().raw_dim(), |(x, y)| {
        let pos = (x as Coord, y as Coord);
        scored_cell(
            session.state().cell_at(pos),
            session.board().mine_at(pos),
            probe == Some(pos),
            correct,
        )
    })
}

/// Class set for a cell; computed from scratch on every render, nothing
/// accumulates between calls.
pub(crate) fn cell_classes(cell: ViewCell) -> Classes {
    use ViewCell::*;

    classes!(
        "cell",
        match cell {
            Hidden => classes!(),
            Revealed(count) => classes!("open", format!("num-{}", count)),
            Mine => classes!("open", "mine"),
            TriggeredMine => classes!("open", "mine", "oops"),
            Flagged => classes!("flag"),
            MarkedSafe => classes!("safe"),
            Probe => classes!("probe"),
            ProbeRight { on_mine: true } => classes!("open", "mine", "right"),
            ProbeRight { on_mine: false } => classes!("open", "right", "tick"),
            ProbeWrong { on_mine: true } => classes!("open", "mine", "wrong"),
            ProbeWrong { on_mine: false } => classes!("open", "wrong", "cross"),
        }
    )
}

pub(crate) fn cell_text(cell: ViewCell) -> Option<String> {
    match cell {
        ViewCell::Revealed(count @ 1..=8) => Some(count.to_string()),
        _ => None,
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct MouseButtons: u16 {
        const LEFT    = 1;
        const RIGHT   = 1 << 1;
        const MIDDLE  = 1 << 2;
        const BACK    = 1 << 3;
        const FORWARD = 1 << 4;
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct CellPointerState {
    pos: Coord2,
    buttons: MouseButtons,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum CellMsg {
    Update(CellPointerState),
    Leave,
}

/// A gesture the board resolved into a backend action.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct CellCommand {
    pub pos: Coord2,
    pub action: MoveAction,
}

const fn primary_action(mode: InteractionMode) -> Option<MoveAction> {
    match mode {
        InteractionMode::Standard => Some(MoveAction::Reveal),
        InteractionMode::Exploratory => Some(MoveAction::MarkSafe),
        InteractionMode::Disabled => None,
    }
}

const fn secondary_action(mode: InteractionMode) -> Option<MoveAction> {
    match mode {
        InteractionMode::Standard | InteractionMode::Exploratory => Some(MoveAction::Flag),
        InteractionMode::Disabled => None,
    }
}

#[derive(Properties, Clone, PartialEq)]
struct CellProps {
    x: Coord,
    y: Coord,
    cell: ViewCell,
    callback: Callback<CellMsg>,
}

#[function_component(CellView)]
fn cell_component(props: &CellProps) -> Html {
    let CellProps { x, y, cell, callback } = props.clone();

    let class = cell_classes(cell);
    let text = cell_text(cell).unwrap_or_default();

    let onmousedown = {
        let callback = callback.clone();
        Callback::from(move |e: MouseEvent| {
            let buttons = MouseButtons::from_bits_truncate(e.buttons());
            callback.emit(CellMsg::Update(CellPointerState {
                pos: (x, y),
                buttons,
            }));
            log::trace!("({}, {}) mouse down ({:?})", x, y, buttons);
        })
    };

    let onmouseup = {
        let callback = callback.clone();
        Callback::from(move |e: MouseEvent| {
            let buttons = MouseButtons::from_bits_truncate(e.buttons());
            callback.emit(CellMsg::Update(CellPointerState {
                pos: (x, y),
                buttons,
            }));
            log::trace!("({}, {}) mouse up ({:?})", x, y, buttons);
        })
    };

    let onmouseleave = {
        let callback = callback.clone();
        Callback::from(move |_: MouseEvent| callback.emit(CellMsg::Leave))
    };

    html! {
        <td {class} {onmousedown} {onmouseup} {onmouseleave}>{ text }</td>
    }
}

#[derive(Properties, Clone, PartialEq)]
pub(crate) struct BoardProps {
    pub cells: Array2<ViewCell>,
    #[prop_or_default]
    pub mode: InteractionMode,
    #[prop_or_default]
    pub on_action: Callback<CellCommand>,
}

/// The grid itself. Owns the whole `<table>` and rebuilds it from props on
/// every render; pointer gestures resolve to backend actions on release.
pub(crate) struct BoardView {
    pressed: Option<CellPointerState>,
}

impl Component for BoardView {
    type Message = CellMsg;
    type Properties = BoardProps;

    fn create(_ctx: &Context<Self>) -> Self {
        Self { pressed: None }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            CellMsg::Leave => {
                self.pressed = None;
                false
            }
            CellMsg::Update(state) if state.buttons.is_empty() => {
                // all buttons released on this cell; the buttons held at
                // press time decide the action
                let Some(CellPointerState { pos, buttons }) = self.pressed.take() else {
                    return false;
                };
                let mode = ctx.props().mode;
                let action = match buttons {
                    MouseButtons::LEFT => primary_action(mode),
                    MouseButtons::RIGHT => secondary_action(mode),
                    _ => None,
                };
                if let Some(action) = action {
                    log::debug!("cell action at {:?}: {:?}", pos, action);
                    ctx.props().on_action.emit(CellCommand { pos, action });
                }
                false
            }
            CellMsg::Update(state) => {
                self.pressed = Some(state);
                false
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let cells = &ctx.props().cells;
        let (x_len, y_len) = cells.dim();
        let playable = ctx.props().mode.is_interactive();

        html! {
            <table
                class={classes!("board", playable.then_some("playable"))}
                oncontextmenu={Callback::from(|e: MouseEvent| e.prevent_default())}
            >
                {
                    for (0..x_len).map(|x| html! {
                        <tr>
                            {
                                for (0..y_len).map(|y| {
                                    let cell = cells[(x, y)];
                                    let callback = ctx.link().callback(|msg| msg);
                                    html! {
                                        <CellView
                                            x={x as Coord}
                                            y={y as Coord}
                                            {cell}
                                            {callback}
                                        />
                                    }
                                })
                            }
                        </tr>
                    })
                }
            </table>
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use minelab_core::{BoardGrid, TrialProgress};

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(0).unwrap()
    }

    fn judged_session(response: bool) -> TrialSession {
        let board = BoardGrid::from_rows(&[vec![-1, 0], vec![0, 0]]).unwrap();
        let state = StateGrid::from_rows(&[vec![-5, 0], vec![0, 0]]).unwrap();
        let mut session =
            TrialSession::new(board, state, None, TrialProgress::default()).unwrap();
        session.mark_presented(t0());
        session.accept_judgment(response, t0()).unwrap();
        session
    }

    #[test]
    fn class_mapping_is_idempotent() {
        let samples = [
            ViewCell::Hidden,
            ViewCell::Revealed(0),
            ViewCell::Revealed(5),
            ViewCell::Mine,
            ViewCell::Flagged,
            ViewCell::MarkedSafe,
            ViewCell::Probe,
            ViewCell::ProbeRight { on_mine: true },
            ViewCell::ProbeWrong { on_mine: false },
        ];
        for cell in samples {
            assert_eq!(cell_classes(cell), cell_classes(cell));
        }

        let grid = StateGrid::from_rows(&[vec![-5, 3], vec![-3, -1]]).unwrap();
        let first: Vec<Classes> = plain_cells(&grid).iter().map(|&c| cell_classes(c)).collect();
        let second: Vec<Classes> = plain_cells(&grid).iter().map(|&c| cell_classes(c)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn count_digits_render_and_blanks_stay_blank() {
        assert_eq!(cell_text(ViewCell::Revealed(3)), Some("3".to_string()));
        assert_eq!(cell_text(ViewCell::Revealed(0)), None);
        assert_eq!(cell_text(ViewCell::Mine), None);
        assert_eq!(cell_text(ViewCell::Probe), None);
    }

    #[test]
    fn wrong_judgment_on_a_mined_probe_shows_mine_and_negative_mark() {
        let session = judged_session(false);
        assert!(!session.judgment().unwrap().correct);

        let cells = scored_cells(&session);
        assert_eq!(cells[(0, 0)], ViewCell::ProbeWrong { on_mine: true });

        let class = cell_classes(cells[(0, 0)]);
        assert!(class.contains("mine"));
        assert!(class.contains("wrong"));
        assert!(!class.contains("cross"));
    }

    #[test]
    fn correct_judgment_off_mine_gets_the_tick_icon() {
        let board = BoardGrid::from_rows(&[vec![0, -1], vec![0, 0]]).unwrap();
        let state = StateGrid::from_rows(&[vec![-5, -1], vec![-1, -1]]).unwrap();
        let mut session =
            TrialSession::new(board, state, None, TrialProgress::default()).unwrap();
        session.mark_presented(t0());
        session.accept_judgment(false, t0()).unwrap();

        let cells = scored_cells(&session);
        assert_eq!(cells[(0, 0)], ViewCell::ProbeRight { on_mine: false });
        // the other mine is revealed no matter what covered it before
        assert_eq!(cells[(0, 1)], ViewCell::Mine);
        assert_eq!(cells[(1, 0)], ViewCell::Hidden);

        let class = cell_classes(cells[(0, 0)]);
        assert!(class.contains("right"));
        assert!(class.contains("tick"));
    }

    #[test]
    fn feedback_reveals_every_mine_regardless_of_prior_state() {
        let session = judged_session(true);
        let cells = scored_cells(&session);
        assert_eq!(cells[(0, 0)], ViewCell::ProbeRight { on_mine: true });
        assert_eq!(cells[(0, 1)], ViewCell::Revealed(0));
    }

    #[test]
    fn gesture_actions_follow_the_interaction_mode() {
        assert_eq!(
            primary_action(InteractionMode::Standard),
            Some(MoveAction::Reveal)
        );
        assert_eq!(
            primary_action(InteractionMode::Exploratory),
            Some(MoveAction::MarkSafe)
        );
        assert_eq!(primary_action(InteractionMode::Disabled), None);
        assert_eq!(
            secondary_action(InteractionMode::Standard),
            Some(MoveAction::Flag)
        );
        assert_eq!(secondary_action(InteractionMode::Disabled), None);
    }

    #[test]
    fn acted_upon_mine_is_singled_out() {
        let grid = StateGrid::from_rows(&[vec![-2, -2], vec![-1, 1]]).unwrap();

        let cells = played_cells(&grid, Some((0, 1)));
        assert_eq!(cells[(0, 0)], ViewCell::Mine);
        assert_eq!(cells[(0, 1)], ViewCell::TriggeredMine);
        assert!(cell_classes(cells[(0, 1)]).contains("oops"));

        // an acted-upon cell that is not a revealed mine stays as it is
        let cells = played_cells(&grid, Some((1, 1)));
        assert_eq!(cells[(1, 1)], ViewCell::Revealed(1));

        assert_eq!(played_cells(&grid, None), plain_cells(&grid));
    }

    #[test]
    fn plain_mapping_mirrors_the_decoded_state() {
        let grid = StateGrid::from_rows(&[vec![-5, -4, -3], vec![-2, 7, -1]]).unwrap();
        let cells = plain_cells(&grid);
        assert_eq!(cells[(0, 0)], ViewCell::Probe);
        assert_eq!(cells[(0, 1)], ViewCell::MarkedSafe);
        assert_eq!(cells[(0, 2)], ViewCell::Flagged);
        assert_eq!(cells[(1, 0)], ViewCell::Mine);
        assert_eq!(cells[(1, 1)], ViewCell::Revealed(7));
        assert_eq!(cells[(1, 2)], ViewCell::Hidden);
    }
}
