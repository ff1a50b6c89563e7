use minelab_core::{Coord2, StateGrid};
use minelab_protocol::{GameBoot, InteractionMode, MoveCommand, MoveReply};
use yew::prelude::*;

use crate::api;
use crate::board::{BoardView, CellCommand, played_cells};
use crate::theme::Theme;

pub(crate) enum Msg {
    Cell(CellCommand),
    MoveDone(Result<MoveReply, String>),
    CycleTheme,
}

/// Free-play page: the backend embeds the starting grid in the document
/// and owns all game rules; this component only relays gestures to the
/// move endpoint and re-renders accepted replies.
pub(crate) struct PlaygroundView {
    grid: Option<StateGrid>,
    mode: InteractionMode,
    move_in_flight: bool,
    last_move: Option<Coord2>,
}

fn read_boot() -> Option<GameBoot> {
    let element = gloo::utils::document().get_element_by_id("initialState")?;
    let text = element.text_content()?;
    match serde_json::from_str(&text) {
        Ok(boot) => Some(boot),
        Err(err) => {
            log::error!("invalid bootstrap payload: {err}");
            None
        }
    }
}

impl Component for PlaygroundView {
    type Message = Msg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        let boot = read_boot();
        let mode = boot
            .as_ref()
            .map_or(InteractionMode::Disabled, |boot| boot.interaction_mode);
        let grid = boot.and_then(|boot| match StateGrid::from_rows(&boot.game_state) {
            Ok(grid) => Some(grid),
            Err(err) => {
                log::error!("undecodable starting grid: {err}");
                None
            }
        });
        Self {
            grid,
            mode,
            move_in_flight: false,
            last_move: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Cell(command) => {
                if self.move_in_flight {
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
            Msg::MoveDone(Ok(reply)) => {
                self.move_in_flight = false;
                if !reply.result_is_truthy() {
                    return false;
                }
                let Some(rows) = reply.game_state else {
                    return false;
                };
                match StateGrid::from_rows(&rows) {
                    Ok(grid) => {
                        self.grid = Some(grid);
                        true
                    }
                    Err(err) => {
                        log::error!("unusable move reply: {err}");
                        false
                    }
                }
            }
            Msg::MoveDone(Err(err)) => {
                self.move_in_flight = false;
                log::error!("move request failed: {err}");
                false
            }
            Msg::CycleTheme => {
                Theme::cycle();
                false
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let on_action = ctx.link().callback(Msg::Cell);
        let cb_theme = ctx.link().callback(|_| Msg::CycleTheme);

        let board = match self.grid.as_ref() {
            Some(grid) => {
                let cells = played_cells(grid, self.last_move);
                html! { <BoardView {cells} mode={self.mode} {on_action}/> }
            }
            None => html! { <p class="banner error">{"This page did not load a game."}</p> },
        };

        html! {
            <div class="playground">
                <small onclick={cb_theme}>{"◐"}</small>
                { board }
            </div>
        }
    }
}
