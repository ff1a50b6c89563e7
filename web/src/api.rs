use anyhow::{Result, bail};
use gloo::net::http::Request;
use minelab_protocol::{Ack, MoveCommand, MoveReply, Stimulus, TrialReport};

const STIMULUS_URL: &str = "/get_stimulus";
const RESPONSE_URL: &str = "/send_response";
const MOVE_URL: &str = "/move";

pub(crate) async fn fetch_stimulus() -> Result<Stimulus> {
    let response = Request::get(STIMULUS_URL).send().await?;
    if !response.ok() {
        bail!("stimulus request failed with status {}", response.status());
    }
    Ok(response.json().await?)
}

pub(crate) async fn post_move(command: &MoveCommand) -> Result<MoveReply> {
    let response = Request::post(MOVE_URL).json(command)?.send().await?;
    if !response.ok() {
        bail!("move request failed with status {}", response.status());
    }
    Ok(response.json().await?)
}

pub(crate) async fn post_report(report: &TrialReport) -> Result<Ack> {
    let response = Request::post(RESPONSE_URL).json(report)?.send().await?;
    if !response.ok() {
        bail!("trial submission failed with status {}", response.status());
    }
    Ok(response.json().await?)
}
