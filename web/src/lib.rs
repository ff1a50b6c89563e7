use clap::Parser;
use wasm_bindgen::prelude::*;

mod api;
mod board;
mod experiment;
mod playground;
mod theme;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    #[command(flatten)]
    experiment: experiment::ExperimentProps,
}

#[wasm_bindgen(start)]
pub fn run_app() {
    use gloo::utils::{document, window};

    #[cfg(feature = "console_error_panic_hook")]
    {
        console_error_panic_hook::set_once();
    }

    let location_hash = window()
        .location()
        .hash()
        .unwrap_or_else(|_| "".to_string());

    let args = Args::try_parse_from(location_hash.split(['#', '&'])).expect("Could not parse args");
    if let Some(log_level) = args.verbose.log_level() {
        console_log::init_with_level(log_level).expect("Error initializing logger");
    }

    theme::Theme::init();

    // the backend serves two pages; each carries one of these mount points
    if let Some(root) = document().get_element_by_id("experiment") {
        log::debug!("experiment page");
        yew::Renderer::<experiment::ExperimentView>::with_root_and_props(root, args.experiment)
            .render();
    } else if let Some(root) = document().get_element_by_id("game") {
        log::debug!("free-play page");
        yew::Renderer::<playground::PlaygroundView>::with_root(root).render();
    } else {
        panic!("Could not find an id=\"experiment\" or id=\"game\" element");
    }
}
