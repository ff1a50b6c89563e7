use serde::{Deserialize, Serialize};

use crate::utils::*;

/// Color-scheme override; no stored preference means "follow the system".
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub const ATTR_NAME: &'static str = "data-theme";

    pub(crate) const fn scheme(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    fn update_html(theme: Option<Self>) {
        use gloo::utils::document;
        let html = document()
            .query_selector("html")
            .expect("query must be correct")
            .expect("must have html element");
        match theme {
            Some(theme) => {
                if let Err(err) = html.set_attribute(Self::ATTR_NAME, theme.scheme()) {
                    log::error!("failed to set theme: {:?}", err);
                }
            }
            None => {
                if let Err(err) = html.remove_attribute(Self::ATTR_NAME) {
                    log::error!("failed to clear theme: {:?}", err);
                }
            }
        }
    }

    pub(crate) fn init() {
        Self::update_html(LocalOrDefault::local_or_default());
    }

    /// Cycles system -> light -> dark -> system and persists the choice.
    pub(crate) fn cycle() {
        let next = match Option::<Self>::local_or_default() {
            None => Some(Self::Light),
            Some(Self::Light) => Some(Self::Dark),
            Some(Self::Dark) => None,
        };
        log::debug!("theme-scheme: {:?}", next.map(Self::scheme));
        next.local_save();
        Self::update_html(next);
    }
}

impl StorageKey for Theme {
    const KEY: &'static str = "minelab:theme";
}
