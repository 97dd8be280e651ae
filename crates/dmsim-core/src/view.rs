//! Screen navigation state for a presentation layer.

use serde::{Deserialize, Serialize};

/// The screen currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ViewState {
    #[default]
    Home,
    Dms,
    Chat,
    Activity,
}

/// Modal overlays, toggled independently of the main view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overlay {
    /// Profile settings editor of the active thread.
    Settings,
    /// Activity item composer.
    ActivityComposer,
}

/// Current view plus open overlays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigator {
    view: ViewState,
    settings_open: bool,
    activity_composer_open: bool,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn show(&mut self, view: ViewState) {
        self.view = view;
    }

    /// Switches to the chat screen.
    pub fn open_thread(&mut self) {
        self.view = ViewState::Chat;
    }

    /// Chat goes back to the DM list, every other screen to home.
    pub fn back(&mut self) {
        self.view = match self.view {
            ViewState::Chat => ViewState::Dms,
            _ => ViewState::Home,
        };
    }

    pub fn open(&mut self, overlay: Overlay) {
        *self.flag(overlay) = true;
    }

    pub fn close(&mut self, overlay: Overlay) {
        *self.flag(overlay) = false;
    }

    pub fn is_open(&self, overlay: Overlay) -> bool {
        match overlay {
            Overlay::Settings => self.settings_open,
            Overlay::ActivityComposer => self.activity_composer_open,
        }
    }

    fn flag(&mut self, overlay: Overlay) -> &mut bool {
        match overlay {
            Overlay::Settings => &mut self.settings_open,
            Overlay::ActivityComposer => &mut self.activity_composer_open,
        }
    }
}
