//! What the host shows: two controls and the reference / info-link regions.

use serde::Serialize;

pub const START_LABEL: &str = "Start";
pub const LOADING_LABEL: &str = "Loading...";
pub const IN_PROGRESS_LABEL: &str = "In Progress...";
pub const RESTART_LABEL: &str = "Restart";
pub const SEND_LABEL: &str = "Send";
pub const SENDING_LABEL: &str = "Sending...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Control {
    pub label: String,
    pub enabled: bool,
}

impl Control {
    fn set(&mut self, label: &str, enabled: bool) {
        self.label = label.to_string();
        self.enabled = enabled;
    }
}

/// A display region whose content is kept while it is hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Region {
    pub content: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Display {
    pub start: Control,
    pub finalize: Control,
    pub reference_number: Region,
    /// `content` holds the link target.
    pub info_link: Region,
    pub error: Option<String>,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            start: Control {
                label: START_LABEL.to_string(),
                enabled: true,
            },
            finalize: Control {
                label: SEND_LABEL.to_string(),
                enabled: false,
            },
            reference_number: Region::default(),
            info_link: Region::default(),
            error: None,
        }
    }
}

impl Display {
    pub fn loading(&mut self) {
        self.start.set(LOADING_LABEL, false);
        self.reference_number.visible = false;
        self.info_link.visible = false;
        self.error = None;
    }

    pub fn in_progress(&mut self) {
        self.start.set(IN_PROGRESS_LABEL, false);
    }

    pub fn ready_to_send(&mut self) {
        self.finalize.set(SEND_LABEL, true);
        self.error = None;
    }

    pub fn sending(&mut self) {
        self.finalize.set(SENDING_LABEL, false);
        self.error = None;
    }

    pub fn confirmed(&mut self, ref_number: &str, info_url: &str) {
        self.reference_number.content = ref_number.to_string();
        self.reference_number.visible = true;
        self.info_link.content = info_url.to_string();
        self.info_link.visible = true;
        self.finalize.set(SEND_LABEL, false);
        self.start.set(RESTART_LABEL, true);
    }

    /// Back to idle after a failed or abandoned start, with the label the start
    /// control had before loading.
    pub fn start_failed(&mut self, idle_label: &str, message: Option<String>) {
        self.start.set(idle_label, true);
        self.finalize.set(SEND_LABEL, false);
        self.error = message;
    }

    pub fn send_failed(&mut self, message: String) {
        self.finalize.set(SEND_LABEL, true);
        self.error = Some(message);
    }
}
