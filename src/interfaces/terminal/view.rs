use crate::domain::display::{Control, Display};
use crate::domain::ports::View;
use async_trait::async_trait;
use std::io::Write;
use tokio::sync::Mutex;
use tracing::warn;

struct Screen<W> {
    out: W,
    shown: Option<Display>,
}

/// Prints what changed in the display since the previous render.
pub struct TerminalView<W: Write + Send> {
    screen: Mutex<Screen<W>>,
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            screen: Mutex::new(Screen { out, shown: None }),
        }
    }

    /// Consumes the view and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.screen.into_inner().out
    }
}

fn control_line(name: &str, control: &Control) -> String {
    let state = if control.enabled { "enabled" } else { "disabled" };
    format!("{name}: {} ({state})", control.label)
}

/// Lines describing the transition from `before` to `after`.
fn changes(before: Option<&Display>, after: &Display) -> Vec<String> {
    let mut lines = Vec::new();
    if before.map(|d| &d.start) != Some(&after.start) {
        lines.push(control_line("start", &after.start));
    }
    if before.map(|d| &d.finalize) != Some(&after.finalize) {
        lines.push(control_line("send", &after.finalize));
    }
    if after.reference_number.visible
        && before.map(|d| &d.reference_number) != Some(&after.reference_number)
    {
        lines.push(format!("reference number: {}", after.reference_number.content));
    }
    if after.info_link.visible && before.map(|d| &d.info_link) != Some(&after.info_link) {
        lines.push(format!("more info: {}", after.info_link.content));
    }
    if let Some(error) = &after.error
        && before.and_then(|d| d.error.as_ref()) != Some(error)
    {
        lines.push(format!("error: {error}"));
    }
    lines
}

#[async_trait]
impl<W: Write + Send> View for TerminalView<W> {
    async fn render(&self, display: &Display) {
        let mut screen = self.screen.lock().await;
        let lines = changes(screen.shown.as_ref(), display);
        for line in lines {
            if let Err(e) = writeln!(screen.out, "{line}") {
                warn!(error = %e, "failed to write to terminal");
                break;
            }
        }
        if let Err(e) = screen.out.flush() {
            warn!(error = %e, "failed to flush terminal");
        }
        screen.shown = Some(display.clone());
    }
}
