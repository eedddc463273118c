//! Typed command bus between the UI shell and the controller.
//!
//! The UI never mutates controller state directly; toolbar buttons and
//! the attribute panel send [`MapCommand`]s over an unbounded channel
//! and the controller handles them in order on its own task.

use serde_json::{Map, Value};
use tokio::sync::mpsc;

/// Interaction mode of the draw surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawMode {
    #[default]
    SimpleSelect,
    DirectSelect,
    DrawPolygon,
}

#[derive(Clone, Debug)]
pub enum MapCommand {
    /// Switch the draw surface into the given interaction mode.
    StartDraw(DrawMode),
    /// Merge attribute-panel edits into the pending selection.
    UpdateAttributes(Map<String, Value>),
    /// Persist the selected (or first drawn) feature.
    Save,
    /// Delete the selected feature upstream.
    DeleteSelection,
    /// Discard local edits and reload from upstream.
    CancelEdits,
}

#[derive(Clone, Debug)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<MapCommand>,
}

impl CommandSender {
    /// Returns false when the controller side has shut down.
    pub fn send(&self, command: MapCommand) -> bool {
        self.tx.send(command).is_ok()
    }
}

pub type CommandReceiver = mpsc::UnboundedReceiver<MapCommand>;

pub fn command_channel() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandSender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn commands_arrive_in_order() {
        let (tx, mut rx) = command_channel();
        assert!(tx.send(MapCommand::StartDraw(DrawMode::DrawPolygon)));
        assert!(tx.send(MapCommand::Save));

        match rx.recv().await {
            Some(MapCommand::StartDraw(DrawMode::DrawPolygon)) => {}
            other => panic!("unexpected command: {other:?}"),
        }
        match rx.recv().await {
            Some(MapCommand::Save) => {}
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_fails_after_receiver_drop() {
        let (tx, rx) = command_channel();
        drop(rx);
        assert!(!tx.send(MapCommand::Save));
    }
}
