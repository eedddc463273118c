//! User-facing notices collected during controller operations.
//!
//! The controller never touches the UI directly; it appends notices to
//! the bus and the embedding drains them after each dispatch.

use std::mem;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct NoticeBus {
    pending: Vec<Notice>,
}

impl NoticeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.pending.push(Notice {
            level,
            message: message.into(),
        });
    }

    /// Takes all pending notices, leaving the bus empty.
    pub fn drain(&mut self) -> Vec<Notice> {
        mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
