use std::ops::Range;

use xi_rope::delta::{Builder, DeltaElement};
use xi_rope::{Delta, Rope, RopeInfo};

/// Edits that can be applied to a cell's editing surface
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertText { at: usize, text: String },
    DeleteRange { range: Range<usize> },
    ReplaceRange { range: Range<usize>, text: String },
}

impl Cmd {
    /// Same command with every position clamped into `text` and moved down
    /// onto a character boundary.
    pub(crate) fn clamped(&self, text: &str) -> Cmd {
        let clamp_range = |range: &Range<usize>| {
            let start = snap_to_char_boundary(text, range.start);
            let end = snap_to_char_boundary(text, range.end.max(range.start));
            start..end
        };
        match self {
            Cmd::InsertText { at, text: insert } => Cmd::InsertText {
                at: snap_to_char_boundary(text, *at),
                text: insert.clone(),
            },
            Cmd::DeleteRange { range } => Cmd::DeleteRange {
                range: clamp_range(range),
            },
            Cmd::ReplaceRange { range, text: insert } => Cmd::ReplaceRange {
                range: clamp_range(range),
                text: insert.clone(),
            },
        }
    }

    /// Whether applying the command would leave the document as it is
    pub(crate) fn is_noop(&self) -> bool {
        match self {
            Cmd::InsertText { text, .. } => text.is_empty(),
            Cmd::DeleteRange { range } => range.is_empty(),
            Cmd::ReplaceRange { range, text } => range.is_empty() && text.is_empty(),
        }
    }
}

/// Clamp `pos` to `text` and move it down to the nearest character boundary.
pub fn snap_to_char_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Compile an already clamped command into a delta over `buffer`
pub(crate) fn compile_command(buffer: &Rope, cmd: &Cmd) -> Delta<RopeInfo> {
    let mut builder = Builder::new(buffer.len());
    match cmd {
        Cmd::InsertText { at, text } => {
            builder.replace(*at..*at, Rope::from(text));
        }
        Cmd::DeleteRange { range } => {
            builder.delete(range.clone());
        }
        Cmd::ReplaceRange { range, text } => {
            builder.replace(range.clone(), Rope::from(text));
        }
    }
    builder.build()
}

/// Byte ranges in the new document that hold inserted text
pub(crate) fn changed_ranges(delta: &Delta<RopeInfo>) -> Vec<Range<usize>> {
    let mut changed = Vec::new();
    let mut cursor = 0;
    for op in delta.els.iter() {
        match op {
            DeltaElement::Copy(from, to) => {
                cursor += to - from;
            }
            DeltaElement::Insert(inserted) => {
                let start = cursor;
                let end = cursor + inserted.len();
                changed.push(start..end);
                cursor = end;
            }
        }
    }
    changed
}

/// Where the cursor ends up after an already clamped command
pub(crate) fn transform_cursor(cursor: usize, cmd: &Cmd) -> usize {
    match cmd {
        Cmd::InsertText { at, text } => {
            if *at <= cursor {
                cursor + text.len()
            } else {
                cursor
            }
        }
        Cmd::DeleteRange { range } => {
            if range.end <= cursor {
                cursor - range.len()
            } else if range.start >= cursor {
                cursor
            } else {
                range.start
            }
        }
        Cmd::ReplaceRange { range, text } => {
            if range.end <= cursor {
                cursor - range.len() + text.len()
            } else if range.start >= cursor {
                cursor
            } else {
                range.start + text.len()
            }
        }
    }
}
