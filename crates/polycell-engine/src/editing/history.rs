use xi_rope::Rope;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Document and cursor as they were before an edit
#[derive(Debug, Clone)]
pub struct Step {
    pub document: Rope,
    pub cursor: usize,
}

/// Bounded undo/redo stacks for one editor.
///
/// Ropes share structure, so keeping whole documents per step is cheap.
#[derive(Debug, Clone)]
pub struct History {
    undo: Vec<Step>,
    redo: Vec<Step>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            limit,
        }
    }

    /// Empty history with the same limit
    pub fn restarted(&self) -> Self {
        Self::new(self.limit)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Remember the state before an edit. Clears the redo stack.
    pub fn record(&mut self, step: Step) {
        self.redo.clear();
        if self.limit == 0 {
            return;
        }
        if self.undo.len() == self.limit {
            self.undo.remove(0);
        }
        self.undo.push(step);
    }

    /// Step back from `current`, which becomes redoable.
    pub fn undo(&mut self, current: Step) -> Option<Step> {
        let previous = self.undo.pop()?;
        self.redo.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: Step) -> Option<Step> {
        let next = self.redo.pop()?;
        self.undo.push(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty() && self.redo.is_empty()
    }
}
