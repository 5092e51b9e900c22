//! Undo/redo history.
//!
//! Every mutation of a table goes through [`History::execute`], which validates
//! the edit, applies it, and keeps the resulting [`Command`] so it can be
//! reverted. Undo and redo are strict LIFO; commands are never merged.

mod command;

pub use command::{Command, Edit};

use std::collections::VecDeque;

use crate::error::EditError;
use crate::table::Table;
use crate::validate::Validator;

/// Applied and undone command stacks for one table.
#[derive(Debug, Clone)]
pub struct History {
    applied: VecDeque<Command>,
    undone: Vec<Command>,
    limit: Option<usize>,
    /// Length of `applied` at the last save, or `None` once that state is unreachable.
    saved_at: Option<usize>,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self {
            applied: VecDeque::new(),
            undone: Vec::new(),
            limit: None,
            saved_at: Some(0),
        }
    }

    /// A history that keeps at most `limit` applied commands, dropping the oldest.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::new()
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Validate and apply an edit, recording it for undo.
    ///
    /// Clears the redo stack and returns the new command's label. On error the
    /// table and history are unchanged.
    pub fn execute(
        &mut self,
        table: &mut Table,
        validator: &Validator,
        edit: Edit,
    ) -> Result<String, EditError> {
        let command = match edit.execute(table, validator) {
            Ok(command) => command,
            Err(err) => {
                tracing::warn!(error = %err, "Edit rejected");
                return Err(err);
            }
        };
        let label = command.label();
        tracing::debug!(label = %label, "Applied edit");

        if self.saved_at.is_some_and(|at| at > self.applied.len()) {
            self.saved_at = None;
        }
        self.undone.clear();
        self.applied.push_back(command);

        if let Some(limit) = self.limit
            && self.applied.len() > limit
        {
            self.applied.pop_front();
            self.saved_at = self.saved_at.and_then(|at| at.checked_sub(1));
        }

        Ok(label)
    }

    /// Revert the most recent command. Returns its label.
    pub fn undo(&mut self, table: &mut Table) -> Result<String, EditError> {
        let command = self.applied.pop_back().ok_or(EditError::NothingToUndo)?;
        if let Err(err) = command.revert(table) {
            self.applied.push_back(command);
            return Err(err.into());
        }
        let label = command.label();
        tracing::debug!(label = %label, "Undid edit");
        self.undone.push(command);
        Ok(label)
    }

    /// Re-apply the most recently undone command. Returns its label.
    pub fn redo(&mut self, table: &mut Table) -> Result<String, EditError> {
        let command = self.undone.pop().ok_or(EditError::NothingToRedo)?;
        if let Err(err) = command.apply(table) {
            self.undone.push(command);
            return Err(err.into());
        }
        let label = command.label();
        tracing::debug!(label = %label, "Redid edit");
        self.applied.push_back(command);
        Ok(label)
    }

    pub fn can_undo(&self) -> bool {
        !self.applied.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.applied.len()
    }

    pub fn redo_len(&self) -> usize {
        self.undone.len()
    }

    pub fn undo_label(&self) -> Option<String> {
        self.applied.back().map(Command::label)
    }

    pub fn redo_label(&self) -> Option<String> {
        self.undone.last().map(Command::label)
    }

    /// Remember the current position as matching what is on disk.
    pub fn mark_saved(&mut self) {
        self.saved_at = Some(self.applied.len());
    }

    /// True when the table differs from the last save point.
    pub fn is_dirty(&self) -> bool {
        self.saved_at != Some(self.applied.len())
    }

    /// Drop all commands. The current state becomes the save point.
    pub fn clear(&mut self) {
        self.applied.clear();
        self.undone.clear();
        self.saved_at = Some(0);
    }
}
