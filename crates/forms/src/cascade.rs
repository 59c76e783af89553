//! Cascading dependent selections.
//!
//! A form is a chain of [`Level`]s (branch → line → user, branch → line →
//! expense mapping). Each level owns its option list and its current
//! selection and tracks where it stands with respect to its parent:
//!
//! ```text
//! NoParentSelected --parent_selected--> ParentSelected
//! ParentSelected   --begin_fetch------> ChildrenLoading --resolve--> ChildrenReady
//! ParentSelected   --fill-------------> ChildrenReady
//! any              --invalidate-------> NoParentSelected
//! ```
//!
//! Every transition that changes the parent bumps the level's generation.
//! A fetch started for a level carries a [`Ticket`] stamped with the
//! generation it was started in, and [`Level::resolve`] drops results whose
//! ticket no longer matches: a response for a superseded parent never
//! reaches the options.
use std::fmt;

use api_types::{
    BranchId, ExpenseTypeId, LineId, UserId, branch::Branch, expense_type::ExpenseType, line::Line,
    user::User,
};

use crate::error::FormError;

/// An option that can be selected by its stable id.
pub trait Keyed {
    type Key: Clone + PartialEq + fmt::Debug + fmt::Display;

    fn key(&self) -> Self::Key;
}

impl Keyed for Branch {
    type Key = BranchId;

    fn key(&self) -> BranchId {
        self.id
    }
}

impl Keyed for Line {
    type Key = LineId;

    fn key(&self) -> LineId {
        self.line_id
    }
}

impl Keyed for User {
    type Key = UserId;

    fn key(&self) -> UserId {
        self.id
    }
}

impl Keyed for ExpenseType {
    type Key = ExpenseTypeId;

    fn key(&self) -> ExpenseTypeId {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeState {
    NoParentSelected,
    ParentSelected,
    ChildrenLoading,
    ChildrenReady,
}

/// Proof that a fetch was started for a given generation of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a ticket is needed to apply the fetched options"]
pub struct Ticket {
    generation: u64,
}

/// Anything below a changed selection that must be reset.
pub trait Descendant {
    fn invalidate(&mut self);
}

/// Invalidates every level in `levels`; used when a selection at level N
/// changes and levels N+2.. must be dropped along with N+1.
pub fn invalidate_all(levels: &mut [&mut dyn Descendant]) {
    for level in levels.iter_mut() {
        level.invalidate();
    }
}

#[derive(Debug, Clone)]
pub struct Level<T: Keyed> {
    label: &'static str,
    options: Vec<T>,
    selection: Vec<T::Key>,
    state: CascadeState,
    generation: u64,
    error: Option<String>,
}

impl<T: Keyed> Level<T> {
    /// A dependent level waiting for its parent.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            options: Vec::new(),
            selection: Vec::new(),
            state: CascadeState::NoParentSelected,
            generation: 0,
            error: None,
        }
    }

    /// A top level whose options do not depend on anything.
    pub fn root(label: &'static str, options: Vec<T>) -> Self {
        let mut level = Self::new(label);
        level.fill(options);
        level
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn state(&self) -> CascadeState {
        self.state
    }

    pub fn options(&self) -> &[T] {
        &self.options
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// A level can only be picked from once its options are ready and
    /// loaded without error.
    pub fn is_disabled(&self) -> bool {
        self.state != CascadeState::ChildrenReady || self.error.is_some()
    }

    /// Single selection, for levels that hold at most one value.
    pub fn selected(&self) -> Option<&T::Key> {
        self.selection.first()
    }

    /// The selected option itself.
    pub fn selected_option(&self) -> Option<&T> {
        let key = self.selected()?;
        self.options.iter().find(|option| option.key() == *key)
    }

    pub fn selection(&self) -> &[T::Key] {
        &self.selection
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.options.iter().any(|option| option.key() == *key)
    }

    /// The parent changed: drop the selection and the stale options.
    pub fn parent_selected(&mut self) {
        self.reset(CascadeState::ParentSelected);
    }

    /// Starts loading the options for the current parent.
    pub fn begin_fetch(&mut self) -> Ticket {
        self.generation += 1;
        self.options.clear();
        self.selection.clear();
        self.error = None;
        self.state = CascadeState::ChildrenLoading;
        Ticket {
            generation: self.generation,
        }
    }

    /// Whether results fetched under `ticket` still apply.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.generation == self.generation && self.state == CascadeState::ChildrenLoading
    }

    /// Applies a fetch result. Returns `false` (and changes nothing) when the
    /// ticket was superseded by a newer parent selection.
    pub fn resolve<E: fmt::Display>(&mut self, ticket: Ticket, result: Result<Vec<T>, E>) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                level = self.label,
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale options"
            );
            return false;
        }
        match result {
            Ok(options) => {
                self.options = options;
                self.error = None;
            }
            Err(err) => {
                self.options.clear();
                self.error = Some(err.to_string());
            }
        }
        self.state = CascadeState::ChildrenReady;
        true
    }

    /// Replaces the options with an already available (locally filtered)
    /// list, skipping the loading state.
    pub fn fill(&mut self, options: Vec<T>) {
        self.reset(CascadeState::ChildrenReady);
        self.options = options;
    }

    /// Marks the level as failed: no options, disabled, with `reason`.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.reset(CascadeState::ChildrenReady);
        self.error = Some(reason.into());
    }

    /// Selects one option, replacing any previous selection. Returns whether
    /// the selection changed.
    pub fn select(&mut self, key: T::Key) -> Result<bool, FormError> {
        self.ensure_selectable(&key)?;
        if self.selection.len() == 1 && self.selection[0] == key {
            return Ok(false);
        }
        self.selection = vec![key];
        Ok(true)
    }

    /// Selects several options (multi-select). Duplicates are dropped and
    /// the given order is kept. Returns whether the selection changed.
    pub fn select_many(&mut self, keys: Vec<T::Key>) -> Result<bool, FormError> {
        let mut selection: Vec<T::Key> = Vec::with_capacity(keys.len());
        for key in keys {
            self.ensure_selectable(&key)?;
            if !selection.contains(&key) {
                selection.push(key);
            }
        }
        if selection == self.selection {
            return Ok(false);
        }
        self.selection = selection;
        Ok(true)
    }

    /// Returns whether there was something to clear.
    pub fn clear_selection(&mut self) -> bool {
        let had = !self.selection.is_empty();
        self.selection.clear();
        had
    }

    fn ensure_selectable(&self, key: &T::Key) -> Result<(), FormError> {
        if let Some(reason) = &self.error {
            return Err(FormError::Disabled {
                level: self.label,
                reason: reason.clone(),
            });
        }
        if self.state != CascadeState::ChildrenReady {
            return Err(FormError::Disabled {
                level: self.label,
                reason: "no parent selected".to_string(),
            });
        }
        if !self.contains(key) {
            return Err(FormError::NotAnOption {
                level: self.label,
                key: key.to_string(),
            });
        }
        Ok(())
    }

    fn reset(&mut self, state: CascadeState) {
        self.generation += 1;
        self.options.clear();
        self.selection.clear();
        self.error = None;
        self.state = state;
    }
}

impl<T: Keyed> Descendant for Level<T> {
    fn invalidate(&mut self) {
        self.reset(CascadeState::NoParentSelected);
    }
}
