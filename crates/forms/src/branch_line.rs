use api_types::{BranchId, LineId, branch::Branch, line::Line};

use crate::{
    cascade::{Descendant, Level},
    error::FormError,
    notice::Notice,
    reference::Cached,
    session::restore_selection,
};

/// A single branch → line pair whose lines are filtered from the cached
/// line list.
#[derive(Debug, Clone)]
pub struct BranchLine {
    branches: Cached<Branch>,
    lines: Cached<Line>,
    branch: Level<Branch>,
    line: Level<Line>,
}

impl BranchLine {
    pub fn new(branches: Cached<Branch>, lines: Cached<Line>) -> Self {
        let branch = branches.root_level("branch");
        Self {
            branches,
            lines,
            branch,
            line: Level::new("line"),
        }
    }

    /// Selects (or clears) the branch. A different branch clears the line.
    pub fn select_branch(&mut self, id: Option<BranchId>) -> Result<bool, FormError> {
        let changed = match id {
            Some(id) => self.branch.select(id)?,
            None => self.branch.clear_selection(),
        };
        if changed {
            let selected = self.branch.selected().copied();
            self.lines
                .fill_children(&mut self.line, selected.as_ref(), |line| Some(line.branch_id));
        }
        Ok(changed)
    }

    pub fn select_line(&mut self, id: Option<LineId>) -> Result<bool, FormError> {
        match id {
            Some(id) => self.line.select(id),
            None => Ok(self.line.clear_selection()),
        }
    }

    /// Selects a branch and line pair by id, as loaded from a record.
    /// Ids that are missing or not offered leave their level unselected.
    pub fn restore(&mut self, branch: Option<BranchId>, line: Option<LineId>, notices: &mut Vec<Notice>) {
        if let Err(err) = self.select_branch(branch) {
            self.reset();
            restore_selection::<bool>(Err(err), notices);
            return;
        }
        if self.branch().is_some() {
            restore_selection(self.select_line(line), notices);
        }
    }

    pub fn reset(&mut self) {
        self.branch.clear_selection();
        self.line.invalidate();
    }

    pub fn branch(&self) -> Option<BranchId> {
        self.branch.selected().copied()
    }

    pub fn line(&self) -> Option<LineId> {
        self.line.selected().copied()
    }

    pub fn branch_level(&self) -> &Level<Branch> {
        &self.branch
    }

    pub fn line_level(&self) -> &Level<Line> {
        &self.line
    }

    pub fn branches(&self) -> &Cached<Branch> {
        &self.branches
    }

    pub fn lines(&self) -> &Cached<Line> {
        &self.lines
    }

    /// Names of the selected pair, for payloads that carry names.
    pub fn names(&self) -> (Option<&str>, Option<&str>) {
        let branch = self.branch.selected_option().map(|b| b.branch_name.as_str());
        let line = self.line.selected_option().map(|l| l.line_name.as_str());
        (branch, line)
    }
}
