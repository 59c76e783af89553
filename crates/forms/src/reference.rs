//! Reference data: the flat dropdown lists every form starts from.
use std::future::Future;

use api_types::{
    BranchId, LineId,
    branch::Branch,
    expense_type::ExpenseType,
    line::Line,
    user::{User, UserQuery},
};

use crate::{
    backend::Backend,
    cascade::{Descendant, Keyed, Level},
    error::BackendError,
    filter::{filter_children, filter_children_any},
    notice::Notice,
};

pub type Fetched<T> = Result<Vec<T>, BackendError>;

/// Which lists a form needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Wants {
    pub branches: bool,
    pub lines: bool,
    pub users: bool,
    pub expense_types: bool,
}

impl Wants {
    pub const BRANCHES_AND_LINES: Wants = Wants {
        branches: true,
        lines: true,
        users: false,
        expense_types: false,
    };
}

#[derive(Debug)]
pub struct ReferenceSet {
    pub branches: Fetched<Branch>,
    pub lines: Fetched<Line>,
    pub users: Fetched<User>,
    pub expense_types: Fetched<ExpenseType>,
}

impl Default for ReferenceSet {
    fn default() -> Self {
        Self {
            branches: Ok(Vec::new()),
            lines: Ok(Vec::new()),
            users: Ok(Vec::new()),
            expense_types: Ok(Vec::new()),
        }
    }
}

/// Fetches the wanted lists concurrently. None of them depends on another,
/// so a failure only affects its own list.
pub async fn fetch_reference<B: Backend>(backend: &B, wants: Wants) -> ReferenceSet {
    let every_user = UserQuery::default();
    let (branches, lines, users, expense_types) = tokio::join!(
        wanted(wants.branches, backend.branches()),
        wanted(wants.lines, backend.lines()),
        wanted(wants.users, backend.users(&every_user)),
        wanted(wants.expense_types, backend.expense_types()),
    );
    ReferenceSet {
        branches,
        lines,
        users,
        expense_types,
    }
}

async fn wanted<T, F>(wanted: bool, fetch: F) -> Fetched<T>
where
    F: Future<Output = Fetched<T>>,
{
    if wanted { fetch.await } else { Ok(Vec::new()) }
}

/// A reference list kept for local filtering, remembering whether it failed
/// to load.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    items: Vec<T>,
    error: Option<String>,
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            error: None,
        }
    }
}

impl<T> Cached<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, error: None }
    }

    /// Keeps a fetch result. A failure becomes an empty list plus an error
    /// notice; nothing is retried.
    pub fn load(what: &'static str, fetched: Fetched<T>, notices: &mut Vec<Notice>) -> Self {
        match fetched {
            Ok(items) => {
                tracing::debug!(list = what, count = items.len(), "reference list loaded");
                Self::new(items)
            }
            Err(err) => {
                tracing::warn!(list = what, "reference list failed to load: {err}");
                notices.push(Notice::error("Error", format!("Failed to load {what}.")));
                Self {
                    items: Vec::new(),
                    error: Some(format!("failed to load {what}: {err}")),
                }
            }
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Keeps only the items matching `keep`.
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.items.retain(keep);
    }
}

impl<T: Keyed + Clone> Cached<T> {
    /// A top level offering every cached item.
    pub fn root_level(&self, label: &'static str) -> Level<T> {
        let mut level = Level::new(label);
        match &self.error {
            Some(err) => level.fail(err.clone()),
            None => level.fill(self.items.clone()),
        }
        level
    }

    /// Re-derives `level` as the children of `parent`.
    pub fn fill_children<K, F>(&self, level: &mut Level<T>, parent: Option<&K>, parent_key: F)
    where
        K: PartialEq,
        F: Fn(&T) -> Option<K>,
    {
        if parent.is_none() {
            level.invalidate();
            return;
        }
        level.parent_selected();
        match &self.error {
            Some(err) => level.fail(err.clone()),
            None => level.fill(
                filter_children(parent, &self.items, parent_key)
                    .into_iter()
                    .cloned()
                    .collect(),
            ),
        }
    }

    /// Re-derives `level` as the children of any of `parents`.
    pub fn fill_children_any<K, F>(&self, level: &mut Level<T>, parents: &[K], parent_key: F)
    where
        K: PartialEq,
        F: Fn(&T) -> Option<K>,
    {
        if parents.is_empty() {
            level.invalidate();
            return;
        }
        level.parent_selected();
        match &self.error {
            Some(err) => level.fail(err.clone()),
            None => level.fill(
                filter_children_any(parents, &self.items, parent_key)
                    .into_iter()
                    .cloned()
                    .collect(),
            ),
        }
    }
}

impl Cached<Branch> {
    pub fn get(&self, id: BranchId) -> Option<&Branch> {
        self.items.iter().find(|branch| branch.id == id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Branch> {
        self.items.iter().find(|branch| branch.branch_name == name)
    }
}

impl Cached<Line> {
    pub fn get(&self, id: LineId) -> Option<&Line> {
        self.items.iter().find(|line| line.line_id == id)
    }

    /// Line names are only unique within a branch; `branch` narrows the
    /// search when known.
    pub fn by_name(&self, name: &str, branch: Option<BranchId>) -> Option<&Line> {
        self.items
            .iter()
            .find(|line| line.line_name == name && branch.is_none_or(|id| line.branch_id == id))
    }

    pub fn of_branch(&self, branch: BranchId) -> impl Iterator<Item = &Line> {
        self.items.iter().filter(move |line| line.branch_id == branch)
    }
}

#[cfg(test)]
mod tests {
    use crate::cascade::CascadeState;

    use super::*;

    fn line(id: i64, name: &str, branch: i64) -> Line {
        Line {
            line_id: LineId(id),
            line_name: name.to_string(),
            branch_id: BranchId(branch),
            branch_name: format!("B{branch}"),
        }
    }

    #[test]
    fn failed_load_yields_notice_and_disabled_levels() {
        let mut notices = Vec::new();
        let cached: Cached<Branch> = Cached::load(
            "branches",
            Err(BackendError::Transport("refused".to_string())),
            &mut notices,
        );
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_error());
        let level = cached.root_level("branch");
        assert!(level.is_disabled());
        assert!(level.options().is_empty());
    }

    #[test]
    fn fill_children_filters_cached_lines() {
        let cached = Cached::new(vec![line(1, "A", 1), line(2, "B", 2), line(3, "C", 1)]);
        let mut level = Level::new("line");
        cached.fill_children(&mut level, Some(&BranchId(1)), |l: &Line| Some(l.branch_id));
        assert_eq!(level.state(), CascadeState::ChildrenReady);
        assert_eq!(level.options().len(), 2);

        cached.fill_children(&mut level, None::<&BranchId>, |l: &Line| Some(l.branch_id));
        assert_eq!(level.state(), CascadeState::NoParentSelected);
        assert!(level.options().is_empty());
    }

    #[test]
    fn line_lookup_by_name_respects_branch() {
        let cached = Cached::new(vec![line(1, "Main", 1), line(2, "Main", 2)]);
        assert_eq!(cached.by_name("Main", Some(BranchId(2))).map(|l| l.line_id), Some(LineId(2)));
        assert_eq!(cached.by_name("Main", None).map(|l| l.line_id), Some(LineId(1)));
        assert_eq!(cached.of_branch(BranchId(1)).count(), 1);
    }
}
