//! Reset a user's password: branch → line → user, then the new password.
//!
//! Lines and users are fetched as the selection moves down. Each fetch is
//! started with [`Level::begin_fetch`] and applied with the ticket it
//! returned, so an answer for a branch or line that is no longer selected
//! is dropped.
use api_types::{
    BranchId, LineId, UserId,
    branch::Branch,
    line::Line,
    user::{ResetPassword, User, UserQuery},
};

use crate::{
    backend::Backend,
    cascade::{Descendant, Level, Ticket, invalidate_all},
    error::{BackendError, FormError, ValidationErrors},
    filter::filter_children,
    gateway::server_detail,
    notice::Notice,
    reference::{Cached, ReferenceSet, Wants, fetch_reference},
    session::SubmissionState,
    validate::{MIN_PASSWORD_LEN, Validator},
};

const WANTS: Wants = Wants {
    branches: true,
    lines: false,
    users: false,
    expense_types: false,
};

/// What the operator confirms before the reset is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetSummary {
    pub branch_name: String,
    pub line_name: String,
    pub user: UserId,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct ResetPasswordForm {
    branch: Level<Branch>,
    line: Level<Line>,
    user: Level<User>,
    password: String,
    confirm_password: String,
    state: SubmissionState,
    notices: Vec<Notice>,
}

impl ResetPasswordForm {
    pub fn new(reference: ReferenceSet) -> Self {
        let mut notices = Vec::new();
        let branches = Cached::load("branches", reference.branches, &mut notices);
        Self {
            branch: branches.root_level("branch"),
            line: Level::new("line"),
            user: Level::new("user"),
            password: String::new(),
            confirm_password: String::new(),
            state: SubmissionState::Idle,
            notices,
        }
    }

    pub async fn open<B: Backend>(backend: &B) -> Self {
        Self::new(fetch_reference(backend, WANTS).await)
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Selects the branch. When it changed, the line and user are cleared
    /// and a ticket for loading the branch's lines is returned.
    pub fn select_branch(&mut self, id: Option<BranchId>) -> Result<Option<Ticket>, FormError> {
        let changed = match id {
            Some(id) => self.branch.select(id)?,
            None => self.branch.clear_selection(),
        };
        if !changed {
            return Ok(None);
        }
        self.user.invalidate();
        if self.branch.selected().is_none() {
            self.line.invalidate();
            return Ok(None);
        }
        self.line.parent_selected();
        Ok(Some(self.line.begin_fetch()))
    }

    /// Applies the line list fetched under `ticket`, keeping the lines of
    /// the selected branch. Returns `false` for a stale ticket.
    pub fn apply_lines(&mut self, ticket: Ticket, fetched: Result<Vec<Line>, BackendError>) -> bool {
        if !self.line.is_current(ticket) {
            return self.line.resolve(ticket, fetched);
        }
        let branch = self.branch.selected().copied();
        let fetched = fetched
            .map(|lines| {
                filter_children(branch.as_ref(), &lines, |line| Some(line.branch_id))
                    .into_iter()
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .inspect_err(|err| {
                tracing::warn!("lines failed to load: {err}");
                self.notices
                    .push(Notice::error("Error", "Failed to load lines."));
            });
        self.line.resolve(ticket, fetched)
    }

    /// Selects the line. When it changed, the user is cleared and a ticket
    /// plus the users query for the selected branch and line is returned.
    pub fn select_line(&mut self, id: Option<LineId>) -> Result<Option<(Ticket, UserQuery)>, FormError> {
        let changed = match id {
            Some(id) => self.line.select(id)?,
            None => self.line.clear_selection(),
        };
        if !changed {
            return Ok(None);
        }
        let (Some(branch), Some(line)) = (self.branch.selected_option(), self.line.selected_option())
        else {
            self.user.invalidate();
            return Ok(None);
        };
        let query = UserQuery {
            branch_name: Some(branch.branch_name.clone()),
            line_name: Some(line.line_name.clone()),
        };
        self.user.parent_selected();
        Ok(Some((self.user.begin_fetch(), query)))
    }

    /// Applies the users fetched under `ticket`.
    ///
    /// The backend filter is loose, so users are kept only when their base
    /// branch and line are the selected ones or one of their allocations
    /// is on the selected line. Each user appears once.
    pub fn apply_users(&mut self, ticket: Ticket, fetched: Result<Vec<User>, BackendError>) -> bool {
        if !self.user.is_current(ticket) {
            return self.user.resolve(ticket, fetched);
        }
        let branch_name = self.branch.selected_option().map(|b| b.branch_name.clone());
        let line = self.line.selected_option().cloned();
        let fetched = fetched
            .map(|users| {
                let mut kept: Vec<User> = Vec::new();
                for user in users {
                    let based_here = line.as_ref().is_some_and(|line| {
                        user.base_branch == branch_name && user.base_line.as_deref() == Some(line.line_name.as_str())
                    });
                    let allocated_here = line.as_ref().is_some_and(|line| {
                        user.line_allocations.iter().any(|a| a.line == line.line_id)
                    });
                    if (based_here || allocated_here) && !kept.iter().any(|k| k.id == user.id) {
                        kept.push(user);
                    }
                }
                kept
            })
            .inspect_err(|err| {
                tracing::warn!("users failed to load: {err}");
                self.notices
                    .push(Notice::error("Error", "Failed to load users."));
            });
        self.user.resolve(ticket, fetched)
    }

    pub fn select_user(&mut self, id: Option<UserId>) -> Result<(), FormError> {
        match id {
            Some(id) => self.user.select(id).map(drop),
            None => {
                self.user.clear_selection();
                Ok(())
            }
        }
    }

    /// Selects the branch and loads its lines.
    pub async fn choose_branch<B: Backend>(&mut self, backend: &B, id: BranchId) -> Result<(), FormError> {
        if let Some(ticket) = self.select_branch(Some(id))? {
            let lines = backend.lines().await;
            self.apply_lines(ticket, lines);
        }
        Ok(())
    }

    /// Selects the line and loads its users.
    pub async fn choose_line<B: Backend>(&mut self, backend: &B, id: LineId) -> Result<(), FormError> {
        if let Some((ticket, query)) = self.select_line(Some(id))? {
            let users = backend.users(&query).await;
            self.apply_users(ticket, users);
        }
        Ok(())
    }

    pub fn set_password(&mut self, password: &str) {
        self.password = password.to_string();
    }

    pub fn set_confirm_password(&mut self, password: &str) {
        self.confirm_password = password.to_string();
    }

    pub fn branch(&self) -> &Level<Branch> {
        &self.branch
    }

    pub fn line(&self) -> &Level<Line> {
        &self.line
    }

    pub fn user(&self) -> &Level<User> {
        &self.user
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Checks the selection and passwords, stopping at the first problem,
    /// and returns what is about to be reset.
    pub fn prepare(&self) -> Result<ResetSummary, ValidationErrors> {
        let mut v = Validator::new();
        v.require("user", self.user.selected_option(), "Please select a valid user");
        if v.errors().is_empty() {
            v.field("password", &self.password).min_chars(
                MIN_PASSWORD_LEN,
                "Password must be at least 4 characters",
            );
        }
        if v.errors().is_empty() {
            v.field("confirm_password", &self.confirm_password)
                .equals(&self.password, "Passwords do not match!");
        }
        v.finish()?;

        let mut summary = ResetSummary {
            branch_name: String::new(),
            line_name: String::new(),
            user: UserId(0),
            username: String::new(),
        };
        if let Some(branch) = self.branch.selected_option() {
            summary.branch_name = branch.branch_name.clone();
        }
        if let Some(line) = self.line.selected_option() {
            summary.line_name = line.line_name.clone();
        }
        if let Some(user) = self.user.selected_option() {
            summary.user = user.id;
            summary.username = user.username.clone();
        }
        Ok(summary)
    }

    /// Sends the reset. On success the whole form is cleared.
    pub async fn submit<B: Backend>(&mut self, backend: &B) -> Notice {
        let summary = match self.prepare() {
            Ok(summary) => summary,
            Err(errors) => return Notice::error("Validation failed", errors.messages()),
        };
        self.state = SubmissionState::Submitting;
        let body = ResetPassword {
            new_password: self.password.clone(),
        };
        let result = match serde_json::to_value(&body) {
            Ok(body) => backend.reset_password(summary.user, &body).await,
            Err(err) => Err(BackendError::Decode(err.to_string())),
        };

        match result {
            Ok(response) => {
                let message = response
                    .body
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string);
                if response.status == 200 || message.is_some() {
                    tracing::info!(user = %summary.user, "password reset");
                    self.state = SubmissionState::Succeeded;
                    self.clear();
                    Notice::success(
                        "Password Reset",
                        message.unwrap_or_else(|| format!("Password for {} was reset", summary.username)),
                    )
                } else {
                    let (_, detail) = server_detail(&response.body);
                    tracing::warn!(user = %summary.user, status = response.status, "password reset rejected");
                    self.state = SubmissionState::Failed;
                    Notice::error(
                        "Failed to reset password",
                        detail.unwrap_or_else(|| "Please try again".to_string()),
                    )
                }
            }
            Err(err) => {
                tracing::warn!(user = %summary.user, "password reset failed: {err}");
                self.state = SubmissionState::Failed;
                Notice::error("Failed to reset password", err.to_string())
            }
        }
    }

    fn clear(&mut self) {
        self.branch.clear_selection();
        invalidate_all(&mut [&mut self.line, &mut self.user]);
        self.password.clear();
        self.confirm_password.clear();
    }
}

#[cfg(test)]
mod tests {
    use api_types::user::LineAllocation;

    use crate::cascade::CascadeState;

    use super::*;

    fn form() -> ResetPasswordForm {
        ResetPasswordForm::new(ReferenceSet {
            branches: Ok(vec![
                Branch {
                    id: BranchId(1),
                    branch_name: "North".to_string(),
                },
                Branch {
                    id: BranchId(2),
                    branch_name: "South".to_string(),
                },
            ]),
            ..ReferenceSet::default()
        })
    }

    fn lines() -> Vec<Line> {
        [(10, 1), (11, 1), (20, 2)]
            .into_iter()
            .map(|(id, branch)| Line {
                line_id: LineId(id),
                line_name: format!("L{id}"),
                branch_id: BranchId(branch),
                branch_name: String::new(),
            })
            .collect()
    }

    fn user(id: i64, base: Option<(&str, &str)>, allocated: &[i64]) -> User {
        User {
            id: UserId(id),
            username: format!("u{id}"),
            full_name: String::new(),
            role: None,
            mobile_number: None,
            email: None,
            address: None,
            pin_code: None,
            allow_old_transaction: false,
            base_branch: base.map(|(b, _)| b.to_string()),
            base_line: base.map(|(_, l)| l.to_string()),
            line_allocations: allocated
                .iter()
                .map(|line| LineAllocation {
                    branch: BranchId(1),
                    line: LineId(*line),
                    branch_name: String::new(),
                    line_name: String::new(),
                })
                .collect(),
            user_expenses: Vec::new(),
        }
    }

    #[test]
    fn lines_are_limited_to_the_branch() {
        let mut form = form();
        let ticket = form.select_branch(Some(BranchId(1))).unwrap().unwrap();
        assert_eq!(form.line().state(), CascadeState::ChildrenLoading);
        assert!(form.apply_lines(ticket, Ok(lines())));
        assert_eq!(form.line().options().len(), 2);
    }

    #[test]
    fn lines_for_a_previous_branch_are_dropped() {
        let mut form = form();
        let first = form.select_branch(Some(BranchId(1))).unwrap().unwrap();
        let second = form.select_branch(Some(BranchId(2))).unwrap().unwrap();
        assert!(!form.apply_lines(first, Ok(lines())));
        assert!(form.line().options().is_empty());
        assert!(form.apply_lines(second, Ok(lines())));
        assert_eq!(form.line().options()[0].line_id, LineId(20));
    }

    #[test]
    fn users_match_by_base_or_allocation_once() {
        let mut form = form();
        let ticket = form.select_branch(Some(BranchId(1))).unwrap().unwrap();
        form.apply_lines(ticket, Ok(lines()));
        let (ticket, query) = form.select_line(Some(LineId(10))).unwrap().unwrap();
        assert_eq!(query.branch_name.as_deref(), Some("North"));
        assert_eq!(query.line_name.as_deref(), Some("L10"));

        let fetched = vec![
            user(1, Some(("North", "L10")), &[]),
            user(2, None, &[10]),
            user(3, Some(("North", "L11")), &[11]),
            user(1, Some(("North", "L10")), &[10]),
        ];
        assert!(form.apply_users(ticket, Ok(fetched)));
        let ids: Vec<_> = form.user().options().iter().map(|u| u.id.0).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn branch_change_clears_line_and_user() {
        let mut form = form();
        let ticket = form.select_branch(Some(BranchId(1))).unwrap().unwrap();
        form.apply_lines(ticket, Ok(lines()));
        let (ticket, _) = form.select_line(Some(LineId(10))).unwrap().unwrap();
        form.apply_users(ticket, Ok(vec![user(1, Some(("North", "L10")), &[])]));
        form.select_user(Some(UserId(1))).unwrap();

        let _ = form.select_branch(Some(BranchId(2))).unwrap();
        assert!(form.line().selected().is_none());
        assert!(form.user().selected().is_none());
        assert!(form.user().options().is_empty());
        assert_eq!(form.user().state(), CascadeState::NoParentSelected);
    }

    #[test]
    fn checks_run_in_order() {
        let mut form = form();
        form.set_password("abc");
        form.set_confirm_password("abd");
        let errors = form.prepare().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("user"), Some("Please select a valid user"));

        let ticket = form.select_branch(Some(BranchId(1))).unwrap().unwrap();
        form.apply_lines(ticket, Ok(lines()));
        let (ticket, _) = form.select_line(Some(LineId(10))).unwrap().unwrap();
        form.apply_users(ticket, Ok(vec![user(5, None, &[10])]));
        form.select_user(Some(UserId(5))).unwrap();
        let errors = form.prepare().unwrap_err();
        assert_eq!(errors.get("password"), Some("Password must be at least 4 characters"));
        assert!(errors.get("confirm_password").is_none());

        form.set_password("abcd");
        form.set_confirm_password("abcd");
        let summary = form.prepare().unwrap();
        assert_eq!(summary.branch_name, "North");
        assert_eq!(summary.line_name, "L10");
        assert_eq!(summary.username, "u5");
    }

    #[test]
    fn failed_user_load_disables_the_level() {
        let mut form = form();
        let ticket = form.select_branch(Some(BranchId(1))).unwrap().unwrap();
        form.apply_lines(ticket, Ok(lines()));
        let (ticket, _) = form.select_line(Some(LineId(11))).unwrap().unwrap();
        form.apply_users(ticket, Err(BackendError::Transport("timeout".to_string())));
        assert!(form.user().is_disabled());
        assert_eq!(form.take_notices()[0].message, "Failed to load users.");
    }
}
