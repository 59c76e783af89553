//! Add/edit user form: profile fields, line allocations and per-line
//! expense mappings.
use api_types::{
    BranchId, ExpenseTypeId, LineId,
    branch::Branch,
    expense_type::ExpenseType,
    line::Line,
    user::{LineAllocation, Role, User, UserExpense, UserPayload},
};
use uuid::Uuid;

use crate::{
    backend::{Backend, Resource, fetch_record},
    branch_line::BranchLine,
    cascade::Level,
    error::{FormError, ValidationErrors},
    gateway::Mode,
    input,
    notice::Notice,
    reference::{Cached, ReferenceSet, Wants, fetch_reference},
    session::{Form, FormSession, restore_selection},
    validate::{EMAIL, MIN_PASSWORD_LEN, MOBILE, NAME, PIN_CODE, USERNAME, Validator},
};

const WANTS: Wants = Wants {
    branches: true,
    lines: true,
    users: false,
    expense_types: true,
};

/// Expense types enabled for one line, or for every allocated line when
/// `line` is `None` (the global mapping).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseMapping {
    pub id: Uuid,
    pub line: Option<LineId>,
    pub expenses: Vec<ExpenseTypeId>,
}

impl ExpenseMapping {
    fn new(line: Option<LineId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            line,
            expenses: Vec::new(),
        }
    }

    pub fn is_global(&self) -> bool {
        self.line.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct UserForm {
    full_name: String,
    username: String,
    password: String,
    confirm_password: String,
    mobile_number: String,
    email: String,
    address: String,
    pin_code: String,
    role: Option<Role>,
    allow_old_transaction: bool,
    base: BranchLine,
    branch_cache: Cached<Branch>,
    line_cache: Cached<Line>,
    expense_types: Cached<ExpenseType>,
    branches: Level<Branch>,
    lines: Level<Line>,
    /// Always starts with the global mapping.
    mappings: Vec<ExpenseMapping>,
    notices: Vec<Notice>,
}

impl UserForm {
    pub fn new(reference: ReferenceSet) -> Self {
        let mut notices = Vec::new();
        let branch_cache = Cached::load("branches", reference.branches, &mut notices);
        let line_cache = Cached::load("lines", reference.lines, &mut notices);
        let mut expense_types = Cached::load("expense types", reference.expense_types, &mut notices);
        expense_types.retain(ExpenseType::is_active);
        Self {
            full_name: String::new(),
            username: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            mobile_number: String::new(),
            email: String::new(),
            address: String::new(),
            pin_code: String::new(),
            role: None,
            allow_old_transaction: false,
            base: BranchLine::new(branch_cache.clone(), line_cache.clone()),
            branches: branch_cache.root_level("branches"),
            lines: Level::new("lines"),
            branch_cache,
            line_cache,
            expense_types,
            mappings: vec![ExpenseMapping::new(None)],
            notices,
        }
    }

    /// A form holding an existing user.
    ///
    /// Allocations become the branch/line selections (unique ids in order),
    /// base names are resolved back to ids and expenses are regrouped by
    /// line. Global expense types go back to the global mapping, whichever
    /// line they were stored on. Values the lists do not offer are left
    /// unselected.
    pub fn from_record(reference: ReferenceSet, record: &User) -> Self {
        let mut form = Self::new(reference);
        form.set_full_name(&record.full_name);
        form.set_username(&record.username);
        form.set_mobile_number(record.mobile_number.as_deref().unwrap_or_default());
        form.set_email(record.email.as_deref().unwrap_or_default());
        form.set_address(record.address.as_deref().unwrap_or_default());
        form.set_pin_code(record.pin_code.as_deref().unwrap_or_default());
        form.allow_old_transaction = record.allow_old_transaction;
        form.role = record.role;

        let base_branch = record
            .base_branch
            .as_deref()
            .and_then(|name| form.branch_cache.by_name(name))
            .map(|branch| branch.id);
        let base_line = record
            .base_line
            .as_deref()
            .and_then(|name| form.line_cache.by_name(name, base_branch))
            .map(|line| line.line_id);
        form.base.restore(base_branch, base_line, &mut form.notices);

        let branches = unique(record.line_allocations.iter().map(|a| a.branch))
            .into_iter()
            .filter(|id| form.branches.contains(id))
            .collect();
        let restored = form.select_branches(branches);
        restore_selection(restored, &mut form.notices);
        if form.role == Some(Role::Agent) {
            let lines = unique(record.line_allocations.iter().map(|a| a.line))
                .into_iter()
                .filter(|id| form.lines.contains(id))
                .collect();
            let restored = form.select_lines(lines);
            restore_selection(restored, &mut form.notices);
        }

        for expense in &record.user_expenses {
            let global = form
                .expense_types
                .items()
                .iter()
                .any(|ty| ty.id == expense.expense && ty.is_global());
            let line = if global { None } else { expense.expense_lineid };
            if line.is_some_and(|line| !form.is_mappable(line)) {
                tracing::warn!(expense = %expense.expense, "dropping expense on a line outside the allocated branches");
                continue;
            }
            let index = match form.mappings.iter().position(|m| m.line == line) {
                Some(index) => index,
                None => {
                    form.mappings.push(ExpenseMapping::new(line));
                    form.mappings.len() - 1
                }
            };
            let mapping = &mut form.mappings[index];
            if !mapping.expenses.contains(&expense.expense) {
                mapping.expenses.push(expense.expense);
            }
        }
        form
    }

    pub async fn open_create<B: Backend>(backend: &B) -> FormSession<Self> {
        let reference = fetch_reference(backend, WANTS).await;
        FormSession::create(Self::new(reference))
    }

    pub async fn open_edit<B: Backend>(backend: &B, id: i64) -> Result<FormSession<Self>, FormError> {
        let (reference, record) = tokio::join!(
            fetch_reference(backend, WANTS),
            fetch_record::<User, _>(backend, Resource::Users, id),
        );
        let form = Self::from_record(reference, &record?);
        Ok(FormSession::edit(id, form))
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn set_full_name(&mut self, raw: &str) {
        self.full_name = input::letters_and_spaces(raw);
    }

    pub fn set_username(&mut self, raw: &str) {
        self.username = input::username(raw);
    }

    pub fn set_password(&mut self, password: &str) {
        self.password = password.to_string();
    }

    pub fn set_confirm_password(&mut self, password: &str) {
        self.confirm_password = password.to_string();
    }

    pub fn set_mobile_number(&mut self, raw: &str) {
        self.mobile_number = input::digits(raw, 10);
    }

    pub fn set_email(&mut self, raw: &str) {
        self.email = raw.trim().to_string();
    }

    pub fn set_address(&mut self, raw: &str) {
        self.address = raw.to_string();
    }

    pub fn set_pin_code(&mut self, raw: &str) {
        self.pin_code = input::digits(raw, 6);
    }

    pub fn set_allow_old_transaction(&mut self, allow: bool) {
        self.allow_old_transaction = allow;
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn mobile_number(&self) -> &str {
        &self.mobile_number
    }

    pub fn pin_code(&self) -> &str {
        &self.pin_code
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Owners and managers are allocated whole branches, so switching to
    /// one of them drops the individually picked lines.
    pub fn set_role(&mut self, role: Role) {
        self.role = Some(role);
        if role.spans_branches() && self.lines.clear_selection() {
            tracing::debug!(role = role.as_str(), "line selection cleared");
        }
    }

    pub fn select_base_branch(&mut self, id: Option<BranchId>) -> Result<(), FormError> {
        self.base.select_branch(id).map(drop)
    }

    pub fn select_base_line(&mut self, id: Option<LineId>) -> Result<(), FormError> {
        self.base.select_line(id).map(drop)
    }

    pub fn base(&self) -> &BranchLine {
        &self.base
    }

    /// Replaces the allocated branches. Any change clears the line
    /// selection and drops expense mappings for lines outside the new
    /// branches; the global mapping stays.
    pub fn select_branches(&mut self, ids: Vec<BranchId>) -> Result<(), FormError> {
        let changed = if ids.is_empty() {
            self.branches.clear_selection()
        } else {
            self.branches.select_many(ids)?
        };
        if !changed {
            return Ok(());
        }
        self.line_cache
            .fill_children_any(&mut self.lines, self.branches.selection(), |line| {
                Some(line.branch_id)
            });
        let before = self.mappings.len();
        let line_cache = &self.line_cache;
        let selected = self.branches.selection();
        self.mappings.retain(|m| {
            m.line.is_none_or(|line| {
                line_cache
                    .get(line)
                    .is_some_and(|line| selected.contains(&line.branch_id))
            })
        });
        if self.mappings.len() != before {
            tracing::debug!(dropped = before - self.mappings.len(), "expense mappings pruned");
        }
        Ok(())
    }

    /// Picks individual lines. Only agents are allocated per line.
    pub fn select_lines(&mut self, ids: Vec<LineId>) -> Result<(), FormError> {
        if self.role != Some(Role::Agent) {
            return Err(FormError::Disabled {
                level: self.lines.label(),
                reason: "lines are only picked for agents".to_string(),
            });
        }
        if ids.is_empty() {
            self.lines.clear_selection();
            return Ok(());
        }
        self.lines.select_many(ids).map(drop)
    }

    pub fn branches(&self) -> &Level<Branch> {
        &self.branches
    }

    pub fn lines(&self) -> &Level<Line> {
        &self.lines
    }

    pub fn mappings(&self) -> &[ExpenseMapping] {
        &self.mappings
    }

    pub fn global_mapping(&self) -> &ExpenseMapping {
        &self.mappings[0]
    }

    pub fn global_mapping_id(&self) -> Uuid {
        self.mappings[0].id
    }

    /// Lines that can still get a mapping of their own: under a selected
    /// branch and not mapped yet.
    pub fn mapping_line_options(&self) -> Vec<&Line> {
        self.mappable_lines()
            .filter(|line| !self.is_mapped(line.line_id))
            .collect()
    }

    /// Active expense types selectable in a mapping for `line`. Global types
    /// belong to the global mapping only.
    pub fn expense_options(&self, line: Option<LineId>) -> Vec<&ExpenseType> {
        self.expense_types
            .items()
            .iter()
            .filter(|ty| match line {
                None => ty.is_global(),
                Some(line) => ty.line_id == Some(line),
            })
            .collect()
    }

    pub fn add_mapping(&mut self, line: LineId) -> Result<Uuid, FormError> {
        self.ensure_line_available(line, None)?;
        let mapping = ExpenseMapping::new(Some(line));
        let id = mapping.id;
        self.mappings.push(mapping);
        Ok(id)
    }

    pub fn remove_mapping(&mut self, id: Uuid) -> Result<(), FormError> {
        let index = self.mapping_index(id)?;
        if self.mappings[index].is_global() {
            return Err(FormError::Mapping(
                "the global expense mapping cannot be removed".to_string(),
            ));
        }
        self.mappings.remove(index);
        Ok(())
    }

    /// Moves a mapping to another line; its expenses are cleared.
    pub fn set_mapping_line(&mut self, id: Uuid, line: LineId) -> Result<(), FormError> {
        let index = self.mapping_index(id)?;
        if self.mappings[index].is_global() {
            return Err(FormError::Mapping(
                "the global expense mapping has no line".to_string(),
            ));
        }
        if self.mappings[index].line == Some(line) {
            return Ok(());
        }
        self.ensure_line_available(line, Some(id))?;
        let mapping = &mut self.mappings[index];
        mapping.line = Some(line);
        mapping.expenses.clear();
        Ok(())
    }

    pub fn set_mapping_expenses(
        &mut self,
        id: Uuid,
        expenses: Vec<ExpenseTypeId>,
    ) -> Result<(), FormError> {
        let index = self.mapping_index(id)?;
        let line = self.mappings[index].line;
        let options = self.expense_options(line);
        let mut selected: Vec<ExpenseTypeId> = Vec::with_capacity(expenses.len());
        for expense in expenses {
            if !options.iter().any(|ty| ty.id == expense) {
                return Err(FormError::NotAnOption {
                    level: "expense",
                    key: expense.to_string(),
                });
            }
            if !selected.contains(&expense) {
                selected.push(expense);
            }
        }
        self.mappings[index].expenses = selected;
        Ok(())
    }

    /// Allocations the current selection submits.
    pub fn line_allocations(&self) -> Vec<LineAllocation> {
        match self.role {
            Some(role) => build_line_allocations(
                role,
                self.branches.selection(),
                self.lines.selection(),
                &self.branch_cache,
                &self.line_cache,
            ),
            None => Vec::new(),
        }
    }

    fn mappable_lines(&self) -> impl Iterator<Item = &Line> {
        self.branches
            .selection()
            .iter()
            .flat_map(move |branch| self.line_cache.of_branch(*branch))
    }

    fn is_mappable(&self, line: LineId) -> bool {
        self.line_cache
            .get(line)
            .is_some_and(|line| self.branches.selection().contains(&line.branch_id))
    }

    fn is_mapped(&self, line: LineId) -> bool {
        self.mappings.iter().any(|m| m.line == Some(line))
    }

    fn ensure_line_available(&self, line: LineId, moving: Option<Uuid>) -> Result<(), FormError> {
        if !self.is_mappable(line) {
            return Err(FormError::NotAnOption {
                level: "expense mapping line",
                key: line.to_string(),
            });
        }
        if self
            .mappings
            .iter()
            .any(|m| m.line == Some(line) && Some(m.id) != moving)
        {
            return Err(FormError::Mapping(format!("line {line} already has an expense mapping")));
        }
        Ok(())
    }

    fn mapping_index(&self, id: Uuid) -> Result<usize, FormError> {
        self.mappings
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| FormError::MappingNotFound(id.to_string()))
    }
}

fn unique<K: PartialEq>(keys: impl Iterator<Item = K>) -> Vec<K> {
    let mut out = Vec::new();
    for key in keys {
        if !out.contains(&key) {
            out.push(key);
        }
    }
    out
}

fn branch_name(branches: &Cached<Branch>, line: &Line) -> String {
    branches
        .get(line.branch_id)
        .map(|branch| branch.branch_name.clone())
        .unwrap_or_else(|| line.branch_name.clone())
}

/// Expands the selection into `(branch, line)` allocations.
///
/// Owners and managers get every line of each selected branch. Agents get
/// one allocation per selected line, its branch taken from the line list.
/// Ids missing from the cached lists are skipped.
pub fn build_line_allocations(
    role: Role,
    branches: &[BranchId],
    lines: &[LineId],
    branch_cache: &Cached<Branch>,
    line_cache: &Cached<Line>,
) -> Vec<LineAllocation> {
    let allocation = |line: &Line| LineAllocation {
        branch: line.branch_id,
        line: line.line_id,
        branch_name: branch_name(branch_cache, line),
        line_name: line.line_name.clone(),
    };
    if role.spans_branches() {
        branches
            .iter()
            .flat_map(|branch| line_cache.of_branch(*branch))
            .map(allocation)
            .collect()
    } else {
        lines
            .iter()
            .filter_map(|id| {
                let line = line_cache.get(*id);
                if line.is_none() {
                    tracing::warn!(line = %id, "allocated line missing from line list");
                }
                line
            })
            .map(allocation)
            .collect()
    }
}

/// Flattens expense mappings into per-line records.
///
/// A line mapping yields one record per expense on that line. The global
/// mapping yields one record per expense for every allocation.
pub fn build_user_expenses(
    mappings: &[ExpenseMapping],
    allocations: &[LineAllocation],
    branch_cache: &Cached<Branch>,
    line_cache: &Cached<Line>,
) -> Vec<UserExpense> {
    let mut records = Vec::new();
    for mapping in mappings {
        match mapping.line {
            Some(line_id) => {
                let Some(line) = line_cache.get(line_id) else {
                    tracing::warn!(line = %line_id, "mapped line missing from line list");
                    continue;
                };
                let branch_name = branch_name(branch_cache, line);
                records.extend(mapping.expenses.iter().map(|expense| UserExpense {
                    expense: *expense,
                    expense_branchid: Some(line.branch_id),
                    expense_branch_name: branch_name.clone(),
                    expense_lineid: Some(line.line_id),
                    expense_line_name: line.line_name.clone(),
                }));
            }
            None => {
                for expense in &mapping.expenses {
                    records.extend(allocations.iter().map(|allocation| UserExpense {
                        expense: *expense,
                        expense_branchid: Some(allocation.branch),
                        expense_branch_name: allocation.branch_name.clone(),
                        expense_lineid: Some(allocation.line),
                        expense_line_name: allocation.line_name.clone(),
                    }));
                }
            }
        }
    }
    records
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl Form for UserForm {
    type Payload = UserPayload;

    const RESOURCE: Resource = Resource::Users;

    fn validate(&self, mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.field("full_name", &self.full_name)
            .required("Please enter the full name")
            .pattern(&NAME, "Full name must contain only alphabets");
        v.field("username", &self.username)
            .required("Please enter the user name")
            .pattern(
                &USERNAME,
                "Username must start with a letter and contain only letters and numbers",
            );
        if !mode.is_edit() {
            v.field("password", &self.password)
                .required("Please enter the password")
                .min_chars(
                    MIN_PASSWORD_LEN,
                    "Password must be at least 4 characters",
                );
            v.field("confirm_password", &self.confirm_password)
                .required("Please confirm the password")
                .equals(&self.password, "Passwords do not match!");
        }
        v.field("mobile_number", &self.mobile_number)
            .required("Please enter the mobile number")
            .pattern(&MOBILE, "Mobile number must be 10 digits");
        v.field("email", &self.email)
            .pattern(&EMAIL, "Please enter a valid email");
        v.field("pin_code", &self.pin_code)
            .pattern(&PIN_CODE, "Pincode must be 6 digits!");
        v.require("role", self.role, "Please select a role");
        v.require("base_branch", self.base.branch(), "Please select a base branch");
        v.require("base_line", self.base.line(), "Please select a base line");
        v.check(
            "branches",
            !self.branches.selection().is_empty(),
            "Please select at least one branch",
        );
        if self.role == Some(Role::Agent) {
            v.check(
                "lines",
                !self.lines.selection().is_empty(),
                "Please select at least one line",
            );
        }

        if mode.is_edit() {
            let global = self.global_mapping();
            v.check(
                "line_expenses",
                self.mappings
                    .iter()
                    .filter(|m| !m.is_global())
                    .all(|m| !m.expenses.is_empty()),
                "Please select at least one expense for every line",
            );
            if self.role.is_some_and(Role::spans_branches) {
                v.check(
                    "global_expenses",
                    !global.expenses.is_empty(),
                    "Please select at least one global expense",
                );
            }
            v.check(
                "global_expenses",
                global.expenses.is_empty() || !self.line_allocations().is_empty(),
                "Global expenses need at least one allocated line",
            );
        }
        v.finish()
    }

    fn payload(&self, mode: Mode) -> Result<UserPayload, FormError> {
        let role = self
            .role
            .ok_or_else(|| FormError::Mapping("role is not set".to_string()))?;
        let (base_branch, base_line) = self.base.names();
        let line_allocations = self.line_allocations();
        let user_expenses = if mode.is_edit() {
            build_user_expenses(
                &self.mappings,
                &line_allocations,
                &self.branch_cache,
                &self.line_cache,
            )
        } else {
            Vec::new()
        };
        let password = (!mode.is_edit() && !self.password.is_empty()).then(|| self.password.clone());
        Ok(UserPayload {
            username: self.username.clone(),
            full_name: self.full_name.trim().to_string(),
            mobile_number: self.mobile_number.clone(),
            email: self.email.clone(),
            address: non_empty(&self.address),
            pin_code: non_empty(&self.pin_code),
            role,
            allow_old_transaction: self.allow_old_transaction,
            base_branch: base_branch.map(str::to_string),
            base_line: base_line.map(str::to_string),
            line_allocations,
            user_expenses,
            password,
        })
    }
}
