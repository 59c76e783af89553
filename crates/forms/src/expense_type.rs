//! Add/edit expense type form.
use api_types::{
    BranchId, LineId,
    expense_type::{ExpenseStatus, ExpenseType, ExpenseTypePayload},
};

use crate::{
    backend::{Backend, Resource, fetch_record},
    branch_line::BranchLine,
    error::{FormError, ValidationErrors},
    gateway::Mode,
    input,
    notice::Notice,
    reference::{Cached, ReferenceSet, Wants, fetch_reference},
    session::{Form, FormSession},
    validate::{NAME, Validator},
};

#[derive(Debug, Clone)]
pub struct ExpenseTypeForm {
    name: String,
    status: Option<ExpenseStatus>,
    place: BranchLine,
    notices: Vec<Notice>,
}

impl ExpenseTypeForm {
    pub fn new(reference: ReferenceSet) -> Self {
        let mut notices = Vec::new();
        let branches = Cached::load("branches", reference.branches, &mut notices);
        let lines = Cached::load("lines", reference.lines, &mut notices);
        Self {
            name: String::new(),
            status: None,
            place: BranchLine::new(branches, lines),
            notices,
        }
    }

    /// A form holding the values of an existing expense type. A branch or
    /// line the lists do not offer is left unselected.
    pub fn from_record(reference: ReferenceSet, record: &ExpenseType) -> Self {
        let mut form = Self::new(reference);
        form.set_name(&record.name);
        form.status = Some(record.status);
        form.place
            .restore(record.branch_id, record.line_id, &mut form.notices);
        form
    }

    /// Loads reference data and opens a create session.
    pub async fn open_create<B: Backend>(backend: &B) -> FormSession<Self> {
        let reference = fetch_reference(backend, Wants::BRANCHES_AND_LINES).await;
        FormSession::create(Self::new(reference))
    }

    /// Loads reference data and the record, and opens an edit session.
    pub async fn open_edit<B: Backend>(backend: &B, id: i64) -> Result<FormSession<Self>, FormError> {
        let (reference, record) = tokio::join!(
            fetch_reference(backend, Wants::BRANCHES_AND_LINES),
            fetch_record::<ExpenseType, _>(backend, Resource::ExpenseTypes, id),
        );
        let form = Self::from_record(reference, &record?);
        Ok(FormSession::edit(id, form))
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn set_name(&mut self, raw: &str) {
        self.name = input::letters_and_spaces(raw);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_status(&mut self, status: ExpenseStatus) {
        self.status = Some(status);
    }

    pub fn status(&self) -> Option<ExpenseStatus> {
        self.status
    }

    pub fn select_branch(&mut self, id: Option<BranchId>) -> Result<(), FormError> {
        self.place.select_branch(id).map(drop)
    }

    pub fn select_line(&mut self, id: Option<LineId>) -> Result<(), FormError> {
        self.place.select_line(id).map(drop)
    }

    pub fn place(&self) -> &BranchLine {
        &self.place
    }
}

impl Form for ExpenseTypeForm {
    type Payload = ExpenseTypePayload;

    const RESOURCE: Resource = Resource::ExpenseTypes;

    fn validate(&self, _mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.field("name", &self.name)
            .required("Please enter expense name")
            .pattern(&NAME, "Expense name must contain only alphabets");
        v.require("branch", self.place.branch(), "Please select a branch");
        v.require("line", self.place.line(), "Please select a line");
        v.require("status", self.status, "Please select a status");
        v.finish()
    }

    fn payload(&self, _mode: Mode) -> Result<ExpenseTypePayload, FormError> {
        Ok(ExpenseTypePayload {
            name: self.name.trim().to_string(),
            branch_id: self.place.branch(),
            line_id: self.place.line(),
            status: self.status.unwrap_or_default(),
        })
    }
}
