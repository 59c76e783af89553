#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use api_types::{
    BranchId, ExpenseTypeId, LineId, UserId,
    branch::Branch,
    expense_type::{ExpenseStatus, ExpenseType},
    line::Line,
    user::{User, UserQuery},
};
use forms::{Backend, BackendError, Resource, Response};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Users(UserQuery),
    Record(Resource, i64),
    Create(Resource, Value),
    Update(Resource, i64, Value),
    ResetPassword(UserId, Value),
}

/// In-memory backend recording every call it receives.
#[derive(Default)]
pub struct FakeBackend {
    pub branches: Vec<Branch>,
    pub lines: Vec<Line>,
    pub users: Vec<User>,
    pub expense_types: Vec<ExpenseType>,
    pub records: HashMap<(Resource, i64), Value>,
    pub lines_fail: bool,
    pub users_fail: bool,
    replies: Mutex<VecDeque<Response>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    /// Two branches, North (lines 1, 2) and South (line 3), with one global
    /// and one line-1 expense type.
    pub fn seeded() -> Self {
        Self {
            branches: vec![branch(1, "North"), branch(2, "South")],
            lines: vec![line(1, "L1", 1), line(2, "L2", 1), line(3, "L3", 2)],
            expense_types: vec![
                expense_type(10, "Fuel", None),
                expense_type(11, "Rent", Some((1, 1))),
            ],
            ..Self::default()
        }
    }

    pub fn with_record(mut self, resource: Resource, id: i64, record: Value) -> Self {
        self.records.insert((resource, id), record);
        self
    }

    /// Queues the answer to the next write request.
    pub fn reply(&self, status: u16, body: Value) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Response::new(status, body));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| {
                matches!(
                    call,
                    Call::Create(..) | Call::Update(..) | Call::ResetPassword(..)
                )
            })
            .collect()
    }

    fn record_call(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_reply(&self, default_status: u16) -> Response {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Response::new(default_status, json!({})))
    }
}

impl Backend for FakeBackend {
    async fn branches(&self) -> Result<Vec<Branch>, BackendError> {
        Ok(self.branches.clone())
    }

    async fn lines(&self) -> Result<Vec<Line>, BackendError> {
        if self.lines_fail {
            return Err(BackendError::Status {
                status: 500,
                detail: "line list unavailable".to_string(),
            });
        }
        Ok(self.lines.clone())
    }

    async fn users(&self, query: &UserQuery) -> Result<Vec<User>, BackendError> {
        self.record_call(Call::Users(query.clone()));
        if self.users_fail {
            return Err(BackendError::Transport("connection reset".to_string()));
        }
        Ok(self.users.clone())
    }

    async fn expense_types(&self) -> Result<Vec<ExpenseType>, BackendError> {
        Ok(self.expense_types.clone())
    }

    async fn record(&self, resource: Resource, id: i64) -> Result<Value, BackendError> {
        self.record_call(Call::Record(resource, id));
        self.records
            .get(&(resource, id))
            .cloned()
            .ok_or_else(|| BackendError::Status {
                status: 404,
                detail: "Not found.".to_string(),
            })
    }

    async fn create(&self, resource: Resource, body: &Value) -> Result<Response, BackendError> {
        self.record_call(Call::Create(resource, body.clone()));
        Ok(self.next_reply(201))
    }

    async fn update(&self, resource: Resource, id: i64, body: &Value) -> Result<Response, BackendError> {
        self.record_call(Call::Update(resource, id, body.clone()));
        Ok(self.next_reply(200))
    }

    async fn reset_password(&self, user: UserId, body: &Value) -> Result<Response, BackendError> {
        self.record_call(Call::ResetPassword(user, body.clone()));
        Ok(self.next_reply(200))
    }
}

pub fn branch(id: i64, name: &str) -> Branch {
    Branch {
        id: BranchId(id),
        branch_name: name.to_string(),
    }
}

pub fn line(id: i64, name: &str, branch: i64) -> Line {
    Line {
        line_id: LineId(id),
        line_name: name.to_string(),
        branch_id: BranchId(branch),
        branch_name: String::new(),
    }
}

pub fn expense_type(id: i64, name: &str, place: Option<(i64, i64)>) -> ExpenseType {
    ExpenseType {
        id: ExpenseTypeId(id),
        name: name.to_string(),
        status: ExpenseStatus::Active,
        branch_id: place.map(|(branch, _)| BranchId(branch)),
        line_id: place.map(|(_, line)| LineId(line)),
    }
}
