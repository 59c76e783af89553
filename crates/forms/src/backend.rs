//! The seam between forms and the REST backend.
//!
//! Forms only talk to a [`Backend`]; the HTTP implementation lives in the
//! admin binary and tests use an in-memory one.
use api_types::{
    UserId,
    branch::Branch,
    expense_type::ExpenseType,
    line::Line,
    user::{User, UserQuery},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::BackendError;

/// A writable backend collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    ExpenseTypes,
    Investments,
}

impl Resource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Users => "User",
            Self::ExpenseTypes => "Expense Type",
            Self::Investments => "Investment",
        }
    }
}

/// Raw answer to a write request, whatever its status.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// Reference lists and record reads return typed values and fail on any
/// non-success status. Writes return the raw [`Response`] so the
/// submission gateway decides what counts as success; they only fail when
/// the request could not be made at all.
#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn branches(&self) -> Result<Vec<Branch>, BackendError>;

    async fn lines(&self) -> Result<Vec<Line>, BackendError>;

    async fn users(&self, query: &UserQuery) -> Result<Vec<User>, BackendError>;

    async fn expense_types(&self) -> Result<Vec<ExpenseType>, BackendError>;

    /// `GET <collection><id>/`.
    async fn record(&self, resource: Resource, id: i64) -> Result<Value, BackendError>;

    /// `POST <collection>`.
    async fn create(&self, resource: Resource, body: &Value) -> Result<Response, BackendError>;

    /// `PUT <collection><id>/`.
    async fn update(&self, resource: Resource, id: i64, body: &Value)
    -> Result<Response, BackendError>;

    /// `POST <users><id>/reset-password/`.
    async fn reset_password(&self, user: UserId, body: &Value) -> Result<Response, BackendError>;
}

/// Reads one record and decodes it.
pub async fn fetch_record<T, B>(backend: &B, resource: Resource, id: i64) -> Result<T, BackendError>
where
    T: DeserializeOwned,
    B: Backend,
{
    let value = backend.record(resource, id).await?;
    serde_json::from_value(value).map_err(|err| BackendError::Decode(err.to_string()))
}

/// Decodes a reference list.
///
/// Anything but a JSON array is treated as an empty list, as the dropdown
/// endpoints are not consistent about wrapping.
pub fn normalize_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, BackendError> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| {
                serde_json::from_value(item).map_err(|err| BackendError::Decode(err.to_string()))
            })
            .collect(),
        other => {
            tracing::warn!(kind = value_kind(&other), "expected a JSON array, using an empty list");
            Ok(Vec::new())
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
