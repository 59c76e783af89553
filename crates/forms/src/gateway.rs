//! Create-or-update submission.
use serde::Serialize;
use serde_json::Value;

use crate::{
    backend::{Backend, Resource, Response},
    error::{FormError, SubmitError},
};

/// Whether a form creates a new record or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Edit(i64),
}

impl Mode {
    pub fn is_edit(self) -> bool {
        matches!(self, Self::Edit(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    /// The edit matched the current record; no request was made.
    Unchanged,
}

/// Payload fields whose error messages are shown as-is, in priority order.
const FIELD_DETAILS: &[&str] = &[
    "name",
    "username",
    "mobile_number",
    "email",
    "investment_title",
];

const GENERIC_DETAILS: &[&str] = &["non_field_errors", "message", "error", "detail"];

/// Submits `payload`.
///
/// Create posts to the collection and accepts 200/201. Edit first compares
/// against `current` (the payload of the last fetched record) and skips the
/// request when nothing differs; otherwise it puts to the detail endpoint
/// and accepts 200 only.
pub async fn submit<B, P>(
    backend: &B,
    resource: Resource,
    mode: Mode,
    payload: &P,
    current: Option<&P>,
) -> Result<Outcome, SubmitError>
where
    B: Backend,
    P: Serialize + PartialEq,
{
    if let Mode::Edit(id) = mode
        && current.is_some_and(|current| current == payload)
    {
        tracing::info!(resource = resource.label(), id, "no changes detected, skipping update");
        return Ok(Outcome::Unchanged);
    }

    let body = serde_json::to_value(payload)
        .map_err(|err| FormError::Mapping(format!("payload could not be encoded: {err}")))?;

    match mode {
        Mode::Create => {
            let response = backend.create(resource, &body).await?;
            if matches!(response.status, 200 | 201) {
                tracing::info!(resource = resource.label(), "created");
                Ok(Outcome::Created)
            } else {
                Err(rejection(resource, &response))
            }
        }
        Mode::Edit(id) => {
            let response = backend.update(resource, id, &body).await?;
            if response.status == 200 {
                tracing::info!(resource = resource.label(), id, "updated");
                Ok(Outcome::Updated)
            } else {
                Err(rejection(resource, &response))
            }
        }
    }
}

fn rejection(resource: Resource, response: &Response) -> SubmitError {
    let (field, detail) = server_detail(&response.body);
    tracing::warn!(
        resource = resource.label(),
        status = response.status,
        detail = detail.as_deref().unwrap_or(""),
        "submission rejected"
    );
    SubmitError::Rejected {
        status: response.status,
        field,
        detail,
    }
}

/// Picks the most useful message out of an error body.
///
/// Field errors come as `{"name": ["already exists"]}` or
/// `{"mobile_number": "..."}`; generic ones under `message`, `error` or
/// `detail`.
pub fn server_detail(body: &Value) -> (Option<&'static str>, Option<String>) {
    for field in FIELD_DETAILS {
        if let Some(message) = body.get(field).and_then(first_message) {
            return (Some(*field), Some(message));
        }
    }
    let generic = GENERIC_DETAILS
        .iter()
        .find_map(|key| body.get(key).and_then(first_message));
    (None, generic)
}

fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(items) => items.iter().find_map(first_message),
        _ => None,
    }
}
