use std::time::Duration;

use api_types::{
    UserId,
    branch::Branch,
    expense_type::ExpenseType,
    line::Line,
    user::{User, UserQuery},
};
use forms::{Backend, BackendError, Resource, Response, backend::normalize_list, gateway::server_detail};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    config::{AppConfig, Endpoints},
    error::{AppError, Result},
};

const BRANCHES_PATH: &str = "api/branch_dd";
const LINES_PATH: &str = "api/line_dd";

/// HTTP implementation of the forms [`Backend`].
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
    token: Option<String>,
    endpoints: Endpoints,
}

impl Client {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|err| AppError::BaseUrl(err.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url,
            http,
            token: config.token.clone(),
            endpoints: config.endpoints.clone(),
        })
    }

    fn collection(&self, resource: Resource) -> &str {
        match resource {
            Resource::Users => &self.endpoints.users,
            Resource::ExpenseTypes => &self.endpoints.expense_types,
            Resource::Investments => &self.endpoints.investments,
        }
    }

    fn url(&self, path: &str) -> std::result::Result<Url, BackendError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| BackendError::Transport(format!("invalid path {path}: {err}")))
    }

    fn detail_url(&self, resource: Resource, id: i64) -> std::result::Result<Url, BackendError> {
        let collection = self.collection(resource).trim_end_matches('/');
        self.url(&format!("{collection}/{id}/"))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let req = self.http.request(method, url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get_value(&self, req: RequestBuilder) -> std::result::Result<Value, BackendError> {
        let res = req.send().await.map_err(transport)?;
        let status = res.status();
        let body = read_body(res).await;
        if status.is_success() {
            return Ok(body);
        }
        let (_, detail) = server_detail(&body);
        Err(BackendError::Status {
            status: status.as_u16(),
            detail: detail.unwrap_or_else(|| "unknown error".to_string()),
        })
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> std::result::Result<Vec<T>, BackendError> {
        let url = self.url(path)?;
        tracing::debug!(%url, "fetching list");
        let body = self.get_value(self.request(Method::GET, url)).await?;
        normalize_list(body)
    }

    async fn send_json(
        &self,
        method: Method,
        url: Url,
        body: &Value,
    ) -> std::result::Result<Response, BackendError> {
        tracing::debug!(%method, %url, "sending");
        let res = self
            .request(method, url)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        let status = res.status().as_u16();
        Ok(Response::new(status, read_body(res).await))
    }
}

fn transport(err: reqwest::Error) -> BackendError {
    BackendError::Transport(err.to_string())
}

/// The body as JSON; plain text ends up as a JSON string and an empty or
/// unreadable body as null.
async fn read_body(res: reqwest::Response) -> Value {
    match res.text().await {
        Ok(text) if text.trim().is_empty() => Value::Null,
        Ok(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        Err(err) => {
            tracing::warn!("response body could not be read: {err}");
            Value::Null
        }
    }
}

impl Backend for Client {
    async fn branches(&self) -> std::result::Result<Vec<Branch>, BackendError> {
        self.get_list(BRANCHES_PATH).await
    }

    async fn lines(&self) -> std::result::Result<Vec<Line>, BackendError> {
        self.get_list(LINES_PATH).await
    }

    async fn users(&self, query: &UserQuery) -> std::result::Result<Vec<User>, BackendError> {
        let url = self.url(&self.endpoints.users)?;
        tracing::debug!(%url, ?query, "fetching users");
        let req = self.request(Method::GET, url).query(query);
        normalize_list(self.get_value(req).await?)
    }

    async fn expense_types(&self) -> std::result::Result<Vec<ExpenseType>, BackendError> {
        self.get_list(&self.endpoints.expense_types).await
    }

    async fn record(&self, resource: Resource, id: i64) -> std::result::Result<Value, BackendError> {
        let url = self.detail_url(resource, id)?;
        self.get_value(self.request(Method::GET, url)).await
    }

    async fn create(&self, resource: Resource, body: &Value) -> std::result::Result<Response, BackendError> {
        let url = self.url(self.collection(resource))?;
        self.send_json(Method::POST, url, body).await
    }

    async fn update(
        &self,
        resource: Resource,
        id: i64,
        body: &Value,
    ) -> std::result::Result<Response, BackendError> {
        let url = self.detail_url(resource, id)?;
        self.send_json(Method::PUT, url, body).await
    }

    async fn reset_password(&self, user: UserId, body: &Value) -> std::result::Result<Response, BackendError> {
        let users = self.endpoints.users.trim_end_matches('/');
        let url = self.url(&format!("{users}/{user}/reset-password/"))?;
        self.send_json(Method::POST, url, body).await
    }
}
