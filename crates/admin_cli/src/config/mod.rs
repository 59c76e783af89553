use api_types::{BranchId, user::Role};
use clap::Args;
use forms::SessionContext;
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/admin.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// Bearer token attached to every request.
    pub token: Option<String>,
    pub level: String,
    pub timeout_secs: u64,
    /// Branch the operator works in; preselected where a form has a branch.
    pub branch: Option<i64>,
    pub username: Option<String>,
    pub role: Option<String>,
    pub endpoints: Endpoints,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".to_string(),
            token: None,
            level: "info".to_string(),
            timeout_secs: 30,
            branch: None,
            username: None,
            role: None,
            endpoints: Endpoints::default(),
        }
    }
}

/// Collection paths, relative to `base_url`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub users: String,
    pub expense_types: String,
    pub investments: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            users: "api/users/".to_string(),
            expense_types: "api/expense_types/".to_string(),
            investments: "api/investments/".to_string(),
        }
    }
}

impl AppConfig {
    /// Who is operating the forms, as configured.
    pub fn session(&self) -> Result<SessionContext> {
        let role = self
            .role
            .as_deref()
            .map(str::parse::<Role>)
            .transpose()
            .map_err(AppError::Setting)?;
        Ok(SessionContext {
            username: self.username.clone(),
            role,
            branch: self.branch.map(BranchId),
        })
    }
}

/// Options shared by every subcommand. They override the config file and
/// the `BRANCHLINE_*` environment.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Override base URL (e.g. http://127.0.0.1:8000/).
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Override the bearer token.
    #[arg(long, global = true)]
    pub token: Option<String>,
    /// Override the session branch id.
    #[arg(long, global = true)]
    pub session_branch: Option<i64>,
    /// Override the log level.
    #[arg(long, global = true)]
    pub level: Option<String>,
}

pub fn load(args: &ConfigArgs) -> Result<AppConfig> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(
        config::Environment::with_prefix("BRANCHLINE")
            .prefix_separator("_")
            .separator("__"),
    );
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = &args.base_url {
        settings.base_url = base_url.clone();
    }
    if let Some(token) = &args.token {
        settings.token = Some(token.clone());
    }
    if let Some(branch) = args.session_branch {
        settings.branch = Some(branch);
    }
    if let Some(level) = &args.level {
        settings.level = level.clone();
    }

    Ok(settings)
}
