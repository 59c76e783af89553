use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid base_url: {0}")]
    BaseUrl(String),
    #[error("invalid setting: {0}")]
    Setting(String),
    #[error("prompt error: {0}")]
    Prompt(String),
}
