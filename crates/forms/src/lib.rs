//! Administrative forms for the branchline backend.
//!
//! Each form loads its reference lists through a [`Backend`], keeps its
//! cascading selections consistent, validates on submit and hands the
//! shaped payload to the submission gateway.
pub mod backend;
pub mod branch_line;
pub mod cascade;
pub mod error;
pub mod expense_type;
pub mod filter;
pub mod gateway;
pub mod input;
pub mod investment;
pub mod notice;
pub mod reference;
pub mod reset_password;
pub mod session;
pub mod user;
pub mod validate;

pub use backend::{Backend, Resource, Response};
pub use error::{BackendError, FormError, SubmitError, ValidationErrors};
pub use expense_type::ExpenseTypeForm;
pub use gateway::{Mode, Outcome};
pub use investment::InvestmentForm;
pub use notice::{Notice, NoticeLevel};
pub use reset_password::{ResetPasswordForm, ResetSummary};
pub use session::{Form, FormSession, SessionContext, SubmissionState};
pub use user::{ExpenseMapping, UserForm};
