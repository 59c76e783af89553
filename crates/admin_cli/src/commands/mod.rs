use clap::Subcommand;
use forms::{Backend, Notice, SessionContext};

use crate::error::Result;

pub mod expense_type;
pub mod investment;
pub mod lists;
pub mod reset_password;
pub mod user;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List branches.
    Branches,
    /// List lines, optionally only those of some branches.
    Lines(lists::LinesArgs),
    /// List users, optionally filtered by branch and line name.
    Users(lists::UsersArgs),
    /// List expense types of one line, or the global ones.
    ExpenseTypes(lists::ExpenseTypesArgs),
    /// Add or edit an expense type.
    ExpenseType(expense_type::ExpenseType),
    /// Add or edit an investment.
    Investment(investment::Investment),
    /// Add or edit a user.
    User(user::User),
    /// Reset a user's password.
    ResetPassword(reset_password::ResetPasswordArgs),
}

/// Runs one command, returning the notices to show in order. The last one
/// is the outcome of the command.
pub async fn run<B: Backend>(
    backend: &B,
    session: &SessionContext,
    command: Command,
) -> Result<Vec<Notice>> {
    match command {
        Command::Branches => lists::branches(backend).await,
        Command::Lines(args) => lists::lines(backend, args).await,
        Command::Users(args) => lists::users(backend, args).await,
        Command::ExpenseTypes(args) => lists::expense_types(backend, args).await,
        Command::ExpenseType(cmd) => expense_type::run(backend, cmd.command).await,
        Command::Investment(cmd) => investment::run(backend, session, cmd.command).await,
        Command::User(cmd) => user::run(backend, cmd.command).await,
        Command::ResetPassword(args) => reset_password::run(backend, args).await,
    }
}

/// A selection the backend did not offer, reported like any other failure.
pub(crate) fn selection_error(err: forms::FormError) -> Notice {
    Notice::error("Invalid selection", err.to_string())
}

pub(crate) fn load_error(what: &str, id: i64, err: forms::FormError) -> Notice {
    tracing::warn!(id, "could not open {what}: {err}");
    Notice::error("Error", format!("Failed to load {what} {id}: {err}"))
}
