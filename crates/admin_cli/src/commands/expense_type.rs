use api_types::{BranchId, LineId, expense_type::ExpenseStatus};
use clap::{Args, Subcommand};
use forms::{Backend, ExpenseTypeForm, FormError, FormSession, Notice};

use super::{load_error, selection_error};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct ExpenseType {
    #[command(subcommand)]
    pub command: ExpenseTypeCommand,
}

#[derive(Subcommand, Debug)]
pub enum ExpenseTypeCommand {
    Add(ExpenseTypeArgs),
    Edit {
        id: i64,
        #[command(flatten)]
        args: ExpenseTypeArgs,
    },
}

/// Fields left out keep their current value.
#[derive(Args, Debug, Default)]
pub struct ExpenseTypeArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    branch: Option<i64>,
    #[arg(long)]
    line: Option<i64>,
    /// `active` or `inactive`.
    #[arg(long)]
    status: Option<ExpenseStatus>,
}

impl ExpenseTypeArgs {
    fn apply(self, form: &mut ExpenseTypeForm) -> std::result::Result<(), FormError> {
        if let Some(name) = &self.name {
            form.set_name(name);
        }
        if let Some(branch) = self.branch {
            form.select_branch(Some(BranchId(branch)))?;
        }
        if let Some(line) = self.line {
            form.select_line(Some(LineId(line)))?;
        }
        if let Some(status) = self.status {
            form.set_status(status);
        }
        Ok(())
    }
}

pub async fn run<B: Backend>(backend: &B, command: ExpenseTypeCommand) -> Result<Vec<Notice>> {
    let (mut session, args) = match command {
        ExpenseTypeCommand::Add(args) => (ExpenseTypeForm::open_create(backend).await, args),
        ExpenseTypeCommand::Edit { id, args } => match ExpenseTypeForm::open_edit(backend, id).await {
            Ok(session) => (session, args),
            Err(err) => return Ok(vec![load_error("expense type", id, err)]),
        },
    };
    Ok(fill_and_submit(backend, &mut session, args).await)
}

async fn fill_and_submit<B: Backend>(
    backend: &B,
    session: &mut FormSession<ExpenseTypeForm>,
    args: ExpenseTypeArgs,
) -> Vec<Notice> {
    let mut notices = session.form_mut().take_notices();
    if let Err(err) = args.apply(session.form_mut()) {
        notices.push(selection_error(err));
        return notices;
    }
    notices.push(session.submit(backend).await);
    notices
}
