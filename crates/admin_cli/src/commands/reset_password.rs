use api_types::{BranchId, LineId, UserId};
use clap::Args;
use forms::{Backend, FormError, Notice, ResetPasswordForm};

use super::selection_error;
use crate::{error::Result, prompt};

#[derive(Args, Debug)]
pub struct ResetPasswordArgs {
    #[arg(long)]
    branch: i64,
    #[arg(long)]
    line: i64,
    #[arg(long)]
    user: i64,
    /// Asked for interactively when missing.
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    confirm_password: Option<String>,
    /// Skip the confirmation question.
    #[arg(long, short = 'y')]
    yes: bool,
}

async fn select<B: Backend>(
    backend: &B,
    form: &mut ResetPasswordForm,
    args: &ResetPasswordArgs,
) -> std::result::Result<(), FormError> {
    form.choose_branch(backend, BranchId(args.branch)).await?;
    form.choose_line(backend, LineId(args.line)).await?;
    form.select_user(Some(UserId(args.user)))
}

pub async fn run<B: Backend>(backend: &B, args: ResetPasswordArgs) -> Result<Vec<Notice>> {
    let mut form = ResetPasswordForm::open(backend).await;
    let mut notices = form.take_notices();
    let selected = select(backend, &mut form, &args).await;
    notices.extend(form.take_notices());
    if let Err(err) = selected {
        notices.push(selection_error(err));
        return Ok(notices);
    }

    let password = match args.password {
        Some(password) => password,
        None => prompt::password("New password: ")?,
    };
    let confirm = match args.confirm_password {
        Some(confirm) => confirm,
        None if args.yes => password.clone(),
        None => prompt::password("Confirm password: ")?,
    };
    form.set_password(&password);
    form.set_confirm_password(&confirm);

    let summary = match form.prepare() {
        Ok(summary) => summary,
        Err(errors) => {
            notices.push(Notice::error("Validation failed", errors.messages()));
            return Ok(notices);
        }
    };
    if !args.yes {
        let question = format!(
            "Reset password for {} ({} / {})?",
            summary.username, summary.branch_name, summary.line_name
        );
        if !prompt::confirm(&question)? {
            notices.push(Notice::info("Cancelled", "Password was not changed"));
            return Ok(notices);
        }
    }

    notices.push(form.submit(backend).await);
    Ok(notices)
}
