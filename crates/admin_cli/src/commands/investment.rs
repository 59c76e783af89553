use api_types::{BranchId, LineId, UserId, investment::PaymentMode};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use forms::{Backend, FormError, InvestmentForm, Notice, SessionContext};

use super::{load_error, selection_error};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct Investment {
    #[command(subcommand)]
    pub command: InvestmentCommand,
}

#[derive(Subcommand, Debug)]
pub enum InvestmentCommand {
    Add(InvestmentArgs),
    Edit {
        id: i64,
        #[command(flatten)]
        args: InvestmentArgs,
    },
}

#[derive(Args, Debug, Default)]
pub struct InvestmentArgs {
    #[arg(long)]
    title: Option<String>,
    /// Investing user id.
    #[arg(long)]
    user: Option<i64>,
    #[arg(long)]
    branch: Option<i64>,
    #[arg(long)]
    line: Option<i64>,
    /// Decimal amount, `.` or `,` as separator.
    #[arg(long)]
    amount: Option<String>,
    /// cash, upi, bank_transfer, cheque or card.
    #[arg(long)]
    payment_mode: Option<PaymentMode>,
    /// YYYY-MM-DD.
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    comments: Option<String>,
}

impl InvestmentArgs {
    fn apply(self, form: &mut InvestmentForm) -> std::result::Result<(), FormError> {
        if let Some(title) = &self.title {
            form.set_title(title);
        }
        if let Some(user) = self.user {
            form.select_user(Some(UserId(user)))?;
        }
        if let Some(branch) = self.branch {
            form.select_branch(Some(BranchId(branch)))?;
        }
        if let Some(line) = self.line {
            form.select_line(Some(LineId(line)))?;
        }
        if let Some(amount) = &self.amount {
            form.set_amount(amount);
        }
        if let Some(mode) = self.payment_mode {
            form.set_payment_mode(mode);
        }
        if let Some(date) = self.date {
            form.set_date(date);
        }
        if let Some(comments) = &self.comments {
            form.set_comments(comments);
        }
        Ok(())
    }
}

pub async fn run<B: Backend>(
    backend: &B,
    context: &SessionContext,
    command: InvestmentCommand,
) -> Result<Vec<Notice>> {
    let (mut session, args) = match command {
        InvestmentCommand::Add(args) => (InvestmentForm::open_create(backend, context).await, args),
        InvestmentCommand::Edit { id, args } => {
            match InvestmentForm::open_edit(backend, context, id).await {
                Ok(session) => (session, args),
                Err(err) => return Ok(vec![load_error("investment", id, err)]),
            }
        }
    };

    let mut notices = session.form_mut().take_notices();
    if let Err(err) = args.apply(session.form_mut()) {
        notices.push(selection_error(err));
        return Ok(notices);
    }
    notices.push(session.submit(backend).await);
    Ok(notices)
}
