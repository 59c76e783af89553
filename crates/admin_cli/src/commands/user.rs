use api_types::{BranchId, ExpenseTypeId, LineId, user::Role};
use clap::{Args, Subcommand};
use forms::{Backend, FormError, Mode, Notice, UserForm};

use super::{load_error, selection_error};
use crate::{error::Result, prompt};

#[derive(Args, Debug)]
pub struct User {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    Add(UserArgs),
    Edit {
        id: i64,
        #[command(flatten)]
        args: UserArgs,
    },
}

#[derive(Args, Debug, Default)]
pub struct UserArgs {
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    username: Option<String>,
    /// Asked for interactively when adding a user without it.
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    confirm_password: Option<String>,
    #[arg(long)]
    mobile: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    pin_code: Option<String>,
    /// owner, manager or agent.
    #[arg(long)]
    role: Option<Role>,
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    allow_old_transaction: Option<bool>,
    #[arg(long)]
    base_branch: Option<i64>,
    #[arg(long)]
    base_line: Option<i64>,
    /// Allocated branches; replaces the current ones.
    #[arg(long = "branch", value_delimiter = ',')]
    branches: Vec<i64>,
    /// Allocated lines (agents only); replaces the current ones.
    #[arg(long = "line", value_delimiter = ',')]
    lines: Vec<i64>,
    /// `LINE=E1,E2` for a line, `global=E1,E2` for every line. An empty
    /// list drops the line's mapping.
    #[arg(long = "expenses", value_parser = parse_expenses)]
    expenses: Vec<ExpenseSpec>,
}

/// Expense types for one line, or for the global mapping when `line` is
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseSpec {
    line: Option<LineId>,
    expenses: Vec<ExpenseTypeId>,
}

fn parse_expenses(raw: &str) -> std::result::Result<ExpenseSpec, String> {
    let (target, list) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected LINE=E1,E2 or global=E1,E2, got {raw:?}"))?;
    let target = target.trim();
    let line = if target.eq_ignore_ascii_case("global") {
        None
    } else {
        let id = target
            .parse::<i64>()
            .map_err(|_| format!("invalid line id {target:?}"))?;
        Some(LineId(id))
    };
    let expenses = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map(ExpenseTypeId)
                .map_err(|_| format!("invalid expense type id {s:?}"))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ExpenseSpec { line, expenses })
}

impl UserArgs {
    fn apply(self, form: &mut UserForm) -> std::result::Result<(), FormError> {
        if let Some(value) = &self.full_name {
            form.set_full_name(value);
        }
        if let Some(value) = &self.username {
            form.set_username(value);
        }
        if let Some(value) = &self.password {
            form.set_password(value);
        }
        if let Some(value) = &self.confirm_password {
            form.set_confirm_password(value);
        }
        if let Some(value) = &self.mobile {
            form.set_mobile_number(value);
        }
        if let Some(value) = &self.email {
            form.set_email(value);
        }
        if let Some(value) = &self.address {
            form.set_address(value);
        }
        if let Some(value) = &self.pin_code {
            form.set_pin_code(value);
        }
        if let Some(allow) = self.allow_old_transaction {
            form.set_allow_old_transaction(allow);
        }
        if let Some(role) = self.role {
            form.set_role(role);
        }
        if let Some(branch) = self.base_branch {
            form.select_base_branch(Some(BranchId(branch)))?;
        }
        if let Some(line) = self.base_line {
            form.select_base_line(Some(LineId(line)))?;
        }
        if !self.branches.is_empty() {
            form.select_branches(self.branches.into_iter().map(BranchId).collect())?;
        }
        if !self.lines.is_empty() {
            form.select_lines(self.lines.into_iter().map(LineId).collect())?;
        }
        for spec in self.expenses {
            apply_expenses(form, spec)?;
        }
        Ok(())
    }
}

fn apply_expenses(form: &mut UserForm, spec: ExpenseSpec) -> std::result::Result<(), FormError> {
    let Some(line) = spec.line else {
        let id = form.global_mapping_id();
        return form.set_mapping_expenses(id, spec.expenses);
    };
    let existing = form
        .mappings()
        .iter()
        .find(|m| m.line == Some(line))
        .map(|m| m.id);
    match existing {
        Some(id) if spec.expenses.is_empty() => form.remove_mapping(id),
        Some(id) => form.set_mapping_expenses(id, spec.expenses),
        None if spec.expenses.is_empty() => Ok(()),
        None => {
            let id = form.add_mapping(line)?;
            form.set_mapping_expenses(id, spec.expenses)
        }
    }
}

/// New users are created without expenses; mappings are set on edit.
fn drop_expenses_on_add(mode: Mode, args: &mut UserArgs) -> Option<Notice> {
    if mode.is_edit() || args.expenses.is_empty() {
        return None;
    }
    args.expenses.clear();
    Some(Notice::warning(
        "Expenses ignored",
        "Expenses can only be set when editing a user",
    ))
}

pub async fn run<B: Backend>(backend: &B, command: UserCommand) -> Result<Vec<Notice>> {
    let (mut session, mut args) = match command {
        UserCommand::Add(args) => (UserForm::open_create(backend).await, args),
        UserCommand::Edit { id, args } => match UserForm::open_edit(backend, id).await {
            Ok(session) => (session, args),
            Err(err) => return Ok(vec![load_error("user", id, err)]),
        },
    };

    if !session.mode().is_edit() {
        if args.password.is_none() {
            args.password = Some(prompt::password("Password: ")?);
            if args.confirm_password.is_none() {
                args.confirm_password = Some(prompt::password("Confirm password: ")?);
            }
        }
        if args.confirm_password.is_none() {
            args.confirm_password = args.password.clone();
        }
    }

    let mut notices = session.form_mut().take_notices();
    notices.extend(drop_expenses_on_add(session.mode(), &mut args));
    if let Err(err) = args.apply(session.form_mut()) {
        notices.push(selection_error(err));
        return Ok(notices);
    }
    notices.push(session.submit(backend).await);
    Ok(notices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expenses_for_a_line() {
        assert_eq!(
            parse_expenses("7=10, 11").unwrap(),
            ExpenseSpec {
                line: Some(LineId(7)),
                expenses: vec![ExpenseTypeId(10), ExpenseTypeId(11)],
            }
        );
    }

    #[test]
    fn global_expenses_and_empty_lists() {
        let global = parse_expenses("Global=3").unwrap();
        assert_eq!(global.line, None);
        assert_eq!(global.expenses, vec![ExpenseTypeId(3)]);

        let dropped = parse_expenses("2=").unwrap();
        assert_eq!(dropped.line, Some(LineId(2)));
        assert!(dropped.expenses.is_empty());
    }

    #[test]
    fn expenses_are_dropped_with_a_warning_on_add() {
        let mut args = UserArgs {
            expenses: vec![parse_expenses("global=10").unwrap()],
            ..UserArgs::default()
        };
        let notice = drop_expenses_on_add(Mode::Create, &mut args).unwrap();
        assert_eq!(notice.level, forms::NoticeLevel::Warning);
        assert!(args.expenses.is_empty());

        let mut args = UserArgs {
            expenses: vec![parse_expenses("3=11").unwrap()],
            ..UserArgs::default()
        };
        assert!(drop_expenses_on_add(Mode::Edit(3), &mut args).is_none());
        assert_eq!(args.expenses.len(), 1);
    }

    #[test]
    fn malformed_expenses_are_rejected() {
        assert!(parse_expenses("7").is_err());
        assert!(parse_expenses("x=1").is_err());
        assert!(parse_expenses("1=a").is_err());
    }
}
