use api_types::{BranchId, LineId, line::Line, user::UserQuery};
use clap::Args;
use forms::{Backend, Notice, filter::filter_children_any};

use crate::{error::Result, output::print_table};

#[derive(Args, Debug)]
pub struct LinesArgs {
    /// Only lines of these branches (repeatable).
    #[arg(long = "branch")]
    branches: Vec<i64>,
}

#[derive(Args, Debug)]
pub struct UsersArgs {
    #[arg(long)]
    branch_name: Option<String>,
    #[arg(long)]
    line_name: Option<String>,
}

#[derive(Args, Debug)]
#[group(multiple = false)]
pub struct ExpenseTypesArgs {
    /// Only expense types of this line.
    #[arg(long)]
    line: Option<i64>,
    /// Only global expense types.
    #[arg(long)]
    global: bool,
}

fn failed(what: &str, err: forms::BackendError) -> Vec<Notice> {
    vec![Notice::error("Error", format!("Failed to load {what}: {err}"))]
}

pub async fn branches<B: Backend>(backend: &B) -> Result<Vec<Notice>> {
    let branches = match backend.branches().await {
        Ok(branches) => branches,
        Err(err) => return Ok(failed("branches", err)),
    };
    let rows: Vec<Vec<String>> = branches
        .iter()
        .map(|b| vec![b.id.to_string(), b.branch_name.clone()])
        .collect();
    print_table(&["ID", "BRANCH"], &rows);
    Ok(Vec::new())
}

pub async fn lines<B: Backend>(backend: &B, args: LinesArgs) -> Result<Vec<Notice>> {
    let lines = match backend.lines().await {
        Ok(lines) => lines,
        Err(err) => return Ok(failed("lines", err)),
    };
    let branches: Vec<BranchId> = args.branches.into_iter().map(BranchId).collect();
    let shown: Vec<&Line> = if branches.is_empty() {
        lines.iter().collect()
    } else {
        filter_children_any(&branches, &lines, |line: &Line| Some(line.branch_id))
    };
    let rows: Vec<Vec<String>> = shown
        .iter()
        .map(|l| {
            vec![
                l.line_id.to_string(),
                l.line_name.clone(),
                l.branch_id.to_string(),
                l.branch_name.clone(),
            ]
        })
        .collect();
    print_table(&["ID", "LINE", "BRANCH ID", "BRANCH"], &rows);
    Ok(Vec::new())
}

pub async fn users<B: Backend>(backend: &B, args: UsersArgs) -> Result<Vec<Notice>> {
    let query = UserQuery {
        branch_name: args.branch_name,
        line_name: args.line_name,
    };
    let users = match backend.users(&query).await {
        Ok(users) => users,
        Err(err) => return Ok(failed("users", err)),
    };
    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|u| {
            vec![
                u.id.to_string(),
                u.username.clone(),
                u.full_name.clone(),
                u.role.map(|r| r.as_str()).unwrap_or("-").to_string(),
                u.base_branch.clone().unwrap_or_default(),
                u.base_line.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(
        &["ID", "USERNAME", "NAME", "ROLE", "BASE BRANCH", "BASE LINE"],
        &rows,
    );
    Ok(Vec::new())
}

pub async fn expense_types<B: Backend>(backend: &B, args: ExpenseTypesArgs) -> Result<Vec<Notice>> {
    let types = match backend.expense_types().await {
        Ok(types) => types,
        Err(err) => return Ok(failed("expense types", err)),
    };
    let line = args.line.map(LineId);
    let rows: Vec<Vec<String>> = types
        .iter()
        .filter(|ty| match (line, args.global) {
            (Some(line), _) => ty.line_id == Some(line),
            (None, true) => ty.is_global(),
            (None, false) => true,
        })
        .map(|ty| {
            let place = match ty.line_id {
                Some(line) => line.to_string(),
                None => "global".to_string(),
            };
            let status = if ty.is_active() { "active" } else { "inactive" };
            vec![ty.id.to_string(), ty.name.clone(), place, status.to_string()]
        })
        .collect();
    print_table(&["ID", "EXPENSE TYPE", "LINE", "STATUS"], &rows);
    Ok(Vec::new())
}
