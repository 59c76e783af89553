mod common;

use api_types::{BranchId, ExpenseTypeId, LineId, user::Role};
use forms::{NoticeLevel, Resource, UserForm};
use serde_json::{Value, json};

use common::{Call, FakeBackend};

fn owner_record() -> Value {
    json!({
        "id": 7,
        "username": "ravi",
        "full_name": "Ravi Kumar",
        "role": "owner",
        "mobile_number": "9876543210",
        "email": "ravi@example.com",
        "address": null,
        "pin_code": "600001",
        "allow_old_transaction": false,
        "base_branch": "North",
        "base_line": "L1",
        "line_allocations": [
            {"branch": 1, "line": 1, "branch_name": "North", "line_name": "L1"},
            {"branch": 1, "line": 2, "branch_name": "North", "line_name": "L2"}
        ],
        "user_expenses": []
    })
}

fn agent_record() -> Value {
    json!({
        "id": 8,
        "username": "meena",
        "full_name": "Meena",
        "role": "agent",
        "mobile_number": "9123456780",
        "email": "",
        "base_branch": "North",
        "base_line": "L2",
        "line_allocations": [
            {"branch": 1, "line": 2, "branch_name": "North", "line_name": "L2"}
        ],
        "user_expenses": [
            {"expense": 10, "expense_branchid": 1, "expense_branch_name": "North",
             "expense_lineid": 2, "expense_line_name": "L2"}
        ]
    })
}

fn written_body(backend: &FakeBackend) -> Value {
    match backend.writes().as_slice() {
        [Call::Create(_, body)] | [Call::Update(_, _, body)] => body.clone(),
        other => panic!("expected one write, got {other:?}"),
    }
}

#[tokio::test]
async fn short_password_never_reaches_the_backend() {
    let backend = FakeBackend::seeded();
    let mut session = UserForm::open_create(&backend).await;
    let form = session.form_mut();
    form.set_full_name("Asha");
    form.set_username("asha");
    form.set_password("abc");
    form.set_confirm_password("abc");
    form.set_mobile_number("9000000001");
    form.set_role(Role::Agent);
    form.select_base_branch(Some(BranchId(1))).unwrap();
    form.select_base_line(Some(LineId(1))).unwrap();
    form.select_branches(vec![BranchId(1)]).unwrap();
    form.select_lines(vec![LineId(1)]).unwrap();

    let notice = session.submit(&backend).await;
    assert!(notice.is_error());
    assert!(notice.message.contains("Password must be at least 4 characters"));
    assert!(backend.writes().is_empty());
}

#[tokio::test]
async fn owner_allocations_cover_every_line_of_each_branch() {
    let backend = FakeBackend::seeded();
    let mut session = UserForm::open_create(&backend).await;
    let form = session.form_mut();
    form.set_full_name("Owner One");
    form.set_username("owner1");
    form.set_password("secret");
    form.set_confirm_password("secret");
    form.set_mobile_number("9000000002");
    form.set_role(Role::Owner);
    form.select_base_branch(Some(BranchId(2))).unwrap();
    form.select_base_line(Some(LineId(3))).unwrap();
    form.select_branches(vec![BranchId(1), BranchId(2)]).unwrap();

    let notice = session.submit(&backend).await;
    assert_eq!(notice.title, "User Added!");

    let body = written_body(&backend);
    assert_eq!(
        body["line_allocations"],
        json!([
            {"branch": 1, "line": 1, "branch_name": "North", "line_name": "L1"},
            {"branch": 1, "line": 2, "branch_name": "North", "line_name": "L2"},
            {"branch": 2, "line": 3, "branch_name": "South", "line_name": "L3"}
        ])
    );
    assert_eq!(body["user_expenses"], json!([]));
    assert_eq!(body["password"], "secret");
    assert_eq!(body["base_branch"], "South");
    assert_eq!(body["base_line"], "L3");
}

#[tokio::test]
async fn global_expense_is_replicated_on_every_allocated_line() {
    let backend = FakeBackend::seeded().with_record(Resource::Users, 7, owner_record());
    let mut session = UserForm::open_edit(&backend, 7).await.unwrap();
    let form = session.form_mut();
    let global = form.global_mapping_id();
    form.set_mapping_expenses(global, vec![ExpenseTypeId(10)]).unwrap();

    let notice = session.submit(&backend).await;
    assert_eq!(notice.level, NoticeLevel::Success);

    let body = written_body(&backend);
    assert!(body.get("password").is_none());
    let expenses = body["user_expenses"].as_array().unwrap();
    assert_eq!(expenses.len(), 2);
    for (record, line) in expenses.iter().zip([1, 2]) {
        assert_eq!(record["expense"], 10);
        assert_eq!(record["expense_branchid"], 1);
        assert_eq!(record["expense_lineid"], line);
    }
}

#[tokio::test]
async fn owner_edit_needs_a_global_expense() {
    let backend = FakeBackend::seeded().with_record(Resource::Users, 7, owner_record());
    let mut session = UserForm::open_edit(&backend, 7).await.unwrap();

    let notice = session.submit(&backend).await;
    assert!(notice.is_error());
    assert!(notice.message.contains("Please select at least one global expense"));
    assert!(backend.writes().is_empty());
}

#[tokio::test]
async fn unchanged_agent_edit_skips_put() {
    let backend = FakeBackend::seeded().with_record(Resource::Users, 8, agent_record());
    let mut session = UserForm::open_edit(&backend, 8).await.unwrap();
    assert_eq!(session.form().lines().selection(), &[LineId(2)]);
    assert_eq!(session.form().mappings().len(), 1);
    assert_eq!(session.form().global_mapping().expenses, vec![ExpenseTypeId(10)]);

    let notice = session.submit(&backend).await;
    assert_eq!(notice.level, NoticeLevel::Warning);
    assert_eq!(notice.title, "No Changes");
    assert!(backend.writes().is_empty());
}

#[tokio::test]
async fn agent_edit_submits_changed_lines() {
    let backend = FakeBackend::seeded().with_record(Resource::Users, 8, agent_record());
    backend.reply(400, json!({"mobile_number": ["user with this mobile number already exists."]}));
    let mut session = UserForm::open_edit(&backend, 8).await.unwrap();
    session
        .form_mut()
        .select_lines(vec![LineId(1), LineId(2)])
        .unwrap();

    let notice = session.submit(&backend).await;
    assert!(notice.is_error());
    assert_eq!(notice.title, "Failed to update user");
    assert_eq!(notice.message, "user with this mobile number already exists.");

    let body = written_body(&backend);
    assert_eq!(body["line_allocations"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn username_filter_drops_leading_digits() {
    let backend = FakeBackend::seeded();
    let mut session = UserForm::open_create(&backend).await;
    session.form_mut().set_username("1abc");
    assert_eq!(session.form().username(), "abc");
}

#[tokio::test]
async fn failed_line_list_leaves_an_error_notice() {
    let mut backend = FakeBackend::seeded();
    backend.lines_fail = true;
    let mut session = UserForm::open_create(&backend).await;
    let notices = session.form_mut().take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Failed to load lines.");

    session
        .form_mut()
        .select_branches(vec![BranchId(1)])
        .unwrap();
    assert!(session.form().lines().is_disabled());
}

#[tokio::test]
async fn saved_global_expenses_load_back_into_the_global_mapping() {
    let backend = FakeBackend::seeded().with_record(Resource::Users, 7, owner_record());
    let mut session = UserForm::open_edit(&backend, 7).await.unwrap();
    let form = session.form_mut();
    let global = form.global_mapping_id();
    form.set_mapping_expenses(global, vec![ExpenseTypeId(10)]).unwrap();
    let rent = form.add_mapping(LineId(1)).unwrap();
    form.set_mapping_expenses(rent, vec![ExpenseTypeId(11)]).unwrap();
    assert_eq!(session.submit(&backend).await.title, "User Updated!");
    let saved = written_body(&backend)["user_expenses"].clone();
    assert_eq!(saved.as_array().unwrap().len(), 3);

    let mut record = owner_record();
    record["user_expenses"] = saved;
    let backend = FakeBackend::seeded().with_record(Resource::Users, 7, record);
    let mut session = UserForm::open_edit(&backend, 7).await.unwrap();
    let form = session.form_mut();
    assert!(form.take_notices().is_empty());
    assert_eq!(form.mappings().len(), 2);
    assert_eq!(form.global_mapping().expenses, vec![ExpenseTypeId(10)]);
    assert_eq!(form.mappings()[1].line, Some(LineId(1)));
    assert_eq!(form.mappings()[1].expenses, vec![ExpenseTypeId(11)]);

    for mapping in form.mappings().to_vec() {
        form.set_mapping_expenses(mapping.id, mapping.expenses.clone())
            .unwrap();
    }
    let notice = session.submit(&backend).await;
    assert_eq!(notice.title, "No Changes");

    session.form_mut().set_full_name("Ravi K");
    let notice = session.submit(&backend).await;
    assert_eq!(notice.title, "User Updated!");
    let body = written_body(&backend);
    assert_eq!(body["user_expenses"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn edit_opens_with_lines_disabled_when_the_line_list_fails() {
    let mut backend = FakeBackend::seeded().with_record(Resource::Users, 7, owner_record());
    backend.lines_fail = true;
    let mut session = UserForm::open_edit(&backend, 7).await.unwrap();

    let notices = session.form_mut().take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Failed to load lines.");

    let form = session.form();
    assert_eq!(form.full_name(), "Ravi Kumar");
    assert_eq!(form.branches().selection(), &[BranchId(1)]);
    assert!(form.lines().is_disabled());
    assert_eq!(form.base().branch(), Some(BranchId(1)));
    assert_eq!(form.base().line(), None);
}
