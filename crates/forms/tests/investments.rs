mod common;

use api_types::{BranchId, LineId, UserId, investment::PaymentMode, user::User};
use chrono::NaiveDate;
use forms::{InvestmentForm, NoticeLevel, Resource, SessionContext};
use serde_json::json;

use common::{Call, FakeBackend};

fn backend() -> FakeBackend {
    let mut backend = FakeBackend::seeded();
    backend.users = vec![serde_json::from_value::<User>(json!({"id": 3, "username": "kavi"})).unwrap()];
    backend
}

fn session_in(branch: i64) -> SessionContext {
    SessionContext {
        username: Some("admin".to_string()),
        branch: Some(BranchId(branch)),
        ..SessionContext::default()
    }
}

#[tokio::test]
async fn create_defaults_to_session_branch_and_posts_amount_as_decimal() {
    let backend = backend();
    let mut session = InvestmentForm::open_create(&backend, &session_in(2)).await;
    let form = session.form_mut();
    assert_eq!(form.place().branch(), Some(BranchId(2)));

    form.set_title("Seed capital");
    form.select_user(Some(UserId(3))).unwrap();
    form.select_line(Some(LineId(3))).unwrap();
    form.set_amount("2500,5");
    form.set_payment_mode(PaymentMode::BankTransfer);
    form.set_date(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());

    let notice = session.submit(&backend).await;
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.title, "Investment Added!");
    assert_eq!(
        backend.writes(),
        vec![Call::Create(
            Resource::Investments,
            json!({
                "investment_title": "Seed capital",
                "user": 3,
                "branch": 2,
                "line": 3,
                "investment_amount": "2500.50",
                "payment_mode": "bank_transfer",
                "investment_date": "2025-01-15",
                "comments": null
            })
        )]
    );
}

#[tokio::test]
async fn every_missing_field_is_reported_at_once() {
    let backend = backend();
    let mut session = InvestmentForm::open_create(&backend, &SessionContext::default()).await;
    session.form_mut().set_amount("0.50");

    let notice = session.submit(&backend).await;
    assert!(notice.is_error());
    for message in [
        "Please enter investment title",
        "Please select a user",
        "Please select a branch",
        "Please select a line",
        "Amount must be at least 1 with up to 2 decimals",
        "Please select a payment mode",
        "Please select the investment date",
    ] {
        assert!(notice.message.contains(message), "missing {message:?}");
    }
    assert!(backend.writes().is_empty());
}

fn seed_record(user: i64) -> serde_json::Value {
    json!({
        "id": 12,
        "investment_title": "Seed capital",
        "user": user,
        "branch": 1,
        "line": 2,
        "investment_amount": 1500,
        "payment_mode": "cash",
        "investment_date": "2024-12-01",
        "comments": "first round"
    })
}

#[tokio::test]
async fn edit_accepts_numeric_amounts_and_detects_no_change() {
    let backend = backend().with_record(Resource::Investments, 12, seed_record(3));
    let mut session = InvestmentForm::open_edit(&backend, &session_in(2), 12)
        .await
        .unwrap();
    assert_eq!(session.form().place().branch(), Some(BranchId(1)));

    let notice = session.submit(&backend).await;
    assert_eq!(notice.title, "No Changes");
    assert!(backend.writes().is_empty());

    session.form_mut().set_comments("second round");
    let notice = session.submit(&backend).await;
    assert_eq!(notice.title, "Investment Updated!");
    match backend.writes().as_slice() {
        [Call::Update(Resource::Investments, 12, body)] => {
            assert_eq!(body["investment_amount"], "1500.00");
            assert_eq!(body["comments"], "second round");
        }
        other => panic!("unexpected writes: {other:?}"),
    }
}

#[tokio::test]
async fn edit_opens_with_an_unlisted_user_left_unselected() {
    let backend = backend().with_record(Resource::Investments, 12, seed_record(42));
    let mut session = InvestmentForm::open_edit(&backend, &SessionContext::default(), 12)
        .await
        .unwrap();

    let notices = session.form_mut().take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert!(notices[0].message.contains("\"42\""));

    let form = session.form();
    assert_eq!(form.user_level().selected(), None);
    assert_eq!(form.place().branch(), Some(BranchId(1)));
    assert_eq!(form.place().line(), Some(LineId(2)));

    let notice = session.submit(&backend).await;
    assert!(notice.message.contains("Please select a user"));
    assert!(backend.writes().is_empty());
}

#[tokio::test]
async fn edit_opens_with_users_disabled_when_the_user_list_fails() {
    let mut backend = backend().with_record(Resource::Investments, 12, seed_record(3));
    backend.users_fail = true;
    let mut session = InvestmentForm::open_edit(&backend, &SessionContext::default(), 12)
        .await
        .unwrap();

    let notices = session.form_mut().take_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].is_error());
    assert_eq!(notices[0].message, "Failed to load users.");
    assert!(session.form().user_level().is_disabled());
    assert_eq!(session.form().title(), "Seed capital");
}
