//! Add/edit investment form.
use api_types::{
    Amount, BranchId, LineId, UserId,
    investment::{Investment, InvestmentPayload, PaymentMode},
    user::User,
};
use chrono::NaiveDate;

use crate::{
    backend::{Backend, Resource, fetch_record},
    branch_line::BranchLine,
    cascade::Level,
    error::{FormError, ValidationErrors},
    gateway::Mode,
    input,
    notice::Notice,
    reference::{Cached, ReferenceSet, Wants, fetch_reference},
    session::{Form, FormSession, SessionContext, restore_selection},
    validate::{TITLE, Validator},
};

const WANTS: Wants = Wants {
    branches: true,
    lines: true,
    users: true,
    expense_types: false,
};

/// Smallest accepted investment, in cents.
const MIN_AMOUNT_CENTS: i64 = 100;

#[derive(Debug, Clone)]
pub struct InvestmentForm {
    title: String,
    user: Level<User>,
    place: BranchLine,
    amount: String,
    payment_mode: Option<PaymentMode>,
    date: Option<NaiveDate>,
    comments: String,
    notices: Vec<Notice>,
}

impl InvestmentForm {
    /// A blank form. The branch starts at the session's branch when that
    /// branch is one of the options.
    pub fn new(reference: ReferenceSet, session: &SessionContext) -> Self {
        let mut notices = Vec::new();
        let branches = Cached::load("branches", reference.branches, &mut notices);
        let lines = Cached::load("lines", reference.lines, &mut notices);
        let users = Cached::load("users", reference.users, &mut notices);
        let mut form = Self {
            title: String::new(),
            user: users.root_level("user"),
            place: BranchLine::new(branches, lines),
            amount: String::new(),
            payment_mode: None,
            date: None,
            comments: String::new(),
            notices,
        };
        if let Some(branch) = session.branch
            && let Err(err) = form.place.select_branch(Some(branch))
        {
            tracing::debug!("session branch not preselected: {err}");
        }
        form
    }

    /// A form holding an existing investment. A user, branch or line the
    /// lists do not offer is left unselected.
    pub fn from_record(reference: ReferenceSet, session: &SessionContext, record: &Investment) -> Self {
        let mut form = Self::new(reference, session);
        form.set_title(&record.investment_title);
        restore_selection(form.user.select(record.user), &mut form.notices);
        form.place
            .restore(Some(record.branch), Some(record.line), &mut form.notices);
        form.amount = record.investment_amount.to_string();
        form.payment_mode = Some(record.payment_mode);
        form.date = Some(record.investment_date);
        form.comments = record.comments.clone().unwrap_or_default();
        form
    }

    pub async fn open_create<B: Backend>(backend: &B, session: &SessionContext) -> FormSession<Self> {
        let reference = fetch_reference(backend, WANTS).await;
        FormSession::create(Self::new(reference, session))
    }

    pub async fn open_edit<B: Backend>(
        backend: &B,
        session: &SessionContext,
        id: i64,
    ) -> Result<FormSession<Self>, FormError> {
        let (reference, record) = tokio::join!(
            fetch_reference(backend, WANTS),
            fetch_record::<Investment, _>(backend, Resource::Investments, id),
        );
        let form = Self::from_record(reference, session, &record?);
        Ok(FormSession::edit(id, form))
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn set_title(&mut self, raw: &str) {
        self.title = input::title(raw);
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn select_user(&mut self, id: Option<UserId>) -> Result<(), FormError> {
        match id {
            Some(id) => self.user.select(id).map(drop),
            None => {
                self.user.clear_selection();
                Ok(())
            }
        }
    }

    pub fn select_branch(&mut self, id: Option<BranchId>) -> Result<(), FormError> {
        self.place.select_branch(id).map(drop)
    }

    pub fn select_line(&mut self, id: Option<LineId>) -> Result<(), FormError> {
        self.place.select_line(id).map(drop)
    }

    pub fn set_amount(&mut self, raw: &str) {
        self.amount = raw.trim().to_string();
    }

    pub fn set_payment_mode(&mut self, mode: PaymentMode) {
        self.payment_mode = Some(mode);
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = Some(date);
    }

    pub fn set_comments(&mut self, comments: &str) {
        self.comments = comments.to_string();
    }

    pub fn user_level(&self) -> &Level<User> {
        &self.user
    }

    pub fn place(&self) -> &BranchLine {
        &self.place
    }
}

fn valid_amount(raw: &str) -> bool {
    raw.parse::<Amount>()
        .is_ok_and(|amount| amount.cents() >= MIN_AMOUNT_CENTS)
}

impl Form for InvestmentForm {
    type Payload = InvestmentPayload;

    const RESOURCE: Resource = Resource::Investments;

    fn validate(&self, _mode: Mode) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.field("investment_title", &self.title)
            .required("Please enter investment title")
            .pattern(
                &TITLE,
                "Title must start with a letter and contain only letters, numbers, spaces, - or _",
            );
        v.require("user", self.user.selected(), "Please select a user");
        v.require("branch", self.place.branch(), "Please select a branch");
        v.require("line", self.place.line(), "Please select a line");
        v.field("investment_amount", &self.amount)
            .required("Please enter the investment amount")
            .satisfies(valid_amount, "Amount must be at least 1 with up to 2 decimals");
        v.require("payment_mode", self.payment_mode, "Please select a payment mode");
        v.require("investment_date", self.date, "Please select the investment date");
        v.finish()
    }

    fn payload(&self, _mode: Mode) -> Result<InvestmentPayload, FormError> {
        let missing = |field: &str| FormError::Mapping(format!("{field} is not set"));
        let investment_amount = self
            .amount
            .parse::<Amount>()
            .map_err(|err| FormError::Mapping(format!("investment amount: {err}")))?;
        let comments = self.comments.trim();
        Ok(InvestmentPayload {
            investment_title: self.title.trim().to_string(),
            user: self.user.selected().copied().ok_or_else(|| missing("user"))?,
            branch: self.place.branch().ok_or_else(|| missing("branch"))?,
            line: self.place.line().ok_or_else(|| missing("line"))?,
            investment_amount,
            payment_mode: self.payment_mode.ok_or_else(|| missing("payment mode"))?,
            investment_date: self.date.ok_or_else(|| missing("investment date"))?,
            comments: (!comments.is_empty()).then(|| comments.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use api_types::{InvestmentId, branch::Branch, line::Line};

    use super::*;

    fn user(id: i64, name: &str) -> User {
        User {
            id: UserId(id),
            username: name.to_string(),
            full_name: String::new(),
            role: None,
            mobile_number: None,
            email: None,
            address: None,
            pin_code: None,
            allow_old_transaction: false,
            base_branch: None,
            base_line: None,
            line_allocations: Vec::new(),
            user_expenses: Vec::new(),
        }
    }

    fn reference() -> ReferenceSet {
        ReferenceSet {
            branches: Ok(vec![
                Branch {
                    id: BranchId(1),
                    branch_name: "North".to_string(),
                },
                Branch {
                    id: BranchId(2),
                    branch_name: "South".to_string(),
                },
            ]),
            lines: Ok(vec![Line {
                line_id: LineId(7),
                line_name: "Market".to_string(),
                branch_id: BranchId(2),
                branch_name: "South".to_string(),
            }]),
            users: Ok(vec![user(4, "ann")]),
            ..ReferenceSet::default()
        }
    }

    fn session(branch: Option<i64>) -> SessionContext {
        SessionContext {
            branch: branch.map(BranchId),
            ..SessionContext::default()
        }
    }

    #[test]
    fn session_branch_is_preselected() {
        let form = InvestmentForm::new(reference(), &session(Some(2)));
        assert_eq!(form.place().branch(), Some(BranchId(2)));
        assert_eq!(form.place().line_level().options().len(), 1);

        let form = InvestmentForm::new(reference(), &session(Some(99)));
        assert_eq!(form.place().branch(), None);
    }

    #[test]
    fn amount_must_be_at_least_one() {
        let mut form = InvestmentForm::new(reference(), &session(None));
        for (raw, ok) in [("0.99", false), ("1", true), ("12.345", false), ("abc", false)] {
            form.set_amount(raw);
            let errors = form.validate(Mode::Create).unwrap_err();
            assert_eq!(errors.get("investment_amount").is_none(), ok, "{raw}");
        }
    }

    #[test]
    fn payload_carries_ids_and_formatted_amount() {
        let record = Investment {
            id: InvestmentId(9),
            investment_title: "Gold fund".to_string(),
            user: UserId(4),
            branch: BranchId(2),
            line: LineId(7),
            investment_amount: Amount::units(1500),
            payment_mode: PaymentMode::Upi,
            investment_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            comments: None,
        };
        let form = InvestmentForm::from_record(reference(), &session(None), &record);
        assert!(form.validate(Mode::Edit(9)).is_ok());
        let body = serde_json::to_value(form.payload(Mode::Edit(9)).unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "investment_title": "Gold fund",
                "user": 4,
                "branch": 2,
                "line": 7,
                "investment_amount": "1500.00",
                "payment_mode": "upi",
                "investment_date": "2024-03-01",
                "comments": null
            })
        );
    }

    #[test]
    fn title_filter_requires_leading_letter() {
        let mut form = InvestmentForm::new(reference(), &session(None));
        form.set_title("9 Gold-fund_2!");
        assert_eq!(form.title(), "Gold-fund_2");
    }
}
