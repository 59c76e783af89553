use std::fmt;

use serde::{Deserialize, Serialize};

pub use money::{Amount, AmountError};

mod money;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// Surrogate id of a branch (`id` in `api/branch_dd`).
    BranchId
);
id_type!(
    /// Surrogate id of a line (`line_id` in `api/line_dd`).
    LineId
);
id_type!(UserId);
id_type!(ExpenseTypeId);
id_type!(InvestmentId);

pub mod branch {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Branch {
        pub id: BranchId,
        pub branch_name: String,
    }
}

pub mod line {
    use super::*;

    /// A line always belongs to exactly one branch.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Line {
        pub line_id: LineId,
        pub line_name: String,
        pub branch_id: BranchId,
        #[serde(default)]
        pub branch_name: String,
    }
}

pub mod user {
    use super::*;

    /// Role of a user inside the organization.
    ///
    /// - `owner` and `manager` operate on whole branches: their allocations
    ///   cover every line of each selected branch.
    /// - `agent` operates on individually selected lines.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Role {
        Owner,
        Manager,
        Agent,
    }

    impl Role {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Owner => "owner",
                Self::Manager => "manager",
                Self::Agent => "agent",
            }
        }

        /// Whether the role is allocated per branch rather than per line.
        pub fn spans_branches(self) -> bool {
            matches!(self, Self::Owner | Self::Manager)
        }
    }

    impl std::str::FromStr for Role {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_ascii_lowercase().as_str() {
                "owner" => Ok(Self::Owner),
                "manager" => Ok(Self::Manager),
                "agent" => Ok(Self::Agent),
                other => Err(format!("unknown role: {other}")),
            }
        }
    }

    /// A (branch, line) pair a user is authorized to operate in.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LineAllocation {
        pub branch: BranchId,
        pub line: LineId,
        #[serde(default)]
        pub branch_name: String,
        #[serde(default)]
        pub line_name: String,
    }

    /// An expense type enabled for a user on one line.
    ///
    /// `expense_lineid` is only `None` in legacy records; the client always
    /// submits a concrete line.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserExpense {
        pub expense: ExpenseTypeId,
        pub expense_branchid: Option<BranchId>,
        #[serde(default)]
        pub expense_branch_name: String,
        pub expense_lineid: Option<LineId>,
        #[serde(default)]
        pub expense_line_name: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct User {
        pub id: UserId,
        pub username: String,
        #[serde(default)]
        pub full_name: String,
        pub role: Option<Role>,
        #[serde(default)]
        pub mobile_number: Option<String>,
        #[serde(default)]
        pub email: Option<String>,
        #[serde(default)]
        pub address: Option<String>,
        #[serde(default)]
        pub pin_code: Option<String>,
        #[serde(default)]
        pub allow_old_transaction: bool,
        /// Base branch, by name.
        #[serde(default, alias = "base_branch_name")]
        pub base_branch: Option<String>,
        /// Base line, by name.
        #[serde(default, alias = "base_line_name")]
        pub base_line: Option<String>,
        #[serde(default)]
        pub line_allocations: Vec<LineAllocation>,
        #[serde(default)]
        pub user_expenses: Vec<UserExpense>,
    }

    /// Body of `POST <users>` and `PUT <users><id>/`.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserPayload {
        pub username: String,
        pub full_name: String,
        pub mobile_number: String,
        pub email: String,
        pub address: Option<String>,
        pub pin_code: Option<String>,
        pub role: Role,
        pub allow_old_transaction: bool,
        pub base_branch: Option<String>,
        pub base_line: Option<String>,
        pub line_allocations: Vec<LineAllocation>,
        pub user_expenses: Vec<UserExpense>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub password: Option<String>,
    }

    /// Query filters accepted by the users collection.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserQuery {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub branch_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub line_name: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ResetPassword {
        pub new_password: String,
    }
}

pub mod expense_type {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ExpenseStatus {
        #[default]
        Active,
        Inactive,
    }

    impl std::str::FromStr for ExpenseStatus {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_ascii_lowercase().as_str() {
                "active" => Ok(Self::Active),
                "inactive" => Ok(Self::Inactive),
                other => Err(format!("unknown status: {other}")),
            }
        }
    }

    /// An expense category.
    ///
    /// Both `branch_id` and `line_id` null marks a global type that applies
    /// to every line; otherwise the type belongs to one line.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ExpenseType {
        pub id: ExpenseTypeId,
        pub name: String,
        #[serde(default)]
        pub status: ExpenseStatus,
        pub branch_id: Option<BranchId>,
        pub line_id: Option<LineId>,
    }

    impl ExpenseType {
        pub fn is_global(&self) -> bool {
            self.branch_id.is_none() && self.line_id.is_none()
        }

        pub fn is_active(&self) -> bool {
            self.status == ExpenseStatus::Active
        }
    }

    /// Body of `POST <expense_types>` and `PUT <expense_types><id>/`.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ExpenseTypePayload {
        pub name: String,
        pub branch_id: Option<BranchId>,
        pub line_id: Option<LineId>,
        pub status: ExpenseStatus,
    }
}

pub mod investment {
    use chrono::NaiveDate;

    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentMode {
        Cash,
        Upi,
        BankTransfer,
        Cheque,
        Card,
    }

    impl PaymentMode {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Cash => "cash",
                Self::Upi => "upi",
                Self::BankTransfer => "bank_transfer",
                Self::Cheque => "cheque",
                Self::Card => "card",
            }
        }
    }

    impl std::str::FromStr for PaymentMode {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
                "cash" => Ok(Self::Cash),
                "upi" => Ok(Self::Upi),
                "bank_transfer" => Ok(Self::BankTransfer),
                "cheque" => Ok(Self::Cheque),
                "card" => Ok(Self::Card),
                other => Err(format!("unknown payment mode: {other}")),
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Investment {
        pub id: InvestmentId,
        pub investment_title: String,
        pub user: UserId,
        pub branch: BranchId,
        pub line: LineId,
        pub investment_amount: Amount,
        pub payment_mode: PaymentMode,
        pub investment_date: NaiveDate,
        #[serde(default)]
        pub comments: Option<String>,
    }

    /// Body of `POST <investments>` and `PUT <investments><id>/`.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct InvestmentPayload {
        pub investment_title: String,
        pub user: UserId,
        pub branch: BranchId,
        pub line: LineId,
        pub investment_amount: Amount,
        pub payment_mode: PaymentMode,
        pub investment_date: NaiveDate,
        pub comments: Option<String>,
    }
}
