use crate::error::ValidationError;
use crate::model::{category, Amount, TransactionKind};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The span of time a budget cap applies to.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Monthly,
    Weekly,
}

serde_plain::derive_display_from_serialize!(Period);
serde_plain::derive_fromstr_from_deserialize!(Period);

impl Period {
    /// The inclusive start of the current period window, in local time.
    ///
    /// - `Monthly`: midnight on the first day of the month that `now` falls in.
    /// - `Weekly`: exactly seven days before `now`.
    pub fn window_start(self, now: NaiveDateTime) -> NaiveDateTime {
        match self {
            Period::Monthly => {
                let today = now.date();
                today.with_day(1).unwrap_or(today).and_time(NaiveTime::MIN)
            }
            Period::Weekly => now - chrono::Duration::days(7),
        }
    }

    /// Whether a transaction dated `date` falls within the window that ends at `now`. A date is
    /// treated as local midnight at the start of that day.
    pub fn contains(self, date: NaiveDate, now: NaiveDateTime) -> bool {
        let at = date.and_time(NaiveTime::MIN);
        self.window_start(now) <= at && at <= now
    }
}

/// A spending cap for one expense category.
///
/// `spent` is a snapshot taken when the budget was last set or refreshed; it does not follow
/// later transaction changes.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    id: String,
    category: String,
    amount: Amount,
    spent: Amount,
    period: Period,
}

impl Budget {
    pub fn new(id: impl Into<String>, input: BudgetInput, spent: Amount) -> Self {
        Self {
            id: id.into(),
            category: input.category,
            amount: input.amount,
            spent,
            period: input.period,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn spent(&self) -> Amount {
        self.spent
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub(crate) fn set_spent(&mut self, spent: Amount) {
        self.spent = spent;
    }

    /// `amount - spent`; negative when over budget.
    pub fn remaining(&self) -> Amount {
        self.amount - self.spent
    }

    /// `spent / amount * 100`, rounded to two places. Zero when the cap itself is zero, which can
    /// only happen with imported data. Saturates at `Decimal::MAX` when the ratio is too large to
    /// represent.
    pub fn percent_used(&self) -> Decimal {
        if self.amount.is_zero() {
            return Decimal::ZERO;
        }
        self.spent
            .value()
            .checked_div(self.amount.value())
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map(|percent| percent.round_dp(2))
            .unwrap_or(Decimal::MAX)
    }

    pub fn is_over_budget(&self) -> bool {
        self.spent > self.amount
    }

    pub fn status(&self) -> BudgetStatus {
        let percent = self.percent_used();
        if percent > Decimal::ONE_HUNDRED {
            BudgetStatus::Over
        } else if percent > Decimal::from(75) {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Ok
        }
    }
}

/// How close a budget is to its cap.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// At or below 75% of the cap.
    Ok,
    /// Above 75% and at or below 100%.
    Warning,
    /// Above 100%.
    Over,
}

serde_plain::derive_display_from_serialize!(BudgetStatus);

/// Budget fields entered by the user that have passed validation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BudgetInput {
    category: String,
    amount: Amount,
    period: Period,
}

impl BudgetInput {
    /// Validates the fields of a budget. Budgets can only be set for expense categories.
    pub fn new(
        category: impl Into<String>,
        amount: Amount,
        period: Period,
    ) -> std::result::Result<Self, ValidationError> {
        let category = category.into().trim().to_string();
        if category.is_empty() {
            return Err(ValidationError::MissingField("category"));
        }
        if !amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount(amount));
        }
        if category::find(TransactionKind::Expense, &category).is_none() {
            return Err(ValidationError::UnknownCategory {
                kind: TransactionKind::Expense,
                category,
            });
        }
        Ok(Self {
            category,
            amount,
            period,
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn period(&self) -> Period {
        self.period
    }
}
