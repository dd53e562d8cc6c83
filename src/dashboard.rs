//! Dashboard aggregates computed from `/dashboard/stats/`

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::models::{DashboardStats, DashboardTransaction};

/// Calendar month, rendered `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDateTime) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn of_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    /// `n` months back, oldest first, ending with `self`
    pub fn trailing(self, n: usize) -> Vec<YearMonth> {
        let mut months = Vec::with_capacity(n);
        let mut current = self;
        for _ in 0..n {
            months.push(current);
            current = current.previous();
        }
        months.reverse();
        months
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("expected YYYY-MM, got {:?}", s))?;
        let year: i32 = year.parse()?;
        let month: u32 = month.parse()?;
        YearMonth::new(year, month).ok_or_else(|| anyhow::anyhow!("month out of range: {}", month))
    }
}

/// Dashboard selectors; `None` means "all"
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DashboardFilter {
    pub month: Option<YearMonth>,
    pub account_id: Option<u64>,
}

impl DashboardFilter {
    pub fn matches(&self, t: &DashboardTransaction) -> bool {
        let tx = &t.transaction;
        if tx.is_cancelled {
            return false;
        }
        if let Some(month) = self.month {
            if YearMonth::of(tx.created_at) != month {
                return false;
            }
        }
        match self.account_id {
            Some(id) => tx.touches_account(id),
            None => true,
        }
    }

    pub fn apply<'a>(&self, transactions: &'a [DashboardTransaction]) -> Vec<&'a DashboardTransaction> {
        transactions.iter().filter(|t| self.matches(t)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_balance: Decimal,
    pub total_income: Decimal,
    pub total_expense: Decimal,
}

pub fn summarize(stats: &DashboardStats, filter: &DashboardFilter) -> Summary {
    let total_balance = match filter.account_id {
        None => stats.total_balance,
        Some(id) => stats
            .accounts
            .iter()
            .find(|a| a.id == id)
            .map_or(Decimal::ZERO, |a| a.balance),
    };

    let filtered = filter.apply(&stats.transactions);
    Summary {
        total_balance,
        total_income: filtered
            .iter()
            .filter(|t| t.is_income)
            .map(|t| t.transaction.amount)
            .sum(),
        total_expense: filtered
            .iter()
            .filter(|t| t.is_expense)
            .map(|t| t.transaction.amount)
            .sum(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub at: NaiveDateTime,
    pub value: Decimal,
}

fn chronological<'a>(transactions: &[&'a DashboardTransaction]) -> Vec<&'a DashboardTransaction> {
    let mut sorted = transactions.to_vec();
    sorted.sort_by_key(|t| t.transaction.created_at);
    sorted
}

fn signed_amount(t: &DashboardTransaction) -> Decimal {
    if t.is_income {
        t.transaction.amount
    } else if t.is_expense {
        -t.transaction.amount
    } else {
        Decimal::ZERO
    }
}

/// Balance after each transaction, walked back from `current_balance`
pub fn balance_evolution(transactions: &[&DashboardTransaction], current_balance: Decimal) -> Vec<Point> {
    let sorted = chronological(transactions);
    let mut balance = current_balance - sorted.iter().map(|t| signed_amount(t)).sum::<Decimal>();

    sorted
        .into_iter()
        .map(|t| {
            balance += signed_amount(t);
            Point {
                at: t.transaction.created_at,
                value: balance,
            }
        })
        .collect()
}

pub fn income_evolution(transactions: &[&DashboardTransaction]) -> Vec<Point> {
    chronological(transactions)
        .into_iter()
        .filter(|t| t.is_income)
        .map(|t| Point {
            at: t.transaction.created_at,
            value: t.transaction.amount,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyFlow {
    pub month: YearMonth,
    pub income: Decimal,
    pub expense: Decimal,
    /// Running income minus expense since the first month shown
    pub balance: Decimal,
}

/// Twelve months ending at `today`'s month, oldest first
pub fn cash_flow(transactions: &[&DashboardTransaction], today: NaiveDate) -> Vec<MonthlyFlow> {
    let mut flows: Vec<MonthlyFlow> = YearMonth::of_date(today)
        .trailing(12)
        .into_iter()
        .map(|month| MonthlyFlow {
            month,
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
            balance: Decimal::ZERO,
        })
        .collect();

    for t in transactions {
        let month = YearMonth::of(t.transaction.created_at);
        let Some(flow) = flows.iter_mut().find(|f| f.month == month) else {
            continue;
        };
        if t.is_income {
            flow.income += t.transaction.amount;
        } else if t.is_expense {
            flow.expense += t.transaction.amount;
        }
    }

    let mut cumulative = Decimal::ZERO;
    for flow in flows.iter_mut() {
        cumulative += flow.income - flow.expense;
        flow.balance = cumulative;
    }
    flows
}

/// Month selector options, newest first
pub fn available_months(today: NaiveDate) -> Vec<YearMonth> {
    let mut months = YearMonth::of_date(today).trailing(12);
    months.reverse();
    months
}
