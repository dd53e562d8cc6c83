//! Transaction history: tabs, day grouping, pagination and statements

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;

use crate::dashboard::YearMonth;
use crate::models::{Account, Transaction};
use crate::transfer::receipt::format_euros;

/// Days shown per page
pub const DAYS_PER_PAGE: usize = 10;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize,
    strum_macros::Display, strum_macros::EnumString, strum_macros::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum HistoryTab {
    #[default]
    All,
    Revenues,
    Expenses,
}

/// Account ids owned by the signed-in user
#[derive(Debug, Clone, Default)]
pub struct OwnedAccounts(HashSet<u64>);

impl OwnedAccounts {
    pub fn new(accounts: &[Account]) -> Self {
        Self(accounts.iter().map(|a| a.id).collect())
    }

    pub fn contains(&self, id: Option<u64>) -> bool {
        id.map_or(false, |id| self.0.contains(&id))
    }

    /// Money arrived on one of the user's accounts
    pub fn is_entry(&self, t: &Transaction) -> bool {
        self.contains(t.destination_account_id)
    }

    /// Money left the user's accounts entirely
    pub fn is_expense(&self, t: &Transaction) -> bool {
        self.contains(t.source_account_id) && !self.contains(t.destination_account_id)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryFilter {
    pub account_id: Option<u64>,
    pub month: Option<YearMonth>,
    pub tab: HistoryTab,
}

impl HistoryFilter {
    pub fn matches(&self, t: &Transaction, owned: &OwnedAccounts) -> bool {
        if let Some(id) = self.account_id {
            if !t.touches_account(id) {
                return false;
            }
        }
        if let Some(month) = self.month {
            if YearMonth::of(t.created_at) != month {
                return false;
            }
        }
        match self.tab {
            HistoryTab::All => true,
            HistoryTab::Revenues => owned.contains(t.destination_account_id),
            HistoryTab::Expenses => owned.contains(t.source_account_id),
        }
    }

    pub fn apply<'a>(&self, transactions: &'a [Transaction], owned: &OwnedAccounts) -> Vec<&'a Transaction> {
        transactions.iter().filter(|t| self.matches(t, owned)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup<'a> {
    pub day: NaiveDate,
    pub transactions: Vec<&'a Transaction>,
}

/// Group by calendar day, days in the order they are first seen
pub fn group_by_day<'a>(transactions: &[&'a Transaction]) -> Vec<DayGroup<'a>> {
    let mut groups: Vec<DayGroup<'a>> = Vec::new();
    for &t in transactions {
        let day = t.created_at.date();
        match groups.iter_mut().find(|g| g.day == day) {
            Some(group) => group.transactions.push(t),
            None => groups.push(DayGroup {
                day,
                transactions: vec![t],
            }),
        }
    }
    groups
}

pub fn total_pages(groups: usize) -> usize {
    groups.div_ceil(DAYS_PER_PAGE)
}

/// 1-based page of day groups; out-of-range pages are empty
pub fn page<'g, 'a>(groups: &'g [DayGroup<'a>], number: usize) -> &'g [DayGroup<'a>] {
    if number == 0 {
        return &[];
    }
    let start = (number - 1).saturating_mul(DAYS_PER_PAGE);
    if start >= groups.len() {
        return &[];
    }
    let end = (start + DAYS_PER_PAGE).min(groups.len());
    &groups[start..end]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub entries: Decimal,
    pub expenses: Decimal,
    pub count: usize,
}

pub fn totals(transactions: &[&Transaction], owned: &OwnedAccounts) -> Totals {
    Totals {
        entries: transactions
            .iter()
            .filter(|t| owned.is_entry(t))
            .map(|t| t.amount)
            .sum(),
        expenses: transactions
            .iter()
            .filter(|t| owned.is_expense(t))
            .map(|t| t.amount)
            .sum(),
        count: transactions.len(),
    }
}

const MONTHS_FR: [&str; 12] = [
    "Janvier", "Février", "Mars", "Avril", "Mai", "Juin",
    "Juillet", "Août", "Septembre", "Octobre", "Novembre", "Décembre",
];

pub fn month_label(month: YearMonth) -> String {
    let name = MONTHS_FR
        .get((month.month as usize).wrapping_sub(1))
        .copied()
        .unwrap_or("?");
    format!("{} {}", name, month.year)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementRow {
    pub date: NaiveDateTime,
    pub description: String,
    pub transaction_type: String,
    /// Negative for expenses
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub edited_on: NaiveDate,
    pub account_label: String,
    pub period_label: String,
    pub totals: Totals,
    pub rows: Vec<StatementRow>,
}

impl Statement {
    pub fn build(
        transactions: &[Transaction],
        accounts: &[Account],
        filter: &HistoryFilter,
        edited_on: NaiveDate,
    ) -> Self {
        let owned = OwnedAccounts::new(accounts);
        let filtered = filter.apply(transactions, &owned);

        let account_label = match filter.account_id {
            None => "Tous les comptes".to_string(),
            Some(id) => accounts
                .iter()
                .find(|a| a.id == id)
                .map_or_else(|| "N/A".to_string(), |a| a.account_number.clone()),
        };
        let period_label = filter
            .month
            .map_or_else(|| "Toutes les périodes".to_string(), month_label);

        let rows = filtered
            .iter()
            .map(|t| StatementRow {
                date: t.created_at,
                description: if t.description.trim().is_empty() {
                    "Transaction".to_string()
                } else {
                    t.description.clone()
                },
                transaction_type: t.transaction_type.clone(),
                amount: if owned.is_expense(t) { -t.amount } else { t.amount },
            })
            .collect();

        Self {
            edited_on,
            account_label,
            period_label,
            totals: totals(&filtered, &owned),
            rows,
        }
    }

    /// `releve-finvo-{dd-mm-yyyy}.txt`
    pub fn file_name(&self) -> String {
        format!("releve-finvo-{}.txt", self.edited_on.format("%d-%m-%Y"))
    }

    pub fn render_text(&self) -> String {
        let mut lines = vec![
            "FINVO".to_string(),
            "Relevé de transactions".to_string(),
            String::new(),
            format!("Date d'édition: {}", self.edited_on.format("%d/%m/%Y")),
            format!("Compte: {}", self.account_label),
            format!("Période: {}", self.period_label),
            String::new(),
            "Résumé".to_string(),
            format!("Entrées: {}", format_euros(self.totals.entries)),
            format!("Sorties: {}", format_euros(self.totals.expenses)),
            format!("Nombre de transactions: {}", self.totals.count),
            String::new(),
            format!("{:<12}{:<32}{:<16}{:>14}", "Date", "Description", "Type", "Montant"),
        ];
        lines.extend(self.rows.iter().map(|row| {
            let sign = if row.amount < Decimal::ZERO { "-" } else { "+" };
            format!(
                "{:<12}{:<32}{:<16}{:>14}",
                row.date.format("%d/%m/%Y"),
                row.description,
                row.transaction_type,
                format!("{}{}", sign, format_euros(row.amount.abs())),
            )
        }));
        lines.join("\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn account(id: u64) -> Account {
        Account {
            id,
            account_number: format!("FR{:08}", id),
            balance: Decimal::from(100),
            is_main: id == 1,
            is_closed: false,
            created_at: at(1, 0),
        }
    }

    fn tx(id: u64, from: Option<u64>, to: Option<u64>, amount: i64, when: NaiveDateTime) -> Transaction {
        Transaction {
            id,
            amount: Decimal::from(amount),
            transaction_type: "transfer".to_string(),
            source_account_id: from,
            destination_account_id: to,
            created_at: when,
            is_cancelled: false,
            is_confirmed: true,
            description: String::new(),
        }
    }

    fn fixture() -> (Vec<Account>, Vec<Transaction>) {
        let accounts = vec![account(1), account(2)];
        let transactions = vec![
            tx(1, Some(9), Some(1), 300, at(5, 10)),  // entry
            tx(2, Some(1), Some(2), 40, at(4, 9)),    // internal
            tx(3, Some(2), Some(9), 25, at(5, 8)),    // expense
            tx(4, None, Some(1), 10, at(3, 12)),      // deposit
        ];
        (accounts, transactions)
    }

    #[test]
    fn test_tabs() {
        let (accounts, transactions) = fixture();
        let owned = OwnedAccounts::new(&accounts);

        let mut filter = HistoryFilter::default();
        assert_eq!(filter.apply(&transactions, &owned).len(), 4);

        filter.tab = HistoryTab::Revenues;
        let ids: Vec<u64> = filter.apply(&transactions, &owned).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 4]);

        filter.tab = HistoryTab::Expenses;
        let ids: Vec<u64> = filter.apply(&transactions, &owned).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3]);

        assert_eq!("revenues".parse::<HistoryTab>().unwrap(), HistoryTab::Revenues);
    }

    #[test]
    fn test_group_by_day_keeps_first_seen_order() {
        let (accounts, transactions) = fixture();
        let owned = OwnedAccounts::new(&accounts);
        let filtered = HistoryFilter::default().apply(&transactions, &owned);

        let groups = group_by_day(&filtered);
        let days: Vec<u32> = groups.iter().map(|g| chrono::Datelike::day(&g.day)).collect();
        assert_eq!(days, vec![5, 4, 3]);
        assert_eq!(groups[0].transactions.len(), 2);
    }

    #[test]
    fn test_pagination() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);

        let txs: Vec<Transaction> = (1..=12)
            .map(|d| tx(d as u64, Some(1), Some(9), 1, at(d, 0)))
            .collect();
        let refs: Vec<&Transaction> = txs.iter().collect();
        let groups = group_by_day(&refs);

        assert_eq!(page(&groups, 1).len(), 10);
        assert_eq!(page(&groups, 2).len(), 2);
        assert!(page(&groups, 3).is_empty());
        assert!(page(&groups, 0).is_empty());
    }

    #[test]
    fn test_totals() {
        let (accounts, transactions) = fixture();
        let owned = OwnedAccounts::new(&accounts);
        let filtered = HistoryFilter::default().apply(&transactions, &owned);

        let totals = totals(&filtered, &owned);
        assert_eq!(totals.entries, Decimal::from(350));
        assert_eq!(totals.expenses, Decimal::from(25));
        assert_eq!(totals.count, 4);
    }

    #[test]
    fn test_statement() {
        let (accounts, transactions) = fixture();
        let filter = HistoryFilter {
            account_id: Some(2),
            month: YearMonth::new(2025, 6),
            tab: HistoryTab::All,
        };
        let statement = Statement::build(
            &transactions,
            &accounts,
            &filter,
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        );

        assert_eq!(statement.account_label, "FR00000002");
        assert_eq!(statement.period_label, "Juin 2025");
        assert_eq!(statement.rows.len(), 2);
        assert_eq!(statement.rows[1].amount, Decimal::from(-25));
        assert_eq!(statement.file_name(), "releve-finvo-30-06-2025.txt");

        let text = statement.render_text();
        assert!(text.contains("Compte: FR00000002"));
        assert!(text.contains("Sorties: 25.00 €"));
        assert!(text.contains("-25.00 €"));
        assert!(text.contains("Nombre de transactions: 2"));
        // Header block then one line per row
        assert_eq!(text.lines().count(), 15);
        assert!(text.ends_with("€\n"));
    }
}
