//! In-memory rollups over query results. All group functions preserve
//! first-occurrence order of the keys so a stable input yields a stable report.

use crate::model::{Expense, ExpenseCategory, Fine, Reminder};
use crate::time::to_date;

pub fn sum_amounts(amounts: impl IntoIterator<Item = f64>) -> f64 {
    amounts.into_iter().sum()
}

pub fn group_sum_by_key<T, K, FK, FA>(records: &[T], key_fn: FK, amount_fn: FA) -> Vec<(K, f64)>
where
    K: PartialEq + Clone,
    FK: Fn(&T) -> K,
    FA: Fn(&T) -> f64,
{
    let mut groups: Vec<(K, f64)> = Vec::new();
    for record in records {
        let key = key_fn(record);
        let amount = amount_fn(record);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, total)) => *total += amount,
            None => groups.push((key, amount)),
        }
    }
    groups
}

pub fn count_uncompleted<T, F>(records: &[T], completed_fn: F) -> usize
where
    F: Fn(&T) -> bool,
{
    records.iter().filter(|r| !completed_fn(r)).count()
}

pub fn expense_total(expenses: &[Expense]) -> f64 {
    sum_amounts(expenses.iter().map(|e| e.amount))
}

pub fn total_by_category(expenses: &[Expense]) -> Vec<(ExpenseCategory, f64)> {
    group_sum_by_key(expenses, |e| e.category, |e| e.amount)
}

pub fn total_by_vehicle(expenses: &[Expense]) -> Vec<(String, f64)> {
    group_sum_by_key(expenses, |e| e.vehicle_id.clone(), |e| e.amount)
}

/// Totals keyed by calendar month (`YYYY-MM`, UTC) of the expense date.
pub fn monthly_totals(expenses: &[Expense]) -> Vec<(String, f64)> {
    group_sum_by_key(
        expenses,
        |e| to_date(e.date).format("%Y-%m").to_string(),
        |e| e.amount,
    )
}

pub fn open_reminder_count(reminders: &[Reminder]) -> usize {
    count_uncompleted(reminders, |r| r.completed)
}

pub fn unpaid_fine_count(fines: &[Fine]) -> usize {
    count_uncompleted(fines, |f| f.paid)
}

pub fn unpaid_fine_total(fines: &[Fine]) -> f64 {
    sum_amounts(fines.iter().filter(|f| !f.paid).map(|f| f.amount))
}
