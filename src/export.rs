//! CSV export of the expense ledger.

use std::collections::HashMap;
use std::path::Path;

use sqlx::SqlitePool;
use tracing::info;

use crate::commands::{list_expenses, list_vehicles};
use crate::db::write_atomic;
use crate::store::{Filter, SortOrder};
use crate::time::iso_date_from_ms;
use crate::{AppError, AppResult};

pub const CSV_HEADER: &str = "Date,Car,Category,Amount(primary),Amount(secondary),Description";

/// Quote a field when it contains a delimiter, quote or line break; embedded
/// quotes are doubled per RFC 4180.
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// Render the owner's expenses as CSV, one row per expense in the requested
/// order. Vehicle names come from a single upfront lookup; an expense whose
/// vehicle is missing keeps its raw vehicle id as the label.
pub async fn expenses_csv(
    pool: &SqlitePool,
    owner_id: &str,
    filter: &Filter,
    order: SortOrder,
) -> AppResult<String> {
    let (csv, _) = render_expenses_csv(pool, owner_id, filter, order).await?;
    Ok(csv)
}

async fn render_expenses_csv(
    pool: &SqlitePool,
    owner_id: &str,
    filter: &Filter,
    order: SortOrder,
) -> AppResult<(String, u64)> {
    let vehicles = list_vehicles(pool, owner_id, &Filter::default(), SortOrder::KeyAsc).await?;
    let labels: HashMap<String, String> = vehicles
        .into_iter()
        .map(|v| (v.id.clone(), v.label()))
        .collect();

    let expenses = list_expenses(pool, owner_id, filter, order).await?;
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for expense in &expenses {
        let label = labels
            .get(&expense.vehicle_id)
            .cloned()
            .unwrap_or_else(|| expense.vehicle_id.clone());
        let secondary = expense
            .amount_secondary
            .map(|v| v.to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            csv_field(&iso_date_from_ms(expense.date)),
            csv_field(&label),
            csv_field(expense.category.as_str()),
            csv_field(&expense.amount.to_string()),
            csv_field(&secondary),
            csv_field(&expense.description),
        ));
    }
    Ok((out, expenses.len() as u64))
}

/// Export to a file on disk; written atomically so readers never see a
/// partial report.
pub async fn write_expenses_csv(
    pool: &SqlitePool,
    owner_id: &str,
    filter: &Filter,
    order: SortOrder,
    path: &Path,
) -> AppResult<u64> {
    let (csv, rows) = render_expenses_csv(pool, owner_id, filter, order).await?;
    write_atomic(path, csv.as_bytes()).map_err(|err| {
        AppError::from(err)
            .with_context("operation", "export_csv")
            .with_context("path", path.display().to_string())
    })?;
    info!(
        target: "autovault",
        event = "csv_exported",
        path = %path.display(),
        rows
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_pass_through() {
        assert_eq!(csv_field("MECHANICAL_WORKS"), "MECHANICAL_WORKS");
        assert_eq!(csv_field("1500.5"), "1500.5");
    }

    #[test]
    fn delimiters_and_quotes_get_escaped() {
        assert_eq!(csv_field("new tyres, front"), "\"new tyres, front\"");
        assert_eq!(csv_field("the \"good\" garage"), "\"the \"\"good\"\" garage\"");
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
    }
}
