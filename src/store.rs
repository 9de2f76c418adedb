use std::sync::Arc;

use serde_json::{Map, Value};
use sqlx::{sqlite::SqliteRow, Column, Row, SqlitePool, TypeInfo, ValueRef};
use tracing::info;

use crate::live::{LiveHub, QuerySpec, Subscription};
use crate::{id::new_uuid_v7, time::now_ms, AppError, AppResult};

/// Closed registry of storable tables; dynamic SQL never sees any other name.
pub const DOMAIN_TABLES: &[&str] = &[
    "users",
    "vehicles",
    "expenses",
    "media",
    "documents",
    "reminders",
    "fines",
    "feedback",
];

/// Tables removed when their vehicle goes away, in FK-safe order
/// (documents reference expenses, so they must go first).
pub const VEHICLE_CHILD_TABLES: &[&str] =
    &["documents", "expenses", "media", "reminders", "fines"];

fn ensure_table(table: &str) -> AppResult<()> {
    if DOMAIN_TABLES.contains(&table) {
        Ok(())
    } else {
        Err(AppError::new("STORE/INVALID_TABLE", "Unknown table")
            .with_context("table", table.to_string()))
    }
}

/// Ordering is by insertion key only; UUIDv7 keys make that creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    KeyAsc,
    KeyDesc,
}

impl SortOrder {
    fn sql(self) -> &'static str {
        match self {
            SortOrder::KeyAsc => " ORDER BY id ASC",
            SortOrder::KeyDesc => " ORDER BY id DESC",
        }
    }
}

/// Predicate for `query`: owner scoping is passed separately and always applies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub vehicle_id: Option<String>,
    pub expense_id: Option<String>,
    pub date_from: Option<i64>,
    pub date_to: Option<i64>,
}

impl Filter {
    pub fn vehicle(vehicle_id: impl Into<String>) -> Self {
        Filter {
            vehicle_id: Some(vehicle_id.into()),
            ..Filter::default()
        }
    }
}

pub fn row_to_value(row: &SqliteRow) -> Value {
    let mut map = Map::new();
    for col in row.columns() {
        let idx = col.ordinal();
        let v = row.try_get_raw(idx).ok();
        let val = match v {
            Some(raw) => {
                if raw.is_null() {
                    Value::Null
                } else {
                    match raw.type_info().name() {
                        "INTEGER" => row
                            .try_get::<i64, _>(idx)
                            .map(Value::from)
                            .unwrap_or(Value::Null),
                        "REAL" => row
                            .try_get::<f64, _>(idx)
                            .map(Value::from)
                            .unwrap_or(Value::Null),
                        _ => row
                            .try_get::<String, _>(idx)
                            .map(Value::from)
                            .unwrap_or(Value::Null),
                    }
                }
            }
            None => Value::Null,
        };
        map.insert(col.name().to_string(), val);
    }
    Value::Object(map)
}

fn bind_value<'q>(
    q: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    v: &Value,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    match v {
        Value::Null => q.bind(Option::<i64>::None),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(Option::<i64>::None)
            }
        }
        Value::Bool(b) => q.bind(*b as i64),
        Value::String(s) => q.bind(s.clone()),
        _ => q.bind(v.to_string()),
    }
}

pub(crate) async fn query_sqlite_rows(
    pool: &SqlitePool,
    table: &str,
    owner_id: Option<&str>,
    filter: &Filter,
    order: SortOrder,
) -> AppResult<Vec<SqliteRow>> {
    ensure_table(table)?;
    let mut sql = format!("SELECT * FROM {table}");
    let mut clauses: Vec<&str> = Vec::new();
    if owner_id.is_some() {
        // Users own themselves; every other table carries an owner column.
        clauses.push(if table == "users" { "id = ?" } else { "owner_id = ?" });
    }
    if filter.vehicle_id.is_some() {
        clauses.push("vehicle_id = ?");
    }
    if filter.expense_id.is_some() {
        clauses.push("expense_id = ?");
    }
    if filter.date_from.is_some() {
        clauses.push("date >= ?");
    }
    if filter.date_to.is_some() {
        clauses.push("date <= ?");
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(order.sql());

    let mut q = sqlx::query(&sql);
    if let Some(owner) = owner_id {
        q = q.bind(owner.to_string());
    }
    if let Some(vehicle) = &filter.vehicle_id {
        q = q.bind(vehicle.clone());
    }
    if let Some(expense) = &filter.expense_id {
        q = q.bind(expense.clone());
    }
    if let Some(from) = filter.date_from {
        q = q.bind(from);
    }
    if let Some(to) = filter.date_to {
        q = q.bind(to);
    }
    q.fetch_all(pool).await.map_err(AppError::from)
}

/// Run a filtered, ordered query and return rows as loose JSON objects.
pub async fn query_rows(
    pool: &SqlitePool,
    table: &str,
    owner_id: Option<&str>,
    filter: &Filter,
    order: SortOrder,
) -> AppResult<Vec<Value>> {
    let rows = query_sqlite_rows(pool, table, owner_id, filter, order).await?;
    Ok(rows.iter().map(row_to_value).collect())
}

async fn insert_row(
    pool: &SqlitePool,
    table: &str,
    owner_id: &str,
    mut data: Map<String, Value>,
) -> AppResult<Value> {
    ensure_table(table)?;
    let id = data
        .get("id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(new_uuid_v7);
    data.insert("id".into(), Value::String(id));
    if table != "users" {
        data.insert("owner_id".into(), Value::String(owner_id.to_string()));
    }
    let now = now_ms();
    data.entry(String::from("created_at"))
        .or_insert(Value::from(now));
    data.insert("updated_at".into(), Value::from(now));

    let cols: Vec<String> = data.keys().cloned().collect();
    let placeholders: Vec<String> = cols.iter().map(|_| "?".into()).collect();
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        cols.join(","),
        placeholders.join(",")
    );
    let mut query = sqlx::query(&sql);
    for c in &cols {
        let value = data.get(c).ok_or_else(|| {
            AppError::new("STORE/MISSING_FIELD", "Payload missing value for column")
                .with_context("column", c.clone())
        })?;
        query = bind_value(query, value);
    }
    query.execute(pool).await.map_err(AppError::from)?;
    Ok(Value::Object(data))
}

async fn fetch_row(
    pool: &SqlitePool,
    table: &str,
    owner_id: Option<&str>,
    id: &str,
) -> AppResult<Option<Value>> {
    ensure_table(table)?;
    let sql = match owner_id {
        Some(_) if table != "users" => format!("SELECT * FROM {table} WHERE id = ? AND owner_id = ?"),
        _ => format!("SELECT * FROM {table} WHERE id = ?"),
    };
    let mut q = sqlx::query(&sql).bind(id.to_string());
    if let Some(owner) = owner_id {
        if table != "users" {
            q = q.bind(owner.to_string());
        }
    }
    let row = q.fetch_optional(pool).await.map_err(AppError::from)?;
    Ok(row.as_ref().map(row_to_value))
}

async fn update_row(
    pool: &SqlitePool,
    table: &str,
    owner_id: &str,
    id: &str,
    mut data: Map<String, Value>,
) -> AppResult<()> {
    ensure_table(table)?;
    // Key, provenance and ownership never change through a merge.
    data.remove("id");
    data.remove("created_at");
    data.remove("owner_id");
    data.insert("updated_at".into(), Value::from(now_ms()));

    let cols: Vec<String> = data.keys().cloned().collect();
    let set_clause: Vec<String> = cols.iter().map(|c| format!("{c} = ?")).collect();
    let sql = if table == "users" {
        format!("UPDATE users SET {} WHERE id = ?", set_clause.join(","))
    } else {
        format!(
            "UPDATE {table} SET {} WHERE owner_id = ? AND id = ?",
            set_clause.join(",")
        )
    };
    let mut query = sqlx::query(&sql);
    for c in &cols {
        let value = data.get(c).ok_or_else(|| {
            AppError::new("STORE/MISSING_FIELD", "Payload missing value for column")
                .with_context("column", c.clone())
        })?;
        query = bind_value(query, value);
    }
    if table == "users" {
        query = query.bind(id.to_string());
    } else {
        query = query.bind(owner_id.to_string()).bind(id.to_string());
    }
    let res = query.execute(pool).await.map_err(AppError::from)?;
    if res.rows_affected() == 0 {
        return Err(AppError::new("NOT_FOUND/ROW", "Record not found")
            .with_context("table", table.to_string())
            .with_context("id", id.to_string()));
    }
    Ok(())
}

async fn delete_row(pool: &SqlitePool, table: &str, owner_id: &str, id: &str) -> AppResult<()> {
    ensure_table(table)?;
    let sql = if table == "users" {
        "DELETE FROM users WHERE id = ?".to_string()
    } else {
        format!("DELETE FROM {table} WHERE owner_id = ? AND id = ?")
    };
    let mut q = sqlx::query(&sql);
    if table != "users" {
        q = q.bind(owner_id.to_string());
    }
    q = q.bind(id.to_string());
    let res = q.execute(pool).await.map_err(AppError::from)?;
    if res.rows_affected() == 0 {
        return Err(AppError::new("NOT_FOUND/ROW", "Record not found")
            .with_context("table", table.to_string())
            .with_context("id", id.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub total_deleted: u64,
}

/// The local data store: a pool plus the live-query hub notified on every write.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    hub: Arc<LiveHub>,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Store {
            pool,
            hub: Arc::new(LiveHub::new()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn hub(&self) -> &Arc<LiveHub> {
        &self.hub
    }

    pub(crate) fn notify(&self, table: &str) {
        self.hub.notify(table);
    }

    /// Open a live query; results are re-delivered after every write to the table.
    pub fn subscribe(&self, spec: QuerySpec) -> Subscription {
        LiveHub::subscribe(&self.hub, self.pool.clone(), spec)
    }

    /// Insert a record, assigning a fresh key and timestamps. Returns the stored shape.
    pub async fn add(
        &self,
        table: &str,
        owner_id: &str,
        data: Map<String, Value>,
    ) -> AppResult<Value> {
        let value = insert_row(&self.pool, table, owner_id, data)
            .await
            .map_err(|err| {
                err.with_context("operation", "add")
                    .with_context("table", table.to_string())
            })?;
        let id = value.get("id").and_then(Value::as_str).unwrap_or_default();
        info!(target: "autovault", event = "store_add", table, id);
        self.notify(table);
        Ok(value)
    }

    pub async fn get(
        &self,
        table: &str,
        owner_id: Option<&str>,
        id: &str,
    ) -> AppResult<Option<Value>> {
        fetch_row(&self.pool, table, owner_id, id)
            .await
            .map_err(|err| {
                err.with_context("operation", "get")
                    .with_context("table", table.to_string())
                    .with_context("id", id.to_string())
            })
    }

    /// Merge `data` into an existing record. `NOT_FOUND/ROW` when the key is absent.
    pub async fn update(
        &self,
        table: &str,
        owner_id: &str,
        id: &str,
        data: Map<String, Value>,
    ) -> AppResult<()> {
        update_row(&self.pool, table, owner_id, id, data)
            .await
            .map_err(|err| {
                err.with_context("operation", "update")
                    .with_context("table", table.to_string())
                    .with_context("id", id.to_string())
            })?;
        info!(target: "autovault", event = "store_update", table, id);
        self.notify(table);
        Ok(())
    }

    /// Remove a single record. Does not cascade; see `delete_vehicle_cascade`.
    pub async fn delete(&self, table: &str, owner_id: &str, id: &str) -> AppResult<()> {
        delete_row(&self.pool, table, owner_id, id)
            .await
            .map_err(|err| {
                err.with_context("operation", "delete")
                    .with_context("table", table.to_string())
                    .with_context("id", id.to_string())
            })?;
        info!(target: "autovault", event = "store_delete", table, id);
        self.notify(table);
        Ok(())
    }

    pub async fn query(
        &self,
        table: &str,
        owner_id: Option<&str>,
        filter: &Filter,
        order: SortOrder,
    ) -> AppResult<Vec<Value>> {
        query_rows(&self.pool, table, owner_id, filter, order)
            .await
            .map_err(|err| {
                err.with_context("operation", "query")
                    .with_context("table", table.to_string())
            })
    }

    /// Delete a vehicle and every dependent row in one transaction.
    pub async fn delete_vehicle_cascade(
        &self,
        owner_id: &str,
        vehicle_id: &str,
    ) -> AppResult<CascadeOutcome> {
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM vehicles WHERE id = ? AND owner_id = ?")
                .bind(vehicle_id)
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(AppError::from)?;
        if exists.is_none() {
            return Err(AppError::new("NOT_FOUND/VEHICLE", "Vehicle not found")
                .with_context("vehicle_id", vehicle_id.to_string()));
        }

        let mut tx = self.pool.begin().await.map_err(AppError::from)?;
        let mut total: u64 = 0;
        for table in VEHICLE_CHILD_TABLES {
            let sql = format!("DELETE FROM {table} WHERE vehicle_id = ? AND owner_id = ?");
            let res = sqlx::query(&sql)
                .bind(vehicle_id)
                .bind(owner_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::from(e)
                        .with_context("operation", "delete_vehicle_cascade")
                        .with_context("table", table.to_string())
                })?;
            info!(
                target: "autovault",
                event = "cascade_phase",
                table = *table,
                deleted = res.rows_affected()
            );
            total += res.rows_affected();
        }
        let res = sqlx::query("DELETE FROM vehicles WHERE id = ? AND owner_id = ?")
            .bind(vehicle_id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?;
        total += res.rows_affected();
        tx.commit().await.map_err(AppError::from)?;

        info!(
            target: "autovault",
            event = "cascade_done",
            vehicle_id,
            total_deleted = total
        );
        for table in VEHICLE_CHILD_TABLES {
            self.notify(table);
        }
        self.notify("vehicles");
        Ok(CascadeOutcome {
            total_deleted: total,
        })
    }

    /// Delete a user and everything they own in one transaction.
    pub async fn delete_user_cascade(&self, user_id: &str) -> AppResult<CascadeOutcome> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        if exists.is_none() {
            return Err(AppError::new("NOT_FOUND/USER", "User not found")
                .with_context("user_id", user_id.to_string()));
        }

        let mut tx = self.pool.begin().await.map_err(AppError::from)?;
        let mut total: u64 = 0;
        let owned_tables: [&str; 7] = [
            "documents",
            "expenses",
            "media",
            "reminders",
            "fines",
            "feedback",
            "vehicles",
        ];
        for table in owned_tables {
            let sql = format!("DELETE FROM {table} WHERE owner_id = ?");
            let res = sqlx::query(&sql)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::from(e)
                        .with_context("operation", "delete_user_cascade")
                        .with_context("table", table.to_string())
                })?;
            info!(
                target: "autovault",
                event = "cascade_phase",
                table,
                deleted = res.rows_affected()
            );
            total += res.rows_affected();
        }
        let res = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?;
        total += res.rows_affected();
        tx.commit().await.map_err(AppError::from)?;

        info!(
            target: "autovault",
            event = "cascade_done",
            user_id,
            total_deleted = total
        );
        for table in DOMAIN_TABLES {
            self.notify(table);
        }
        Ok(CascadeOutcome {
            total_deleted: total,
        })
    }
}
