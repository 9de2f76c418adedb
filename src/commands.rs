//! Form handlers. Each command validates its input, enforces ownership, writes
//! through the store and hands back the typed record the caller can render.

use serde_json::{Map, Value};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::id::new_uuid_v7;
use crate::model::{
    Document, DocumentKind, Expense, ExpenseCategory, Feedback, FeedbackStatus, Fine, Media,
    MediaKind, Reminder, User, UserRole, Vehicle,
};
use crate::remote::{AuthService, BlobStore, CancelFlag};
use crate::store::{query_sqlite_rows, CascadeOutcome, Filter, SortOrder, Store};
use crate::time::{date_ms_from_iso, now_ms};
use crate::{AppError, AppResult};

/// A file the caller wants uploaded as part of a command.
#[derive(Clone)]
pub struct AttachmentInput {
    pub filename: String,
    pub bytes: Vec<u8>,
}

fn require_str(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(
            AppError::new("VALIDATION/MISSING_FIELD", "Required field is empty")
                .with_context("field", field.to_string()),
        );
    }
    Ok(trimmed.to_string())
}

fn require_amount(amount: f64, field: &str) -> AppResult<f64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(
            AppError::new("VALIDATION/AMOUNT", "Amount must be a non-negative number")
                .with_context("field", field.to_string())
                .with_context("value", amount.to_string()),
        );
    }
    Ok(amount)
}

fn require_email(email: &str) -> AppResult<String> {
    let email = require_str(email, "email")?;
    if !email.contains('@') {
        return Err(AppError::new("VALIDATION/EMAIL", "Invalid email address")
            .with_context("value", email));
    }
    Ok(email)
}

fn require_password(password: &str) -> AppResult<()> {
    if password.len() < 8 {
        return Err(AppError::new(
            "VALIDATION/PASSWORD",
            "Password must be at least 8 characters",
        ));
    }
    Ok(())
}

/// Vehicle lookup that doubles as the ownership check every child-record
/// command runs before writing.
pub async fn require_owned_vehicle(
    pool: &SqlitePool,
    owner_id: &str,
    vehicle_id: &str,
) -> AppResult<Vehicle> {
    let row = sqlx::query("SELECT * FROM vehicles WHERE id = ? AND owner_id = ?")
        .bind(vehicle_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)?;
    match row {
        Some(row) => Vehicle::try_from(&row),
        None => Err(AppError::new("NOT_FOUND/VEHICLE", "Vehicle not found")
            .with_context("vehicle_id", vehicle_id.to_string())),
    }
}

async fn require_admin(pool: &SqlitePool, user_id: &str) -> AppResult<User> {
    let user = get_user(pool, user_id)
        .await?
        .ok_or_else(|| {
            AppError::new("NOT_FOUND/USER", "User not found")
                .with_context("user_id", user_id.to_string())
        })?;
    if user.role != UserRole::Admin {
        return Err(AppError::new("AUTH/FORBIDDEN", "Administrator role required")
            .with_context("user_id", user_id.to_string()));
    }
    Ok(user)
}

pub async fn get_user(pool: &SqlitePool, user_id: &str) -> AppResult<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)?;
    row.as_ref().map(User::try_from).transpose()
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)?;
    row.as_ref().map(User::try_from).transpose()
}

macro_rules! typed_list {
    ($fn_name:ident, $table:literal, $ty:ty) => {
        pub async fn $fn_name(
            pool: &SqlitePool,
            owner_id: &str,
            filter: &Filter,
            order: SortOrder,
        ) -> AppResult<Vec<$ty>> {
            let rows = query_sqlite_rows(pool, $table, Some(owner_id), filter, order).await?;
            rows.iter().map(<$ty>::try_from).collect()
        }
    };
}

typed_list!(list_vehicles, "vehicles", Vehicle);
typed_list!(list_expenses, "expenses", Expense);
typed_list!(list_media, "media", Media);
typed_list!(list_documents, "documents", Document);
typed_list!(list_reminders, "reminders", Reminder);
typed_list!(list_fines, "fines", Fine);
typed_list!(list_feedback, "feedback", Feedback);

#[derive(Debug, Clone, Default)]
pub struct NewVehicle {
    pub make: String,
    pub model: String,
    pub year: i64,
    pub engine_capacity: Option<String>,
    pub fuel_type: Option<String>,
    pub chassis_number: Option<String>,
    pub image_url: Option<String>,
}

pub async fn add_vehicle(store: &Store, owner_id: &str, input: NewVehicle) -> AppResult<Vehicle> {
    let make = require_str(&input.make, "make")?;
    let model = require_str(&input.model, "model")?;
    if !(1900..=2100).contains(&input.year) {
        return Err(AppError::new("VALIDATION/YEAR", "Year out of range")
            .with_context("value", input.year.to_string()));
    }

    let mut data = Map::new();
    data.insert("make".into(), Value::String(make.clone()));
    data.insert("model".into(), Value::String(model.clone()));
    data.insert("year".into(), Value::from(input.year));
    data.insert(
        "engine_capacity".into(),
        opt_string(input.engine_capacity.clone()),
    );
    data.insert("fuel_type".into(), opt_string(input.fuel_type.clone()));
    data.insert(
        "chassis_number".into(),
        opt_string(input.chassis_number.clone()),
    );
    data.insert("image_url".into(), opt_string(input.image_url.clone()));
    let value = store.add("vehicles", owner_id, data).await?;
    Ok(Vehicle {
        id: value_str(&value, "id"),
        owner_id: owner_id.to_string(),
        make,
        model,
        year: input.year,
        engine_capacity: input.engine_capacity,
        fuel_type: input.fuel_type,
        chassis_number: input.chassis_number,
        image_url: input.image_url,
        created_at: value_i64(&value, "created_at"),
        updated_at: value_i64(&value, "updated_at"),
    })
}

#[derive(Debug, Clone, Default)]
pub struct VehicleUpdate {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
    pub engine_capacity: Option<String>,
    pub fuel_type: Option<String>,
    pub chassis_number: Option<String>,
    pub image_url: Option<String>,
}

pub async fn update_vehicle(
    store: &Store,
    owner_id: &str,
    vehicle_id: &str,
    update: VehicleUpdate,
) -> AppResult<()> {
    let mut data = Map::new();
    if let Some(make) = update.make {
        data.insert("make".into(), Value::String(require_str(&make, "make")?));
    }
    if let Some(model) = update.model {
        data.insert("model".into(), Value::String(require_str(&model, "model")?));
    }
    if let Some(year) = update.year {
        if !(1900..=2100).contains(&year) {
            return Err(AppError::new("VALIDATION/YEAR", "Year out of range")
                .with_context("value", year.to_string()));
        }
        data.insert("year".into(), Value::from(year));
    }
    if let Some(v) = update.engine_capacity {
        data.insert("engine_capacity".into(), Value::String(v));
    }
    if let Some(v) = update.fuel_type {
        data.insert("fuel_type".into(), Value::String(v));
    }
    if let Some(v) = update.chassis_number {
        data.insert("chassis_number".into(), Value::String(v));
    }
    if let Some(v) = update.image_url {
        data.insert("image_url".into(), Value::String(v));
    }
    if data.is_empty() {
        return Ok(());
    }
    store.update("vehicles", owner_id, vehicle_id, data).await
}

pub async fn delete_vehicle(
    store: &Store,
    owner_id: &str,
    vehicle_id: &str,
) -> AppResult<CascadeOutcome> {
    store.delete_vehicle_cascade(owner_id, vehicle_id).await
}

#[derive(Debug, Clone, Default)]
pub struct NewExpense {
    pub vehicle_id: String,
    pub amount: f64,
    pub amount_secondary: Option<f64>,
    /// `YYYY-MM-DD` as entered in the form.
    pub date: String,
    pub category: String,
    pub description: String,
}

/// Create an expense, uploading its receipt attachments first. The batch is
/// all-or-nothing: if any upload fails, nothing is written to the store and
/// any blobs already uploaded are reported as residual.
pub async fn add_expense(
    store: &Store,
    blob: &dyn BlobStore,
    owner_id: &str,
    input: NewExpense,
    attachments: Vec<AttachmentInput>,
) -> AppResult<Expense> {
    let vehicle_id = require_str(&input.vehicle_id, "vehicle_id")?;
    let amount = require_amount(input.amount, "amount")?;
    if let Some(secondary) = input.amount_secondary {
        require_amount(secondary, "amount_secondary")?;
    }
    let date = date_ms_from_iso(&input.date)?;
    let category: ExpenseCategory = input.category.parse()?;
    require_owned_vehicle(store.pool(), owner_id, &vehicle_id).await?;

    let cancel = CancelFlag::new();
    let mut uploaded: Vec<(String, String)> = Vec::new();
    for attachment in &attachments {
        let filename = require_str(&attachment.filename, "filename")?;
        let path = format!("expenses/{owner_id}/{}_{filename}", now_ms());
        match blob.upload(&path, &attachment.bytes, None, &cancel).await {
            Ok(url) => uploaded.push((filename, url)),
            Err(err) => {
                let residual: Vec<&str> = uploaded.iter().map(|(_, url)| url.as_str()).collect();
                warn!(
                    target: "autovault",
                    event = "upload_batch_aborted",
                    failed = %filename,
                    residual_urls = ?residual,
                    error = %err
                );
                return Err(AppError::new("UPLOAD/BATCH", "Attachment upload failed")
                    .with_context("filename", filename)
                    .with_cause(err));
            }
        }
    }

    let now = now_ms();
    let expense = Expense {
        id: new_uuid_v7(),
        owner_id: owner_id.to_string(),
        vehicle_id: vehicle_id.clone(),
        amount,
        amount_secondary: input.amount_secondary,
        date,
        category,
        description: input.description.trim().to_string(),
        created_at: now,
        updated_at: now,
    };

    let mut tx = store.pool().begin().await.map_err(AppError::from)?;
    sqlx::query(
        "INSERT INTO expenses \
           (id, owner_id, vehicle_id, amount, amount_secondary, date, category, description, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&expense.id)
    .bind(&expense.owner_id)
    .bind(&expense.vehicle_id)
    .bind(expense.amount)
    .bind(expense.amount_secondary)
    .bind(expense.date)
    .bind(expense.category.as_str())
    .bind(&expense.description)
    .bind(expense.created_at)
    .bind(expense.updated_at)
    .execute(&mut *tx)
    .await
    .map_err(AppError::from)?;

    for (filename, url) in &uploaded {
        sqlx::query(
            "INSERT INTO documents \
               (id, owner_id, vehicle_id, expense_id, title, kind, file_url, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new_uuid_v7())
        .bind(owner_id)
        .bind(&vehicle_id)
        .bind(&expense.id)
        .bind(filename)
        .bind(DocumentKind::Invoice.as_str())
        .bind(url)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;
    }
    tx.commit().await.map_err(AppError::from)?;

    info!(
        target: "autovault",
        event = "expense_added",
        id = %expense.id,
        vehicle_id = %vehicle_id,
        attachments = uploaded.len()
    );
    store.notify("expenses");
    if !uploaded.is_empty() {
        store.notify("documents");
    }
    Ok(expense)
}

#[derive(Debug, Clone, Default)]
pub struct NewMedia {
    pub vehicle_id: String,
    pub kind: String,
    pub title: String,
    pub description: Option<String>,
}

pub async fn add_media(
    store: &Store,
    blob: &dyn BlobStore,
    owner_id: &str,
    input: NewMedia,
    file: AttachmentInput,
) -> AppResult<Media> {
    let vehicle_id = require_str(&input.vehicle_id, "vehicle_id")?;
    let kind: MediaKind = input.kind.parse()?;
    let title = require_str(&input.title, "title")?;
    let filename = require_str(&file.filename, "filename")?;
    require_owned_vehicle(store.pool(), owner_id, &vehicle_id).await?;

    let path = format!("media/{owner_id}/{}_{filename}", now_ms());
    let file_url = blob
        .upload(&path, &file.bytes, None, &CancelFlag::new())
        .await?;

    let mut data = Map::new();
    data.insert("vehicle_id".into(), Value::String(vehicle_id.clone()));
    data.insert("kind".into(), Value::String(kind.as_str().to_string()));
    data.insert("title".into(), Value::String(title.clone()));
    data.insert("description".into(), opt_string(input.description.clone()));
    data.insert("file_url".into(), Value::String(file_url.clone()));
    let value = store.add("media", owner_id, data).await?;
    Ok(Media {
        id: value_str(&value, "id"),
        owner_id: owner_id.to_string(),
        vehicle_id,
        kind,
        title,
        description: input.description,
        file_url,
        created_at: value_i64(&value, "created_at"),
        updated_at: value_i64(&value, "updated_at"),
    })
}

#[derive(Debug, Clone, Default)]
pub struct NewDocument {
    pub vehicle_id: String,
    pub expense_id: Option<String>,
    pub title: String,
    pub kind: String,
}

pub async fn add_document(
    store: &Store,
    blob: &dyn BlobStore,
    owner_id: &str,
    input: NewDocument,
    file: AttachmentInput,
) -> AppResult<Document> {
    let vehicle_id = require_str(&input.vehicle_id, "vehicle_id")?;
    let kind: DocumentKind = input.kind.parse()?;
    let title = require_str(&input.title, "title")?;
    let filename = require_str(&file.filename, "filename")?;
    require_owned_vehicle(store.pool(), owner_id, &vehicle_id).await?;
    if let Some(expense_id) = &input.expense_id {
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM expenses WHERE id = ? AND owner_id = ?")
                .bind(expense_id)
                .bind(owner_id)
                .fetch_optional(store.pool())
                .await
                .map_err(AppError::from)?;
        if exists.is_none() {
            return Err(AppError::new("NOT_FOUND/EXPENSE", "Expense not found")
                .with_context("expense_id", expense_id.clone()));
        }
    }

    let path = format!("documents/{owner_id}/{}_{filename}", now_ms());
    let file_url = blob
        .upload(&path, &file.bytes, None, &CancelFlag::new())
        .await?;

    let mut data = Map::new();
    data.insert("vehicle_id".into(), Value::String(vehicle_id.clone()));
    data.insert("expense_id".into(), opt_string(input.expense_id.clone()));
    data.insert("title".into(), Value::String(title.clone()));
    data.insert("kind".into(), Value::String(kind.as_str().to_string()));
    data.insert("file_url".into(), Value::String(file_url.clone()));
    let value = store.add("documents", owner_id, data).await?;
    Ok(Document {
        id: value_str(&value, "id"),
        owner_id: owner_id.to_string(),
        vehicle_id,
        expense_id: input.expense_id,
        title,
        kind,
        file_url,
        created_at: value_i64(&value, "created_at"),
        updated_at: value_i64(&value, "updated_at"),
    })
}

#[derive(Debug, Clone, Default)]
pub struct NewReminder {
    pub vehicle_id: String,
    pub title: String,
    pub description: Option<String>,
    /// `YYYY-MM-DD` as entered in the form.
    pub date: String,
}

pub async fn add_reminder(store: &Store, owner_id: &str, input: NewReminder) -> AppResult<Reminder> {
    let vehicle_id = require_str(&input.vehicle_id, "vehicle_id")?;
    let title = require_str(&input.title, "title")?;
    let date = date_ms_from_iso(&input.date)?;
    require_owned_vehicle(store.pool(), owner_id, &vehicle_id).await?;

    let mut data = Map::new();
    data.insert("vehicle_id".into(), Value::String(vehicle_id.clone()));
    data.insert("title".into(), Value::String(title.clone()));
    data.insert("description".into(), opt_string(input.description.clone()));
    data.insert("date".into(), Value::from(date));
    data.insert("completed".into(), Value::from(0));
    let value = store.add("reminders", owner_id, data).await?;
    Ok(Reminder {
        id: value_str(&value, "id"),
        owner_id: owner_id.to_string(),
        vehicle_id,
        title,
        description: input.description,
        date,
        completed: false,
        created_at: value_i64(&value, "created_at"),
        updated_at: value_i64(&value, "updated_at"),
    })
}

/// One-way transition: a completed reminder never reopens.
pub async fn complete_reminder(store: &Store, owner_id: &str, reminder_id: &str) -> AppResult<()> {
    store
        .get("reminders", Some(owner_id), reminder_id)
        .await?
        .ok_or_else(|| {
            AppError::new("NOT_FOUND/REMINDER", "Reminder not found")
                .with_context("reminder_id", reminder_id.to_string())
        })?;
    let mut data = Map::new();
    data.insert("completed".into(), Value::from(1));
    store.update("reminders", owner_id, reminder_id, data).await
}

#[derive(Debug, Clone, Default)]
pub struct NewFine {
    pub vehicle_id: String,
    pub amount: f64,
    /// `YYYY-MM-DD` as entered in the form.
    pub date: String,
    pub description: String,
}

pub async fn add_fine(store: &Store, owner_id: &str, input: NewFine) -> AppResult<Fine> {
    let vehicle_id = require_str(&input.vehicle_id, "vehicle_id")?;
    let amount = require_amount(input.amount, "amount")?;
    let date = date_ms_from_iso(&input.date)?;
    require_owned_vehicle(store.pool(), owner_id, &vehicle_id).await?;

    let description = input.description.trim().to_string();
    let mut data = Map::new();
    data.insert("vehicle_id".into(), Value::String(vehicle_id.clone()));
    data.insert("amount".into(), Value::from(amount));
    data.insert("date".into(), Value::from(date));
    data.insert("description".into(), Value::String(description.clone()));
    data.insert("paid".into(), Value::from(0));
    let value = store.add("fines", owner_id, data).await?;
    Ok(Fine {
        id: value_str(&value, "id"),
        owner_id: owner_id.to_string(),
        vehicle_id,
        amount,
        date,
        description,
        paid: false,
        created_at: value_i64(&value, "created_at"),
        updated_at: value_i64(&value, "updated_at"),
    })
}

/// One-way transition: a paid fine never becomes unpaid.
pub async fn mark_fine_paid(store: &Store, owner_id: &str, fine_id: &str) -> AppResult<()> {
    store
        .get("fines", Some(owner_id), fine_id)
        .await?
        .ok_or_else(|| {
            AppError::new("NOT_FOUND/FINE", "Fine not found")
                .with_context("fine_id", fine_id.to_string())
        })?;
    let mut data = Map::new();
    data.insert("paid".into(), Value::from(1));
    store.update("fines", owner_id, fine_id, data).await
}

pub async fn submit_feedback(store: &Store, owner_id: &str, message: &str) -> AppResult<Feedback> {
    let message = require_str(message, "message")?;
    let mut data = Map::new();
    data.insert("message".into(), Value::String(message.clone()));
    data.insert(
        "status".into(),
        Value::String(FeedbackStatus::Pending.as_str().to_string()),
    );
    let value = store.add("feedback", owner_id, data).await?;
    Ok(Feedback {
        id: value_str(&value, "id"),
        owner_id: owner_id.to_string(),
        message,
        status: FeedbackStatus::Pending,
        created_at: value_i64(&value, "created_at"),
        updated_at: value_i64(&value, "updated_at"),
    })
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub async fn register_user(
    store: &Store,
    auth: &dyn AuthService,
    input: NewUser,
) -> AppResult<User> {
    let email = require_email(&input.email)?;
    require_password(&input.password)?;
    if find_user_by_email(store.pool(), &email).await?.is_some() {
        return Err(AppError::new("VALIDATION/EMAIL_TAKEN", "Email already registered")
            .with_context("email", email));
    }
    auth.sign_up(&email, &input.password).await?;

    let mut data = Map::new();
    data.insert("email".into(), Value::String(email.clone()));
    data.insert(
        "role".into(),
        Value::String(UserRole::User.as_str().to_string()),
    );
    data.insert("first_name".into(), opt_string(input.first_name.clone()));
    data.insert("last_name".into(), opt_string(input.last_name.clone()));
    data.insert("avatar_url".into(), Value::Null);
    data.insert("blocked".into(), Value::from(0));
    let value = store.add("users", "", data).await?;
    info!(target: "autovault", event = "user_registered", email = %email);
    Ok(User {
        id: value_str(&value, "id"),
        email,
        role: UserRole::User,
        first_name: input.first_name,
        last_name: input.last_name,
        avatar_url: None,
        blocked: false,
        created_at: value_i64(&value, "created_at"),
        updated_at: value_i64(&value, "updated_at"),
    })
}

pub async fn login(
    store: &Store,
    auth: &dyn AuthService,
    email: &str,
    password: &str,
) -> AppResult<User> {
    let email = require_email(email)?;
    auth.sign_in(&email, password).await?;
    let user = find_user_by_email(store.pool(), &email)
        .await?
        .ok_or_else(|| {
            AppError::new("NOT_FOUND/USER", "No account for this email")
                .with_context("email", email.clone())
        })?;
    if user.blocked {
        return Err(AppError::new("AUTH/BLOCKED", "Account is blocked")
            .with_context("email", email));
    }
    info!(target: "autovault", event = "user_login", user_id = %user.id);
    Ok(user)
}

pub async fn request_password_reset(auth: &dyn AuthService, email: &str) -> AppResult<()> {
    let email = require_email(email)?;
    auth.send_password_reset(&email).await
}

pub async fn confirm_password_reset(
    auth: &dyn AuthService,
    token: &str,
    new_password: &str,
) -> AppResult<()> {
    let token = require_str(token, "token")?;
    require_password(new_password)?;
    auth.confirm_password_reset(&token, new_password).await
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub async fn update_profile(
    store: &Store,
    blob: &dyn BlobStore,
    user_id: &str,
    update: ProfileUpdate,
    avatar: Option<AttachmentInput>,
) -> AppResult<()> {
    let mut data = Map::new();
    if let Some(first_name) = update.first_name {
        data.insert("first_name".into(), Value::String(first_name));
    }
    if let Some(last_name) = update.last_name {
        data.insert("last_name".into(), Value::String(last_name));
    }
    if let Some(file) = avatar {
        let filename = require_str(&file.filename, "filename")?;
        let path = format!("avatars/{user_id}/{}_{filename}", now_ms());
        let url = blob
            .upload(&path, &file.bytes, None, &CancelFlag::new())
            .await?;
        data.insert("avatar_url".into(), Value::String(url));
    }
    if data.is_empty() {
        return Ok(());
    }
    store.update("users", user_id, user_id, data).await
}

pub async fn set_user_blocked(
    store: &Store,
    admin_id: &str,
    user_id: &str,
    blocked: bool,
) -> AppResult<()> {
    require_admin(store.pool(), admin_id).await?;
    let mut data = Map::new();
    data.insert("blocked".into(), Value::from(blocked as i64));
    store.update("users", user_id, user_id, data).await?;
    info!(
        target: "autovault",
        event = "user_blocked_set",
        user_id,
        blocked
    );
    Ok(())
}

pub async fn delete_user(
    store: &Store,
    admin_id: &str,
    user_id: &str,
) -> AppResult<CascadeOutcome> {
    require_admin(store.pool(), admin_id).await?;
    store.delete_user_cascade(user_id).await
}

pub async fn set_feedback_status(
    store: &Store,
    admin_id: &str,
    owner_id: &str,
    feedback_id: &str,
    status: FeedbackStatus,
) -> AppResult<()> {
    require_admin(store.pool(), admin_id).await?;
    let mut data = Map::new();
    data.insert(
        "status".into(),
        Value::String(status.as_str().to_string()),
    );
    store.update("feedback", owner_id, feedback_id, data).await
}

fn opt_string(value: Option<String>) -> Value {
    match value {
        Some(s) => Value::String(s),
        None => Value::Null,
    }
}

fn value_str(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn value_i64(value: &Value, key: &str) -> i64 {
    value.get(key).and_then(Value::as_i64).unwrap_or_default()
}
