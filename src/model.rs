use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};

use crate::AppError;

/// Fixed expense category set used for grouping and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseCategory {
    PaymentPaypal,
    PaymentBank,
    VatPayment,
    AddMedia,
    YardStorageNam,
    YardStorageJapan,
    PoliceClearance,
    DiscPayment,
    DiscRenewal,
    FobPayment,
    FreightPayment,
    BodyWorks,
    MechanicalWorks,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 14] = [
        ExpenseCategory::PaymentPaypal,
        ExpenseCategory::PaymentBank,
        ExpenseCategory::VatPayment,
        ExpenseCategory::AddMedia,
        ExpenseCategory::YardStorageNam,
        ExpenseCategory::YardStorageJapan,
        ExpenseCategory::PoliceClearance,
        ExpenseCategory::DiscPayment,
        ExpenseCategory::DiscRenewal,
        ExpenseCategory::FobPayment,
        ExpenseCategory::FreightPayment,
        ExpenseCategory::BodyWorks,
        ExpenseCategory::MechanicalWorks,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::PaymentPaypal => "PAYMENT_PAYPAL",
            ExpenseCategory::PaymentBank => "PAYMENT_BANK",
            ExpenseCategory::VatPayment => "VAT_PAYMENT",
            ExpenseCategory::AddMedia => "ADD_MEDIA",
            ExpenseCategory::YardStorageNam => "YARD_STORAGE_NAM",
            ExpenseCategory::YardStorageJapan => "YARD_STORAGE_JAPAN",
            ExpenseCategory::PoliceClearance => "POLICE_CLEARANCE",
            ExpenseCategory::DiscPayment => "DISC_PAYMENT",
            ExpenseCategory::DiscRenewal => "DISC_RENEWAL",
            ExpenseCategory::FobPayment => "FOB_PAYMENT",
            ExpenseCategory::FreightPayment => "FREIGHT_PAYMENT",
            ExpenseCategory::BodyWorks => "BODY_WORKS",
            ExpenseCategory::MechanicalWorks => "MECHANICAL_WORKS",
            ExpenseCategory::Other => "OTHER",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExpenseCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                AppError::new("VALIDATION/CATEGORY", "Unknown expense category")
                    .with_context("value", s.to_string())
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "user" => Ok(UserRole::User),
            other => Err(AppError::new("VALIDATION/ROLE", "Unknown user role")
                .with_context("value", other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl FromStr for MediaKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            other => Err(AppError::new("VALIDATION/MEDIA_KIND", "Unknown media kind")
                .with_context("value", other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Invoice,
    Registration,
    Insurance,
    Other,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::Registration => "registration",
            DocumentKind::Insurance => "insurance",
            DocumentKind::Other => "other",
        }
    }
}

impl FromStr for DocumentKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invoice" => Ok(DocumentKind::Invoice),
            "registration" => Ok(DocumentKind::Registration),
            "insurance" => Ok(DocumentKind::Insurance),
            "other" => Ok(DocumentKind::Other),
            unknown => Err(AppError::new("VALIDATION/DOCUMENT_KIND", "Unknown document kind")
                .with_context("value", unknown.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Pending,
    Approved,
    Rejected,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Pending => "pending",
            FeedbackStatus::Approved => "approved",
            FeedbackStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for FeedbackStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FeedbackStatus::Pending),
            "approved" => Ok(FeedbackStatus::Approved),
            "rejected" => Ok(FeedbackStatus::Rejected),
            other => Err(AppError::new("VALIDATION/STATUS", "Unknown feedback status")
                .with_context("value", other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: UserRole,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub blocked: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<&SqliteRow> for User {
    type Error = AppError;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        let role: String = row.try_get("role").map_err(AppError::from)?;
        Ok(Self {
            id: row.try_get("id").map_err(AppError::from)?,
            email: row.try_get("email").map_err(AppError::from)?,
            role: role.parse()?,
            first_name: row.try_get("first_name").map_err(AppError::from)?,
            last_name: row.try_get("last_name").map_err(AppError::from)?,
            avatar_url: row.try_get("avatar_url").map_err(AppError::from)?,
            blocked: row
                .try_get::<i64, _>("blocked")
                .map(|value| value != 0)
                .map_err(AppError::from)?,
            created_at: row.try_get("created_at").map_err(AppError::from)?,
            updated_at: row.try_get("updated_at").map_err(AppError::from)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub owner_id: String,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub engine_capacity: Option<String>,
    pub fuel_type: Option<String>,
    pub chassis_number: Option<String>,
    pub image_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Vehicle {
    /// Display label used in reports: "make model".
    pub fn label(&self) -> String {
        format!("{} {}", self.make, self.model)
    }
}

impl TryFrom<&SqliteRow> for Vehicle {
    type Error = AppError;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.try_get("id").map_err(AppError::from)?,
            owner_id: row.try_get("owner_id").map_err(AppError::from)?,
            make: row.try_get("make").map_err(AppError::from)?,
            model: row.try_get("model").map_err(AppError::from)?,
            year: row.try_get("year").map_err(AppError::from)?,
            engine_capacity: row.try_get("engine_capacity").map_err(AppError::from)?,
            fuel_type: row.try_get("fuel_type").map_err(AppError::from)?,
            chassis_number: row.try_get("chassis_number").map_err(AppError::from)?,
            image_url: row.try_get("image_url").map_err(AppError::from)?,
            created_at: row.try_get("created_at").map_err(AppError::from)?,
            updated_at: row.try_get("updated_at").map_err(AppError::from)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub owner_id: String,
    pub vehicle_id: String,
    /// Amount in the primary currency.
    pub amount: f64,
    /// Optional amount in the secondary currency, when the payment was dual-billed.
    pub amount_secondary: Option<f64>,
    /// Epoch milliseconds at UTC midnight of the expense date.
    pub date: i64,
    pub category: ExpenseCategory,
    pub description: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<&SqliteRow> for Expense {
    type Error = AppError;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        let category: String = row.try_get("category").map_err(AppError::from)?;
        Ok(Self {
            id: row.try_get("id").map_err(AppError::from)?,
            owner_id: row.try_get("owner_id").map_err(AppError::from)?,
            vehicle_id: row.try_get("vehicle_id").map_err(AppError::from)?,
            amount: row.try_get("amount").map_err(AppError::from)?,
            amount_secondary: row.try_get("amount_secondary").map_err(AppError::from)?,
            date: row.try_get("date").map_err(AppError::from)?,
            category: category.parse()?,
            description: row.try_get("description").map_err(AppError::from)?,
            created_at: row.try_get("created_at").map_err(AppError::from)?,
            updated_at: row.try_get("updated_at").map_err(AppError::from)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: String,
    pub owner_id: String,
    pub vehicle_id: String,
    pub kind: MediaKind,
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<&SqliteRow> for Media {
    type Error = AppError;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        let kind: String = row.try_get("kind").map_err(AppError::from)?;
        Ok(Self {
            id: row.try_get("id").map_err(AppError::from)?,
            owner_id: row.try_get("owner_id").map_err(AppError::from)?,
            vehicle_id: row.try_get("vehicle_id").map_err(AppError::from)?,
            kind: kind.parse()?,
            title: row.try_get("title").map_err(AppError::from)?,
            description: row.try_get("description").map_err(AppError::from)?,
            file_url: row.try_get("file_url").map_err(AppError::from)?,
            created_at: row.try_get("created_at").map_err(AppError::from)?,
            updated_at: row.try_get("updated_at").map_err(AppError::from)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub owner_id: String,
    pub vehicle_id: String,
    /// Set when the document was attached to an expense at creation time.
    pub expense_id: Option<String>,
    pub title: String,
    pub kind: DocumentKind,
    pub file_url: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<&SqliteRow> for Document {
    type Error = AppError;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        let kind: String = row.try_get("kind").map_err(AppError::from)?;
        Ok(Self {
            id: row.try_get("id").map_err(AppError::from)?,
            owner_id: row.try_get("owner_id").map_err(AppError::from)?,
            vehicle_id: row.try_get("vehicle_id").map_err(AppError::from)?,
            expense_id: row.try_get("expense_id").map_err(AppError::from)?,
            title: row.try_get("title").map_err(AppError::from)?,
            kind: kind.parse()?,
            file_url: row.try_get("file_url").map_err(AppError::from)?,
            created_at: row.try_get("created_at").map_err(AppError::from)?,
            updated_at: row.try_get("updated_at").map_err(AppError::from)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub owner_id: String,
    pub vehicle_id: String,
    pub title: String,
    pub description: Option<String>,
    pub date: i64,
    /// One-way flag: transitions false→true only.
    pub completed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<&SqliteRow> for Reminder {
    type Error = AppError;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.try_get("id").map_err(AppError::from)?,
            owner_id: row.try_get("owner_id").map_err(AppError::from)?,
            vehicle_id: row.try_get("vehicle_id").map_err(AppError::from)?,
            title: row.try_get("title").map_err(AppError::from)?,
            description: row.try_get("description").map_err(AppError::from)?,
            date: row.try_get("date").map_err(AppError::from)?,
            completed: row
                .try_get::<i64, _>("completed")
                .map(|value| value != 0)
                .map_err(AppError::from)?,
            created_at: row.try_get("created_at").map_err(AppError::from)?,
            updated_at: row.try_get("updated_at").map_err(AppError::from)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fine {
    pub id: String,
    pub owner_id: String,
    pub vehicle_id: String,
    pub amount: f64,
    pub date: i64,
    pub description: String,
    /// One-way flag: transitions false→true only.
    pub paid: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<&SqliteRow> for Fine {
    type Error = AppError;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.try_get("id").map_err(AppError::from)?,
            owner_id: row.try_get("owner_id").map_err(AppError::from)?,
            vehicle_id: row.try_get("vehicle_id").map_err(AppError::from)?,
            amount: row.try_get("amount").map_err(AppError::from)?,
            date: row.try_get("date").map_err(AppError::from)?,
            description: row.try_get("description").map_err(AppError::from)?,
            paid: row
                .try_get::<i64, _>("paid")
                .map(|value| value != 0)
                .map_err(AppError::from)?,
            created_at: row.try_get("created_at").map_err(AppError::from)?,
            updated_at: row.try_get("updated_at").map_err(AppError::from)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: String,
    pub owner_id: String,
    pub message: String,
    pub status: FeedbackStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<&SqliteRow> for Feedback {
    type Error = AppError;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        // Rows older than the moderation backfill may still carry NULL.
        let status: Option<String> = row.try_get("status").map_err(AppError::from)?;
        Ok(Self {
            id: row.try_get("id").map_err(AppError::from)?,
            owner_id: row.try_get("owner_id").map_err(AppError::from)?,
            message: row.try_get("message").map_err(AppError::from)?,
            status: match status.as_deref() {
                Some(raw) if !raw.is_empty() => raw.parse()?,
                _ => FeedbackStatus::Pending,
            },
            created_at: row.try_get("created_at").map_err(AppError::from)?,
            updated_at: row.try_get("updated_at").map_err(AppError::from)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_str() {
        for category in ExpenseCategory::ALL {
            assert_eq!(category.as_str().parse::<ExpenseCategory>().unwrap(), category);
        }
    }

    #[test]
    fn category_rejects_unknown_value() {
        let err = "FUEL".parse::<ExpenseCategory>().unwrap_err();
        assert_eq!(err.code(), "VALIDATION/CATEGORY");
    }

    #[test]
    fn category_serde_uses_wire_names() {
        let json = serde_json::to_string(&ExpenseCategory::MechanicalWorks).unwrap();
        assert_eq!(json, "\"MECHANICAL_WORKS\"");
        let parsed: ExpenseCategory = serde_json::from_str("\"VAT_PAYMENT\"").unwrap();
        assert_eq!(parsed, ExpenseCategory::VatPayment);
    }

    #[test]
    fn enum_wire_names_are_stable() {
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!(MediaKind::Video.as_str(), "video");
        assert_eq!(DocumentKind::Registration.as_str(), "registration");
        assert_eq!(FeedbackStatus::Rejected.as_str(), "rejected");
    }

    #[test]
    fn vehicle_label_joins_make_and_model() {
        let vehicle = Vehicle {
            id: "v1".into(),
            owner_id: "u1".into(),
            make: "Toyota".into(),
            model: "Hilux".into(),
            year: 2020,
            engine_capacity: None,
            fuel_type: None,
            chassis_number: None,
            image_url: None,
            created_at: 0,
            updated_at: 0,
        };
        assert_eq!(vehicle.label(), "Toyota Hilux");
    }
}
