//! Request bodies, the response envelope and the conversions between them and stored fields.

use axum::extract::FromRequest;
use chrono::{DateTime, Utc};
use docstore::{fields_from_json, Document, DocumentStore, FieldValue, Fields, Records};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// `Json` extractor whose rejections render as the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Envelope returned by every store-backed route.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Serialize a request body into stored fields.
///
/// `None` options of create bodies are stored as null; update bodies skip them so only present
/// fields are written. Keys listed in `timestamps` are stored as timestamps.
pub fn to_fields<T: Serialize>(body: &T, timestamps: &[&str]) -> ApiResult<Fields> {
    let json = serde_json::to_value(body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let mut fields =
        fields_from_json(json).ok_or_else(|| ApiError::BadRequest("expected a JSON object".into()))?;

    for key in timestamps {
        if let Some(value) = fields.remove(*key) {
            fields.insert((*key).to_string(), value.parse_timestamp());
        }
    }
    Ok(fields)
}

/// Document as JSON with its id merged in.
pub fn document_json(doc: Document) -> Value {
    FieldValue::Map(doc.into_record()).to_json()
}

pub fn documents_json(docs: Vec<Document>) -> Value {
    Value::Array(docs.into_iter().map(document_json).collect())
}

// --- Users ---

#[derive(Debug, Serialize, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    /// Accepted for compatibility with existing clients, never stored.
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

// --- Companies ---

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyCreate {
    pub uid: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: Option<String>,
    pub tax_id: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// --- Employees ---

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCreate {
    pub uid: String,
    pub company_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    /// technician, manager or admin.
    pub role: String,
    pub hourly_rate: Option<f64>,
    pub commission_rate: Option<f64>,
    pub hired_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// --- Item categories ---

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    pub description: String,
    pub color: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// --- Items ---

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCreate {
    pub name: String,
    pub description: String,
    /// service or product.
    #[serde(rename = "type")]
    pub item_type: String,
    pub category_id: String,
    pub price: f64,
    pub duration_minutes: Option<i64>,
    pub sku: Option<String>,
    pub stock_quantity: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// --- Transactions ---

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCreate {
    pub company_id: String,
    pub transaction_number: String,
    pub transaction_date: DateTime<Utc>,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub employee_id: Option<String>,
    pub status: String,
    pub payment_method: String,
    pub subtotal: f64,
    #[serde(default)]
    pub tax: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub tip: f64,
    pub total: f64,
    pub notes: Option<String>,
    /// Client-supplied timestamps win over the server clock when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLineCreate {
    pub item_id: String,
    pub item_name: String,
    pub item_type: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub line_total: f64,
    pub technician_id: Option<String>,
    pub service_duration: Option<i64>,
    pub notes: Option<String>,
}

/// Timestamp-typed keys of a transaction body.
pub const TRANSACTION_TIMESTAMPS: &[&str] = &["transactionDate", "createdAt", "updatedAt"];

/// A collection exposed with create/list/update/delete routes and no existence checks.
pub trait Resource: Send + Sync + 'static {
    type Create: DeserializeOwned + Serialize + Send;
    type Update: DeserializeOwned + Serialize + Send;

    /// Label used in messages, e.g. `Company`.
    const LABEL: &'static str;
    /// Key of the list in list responses, e.g. `companies`.
    const PLURAL: &'static str;
    /// Whether created records start with `isActive: true`.
    const MARK_ACTIVE: bool;
    /// Timestamp-typed keys of the create body.
    const TIMESTAMPS: &'static [&'static str] = &[];

    fn records(store: &DocumentStore) -> Records<'_>;
}

pub struct Companies;

impl Resource for Companies {
    type Create = CompanyCreate;
    type Update = CompanyUpdate;
    const LABEL: &'static str = "Company";
    const PLURAL: &'static str = "companies";
    const MARK_ACTIVE: bool = false;

    fn records(store: &DocumentStore) -> Records<'_> {
        store.companies()
    }
}

pub struct Employees;

impl Resource for Employees {
    type Create = EmployeeCreate;
    type Update = EmployeeUpdate;
    const LABEL: &'static str = "Employee";
    const PLURAL: &'static str = "employees";
    const MARK_ACTIVE: bool = true;
    const TIMESTAMPS: &'static [&'static str] = &["hiredDate"];

    fn records(store: &DocumentStore) -> Records<'_> {
        store.employees()
    }
}

pub struct Categories;

impl Resource for Categories {
    type Create = CategoryCreate;
    type Update = CategoryUpdate;
    const LABEL: &'static str = "Category";
    const PLURAL: &'static str = "categories";
    const MARK_ACTIVE: bool = true;

    fn records(store: &DocumentStore) -> Records<'_> {
        store.categories()
    }
}

pub struct Items;

impl Resource for Items {
    type Create = ItemCreate;
    type Update = ItemUpdate;
    const LABEL: &'static str = "Item";
    const PLURAL: &'static str = "items";
    const MARK_ACTIVE: bool = true;

    fn records(store: &DocumentStore) -> Records<'_> {
        store.items()
    }
}
