//! Account record and its JSON mapping.

use chrono::{NaiveDate, Utc};
use serde_json::{json, Map, Value};
use service_core::error::AppError;
use sqlx::FromRow;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raised when a request body cannot be turned into an [`Account`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid Account: {0}")]
pub struct DataValidationError(pub String);

impl DataValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<DataValidationError> for AppError {
    fn from(err: DataValidationError) -> Self {
        AppError::BadRequest(anyhow::Error::new(err))
    }
}

/// Customer account.
///
/// `id` is `None` until the record has been created in a store.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Account {
    pub id: Option<i32>,
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone_number: Option<String>,
    pub date_joined: NaiveDate,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            email: String::new(),
            address: String::new(),
            phone_number: None,
            date_joined: Utc::now().date_naive(),
        }
    }
}

impl Account {
    /// Wire representation.
    pub fn serialize(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "address": self.address,
            "phone_number": self.phone_number,
            "date_joined": self.date_joined.format(DATE_FORMAT).to_string(),
        })
    }

    /// Populates the mutable fields from a JSON object.
    ///
    /// `id` is never read from input. A `date_joined` in the payload is
    /// honoured on create only; stores never write it on update. On error
    /// `self` is left untouched.
    pub fn deserialize(&mut self, data: &Value) -> Result<&mut Self, DataValidationError> {
        let data = data.as_object().ok_or_else(|| {
            DataValidationError::new("body of request contained bad or no data")
        })?;

        let name = required_string(data, "name")?;
        let email = required_string(data, "email")?;
        let address = required_string(data, "address")?;
        let phone_number = optional_string(data, "phone_number")?;
        let date_joined = optional_string(data, "date_joined")?
            .map(|raw| {
                NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|_| {
                    DataValidationError::new(format!(
                        "date_joined must be a YYYY-MM-DD date, got '{}'",
                        raw
                    ))
                })
            })
            .transpose()?;

        self.name = name;
        self.email = email;
        self.address = address;
        self.phone_number = phone_number;
        if let Some(date_joined) = date_joined {
            self.date_joined = date_joined;
        }

        Ok(self)
    }
}

fn required_string(data: &Map<String, Value>, key: &str) -> Result<String, DataValidationError> {
    match data.get(key) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(DataValidationError::new(format!("{} must be a string", key))),
        None => Err(DataValidationError::new(format!("missing {}", key))),
    }
}

fn optional_string(
    data: &Map<String, Value>,
    key: &str,
) -> Result<Option<String>, DataValidationError> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(DataValidationError::new(format!(
            "{} must be a string or null",
            key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Value {
        json!({
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "address": "12 St James's Square, London",
            "phone_number": "555-0100",
        })
    }

    #[test]
    fn serialize_renders_all_keys() {
        let account = Account {
            id: Some(7),
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            address: "12 St James's Square, London".into(),
            phone_number: None,
            date_joined: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
        };

        let value = account.serialize();

        assert_eq!(value["id"], 7);
        assert_eq!(value["name"], "Ada Lovelace");
        assert_eq!(value["email"], "ada@example.com");
        assert_eq!(value["address"], "12 St James's Square, London");
        assert!(value["phone_number"].is_null());
        assert_eq!(value["date_joined"], "2024-03-09");
        assert_eq!(value.as_object().unwrap().len(), 6);
    }

    #[test]
    fn serialize_unsaved_account_has_null_id() {
        assert!(Account::default().serialize()["id"].is_null());
    }

    #[test]
    fn deserialize_populates_fields() {
        let mut account = Account::default();
        account.deserialize(&payload()).unwrap();

        assert_eq!(account.id, None);
        assert_eq!(account.name, "Ada Lovelace");
        assert_eq!(account.email, "ada@example.com");
        assert_eq!(account.address, "12 St James's Square, London");
        assert_eq!(account.phone_number.as_deref(), Some("555-0100"));
        assert_eq!(account.date_joined, Utc::now().date_naive());
    }

    #[test]
    fn deserialize_ignores_id_in_payload() {
        let mut data = payload();
        data["id"] = json!(99);

        let mut account = Account::default();
        account.deserialize(&data).unwrap();

        assert_eq!(account.id, None);
    }

    #[test]
    fn deserialize_reads_date_joined_when_present() {
        let mut data = payload();
        data["date_joined"] = json!("2019-11-30");

        let mut account = Account::default();
        account.deserialize(&data).unwrap();

        assert_eq!(
            account.date_joined,
            NaiveDate::from_ymd_opt(2019, 11, 30).unwrap()
        );
    }

    #[test]
    fn serialized_account_deserializes_back() {
        let mut original = Account::default();
        original.deserialize(&payload()).unwrap();
        original.id = Some(3);

        let mut copy = Account::default();
        copy.deserialize(&original.serialize()).unwrap();

        assert_eq!(copy.name, original.name);
        assert_eq!(copy.email, original.email);
        assert_eq!(copy.address, original.address);
        assert_eq!(copy.phone_number, original.phone_number);
    }

    #[test]
    fn missing_required_field_names_it() {
        let mut account = Account::default();
        let err = account
            .deserialize(&json!({"name": "not enough data"}))
            .unwrap_err();

        assert_eq!(err, DataValidationError::new("missing email"));
        assert_eq!(err.to_string(), "Invalid Account: missing email");
    }

    #[test]
    fn wrong_type_is_rejected() {
        let mut data = payload();
        data["address"] = json!(42);

        let err = Account::default().deserialize(&data).unwrap_err();
        assert_eq!(err, DataValidationError::new("address must be a string"));
    }

    #[test]
    fn phone_number_may_be_null_but_not_a_number() {
        let mut data = payload();
        data["phone_number"] = Value::Null;
        let mut account = Account::default();
        account.deserialize(&data).unwrap();
        assert_eq!(account.phone_number, None);

        data["phone_number"] = json!(5550100);
        assert!(Account::default().deserialize(&data).is_err());
    }

    #[test]
    fn malformed_date_is_rejected() {
        let mut data = payload();
        data["date_joined"] = json!("yesterday");

        let err = Account::default().deserialize(&data).unwrap_err();
        assert!(err.0.starts_with("date_joined"));
    }

    #[test]
    fn non_object_is_rejected() {
        for data in [json!(null), json!([1, 2]), json!("account")] {
            assert!(Account::default().deserialize(&data).is_err());
        }
    }

    #[test]
    fn failed_deserialize_leaves_account_untouched() {
        let mut account = Account::default();
        account.deserialize(&payload()).unwrap();
        let before = account.clone();

        let result = account.deserialize(&json!({"name": "Someone Else", "email": "x@y.z"}));

        assert!(result.is_err());
        assert_eq!(account, before);
    }

    #[test]
    fn converts_to_bad_request() {
        let err: AppError = DataValidationError::new("missing name").into();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
