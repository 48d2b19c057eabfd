use std::sync::OnceLock;

use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use regex::Regex;

use crate::error::AppError;

/// Matches `Key (field)=(value)` in PostgreSQL DETAIL lines.
static KEY_VALUE: OnceLock<Option<Regex>> = OnceLock::new();

fn key_value_pattern() -> Option<&'static Regex> {
    KEY_VALUE
        .get_or_init(|| Regex::new(r"Key \(([^)]+)\)=\(([^)]*)\)").ok())
        .as_ref()
}

/// Translates diesel failures into the `AppError` taxonomy.
///
/// Constraint names follow the PostgreSQL defaults used by the migrations
/// (`<table>_<column>_key`, `<table>_<column>_fkey`, `<table>_<column>_check`),
/// which is what lets a unique violation become a `Duplicate` with the right
/// entity and field.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info.as_ref(), operation)
            }
            DieselError::NotFound => AppError::not_found("resource", "id", "unknown"),
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: &(dyn DatabaseErrorInformation + Send + Sync),
        operation: &str,
    ) -> AppError {
        let detail = info.details().unwrap_or_else(|| info.message());
        let key_value =
            Self::parse_key_value(detail).or_else(|| Self::parse_key_value(info.message()));

        match kind {
            DatabaseErrorKind::UniqueViolation => {
                let (field, value) = key_value
                    .or_else(|| info.column_name().map(|c| (c.to_string(), "unknown".to_string())))
                    .unwrap_or_else(|| ("unknown".to_string(), "unknown".to_string()));
                let entity = info
                    .table_name()
                    .map(str::to_string)
                    .or_else(|| {
                        info.constraint_name()
                            .and_then(|c| Self::entity_from_constraint(c, &field, "_key"))
                    })
                    .unwrap_or_else(|| "resource".to_string());
                AppError::Duplicate {
                    entity,
                    field,
                    value,
                }
            }
            DatabaseErrorKind::ForeignKeyViolation => {
                let (field, value) = key_value.unwrap_or_else(|| {
                    ("reference".to_string(), "unknown".to_string())
                });
                AppError::Validation {
                    reason: format!("No active record referenced by {} = '{}'", field, value),
                    field,
                }
            }
            DatabaseErrorKind::NotNullViolation => {
                let field = info.column_name().unwrap_or("unknown").to_string();
                AppError::Validation {
                    field,
                    reason: "Field is required".to_string(),
                }
            }
            DatabaseErrorKind::CheckViolation => {
                let field = info
                    .constraint_name()
                    .and_then(|c| c.strip_suffix("_check"))
                    .and_then(|c| info.table_name().and_then(|t| c.strip_prefix(t)))
                    .map(|c| c.trim_start_matches('_').to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                AppError::Validation {
                    field,
                    reason: "Value is out of the allowed range".to_string(),
                }
            }
            _ => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::msg(info.message().to_string()),
            },
        }
    }

    /// Extracts `(field, value)` from a `Key (field)=(value)` fragment.
    fn parse_key_value(text: &str) -> Option<(String, String)> {
        let captures = key_value_pattern()?.captures(text)?;
        Some((captures.get(1)?.as_str().to_string(), captures.get(2)?.as_str().to_string()))
    }

    /// `payment_methods_name_key` with field `name` yields `payment_methods`.
    fn entity_from_constraint(constraint: &str, field: &str, suffix: &str) -> Option<String> {
        constraint
            .strip_suffix(suffix)?
            .strip_suffix(field)?
            .strip_suffix('_')
            .map(str::to_string)
    }
}
