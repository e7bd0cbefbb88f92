use actix_web::{error::InternalError, HttpResponse};
use serde::Serialize;
use validator::ValidationErrors;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub fields: serde_json::Value,
}

/// Per-field messages in the shape `{"field": {"errors": [...]}}`
pub fn field_errors(errors: &ValidationErrors) -> serde_json::Value {
    let mut fields = serde_json::Map::new();
    for (field, errors) in errors.field_errors() {
        let messages: Vec<String> = errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Validation error in field: {}", field))
            })
            .collect();
        fields.insert(field.to_string(), serde_json::json!({"errors": messages}));
    }
    serde_json::Value::Object(fields)
}

fn bad_request(error: &str, fields: serde_json::Value) -> actix_web::Error {
    InternalError::from_response(
        "",
        HttpResponse::BadRequest().json(ErrorResponse {
            error: error.to_string(),
            fields,
        }),
    )
    .into()
}

/// Creates a configured JsonConfig with standardized error handling for the entire project
pub fn json_config() -> actix_web_validator::JsonConfig {
    actix_web_validator::JsonConfig::default().error_handler(|err, _req| match err {
        actix_web_validator::Error::Validate(validation_errors) => {
            bad_request("Validation failed", field_errors(&validation_errors))
        }
        actix_web_validator::Error::Deserialize(de_err) => {
            let err_string = de_err.to_string();

            let message = if err_string.contains("EOF while parsing") {
                "Request body is empty. Expected JSON payload".to_string()
            } else if err_string.contains("unknown variant") {
                "Invalid enum value. Check allowed values for this field".to_string()
            } else if err_string.contains("missing field") {
                // serde reports e.g. "missing field `company` at line 1 column 42"
                err_string
                    .split(" at line")
                    .next()
                    .unwrap_or("Missing field")
                    .replace('`', "")
            } else {
                "Invalid JSON format".to_string()
            };

            bad_request(
                "Request validation failed",
                serde_json::json!({"message": message}),
            )
        }
        _ => bad_request(
            "Validation failed",
            serde_json::json!({"message": "Validation error"}),
        ),
    })
}

/// Rejects malformed query strings (e.g. a non-numeric page) with the shared error shape
pub fn query_config() -> actix_web::web::QueryConfig {
    actix_web::web::QueryConfig::default().error_handler(|err, _req| {
        bad_request(
            "Invalid query parameters",
            serde_json::json!({"message": err.to_string()}),
        )
    })
}
