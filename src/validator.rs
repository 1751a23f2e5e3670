use std::collections::HashMap;

use anyhow::anyhow;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::utils::errors::AppError;

/// Collapses derive-generated validation errors into the field-to-message map
/// carried by 422 responses.
fn field_errors(errors: &ValidationErrors) -> HashMap<String, String> {
    errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let message = errors
                .iter()
                .find_map(|error| error.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| format!("{field} is invalid"));
            (field.to_string(), message)
        })
        .collect()
}

/// JSON extractor that deserializes and then validates the request body.
///
/// A body that cannot be parsed at all is a 400 with a pointer at the
/// problem; a body that parses but fails validation is a 422 carrying a
/// field-to-message map.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                let error_msg = rejection.body_text();

                if error_msg.contains("missing field") {
                    let field = error_msg
                        .split("missing field `")
                        .nth(1)
                        .and_then(|s| s.split('`').next())
                        .unwrap_or("unknown");
                    return AppError::bad_request(anyhow!("{field} is required"));
                }

                if error_msg.contains("invalid type") {
                    return AppError::bad_request(anyhow!("invalid field type in request body"));
                }

                if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
                    return AppError::bad_request(anyhow!(
                        "missing 'Content-Type: application/json' header"
                    ));
                }

                AppError::bad_request(anyhow!("body contains badly-formed JSON"))
            })?;

        value
            .validate()
            .map_err(|errors| AppError::failed_validation(field_errors(&errors)))?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use validator::Validate;

    #[derive(Debug, Deserialize, Validate)]
    struct Dto {
        #[validate(length(min = 1, message = "must be provided"))]
        name: String,
    }

    #[test]
    fn validation_errors_become_a_field_map() {
        let dto = Dto {
            name: String::new(),
        };
        let errors = dto.validate().unwrap_err();

        let map = field_errors(&errors);
        assert_eq!(map.get("name").map(String::as_str), Some("must be provided"));
    }
}
