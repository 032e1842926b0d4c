use axum::{http::StatusCode, Json};
use sched_core::{adapt, validate, ValidationError};
use serde::Serialize;
use types::{Instance, RawInput};

#[derive(Serialize, utoipa::ToSchema)]
pub struct ValidationReport {
    pub ok: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

fn ok_report() -> ValidationReport {
    ValidationReport {
        ok: true,
        errors: vec![],
    }
}

fn err_report(msg: impl Into<String>) -> ValidationReport {
    ValidationReport {
        ok: false,
        errors: vec![msg.into()],
    }
}

/// Accepts either a raw four-collection input record or an already-adapted
/// `Instance`, distinguished by the presence of the raw collections' keys.
#[utoipa::path(
    post,
    path = "/v1/validate",
    request_body = Instance,
    responses(
    (status = 200, description = "Validation result", body = ValidationReport)
    )
)]
pub async fn validate_handler(
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<ValidationReport>) {
    let is_raw = body.get("course_list").is_some() || body.get("student_requests").is_some();

    let instance = if is_raw {
        serde_json::from_value::<RawInput>(body)
            .map_err(|e| format!("malformed raw input: {e}"))
            .and_then(|raw| adapt(&raw).map_err(|e| e.to_string()))
    } else {
        serde_json::from_value::<Instance>(body).map_err(|e| format!("malformed instance: {e}"))
    };

    let instance = match instance {
        Ok(i) => i,
        Err(msg) => return (StatusCode::OK, Json(err_report(msg))),
    };

    match validate(&instance) {
        Ok(()) => (StatusCode::OK, Json(ok_report())),
        Err(ValidationError::Msg(msg)) => {
            let errs = msg
                .split(';')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            (
                StatusCode::OK,
                Json(ValidationReport {
                    ok: false,
                    errors: errs,
                }),
            )
        }
    }
}
