use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use jobs::JobStatus;

#[utoipa::path(
        get,
        path = "/v1/jobs/{id}/report",
        params(("id" = String, Path, description = "Job ID")),
        responses((status = 200, description = "Markdown report for a solved job", body = String))
    )]
pub async fn report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<String, ApiError> {
    match state.jobs.get(&id) {
        Some(JobStatus::Solved { result, instance }) => {
            let schedule = sched_core::materialize(&instance, &result.assignments);
            Ok(report::render(&instance, &result, &schedule))
        }
        Some(JobStatus::Failed { message }) => Err(ApiError(format!("job failed: {message}"))),
        Some(_) => Err(ApiError("job not ready".into())),
        None => Err(ApiError("job not found".into())),
    }
}
