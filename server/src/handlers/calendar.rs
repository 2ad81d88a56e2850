use axum::extract::State;
use axum::response::Response;

use crate::services::query::CalendarQuery;
use crate::services::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::ApiQuery;
use crate::utils::response::success;

/// GET /calendar?year&month
pub async fn month_view(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CalendarQuery>,
) -> Result<Response, AppError> {
    let view = state.events.calendar(query).await?;
    let message = format!("Events for {}-{:02}", view.year, view.month);
    Ok(success(view, message))
}
