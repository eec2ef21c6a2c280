use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::tokens::TokenStatementResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Tokens",
    operation_id = "getTokenStatement",
    summary = "Token balance and transaction history",
    description = "Returns the caller's balance and every ledger entry in the order it was applied.",
    responses(
        (status = 200, description = "Statement", body = TokenStatementResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Account no longer exists (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_statement(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<TokenStatementResponse>, AppError> {
    let statement = state.ledger.statement(auth_user.user_id).await?;
    Ok(Json(statement.into()))
}
