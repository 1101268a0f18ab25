//! Routes for boards and board memberships.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use kanban_boards::application::query_handlers::{self, BoardView, MemberView};
use kanban_boards::domain::commands;
use kanban_core::error::DomainError;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateBoardRequest {
    /// The owning tenant.
    pub tenant_id: Uuid,
    /// The board name.
    pub name: String,
}

/// Request body for PUT /{board_id}.
#[derive(Debug, Deserialize)]
pub struct UpdateBoardRequest {
    /// The new name.
    pub name: String,
}

/// Request body for POST /{board_id}/members.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    /// The user receiving access.
    pub user_id: Uuid,
}

/// POST /
#[instrument(skip(state, request), fields(tenant_id = %request.tenant_id))]
async fn create_board(
    State(state): State<AppState>,
    Json(request): Json<CreateBoardRequest>,
) -> Result<(StatusCode, Json<BoardView>), ApiError> {
    let command = commands::CreateBoard {
        correlation_id: Uuid::new_v4(),
        tenant_id: request.tenant_id,
        name: request.name,
    };

    info!(correlation_id = %command.correlation_id, "handling create_board command");

    let board = state.commands.create_board(command).await?;
    Ok((StatusCode::CREATED, Json(BoardView::from(&board))))
}

/// GET /{board_id}
#[instrument(skip(state))]
async fn get_board(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
) -> Result<Json<BoardView>, ApiError> {
    let view = query_handlers::get_board_by_id(board_id, state.reader.as_ref()).await?;
    Ok(Json(view))
}

/// PUT /{board_id}
#[instrument(skip(state, request))]
async fn update_board(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    Json(request): Json<UpdateBoardRequest>,
) -> Result<Json<BoardView>, ApiError> {
    let command = commands::UpdateBoard {
        correlation_id: Uuid::new_v4(),
        board_id,
        name: request.name,
    };

    info!(correlation_id = %command.correlation_id, "handling update_board command");

    let board = state.commands.update_board(command).await?;
    Ok(Json(BoardView::from(&board)))
}

/// DELETE /{board_id}
#[instrument(skip(state))]
async fn delete_board(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let command = commands::DeleteBoard {
        correlation_id: Uuid::new_v4(),
        board_id,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_board command");

    state.commands.delete_board(command).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /{board_id}/members
#[instrument(skip(state, request), fields(user_id = %request.user_id))]
async fn add_member(
    State(state): State<AppState>,
    Path(board_id): Path<Uuid>,
    Json(request): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<MemberView>), ApiError> {
    let command = commands::AddMember {
        correlation_id: Uuid::new_v4(),
        board_id,
        user_id: request.user_id,
    };

    info!(correlation_id = %command.correlation_id, "handling add_member command");

    let membership = state.commands.add_member(command).await?;
    Ok((StatusCode::CREATED, Json(MemberView::from(&membership))))
}

/// DELETE /{board_id}/members/{membership_id}
#[instrument(skip(state))]
async fn remove_member(
    State(state): State<AppState>,
    Path((board_id, membership_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let on_board = state
        .reader
        .members_of_board(board_id)
        .await?
        .iter()
        .any(|m| m.id == membership_id);
    if !on_board {
        return Err(DomainError::not_found("Membership", membership_id).into());
    }

    let command = commands::RemoveMember {
        correlation_id: Uuid::new_v4(),
        membership_id,
    };

    info!(correlation_id = %command.correlation_id, "handling remove_member command");

    state.commands.remove_member(command).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Returns the router for boards.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_board))
        .route(
            "/{board_id}",
            get(get_board).put(update_board).delete(delete_board),
        )
        .route("/{board_id}/members", post(add_member))
        .route("/{board_id}/members/{membership_id}", delete(remove_member))
}
