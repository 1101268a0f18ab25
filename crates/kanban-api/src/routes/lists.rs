//! Routes for board lists.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use kanban_boards::application::query_handlers::ListView;
use kanban_boards::domain::commands;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    /// The board to add the list to.
    pub board_id: Uuid,
    /// The list name.
    pub name: String,
    /// Position on the board; defaults to 0.
    #[serde(default)]
    pub position: i32,
}

/// Request body for PUT /{list_id}.
#[derive(Debug, Deserialize)]
pub struct UpdateListRequest {
    /// New name, if changing.
    pub name: Option<String>,
    /// New position, if changing.
    pub position: Option<i32>,
}

/// POST /
#[instrument(skip(state, request), fields(board_id = %request.board_id))]
async fn create_list(
    State(state): State<AppState>,
    Json(request): Json<CreateListRequest>,
) -> Result<(StatusCode, Json<ListView>), ApiError> {
    let command = commands::CreateList {
        correlation_id: Uuid::new_v4(),
        board_id: request.board_id,
        name: request.name,
        position: request.position,
    };

    info!(correlation_id = %command.correlation_id, "handling create_list command");

    let list = state.commands.create_list(command).await?;
    Ok((StatusCode::CREATED, Json(ListView::from(&list))))
}

/// PUT /{list_id}
#[instrument(skip(state, request))]
async fn update_list(
    State(state): State<AppState>,
    Path(list_id): Path<Uuid>,
    Json(request): Json<UpdateListRequest>,
) -> Result<Json<ListView>, ApiError> {
    let command = commands::UpdateList {
        correlation_id: Uuid::new_v4(),
        list_id,
        name: request.name,
        position: request.position,
    };

    info!(correlation_id = %command.correlation_id, "handling update_list command");

    let list = state.commands.update_list(command).await?;
    Ok(Json(ListView::from(&list)))
}

/// DELETE /{list_id}
#[instrument(skip(state))]
async fn delete_list(
    State(state): State<AppState>,
    Path(list_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let command = commands::DeleteList {
        correlation_id: Uuid::new_v4(),
        list_id,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_list command");

    state.commands.delete_list(command).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Returns the router for lists.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_list))
        .route("/{list_id}", put(update_list).delete(delete_list))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::Method;
    use kanban_boards::application::service::BoardCommands;
    use serde_json::json;

    use crate::routes::testing::{memory_state, send};

    async fn seed_board(state: &AppState) -> Uuid {
        state
            .commands
            .create_board(commands::CreateBoard {
                correlation_id: Uuid::new_v4(),
                tenant_id: Uuid::new_v4(),
                name: "Roadmap".to_owned(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_list_returns_201() {
        // Arrange
        let (state, store) = memory_state();
        let board_id = seed_board(&state).await;
        let app = router().with_state(state);

        // Act
        let (status, json) = send(
            app,
            Method::POST,
            "/",
            Some(&json!({ "board_id": board_id, "name": "Todo", "position": 1 })),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["board_id"], board_id.to_string());
        assert_eq!(json["position"], 1);
        assert_eq!(
            store.outbox_records().last().unwrap().event_type,
            "ListCreatedIntegrationEvent"
        );
    }

    #[tokio::test]
    async fn test_create_list_on_unknown_board_returns_404() {
        let (state, _) = memory_state();
        let app = router().with_state(state);

        let (status, json) = send(
            app,
            Method::POST,
            "/",
            Some(&json!({ "board_id": Uuid::new_v4(), "name": "Todo" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "entity_not_found");
    }

    #[tokio::test]
    async fn test_update_list_without_changes_returns_400() {
        // Arrange
        let (state, _) = memory_state();
        let board_id = seed_board(&state).await;
        let app = router().with_state(state);
        let (_, list) = send(
            app.clone(),
            Method::POST,
            "/",
            Some(&json!({ "board_id": board_id, "name": "Todo" })),
        )
        .await;
        let list_id = list["list_id"].as_str().unwrap();

        // Act
        let (status, json) = send(app, Method::PUT, &format!("/{list_id}"), Some(&json!({}))).await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_rename_and_delete_list() {
        // Arrange
        let (state, store) = memory_state();
        let board_id = seed_board(&state).await;
        let app = router().with_state(state);
        let (_, list) = send(
            app.clone(),
            Method::POST,
            "/",
            Some(&json!({ "board_id": board_id, "name": "Todo" })),
        )
        .await;
        let list_id = list["list_id"].as_str().unwrap();

        // Act
        let (renamed, json) = send(
            app.clone(),
            Method::PUT,
            &format!("/{list_id}"),
            Some(&json!({ "name": "Backlog" })),
        )
        .await;
        let (deleted, _) = send(app, Method::DELETE, &format!("/{list_id}"), None).await;

        // Assert
        assert_eq!(renamed, StatusCode::OK);
        assert_eq!(json["name"], "Backlog");
        assert_eq!(deleted, StatusCode::NO_CONTENT);
        let types: Vec<String> = store
            .outbox_records()
            .into_iter()
            .map(|r| r.event_type)
            .collect();
        assert_eq!(
            types,
            vec![
                "BoardCreatedIntegrationEvent",
                "ListCreatedIntegrationEvent",
                "ListUpdatedIntegrationEvent",
                "ListDeletedIntegrationEvent"
            ]
        );
    }
}
