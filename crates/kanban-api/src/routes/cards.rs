//! Routes for cards.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use kanban_boards::application::query_handlers::{self, CardView};
use kanban_boards::domain::commands;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    /// The list to add the card to.
    pub list_id: Uuid,
    /// The card title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Position within the list.
    #[serde(default)]
    pub position: i32,
}

/// Request body for PUT /{card_id}.
///
/// Absent fields are left unchanged; an empty `description` clears it.
#[derive(Debug, Deserialize)]
pub struct UpdateCardRequest {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Destination list on the same board.
    pub list_id: Option<Uuid>,
    /// New position.
    pub position: Option<i32>,
}

/// POST /
#[instrument(skip(state, request), fields(list_id = %request.list_id))]
async fn create_card(
    State(state): State<AppState>,
    Json(request): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<CardView>), ApiError> {
    let command = commands::CreateCard {
        correlation_id: Uuid::new_v4(),
        list_id: request.list_id,
        title: request.title,
        description: request.description,
        position: request.position,
    };

    info!(correlation_id = %command.correlation_id, "handling create_card command");

    let card = state.commands.create_card(command).await?;
    Ok((StatusCode::CREATED, Json(CardView::from(&card))))
}

/// GET /{card_id}
#[instrument(skip(state))]
async fn get_card(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<CardView>, ApiError> {
    let view = query_handlers::get_card_by_id(card_id, state.reader.as_ref()).await?;
    Ok(Json(view))
}

/// PUT /{card_id}
#[instrument(skip(state, request))]
async fn update_card(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
    Json(request): Json<UpdateCardRequest>,
) -> Result<Json<CardView>, ApiError> {
    let command = commands::UpdateCard {
        correlation_id: Uuid::new_v4(),
        card_id,
        title: request.title,
        description: request.description,
        list_id: request.list_id,
        position: request.position,
    };

    info!(correlation_id = %command.correlation_id, "handling update_card command");

    let card = state.commands.update_card(command).await?;
    Ok(Json(CardView::from(&card)))
}

/// DELETE /{card_id}
#[instrument(skip(state))]
async fn delete_card(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let command = commands::DeleteCard {
        correlation_id: Uuid::new_v4(),
        card_id,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_card command");

    state.commands.delete_card(command).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Returns the router for cards.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_card)).route(
        "/{card_id}",
        get(get_card).put(update_card).delete(delete_card),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::Method;
    use kanban_boards::application::service::BoardCommands;
    use serde_json::{Value, json};

    use crate::routes::testing::{memory_state, send};

    /// Creates a board with two lists and returns their ids.
    async fn seed_lists(state: &AppState) -> (Uuid, Uuid) {
        let board = state
            .commands
            .create_board(commands::CreateBoard {
                correlation_id: Uuid::new_v4(),
                tenant_id: Uuid::new_v4(),
                name: "Roadmap".to_owned(),
            })
            .await
            .unwrap();
        let mut ids = Vec::new();
        for (name, position) in [("Todo", 0), ("Done", 1)] {
            let list = state
                .commands
                .create_list(commands::CreateList {
                    correlation_id: Uuid::new_v4(),
                    board_id: board.id,
                    name: name.to_owned(),
                    position,
                })
                .await
                .unwrap();
            ids.push(list.id);
        }
        (ids[0], ids[1])
    }

    async fn create(app: Router, list_id: Uuid) -> Value {
        let (status, json) = send(
            app,
            Method::POST,
            "/",
            Some(&json!({
                "list_id": list_id,
                "title": "Write docs",
                "description": "API reference"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        json
    }

    #[tokio::test]
    async fn test_create_then_get_card() {
        // Arrange
        let (state, _) = memory_state();
        let (todo, _) = seed_lists(&state).await;
        let app = router().with_state(state);

        // Act
        let created = create(app.clone(), todo).await;
        let card_id = created["card_id"].as_str().unwrap();
        let (status, json) = send(app, Method::GET, &format!("/{card_id}"), None).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["title"], "Write docs");
        assert_eq!(json["description"], "API reference");
        assert_eq!(json["list_id"], todo.to_string());
    }

    #[tokio::test]
    async fn test_move_card_between_lists() {
        // Arrange
        let (state, store) = memory_state();
        let (todo, done) = seed_lists(&state).await;
        let app = router().with_state(state);
        let card_id = create(app.clone(), todo).await["card_id"]
            .as_str()
            .unwrap()
            .to_owned();

        // Act
        let (status, json) = send(
            app,
            Method::PUT,
            &format!("/{card_id}"),
            Some(&json!({ "list_id": done, "position": 2, "description": "" })),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["list_id"], done.to_string());
        assert_eq!(json["position"], 2);
        assert_eq!(json["description"], Value::Null);
        let record = store.outbox_records().pop().unwrap();
        assert_eq!(record.event_type, "CardUpdatedIntegrationEvent");
        let payload: Value = serde_json::from_str(&record.payload).unwrap();
        assert_eq!(payload["list_id"], done.to_string());
    }

    #[tokio::test]
    async fn test_get_unknown_card_returns_404() {
        let (state, _) = memory_state();
        let app = router().with_state(state);

        let (status, json) = send(app, Method::GET, &format!("/{}", Uuid::new_v4()), None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "entity_not_found");
    }

    #[tokio::test]
    async fn test_delete_card_returns_204_and_enqueues_event() {
        let (state, store) = memory_state();
        let (todo, _) = seed_lists(&state).await;
        let app = router().with_state(state);
        let card_id = create(app.clone(), todo).await["card_id"]
            .as_str()
            .unwrap()
            .to_owned();

        let (status, _) = send(app, Method::DELETE, &format!("/{card_id}"), None).await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        let record = store.outbox_records().pop().unwrap();
        assert_eq!(record.event_type, "CardDeletedIntegrationEvent");
    }

    #[tokio::test]
    async fn test_create_card_with_negative_position_returns_400() {
        let (state, _) = memory_state();
        let (todo, _) = seed_lists(&state).await;
        let app = router().with_state(state);

        let (status, json) = send(
            app,
            Method::POST,
            "/",
            Some(&json!({ "list_id": todo, "title": "Ship", "position": -1 })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }
}
