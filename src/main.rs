use std::{error::Error, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use derive_more::From;
use tokio::{fs, net};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{
    layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

use artisan_tickets::{api, db, notify, service, taxonomy, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = fs::read_to_string("config.toml").await?;
    let config = toml::from_str::<Config>(&config)?;

    let db_client = db::connect(config.db).await?;
    db_client.migrate().await?;

    let taxonomy_client = taxonomy::HttpClient::new(&config.taxonomy)?;
    let publisher = notify::HttpPublisher::new(&config.notifications)?;
    let notifier = notify::Notifier::new(
        Arc::new(publisher),
        config.notifications.subjects,
    );
    let service = service::Service::new(
        Arc::new(db_client.clone()),
        Arc::new(db_client),
        Arc::new(taxonomy_client),
        notifier,
    );

    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE]);
    for origin in &config.http.cors.allowed_origins {
        cors = cors.allow_origin(origin.parse::<HeaderValue>()?);
    }

    let app = Router::new()
        .route("/ticket", post(add_ticket))
        .route("/ticket/search", post(search_tickets))
        .route(
            "/ticket/:id",
            get(get_ticket).patch(edit_ticket).delete(remove_ticket),
        )
        .route(
            "/ticket/:id/respond",
            get(get_ticket_responds).post(add_respond),
        )
        .route("/user/:id/ticket/search", post(search_user_tickets))
        .route("/user/:id/respond", get(get_user_responds))
        .route("/master/:id/respond", get(get_master_responds))
        .route(
            "/respond/:id",
            get(get_respond).patch(edit_respond).delete(remove_respond),
        )
        .layer(cors)
        .with_state(Arc::new(AppState { service }));

    let listener = net::TcpListener::bind(config.http.server.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn add_ticket(
    State(state): State<SharedAppState>,
    Json(input): Json<api::ticket::Create>,
) -> Result<Json<api::Ticket>, ApiError> {
    let id = state
        .service
        .create_ticket(db::ticket::CreateTicket {
            user_id: input.user_id,
            category_id: input.category_id,
            name: input.name,
            description: input.description,
            price: input.price,
            quantity: input.quantity,
            tag_ids: input.tag_ids,
            attachments: input.attachments,
        })
        .await?;

    let ticket = state.service.get_ticket_by_id(id).await?;
    Ok(Json(ticket))
}

async fn get_ticket(
    State(state): State<SharedAppState>,
    Path(id): Path<api::ticket::Id>,
) -> Result<Json<api::Ticket>, ApiError> {
    let ticket = state.service.get_ticket_by_id(id).await?;
    Ok(Json(ticket))
}

async fn search_tickets(
    State(state): State<SharedAppState>,
    Json(input): Json<api::ticket::Search>,
) -> Result<Json<api::ticket::List>, ApiError> {
    let tickets_fut = state
        .service
        .get_tickets(input.pagination, input.filters.clone());
    let total_count_fut = state.service.count_tickets(input.filters);
    let (tickets, total_count) =
        tokio::try_join!(tickets_fut, total_count_fut)?;

    Ok(Json(api::ticket::List {
        tickets,
        total_count,
    }))
}

async fn search_user_tickets(
    State(state): State<SharedAppState>,
    Path(user_id): Path<taxonomy::UserId>,
    Json(input): Json<api::ticket::Search>,
) -> Result<Json<api::ticket::List>, ApiError> {
    let tickets_fut = state.service.get_user_tickets(
        user_id,
        input.pagination,
        input.filters.clone(),
    );
    let total_count_fut =
        state.service.count_user_tickets(user_id, input.filters);
    let (tickets, total_count) =
        tokio::try_join!(tickets_fut, total_count_fut)?;

    Ok(Json(api::ticket::List {
        tickets,
        total_count,
    }))
}

async fn edit_ticket(
    State(state): State<SharedAppState>,
    Path(id): Path<api::ticket::Id>,
    Json(input): Json<api::ticket::Update>,
) -> Result<Json<api::Ticket>, ApiError> {
    state
        .service
        .update_ticket(service::ticket::UpdateTicket {
            id,
            category_id: input.category_id,
            name: input.name,
            description: input.description,
            price: input.price,
            quantity: input.quantity,
            tag_ids: input.tag_ids,
            attachments: input.attachments,
        })
        .await?;

    let ticket = state.service.get_ticket_by_id(id).await?;
    Ok(Json(ticket))
}

async fn remove_ticket(
    State(state): State<SharedAppState>,
    Path(id): Path<api::ticket::Id>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_ticket(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_respond(
    State(state): State<SharedAppState>,
    Path(ticket_id): Path<api::ticket::Id>,
    Json(input): Json<api::respond::Create>,
) -> Result<Json<api::Respond>, ApiError> {
    let id = state
        .service
        .respond_to_ticket(service::respond::RespondToTicket {
            ticket_id,
            user_id: input.user_id,
            price: input.price,
            comment: input.comment,
        })
        .await?;

    let respond = state.service.get_respond_by_id(id).await?;
    Ok(Json(respond))
}

async fn get_respond(
    State(state): State<SharedAppState>,
    Path(id): Path<api::respond::Id>,
) -> Result<Json<api::Respond>, ApiError> {
    let respond = state.service.get_respond_by_id(id).await?;
    Ok(Json(respond))
}

async fn get_ticket_responds(
    State(state): State<SharedAppState>,
    Path(ticket_id): Path<api::ticket::Id>,
) -> Result<Json<Vec<api::Respond>>, ApiError> {
    let responds = state.service.get_ticket_responds(ticket_id).await?;
    Ok(Json(responds))
}

async fn get_user_responds(
    State(state): State<SharedAppState>,
    Path(user_id): Path<taxonomy::UserId>,
) -> Result<Json<Vec<api::Respond>>, ApiError> {
    let responds = state.service.get_user_responds(user_id).await?;
    Ok(Json(responds))
}

async fn get_master_responds(
    State(state): State<SharedAppState>,
    Path(master_id): Path<taxonomy::MasterId>,
) -> Result<Json<Vec<api::Respond>>, ApiError> {
    let responds = state.service.get_master_responds(master_id).await?;
    Ok(Json(responds))
}

async fn edit_respond(
    State(state): State<SharedAppState>,
    Path(id): Path<api::respond::Id>,
    Json(input): Json<api::respond::Update>,
) -> Result<Json<api::Respond>, ApiError> {
    state
        .service
        .update_respond(service::respond::UpdateRespond {
            id,
            price: input.price,
            comment: input.comment,
        })
        .await?;

    let respond = state.service.get_respond_by_id(id).await?;
    Ok(Json(respond))
}

async fn remove_respond(
    State(state): State<SharedAppState>,
    Path(id): Path<api::respond::Id>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_respond(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, From)]
struct ApiError(service::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use service::Error as E;

        match &self.0 {
            E::TicketNotFound
            | E::RespondNotFound
            | E::CategoryNotFound(_)
            | E::TagNotFound(_)
            | E::Taxonomy(taxonomy::Error::MasterNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            E::TicketAlreadyExists | E::RespondAlreadyExists => {
                StatusCode::CONFLICT
            }
            E::RespondToOwnTicket => StatusCode::FORBIDDEN,
            E::Taxonomy(_) | E::Storage(_) => {
                tracing::error!(error = %self.0, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
        .into_response()
    }
}

type SharedAppState = Arc<AppState>;

struct AppState {
    service: service::Service,
}
