use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, Config};
use crate::handlers::{calendar, events, health_check, organizers, registrations};
use crate::services::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/events",
            get(events::list_events).post(events::create_event),
        )
        .route(
            "/events/:id",
            get(events::event_details)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/registrations", post(registrations::register))
        .route("/registrations", get(registrations::list_registrations))
        .route("/calendar", get(calendar::month_view))
        .route(
            "/organizers",
            get(organizers::list_organizers).post(organizers::create_organizer),
        )
        .route(
            "/organizers/:id",
            get(organizers::get_organizer)
                .put(organizers::update_organizer)
                .delete(organizers::delete_organizer),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(config))
        .layer(create_cors_layer(config.cors_allowed_origins.as_deref()))
}
