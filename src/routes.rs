use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath},
    http::{HeaderName, Request, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    controllers,
    middlewares::{jwt_auth_middleware, optional_jwt_auth_middleware},
    state::{AppState, SharedAppState},
};

const REQUEST_ID_HEADER: &str = "x-request-id";
// 20MB, base64 recipe images
const RECIPE_BODY_LIMIT: usize = 20 * 1024 * 1024;

/// Routes anyone may call. The viewer, when known, shapes flags such as
/// `is_subscribed` and `is_favorited`.
fn public_routes(state: SharedAppState) -> Router<SharedAppState> {
    Router::new()
        .route("/users", get(controllers::users::index))
        .route("/users/{id}", get(controllers::users::show))
        .route("/tags", get(controllers::tags::index))
        .route("/tags/{id}", get(controllers::tags::show))
        .route("/ingredients", get(controllers::ingredients::index))
        .route("/ingredients/{id}", get(controllers::ingredients::show))
        .route("/recipes", get(controllers::recipes::index))
        .route("/recipes/{id}", get(controllers::recipes::show))
        .layer(middleware::from_fn_with_state(
            state,
            optional_jwt_auth_middleware,
        ))
        // registration and login never look at the token
        .route("/users", post(controllers::users::store))
        .route("/auth/token/login", post(controllers::auth::login))
}

fn private_routes(state: SharedAppState) -> Router<SharedAppState> {
    Router::new()
        .route("/users/me", get(controllers::users::me))
        .route(
            "/users/set_password",
            post(controllers::users::set_password),
        )
        .route(
            "/users/subscriptions",
            get(controllers::subscriptions::index),
        )
        .route(
            "/users/{id}/subscribe",
            post(controllers::subscriptions::store).delete(controllers::subscriptions::destroy),
        )
        .route("/auth/token/logout", post(controllers::auth::logout))
        .route(
            "/recipes",
            post(controllers::recipes::store).layer(DefaultBodyLimit::max(RECIPE_BODY_LIMIT)),
        )
        .route(
            "/recipes/{id}",
            axum::routing::patch(controllers::recipes::update)
                .layer(DefaultBodyLimit::max(RECIPE_BODY_LIMIT))
                .delete(controllers::recipes::destroy),
        )
        .route(
            "/recipes/{id}/favorite",
            post(controllers::favorites::store).delete(controllers::favorites::destroy),
        )
        .route(
            "/recipes/{id}/shopping_cart",
            post(controllers::shopping_cart::store).delete(controllers::shopping_cart::destroy),
        )
        .route(
            "/recipes/download_shopping_cart",
            get(controllers::shopping_cart::download),
        )
        .layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

pub fn init_router(app_state: AppState) -> Router {
    let media_root = app_state.config.media.root.clone();
    let media_url = app_state.config.media.url.clone();
    let state = Arc::new(app_state);

    let api = public_routes(state.clone()).merge(private_routes(state.clone()));

    let x_request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);
    let request_id_middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(
            x_request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|val| val.to_str().ok())
                    .unwrap_or_default();
                let user_agent = request
                    .headers()
                    .get(header::USER_AGENT)
                    .and_then(|val| val.to_str().ok())
                    .unwrap_or_default();

                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str);

                tracing::info_span!(
                    "http_request",
                    request_id,
                    method = ?request.method(),
                    uri = ?request.uri(),
                    path = matched_path,
                    version = ?request.version(),
                    user_agent,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::new(x_request_id_header));

    Router::new()
        .route("/", get(controllers::home::index))
        .nest("/api", api)
        .nest_service(&media_url, ServeDir::new(media_root))
        .layer(CompressionLayer::new())
        .layer(request_id_middleware)
        .with_state(state)
}
