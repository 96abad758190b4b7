use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{OriginalUri, Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use validator::Validate;

use crate::{
    db::{
        subscriptions::{
            add_subscription, get_subscription, get_subscriptions_with_pagination,
            remove_subscription,
        },
        user::get_user_profile,
    },
    error::Error,
    model::{Subscription, User},
    pagination::{Page, Pagination},
    state::SharedAppState,
};

use super::{UrlPath, request_host};

pub const SELF_SUBSCRIBE_MESSAGE: &str = "You cannot subscribe to yourself!";
pub const SUBSCRIPTION_EXISTS_MESSAGE: &str = "You are already subscribed to this author!";
pub const NO_SUBSCRIPTION_MESSAGE: &str = "Cannot remove a subscription that does not exist!";

#[derive(serde::Deserialize, serde::Serialize, Debug, Default, Validate)]
pub struct RecipesLimit {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    #[validate(range(min = 0))]
    pub recipes_limit: Option<i64>,
}

#[tracing::instrument(name = "[GET] users/subscriptions", skip_all, fields(user_id = user.id))]
pub async fn index(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Query(pagination): Query<Pagination>,
    Query(recipes_limit): Query<RecipesLimit>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Json<Page<Subscription>>, Error> {
    recipes_limit.validate().map_err(Error::Validation)?;
    let page_request = pagination.resolve(app_state.config.application.page_size)?;

    let (subscriptions, count) = get_subscriptions_with_pagination(
        &app_state.pool,
        user.id,
        recipes_limit.recipes_limit,
        page_request.limit,
        page_request.skip(),
    )
    .await?;

    let media = &app_state.config.media;
    let page = Page::new(
        subscriptions,
        count,
        page_request,
        &uri,
        request_host(&headers),
    )?
    .map(|subscription| subscription.with_media_url(media));

    Ok(Json(page))
}

#[tracing::instrument(name = "[POST] users/{id}/subscribe", skip_all, fields(path.id, user_id = user.id))]
pub async fn store(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
    Query(recipes_limit): Query<RecipesLimit>,
) -> Result<(StatusCode, Json<Subscription>), Error> {
    recipes_limit.validate().map_err(Error::Validation)?;

    // 404 for unknown authors comes before the self check
    let author = get_user_profile(&app_state.pool, path.id, Some(user.id)).await?;

    if author.id == user.id {
        return Err(Error::BadRequest(SELF_SUBSCRIBE_MESSAGE.to_string()));
    }

    if !add_subscription(&app_state.pool, user.id, author.id).await? {
        return Err(Error::BadRequest(SUBSCRIPTION_EXISTS_MESSAGE.to_string()));
    }

    let subscription = get_subscription(
        &app_state.pool,
        user.id,
        author.id,
        recipes_limit.recipes_limit,
    )
    .await?
    .with_media_url(&app_state.config.media);

    Ok((StatusCode::CREATED, Json(subscription)))
}

#[tracing::instrument(name = "[DELETE] users/{id}/subscribe", skip_all, fields(path.id, user_id = user.id))]
pub async fn destroy(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<StatusCode, Error> {
    let author = get_user_profile(&app_state.pool, path.id, Some(user.id)).await?;

    if author.id == user.id {
        return Err(Error::BadRequest(SELF_SUBSCRIBE_MESSAGE.to_string()));
    }

    if !remove_subscription(&app_state.pool, user.id, author.id).await? {
        return Err(Error::BadRequest(NO_SUBSCRIPTION_MESSAGE.to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
