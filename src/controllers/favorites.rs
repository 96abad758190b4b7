use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    db::{
        error::DatabaseError,
        favorites::{add_favorite, remove_favorite},
        recipes::{get_short_recipe, recipe_exists},
    },
    error::Error,
    model::{ShortRecipe, User},
    state::SharedAppState,
};

use super::UrlPath;

pub const NO_RECIPE_MESSAGE: &str = "No such recipe.";
pub const RECIPE_IN_FAVORITES_MESSAGE: &str = "Recipe is already in favorites!";
pub const NO_RECIPE_IN_FAVORITES_MESSAGE: &str = "Recipe is not in favorites!";

/// An unknown recipe is a 400 here, not a 404.
#[tracing::instrument(name = "[POST] recipes/{id}/favorite", skip_all, fields(path.id, user_id = user.id))]
pub async fn store(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<(StatusCode, Json<ShortRecipe>), Error> {
    let recipe = get_short_recipe(&app_state.pool, path.id)
        .await?
        .ok_or_else(|| Error::BadRequest(NO_RECIPE_MESSAGE.to_string()))?;

    match add_favorite(&app_state.pool, user.id, recipe.id).await {
        Ok(true) => {}
        Ok(false) => return Err(Error::BadRequest(RECIPE_IN_FAVORITES_MESSAGE.to_string())),
        Err(Error::Database(DatabaseError::ForeignKeyViolation(_))) => {
            return Err(Error::BadRequest(NO_RECIPE_MESSAGE.to_string()));
        }
        Err(error) => return Err(error),
    }

    Ok((
        StatusCode::CREATED,
        Json(recipe.with_media_url(&app_state.config.media)),
    ))
}

#[tracing::instrument(name = "[DELETE] recipes/{id}/favorite", skip_all, fields(path.id, user_id = user.id))]
pub async fn destroy(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<StatusCode, Error> {
    if !recipe_exists(&app_state.pool, path.id).await? {
        return Err(Error::Database(DatabaseError::NotFound));
    }

    if !remove_favorite(&app_state.pool, user.id, path.id).await? {
        return Err(Error::BadRequest(NO_RECIPE_IN_FAVORITES_MESSAGE.to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
