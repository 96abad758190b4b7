use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::{
    db::{
        error::DatabaseError,
        recipes::get_short_recipe,
        shopping_list::{
            add_to_shopping_list, get_shopping_list_items, get_shopping_list_recipe_names,
            remove_from_shopping_list,
        },
    },
    error::Error,
    model::{ShortRecipe, User},
    shopping_list::{render_shopping_list, shopping_list_filename},
    state::SharedAppState,
};

use super::UrlPath;

pub const RECIPE_IN_SHOPPING_LIST_MESSAGE: &str = "Recipe is already in the shopping list!";
pub const SHOPPING_LIST_EMPTY_MESSAGE: &str = "Shopping list is empty!";

#[tracing::instrument(name = "[POST] recipes/{id}/shopping_cart", skip_all, fields(path.id, user_id = user.id))]
pub async fn store(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<(StatusCode, Json<ShortRecipe>), Error> {
    let recipe = get_short_recipe(&app_state.pool, path.id)
        .await?
        .ok_or(Error::Database(DatabaseError::NotFound))?;

    if !add_to_shopping_list(&app_state.pool, user.id, recipe.id).await? {
        return Err(Error::BadRequest(
            RECIPE_IN_SHOPPING_LIST_MESSAGE.to_string(),
        ));
    }

    Ok((
        StatusCode::CREATED,
        Json(recipe.with_media_url(&app_state.config.media)),
    ))
}

/// Both an unknown recipe and a recipe missing from the cart are a 404.
#[tracing::instrument(name = "[DELETE] recipes/{id}/shopping_cart", skip_all, fields(path.id, user_id = user.id))]
pub async fn destroy(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<StatusCode, Error> {
    if !remove_from_shopping_list(&app_state.pool, user.id, path.id).await? {
        return Err(Error::Database(DatabaseError::NotFound));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "[GET] recipes/download_shopping_cart", skip_all, fields(user_id = user.id))]
pub async fn download(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
) -> Result<impl IntoResponse, Error> {
    let recipe_names = get_shopping_list_recipe_names(&app_state.pool, user.id).await?;
    if recipe_names.is_empty() {
        return Err(Error::BadRequest(SHOPPING_LIST_EMPTY_MESSAGE.to_string()));
    }

    let items = get_shopping_list_items(&app_state.pool, user.id).await?;
    let document = render_shopping_list(&user, &items, &recipe_names);

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"{}\"",
                    shopping_list_filename(&user)
                ),
            ),
        ],
        document,
    ))
}
