use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    db::ingredients::{get_ingredient_by_id, get_ingredients},
    error::Error,
    model::Ingredient,
    state::SharedAppState,
};

use super::UrlPath;

#[derive(serde::Deserialize, serde::Serialize, Debug, Default)]
pub struct IngredientSearch {
    /// Case-insensitive name prefix.
    pub name: Option<String>,
}

#[tracing::instrument(name = "[GET] ingredients", skip_all, fields(search.name))]
pub async fn index(
    State(app_state): State<SharedAppState>,
    Query(search): Query<IngredientSearch>,
) -> Result<Json<Vec<Ingredient>>, Error> {
    let ingredients = get_ingredients(&app_state.pool, search.name.as_deref()).await?;

    Ok(Json(ingredients))
}

#[tracing::instrument(name = "[GET] ingredients/{id}", skip_all, fields(path.id))]
pub async fn show(
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<Json<Ingredient>, Error> {
    let ingredient = get_ingredient_by_id(&app_state.pool, path.id).await?;

    Ok(Json(ingredient))
}
