use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    db::tags::{get_tag_by_id, get_tags},
    error::Error,
    model::Tag,
    state::SharedAppState,
};

use super::UrlPath;

#[tracing::instrument(name = "[GET] tags", skip_all)]
pub async fn index(State(app_state): State<SharedAppState>) -> Result<Json<Vec<Tag>>, Error> {
    let tags = get_tags(&app_state.pool).await?;

    Ok(Json(tags))
}

#[tracing::instrument(name = "[GET] tags/{id}", skip_all, fields(path.id))]
pub async fn show(
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<Json<Tag>, Error> {
    let tag = get_tag_by_id(&app_state.pool, path.id).await?;

    Ok(Json(tag))
}
