use std::{borrow::Cow, collections::HashSet, sync::Arc};

use axum::{
    Extension, Json,
    extract::{OriginalUri, Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_option_number_from_string;
use validator::{Validate, ValidateLength, ValidationError, ValidationErrors};

use crate::{
    auth::error::AuthError,
    db::{
        ingredients::get_existing_ingredient_ids,
        recipes::{
            RecipeFilter, RecipeRecord, create_recipe, delete_recipe, get_recipe_by_id,
            get_recipe_ownership, get_recipes_with_pagination, update_recipe,
        },
        tags::get_existing_tag_ids,
    },
    error::Error,
    media::{decode_base64_image, remove_media_file, store_recipe_image},
    middlewares::Viewer,
    model::{Recipe, User},
    pagination::{Page, Pagination},
    state::SharedAppState,
};

use super::{JsonBody, UrlPath, request_host};

pub const RECIPE_NAME_MAX_LENGTH: u64 = 200;

#[derive(serde::Deserialize, serde::Serialize, Debug, Default)]
pub struct RecipeFilterQuery {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub author: Option<i64>,

    /// Comma separated tag slugs.
    pub tags: Option<String>,

    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub is_favorited: Option<i64>,

    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub is_in_shopping_cart: Option<i64>,
}

impl From<RecipeFilterQuery> for RecipeFilter {
    fn from(query: RecipeFilterQuery) -> Self {
        RecipeFilter {
            author: query.author,
            tags: query
                .tags
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|slug| !slug.is_empty())
                .map(str::to_string)
                .collect(),
            is_favorited: query.is_favorited.map(|flag| flag != 0),
            is_in_shopping_cart: query.is_in_shopping_cart.map(|flag| flag != 0),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct IngredientWrite {
    pub id: i64,
    pub amount: i32,
}

#[derive(Deserialize, Debug)]
pub struct RecipeWriteRequest {
    pub ingredients: Vec<IngredientWrite>,
    pub tags: Vec<i64>,
    pub image: String,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

fn field_error(
    errors: &mut ValidationErrors,
    field: &'static str,
    code: &'static str,
    message: impl Into<Cow<'static, str>>,
) {
    errors.add(field, ValidationError::new(code).with_message(message.into()));
}

impl Validate for RecipeWriteRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.image.trim().is_empty() {
            field_error(&mut errors, "image", "required", "This field may not be blank.");
        }

        if !self
            .name
            .validate_length(Some(1), Some(RECIPE_NAME_MAX_LENGTH), None)
        {
            field_error(
                &mut errors,
                "name",
                "length",
                format!("Name length must be between 1 and {}.", RECIPE_NAME_MAX_LENGTH),
            );
        }

        if self.text.trim().is_empty() {
            field_error(&mut errors, "text", "required", "This field may not be blank.");
        }

        if self.cooking_time < 1 {
            field_error(
                &mut errors,
                "cooking_time",
                "min_value",
                "Cooking time must be at least 1 minute.",
            );
        }

        if self.tags.is_empty() {
            field_error(&mut errors, "tags", "required", "Select at least one tag!");
        } else if self.tags.iter().collect::<HashSet<_>>().len() != self.tags.len() {
            field_error(&mut errors, "tags", "unique", "Tags are not unique!");
        }

        if self.ingredients.is_empty() {
            field_error(
                &mut errors,
                "ingredients",
                "required",
                "Select at least one ingredient!",
            );
        } else {
            let unique: HashSet<i64> = self.ingredients.iter().map(|i| i.id).collect();
            if unique.len() != self.ingredients.len() {
                field_error(
                    &mut errors,
                    "ingredients",
                    "unique",
                    "Ingredients are not unique!",
                );
            }

            if self.ingredients.iter().any(|i| i.amount < 1) {
                field_error(
                    &mut errors,
                    "ingredients",
                    "min_value",
                    "Ingredient amount must be at least 1.",
                );
            }
        }

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

/// Checks that every referenced tag and ingredient exists.
#[tracing::instrument(name = "validate recipe references", skip_all)]
async fn validate_references(
    app_state: &SharedAppState,
    request: &RecipeWriteRequest,
) -> Result<(), Error> {
    let mut errors = ValidationErrors::new();

    let existing_tags: HashSet<i64> = get_existing_tag_ids(&app_state.pool, &request.tags)
        .await?
        .into_iter()
        .collect();
    if let Some(missing) = request.tags.iter().find(|id| !existing_tags.contains(id)) {
        field_error(
            &mut errors,
            "tags",
            "does_not_exist",
            format!("Tag with id {} does not exist!", missing),
        );
    }

    let ingredient_ids: Vec<i64> = request.ingredients.iter().map(|i| i.id).collect();
    let existing_ingredients: HashSet<i64> =
        get_existing_ingredient_ids(&app_state.pool, &ingredient_ids)
            .await?
            .into_iter()
            .collect();
    if let Some(missing) = ingredient_ids
        .iter()
        .find(|id| !existing_ingredients.contains(id))
    {
        field_error(
            &mut errors,
            "ingredients",
            "does_not_exist",
            format!("Ingredient with id {} does not exist!", missing),
        );
    }

    if !errors.errors().is_empty() {
        return Err(Error::Validation(errors));
    }

    Ok(())
}

/// Validates the request, stores its image and returns the record to write.
async fn prepare_record(
    app_state: &SharedAppState,
    request: RecipeWriteRequest,
) -> Result<RecipeRecord, Error> {
    request.validate().map_err(Error::Validation)?;
    validate_references(app_state, &request).await?;

    let image = decode_base64_image(&request.image)?;
    let image_path = store_recipe_image(&app_state.config.media.root, &image).await?;

    Ok(RecipeRecord {
        name: request.name,
        text: request.text,
        cooking_time: request.cooking_time,
        image: image_path,
        tag_ids: request.tags,
        ingredients: request
            .ingredients
            .into_iter()
            .map(|i| (i.id, i.amount))
            .collect(),
    })
}

/// Loads the recipe owner and rejects anyone else.
async fn ensure_author(
    app_state: &SharedAppState,
    user: &User,
    recipe_id: i64,
) -> Result<String, Error> {
    let ownership = get_recipe_ownership(&app_state.pool, recipe_id).await?;

    if ownership.author_id != user.id {
        return Err(Error::Auth(AuthError::Forbidden));
    }

    Ok(ownership.image)
}

#[tracing::instrument(name = "[GET] recipes", skip_all, fields(viewer_id = viewer.id()))]
pub async fn index(
    Extension(viewer): Extension<Viewer>,
    State(app_state): State<SharedAppState>,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<RecipeFilterQuery>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Json<Page<Recipe>>, Error> {
    let page_request = pagination.resolve(app_state.config.application.page_size)?;
    let filter = RecipeFilter::from(filter);

    let (recipes, count) = get_recipes_with_pagination(
        &app_state.pool,
        &filter,
        viewer.id(),
        page_request.limit,
        page_request.skip(),
    )
    .await?;

    let media = &app_state.config.media;
    let page = Page::new(recipes, count, page_request, &uri, request_host(&headers))?
        .map(|recipe| recipe.with_media_url(media));

    Ok(Json(page))
}

#[tracing::instrument(name = "[GET] recipes/{id}", skip_all, fields(path.id))]
pub async fn show(
    Extension(viewer): Extension<Viewer>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<Json<Recipe>, Error> {
    let recipe = get_recipe_by_id(&app_state.pool, path.id, viewer.id())
        .await?
        .with_media_url(&app_state.config.media);

    Ok(Json(recipe))
}

#[tracing::instrument(name = "[POST] recipes", skip_all, fields(user_id = user.id))]
pub async fn store(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    JsonBody(request): JsonBody<RecipeWriteRequest>,
) -> Result<(StatusCode, Json<Recipe>), Error> {
    let record = prepare_record(&app_state, request).await?;

    let recipe_id = match create_recipe(&app_state.pool, user.id, &record).await {
        Ok(recipe_id) => recipe_id,
        Err(error) => {
            remove_media_file(&app_state.config.media.root, &record.image).await;
            return Err(error);
        }
    };

    let recipe = get_recipe_by_id(&app_state.pool, recipe_id, Some(user.id))
        .await?
        .with_media_url(&app_state.config.media);

    Ok((StatusCode::CREATED, Json(recipe)))
}

#[tracing::instrument(name = "[PATCH] recipes/{id}", skip_all, fields(path.id, user_id = user.id))]
pub async fn update(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
    JsonBody(request): JsonBody<RecipeWriteRequest>,
) -> Result<Json<Recipe>, Error> {
    let previous_image = ensure_author(&app_state, &user, path.id).await?;

    let record = prepare_record(&app_state, request).await?;

    if let Err(error) = update_recipe(&app_state.pool, path.id, &record).await {
        remove_media_file(&app_state.config.media.root, &record.image).await;
        return Err(error);
    }
    remove_media_file(&app_state.config.media.root, &previous_image).await;

    let recipe = get_recipe_by_id(&app_state.pool, path.id, Some(user.id))
        .await?
        .with_media_url(&app_state.config.media);

    Ok(Json(recipe))
}

#[tracing::instrument(name = "[DELETE] recipes/{id}", skip_all, fields(path.id, user_id = user.id))]
pub async fn destroy(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<StatusCode, Error> {
    let image = ensure_author(&app_state, &user, path.id).await?;

    delete_recipe(&app_state.pool, path.id).await?;
    remove_media_file(&app_state.config.media.root, &image).await;

    Ok(StatusCode::NO_CONTENT)
}
