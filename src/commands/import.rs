use std::path::Path;

use anyhow::Context;
use sqlx::PgPool;

use crate::{
    config::Config,
    db::{ingredients::insert_ingredients, tags::insert_tags},
    error::Error,
    model::{NewIngredient, NewTag},
    state::AppState,
};

const INGREDIENT_FIELDS: [&str; 2] = ["name", "measurement_unit"];
const TAG_FIELDS: [&str; 3] = ["name", "color", "slug"];
const NAME_MAX_LENGTH: usize = 200;

#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    #[error("Unsupported file type {0}, expected .json or .csv")]
    UnsupportedFormat(String),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Csv,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self, ImportError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            _ => Err(ImportError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Reads CSV records as columns ordered like `fields`. A header row naming
/// the fields is optional; without one, columns are taken positionally.
fn read_csv_rows<const N: usize>(
    content: &str,
    fields: [&str; N],
) -> Result<Vec<[String; N]>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut records = reader.records().peekable();
    let mut columns: [usize; N] = std::array::from_fn(|i| i);

    let has_header = match records.peek() {
        Some(Ok(first)) => {
            let header: Vec<&str> = first.iter().collect();
            let matched = fields.iter().all(|field| header.contains(field));
            if matched {
                for (i, field) in fields.iter().enumerate() {
                    columns[i] = header.iter().position(|h| h == field).unwrap_or(i);
                }
            }
            matched
        }
        _ => false,
    };
    if has_header {
        records.next();
    }

    let mut rows = Vec::new();
    for (index, record) in records.enumerate() {
        let record = record?;
        let mut row: [String; N] = std::array::from_fn(|_| String::new());
        for (i, column) in columns.iter().enumerate() {
            row[i] = record
                .get(*column)
                .ok_or_else(|| ImportError::InvalidRow {
                    row: index + 1,
                    reason: format!("missing column {}", fields[i]),
                })?
                .to_string();
        }
        rows.push(row);
    }

    Ok(rows)
}

fn check_length(row: usize, field: &str, value: &str) -> Result<(), ImportError> {
    let length = value.chars().count();
    if length == 0 || length > NAME_MAX_LENGTH {
        return Err(ImportError::InvalidRow {
            row,
            reason: format!("{} length must be between 1 and {}", field, NAME_MAX_LENGTH),
        });
    }
    Ok(())
}

pub fn is_valid_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn parse_ingredients(
    format: FileFormat,
    content: &str,
) -> Result<Vec<NewIngredient>, ImportError> {
    let ingredients: Vec<NewIngredient> = match format {
        FileFormat::Json => serde_json::from_str(content)?,
        FileFormat::Csv => read_csv_rows(content, INGREDIENT_FIELDS)?
            .into_iter()
            .map(|[name, measurement_unit]| NewIngredient {
                name,
                measurement_unit,
            })
            .collect(),
    };

    for (index, ingredient) in ingredients.iter().enumerate() {
        check_length(index + 1, "name", &ingredient.name)?;
        check_length(index + 1, "measurement_unit", &ingredient.measurement_unit)?;
    }

    Ok(ingredients)
}

pub fn parse_tags(format: FileFormat, content: &str) -> Result<Vec<NewTag>, ImportError> {
    let tags: Vec<NewTag> = match format {
        FileFormat::Json => serde_json::from_str(content)?,
        FileFormat::Csv => read_csv_rows(content, TAG_FIELDS)?
            .into_iter()
            .map(|[name, color, slug]| NewTag { name, color, slug })
            .collect(),
    };

    for (index, tag) in tags.iter().enumerate() {
        let row = index + 1;
        check_length(row, "name", &tag.name)?;
        check_length(row, "slug", &tag.slug)?;

        if !is_valid_color(&tag.color) {
            return Err(ImportError::InvalidRow {
                row,
                reason: format!("color {} is not a #RRGGBB value", tag.color),
            });
        }
        if !is_valid_slug(&tag.slug) {
            return Err(ImportError::InvalidRow {
                row,
                reason: format!("slug {} contains invalid characters", tag.slug),
            });
        }
    }

    Ok(tags)
}

#[tracing::instrument(name = "store ingredients", skip_all, fields(count = ingredients.len()))]
pub async fn store_ingredients(pool: &PgPool, ingredients: &[NewIngredient]) -> Result<u64, Error> {
    let mut tx = pool.begin().await?;
    let inserted = insert_ingredients(&mut tx, ingredients).await?;
    tx.commit().await?;

    Ok(inserted)
}

#[tracing::instrument(name = "store tags", skip_all, fields(count = tags.len()))]
pub async fn store_tags(pool: &PgPool, tags: &[NewTag]) -> Result<u64, Error> {
    let mut tx = pool.begin().await?;
    let inserted = insert_tags(&mut tx, tags).await?;
    tx.commit().await?;

    Ok(inserted)
}

async fn read_file(path: &Path) -> Result<(FileFormat, String), anyhow::Error> {
    let format = FileFormat::from_path(path)?;
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed reading {}", path.display()))?;

    Ok((format, content))
}

#[tracing::instrument(name = "import ingredients", skip(config))]
pub async fn import_ingredients(config: Config, path: &Path) -> Result<u64, anyhow::Error> {
    let (format, content) = read_file(path).await?;
    let ingredients = parse_ingredients(format, &content)?;

    let state = AppState::init(config).await?;
    let inserted = store_ingredients(&state.pool, &ingredients).await?;

    tracing::info!(parsed = ingredients.len(), inserted, "Ingredients imported");

    Ok(inserted)
}

#[tracing::instrument(name = "import tags", skip(config))]
pub async fn import_tags(config: Config, path: &Path) -> Result<u64, anyhow::Error> {
    let (format, content) = read_file(path).await?;
    let tags = parse_tags(format, &content)?;

    let state = AppState::init(config).await?;
    let inserted = store_tags(&state.pool, &tags).await?;

    tracing::info!(parsed = tags.len(), inserted, "Tags imported");

    Ok(inserted)
}
