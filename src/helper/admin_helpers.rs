use chrono::Utc;

use crate::error::{classify_sqlite_error, ApiError};
use crate::helper::content_helpers;
use crate::models::db_operations::posts_db_operations::{self, PostRecord};
use crate::models::{Post, PostInput};
use crate::DbPool;

fn validate_input(input: &PostInput) -> Result<(), ApiError> {
    if input.title.trim().is_empty() {
        return Err(ApiError::Validation("Title is required".to_string()));
    }
    if input.content.trim().is_empty() {
        return Err(ApiError::Validation("Content is required".to_string()));
    }
    if input.category.trim().is_empty() {
        return Err(ApiError::Validation("Category is required".to_string()));
    }
    Ok(())
}

/// Normalizes an input into the stored field set: slug derived from the
/// title, content HTML-escaped outside code fences, excerpt derived from
/// content when the editor left it empty.
struct PreparedPost {
    slug: String,
    content: String,
    excerpt: String,
}

fn prepare(input: &PostInput) -> Result<PreparedPost, ApiError> {
    let slug = content_helpers::slugify(&input.title);
    if slug.is_empty() {
        return Err(ApiError::Validation(
            "Title must contain at least one alphanumeric character".to_string(),
        ));
    }

    let content = content_helpers::sanitize_markdown_content(&input.content);
    let excerpt = match input.excerpt.as_deref().map(str::trim) {
        Some(e) if !e.is_empty() => e.to_string(),
        _ => content_helpers::derive_excerpt(&content),
    };

    Ok(PreparedPost { slug, content, excerpt })
}

pub fn create_post(pool: &DbPool, input: &PostInput) -> Result<Post, ApiError> {
    validate_input(input)?;
    let prepared = prepare(input)?;

    let conn = pool.get()?;
    let now = Utc::now();
    let record = PostRecord {
        title: input.title.trim(),
        slug: &prepared.slug,
        content: &prepared.content,
        excerpt: Some(&prepared.excerpt),
        cover_image: input.cover_image.as_deref(),
        category: input.category.trim(),
        tags: input.tags.as_deref(),
        published: input.published,
    };

    let id = posts_db_operations::insert_post(&conn, &record, now)
        .map_err(classify_sqlite_error)?;

    posts_db_operations::fetch_post_by_id(&conn, id)?.ok_or(ApiError::NotFound)
}

/// Full-field replace. The slug follows the (possibly edited) title; changing
/// it is an explicit admin action, never an implicit side effect of a read.
pub fn update_post(pool: &DbPool, id: i64, input: &PostInput) -> Result<Post, ApiError> {
    validate_input(input)?;
    let prepared = prepare(input)?;

    let conn = pool.get()?;
    let now = Utc::now();
    let record = PostRecord {
        title: input.title.trim(),
        slug: &prepared.slug,
        content: &prepared.content,
        excerpt: Some(&prepared.excerpt),
        cover_image: input.cover_image.as_deref(),
        category: input.category.trim(),
        tags: input.tags.as_deref(),
        published: input.published,
    };

    let affected = posts_db_operations::update_post(&conn, id, &record, now)
        .map_err(classify_sqlite_error)?;
    if affected == 0 {
        return Err(ApiError::NotFound);
    }

    posts_db_operations::fetch_post_by_id(&conn, id)?.ok_or(ApiError::NotFound)
}

pub fn delete_post(pool: &DbPool, id: i64) -> Result<(), ApiError> {
    let conn = pool.get()?;
    if posts_db_operations::delete_post(&conn, id)? == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(())
}

pub fn fetch_all_posts(pool: &DbPool) -> Result<Vec<Post>, ApiError> {
    let conn = pool.get()?;
    Ok(posts_db_operations::list_all(&conn)?)
}
