use crate::error::ApiError;
use crate::models::db_operations::posts_db_operations;
use crate::models::Post;
use crate::DbPool;

pub fn fetch_published_posts(
    pool: &DbPool,
    category: Option<&str>,
    tag: Option<&str>,
) -> Result<Vec<Post>, ApiError> {
    let conn = pool.get()?;
    Ok(posts_db_operations::list_published(&conn, category, tag)?)
}

/// Fetch-by-slug with the view-counter side effect: the counter is bumped
/// first so the returned post already reflects this read. Unpublished posts
/// are reachable here on purpose; drafts can be previewed by exact slug
/// while staying absent from every listing.
pub fn fetch_post_by_slug(pool: &DbPool, slug: &str) -> Result<Post, ApiError> {
    let conn = pool.get()?;

    if posts_db_operations::increment_views(&conn, slug)? == 0 {
        return Err(ApiError::NotFound);
    }

    posts_db_operations::fetch_post_by_slug(&conn, slug)?.ok_or(ApiError::NotFound)
}

pub fn fetch_categories(pool: &DbPool) -> Result<Vec<String>, ApiError> {
    let conn = pool.get()?;
    Ok(posts_db_operations::list_categories(&conn)?)
}

/// Store connectivity probe for the health endpoint.
pub fn check_database(pool: &DbPool) -> Result<(), ApiError> {
    let conn = pool.get()?;
    conn.query_row("SELECT 1", [], |_| Ok(()))?;
    Ok(())
}
