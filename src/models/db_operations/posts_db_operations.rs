use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as RusqliteResult, Row};

use crate::models::Post;

/// Field set written on insert and full-replace update. Timestamps are
/// assigned by the caller so a create and its follow-up reads agree.
pub struct PostRecord<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub content: &'a str,
    pub excerpt: Option<&'a str>,
    pub cover_image: Option<&'a str>,
    pub category: &'a str,
    pub tags: Option<&'a str>,
    pub published: bool,
}

fn row_to_post(row: &Row) -> RusqliteResult<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        content: row.get(3)?,
        excerpt: row.get(4)?,
        cover_image: row.get(5)?,
        category: row.get(6)?,
        tags: row.get(7)?,
        published: row.get(8)?,
        views: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

const POST_COLUMNS: &str =
    "id, title, slug, content, excerpt, cover_image, category, tags, published, views, created_at, updated_at";

pub fn insert_post(
    conn: &Connection,
    record: &PostRecord,
    now: DateTime<Utc>,
) -> RusqliteResult<i64> {
    conn.execute(
        "INSERT INTO posts (title, slug, content, excerpt, cover_image, category, tags, published, views, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?10)",
        params![
            record.title,
            record.slug,
            record.content,
            record.excerpt,
            record.cover_image,
            record.category,
            record.tags,
            record.published,
            now,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn fetch_post_by_id(conn: &Connection, id: i64) -> RusqliteResult<Option<Post>> {
    conn.query_row(
        &format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS),
        [id],
        |row| row_to_post(row),
    )
    .optional()
}

pub fn fetch_post_by_slug(conn: &Connection, slug: &str) -> RusqliteResult<Option<Post>> {
    conn.query_row(
        &format!("SELECT {} FROM posts WHERE slug = ?1", POST_COLUMNS),
        [slug],
        |row| row_to_post(row),
    )
    .optional()
}

/// Bumps the view counter for a slug. Returns the number of affected rows,
/// zero when no post carries the slug.
pub fn increment_views(conn: &Connection, slug: &str) -> RusqliteResult<usize> {
    conn.execute("UPDATE posts SET views = views + 1 WHERE slug = ?1", [slug])
}

/// Published posts, newest first, optionally narrowed to a category and/or
/// a tag substring of the comma-joined tags column.
pub fn list_published(
    conn: &Connection,
    category: Option<&str>,
    tag: Option<&str>,
) -> RusqliteResult<Vec<Post>> {
    let mut sql = format!("SELECT {} FROM posts WHERE published = 1", POST_COLUMNS);
    let mut args: Vec<String> = Vec::new();

    if let Some(category) = category {
        args.push(category.to_string());
        sql.push_str(&format!(" AND category = ?{}", args.len()));
    }
    if let Some(tag) = tag {
        args.push(format!("%{}%", tag));
        sql.push_str(&format!(" AND tags LIKE ?{}", args.len()));
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), |row| row_to_post(row))?;
    rows.collect()
}

pub fn list_all(conn: &Connection) -> RusqliteResult<Vec<Post>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM posts ORDER BY created_at DESC",
        POST_COLUMNS
    ))?;
    let rows = stmt.query_map([], |row| row_to_post(row))?;
    rows.collect()
}

pub fn list_categories(conn: &Connection) -> RusqliteResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT category FROM posts WHERE published = 1 ORDER BY category",
    )?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect()
}

/// Full-field replace. Returns the number of affected rows, zero when the id
/// does not exist.
pub fn update_post(
    conn: &Connection,
    id: i64,
    record: &PostRecord,
    now: DateTime<Utc>,
) -> RusqliteResult<usize> {
    conn.execute(
        "UPDATE posts SET title = ?1, slug = ?2, content = ?3, excerpt = ?4, cover_image = ?5,
         category = ?6, tags = ?7, published = ?8, updated_at = ?9 WHERE id = ?10",
        params![
            record.title,
            record.slug,
            record.content,
            record.excerpt,
            record.cover_image,
            record.category,
            record.tags,
            record.published,
            now,
            id,
        ],
    )
}

pub fn delete_post(conn: &Connection, id: i64) -> RusqliteResult<usize> {
    conn.execute("DELETE FROM posts WHERE id = ?1", [id])
}
