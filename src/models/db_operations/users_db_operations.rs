use bcrypt::{hash, verify, BcryptError};
use rusqlite::{params, Connection, Error as RusqliteError, OptionalExtension};

use crate::models::User;

fn bcrypt_to_rusqlite_error(e: BcryptError) -> RusqliteError {
    RusqliteError::ToSqlConversionFailure(Box::new(e))
}

pub fn create_user(
    conn: &Connection,
    username: &str,
    password: &str,
    role: &str,
) -> Result<(), RusqliteError> {
    let hashed_password = hash(password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    conn.execute(
        "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)",
        params![username, hashed_password, role],
    )?;
    Ok(())
}

pub fn read_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<User>, RusqliteError> {
    conn.query_row(
        "SELECT id, username, password_hash, role FROM users WHERE username = ?1",
        [username],
        |row| {
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
                password_hash: row.get(2)?,
                role: row.get(3)?,
            })
        },
    )
    .optional()
}

/// Checks a submitted password against the stored salted hash. Returns the
/// matching user on success, None for unknown usernames and bad passwords
/// alike so callers cannot distinguish the two.
pub fn verify_credentials(conn: &Connection, username: &str, password: &str) -> Option<User> {
    let user = read_user_by_username(conn, username).ok().flatten()?;
    if verify(password, &user.password_hash).unwrap_or(false) {
        Some(user)
    } else {
        None
    }
}

/// Creates the default admin account when no row with that username exists.
/// Returns true when a row was inserted.
pub fn seed_admin_if_absent(
    conn: &Connection,
    username: &str,
    password: &str,
) -> Result<bool, RusqliteError> {
    if read_user_by_username(conn, username)?.is_some() {
        return Ok(false);
    }
    create_user(conn, username, password, "admin")?;
    Ok(true)
}

pub fn update_password(
    conn: &Connection,
    username: &str,
    new_password: &str,
) -> Result<usize, RusqliteError> {
    let hashed_password =
        hash(new_password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    conn.execute(
        "UPDATE users SET password_hash = ?1 WHERE username = ?2",
        params![hashed_password, username],
    )
}

pub fn list_usernames(conn: &Connection) -> Result<Vec<String>, RusqliteError> {
    let mut stmt = conn.prepare("SELECT username FROM users ORDER BY username")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect()
}
