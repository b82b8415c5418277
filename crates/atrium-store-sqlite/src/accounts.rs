//! Account persistence: user creation with argon2 password hashing, and
//! session establishment.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use atrium_core::{
  content::{NewUser, Session, User},
  error::{SaveError, ValidationError},
  gateway::AccountService,
};
use chrono::Utc;
use rand_core::OsRng;
use rusqlite::OptionalExtension as _;

use crate::store::{SqliteStore, encode_dt, new_uid};

impl AccountService for SqliteStore {
  async fn save_user(&self, user: &NewUser) -> Result<User, SaveError> {
    validate_user(user)?;

    // Hash outside the database thread; argon2 is the slow part.
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(user.password.as_bytes(), &salt)
      .map_err(|e| SaveError::Storage(format!("argon2 error: {e}")))?
      .to_string();

    let user = user.clone();
    self
      .conn
      .call(move |conn| Ok(insert_user(conn, &user, &hash)))
      .await
      .map_err(|e| SaveError::Storage(e.to_string()))?
  }

  async fn login(
    &self,
    username: &str,
    password: &str,
  ) -> Result<Session, SaveError> {
    let username = username.to_string();
    let password = password.to_string();
    self
      .conn
      .call(move |conn| Ok(establish_session(conn, &username, &password)))
      .await
      .map_err(|e| SaveError::Storage(e.to_string()))?
  }
}

fn validate_user(user: &NewUser) -> Result<(), ValidationError> {
  let mut err = ValidationError::new("user");

  if user.username.trim().is_empty() {
    err.push("username", "cannot be blank");
  } else if user.username.chars().count() > 100 {
    err.push("username", "must be at most 100 characters");
  }

  if user.email.trim().is_empty() {
    err.push("email", "cannot be blank");
  } else if !user.email.contains('@') {
    err.push("email", "is not a valid email address");
  }

  if user.password.chars().count() < 6 {
    err.push("password", "must be at least 6 characters");
  }

  if err.is_empty() { Ok(()) } else { Err(err) }
}

/// A user is an element; the element row owns the id and the user row shares
/// it, so deleting the element cascades into the user.
fn insert_user(
  conn: &mut rusqlite::Connection,
  user: &NewUser,
  password_hash: &str,
) -> Result<User, SaveError> {
  let tx = conn.transaction().map_err(storage)?;
  let now = encode_dt(Utc::now());

  tx.execute(
    "INSERT INTO \"elements\"
       (\"kind\", \"enabled\", \"archived\", \"date_created\",
        \"date_updated\", \"uid\")
     VALUES ('user', 1, 0, ?1, ?2, ?3)",
    rusqlite::params![now, now, new_uid()],
  )
  .map_err(storage)?;
  let id = tx.last_insert_rowid();

  tx.execute(
    "INSERT INTO \"users\"
       (\"id\", \"username\", \"password\", \"email\", \"admin\",
        \"date_created\", \"date_updated\", \"uid\")
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      id,
      user.username,
      password_hash,
      user.email,
      user.admin,
      now,
      now,
      new_uid(),
    ],
  )
  .map_err(|e| {
    conflict("user", &[("users.username", "username"), ("users.email", "email")], e)
  })?;

  tx.commit().map_err(storage)?;

  Ok(User {
    id,
    username: user.username.clone(),
    email: user.email.clone(),
    admin: user.admin,
  })
}

fn establish_session(
  conn: &rusqlite::Connection,
  username: &str,
  password: &str,
) -> Result<Session, SaveError> {
  let row: Option<(i64, String)> = conn
    .query_row(
      "SELECT \"id\", \"password\" FROM \"users\" WHERE \"username\" = ?1",
      rusqlite::params![username],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
    .map_err(storage)?;

  let Some((user_id, hash)) = row else {
    return Err(SaveError::Storage("invalid credentials".to_string()));
  };

  let parsed = PasswordHash::new(&hash)
    .map_err(|_| SaveError::Storage("stored password hash is invalid".to_string()))?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .map_err(|_| SaveError::Storage("invalid credentials".to_string()))?;

  let token = new_uid();
  let now = encode_dt(Utc::now());
  conn
    .execute(
      "INSERT INTO \"sessions\"
         (\"user_id\", \"token\", \"date_created\", \"date_updated\", \"uid\")
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![user_id, token, now, now, new_uid()],
    )
    .map_err(storage)?;
  let id = conn.last_insert_rowid();

  conn
    .execute(
      "UPDATE \"users\" SET \"last_login_date\" = ?1 WHERE \"id\" = ?2",
      rusqlite::params![now, user_id],
    )
    .map_err(storage)?;

  Ok(Session { id, user_id, token })
}

fn storage(e: rusqlite::Error) -> SaveError {
  SaveError::Storage(e.to_string())
}

/// Map a unique-constraint violation back to a per-field validation error;
/// anything else stays a storage failure.
pub(crate) fn conflict(
  record: &'static str,
  unique: &[(&str, &str)],
  e: rusqlite::Error,
) -> SaveError {
  let message = e.to_string();
  for (needle, field) in unique {
    if message.contains(needle) {
      return ValidationError::single(record, *field, "is already in use")
        .into();
    }
  }
  if message.contains("FOREIGN KEY") {
    return ValidationError::single(record, "reference", "refers to a missing row")
      .into();
  }
  SaveError::Storage(message)
}
