use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Bool, Text};
use foodgram_core::{StoreResult, User};
use uuid::Uuid;

use super::crypto::{generate_token, hash_token};
use crate::models::{NewSession, NewUser, UserRow};
use crate::schema::{sessions, users};
use crate::store::PgStore;

/// Issue a new token for `user_id`. Only its hash is stored.
pub fn create_session(store: &PgStore, user_id: Uuid, ttl_days: i64) -> StoreResult<String> {
    let token = generate_token();
    let token_hash = hash_token(&token);
    let expires_at = Utc::now() + Duration::days(ttl_days);

    store.run("create_session", |conn| {
        diesel::insert_into(sessions::table)
            .values(&NewSession {
                user_id,
                token_hash: &token_hash,
                expires_at,
            })
            .execute(conn)
    })?;

    Ok(token)
}

pub fn get_user_from_token(store: &PgStore, token: &str) -> StoreResult<Option<User>> {
    let token_hash = hash_token(token);
    let row = store.run("get_user_from_token", |conn| {
        sessions::table
            .inner_join(users::table)
            .filter(sessions::token_hash.eq(&token_hash))
            .filter(sessions::expires_at.gt(Utc::now()))
            .select(UserRow::as_select())
            .first(conn)
            .optional()
    })?;
    Ok(row.map(User::from))
}

/// Returns false when the token had no session.
pub fn delete_session(store: &PgStore, token: &str) -> StoreResult<bool> {
    let token_hash = hash_token(token);
    let deleted = store.run("delete_session", |conn| {
        diesel::delete(sessions::table.filter(sessions::token_hash.eq(&token_hash))).execute(conn)
    })?;
    Ok(deleted > 0)
}

/// Case-insensitive lookup, including the password hash.
pub fn find_by_email(store: &PgStore, email: &str) -> StoreResult<Option<UserRow>> {
    store.run("find_by_email", |conn| {
        users::table
            .filter(
                diesel::dsl::sql::<Bool>("LOWER(email) = LOWER(")
                    .bind::<Text, _>(email)
                    .sql(")"),
            )
            .select(UserRow::as_select())
            .first(conn)
            .optional()
    })
}

pub fn username_taken(store: &PgStore, username: &str) -> StoreResult<bool> {
    store.run("username_taken", |conn| {
        diesel::select(diesel::dsl::exists(
            users::table.filter(users::username.eq(username)),
        ))
        .get_result(conn)
    })
}

pub fn create_user(store: &PgStore, new_user: &NewUser<'_>) -> StoreResult<User> {
    let row = store.run("create_user", |conn| {
        diesel::insert_into(users::table)
            .values(new_user)
            .returning(UserRow::as_returning())
            .get_result(conn)
    })?;
    Ok(row.into())
}

pub fn password_hash(store: &PgStore, user_id: Uuid) -> StoreResult<String> {
    store.run("password_hash", |conn| {
        users::table
            .find(user_id)
            .select(users::password_hash)
            .first(conn)
    })
}

pub fn set_password_hash(store: &PgStore, user_id: Uuid, hash: &str) -> StoreResult<()> {
    store.run("set_password_hash", |conn| {
        diesel::update(users::table.find(user_id))
            .set(users::password_hash.eq(hash))
            .execute(conn)
    })?;
    Ok(())
}

pub fn set_avatar(store: &PgStore, user_id: Uuid, avatar: Option<&str>) -> StoreResult<()> {
    store.run("set_avatar", |conn| {
        diesel::update(users::table.find(user_id))
            .set(users::avatar.eq(avatar))
            .execute(conn)
    })?;
    Ok(())
}
