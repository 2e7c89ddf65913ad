//! Authentication and authorization-related logic.

use crate::{
    dal::DB,
    schema::{Registration, User},
};
use failure::Error;
use futures::{
    future::{err, ok, Either},
    Future,
};
use uuid::Uuid;

/// Returns the user authenticated by the given token, if any.
pub fn authed_user(db: DB, token: &str) -> impl Future<Item = User, Error = Error> {
    match token.parse() {
        Ok(token) => Either::A(db.get_auth_user(token).and_then(move |id| db.get_user(id))),
        Err(e) => Either::B(err(e.into())),
    }
}

/// Issues a new token for an existing user.
pub fn issue_token(db: DB, username: String) -> impl Future<Item = Uuid, Error = Error> {
    db.get_user_by_username(username)
        .and_then(move |user| db.create_auth(user.id))
}

/// Revokes the given token. Tokens that were never valid are ignored.
pub fn logout(db: DB, token: Option<String>) -> impl Future<Item = (), Error = Error> {
    match token.and_then(|token| token.parse::<Uuid>().ok()) {
        Some(token) => Either::A(db.delete_auth(token)),
        None => Either::B(ok(())),
    }
}

/// Creates an account, returning it along with a token to authenticate as it.
pub fn register(
    db: DB,
    registration: Registration,
) -> impl Future<Item = (User, Uuid), Error = Error> {
    let registration = Registration {
        username: registration.username.trim().to_string(),
        email: registration.email.trim().to_string(),
        ..registration
    };
    db.create_user(registration)
}
