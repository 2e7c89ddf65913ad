use crate::{
    dal::DB,
    logic,
    router::{
        errors::Unauthenticated,
        util::{reject, FutureExt},
    },
    schema::{Registration, User},
    view::json_response,
};
use chrono::Duration;
use failure::Error;
use futures::Future;
use serde_json::json;
use uuid::Uuid;
use warp::{
    http::{
        header::{HeaderValue, SET_COOKIE},
        Response, StatusCode,
    },
    Filter, Rejection,
};

/// A filter that parses a user's authentication cookie, stashing the user in the request
/// extensions. Requests without a valid cookie pass through unauthenticated.
pub fn parse_auth_cookie() -> impl Clone + Filter<Extract = (), Error = Rejection> {
    warp::cookie("auth")
        .and(warp::ext::get::<DB>())
        .and_then(|token: String, db: DB| {
            logic::auth::authed_user(db, &token)
                .map(warp::ext::set)
                .err_to_rejection()
        })
        .untuple_one()
        .or(warp::any())
        .unify()
}

/// A filter that optionally authenticates the user via a cookie. The `parse_auth_cookie` filter
/// must have already been run.
pub fn opt_auth() -> impl Clone + Filter<Extract = (Option<User>,), Error = Rejection> {
    warp::ext::get::<User>()
        .map(Some)
        .or(warp::any().map(|| None))
        .unify()
}

/// Like `opt_auth`, but rejects anonymous requests with a 401.
pub fn require_auth() -> impl Clone + Filter<Extract = (User,), Error = Rejection> {
    opt_auth().and_then(|me: Option<User>| me.ok_or_else(|| reject(Unauthenticated.into())))
}

pub fn logout() -> Resp!() {
    warp::path::end()
        .and(require_auth())
        .and(warp::ext::get::<DB>())
        .and(warp::cookie::optional("auth"))
        .and_then(|_me: User, db: DB, token: Option<String>| {
            logic::auth::logout(db, token).err_to_rejection()
        })
        .and_then(|()| {
            json_response(StatusCode::OK, &json!({ "ok": true }))
                .and_then(|r| with_cookie(r, "auth=; Max-Age=0; Path=/; HttpOnly".to_string()))
                .map_err(reject)
        })
        .boxed()
}

pub fn register() -> Resp!() {
    warp::path::end()
        .and(warp::body::content_length_limit(2 * 1024))
        .and(warp::ext::get::<DB>())
        .and(warp::body::json())
        .and_then(|db, registration: Registration| {
            logic::auth::register(db, registration).err_to_rejection()
        })
        .and_then(|(user, token): (User, Uuid)| {
            json_response(StatusCode::CREATED, &json!({ "user": user, "token": token }))
                .and_then(|r| with_cookie(r, auth_cookie(token)))
                .map_err(reject)
        })
        .boxed()
}

/// The `Set-Cookie` value that logs a browser in with the given token.
fn auth_cookie(token: Uuid) -> String {
    format!(
        "auth={}; Max-Age={}; Path=/; HttpOnly",
        token,
        Duration::weeks(520).num_seconds()
    )
}

fn with_cookie(mut r: Response<String>, cookie: String) -> Result<Response<String>, Error> {
    let _ = r
        .headers_mut()
        .insert(SET_COOKIE, HeaderValue::from_str(&cookie)?);
    Ok(r)
}
