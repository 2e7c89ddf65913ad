use crate::{
    dal::DB,
    logic,
    router::{auth::require_auth, util::FutureExt},
    schema::{NewOffer, User},
    view::{render_json, render_json_with},
};
use serde_derive::Deserialize;
use warp::{http::StatusCode, path, Filter};

/// The body of an acceptance. Only time swaps need one.
#[derive(Debug, Default, Deserialize)]
struct Acceptance {
    #[serde(default)]
    give_slot: Option<i32>,
}

pub fn accept() -> Resp!() {
    path!(i32 / "accept")
        .and(warp::path::end())
        .and(require_auth())
        .and(warp::ext::get::<DB>())
        .and(
            warp::body::content_length_limit(2 * 1024)
                .and(warp::body::json())
                .or(warp::any().map(Acceptance::default))
                .unify(),
        )
        .and_then(|offer_id, me, db, acceptance: Acceptance| {
            logic::offers::accept(db, me, offer_id, acceptance.give_slot).err_to_rejection()
        })
        .and_then(|offer| render_json(&offer))
        .boxed()
}

pub fn create() -> Resp!() {
    warp::path::end()
        .and(require_auth())
        .and(warp::ext::get::<DB>())
        .and(warp::body::content_length_limit(2 * 1024))
        .and(warp::body::json())
        .and_then(|me: User, db: DB, new: NewOffer| {
            logic::offers::create(db, me, new).err_to_rejection()
        })
        .and_then(|offer| render_json_with(StatusCode::CREATED, &offer))
        .boxed()
}

pub fn list() -> Resp!() {
    warp::path::end()
        .and(require_auth())
        .and(warp::ext::get::<DB>())
        .and_then(|me, db| logic::offers::list(db, me).err_to_rejection())
        .and_then(|listings: Vec<_>| render_json(&listings))
        .boxed()
}

pub fn show() -> Resp!() {
    path!(i32)
        .and(warp::path::end())
        .and(require_auth())
        .and(warp::ext::get::<DB>())
        .and_then(|offer_id, _me: User, db| logic::offers::show(db, offer_id).err_to_rejection())
        .and_then(|offer| render_json(&offer))
        .boxed()
}
