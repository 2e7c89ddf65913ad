use crate::{
    dal::DB,
    logic,
    router::{auth::require_auth, util::FutureExt},
    schema::{ProfileUpdate, User},
    view::render_json,
};
use warp::Filter;

pub fn edit() -> Resp!() {
    warp::path::end()
        .and(require_auth())
        .and(warp::ext::get::<DB>())
        .and(warp::body::content_length_limit(2 * 1024))
        .and(warp::body::json())
        .and_then(|me: User, db: DB, changes: ProfileUpdate| {
            logic::profile::update(db, me, changes).err_to_rejection()
        })
        .and_then(|view| render_json(&view))
        .boxed()
}

pub fn show() -> Resp!() {
    warp::path::end()
        .and(require_auth())
        .and(warp::ext::get::<DB>())
        .and_then(|me, db| logic::profile::show(db, me).err_to_rejection())
        .and_then(|view| render_json(&view))
        .boxed()
}

pub fn teams() -> Resp!() {
    warp::path::end()
        .and(warp::ext::get::<DB>())
        .and_then(|db| logic::profile::teams(db).err_to_rejection())
        .and_then(|teams: Vec<_>| render_json(&teams))
        .boxed()
}
