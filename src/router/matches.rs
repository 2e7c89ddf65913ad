use crate::{
    dal::DB,
    logic,
    router::{auth::require_auth, util::FutureExt},
    schema::{MatchFilter, User},
    view::render_json,
};
use warp::{path, Filter};

pub fn list() -> Resp!() {
    warp::path::end()
        .and(
            warp::query::<MatchFilter>()
                .or(warp::any().map(MatchFilter::default))
                .unify(),
        )
        .and(require_auth())
        .and(warp::ext::get::<DB>())
        .and_then(|filter: MatchFilter, me: User, db: DB| {
            logic::matches::list(db, me, filter).err_to_rejection()
        })
        .and_then(|listings: Vec<_>| render_json(&listings))
        .boxed()
}

pub fn show() -> Resp!() {
    path!(i32)
        .and(warp::path::end())
        .and(require_auth())
        .and(warp::ext::get::<DB>())
        .and_then(|match_id, me, db| logic::matches::show(db, me, match_id).err_to_rejection())
        .and_then(|listing| render_json(&listing))
        .boxed()
}

pub fn signup() -> Resp!() {
    path!(i32 / "signup" / i32)
        .and(warp::path::end())
        .and(require_auth())
        .and(warp::ext::get::<DB>())
        .and_then(|match_id, slot_id, me, db| {
            logic::matches::sign_up(db, me, match_id, slot_id).err_to_rejection()
        })
        .and_then(|listing| render_json(&listing))
        .boxed()
}
