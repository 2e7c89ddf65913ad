//! The HTTP server.
//!
//! > **Router** is the the only module that knows anything about HTTP. Every other part of the
//! > system has no knowledge of how the request is really being made. The router's responsibility
//! > is to call into the domain logic, and then render that response data with an appropriate view.

mod auth;
mod errors;
mod matches;
mod offers;
mod profile;
mod util;

use crate::dal::DB;
use futures::{
    future::{loop_fn, ok, Loop},
    Future,
};
use log::{info, warn};
use std::net::SocketAddr;
use warp::Filter;

/// Starts an HTTP server at the given address. The polymorphism in the return type indicates that
/// the future will never resolve, since it can be trivially used as
/// `impl Future<Item = Void, Error = Void>`.
pub fn serve_on<T, E>(addr: SocketAddr, db: DB) -> impl Future<Item = T, Error = E> {
    loop_fn((), move |()| {
        info!("Starting to serve on {}...", addr);
        let server = routes(db.clone())
            .recover(errors::recover)
            .with(warp::log("slotswap::router"));
        warp::serve(server).bind(addr).then(|r| {
            let status = match r {
                Ok(()) => "success",
                Err(()) => "failure",
            };
            warn!("HTTP server exited with {}; restarting...", status);
            ok(Loop::Continue(()))
        })
    })
}

fn routes(db: DB) -> Resp!() {
    util::set(db)
        .and(auth::parse_auth_cookie())
        .and(route_any! {
            GET () => matches::list(),
            GET ("matches") => matches::list(),
            GET ("matches") => matches::show(),
            POST ("matches") => matches::signup(),
            GET ("teams") => profile::teams(),
            POST ("register") => auth::register(),
            POST ("logout") => auth::logout(),
            GET ("profile") => profile::show(),
            POST ("profile") => profile::edit(),
            GET ("offers") => offers::list(),
            POST ("offers") => offers::create(),
            GET ("offers") => offers::show(),
            POST ("offers") => offers::accept(),
        })
        .boxed()
}
