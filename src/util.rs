//! Various utilities.

use failure::{format_err, Error};
use futures::{future::poll_fn, Future};
use log::error;

/// Logs an error, including its causes and backtrace (if possible).
pub fn log_err(err: &Error) {
    let mut first = true;
    let num_errs = err.iter_chain().count();
    if num_errs <= 1 {
        error!("{}", err);
    } else {
        for cause in err.iter_chain() {
            if first {
                first = false;
                error!("           {}", cause);
            } else {
                error!("caused by: {}", cause);
            }
        }
    }
    let bt = err.backtrace().to_string();
    if bt != "" {
        error!("{}", bt);
    }
}

/// Runs a blocking function on the current tokio threadpool, without blocking the other futures
/// running on the thread. The future must be polled from inside a threadpool.
pub fn blocking<E, F, T>(func: F) -> impl Future<Item = T, Error = Error>
where
    E: Into<Error>,
    F: FnOnce() -> Result<T, E>,
{
    let mut func = Some(func);
    poll_fn(move || tokio_threadpool::blocking(|| func.take().map(|func| func())))
        .map_err(Error::from)
        .and_then(|r| match r {
            Some(r) => r.map_err(Into::into),
            None => Err(format_err!("Blocking task was polled after it completed")),
        })
}

/// The type of a responder. Since `impl Trait` can't be used in `type` items, this magics one up.
macro_rules! Resp {
    () => { warp::filters::BoxedFilter<(impl warp::Reply,)> };
}

/// Inserts `.or(...)` between the given filters.
macro_rules! route_any {
    ($hm:ident $hp:tt => $h:expr $(, $tm:ident $tp:tt => $t:expr)* $(,)*) => {
        route_any!(@internal @path $hm $hp).and($h)
            $(.or(route_any!(@internal @path $tm $tp).and($t)))*
    };

    (@internal @path GET ()) => {{ warp::get2() }};
    (@internal @path POST ()) => {{ warp::post2() }};
    (@internal @path $m:ident $p:tt) => {{
        use warp::path;
        route_any!(@internal @path $m ()).and(path! $p)
    }};
}
