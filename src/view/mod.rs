//! Rendering to JSON.
//!
//! > View is the only module that knows anything about HTML, or JSON, or other "renderings" of the
//! > response. I'm happy to call this "view" in common with traditional stateless MVC, because
//! > it's role is largely the same.

use failure::{Error, Fallible};
use serde::Serialize;
use warp::{
    http::{header::CONTENT_TYPE, Response, StatusCode},
    reject::custom,
    Rejection,
};

/// Renders a value as a JSON response with the given status.
pub fn json_response<T: Serialize>(status: StatusCode, data: &T) -> Fallible<Response<String>> {
    let body = serde_json::to_string(data)?;
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .map_err(Error::from)
}

/// Renders a value as a `200 OK` JSON `warp::Reply`.
pub fn render_json<T: Serialize>(data: &T) -> Result<Response<String>, Rejection> {
    render_json_with(StatusCode::OK, data)
}

/// Renders a value as a JSON `warp::Reply` with the given status.
pub fn render_json_with<T: Serialize>(
    status: StatusCode,
    data: &T,
) -> Result<Response<String>, Rejection> {
    json_response(status, data).map_err(|err| custom(err.compat()))
}
