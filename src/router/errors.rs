use crate::{router::util::reject, schema::Violation, util::log_err, view::json_response};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use failure::{Compat, Error, Fail};
use serde_derive::Serialize;
use warp::{
    http::{Response, StatusCode},
    Rejection,
};

/// The request needed a logged-in user, but didn't come with one.
#[derive(Clone, Copy, Debug, Fail)]
#[fail(display = "You need to be logged in to do that.")]
pub struct Unauthenticated;

/// The body of an error response.
#[derive(Debug, PartialEq, Serialize)]
struct Problem {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

/// Turns errors raised by handlers into JSON responses. Rejections that didn't come from a handler
/// (unknown paths, wrong methods, bad bodies) are left for warp to answer.
pub fn recover(rejection: Rejection) -> Result<Response<String>, Rejection> {
    let err = match rejection.find_cause::<Compat<Error>>() {
        Some(err) => err.get_ref(),
        None => return Err(rejection),
    };

    let (status, problem) = classify(err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        log_err(err);
    }
    json_response(status, &problem).or_else(|err| {
        log_err(&err);
        Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(String::new())
            .map_err(|err| reject(err.into()))
    })
}

/// Picks a status and a message for an error.
fn classify(err: &Error) -> (StatusCode, Problem) {
    if let Some(violation) = err.downcast_ref::<Violation>() {
        let status = match violation {
            Violation::NoSuchSlot => StatusCode::NOT_FOUND,
            _ => StatusCode::CONFLICT,
        };
        return (status, problem(violation.to_string(), None));
    }

    if let Some(unauthenticated) = err.downcast_ref::<Unauthenticated>() {
        return (
            StatusCode::UNAUTHORIZED,
            problem(unauthenticated.to_string(), None),
        );
    }

    match err.downcast_ref::<DieselError>() {
        Some(DieselError::NotFound) => (
            StatusCode::NOT_FOUND,
            problem("That doesn't exist.".to_string(), None),
        ),
        Some(DieselError::DatabaseError(kind, info)) => {
            let known = info
                .constraint_name()
                .and_then(|name| constraint_message(kind, name));
            match known {
                Some((status, field, msg)) => (status, problem(msg.to_string(), field)),
                None => internal(),
            }
        }
        _ => internal(),
    }
}

fn internal() -> (StatusCode, Problem) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        problem("Something went wrong on our end.".to_string(), None),
    )
}

fn problem(error: String, field: Option<&'static str>) -> Problem {
    Problem { error, field }
}

/// Maps a violated database constraint to a status, the request field at fault, and a message.
fn constraint_message(
    kind: &DatabaseErrorKind,
    name: &str,
) -> Option<(StatusCode, Option<&'static str>, &'static str)> {
    let bad = StatusCode::BAD_REQUEST;
    Some(match (kind, name) {
        (_, "name_fmt") => (
            bad,
            Some("username"),
            "Your username must contain only ASCII letters, digits and underscores",
        ),
        (_, "name_len") => (
            bad,
            Some("username"),
            "Your username must be between 3 and 32 characters",
        ),
        (DatabaseErrorKind::UniqueViolation, "users_name_key") => (
            bad,
            Some("username"),
            "This username is already taken",
        ),
        (_, "email_fmt") | (_, "email_len") => (
            bad,
            Some("email"),
            "That doesn't look like an email address...",
        ),
        (DatabaseErrorKind::UniqueViolation, "users_email_key") => (
            bad,
            Some("email"),
            "This email is already registered",
        ),
        (DatabaseErrorKind::ForeignKeyViolation, "profiles_home_team_id_fkey") => (
            bad,
            Some("home_team"),
            "That home team doesn't exist",
        ),
        (DatabaseErrorKind::UniqueViolation, "home_teams_name_key") => (
            bad,
            Some("name"),
            "A home team with that name already exists",
        ),
        (_, "team_name_len") => (
            bad,
            Some("name"),
            "A team name must be between 1 and 100 characters",
        ),
        (_, "first_name_len") => (bad, Some("first_name"), "That first name is too long"),
        (_, "last_name_len") => (bad, Some("last_name"), "That last name is too long"),
        (_, "phone_len") => (bad, Some("phone"), "That phone number is too long"),
        (_, "guest_team_len") => (
            bad,
            Some("guest_team"),
            "A guest team name must be between 1 and 100 characters",
        ),
        (_, "location_len") => (bad, Some("location"), "That location is too long"),
        (DatabaseErrorKind::ForeignKeyViolation, "offers_slot_id_fkey") => {
            (StatusCode::NOT_FOUND, Some("slot"), "That slot doesn't exist")
        }
        (DatabaseErrorKind::UniqueViolation, "one_open_offer_per_slot") => (
            StatusCode::CONFLICT,
            Some("slot"),
            "This slot already has an open offer.",
        ),
        (DatabaseErrorKind::UniqueViolation, "one_slot_per_volunteer") => (
            StatusCode::CONFLICT,
            None,
            "You are already volunteering for this match.",
        ),
        _ => return None,
    })
}
