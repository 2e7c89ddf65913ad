//! Looking at and editing one's own profile.

use crate::{
    dal::DB,
    schema::{HomeTeam, Profile, ProfileUpdate, ProfileView, User},
};
use failure::Error;
use futures::{
    future::{ok, Either},
    Future,
};

/// Shows `me` their own profile.
pub fn show(db: DB, me: User) -> impl Future<Item = ProfileView, Error = Error> {
    db.get_profile(me.id)
        .and_then(move |profile| view(db, me, profile))
}

/// Lists the home teams a user may pick from.
pub fn teams(db: DB) -> impl Future<Item = Vec<HomeTeam>, Error = Error> {
    db.list_teams()
}

/// Replaces `me`'s account details and profile.
pub fn update(
    db: DB,
    me: User,
    changes: ProfileUpdate,
) -> impl Future<Item = ProfileView, Error = Error> {
    let changes = ProfileUpdate {
        username: changes.username.trim().to_string(),
        email: changes.email.trim().to_string(),
        first_name: changes.first_name.trim().to_string(),
        last_name: changes.last_name.trim().to_string(),
        phone: changes.phone.trim().to_string(),
        home_team: changes.home_team,
    };
    db.update_profile(me.id, changes)
        .and_then(move |(user, profile)| view(db, user, profile))
}

fn view(db: DB, user: User, profile: Profile) -> impl Future<Item = ProfileView, Error = Error> {
    let home_team = match profile.home_team_id {
        Some(team) => Either::A(db.get_team(team).map(Some)),
        None => Either::B(ok(None)),
    };
    home_team.map(move |home_team| ProfileView {
        user,
        profile,
        home_team,
    })
}
