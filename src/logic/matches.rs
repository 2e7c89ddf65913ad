//! Browsing matches and signing up for them.

use crate::{
    dal::DB,
    schema::{MatchFilter, MatchListing, Roster, User},
};
use chrono::{Local, NaiveDateTime};
use chrono_humanize::HumanTime;
use failure::Error;
use futures::Future;

/// Lists the matches passing the filter, as `me` sees them.
pub fn list(
    db: DB,
    me: User,
    filter: MatchFilter,
) -> impl Future<Item = Vec<MatchListing>, Error = Error> {
    db.get_profile(me.id)
        .join(db.list_rosters(filter))
        .map(move |(profile, rosters)| {
            let now = Local::now().naive_local();
            rosters
                .into_iter()
                .map(|roster| listing(roster, me.id, profile.home_team_id, now))
                .collect()
        })
}

/// Shows a single match, as `me` sees it.
pub fn show(db: DB, me: User, match_id: i32) -> impl Future<Item = MatchListing, Error = Error> {
    db.get_profile(me.id)
        .join(db.get_roster(match_id))
        .map(move |(profile, roster)| {
            listing(roster, me.id, profile.home_team_id, Local::now().naive_local())
        })
}

/// Signs `me` up for a slot, returning the match as it looks afterwards.
pub fn sign_up(
    db: DB,
    me: User,
    match_id: i32,
    slot_id: i32,
) -> impl Future<Item = MatchListing, Error = Error> {
    db.claim_slot(me.id, match_id, slot_id)
        .join(db.get_profile(me.id))
        .map(move |(roster, profile)| {
            listing(roster, me.id, profile.home_team_id, Local::now().naive_local())
        })
}

/// Describes a roster from the point of view of the user `viewer`, whose home team is `team`.
pub fn listing(roster: Roster, viewer: i32, team: Option<i32>, now: NaiveDateTime) -> MatchListing {
    let volunteer_count = roster.volunteer_count();
    let capacity = roster.capacity();
    let can_volunteer = !roster.hosted_by(team);
    let user_signed_up = roster.has_volunteer(viewer);
    let open_slot = roster.open_slot().map(|slot| slot.id);
    let starts = HumanTime::from(roster.game.starts_at() - now).to_string();
    MatchListing {
        game: roster.game,
        home_team: roster.home_team.name,
        slots: roster.slots,
        volunteer_count,
        capacity,
        can_volunteer,
        user_signed_up,
        open_slot,
        starts,
    }
}
