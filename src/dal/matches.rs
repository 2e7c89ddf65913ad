use crate::{
    dal::{
        home_team_of,
        schema::{home_teams, matches, slots, users},
        DB,
    },
    schema::{HomeTeam, Match, MatchFilter, NewMatch, Roster, Slot, SlotEntry},
};
use diesel::{
    dsl::{delete, insert_into, update},
    prelude::*,
    result::Error as DieselError,
};
use failure::{bail, Error};
use futures::Future;
use log::info;
use std::collections::HashMap;

impl DB {
    /// Signs a user up for a slot of a match, returning the updated roster.
    pub fn claim_slot(
        &self,
        user: i32,
        match_id: i32,
        slot_id: i32,
    ) -> impl Future<Item = Roster, Error = Error> {
        self.async_query(move |conn| {
            conn.transaction::<_, Error, _>(|| {
                lock_matches(conn, vec![match_id])?;
                let roster = load_roster(conn, match_id)?;
                let team = home_team_of(conn, user)?;
                roster.check_claim(user, team, slot_id)?;

                let _ = update(slots::table.find(slot_id))
                    .set(slots::volunteer_id.eq(Some(user)))
                    .execute(conn)?;
                info!("User #{} took slot #{} of match #{}", user, slot_id, match_id);
                Ok(load_roster(conn, match_id)?)
            })
        })
    }

    /// Schedules a match, along with `slot_count` empty volunteer slots for it.
    pub fn create_match(
        &self,
        new: NewMatch,
        slot_count: u32,
    ) -> impl Future<Item = Roster, Error = Error> {
        self.async_query(move |conn| {
            conn.transaction::<_, Error, _>(|| {
                if slot_count == 0 {
                    bail!("A match needs at least one volunteer slot.");
                }

                let team: HomeTeam = home_teams::table
                    .filter(home_teams::name.eq(&new.home_team))
                    .get_result(conn)?;
                let game: Match = insert_into(matches::table)
                    .values((
                        matches::date.eq(new.date),
                        matches::start_time.eq(new.start_time),
                        matches::home_team_id.eq(team.id),
                        matches::guest_team.eq(&new.guest_team),
                        matches::location.eq(&new.location),
                    ))
                    .get_result(conn)?;
                for _ in 0..slot_count {
                    let _ = insert_into(slots::table)
                        .values(slots::match_id.eq(game.id))
                        .execute(conn)?;
                }
                info!(
                    "Scheduled match #{}: {} vs {} with {} slots",
                    game.id, team.name, game.guest_team, slot_count
                );
                Ok(load_roster(conn, game.id)?)
            })
        })
    }

    /// Deletes a match, along with its slots and any offers on them.
    pub fn delete_match(&self, match_id: i32) -> impl Future<Item = (), Error = Error> {
        self.async_query(move |conn| {
            let n = delete(matches::table.find(match_id)).execute(conn)?;
            if n == 0 {
                Err(DieselError::NotFound)
            } else {
                info!("Removed match #{}", match_id);
                Ok(())
            }
        })
    }

    /// Gets a single match's roster.
    pub fn get_roster(&self, match_id: i32) -> impl Future<Item = Roster, Error = Error> {
        self.async_query(move |conn| load_roster(conn, match_id))
    }

    /// Lists the rosters of the matches passing the filter, earliest first.
    pub fn list_rosters(
        &self,
        filter: MatchFilter,
    ) -> impl Future<Item = Vec<Roster>, Error = Error> {
        self.async_query(move |conn| {
            let mut query = matches::table
                .inner_join(home_teams::table)
                .order((
                    matches::date.asc(),
                    matches::start_time.asc(),
                    matches::id.asc(),
                ))
                .into_boxed();
            if let Some(ref team) = filter.team {
                query = query.filter(home_teams::name.eq(team));
            }
            if let Some(from) = filter.from {
                query = query.filter(matches::date.ge(from));
            }
            let games = query.load::<(Match, HomeTeam)>(conn)?;
            attach_slots(conn, games)
        })
    }
}

/// Loads one match's roster.
pub(super) fn load_roster(conn: &PgConnection, match_id: i32) -> QueryResult<Roster> {
    load_rosters(conn, vec![match_id])?
        .into_iter()
        .next()
        .ok_or(DieselError::NotFound)
}

/// Loads the rosters of the given matches, earliest first. Unknown IDs are skipped.
pub(super) fn load_rosters(conn: &PgConnection, match_ids: Vec<i32>) -> QueryResult<Vec<Roster>> {
    let games = matches::table
        .inner_join(home_teams::table)
        .filter(matches::id.eq_any(match_ids))
        .order((
            matches::date.asc(),
            matches::start_time.asc(),
            matches::id.asc(),
        ))
        .load::<(Match, HomeTeam)>(conn)?;
    attach_slots(conn, games)
}

/// Takes a row lock on each of the given matches, in ID order so two transactions can't wait on
/// each other. Claims and trades touching a match serialize on this lock.
pub(super) fn lock_matches(conn: &PgConnection, mut match_ids: Vec<i32>) -> QueryResult<()> {
    match_ids.sort();
    match_ids.dedup();
    let locked = matches::table
        .select(matches::id)
        .filter(matches::id.eq_any(match_ids.clone()))
        .order(matches::id)
        .for_update()
        .load::<i32>(conn)?;
    if locked.len() == match_ids.len() {
        Ok(())
    } else {
        Err(DieselError::NotFound)
    }
}

fn attach_slots(conn: &PgConnection, games: Vec<(Match, HomeTeam)>) -> QueryResult<Vec<Roster>> {
    let match_ids = games.iter().map(|(game, _)| game.id).collect::<Vec<_>>();
    let rows = slots::table
        .left_join(users::table)
        .filter(slots::match_id.eq_any(match_ids))
        .order(slots::id)
        .select((slots::all_columns, users::name.nullable()))
        .load::<(Slot, Option<String>)>(conn)?;

    let mut by_match = HashMap::<i32, Vec<SlotEntry>>::new();
    for (slot, volunteer) in rows {
        by_match
            .entry(slot.match_id)
            .or_insert_with(Vec::new)
            .push(SlotEntry { slot, volunteer });
    }

    Ok(games
        .into_iter()
        .map(|(game, home_team)| {
            let slots = by_match.remove(&game.id).unwrap_or_default();
            Roster {
                game,
                home_team,
                slots,
            }
        })
        .collect())
}
