use crate::{
    dal::{
        home_team_of,
        matches::{load_roster, load_rosters, lock_matches},
        schema::{offers, slots, users},
        DB,
    },
    schema::{NewOffer, Offer, OfferEntry, OfferKind, OfferStatus, Roster, Slot, Violation},
};
use chrono::Utc;
use diesel::{
    dsl::{exists, insert_into, update},
    prelude::*,
    result::Error as DieselError,
    select,
};
use failure::Error;
use futures::Future;
use log::info;
use std::collections::HashMap;

impl DB {
    /// Accepts an offer on behalf of `user`. For time swaps, `give_slot` names the slot the user
    /// hands to the proposer in return; trades ignore it.
    ///
    /// Everything happens in one transaction: either the slots change hands and the offer
    /// closes, or nothing changes at all.
    pub fn accept_offer(
        &self,
        user: i32,
        offer_id: i32,
        give_slot: Option<i32>,
    ) -> impl Future<Item = Offer, Error = Error> {
        self.async_query(move |conn| {
            conn.transaction::<_, Error, _>(|| {
                let offer: Offer = offers::table.find(offer_id).for_update().get_result(conn)?;
                let slot: Slot = slots::table.find(offer.slot_id).get_result(conn)?;
                let give = match give_slot {
                    Some(id) if offer.kind == OfferKind::Time => {
                        Some(slots::table.find(id).get_result::<Slot>(conn)?)
                    }
                    _ => None,
                };

                let mut locked = vec![slot.match_id];
                locked.extend(give.iter().map(|give| give.match_id));
                lock_matches(conn, locked)?;

                let roster = load_roster(conn, slot.match_id)?;
                roster.check_accept(&offer, user, home_team_of(conn, user)?)?;

                if offer.kind == OfferKind::Time {
                    let give = give.ok_or(Violation::SwapSlotMissing)?;
                    let give_roster = load_roster(conn, give.match_id)?;
                    give_roster.check_swap(
                        &offer,
                        give.id,
                        user,
                        home_team_of(conn, offer.user_id)?,
                        has_open_offer(conn, give.id)?,
                    )?;
                    let _ = update(slots::table.find(give.id))
                        .set(slots::volunteer_id.eq(Some(offer.user_id)))
                        .execute(conn)?;
                }

                let _ = update(slots::table.find(slot.id))
                    .set(slots::volunteer_id.eq(Some(user)))
                    .execute(conn)?;
                let offer: Offer = update(offers::table.find(offer.id))
                    .set((
                        offers::status.eq(OfferStatus::Closed),
                        offers::accepted_by.eq(Some(user)),
                        offers::closed_at.eq(Some(Utc::now())),
                    ))
                    .get_result(conn)?;
                info!(
                    "User #{} accepted {} offer #{} from user #{}",
                    user,
                    offer.kind.as_str(),
                    offer.id,
                    offer.user_id
                );
                Ok(offer)
            })
        })
    }

    /// Puts a slot up for offer on behalf of `user`.
    pub fn create_offer(
        &self,
        user: i32,
        new: NewOffer,
    ) -> impl Future<Item = Offer, Error = Error> {
        self.async_query(move |conn| {
            conn.transaction::<_, Error, _>(|| {
                let slot: Slot = slots::table.find(new.slot).get_result(conn)?;
                lock_matches(conn, vec![slot.match_id])?;
                let roster = load_roster(conn, slot.match_id)?;
                roster.check_offer(user, slot.id, new.kind, has_open_offer(conn, slot.id)?)?;

                let offer: Offer = insert_into(offers::table)
                    .values((
                        offers::slot_id.eq(slot.id),
                        offers::user_id.eq(user),
                        offers::kind.eq(new.kind),
                        offers::details.eq(&new.details),
                    ))
                    .get_result(conn)?;
                info!(
                    "User #{} offered slot #{} ({})",
                    user,
                    slot.id,
                    offer.kind.as_str()
                );
                Ok(offer)
            })
        })
    }

    /// Gets an offer by ID.
    pub fn get_offer(&self, offer_id: i32) -> impl Future<Item = Offer, Error = Error> {
        self.async_query(move |conn| offers::table.find(offer_id).get_result::<Offer>(conn))
    }

    /// Lists every open offer, oldest first, along with who made it and the roster of the match
    /// it's for.
    pub fn list_open_offers(&self) -> impl Future<Item = Vec<OfferEntry>, Error = Error> {
        self.async_query(move |conn| {
            let rows = offers::table
                .inner_join(users::table)
                .filter(offers::status.eq(OfferStatus::Open))
                .order((offers::created_at.asc(), offers::id.asc()))
                .select((offers::all_columns, users::name))
                .load::<(Offer, String)>(conn)?;

            let slot_ids = rows.iter().map(|(offer, _)| offer.slot_id).collect::<Vec<_>>();
            let slot_matches = slots::table
                .filter(slots::id.eq_any(slot_ids))
                .select((slots::id, slots::match_id))
                .load::<(i32, i32)>(conn)?
                .into_iter()
                .collect::<HashMap<_, _>>();
            let rosters = load_rosters(conn, slot_matches.values().cloned().collect())?
                .into_iter()
                .map(|roster| (roster.game.id, roster))
                .collect::<HashMap<i32, Roster>>();

            Ok::<_, DieselError>(rows
                .into_iter()
                .filter_map(|(offer, proposer)| {
                    let roster = rosters.get(slot_matches.get(&offer.slot_id)?)?.clone();
                    Some(OfferEntry {
                        offer,
                        proposer,
                        roster,
                    })
                })
                .collect::<Vec<_>>())
        })
    }
}

fn has_open_offer(conn: &PgConnection, slot_id: i32) -> QueryResult<bool> {
    select(exists(
        offers::table
            .filter(offers::slot_id.eq(slot_id))
            .filter(offers::status.eq(OfferStatus::Open)),
    ))
    .get_result(conn)
}
