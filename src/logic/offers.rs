//! Offering slots up and taking offers.

use crate::{
    dal::DB,
    logic::matches::listing,
    schema::{NewOffer, Offer, OfferEntry, OfferListing, User},
};
use chrono::{Local, NaiveDateTime};
use failure::Error;
use futures::Future;

/// Accepts an offer on behalf of `me`.
pub fn accept(
    db: DB,
    me: User,
    offer_id: i32,
    give_slot: Option<i32>,
) -> impl Future<Item = Offer, Error = Error> {
    db.accept_offer(me.id, offer_id, give_slot)
}

/// Puts one of the slots up for offer on behalf of `me`.
pub fn create(db: DB, me: User, new: NewOffer) -> impl Future<Item = Offer, Error = Error> {
    let new = NewOffer {
        details: new.details.trim().to_string(),
        ..new
    };
    db.create_offer(me.id, new)
}

/// Lists the open offers, as `me` sees them.
pub fn list(db: DB, me: User) -> impl Future<Item = Vec<OfferListing>, Error = Error> {
    db.get_profile(me.id)
        .join(db.list_open_offers())
        .map(move |(profile, entries)| {
            let now = Local::now().naive_local();
            entries
                .into_iter()
                .map(|entry| offer_listing(entry, me.id, profile.home_team_id, now))
                .collect()
        })
}

/// Gets a single offer, open or not.
pub fn show(db: DB, offer_id: i32) -> impl Future<Item = Offer, Error = Error> {
    db.get_offer(offer_id)
}

fn offer_listing(
    entry: OfferEntry,
    viewer: i32,
    team: Option<i32>,
    now: NaiveDateTime,
) -> OfferListing {
    let can_accept = entry.roster.check_accept(&entry.offer, viewer, team).is_ok();
    OfferListing {
        offer: entry.offer,
        proposer: entry.proposer,
        listing: listing(entry.roster, viewer, team, now),
        can_accept,
    }
}
