use crate::schema::{HomeTeam, Match, Offer, OfferKind, OfferStatus, Slot, MAX_VOLUNTEERS};
use failure::Fail;
use serde_derive::Serialize;

/// A slot, along with the name of whoever occupies it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SlotEntry {
    /// The slot.
    #[serde(flatten)]
    pub slot: Slot,

    /// The name of the volunteer in the slot, if any.
    pub volunteer: Option<String>,
}

/// A match together with all of its slots.
#[derive(Clone, Debug)]
pub struct Roster {
    /// The match.
    pub game: Match,

    /// The team hosting the match.
    pub home_team: HomeTeam,

    /// The match's slots, ordered by ID.
    pub slots: Vec<SlotEntry>,
}

/// A reason a user may not take (or hand out) a slot.
#[derive(Clone, Copy, Debug, Eq, Fail, PartialEq)]
pub enum Violation {
    /// The slot isn't part of the match.
    #[fail(display = "That slot doesn't belong to this match.")]
    NoSuchSlot,

    /// Somebody already occupies the slot.
    #[fail(display = "This slot is already taken.")]
    SlotTaken,

    /// Every slot of the match is occupied.
    #[fail(display = "This match already has {} volunteers.", _0)]
    MatchFull(usize),

    /// The user already occupies another slot of the match.
    #[fail(display = "You are already volunteering for this match.")]
    AlreadyInMatch,

    /// The match is hosted by the user's own home team.
    #[fail(display = "You can't volunteer for your own team's match.")]
    OwnTeam,

    /// The user would be trading with themselves.
    #[fail(display = "You can't accept your own offer.")]
    SelfTrade,

    /// The offer was already accepted.
    #[fail(display = "This offer has already been closed.")]
    OfferClosed,

    /// The offered slot is now held by somebody other than the proposer.
    #[fail(display = "This offer is out of date; the slot changed hands.")]
    OfferStale,

    /// The slot already has an open offer on it.
    #[fail(display = "This slot already has an open offer.")]
    OfferPending,

    /// The slot belongs to somebody else.
    #[fail(display = "That slot isn't yours to offer.")]
    NotYourSlot,

    /// A time swap was accepted without naming a slot to give in return.
    #[fail(display = "A time swap needs one of your slots in exchange.")]
    SwapSlotMissing,

    /// The proposer can't take the slot given in return.
    #[fail(display = "The other volunteer can't take that slot.")]
    SwapIneligible,
}

impl Roster {
    /// How many volunteers the match takes. Slots beyond the cap stay empty.
    pub fn capacity(&self) -> usize {
        self.slots.len().min(MAX_VOLUNTEERS)
    }

    /// How many slots are occupied.
    pub fn volunteer_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.slot.volunteer_id.is_some())
            .count()
    }

    /// Whether the user occupies any slot of the match.
    pub fn has_volunteer(&self, user: i32) -> bool {
        self.slots
            .iter()
            .any(|entry| entry.slot.volunteer_id == Some(user))
    }

    /// Whether the match is hosted by the given home team.
    pub fn hosted_by(&self, team: Option<i32>) -> bool {
        team == Some(self.game.home_team_id)
    }

    /// The first empty slot.
    pub fn open_slot(&self) -> Option<&Slot> {
        self.slots
            .iter()
            .map(|entry| &entry.slot)
            .find(|slot| slot.volunteer_id.is_none())
    }

    /// Looks up one of the match's slots.
    pub fn slot(&self, id: i32) -> Option<&Slot> {
        self.slots
            .iter()
            .map(|entry| &entry.slot)
            .find(|slot| slot.id == id)
    }

    /// Checks that `user`, whose home team is `team`, may sign up for the given slot.
    pub fn check_claim(&self, user: i32, team: Option<i32>, slot: i32) -> Result<(), Violation> {
        let slot = self.slot(slot).ok_or(Violation::NoSuchSlot)?;
        if slot.volunteer_id.is_some() {
            return Err(Violation::SlotTaken);
        }
        if self.volunteer_count() >= self.capacity() {
            return Err(Violation::MatchFull(self.capacity()));
        }
        if self.has_volunteer(user) {
            return Err(Violation::AlreadyInMatch);
        }
        if self.hosted_by(team) {
            return Err(Violation::OwnTeam);
        }
        Ok(())
    }

    /// Checks that `user` may put the given slot up for offer. `pending` tells whether the slot
    /// already has an open offer.
    pub fn check_offer(
        &self,
        user: i32,
        slot: i32,
        kind: OfferKind,
        pending: bool,
    ) -> Result<(), Violation> {
        let slot = self.slot(slot).ok_or(Violation::NoSuchSlot)?;
        let allowed = match kind {
            OfferKind::Time => slot.volunteer_id == Some(user),
            OfferKind::Trade => slot.volunteer_id.map_or(true, |holder| holder == user),
        };
        if !allowed {
            return Err(Violation::NotYourSlot);
        }
        if pending {
            return Err(Violation::OfferPending);
        }
        Ok(())
    }

    /// Checks that `user`, whose home team is `team`, may accept the offer. The offered slot must
    /// be on this match.
    ///
    /// For time swaps this only covers the offered side; `check_swap` covers the slot given in
    /// return.
    pub fn check_accept(
        &self,
        offer: &Offer,
        user: i32,
        team: Option<i32>,
    ) -> Result<(), Violation> {
        if offer.status != OfferStatus::Open {
            return Err(Violation::OfferClosed);
        }
        let slot = self.slot(offer.slot_id).ok_or(Violation::NoSuchSlot)?;
        if user == offer.user_id || slot.volunteer_id == Some(user) {
            return Err(Violation::SelfTrade);
        }
        if self.hosted_by(team) {
            return Err(Violation::OwnTeam);
        }
        if self.has_volunteer(user) {
            return Err(Violation::AlreadyInMatch);
        }
        if slot.volunteer_id.is_none() && self.volunteer_count() >= self.capacity() {
            return Err(Violation::MatchFull(self.capacity()));
        }
        let stale = match offer.kind {
            OfferKind::Time => slot.volunteer_id != Some(offer.user_id),
            OfferKind::Trade => slot
                .volunteer_id
                .map_or(false, |holder| holder != offer.user_id),
        };
        if stale {
            return Err(Violation::OfferStale);
        }
        Ok(())
    }

    /// Checks that the slot `give`, on this match, can go to the proposer of a time swap in
    /// exchange for the offered slot. `acceptor` must hold it; `proposer_team` is the proposer's
    /// home team, and `pending` tells whether `give` has an open offer of its own.
    pub fn check_swap(
        &self,
        offer: &Offer,
        give: i32,
        acceptor: i32,
        proposer_team: Option<i32>,
        pending: bool,
    ) -> Result<(), Violation> {
        let slot = self.slot(give).ok_or(Violation::NoSuchSlot)?;
        if slot.volunteer_id != Some(acceptor) {
            return Err(Violation::NotYourSlot);
        }
        if pending {
            return Err(Violation::OfferPending);
        }
        if self.hosted_by(proposer_team) || self.has_volunteer(offer.user_id) {
            return Err(Violation::SwapIneligible);
        }
        Ok(())
    }
}
