//! Types used throughout.
//!
//! > Schema defines the plain old data types that views operate on. Notably, the schema module has
//! > no knowledge of the database, nor any dependencies on any of the rest of the system.
//!
//! The rules about who may occupy which slot live here too, in `Roster`, since they only ever
//! look at data that has already been loaded.

mod roster;

pub use crate::schema::roster::{Roster, SlotEntry, Violation};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_derive::{Deserialize, Serialize};

/// The most volunteers a single match takes.
pub const MAX_VOLUNTEERS: usize = 3;

/// The number of volunteer slots a match gets when nobody says otherwise.
pub const DEFAULT_SLOTS_PER_MATCH: u32 = 3;

/// A home team.
#[derive(Clone, Debug, PartialEq, Queryable, Serialize)]
pub struct HomeTeam {
    /// The team's database ID.
    pub id: i32,

    /// The team's name.
    pub name: String,
}

/// A user.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct User {
    /// The user's database ID.
    #[serde(skip)]
    pub id: i32,

    /// The user's name.
    pub name: String,

    /// The user's email address.
    pub email: String,
}

/// The extra information kept about a user.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct Profile {
    /// The database ID of the user this profile belongs to.
    #[serde(skip)]
    pub user_id: i32,

    /// The database ID of the user's home team, if they have one.
    pub home_team_id: Option<i32>,

    /// The user's first name.
    pub first_name: String,

    /// The user's last name.
    pub last_name: String,

    /// A phone number the user can be reached at.
    pub phone: String,
}

/// A scheduled match.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct Match {
    /// The match's database ID.
    pub id: i32,

    /// The day the match is played on.
    pub date: NaiveDate,

    /// The time the match starts at.
    pub start_time: NaiveTime,

    /// The database ID of the hosting team.
    pub home_team_id: i32,

    /// The name of the visiting team.
    pub guest_team: String,

    /// Where the match is played. May be empty.
    pub location: String,
}

impl Match {
    /// The local date and time the match starts at.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }
}

/// A volunteer position on a match.
#[derive(Clone, Debug, PartialEq, Queryable, Serialize)]
pub struct Slot {
    /// The slot's database ID.
    pub id: i32,

    /// The database ID of the match the slot belongs to.
    pub match_id: i32,

    /// The database ID of the user occupying the slot, if any.
    #[serde(skip)]
    pub volunteer_id: Option<i32>,
}

/// What an offer proposes to do with its slot.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, AsExpression, FromSqlRow)]
#[serde(rename_all = "lowercase")]
#[sql_type = "diesel::sql_types::Text"]
pub enum OfferKind {
    /// The slot is handed to whoever accepts.
    Trade,

    /// The slot is swapped for one of the accepting user's slots on another match.
    Time,
}

impl OfferKind {
    /// The name the kind is stored and rendered under.
    pub fn as_str(self) -> &'static str {
        match self {
            OfferKind::Trade => "trade",
            OfferKind::Time => "time",
        }
    }
}

/// Whether an offer can still be accepted.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, AsExpression, FromSqlRow)]
#[serde(rename_all = "lowercase")]
#[sql_type = "diesel::sql_types::Text"]
pub enum OfferStatus {
    /// Waiting for someone to accept it.
    Open,

    /// Accepted.
    Closed,
}

impl OfferStatus {
    /// The name the status is stored and rendered under.
    pub fn as_str(self) -> &'static str {
        match self {
            OfferStatus::Open => "open",
            OfferStatus::Closed => "closed",
        }
    }
}

/// An offer to trade or swap a slot.
#[derive(Clone, Debug, Queryable, Serialize)]
pub struct Offer {
    /// The offer's database ID.
    pub id: i32,

    /// The database ID of the slot on offer.
    pub slot_id: i32,

    /// The database ID of the user who made the offer.
    #[serde(skip)]
    pub user_id: i32,

    /// What kind of offer this is.
    pub kind: OfferKind,

    /// Whether the offer has been accepted yet.
    pub status: OfferStatus,

    /// Free text from the proposer.
    pub details: String,

    /// When the offer was made.
    pub created_at: DateTime<Utc>,

    /// The database ID of the user who accepted the offer.
    #[serde(skip)]
    pub accepted_by: Option<i32>,

    /// When the offer was accepted.
    pub closed_at: Option<DateTime<Utc>>,
}

/// An open offer, with what's needed to show it to somebody.
#[derive(Clone, Debug)]
pub struct OfferEntry {
    /// The offer itself.
    pub offer: Offer,

    /// The name of the user who made it.
    pub proposer: String,

    /// The roster of the match the offered slot is on.
    pub roster: Roster,
}

/// A match as one particular user sees it.
#[derive(Clone, Debug, Serialize)]
pub struct MatchListing {
    /// The match.
    #[serde(rename = "match")]
    pub game: Match,

    /// The name of the hosting team.
    pub home_team: String,

    /// The match's slots, in order.
    pub slots: Vec<SlotEntry>,

    /// How many slots are occupied.
    pub volunteer_count: usize,

    /// How many volunteers the match takes.
    pub capacity: usize,

    /// Whether the user may volunteer at all, i.e. the match isn't hosted by their own team.
    pub can_volunteer: bool,

    /// Whether the user already occupies one of the slots.
    pub user_signed_up: bool,

    /// The first empty slot, if there is one.
    pub open_slot: Option<i32>,

    /// When the match starts, relative to now.
    pub starts: String,
}

/// An open offer as one particular user sees it.
#[derive(Clone, Debug, Serialize)]
pub struct OfferListing {
    /// The offer.
    pub offer: Offer,

    /// The name of the user who made the offer.
    pub proposer: String,

    /// The match the offered slot is on.
    #[serde(rename = "match")]
    pub listing: MatchListing,

    /// Whether the user could accept the offer. For time swaps this only covers the offered
    /// slot; the slot given in return is checked when the offer is accepted.
    pub can_accept: bool,
}

/// A user together with their profile.
#[derive(Clone, Debug, Serialize)]
pub struct ProfileView {
    /// The account.
    pub user: User,

    /// The profile.
    pub profile: Profile,

    /// The user's home team, if they have one.
    pub home_team: Option<HomeTeam>,
}

/// Which matches to list.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct MatchFilter {
    /// Only list matches hosted by the team with this name.
    pub team: Option<String>,

    /// Only list matches on or after this day.
    pub from: Option<NaiveDate>,
}

/// A match that's about to be scheduled.
#[derive(Clone, Debug)]
pub struct NewMatch {
    /// The day the match is played on.
    pub date: NaiveDate,

    /// The time the match starts at.
    pub start_time: NaiveTime,

    /// The name of the hosting team.
    pub home_team: String,

    /// The name of the visiting team.
    pub guest_team: String,

    /// Where the match is played.
    pub location: String,
}

/// An offer that's about to be made.
#[derive(Clone, Debug, Deserialize)]
pub struct NewOffer {
    /// The database ID of the slot on offer.
    pub slot: i32,

    /// What kind of offer to make.
    #[serde(rename = "type")]
    pub kind: OfferKind,

    /// Free text for whoever reads the offer.
    #[serde(default)]
    pub details: String,
}

/// A request to create an account.
#[derive(Clone, Debug, Deserialize)]
pub struct Registration {
    /// The name to log in as.
    pub username: String,

    /// The user's email address.
    pub email: String,

    /// The database ID of the user's home team, if they have one.
    #[serde(default)]
    pub home_team: Option<i32>,
}

/// The new contents of a user's account and profile.
#[derive(Clone, Debug, Deserialize)]
pub struct ProfileUpdate {
    /// The user's name.
    pub username: String,

    /// The user's email address.
    pub email: String,

    /// The user's first name.
    #[serde(default)]
    pub first_name: String,

    /// The user's last name.
    #[serde(default)]
    pub last_name: String,

    /// A phone number the user can be reached at.
    #[serde(default)]
    pub phone: String,

    /// The database ID of the user's home team, if they have one.
    #[serde(default)]
    pub home_team: Option<i32>,
}
