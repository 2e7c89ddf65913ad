//! Tests against a live Postgres database. They only run when `TEST_DATABASE_URL` is set.

use chrono::{NaiveDate, NaiveTime};
use diesel::result::Error as DieselError;
use failure::Error;
use futures::Future;
use lazy_static::lazy_static;
use slotswap::{
    dal::DB,
    schema::{
        HomeTeam, MatchFilter, NewMatch, NewOffer, Offer, OfferKind, OfferStatus, ProfileUpdate,
        Registration, Roster, User, Violation,
    },
};
use std::env;
use tokio::runtime::Runtime;
use uuid::Uuid;

lazy_static! {
    static ref TEST_DB: Option<DB> = env::var("TEST_DATABASE_URL")
        .ok()
        .map(|url| DB::connect(&url).expect("Couldn't connect to TEST_DATABASE_URL"));
}

struct Ctx {
    db: DB,
    runtime: Runtime,
}

impl Ctx {
    fn new() -> Option<Ctx> {
        let db = TEST_DB.as_ref()?.clone();
        Some(Ctx {
            db,
            runtime: Runtime::new().unwrap(),
        })
    }

    fn run<F, T>(&mut self, future: F) -> Result<T, Error>
    where
        F: Future<Item = T, Error = Error> + Send + 'static,
        T: Send + 'static,
    {
        self.runtime.block_on(future)
    }

    fn team(&mut self) -> HomeTeam {
        let name = unique("Team ");
        self.run(self.db.create_team(name)).unwrap()
    }

    fn user(&mut self, home_team: Option<&HomeTeam>) -> User {
        let username = unique("u");
        let registration = Registration {
            email: format!("{}@example.com", username),
            username,
            home_team: home_team.map(|team| team.id),
        };
        self.run(self.db.create_user(registration)).unwrap().0
    }

    fn game(&mut self, home_team: &HomeTeam, day: u32) -> Roster {
        self.game_with_slots(home_team, day, 3)
    }

    fn game_with_slots(&mut self, home_team: &HomeTeam, day: u32, slots: u32) -> Roster {
        let new = NewMatch {
            date: NaiveDate::from_ymd(2099, 6, day),
            start_time: NaiveTime::from_hms(14, 0, 0),
            home_team: home_team.name.clone(),
            guest_team: "Visitors".to_string(),
            location: "Field 3".to_string(),
        };
        self.run(self.db.create_match(new, slots)).unwrap()
    }

    fn offer(&mut self, user: &User, roster: &Roster, slot: usize, kind: OfferKind) -> Offer {
        let new = NewOffer {
            slot: roster.slots[slot].slot.id,
            kind,
            details: String::new(),
        };
        self.run(self.db.create_offer(user.id, new)).unwrap()
    }

    fn holder(&mut self, roster: &Roster, slot: usize) -> Option<i32> {
        let roster = self.run(self.db.get_roster(roster.game.id)).unwrap();
        roster.slots[slot].slot.volunteer_id
    }

    fn claim(&mut self, user: &User, roster: &Roster, slot: usize) -> Result<Roster, Error> {
        let slot_id = roster.slots[slot].slot.id;
        self.run(self.db.claim_slot(user.id, roster.game.id, slot_id))
    }
}

fn unique(prefix: &str) -> String {
    let id = Uuid::new_v4().to_string().replace('-', "");
    format!("{}{}", prefix, &id[..16])
}

fn is_not_found(err: &Error) -> bool {
    match err.downcast_ref::<DieselError>() {
        Some(DieselError::NotFound) => true,
        _ => false,
    }
}

fn violation(err: &Error) -> Option<Violation> {
    err.downcast_ref::<Violation>().cloned()
}

#[test]
fn matches_start_with_three_open_slots() {
    let mut ctx = match Ctx::new() {
        Some(ctx) => ctx,
        None => return,
    };
    let host = ctx.team();
    let roster = ctx.game(&host, 1);
    assert_eq!(roster.slots.len(), 3);
    assert_eq!(roster.volunteer_count(), 0);
    assert_eq!(roster.home_team, host);
}

#[test]
fn signing_up_fills_a_slot() {
    let mut ctx = match Ctx::new() {
        Some(ctx) => ctx,
        None => return,
    };
    let host = ctx.team();
    let other = ctx.team();
    let alice = ctx.user(Some(&other));
    let bob = ctx.user(None);
    let home = ctx.user(Some(&host));
    let roster = ctx.game(&host, 2);

    let after = ctx.claim(&alice, &roster, 0).unwrap();
    assert_eq!(after.slots[0].slot.volunteer_id, Some(alice.id));
    assert_eq!(after.slots[0].volunteer.as_ref(), Some(&alice.name));

    let err = ctx.claim(&bob, &roster, 0).unwrap_err();
    assert_eq!(violation(&err), Some(Violation::SlotTaken));

    let err = ctx.claim(&alice, &roster, 1).unwrap_err();
    assert_eq!(violation(&err), Some(Violation::AlreadyInMatch));

    let err = ctx.claim(&home, &roster, 1).unwrap_err();
    assert_eq!(violation(&err), Some(Violation::OwnTeam));
}

#[test]
fn listing_filters_by_team_and_date() {
    let mut ctx = match Ctx::new() {
        Some(ctx) => ctx,
        None => return,
    };
    let host = ctx.team();
    let early = ctx.game(&host, 3);
    let late = ctx.game(&host, 20);

    let filter = MatchFilter {
        team: Some(host.name.clone()),
        from: None,
    };
    let ids = ctx
        .run(ctx.db.list_rosters(filter))
        .unwrap()
        .into_iter()
        .map(|roster| roster.game.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![early.game.id, late.game.id]);

    let filter = MatchFilter {
        team: Some(host.name.clone()),
        from: Some(NaiveDate::from_ymd(2099, 6, 10)),
    };
    let ids = ctx
        .run(ctx.db.list_rosters(filter))
        .unwrap()
        .into_iter()
        .map(|roster| roster.game.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![late.game.id]);
}

#[test]
fn accepting_a_trade_moves_the_slot() {
    let mut ctx = match Ctx::new() {
        Some(ctx) => ctx,
        None => return,
    };
    let host = ctx.team();
    let alice = ctx.user(None);
    let bob = ctx.user(None);
    let carol = ctx.user(None);
    let roster = ctx.game(&host, 4);
    let _ = ctx.claim(&alice, &roster, 0).unwrap();

    let new = NewOffer {
        slot: roster.slots[0].slot.id,
        kind: OfferKind::Trade,
        details: "Can't make it".to_string(),
    };
    let offer = ctx.run(ctx.db.create_offer(alice.id, new.clone())).unwrap();
    assert_eq!(offer.status, OfferStatus::Open);

    let err = ctx.run(ctx.db.create_offer(alice.id, new)).unwrap_err();
    assert_eq!(violation(&err), Some(Violation::OfferPending));

    let open = ctx.run(ctx.db.list_open_offers()).unwrap();
    assert!(open.iter().any(|entry| entry.offer.id == offer.id));

    let err = ctx.run(ctx.db.accept_offer(alice.id, offer.id, None)).unwrap_err();
    assert_eq!(violation(&err), Some(Violation::SelfTrade));

    let closed = ctx.run(ctx.db.accept_offer(bob.id, offer.id, None)).unwrap();
    assert_eq!(closed.status, OfferStatus::Closed);
    assert_eq!(closed.accepted_by, Some(bob.id));
    assert!(closed.closed_at.is_some());

    let after = ctx.run(ctx.db.get_roster(roster.game.id)).unwrap();
    assert_eq!(after.slots[0].slot.volunteer_id, Some(bob.id));

    let err = ctx.run(ctx.db.accept_offer(carol.id, offer.id, None)).unwrap_err();
    assert_eq!(violation(&err), Some(Violation::OfferClosed));

    let open = ctx.run(ctx.db.list_open_offers()).unwrap();
    assert!(open.iter().all(|entry| entry.offer.id != offer.id));
}

#[test]
fn accepting_a_time_offer_swaps_slots() {
    let mut ctx = match Ctx::new() {
        Some(ctx) => ctx,
        None => return,
    };
    let host = ctx.team();
    let alice = ctx.user(None);
    let bob = ctx.user(None);
    let first = ctx.game(&host, 5);
    let second = ctx.game(&host, 6);
    let _ = ctx.claim(&alice, &first, 0).unwrap();
    let _ = ctx.claim(&bob, &second, 1).unwrap();

    let new = NewOffer {
        slot: first.slots[0].slot.id,
        kind: OfferKind::Time,
        details: String::new(),
    };
    let offer = ctx.run(ctx.db.create_offer(alice.id, new)).unwrap();

    let err = ctx.run(ctx.db.accept_offer(bob.id, offer.id, None)).unwrap_err();
    assert_eq!(violation(&err), Some(Violation::SwapSlotMissing));

    let give = second.slots[1].slot.id;
    let _ = ctx
        .run(ctx.db.accept_offer(bob.id, offer.id, Some(give)))
        .unwrap();

    let first = ctx.run(ctx.db.get_roster(first.game.id)).unwrap();
    let second = ctx.run(ctx.db.get_roster(second.game.id)).unwrap();
    assert_eq!(first.slots[0].slot.volunteer_id, Some(bob.id));
    assert_eq!(second.slots[1].slot.volunteer_id, Some(alice.id));
}

#[test]
fn removing_a_user_opens_their_slots() {
    let mut ctx = match Ctx::new() {
        Some(ctx) => ctx,
        None => return,
    };
    let host = ctx.team();
    let alice = ctx.user(None);
    let roster = ctx.game(&host, 7);
    let _ = ctx.claim(&alice, &roster, 2).unwrap();

    ctx.run(ctx.db.delete_user(alice.name.clone())).unwrap();
    let after = ctx.run(ctx.db.get_roster(roster.game.id)).unwrap();
    assert_eq!(after.slots[2].slot.volunteer_id, None);
    assert_eq!(after.slots[2].volunteer, None);

    let err = ctx.run(ctx.db.delete_user(alice.name)).unwrap_err();
    assert!(is_not_found(&err));
}

#[test]
fn removing_a_match_removes_its_slots() {
    let mut ctx = match Ctx::new() {
        Some(ctx) => ctx,
        None => return,
    };
    let host = ctx.team();
    let roster = ctx.game(&host, 8);
    ctx.run(ctx.db.delete_match(roster.game.id)).unwrap();

    let err = ctx.run(ctx.db.get_roster(roster.game.id)).unwrap_err();
    assert!(is_not_found(&err));
}

#[test]
fn profiles_can_be_edited() {
    let mut ctx = match Ctx::new() {
        Some(ctx) => ctx,
        None => return,
    };
    let team = ctx.team();
    let alice = ctx.user(None);
    let changes = ProfileUpdate {
        username: alice.name.clone(),
        email: alice.email.clone(),
        first_name: "Alice".to_string(),
        last_name: "Liddell".to_string(),
        phone: "555-0100".to_string(),
        home_team: Some(team.id),
    };
    let (user, profile) = ctx.run(ctx.db.update_profile(alice.id, changes)).unwrap();
    assert_eq!(user.name, alice.name);
    assert_eq!(profile.home_team_id, Some(team.id));
    assert_eq!(profile.first_name, "Alice");

    let profile = ctx.run(ctx.db.get_profile(alice.id)).unwrap();
    assert_eq!(profile.phone, "555-0100");
}

#[test]
fn bad_usernames_are_refused_by_the_database() {
    let mut ctx = match Ctx::new() {
        Some(ctx) => ctx,
        None => return,
    };
    let registration = Registration {
        username: "no spaces allowed".to_string(),
        email: "someone@example.com".to_string(),
        home_team: None,
    };
    let err = ctx.run(ctx.db.create_user(registration)).unwrap_err();
    match err.downcast_ref::<DieselError>() {
        Some(DieselError::DatabaseError(_, info)) => {
            assert_eq!(info.constraint_name(), Some("name_fmt"))
        }
        other => panic!("unexpected error {:?}", other),
    }
}

fn assert_still_open(offer: &Offer) {
    assert_eq!(offer.status, OfferStatus::Open);
    assert_eq!(offer.accepted_by, None);
    assert_eq!(offer.closed_at, None);
}

#[test]
fn trades_of_slots_someone_else_claimed_are_stale() {
    let mut ctx = match Ctx::new() {
        Some(ctx) => ctx,
        None => return,
    };
    let host = ctx.team();
    let xavier = ctx.user(None);
    let yvonne = ctx.user(None);
    let zed = ctx.user(None);
    let roster = ctx.game(&host, 9);

    let offer = ctx.offer(&xavier, &roster, 0, OfferKind::Trade);
    let _ = ctx.claim(&yvonne, &roster, 0).unwrap();

    let err = ctx
        .run(ctx.db.accept_offer(zed.id, offer.id, None))
        .unwrap_err();
    assert_eq!(violation(&err), Some(Violation::OfferStale));
    assert_eq!(ctx.holder(&roster, 0), Some(yvonne.id));
    assert_still_open(&ctx.run(ctx.db.get_offer(offer.id)).unwrap());
}

#[test]
fn failed_swaps_change_nothing() {
    let mut ctx = match Ctx::new() {
        Some(ctx) => ctx,
        None => return,
    };
    let host = ctx.team();
    let alice = ctx.user(None);
    let bob = ctx.user(None);
    let first = ctx.game(&host, 10);
    let second = ctx.game(&host, 11);
    let _ = ctx.claim(&alice, &first, 0).unwrap();
    let _ = ctx.claim(&alice, &second, 0).unwrap();
    let _ = ctx.claim(&bob, &second, 1).unwrap();
    let offer = ctx.offer(&alice, &first, 0, OfferKind::Time);

    let give = second.slots[1].slot.id;
    let err = ctx
        .run(ctx.db.accept_offer(bob.id, offer.id, Some(give)))
        .unwrap_err();
    assert_eq!(violation(&err), Some(Violation::SwapIneligible));

    let not_bobs = second.slots[2].slot.id;
    let err = ctx
        .run(ctx.db.accept_offer(bob.id, offer.id, Some(not_bobs)))
        .unwrap_err();
    assert_eq!(violation(&err), Some(Violation::NotYourSlot));

    assert_eq!(ctx.holder(&first, 0), Some(alice.id));
    assert_eq!(ctx.holder(&second, 0), Some(alice.id));
    assert_eq!(ctx.holder(&second, 1), Some(bob.id));
    assert_eq!(ctx.holder(&second, 2), None);
    assert_still_open(&ctx.run(ctx.db.get_offer(offer.id)).unwrap());
}

#[test]
fn full_matches_turn_volunteers_away() {
    let mut ctx = match Ctx::new() {
        Some(ctx) => ctx,
        None => return,
    };
    let host = ctx.team();
    let volunteers = (0..3).map(|_| ctx.user(None)).collect::<Vec<_>>();
    let latecomer = ctx.user(None);
    let roster = ctx.game_with_slots(&host, 12, 4);
    assert_eq!(roster.capacity(), 3);
    for (i, volunteer) in volunteers.iter().enumerate() {
        let _ = ctx.claim(volunteer, &roster, i).unwrap();
    }

    let err = ctx.claim(&latecomer, &roster, 3).unwrap_err();
    assert_eq!(violation(&err), Some(Violation::MatchFull(3)));

    let offer = ctx.offer(&volunteers[0], &roster, 3, OfferKind::Trade);
    let err = ctx
        .run(ctx.db.accept_offer(latecomer.id, offer.id, None))
        .unwrap_err();
    assert_eq!(violation(&err), Some(Violation::MatchFull(3)));
    assert_eq!(ctx.holder(&roster, 3), None);
    assert_still_open(&ctx.run(ctx.db.get_offer(offer.id)).unwrap());
}

#[test]
fn home_team_members_cannot_take_offers() {
    let mut ctx = match Ctx::new() {
        Some(ctx) => ctx,
        None => return,
    };
    let host = ctx.team();
    let alice = ctx.user(None);
    let home = ctx.user(Some(&host));
    let roster = ctx.game(&host, 13);
    let _ = ctx.claim(&alice, &roster, 0).unwrap();
    let offer = ctx.offer(&alice, &roster, 0, OfferKind::Trade);

    let err = ctx
        .run(ctx.db.accept_offer(home.id, offer.id, None))
        .unwrap_err();
    assert_eq!(violation(&err), Some(Violation::OwnTeam));
    assert_eq!(ctx.holder(&roster, 0), Some(alice.id));
    assert_still_open(&ctx.run(ctx.db.get_offer(offer.id)).unwrap());
}
