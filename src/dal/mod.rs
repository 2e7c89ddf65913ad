//! Bindings to the database.
//!
//! > **DAL**, for lack of a better term (borrowing this one from "data access layer" since I don't
//! > want to use "model"), is the only module that does any talking to the database, or any other
//! > IO or interaction with other kinds of externalized state for that matter.

mod matches;
mod offers;
#[allow(proc_macro_derive_resolution_fallback, unused_import_braces)]
mod schema;
mod types;

embed_migrations!("migrations");

use crate::{
    dal::schema::{auths, home_teams, profiles, users},
    schema::{HomeTeam, Profile, ProfileUpdate, Registration, User},
    util::blocking,
};
use diesel::{
    dsl::{delete, insert_into, update},
    prelude::*,
    r2d2::{ConnectionManager, Pool},
    result::Error as DieselError,
};
use failure::Error;
use futures::{
    future::{err, Either},
    Future,
};
use log::info;
use std::sync::Arc;
use uuid::Uuid;

/// A pool of connections to the database.
#[allow(missing_debug_implementations)]
#[derive(Clone)]
pub struct DB {
    pool: Arc<Pool<ConnectionManager<PgConnection>>>,
}

impl DB {
    /// Connects to the database with at the given URL, bringing its tables up to date.
    pub fn connect(database_url: &str) -> Result<DB, Error> {
        let pool = Arc::new(Pool::new(ConnectionManager::new(database_url))?);
        embedded_migrations::run(&*pool.get()?)?;
        Ok(DB { pool })
    }

    /// Creates a new authentication token for the given user.
    pub fn create_auth(&self, user: i32) -> impl Future<Item = Uuid, Error = Error> {
        self.async_query(move |conn| insert_auth(conn, user))
    }

    /// Creates a home team with the given name.
    pub fn create_team(&self, name: String) -> impl Future<Item = HomeTeam, Error = Error> {
        self.async_query(move |conn| {
            insert_into(home_teams::table)
                .values(home_teams::name.eq(&name))
                .get_result(conn)
        })
    }

    /// Creates a user along with their profile, returning the user and a fresh authentication
    /// token for them.
    pub fn create_user(
        &self,
        registration: Registration,
    ) -> impl Future<Item = (User, Uuid), Error = Error> {
        self.async_query(move |conn| {
            conn.transaction::<_, DieselError, _>(|| {
                let user: User = insert_into(users::table)
                    .values((
                        users::name.eq(&registration.username),
                        users::email.eq(&registration.email),
                    ))
                    .get_result(conn)?;
                let _ = insert_into(profiles::table)
                    .values((
                        profiles::user_id.eq(user.id),
                        profiles::home_team_id.eq(registration.home_team),
                    ))
                    .execute(conn)?;
                let token = insert_auth(conn, user.id)?;
                info!("Registered {} (#{})", user.name, user.id);
                Ok((user, token))
            })
        })
    }

    /// Revokes an authentication token. Unknown tokens are ignored.
    pub fn delete_auth(&self, token: Uuid) -> impl Future<Item = (), Error = Error> {
        self.async_query(move |conn| delete(auths::table.find(token)).execute(conn).map(|_| ()))
    }

    /// Deletes a user. Slots they held are left open; their profile, tokens and offers go with
    /// them.
    pub fn delete_user(&self, username: String) -> impl Future<Item = (), Error = Error> {
        self.async_query(move |conn| {
            let n = delete(users::table.filter(users::name.eq(&username))).execute(conn)?;
            if n == 0 {
                Err(DieselError::NotFound)
            } else {
                info!("Removed user {}", username);
                Ok(())
            }
        })
    }

    /// Looks up an authentication record, returning the ID of the user it corresponds to.
    pub fn get_auth_user(&self, auth: Uuid) -> impl Future<Item = i32, Error = Error> {
        self.async_query(move |conn| {
            auths::table
                .find(auth)
                .select(auths::userid)
                .get_result(conn)
        })
    }

    /// Gets a user's profile, creating an empty one if they don't have one yet.
    pub fn get_profile(&self, user: i32) -> impl Future<Item = Profile, Error = Error> {
        self.async_query(move |conn| ensure_profile(conn, user))
    }

    /// Gets a home team by ID.
    pub fn get_team(&self, team: i32) -> impl Future<Item = HomeTeam, Error = Error> {
        self.async_query(move |conn| home_teams::table.find(team).get_result::<HomeTeam>(conn))
    }

    /// Gets a user by ID.
    pub fn get_user(&self, user: i32) -> impl Future<Item = User, Error = Error> {
        self.async_query(move |conn| users::table.find(user).get_result(conn))
    }

    /// Gets a user by username.
    pub fn get_user_by_username(
        &self,
        username: String,
    ) -> impl Future<Item = User, Error = Error> {
        self.async_query(move |conn| {
            users::table
                .filter(users::name.eq(&username))
                .get_result(conn)
        })
    }

    /// Lists every home team, by name.
    pub fn list_teams(&self) -> impl Future<Item = Vec<HomeTeam>, Error = Error> {
        self.async_query(move |conn| home_teams::table.order(home_teams::name).load(conn))
    }

    /// Replaces a user's account details and profile.
    pub fn update_profile(
        &self,
        user: i32,
        changes: ProfileUpdate,
    ) -> impl Future<Item = (User, Profile), Error = Error> {
        self.async_query(move |conn| {
            conn.transaction::<_, DieselError, _>(|| {
                let _ = ensure_profile(conn, user)?;
                let account: User = update(users::table.find(user))
                    .set((
                        users::name.eq(&changes.username),
                        users::email.eq(&changes.email),
                    ))
                    .get_result(conn)?;
                let profile: Profile = update(profiles::table.find(user))
                    .set((
                        profiles::home_team_id.eq(changes.home_team),
                        profiles::first_name.eq(&changes.first_name),
                        profiles::last_name.eq(&changes.last_name),
                        profiles::phone.eq(&changes.phone),
                    ))
                    .get_result(conn)?;
                Ok((account, profile))
            })
        })
    }

    /// Performs a query "asynchronously" (but not really). Diesel currently does not support
    /// async/futures, so we use `crate::util::blocking` so the database operations don't block
    /// the thread. This does, however, require the future to be run inside a threadpool.
    ///
    /// NOTE: In theory, this is now the bottleneck for most operations -- we can only have as
    /// many concurrent database operations as threads in the tokio thread pool. If latency
    /// problems are noted, create the thread pool to have `max_blocking < pool_size`.
    fn async_query<E, F, T>(&self, func: F) -> impl Future<Item = T, Error = Error>
    where
        E: Into<Error>,
        F: FnOnce(&PgConnection) -> Result<T, E>,
    {
        match self.pool.get() {
            Ok(conn) => Either::A(blocking(move || func(&*conn))),
            Err(e) => Either::B(err(e.into())),
        }
    }
}

/// The home team of a user, if they have one.
fn home_team_of(conn: &PgConnection, user: i32) -> QueryResult<Option<i32>> {
    profiles::table
        .find(user)
        .select(profiles::home_team_id)
        .get_result::<Option<i32>>(conn)
        .optional()
        .map(Option::flatten)
}

fn ensure_profile(conn: &PgConnection, user: i32) -> QueryResult<Profile> {
    let _ = insert_into(profiles::table)
        .values(profiles::user_id.eq(user))
        .on_conflict_do_nothing()
        .execute(conn)?;
    profiles::table.find(user).get_result(conn)
}

fn insert_auth(conn: &PgConnection, user: i32) -> QueryResult<Uuid> {
    let token = Uuid::new_v4();
    insert_into(auths::table)
        .values((auths::id.eq(token), auths::userid.eq(user)))
        .execute(conn)
        .map(|_| token)
}
