//! How the offer enums are stored.

use crate::schema::{OfferKind, OfferStatus};
use diesel::{
    deserialize::{self, FromSql},
    pg::Pg,
    serialize::{self, Output, ToSql},
    sql_types::Text,
};
use std::io::Write;

impl ToSql<Text, Pg> for OfferKind {
    fn to_sql<W: Write>(&self, out: &mut Output<W, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<Text, Pg> for OfferKind {
    fn from_sql(bytes: Option<&[u8]>) -> deserialize::Result<Self> {
        match not_none!(bytes) {
            b"trade" => Ok(OfferKind::Trade),
            b"time" => Ok(OfferKind::Time),
            other => Err(format!("Unknown offer kind {:?}", String::from_utf8_lossy(other)).into()),
        }
    }
}

impl ToSql<Text, Pg> for OfferStatus {
    fn to_sql<W: Write>(&self, out: &mut Output<W, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<Text, Pg> for OfferStatus {
    fn from_sql(bytes: Option<&[u8]>) -> deserialize::Result<Self> {
        match not_none!(bytes) {
            b"open" => Ok(OfferStatus::Open),
            b"closed" => Ok(OfferStatus::Closed),
            other => Err(format!("Unknown offer status {:?}", String::from_utf8_lossy(other)).into()),
        }
    }
}
