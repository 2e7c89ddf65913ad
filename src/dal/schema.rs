table! {
    auths (id) {
        id -> Uuid,
        userid -> Int4,
    }
}

table! {
    home_teams (id) {
        id -> Int4,
        name -> Varchar,
    }
}

table! {
    matches (id) {
        id -> Int4,
        date -> Date,
        start_time -> Time,
        home_team_id -> Int4,
        guest_team -> Varchar,
        location -> Varchar,
    }
}

table! {
    offers (id) {
        id -> Int4,
        slot_id -> Int4,
        user_id -> Int4,
        kind -> Varchar,
        status -> Varchar,
        details -> Text,
        created_at -> Timestamptz,
        accepted_by -> Nullable<Int4>,
        closed_at -> Nullable<Timestamptz>,
    }
}

table! {
    profiles (user_id) {
        user_id -> Int4,
        home_team_id -> Nullable<Int4>,
        first_name -> Varchar,
        last_name -> Varchar,
        phone -> Varchar,
    }
}

table! {
    slots (id) {
        id -> Int4,
        match_id -> Int4,
        volunteer_id -> Nullable<Int4>,
    }
}

table! {
    users (id) {
        id -> Int4,
        name -> Varchar,
        email -> Varchar,
    }
}

joinable!(auths -> users (userid));
joinable!(matches -> home_teams (home_team_id));
joinable!(offers -> slots (slot_id));
joinable!(offers -> users (user_id));
joinable!(profiles -> home_teams (home_team_id));
joinable!(profiles -> users (user_id));
joinable!(slots -> matches (match_id));
joinable!(slots -> users (volunteer_id));

allow_tables_to_appear_in_same_query!(
    auths,
    home_teams,
    matches,
    offers,
    profiles,
    slots,
    users,
);
