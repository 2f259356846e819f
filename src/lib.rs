pub mod app;
pub mod model;
pub mod search;
pub mod seating;
pub mod share;

#[cfg(feature = "ssr")]
pub mod config;
#[cfg(feature = "ssr")]
pub mod error;
#[cfg(feature = "ssr")]
pub mod functions;
#[cfg(feature = "ssr")]
pub mod schema;
#[cfg(feature = "ssr")]
pub mod ticket;

#[cfg(feature = "ssr")]
use chrono::{Duration, NaiveDateTime};
#[cfg(feature = "ssr")]
use diesel::connection::SimpleConnection;
#[cfg(feature = "ssr")]
use diesel::prelude::*;
#[cfg(feature = "ssr")]
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
#[cfg(feature = "ssr")]
use diesel::SqliteConnection;
#[cfg(feature = "ssr")]
use rand::prelude::*;
#[cfg(feature = "ssr")]
use std::collections::{HashMap, HashSet};
#[cfg(feature = "ssr")]
use uuid::Uuid;

#[cfg(feature = "ssr")]
use crate::error::RsvpError;
#[cfg(feature = "ssr")]
use crate::model::{
    DiningTable, Guest, GuestKind, GuestStatus, Invite, InviteDetails, InviteForm,
    InviteWithGuests, NewAdminSession, NewDiningTable, NewGuest, NewInvite, NewRsvp, Rsvp,
    RsvpSubmission, RsvpView,
};
#[cfg(feature = "ssr")]
use crate::schema::{admin_sessions, guests, invites, rsvps, tables};
#[cfg(feature = "ssr")]
use crate::search::{normalize_name, parse_companion_name};

#[cfg(feature = "ssr")]
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

#[cfg(feature = "ssr")]
const SCHEMA_SQL: &str =
    include_str!("../migrations/2026-01-10-000000_create_wedding_tables/up.sql");

#[cfg(feature = "ssr")]
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
#[cfg(feature = "ssr")]
const TOKEN_LEN: usize = 8;
#[cfg(feature = "ssr")]
const TOKEN_ATTEMPTS: usize = 5;

#[cfg(feature = "ssr")]
const ADMIN_SESSION_HOURS: i64 = 24;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::*;
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(App);
}

/// Foreign keys on, WAL journal, and a busy timeout for locked writes.
#[cfg(feature = "ssr")]
pub fn configure_connection(conn: &mut SqliteConnection) -> QueryResult<()> {
    conn.batch_execute(
        "PRAGMA foreign_keys = ON; \
        PRAGMA journal_mode = WAL; \
        PRAGMA synchronous = NORMAL; \
        PRAGMA busy_timeout = 10000;",
    )
}

/// Creates any missing table. Safe to run on every start.
#[cfg(feature = "ssr")]
pub fn run_migrations(conn: &mut SqliteConnection) -> QueryResult<()> {
    conn.batch_execute(SCHEMA_SQL)
}

#[cfg(feature = "ssr")]
pub fn establish_connection(database_url: &str) -> Result<SqliteConnection, RsvpError> {
    let mut conn = SqliteConnection::establish(database_url)?;
    configure_connection(&mut conn)?;
    run_migrations(&mut conn)?;
    Ok(conn)
}

#[cfg(feature = "ssr")]
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions;

#[cfg(feature = "ssr")]
impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        configure_connection(conn).map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Builds the connection pool and brings the schema up to date. An in-memory database only
/// lives as long as its connection, so use `max_size = 1` for `:memory:`.
#[cfg(feature = "ssr")]
pub fn build_pool(database_url: &str, max_size: u32) -> Result<DbPool, RsvpError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)?;
    let mut conn = pool.get()?;
    run_migrations(&mut conn)?;
    Ok(pool)
}

/// Runs blocking diesel work on the blocking thread pool with a pooled connection.
#[cfg(feature = "ssr")]
pub async fn run_db<T, F>(pool: &DbPool, f: F) -> Result<T, RsvpError>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T, RsvpError> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        f(&mut conn)
    })
    .await
    .map_err(|e| RsvpError::Task(e.to_string()))?
}

/// Returns an 8 character upper-case alphanumeric token.
#[cfg(feature = "ssr")]
pub fn generate_invite_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// The link sent to the invite holder.
pub fn invite_link(base_url: &str, token: &str) -> String {
    format!("{}/rsvp?token={}", base_url.trim_end_matches('/'), token)
}

/// Works out how many people an RSVP covers. Declining always means zero; attending means at
/// least one, and a missing count means just the guest.
pub fn resolve_guests_count(attending: bool, requested: Option<i64>) -> i32 {
    if !attending {
        return 0;
    }
    requested
        .map(|n| n.clamp(1, i64::from(i32::MAX)))
        .unwrap_or(1) as i32
}

#[cfg(feature = "ssr")]
fn ensure_not_expired(invite: &Invite, now: NaiveDateTime) -> Result<(), RsvpError> {
    match invite.expires_at {
        Some(expires_at) if expires_at < now => Err(RsvpError::InviteExpired),
        _ => Ok(()),
    }
}

#[cfg(feature = "ssr")]
fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A validated invite form: trimmed label, guest names with companion suffixes stripped.
#[cfg(feature = "ssr")]
#[derive(Debug)]
struct CleanInvite {
    label: String,
    max_guests: i32,
    allow_plus_one: bool,
    guests: Vec<(String, GuestKind)>,
}

#[cfg(feature = "ssr")]
fn clean_invite_form(form: &InviteForm) -> Result<CleanInvite, RsvpError> {
    let label = form.label.trim();
    if label.is_empty() {
        return Err(RsvpError::invalid("The invite label is required."));
    }
    if form.max_guests < 1 {
        return Err(RsvpError::invalid("An invite must allow at least one guest."));
    }

    let mut allow_plus_one = form.allow_plus_one;
    let mut seen = HashSet::new();
    let mut guests = Vec::new();
    for guest in &form.guests {
        let name = guest.name.trim();
        if name.is_empty() {
            continue;
        }
        // "Ana e acompanhante" is stored as "Ana" on an invite that allows a plus one.
        let parsed = parse_companion_name(name);
        if parsed.companion_allowed {
            allow_plus_one = true;
        }
        if !seen.insert(normalize_name(&parsed.principal_name)) {
            return Err(RsvpError::invalid(format!(
                "{} is already on this invite.",
                parsed.principal_name
            )));
        }
        guests.push((parsed.principal_name, guest.kind));
    }
    if guests.is_empty() {
        return Err(RsvpError::invalid("Add at least one guest to the invite."));
    }

    Ok(CleanInvite {
        label: label.to_string(),
        max_guests: form.max_guests,
        allow_plus_one,
        guests,
    })
}

#[cfg(feature = "ssr")]
fn insert_guests(
    conn: &mut SqliteConnection,
    invite_id: i32,
    names: &[(String, GuestKind)],
) -> QueryResult<usize> {
    let rows: Vec<NewGuest> = names
        .iter()
        .map(|(name, kind)| NewGuest {
            invite_id,
            name,
            kind: kind.as_str(),
        })
        .collect();
    diesel::insert_into(guests::table)
        .values(&rows)
        .execute(conn)
}

#[cfg(feature = "ssr")]
fn find_invite(conn: &mut SqliteConnection, invite_id: i32) -> Result<Invite, RsvpError> {
    invites::table
        .find(invite_id)
        .select(Invite::as_select())
        .first(conn)
        .optional()?
        .ok_or(RsvpError::InviteNotFound)
}

/// Creates an invite with a fresh token and its guest rows.
// Tokens are short, so make sure the one handed out isn't taken already.
#[cfg(feature = "ssr")]
fn unused_token(
    conn: &mut SqliteConnection,
    mut generate: impl FnMut() -> String,
) -> Result<String, RsvpError> {
    for _ in 0..TOKEN_ATTEMPTS {
        let candidate = generate();
        let taken: i64 = invites::table
            .filter(invites::token.eq(&candidate))
            .count()
            .get_result(conn)?;
        if taken == 0 {
            return Ok(candidate);
        }
    }
    Err(RsvpError::TokenExhausted(TOKEN_ATTEMPTS))
}

#[cfg(feature = "ssr")]
pub fn create_invite(
    conn: &mut SqliteConnection,
    form: &InviteForm,
    event: &str,
    expires_at: Option<NaiveDateTime>,
) -> Result<Invite, RsvpError> {
    let clean = clean_invite_form(form)?;

    conn.transaction::<_, RsvpError, _>(|conn| {
        let token = unused_token(conn, generate_invite_token)?;

        let invite_id: i32 = diesel::insert_into(invites::table)
            .values(&NewInvite {
                token: &token,
                label: &clean.label,
                event,
                max_guests: clean.max_guests,
                allow_plus_one: clean.allow_plus_one,
                expires_at,
            })
            .returning(invites::id)
            .get_result(conn)?;

        insert_guests(conn, invite_id, &clean.guests)?;

        find_invite(conn, invite_id)
    })
}

/// Updates an invite's settings and syncs its guest list by name: names that disappeared are
/// deleted, new names are inserted, and rows for names that stayed are left as they are.
#[cfg(feature = "ssr")]
pub fn update_invite(
    conn: &mut SqliteConnection,
    invite_id: i32,
    form: &InviteForm,
) -> Result<Invite, RsvpError> {
    let clean = clean_invite_form(form)?;

    conn.transaction::<_, RsvpError, _>(|conn| {
        find_invite(conn, invite_id)?;

        diesel::update(invites::table.find(invite_id))
            .set((
                invites::label.eq(&clean.label),
                invites::max_guests.eq(clean.max_guests),
                invites::allow_plus_one.eq(clean.allow_plus_one),
            ))
            .execute(conn)?;

        let existing: Vec<Guest> = guests::table
            .filter(guests::invite_id.eq(invite_id))
            .select(Guest::as_select())
            .load(conn)?;
        let wanted: HashSet<String> = clean
            .guests
            .iter()
            .map(|(name, _)| normalize_name(name))
            .collect();
        let kept: HashSet<String> = existing.iter().map(|g| normalize_name(&g.name)).collect();

        let removed: Vec<i32> = existing
            .iter()
            .filter(|g| !wanted.contains(&normalize_name(&g.name)))
            .map(|g| g.id)
            .collect();
        if !removed.is_empty() {
            diesel::delete(guests::table.filter(guests::id.eq_any(&removed))).execute(conn)?;
        }

        let added: Vec<(String, GuestKind)> = clean
            .guests
            .into_iter()
            .filter(|(name, _)| !kept.contains(&normalize_name(name)))
            .collect();
        if !added.is_empty() {
            insert_guests(conn, invite_id, &added)?;
        }

        find_invite(conn, invite_id)
    })
}

/// Deletes an invite together with its guests and RSVP. Returns the number of invites deleted.
#[cfg(feature = "ssr")]
pub fn delete_invite(conn: &mut SqliteConnection, invite_id: i32) -> Result<usize, RsvpError> {
    conn.transaction::<_, RsvpError, _>(|conn| {
        diesel::delete(rsvps::table.filter(rsvps::invite_id.eq(invite_id))).execute(conn)?;
        diesel::delete(guests::table.filter(guests::invite_id.eq(invite_id))).execute(conn)?;
        let deleted = diesel::delete(invites::table.find(invite_id)).execute(conn)?;
        Ok(deleted)
    })
}

/// Returns all invites, newest first, each with its guests and whether it has been answered.
#[cfg(feature = "ssr")]
pub fn get_all_invites_with_guests(
    conn: &mut SqliteConnection,
) -> Result<Vec<InviteWithGuests>, RsvpError> {
    let all_invites: Vec<Invite> = invites::table
        .order((invites::created_at.desc(), invites::id.desc()))
        .select(Invite::as_select())
        .load(conn)?;
    let all_guests: Vec<Guest> = guests::table
        .order(guests::id.asc())
        .select(Guest::as_select())
        .load(conn)?;
    let answered: HashSet<i32> = rsvps::table
        .select(rsvps::invite_id)
        .load::<i32>(conn)?
        .into_iter()
        .collect();

    let mut by_invite: HashMap<i32, Vec<Guest>> = HashMap::new();
    for guest in all_guests {
        by_invite.entry(guest.invite_id).or_default().push(guest);
    }

    Ok(all_invites
        .into_iter()
        .map(|invite| InviteWithGuests {
            guests: by_invite.remove(&invite.id).unwrap_or_default(),
            has_rsvp: answered.contains(&invite.id),
            invite,
        })
        .collect())
}

/// One search group per invite, named after its label.
pub fn guest_groups(invites: &[model::InviteWithGuests]) -> Vec<search::GuestGroup> {
    invites
        .iter()
        .map(|entry| search::GuestGroup {
            id: entry.invite.id,
            name: entry.invite.label.clone(),
            max_guests: Some(entry.invite.max_guests),
            guests: entry.guests.iter().map(|g| g.name.clone()).collect(),
        })
        .collect()
}

/// Looks up the invite behind a token and checks that it hasn't expired.
#[cfg(feature = "ssr")]
pub fn get_invite_by_token(
    conn: &mut SqliteConnection,
    token: &str,
    now: NaiveDateTime,
) -> Result<InviteDetails, RsvpError> {
    if token.trim().is_empty() {
        return Err(RsvpError::MissingToken);
    }

    let invite: Invite = invites::table
        .filter(invites::token.eq(token))
        .select(Invite::as_select())
        .first(conn)
        .optional()?
        .ok_or(RsvpError::InviteNotFound)?;
    ensure_not_expired(&invite, now)?;

    let invite_guests: Vec<Guest> = guests::table
        .filter(guests::invite_id.eq(invite.id))
        .order(guests::id.asc())
        .select(Guest::as_select())
        .load(conn)?;

    Ok(InviteDetails {
        invite_id: invite.id,
        label: invite.label,
        max_guests: invite.max_guests,
        allow_plus_one: invite.allow_plus_one,
        event: invite.event,
        guests: invite_guests.into_iter().map(Into::into).collect(),
    })
}

/// Records the answer to an invite. A second submission for the same invite overwrites the
/// first. The seat stays reserved while the guest still attends and the party still fits at the
/// table; it is released on decline or when a bigger party would overfill the table.
#[cfg(feature = "ssr")]
pub fn submit_rsvp(
    conn: &mut SqliteConnection,
    submission: &RsvpSubmission,
    now: NaiveDateTime,
) -> Result<Rsvp, RsvpError> {
    let invite_id = submission
        .invite_id
        .ok_or(RsvpError::MissingField("invite_id"))?;
    let guest_name =
        trimmed(submission.guest_name.as_deref()).ok_or(RsvpError::MissingField("guest_name"))?;
    let attending = submission
        .attending
        .ok_or(RsvpError::MissingField("attending"))?;

    conn.immediate_transaction::<_, RsvpError, _>(|conn| {
        let invite = find_invite(conn, invite_id)?;
        ensure_not_expired(&invite, now)?;

        let guests_count = resolve_guests_count(attending, submission.guests_count);
        if attending && guests_count > invite.max_guests {
            return Err(RsvpError::TooManyGuests {
                requested: guests_count,
                allowed: invite.max_guests,
            });
        }

        let row = NewRsvp {
            invite_id,
            guest_name,
            attending,
            guests_count,
            phone: trimmed(submission.phone.as_deref()),
            message: trimmed(submission.message.as_deref()),
            updated_at: now,
        };
        diesel::insert_into(rsvps::table)
            .values(&row)
            .on_conflict(rsvps::invite_id)
            .do_update()
            .set(&row)
            .execute(conn)?;

        let mut rsvp: Rsvp = rsvps::table
            .filter(rsvps::invite_id.eq(invite_id))
            .select(Rsvp::as_select())
            .first(conn)?;
        if let Some(table_name) = rsvp.table_assignment.clone() {
            if !attending || !party_fits(conn, &table_name, rsvp.id, guests_count)? {
                diesel::update(rsvps::table.find(rsvp.id))
                    .set(rsvps::table_assignment.eq(None::<String>))
                    .execute(conn)?;
                if attending {
                    tracing::warn!(
                        rsvp_id = rsvp.id,
                        table = %table_name,
                        guests_count,
                        "party no longer fits, seat released"
                    );
                }
                rsvp.table_assignment = None;
            }
        }

        diesel::update(guests::table.filter(guests::invite_id.eq(invite_id)))
            .set(guests::status.eq(GuestStatus::Responded.as_str()))
            .execute(conn)?;

        Ok(rsvp)
    })
}

// Whether `guests_count` people still fit at the table next to everyone else seated there.
#[cfg(feature = "ssr")]
fn party_fits(
    conn: &mut SqliteConnection,
    table_name: &str,
    rsvp_id: i32,
    guests_count: i32,
) -> Result<bool, RsvpError> {
    let capacity: Option<i32> = tables::table
        .filter(tables::name.eq(table_name))
        .select(tables::capacity)
        .first(conn)
        .optional()?;
    let Some(capacity) = capacity else {
        return Ok(false);
    };
    Ok(occupied_seats(conn, table_name, Some(rsvp_id))? + guests_count <= capacity)
}

#[cfg(feature = "ssr")]
pub fn get_rsvp_for_invite(
    conn: &mut SqliteConnection,
    invite_id: i32,
) -> Result<Option<Rsvp>, RsvpError> {
    Ok(rsvps::table
        .filter(rsvps::invite_id.eq(invite_id))
        .select(Rsvp::as_select())
        .first(conn)
        .optional()?)
}

/// Returns every RSVP with its invite's label and token, newest first.
#[cfg(feature = "ssr")]
pub fn get_all_rsvps(conn: &mut SqliteConnection) -> Result<Vec<RsvpView>, RsvpError> {
    Ok(rsvps::table
        .inner_join(invites::table)
        .select((
            rsvps::id,
            rsvps::invite_id,
            rsvps::guest_name,
            rsvps::attending,
            rsvps::guests_count,
            rsvps::phone,
            rsvps::message,
            rsvps::table_assignment,
            rsvps::created_at,
            invites::label,
            invites::token,
        ))
        .order((rsvps::created_at.desc(), rsvps::id.desc()))
        .load::<RsvpView>(conn)?)
}

/// Fetches all tables, ordered by name.
#[cfg(feature = "ssr")]
pub fn get_all_tables(conn: &mut SqliteConnection) -> Result<Vec<DiningTable>, RsvpError> {
    Ok(tables::table
        .order(tables::name.asc())
        .select(DiningTable::as_select())
        .load(conn)?)
}

#[cfg(feature = "ssr")]
fn find_table(conn: &mut SqliteConnection, table_id: i32) -> Result<DiningTable, RsvpError> {
    tables::table
        .find(table_id)
        .select(DiningTable::as_select())
        .first(conn)
        .optional()?
        .ok_or(RsvpError::TableNotFound)
}

/// Seats taken at a table by attending RSVPs, optionally leaving one RSVP out of the count.
#[cfg(feature = "ssr")]
fn occupied_seats(
    conn: &mut SqliteConnection,
    table_name: &str,
    except_rsvp: Option<i32>,
) -> QueryResult<i32> {
    let mut query = rsvps::table
        .filter(rsvps::attending.eq(true))
        .filter(rsvps::table_assignment.eq(table_name))
        .select(rsvps::guests_count)
        .into_boxed();
    if let Some(rsvp_id) = except_rsvp {
        query = query.filter(rsvps::id.ne(rsvp_id));
    }
    Ok(query.load::<i32>(conn)?.into_iter().sum())
}

#[cfg(feature = "ssr")]
pub fn create_table(
    conn: &mut SqliteConnection,
    name: &str,
    capacity: i32,
) -> Result<DiningTable, RsvpError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RsvpError::invalid("The table name is required."));
    }
    if capacity < 1 {
        return Err(RsvpError::invalid("A table needs at least one seat."));
    }

    conn.transaction::<_, RsvpError, _>(|conn| {
        let existing: i64 = tables::table
            .filter(tables::name.eq(name))
            .count()
            .get_result(conn)?;
        if existing > 0 {
            return Err(RsvpError::DuplicateTable(name.to_string()));
        }

        let table_id: i32 = diesel::insert_into(tables::table)
            .values(&NewDiningTable { name, capacity })
            .returning(tables::id)
            .get_result(conn)?;
        find_table(conn, table_id)
    })
}

/// Changes a table's capacity. It can't drop below the seats already taken.
#[cfg(feature = "ssr")]
pub fn update_table_capacity(
    conn: &mut SqliteConnection,
    table_id: i32,
    capacity: i32,
) -> Result<DiningTable, RsvpError> {
    if capacity < 1 {
        return Err(RsvpError::invalid("A table needs at least one seat."));
    }

    conn.transaction::<_, RsvpError, _>(|conn| {
        let table = find_table(conn, table_id)?;
        let occupied = occupied_seats(conn, &table.name, None)?;
        if capacity < occupied {
            return Err(RsvpError::invalid(format!(
                "{} already seats {} guests.",
                table.name, occupied
            )));
        }
        diesel::update(tables::table.find(table_id))
            .set(tables::capacity.eq(capacity))
            .execute(conn)?;
        find_table(conn, table_id)
    })
}

/// Deletes an empty table. Refuses while any attending guest is seated there.
#[cfg(feature = "ssr")]
pub fn delete_table(conn: &mut SqliteConnection, table_id: i32) -> Result<(), RsvpError> {
    conn.transaction::<_, RsvpError, _>(|conn| {
        let table = find_table(conn, table_id)?;
        if occupied_seats(conn, &table.name, None)? > 0 {
            return Err(RsvpError::TableOccupied(table.name));
        }
        // Declined RSVPs may still point at the table by name.
        diesel::update(rsvps::table.filter(rsvps::table_assignment.eq(&table.name)))
            .set(rsvps::table_assignment.eq(None::<String>))
            .execute(conn)?;
        diesel::delete(tables::table.find(table_id)).execute(conn)?;
        Ok(())
    })
}

/// Seats an attending RSVP's whole party at a table. Runs in an IMMEDIATE transaction so the
/// free-seat check and the update can't interleave with another admin's assignment.
#[cfg(feature = "ssr")]
pub fn assign_rsvp_to_table(
    conn: &mut SqliteConnection,
    rsvp_id: i32,
    table_name: &str,
) -> Result<Rsvp, RsvpError> {
    conn.immediate_transaction::<_, RsvpError, _>(|conn| {
        let rsvp: Rsvp = rsvps::table
            .find(rsvp_id)
            .select(Rsvp::as_select())
            .first(conn)
            .optional()?
            .ok_or(RsvpError::RsvpNotFound)?;
        if !rsvp.attending {
            return Err(RsvpError::invalid(
                "Only guests who confirmed attendance can be seated.",
            ));
        }

        let table: DiningTable = tables::table
            .filter(tables::name.eq(table_name))
            .select(DiningTable::as_select())
            .first(conn)
            .optional()?
            .ok_or(RsvpError::TableNotFound)?;

        let free = table.capacity - occupied_seats(conn, &table.name, Some(rsvp_id))?;
        if rsvp.guests_count > free {
            return Err(RsvpError::TableFull {
                name: table.name,
                free: free.max(0),
                needed: rsvp.guests_count,
            });
        }

        diesel::update(rsvps::table.find(rsvp_id))
            .set(rsvps::table_assignment.eq(Some(table.name.as_str())))
            .execute(conn)?;

        Ok(rsvps::table
            .find(rsvp_id)
            .select(Rsvp::as_select())
            .first(conn)?)
    })
}

#[cfg(feature = "ssr")]
pub fn unassign_rsvp(conn: &mut SqliteConnection, rsvp_id: i32) -> Result<Rsvp, RsvpError> {
    let updated = diesel::update(rsvps::table.find(rsvp_id))
        .set(rsvps::table_assignment.eq(None::<String>))
        .execute(conn)?;
    if updated == 0 {
        return Err(RsvpError::RsvpNotFound);
    }
    Ok(rsvps::table
        .find(rsvp_id)
        .select(Rsvp::as_select())
        .first(conn)?)
}

/// Creates an admin session that lasts a day and returns its token.
#[cfg(feature = "ssr")]
pub fn create_admin_session(
    conn: &mut SqliteConnection,
    now: NaiveDateTime,
) -> Result<String, RsvpError> {
    let token_str = Uuid::new_v4().to_string();
    diesel::insert_into(admin_sessions::table)
        .values(&NewAdminSession {
            token: token_str.clone(),
            expires_at: Some(now + Duration::hours(ADMIN_SESSION_HOURS)),
        })
        .execute(conn)?;
    Ok(token_str)
}

/// Validates an admin token. Returns true if it exists and hasn't expired.
#[cfg(feature = "ssr")]
pub fn validate_admin_token(
    conn: &mut SqliteConnection,
    token: &str,
    now: NaiveDateTime,
) -> Result<bool, RsvpError> {
    if Uuid::parse_str(token).is_err() {
        return Ok(false);
    }
    let count: i64 = admin_sessions::table
        .filter(admin_sessions::token.eq(token))
        .filter(
            admin_sessions::expires_at
                .is_null()
                .or(admin_sessions::expires_at.gt(now)),
        )
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

#[cfg(feature = "ssr")]
pub fn delete_admin_session(conn: &mut SqliteConnection, token: &str) -> Result<usize, RsvpError> {
    Ok(diesel::delete(admin_sessions::table.filter(admin_sessions::token.eq(token))).execute(conn)?)
}

/// Deletes every RSVP and puts all guests back to pending. Invites and tables are kept.
#[cfg(feature = "ssr")]
pub fn clear_rsvps(conn: &mut SqliteConnection) -> Result<usize, RsvpError> {
    conn.transaction::<_, RsvpError, _>(|conn| {
        let deleted = diesel::delete(rsvps::table).execute(conn)?;
        diesel::update(guests::table)
            .set(guests::status.eq(GuestStatus::Pending.as_str()))
            .execute(conn)?;
        Ok(deleted)
    })
}

/// Empties the whole database.
#[cfg(feature = "ssr")]
pub fn reset_database(conn: &mut SqliteConnection) -> Result<(), RsvpError> {
    conn.transaction::<_, RsvpError, _>(|conn| {
        diesel::delete(admin_sessions::table).execute(conn)?;
        diesel::delete(rsvps::table).execute(conn)?;
        diesel::delete(guests::table).execute(conn)?;
        diesel::delete(invites::table).execute(conn)?;
        diesel::delete(tables::table).execute(conn)?;
        Ok(())
    })
}
