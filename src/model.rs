use chrono::NaiveDateTime;
#[cfg(feature = "ssr")]
use diesel::prelude::*;
#[cfg(feature = "ssr")]
use diesel::sqlite::Sqlite;
use serde::{Deserialize, Serialize};

/// Whether a guest is the named invitee or someone they bring along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GuestKind {
    #[default]
    Principal,
    Companion,
}

impl GuestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuestKind::Principal => "principal",
            GuestKind::Companion => "companion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestStatus {
    Pending,
    Responded,
}

impl GuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuestStatus::Pending => "pending",
            GuestStatus::Responded => "responded",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ssr", derive(Queryable, Selectable))]
#[cfg_attr(feature = "ssr", diesel(table_name = crate::schema::invites))]
#[cfg_attr(feature = "ssr", diesel(check_for_backend(Sqlite)))]
pub struct Invite {
    pub id: i32,
    pub token: String,
    pub label: String,
    pub event: String,
    pub max_guests: i32,
    pub allow_plus_one: bool,
    pub expires_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[cfg(feature = "ssr")]
#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::invites)]
pub struct NewInvite<'a> {
    pub token: &'a str,
    pub label: &'a str,
    pub event: &'a str,
    pub max_guests: i32,
    pub allow_plus_one: bool,
    pub expires_at: Option<NaiveDateTime>,
    // created_at uses default
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ssr", derive(Queryable, Selectable))]
#[cfg_attr(feature = "ssr", diesel(table_name = crate::schema::guests))]
#[cfg_attr(feature = "ssr", diesel(check_for_backend(Sqlite)))]
pub struct Guest {
    pub id: i32,
    pub invite_id: i32,
    pub name: String,
    pub kind: String,
    pub status: String,
    pub created_at: NaiveDateTime,
}

#[cfg(feature = "ssr")]
#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::guests)]
pub struct NewGuest<'a> {
    pub invite_id: i32,
    pub name: &'a str,
    pub kind: &'a str,
    // status and created_at use defaults
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "ssr", derive(Queryable, Selectable))]
#[cfg_attr(feature = "ssr", diesel(table_name = crate::schema::rsvps))]
#[cfg_attr(feature = "ssr", diesel(check_for_backend(Sqlite)))]
pub struct Rsvp {
    pub id: i32,
    pub invite_id: i32,
    pub guest_name: String,
    pub attending: bool,
    pub guests_count: i32,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub table_assignment: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Row written by an RSVP submission. Doubles as the changeset of the upsert, so a NULL phone
/// or message overwrites whatever the previous submission stored.
#[cfg(feature = "ssr")]
#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = crate::schema::rsvps)]
#[diesel(treat_none_as_null = true)]
pub struct NewRsvp<'a> {
    pub invite_id: i32,
    pub guest_name: &'a str,
    pub attending: bool,
    pub guests_count: i32,
    pub phone: Option<&'a str>,
    pub message: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "ssr", derive(Queryable, Selectable))]
#[cfg_attr(feature = "ssr", diesel(table_name = crate::schema::tables))]
#[cfg_attr(feature = "ssr", diesel(check_for_backend(Sqlite)))]
pub struct DiningTable {
    pub id: i32,
    pub name: String,
    pub capacity: i32,
    pub created_at: NaiveDateTime,
}

#[cfg(feature = "ssr")]
#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::tables)]
pub struct NewDiningTable<'a> {
    pub name: &'a str,
    pub capacity: i32,
}

#[cfg(feature = "ssr")]
#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::admin_sessions)]
pub struct NewAdminSession {
    pub token: String,
    pub expires_at: Option<NaiveDateTime>,
}

/// Guest as exposed to the invite holder. `kind` goes over the wire as `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuestSummary {
    pub id: i32,
    pub name: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<Guest> for GuestSummary {
    fn from(guest: Guest) -> Self {
        GuestSummary {
            id: guest.id,
            name: guest.name,
            status: guest.status,
            kind: guest.kind,
        }
    }
}

/// What a valid token unlocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InviteDetails {
    pub invite_id: i32,
    pub label: String,
    pub max_guests: i32,
    pub allow_plus_one: bool,
    pub event: String,
    pub guests: Vec<GuestSummary>,
}

/// An invite with its guest rows, as listed on the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteWithGuests {
    pub invite: Invite,
    pub guests: Vec<Guest>,
    pub has_rsvp: bool,
}

/// An RSVP joined with the label and token of its invite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "ssr", derive(Queryable))]
pub struct RsvpView {
    pub id: i32,
    pub invite_id: i32,
    pub guest_name: String,
    pub attending: bool,
    pub guests_count: i32,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub table_assignment: Option<String>,
    pub created_at: NaiveDateTime,
    pub invite_label: String,
    pub invite_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuestForm {
    pub name: String,
    #[serde(default)]
    pub kind: GuestKind,
}

/// Admin input for creating or editing an invite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InviteForm {
    pub label: String,
    pub max_guests: i32,
    pub allow_plus_one: bool,
    pub guests: Vec<GuestForm>,
}

/// An RSVP as submitted by the invite holder. Every field is optional so that missing ones can
/// be reported by name.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RsvpSubmission {
    pub invite_id: Option<i32>,
    pub guest_name: Option<String>,
    pub attending: Option<bool>,
    pub guests_count: Option<i64>,
    pub phone: Option<String>,
    pub message: Option<String>,
}

/// A stored ticket for a confirmed RSVP.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketInfo {
    pub rsvp_id: i32,
    pub guest_name: String,
    pub table_name: String,
    pub url: String,
    pub download_name: String,
}
