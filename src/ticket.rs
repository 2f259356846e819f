//! Entry tickets: a QR code of the guest's invite link, written to disk and served statically.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use diesel::SqliteConnection;
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};

use crate::config::AppConfig;
use crate::error::RsvpError;
use crate::model::TicketInfo;
use crate::search::normalize_name;
use crate::seating::short_table_name;
use crate::{get_invite_by_token, get_rsvp_for_invite, invite_link};

const QR_MIN_SIZE: u32 = 240;

/// URL path the ticket directory is served under.
pub const TICKETS_ROUTE: &str = "/tickets";

pub fn render_ticket_svg(payload: &str) -> Result<String, RsvpError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
        .map_err(|e| RsvpError::Ticket(e.to_string()))?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
        .dark_color(svg::Color("#2f2a24"))
        .light_color(svg::Color("#fffdf8"))
        .build())
}

/// Download name for a guest's ticket, e.g. `invite-joao-simoes.svg`.
pub fn safe_filename(name: &str, extension: &str) -> String {
    let mut slug = String::new();
    for c in normalize_name(name).chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    format!("invite-{}.{}", slug.trim_matches('-'), extension)
}

/// Directory-backed store for generated tickets.
#[derive(Debug, Clone)]
pub struct TicketStore {
    root: PathBuf,
    public_base_url: String,
}

impl TicketStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.ticket_dir.clone(), &config.public_base_url)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the ticket and returns the URL it is served at. Names carry the timestamp, so
    /// reissuing never overwrites a ticket someone already downloaded.
    pub fn put(&self, rsvp_id: i32, svg: &str, now: NaiveDateTime) -> Result<String, RsvpError> {
        fs::create_dir_all(&self.root)?;
        let file_name = format!("ticket-{}-{}.svg", rsvp_id, now.and_utc().timestamp());
        fs::write(self.root.join(&file_name), svg)?;
        Ok(format!(
            "{}{}/{}",
            self.public_base_url, TICKETS_ROUTE, file_name
        ))
    }
}

/// Issues a ticket for the invite behind `token`. Only attending guests get one.
pub fn issue_ticket(
    conn: &mut SqliteConnection,
    store: &TicketStore,
    token: &str,
    base_url: &str,
    now: NaiveDateTime,
) -> Result<TicketInfo, RsvpError> {
    let invite = get_invite_by_token(conn, token, now)?;
    let rsvp = get_rsvp_for_invite(conn, invite.invite_id)?.ok_or(RsvpError::RsvpNotFound)?;
    if !rsvp.attending {
        return Err(RsvpError::invalid(
            "Tickets are only issued to guests who confirmed attendance.",
        ));
    }

    let svg = render_ticket_svg(&invite_link(base_url, token))?;
    let url = store.put(rsvp.id, &svg, now)?;
    tracing::info!(rsvp_id = rsvp.id, %url, "ticket issued");

    Ok(TicketInfo {
        rsvp_id: rsvp.id,
        table_name: short_table_name(rsvp.table_assignment.as_deref()),
        download_name: safe_filename(&rsvp.guest_name, "svg"),
        guest_name: rsvp.guest_name,
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GuestForm, GuestKind, InviteForm, RsvpSubmission};
    use crate::seating::UNASSIGNED_TABLE_NAME;
    use crate::{
        assign_rsvp_to_table, create_invite, create_table, establish_connection, submit_rsvp,
    };
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 20)
            .and_then(|d| d.and_hms_opt(18, 30, 0))
            .unwrap()
    }

    fn temp_store() -> TicketStore {
        let dir = std::env::temp_dir().join(format!("wedding-tickets-{}", Uuid::new_v4()));
        TicketStore::new(dir, "http://localhost:3000/")
    }

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("João Simões", "svg"), "invite-joao-simoes.svg");
        assert_eq!(safe_filename("  Ana & Rui!! ", "png"), "invite-ana-rui.png");
        assert_eq!(safe_filename("O'Neil--Smith", "pdf"), "invite-o-neil-smith.pdf");
    }

    #[test]
    fn test_render_ticket_svg() {
        let svg = render_ticket_svg("http://localhost:3000/rsvp?token=ABCD1234").unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("#2f2a24"));
    }

    #[test]
    fn test_store_put_writes_file() {
        let store = temp_store();
        let url = store.put(7, "<svg/>", now()).unwrap();
        let ts = now().and_utc().timestamp();
        assert_eq!(
            url,
            format!("http://localhost:3000/tickets/ticket-7-{}.svg", ts)
        );
        let written = fs::read_to_string(store.root().join(format!("ticket-7-{}.svg", ts)));
        assert_eq!(written.unwrap(), "<svg/>");
        fs::remove_dir_all(store.root()).ok();
    }

    #[test]
    fn test_issue_ticket() {
        let mut conn = establish_connection(":memory:").unwrap();
        let store = temp_store();
        let form = InviteForm {
            label: "Ribeiro".to_string(),
            max_guests: 2,
            allow_plus_one: false,
            guests: vec![GuestForm {
                name: "Inês Ribeiro".to_string(),
                kind: GuestKind::Principal,
            }],
        };
        let invite = create_invite(&mut conn, &form, "Wedding", None).unwrap();

        // No answer yet.
        let err = issue_ticket(&mut conn, &store, &invite.token, "http://x", now()).unwrap_err();
        assert!(matches!(err, RsvpError::RsvpNotFound));

        let mut submission = RsvpSubmission {
            invite_id: Some(invite.id),
            guest_name: Some("Inês Ribeiro".to_string()),
            attending: Some(false),
            ..Default::default()
        };
        submit_rsvp(&mut conn, &submission, now()).unwrap();
        let err = issue_ticket(&mut conn, &store, &invite.token, "http://x", now()).unwrap_err();
        assert!(matches!(err, RsvpError::InvalidInput(_)));

        submission.attending = Some(true);
        let rsvp = submit_rsvp(&mut conn, &submission, now()).unwrap();
        let ticket = issue_ticket(&mut conn, &store, &invite.token, "http://x", now()).unwrap();
        assert_eq!(ticket.rsvp_id, rsvp.id);
        assert_eq!(ticket.table_name, UNASSIGNED_TABLE_NAME);
        assert_eq!(ticket.download_name, "invite-ines-ribeiro.svg");
        assert!(ticket.url.starts_with("http://localhost:3000/tickets/ticket-"));

        create_table(&mut conn, "Garden - Table 4", 8).unwrap();
        assign_rsvp_to_table(&mut conn, rsvp.id, "Garden - Table 4").unwrap();
        let ticket = issue_ticket(&mut conn, &store, &invite.token, "http://x", now()).unwrap();
        assert_eq!(ticket.table_name, "Table 4");

        fs::remove_dir_all(store.root()).ok();
    }
}
