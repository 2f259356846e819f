//! In-memory view of the seating plan: who sits where, how full each table is, and the
//! headline numbers for the dashboard.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{DiningTable, Invite, RsvpView};

/// Shown when a guest hasn't been given a table yet.
pub const UNASSIGNED_TABLE_NAME: &str = "To be announced";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    Empty,
    Partial,
    Full,
}

impl TableStatus {
    pub fn css_class(&self) -> &'static str {
        match self {
            TableStatus::Empty => "table-empty",
            TableStatus::Partial => "table-partial",
            TableStatus::Full => "table-full",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableOccupancy {
    pub table: DiningTable,
    pub occupied: i32,
    pub status: TableStatus,
    /// Occupancy as a percentage of capacity, capped at 100.
    pub fill_percent: u8,
    pub guests: Vec<RsvpView>,
    /// One entry per seat; `None` is a free seat.
    pub seats: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_invites: usize,
    /// Sum of every invite's `max_guests`.
    pub total_guests_listed: i64,
    /// Sum of `guests_count` over attending RSVPs.
    pub confirmed_guests: i64,
    /// Number of RSVPs that declined.
    pub declined: usize,
    /// Invites that haven't been answered yet.
    pub pending_invites: usize,
}

fn is_assigned(rsvp: &RsvpView) -> bool {
    rsvp.table_assignment
        .as_deref()
        .is_some_and(|name| !name.trim().is_empty())
}

/// Attending RSVPs that haven't been seated.
pub fn unassigned_rsvps(rsvps: &[RsvpView]) -> Vec<RsvpView> {
    rsvps
        .iter()
        .filter(|r| r.attending && !is_assigned(r))
        .cloned()
        .collect()
}

/// Attending RSVPs seated at the table with exactly this name.
pub fn rsvps_at_table<'a>(rsvps: &'a [RsvpView], table_name: &str) -> Vec<&'a RsvpView> {
    rsvps
        .iter()
        .filter(|r| r.attending && r.table_assignment.as_deref() == Some(table_name))
        .collect()
}

pub fn table_status(occupied: i32, capacity: i32) -> TableStatus {
    if occupied <= 0 {
        TableStatus::Empty
    } else if occupied >= capacity {
        TableStatus::Full
    } else {
        TableStatus::Partial
    }
}

fn fill_percent(occupied: i32, capacity: i32) -> u8 {
    if capacity <= 0 {
        return 100;
    }
    let percent = (i64::from(occupied.max(0)) * 100) / i64::from(capacity);
    percent.min(100) as u8
}

/// Lays the parties out seat by seat. The first seat of a party carries the guest's name, the
/// others are marked as companions. Parties that don't fit are cut off at capacity.
pub fn seat_labels(guests: &[&RsvpView], capacity: i32) -> Vec<Option<String>> {
    let capacity = capacity.max(0) as usize;
    let mut seats: Vec<Option<String>> = Vec::with_capacity(capacity);
    for rsvp in guests {
        for i in 0..rsvp.guests_count.max(0) {
            if seats.len() >= capacity {
                break;
            }
            if i == 0 {
                seats.push(Some(rsvp.guest_name.clone()));
            } else {
                seats.push(Some(format!("{} (companion)", rsvp.guest_name)));
            }
        }
    }
    seats.resize(capacity, None);
    seats
}

pub fn table_occupancy(table: &DiningTable, rsvps: &[RsvpView]) -> TableOccupancy {
    let guests = rsvps_at_table(rsvps, &table.name);
    let occupied: i32 = guests.iter().map(|r| r.guests_count.max(0)).sum();
    TableOccupancy {
        table: table.clone(),
        occupied,
        status: table_status(occupied, table.capacity),
        fill_percent: fill_percent(occupied, table.capacity),
        seats: seat_labels(&guests, table.capacity),
        guests: guests.into_iter().cloned().collect(),
    }
}

/// Occupancy of every table, in the order the tables were given.
pub fn build_seating_chart(tables: &[DiningTable], rsvps: &[RsvpView]) -> Vec<TableOccupancy> {
    tables.iter().map(|t| table_occupancy(t, rsvps)).collect()
}

/// Shows "Terrace" for "Garden - Terrace". Tables named with a zone prefix print nicer that way.
pub fn short_table_name(name: Option<&str>) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name
            .rsplit(" - ")
            .next()
            .unwrap_or(name)
            .to_string(),
        None => UNASSIGNED_TABLE_NAME.to_string(),
    }
}

pub fn dashboard_stats(invites: &[Invite], rsvps: &[RsvpView]) -> DashboardStats {
    let answered: HashSet<i32> = rsvps.iter().map(|r| r.invite_id).collect();
    DashboardStats {
        total_invites: invites.len(),
        total_guests_listed: invites.iter().map(|i| i64::from(i.max_guests)).sum(),
        confirmed_guests: rsvps
            .iter()
            .filter(|r| r.attending)
            .map(|r| i64::from(r.guests_count))
            .sum(),
        declined: rsvps.iter().filter(|r| !r.attending).count(),
        pending_invites: invites
            .iter()
            .filter(|i| !answered.contains(&i.id))
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 7)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .unwrap()
    }

    fn rsvp(id: i32, name: &str, attending: bool, count: i32, table: Option<&str>) -> RsvpView {
        RsvpView {
            id,
            invite_id: id,
            guest_name: name.to_string(),
            attending,
            guests_count: count,
            phone: None,
            message: None,
            table_assignment: table.map(str::to_string),
            created_at: at(),
            invite_label: format!("Invite {}", id),
            invite_token: format!("TOKEN{:03}", id),
        }
    }

    fn table(id: i32, name: &str, capacity: i32) -> DiningTable {
        DiningTable {
            id,
            name: name.to_string(),
            capacity,
            created_at: at(),
        }
    }

    fn invite(id: i32, max_guests: i32) -> Invite {
        Invite {
            id,
            token: format!("TOKEN{:03}", id),
            label: format!("Invite {}", id),
            event: "Wedding".to_string(),
            max_guests,
            allow_plus_one: false,
            expires_at: None,
            created_at: at(),
        }
    }

    #[test]
    fn test_unassigned_rsvps() {
        let rsvps = vec![
            rsvp(1, "Ana", true, 2, None),
            rsvp(2, "Bruno", true, 1, Some("Table 1")),
            rsvp(3, "Carla", false, 0, None),
            rsvp(4, "Diogo", true, 3, Some("  ")),
        ];
        let ids: Vec<i32> = unassigned_rsvps(&rsvps).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_rsvps_at_table_ignores_declined() {
        let rsvps = vec![
            rsvp(1, "Ana", true, 2, Some("Table 1")),
            rsvp(2, "Bruno", false, 0, Some("Table 1")),
            rsvp(3, "Carla", true, 1, Some("Table 10")),
        ];
        let at_one = rsvps_at_table(&rsvps, "Table 1");
        assert_eq!(at_one.len(), 1);
        assert_eq!(at_one[0].guest_name, "Ana");
    }

    #[test]
    fn test_table_status() {
        assert_eq!(table_status(0, 10), TableStatus::Empty);
        assert_eq!(table_status(4, 10), TableStatus::Partial);
        assert_eq!(table_status(10, 10), TableStatus::Full);
        assert_eq!(table_status(12, 10), TableStatus::Full);
    }

    #[test]
    fn test_table_occupancy_and_seats() {
        let rsvps = vec![
            rsvp(1, "Ana", true, 2, Some("Table 1")),
            rsvp(2, "Bruno", true, 1, Some("Table 1")),
            rsvp(3, "Carla", true, 4, Some("Table 2")),
        ];
        let occupancy = table_occupancy(&table(1, "Table 1", 4), &rsvps);
        assert_eq!(occupancy.occupied, 3);
        assert_eq!(occupancy.status, TableStatus::Partial);
        assert_eq!(occupancy.fill_percent, 75);
        assert_eq!(
            occupancy.seats,
            vec![
                Some("Ana".to_string()),
                Some("Ana (companion)".to_string()),
                Some("Bruno".to_string()),
                None,
            ]
        );
    }

    #[test]
    fn test_overfull_table_is_capped() {
        let rsvps = vec![
            rsvp(1, "Ana", true, 3, Some("Small")),
            rsvp(2, "Bruno", true, 2, Some("Small")),
        ];
        let occupancy = table_occupancy(&table(1, "Small", 4), &rsvps);
        assert_eq!(occupancy.occupied, 5);
        assert_eq!(occupancy.status, TableStatus::Full);
        assert_eq!(occupancy.fill_percent, 100);
        assert_eq!(occupancy.seats.len(), 4);
        assert_eq!(occupancy.seats[3], Some("Bruno".to_string()));
    }

    #[test]
    fn test_build_seating_chart_keeps_table_order() {
        let tables = vec![table(2, "B", 10), table(1, "A", 10)];
        let rsvps = vec![rsvp(1, "Ana", true, 10, Some("A"))];
        let chart = build_seating_chart(&tables, &rsvps);
        assert_eq!(chart.len(), 2);
        assert_eq!(chart[0].table.name, "B");
        assert_eq!(chart[0].status, TableStatus::Empty);
        assert_eq!(chart[1].status, TableStatus::Full);
    }

    #[test]
    fn test_short_table_name() {
        assert_eq!(short_table_name(Some("Garden - Terrace")), "Terrace");
        assert_eq!(short_table_name(Some("Zone A - Row 2 - Table 7")), "Table 7");
        assert_eq!(short_table_name(Some("Table 3")), "Table 3");
        assert_eq!(short_table_name(Some("  ")), UNASSIGNED_TABLE_NAME);
        assert_eq!(short_table_name(None), UNASSIGNED_TABLE_NAME);
    }

    #[test]
    fn test_dashboard_stats() {
        let invites = vec![invite(1, 2), invite(2, 4), invite(3, 1)];
        let rsvps = vec![
            rsvp(1, "Ana", true, 2, None),
            rsvp(2, "Bruno", false, 0, None),
        ];
        let stats = dashboard_stats(&invites, &rsvps);
        assert_eq!(
            stats,
            DashboardStats {
                total_invites: 3,
                total_guests_listed: 7,
                confirmed_guests: 2,
                declined: 1,
                pending_invites: 1,
            }
        );
        assert_eq!(dashboard_stats(&[], &[]), DashboardStats::default());
    }
}
