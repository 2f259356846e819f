//! Accent- and case-insensitive lookup over the names listed on invites.

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Search terms shorter than this (after trimming) never match anything.
pub const MIN_SEARCH_LEN: usize = 3;

/// Capacity assumed for a group that doesn't state one.
pub const DEFAULT_GROUP_CAPACITY: i32 = 10;

/// Name endings that mean "this person brings someone along".
const COMPANION_SUFFIXES: &[&str] = &[
    " e acompanhante",
    " e acompanhantes",
    " e esposa",
    " e esposo",
    " e mulher",
    " e marido",
    " and guest",
    " +1",
    " +2",
];

/// A named group of guests, typically one invite and the names written on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuestGroup {
    pub id: i32,
    pub name: String,
    pub max_guests: Option<i32>,
    pub guests: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuestEntry {
    pub name: String,
    pub normalized_name: String,
    pub group: String,
    pub group_id: i32,
    pub max_guests: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupStats {
    pub total_groups: usize,
    pub total_guests: usize,
    pub total_capacity: i64,
    /// Guests per group, rounded to one decimal.
    pub average_per_group: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanionName {
    pub principal_name: String,
    pub companion_allowed: bool,
}

/// Lower-cases, strips diacritics and trims, so "  JOÃO " and "joao" compare equal.
pub fn normalize_name(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// Flattens groups into one entry per non-blank guest name.
pub fn flatten_guests(groups: &[GuestGroup]) -> Vec<GuestEntry> {
    groups
        .iter()
        .flat_map(|group| {
            let max_guests = group.max_guests.unwrap_or(DEFAULT_GROUP_CAPACITY);
            group
                .guests
                .iter()
                .filter(|name| !name.trim().is_empty())
                .map(move |name| GuestEntry {
                    name: name.clone(),
                    normalized_name: normalize_name(name),
                    group: group.name.clone(),
                    group_id: group.id,
                    max_guests,
                })
        })
        .collect()
}

/// Returns every guest whose normalized name contains the normalized term.
pub fn search_guests(term: &str, groups: &[GuestGroup]) -> Vec<GuestEntry> {
    if term.trim().chars().count() < MIN_SEARCH_LEN {
        return Vec::new();
    }
    let needle = normalize_name(term);
    flatten_guests(groups)
        .into_iter()
        .filter(|guest| guest.normalized_name.contains(&needle))
        .collect()
}

/// Finds the guest whose normalized name equals the normalized input.
pub fn find_guest(name: &str, groups: &[GuestGroup]) -> Option<GuestEntry> {
    let needle = normalize_name(name);
    flatten_guests(groups)
        .into_iter()
        .find(|guest| guest.normalized_name == needle)
}

pub fn group_stats(groups: &[GuestGroup]) -> GroupStats {
    if groups.is_empty() {
        return GroupStats {
            total_groups: 0,
            total_guests: 0,
            total_capacity: 0,
            average_per_group: 0.0,
        };
    }

    let total_groups = groups.len();
    let total_guests = flatten_guests(groups).len();
    let total_capacity = groups
        .iter()
        .map(|g| i64::from(g.max_guests.unwrap_or(DEFAULT_GROUP_CAPACITY)))
        .sum();
    let average = total_guests as f64 / total_groups as f64;

    GroupStats {
        total_groups,
        total_guests,
        total_capacity,
        average_per_group: (average * 10.0).round() / 10.0,
    }
}

/// Splits "Ana e acompanhante" into the principal name and whether a companion is allowed.
pub fn parse_companion_name(full_name: &str) -> CompanionName {
    let lower = full_name.to_lowercase();
    let matched = COMPANION_SUFFIXES
        .iter()
        .find(|suffix| lower.ends_with(*suffix));

    match matched {
        // Lower-casing can change byte lengths, so cut by character count.
        Some(suffix) => {
            let keep = full_name.chars().count() - suffix.chars().count();
            CompanionName {
                principal_name: full_name.chars().take(keep).collect::<String>().trim().to_string(),
                companion_allowed: true,
            }
        }
        None => CompanionName {
            principal_name: full_name.to_string(),
            companion_allowed: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<GuestGroup> {
        vec![
            GuestGroup {
                id: 1,
                name: "Família Simões".to_string(),
                max_guests: Some(4),
                guests: vec![
                    "João Simões".to_string(),
                    "Inês Simões".to_string(),
                    "  ".to_string(),
                ],
            },
            GuestGroup {
                id: 2,
                name: "Colleagues".to_string(),
                max_guests: None,
                guests: vec!["Jonathan Price".to_string(), "Ana Lúcia".to_string()],
            },
        ]
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  JOÃO Simões "), "joao simoes");
        assert_eq!(normalize_name("Ação"), "acao");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_flatten_skips_blank_names_and_defaults_capacity() {
        let entries = flatten_guests(&groups());
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].group_id, 1);
        assert_eq!(entries[0].max_guests, 4);
        assert_eq!(entries[2].max_guests, DEFAULT_GROUP_CAPACITY);
        assert_eq!(entries[2].normalized_name, "jonathan price");
    }

    #[test]
    fn test_search_requires_three_characters() {
        assert!(search_guests("", &groups()).is_empty());
        assert!(search_guests("jo", &groups()).is_empty());
        assert!(search_guests("  jo  ", &groups()).is_empty());
        assert_eq!(search_guests("joa", &groups()).len(), 1);
    }

    #[test]
    fn test_search_is_accent_insensitive() {
        // Plain input finds accented names.
        let found = search_guests("simoes", &groups());
        let names: Vec<&str> = found.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["João Simões", "Inês Simões"]);

        // Accented input finds plain names, too.
        let found = search_guests("Jônathan", &groups());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].group, "Colleagues");

        assert!(search_guests("nobody", &groups()).is_empty());
    }

    #[test]
    fn test_find_guest_exact_match() {
        let found = find_guest("ana lucia", &groups()).expect("guest should be found");
        assert_eq!(found.name, "Ana Lúcia");
        assert_eq!(found.group_id, 2);

        // Substrings aren't enough.
        assert!(find_guest("ana", &groups()).is_none());
    }

    #[test]
    fn test_group_stats() {
        let stats = group_stats(&groups());
        assert_eq!(stats.total_groups, 2);
        assert_eq!(stats.total_guests, 4);
        assert_eq!(stats.total_capacity, 14);
        assert_eq!(stats.average_per_group, 2.0);

        let empty = group_stats(&[]);
        assert_eq!(empty.total_groups, 0);
        assert_eq!(empty.average_per_group, 0.0);
    }

    #[test]
    fn test_group_stats_rounds_average() {
        let mut three = groups();
        three.push(GuestGroup {
            id: 3,
            name: "Solo".to_string(),
            max_guests: Some(1),
            guests: vec!["Rui".to_string()],
        });
        // 5 guests over 3 groups.
        assert_eq!(group_stats(&three).average_per_group, 1.7);
    }

    #[test]
    fn test_parse_companion_name() {
        assert_eq!(
            parse_companion_name("Carlos Mendes e Acompanhante"),
            CompanionName {
                principal_name: "Carlos Mendes".to_string(),
                companion_allowed: true,
            }
        );
        assert_eq!(
            parse_companion_name("Beatriz +1").principal_name,
            "Beatriz".to_string()
        );
        assert!(parse_companion_name("Sofia e marido").companion_allowed);
        assert!(parse_companion_name("Tom and guest").companion_allowed);

        let plain = parse_companion_name("Marta Esposito");
        assert!(!plain.companion_allowed);
        assert_eq!(plain.principal_name, "Marta Esposito");

        assert_eq!(
            parse_companion_name(""),
            CompanionName {
                principal_name: String::new(),
                companion_allowed: false,
            }
        );
    }
}
