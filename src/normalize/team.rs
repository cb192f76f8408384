//! Team attribution.
//!
//! Sources spell the two sides as `100`/`200`, `"blue"`/`"red"`,
//! `"team-blue"`, organisation ids, or not at all. Each title plugs in a
//! [`TeamResolver`] that knows its own spellings; the shared heuristics
//! (label pairing, id ranges, slug matching) live here.

use std::collections::BTreeMap;

use crate::models::Team;

/// Per-title knowledge of how the two sides are named.
pub trait TeamResolver: Send + Sync {
    /// Map an explicit team label onto a side, if it is one of the title's
    /// canonical spellings.
    fn normalize_label(&self, label: &str) -> Option<Team>;

    /// Name/slug heuristic used when nothing explicit is available.
    fn from_slug(&self, text: &str) -> Option<Team> {
        let t = text.to_lowercase();
        if t.contains("blue") {
            Some(Team::A)
        } else if t.contains("red") {
            Some(Team::B)
        } else {
            None
        }
    }

    /// Players per side; numeric ids `1..=size` belong to team A and
    /// `size+1..=2*size` to team B.
    fn team_size(&self) -> usize {
        5
    }
}

/// League of Legends: Riot `100`/`200`, blue/red side, order/chaos.
pub struct RiftTeams;

/// VALORANT: GRID `team-blue`/`team-red` slugs.
pub struct ValorantTeams;

pub static RIFT_TEAMS: RiftTeams = RiftTeams;
pub static VALORANT_TEAMS: ValorantTeams = ValorantTeams;

fn canonical(label: &str) -> String {
    label.trim().to_lowercase().replace(['_', ' '], "-")
}

fn generic_side(label: &str) -> Option<Team> {
    match label {
        "a" | "team-a" | "teama" | "blue" | "team-blue" | "blue-team" | "blue-side" => {
            Some(Team::A)
        }
        "b" | "team-b" | "teamb" | "red" | "team-red" | "red-team" | "red-side" => Some(Team::B),
        _ => None,
    }
}

impl TeamResolver for RiftTeams {
    fn normalize_label(&self, label: &str) -> Option<Team> {
        let label = canonical(label);
        match label.as_str() {
            "100" | "order" => Some(Team::A),
            "200" | "chaos" => Some(Team::B),
            other => generic_side(other),
        }
    }
}

impl TeamResolver for ValorantTeams {
    fn normalize_label(&self, label: &str) -> Option<Team> {
        generic_side(&canonical(label))
    }
}

/// Assignment of explicit team labels seen within one frame.
///
/// Canonical spellings map directly. Labels the resolver does not know
/// (organisation ids, custom names) claim the remaining sides in order of
/// first appearance; a third distinct unknown label stays unattributed.
pub struct TeamLabels {
    assigned: BTreeMap<String, Team>,
}

impl TeamLabels {
    pub fn from_labels<'l>(
        resolver: &dyn TeamResolver,
        labels: impl IntoIterator<Item = &'l str>,
    ) -> Self {
        let labels: Vec<&str> = labels.into_iter().collect();
        let mut assigned = BTreeMap::new();
        let mut claimed: Vec<Team> = Vec::new();

        for label in &labels {
            if let Some(team) = resolver.normalize_label(label) {
                assigned.insert(label.to_string(), team);
                if !claimed.contains(&team) {
                    claimed.push(team);
                }
            }
        }
        for label in &labels {
            if assigned.contains_key(*label) {
                continue;
            }
            let free = [Team::A, Team::B]
                .into_iter()
                .find(|t| !claimed.contains(t));
            if let Some(team) = free {
                assigned.insert(label.to_string(), team);
                claimed.push(team);
            }
        }
        TeamLabels { assigned }
    }

    pub fn get(&self, label: &str) -> Option<Team> {
        self.assigned.get(label).copied()
    }
}

/// Side of a participant by its rank among the frame's sorted numeric ids:
/// the first half is team A.
pub fn team_by_rank(id: &str, sorted_numeric_ids: &[i64]) -> Option<Team> {
    let n: i64 = id.parse().ok()?;
    let rank = sorted_numeric_ids.iter().position(|x| *x == n)?;
    let half = sorted_numeric_ids.len().div_ceil(2);
    Some(if rank < half { Team::A } else { Team::B })
}

/// Side of a participant from a fixed numeric id range.
pub fn team_by_id_range(resolver: &dyn TeamResolver, id: &str) -> Option<Team> {
    let n: usize = id.parse().ok()?;
    let size = resolver.team_size();
    match n {
        n if (1..=size).contains(&n) => Some(Team::A),
        n if (size + 1..=2 * size).contains(&n) => Some(Team::B),
        _ => None,
    }
}

/// Attributes actors of events to teams, optionally using the roster of
/// the frame the events came from.
pub struct Attribution<'r> {
    resolver: &'r dyn TeamResolver,
    roster: BTreeMap<String, Option<Team>>,
}

impl<'r> Attribution<'r> {
    pub fn new(resolver: &'r dyn TeamResolver) -> Self {
        Attribution {
            resolver,
            roster: BTreeMap::new(),
        }
    }

    pub fn with_roster(
        resolver: &'r dyn TeamResolver,
        roster: BTreeMap<String, Option<Team>>,
    ) -> Self {
        Attribution { resolver, roster }
    }

    pub fn resolver(&self) -> &'r dyn TeamResolver {
        self.resolver
    }

    /// Team of the participant `id` from the roster, the id range or the
    /// slug, without defaulting.
    pub fn known_team(&self, id: &str) -> Option<Team> {
        if id.is_empty() {
            return None;
        }
        if let Some(team) = self.roster.get(id) {
            return *team;
        }
        team_by_id_range(self.resolver, id).or_else(|| self.resolver.from_slug(id))
    }

    /// [`Self::known_team`], falling back to team A. Empty ids (environment
    /// kills) are never attributed.
    pub fn participant_team(&self, id: &str) -> Option<Team> {
        if id.is_empty() {
            return None;
        }
        if self.roster.contains_key(id) {
            return self.known_team(id);
        }
        self.known_team(id).or(Some(Team::A))
    }
}

/// Sorted numeric ids among `ids`.
pub fn sorted_numeric_ids<'i>(ids: impl IntoIterator<Item = &'i str>) -> Vec<i64> {
    let mut out: Vec<i64> = ids.into_iter().filter_map(|id| id.parse().ok()).collect();
    out.sort_unstable();
    out.dedup();
    out
}
