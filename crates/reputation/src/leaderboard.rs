//! Ranking hosts by level and XP.

use crate::host::{Host, HostId};

/// Hosts shown on a single leaderboard page
pub const HOSTS_PER_PAGE: usize = 25;

/// One ranked row of the leaderboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: usize,
    pub host_id: HostId,
    pub name: String,
    pub level: u32,
    pub xp: u64,
}

/// A page of the leaderboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardPage {
    /// 1-based page number, clamped into range
    pub page: usize,
    pub total_pages: usize,
    pub entries: Vec<LeaderboardEntry>,
}

impl LeaderboardPage {
    /// Rank `hosts` and cut out `page` (1-based). Out of range pages are
    /// clamped to the nearest valid one.
    pub fn build<'a, I>(hosts: I, page: usize) -> Self
    where
        I: IntoIterator<Item = &'a Host>,
    {
        let ranked = rank(hosts);
        let total_pages = ranked.len().div_ceil(HOSTS_PER_PAGE).max(1);
        let page = page.clamp(1, total_pages);

        let entries = ranked
            .into_iter()
            .skip((page - 1) * HOSTS_PER_PAGE)
            .take(HOSTS_PER_PAGE)
            .collect();

        Self { page, total_pages, entries }
    }

    /// Plain-text rendering
    pub fn render(&self) -> String {
        let mut out = format!("Leaderboard (page {}/{})", self.page, self.total_pages);
        if self.entries.is_empty() {
            out.push_str("\nNo hosts yet");
        }
        for entry in &self.entries {
            out.push_str(&format!(
                "\n{}. {} | Level {} | {} XP",
                entry.rank, entry.name, entry.level, entry.xp
            ));
        }
        out
    }
}

fn score(host: &Host) -> u64 {
    u64::from(host.level) * 10_000 + host.xp
}

/// Every host ranked by score, best first. Ties keep id order.
pub fn rank<'a, I>(hosts: I) -> Vec<LeaderboardEntry>
where
    I: IntoIterator<Item = &'a Host>,
{
    let mut hosts: Vec<&Host> = hosts.into_iter().collect();
    hosts.sort_by(|a, b| score(b).cmp(&score(a)).then_with(|| a.id.cmp(&b.id)));

    hosts
        .into_iter()
        .enumerate()
        .map(|(i, host)| LeaderboardEntry {
            rank: i + 1,
            host_id: host.id.clone(),
            name: host.name.clone(),
            level: host.level,
            xp: host.xp,
        })
        .collect()
}
