use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Win counts per player name. Lives as long as the process; only a hard reset clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    wins: BTreeMap<String, u32>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// +1 for `player`, creating the entry at 0 first if needed.
    pub fn credit(&mut self, player: &str) {
        *self.wins.entry(player.to_string()).or_insert(0) += 1;
    }

    pub fn wins(&self, player: &str) -> u32 {
        self.wins.get(player).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.wins.is_empty()
    }

    pub fn clear(&mut self) {
        self.wins.clear();
    }

    /// Most wins first, ties broken by name.
    pub fn ranking(&self) -> Vec<(&str, u32)> {
        let mut rows: Vec<(&str, u32)> = self.wins.iter().map(|(p, w)| (p.as_str(), *w)).collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }
}
