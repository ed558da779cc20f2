//! Frame selection: display phase to static image asset
//!
//! The engine only knows phases; which bitmap stands for which phase is a
//! property of the asset library and lives in a [`FrameTable`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::{DisplayPhase, PhaseSnapshot};

/// Static bongo cat image identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum AssetId {
    #[serde(rename = "bongo_cat_none")]
    None,
    #[serde(rename = "bongo_cat_left1")]
    Left1,
    #[serde(rename = "bongo_cat_left2")]
    Left2,
    #[serde(rename = "bongo_cat_right1")]
    Right1,
    #[serde(rename = "bongo_cat_right2")]
    Right2,
    #[serde(rename = "bongo_cat_both1")]
    Both1,
    #[serde(rename = "bongo_cat_both1_open")]
    Both1Open,
    #[serde(rename = "bongo_cat_both2")]
    Both2,
}

impl AssetId {
    pub const ALL: [AssetId; 8] = [
        AssetId::None,
        AssetId::Left1,
        AssetId::Left2,
        AssetId::Right1,
        AssetId::Right2,
        AssetId::Both1,
        AssetId::Both1Open,
        AssetId::Both2,
    ];

    /// Asset name as used in image declarations and config files
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetId::None => "bongo_cat_none",
            AssetId::Left1 => "bongo_cat_left1",
            AssetId::Left2 => "bongo_cat_left2",
            AssetId::Right1 => "bongo_cat_right1",
            AssetId::Right2 => "bongo_cat_right2",
            AssetId::Both1 => "bongo_cat_both1",
            AssetId::Both1Open => "bongo_cat_both1_open",
            AssetId::Both2 => "bongo_cat_both2",
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for AssetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        AssetId::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown asset: \"{s}\""))
    }
}

impl TryFrom<String> for AssetId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One asset per display phase, plus a second resting slot for the
/// never-used look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameTable {
    /// Resting before the first key press
    #[serde(default = "default_resting_cold")]
    pub resting_cold: AssetId,
    /// Resting after idle decay
    #[serde(default = "default_resting_idle")]
    pub resting_idle: AssetId,
    #[serde(default = "default_settled")]
    pub settled: AssetId,
    #[serde(default = "default_left")]
    pub left: AssetId,
    #[serde(default = "default_right")]
    pub right: AssetId,
    #[serde(default = "default_both")]
    pub both: AssetId,
}

fn default_resting_cold() -> AssetId {
    AssetId::Both1Open
}
fn default_resting_idle() -> AssetId {
    AssetId::None
}
fn default_settled() -> AssetId {
    AssetId::Both1
}
fn default_left() -> AssetId {
    AssetId::Left1
}
fn default_right() -> AssetId {
    AssetId::Right1
}
fn default_both() -> AssetId {
    AssetId::Both2
}

impl Default for FrameTable {
    fn default() -> Self {
        Self {
            resting_cold: default_resting_cold(),
            resting_idle: default_resting_idle(),
            settled: default_settled(),
            left: default_left(),
            right: default_right(),
            both: default_both(),
        }
    }
}

impl FrameTable {
    /// Table for asset libraries with a single idle pose
    pub fn with_single_idle(mut self, idle: AssetId) -> Self {
        self.resting_cold = idle;
        self.resting_idle = idle;
        self
    }

    /// Asset to display for a phase
    pub fn select(&self, phase: DisplayPhase, ever_active: bool) -> AssetId {
        match phase {
            DisplayPhase::Resting if ever_active => self.resting_idle,
            DisplayPhase::Resting => self.resting_cold,
            DisplayPhase::Settled => self.settled,
            DisplayPhase::LeftOnly => self.left,
            DisplayPhase::RightOnly => self.right,
            DisplayPhase::Both => self.both,
        }
    }

    pub fn select_snapshot(&self, snapshot: PhaseSnapshot) -> AssetId {
        self.select(snapshot.phase, snapshot.ever_active)
    }
}

/// Select the asset for `phase` from `table`
pub fn select_frame(table: &FrameTable, phase: DisplayPhase, ever_active: bool) -> AssetId {
    table.select(phase, ever_active)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_exhaustive() {
        let table = FrameTable::default();
        assert_eq!(table.select(DisplayPhase::Resting, false), AssetId::Both1Open);
        assert_eq!(table.select(DisplayPhase::Resting, true), AssetId::None);
        assert_eq!(table.select(DisplayPhase::Settled, true), AssetId::Both1);
        assert_eq!(table.select(DisplayPhase::LeftOnly, true), AssetId::Left1);
        assert_eq!(table.select(DisplayPhase::RightOnly, true), AssetId::Right1);
        assert_eq!(table.select(DisplayPhase::Both, true), AssetId::Both2);
    }

    #[test]
    fn test_single_idle_collapses_resting() {
        let table = FrameTable::default().with_single_idle(AssetId::Both1);
        assert_eq!(
            select_frame(&table, DisplayPhase::Resting, false),
            select_frame(&table, DisplayPhase::Resting, true)
        );
    }

    #[test]
    fn test_asset_names_parse() {
        for asset in AssetId::ALL {
            assert_eq!(asset.as_str().parse::<AssetId>(), Ok(asset));
        }
        assert!("left2".parse::<AssetId>().is_err());
        assert!("bongo_cat_sleep".parse::<AssetId>().is_err());
    }
}
