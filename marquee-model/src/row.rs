//! The unified cross-type row every video fragment is projected into.

use chrono::{DateTime, NaiveDate, Utc};

use crate::metadata_type::MetadataType;

/// Episode number reported for rows outside a series hierarchy.
pub const NON_EPISODIC: i32 = -1;

/// Position of a row inside the series hierarchy.
///
/// Movies stand alone; every other video type carries exactly the hierarchy
/// keys that are meaningful for it, so a movie can never report a season and
/// an episode can never lose its series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Hierarchy {
    Standalone,
    Series,
    Season {
        series_id: i64,
        season_number: i32,
    },
    Episode {
        series_id: i64,
        season_id: i64,
        season_number: i32,
        episode_number: i32,
    },
}

/// Caller-selected optional columns; unselected or inapplicable ones stay
/// `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtraValues {
    pub plot: Option<String>,
    pub outline: Option<String>,
    pub tagline: Option<String>,
    pub top_rank: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_scanned: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnifiedVideoRow {
    pub id: i64,
    pub metadata_type: MetadataType,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub sort_title: Option<String>,
    pub year: Option<i32>,
    pub release_date: Option<NaiveDate>,
    pub hierarchy: Hierarchy,
    /// `None` means the store has no watch data for this row.
    pub watched: Option<bool>,
    pub newest: Option<DateTime<Utc>>,
    pub extras: ExtraValues,
}

impl UnifiedVideoRow {
    /// Natural key used to merge artwork back onto rows.
    pub fn key(&self) -> (MetadataType, i64) {
        (self.metadata_type, self.id)
    }

    pub fn series_id(&self) -> Option<i64> {
        match self.hierarchy {
            Hierarchy::Standalone => None,
            Hierarchy::Series => Some(self.id),
            Hierarchy::Season { series_id, .. }
            | Hierarchy::Episode { series_id, .. } => Some(series_id),
        }
    }

    pub fn season_id(&self) -> Option<i64> {
        match self.hierarchy {
            Hierarchy::Season { .. } => Some(self.id),
            Hierarchy::Episode { season_id, .. } => Some(season_id),
            Hierarchy::Standalone | Hierarchy::Series => None,
        }
    }

    pub fn season_number(&self) -> Option<i32> {
        match self.hierarchy {
            Hierarchy::Season { season_number, .. }
            | Hierarchy::Episode { season_number, .. } => Some(season_number),
            Hierarchy::Standalone | Hierarchy::Series => None,
        }
    }

    /// Episode number, or [`NON_EPISODIC`] for every non-episode row.
    pub fn episode_number(&self) -> i32 {
        match self.hierarchy {
            Hierarchy::Episode { episode_number, .. } => episode_number,
            _ => NON_EPISODIC,
        }
    }
}
