//! Read-model types shared by the Marquee query engine and its callers.
//!
//! Everything here is produced per query execution and never persisted: the
//! unified row shape every video entity is projected into, the artwork
//! references attached to those rows, and the classification tags that drive
//! fragment and artwork join selection.
#![allow(missing_docs)]

pub mod artwork;
pub mod error;
pub mod metadata_type;
pub mod row;
pub mod sort;

pub use artwork::{ArtworkRef, ArtworkType};
pub use error::{ModelError, Result as ModelResult};
pub use metadata_type::{MetadataType, VIDEO_TYPES};
pub use row::{ExtraValues, Hierarchy, NON_EPISODIC, UnifiedVideoRow};
pub use sort::SortOrder;
