//! Second-phase artwork attachment for resolved rows.

pub mod language;
pub mod resolver;

pub use language::LanguagePriority;
pub use resolver::{
    ArtworkMap, ArtworkQuery, ArtworkResolver, UNUSABLE_LOCATED_STATUSES,
};
