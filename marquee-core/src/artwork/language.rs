//! Language preference among located artwork candidates.

use marquee_model::{ArtworkRef, ArtworkType};
use serde::{Deserialize, Serialize};

/// Candidate precedence: preferred language, alternate language, no language,
/// blank language, then whatever comes first.
///
/// Language codes compare ASCII-case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePriority {
    pub preferred: Option<String>,
    pub alternate: Option<String>,
}

impl LanguagePriority {
    pub fn new(preferred: Option<String>, alternate: Option<String>) -> Self {
        Self {
            preferred,
            alternate,
        }
    }

    /// Rank of a language code; lower is better.
    pub fn rank(&self, language: Option<&str>) -> u8 {
        let matches = |wanted: &Option<String>, code: &str| {
            wanted.as_deref().is_some_and(|wanted| {
                !wanted.is_empty() && wanted.eq_ignore_ascii_case(code)
            })
        };
        match language {
            Some(code) if matches(&self.preferred, code) => 0,
            Some(code) if matches(&self.alternate, code) => 1,
            None => 2,
            Some(code) if code.trim().is_empty() => 3,
            Some(_) => 4,
        }
    }

    /// Best candidate by rank; ties keep input order.
    pub fn select_preferred<'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a ArtworkRef>,
    ) -> Option<&'a ArtworkRef> {
        candidates
            .into_iter()
            .min_by_key(|candidate| self.rank_of(candidate))
    }

    /// Best candidate of one artwork type.
    pub fn select_for<'a>(
        &self,
        candidates: &'a [ArtworkRef],
        artwork_type: ArtworkType,
    ) -> Option<&'a ArtworkRef> {
        self.select_preferred(
            candidates
                .iter()
                .filter(|candidate| candidate.artwork_type == artwork_type),
        )
    }

    /// Stable reorder by rank.
    pub fn sort(&self, candidates: &mut [ArtworkRef]) {
        candidates.sort_by_key(|candidate| self.rank_of(candidate));
    }

    fn rank_of(&self, candidate: &ArtworkRef) -> u8 {
        self.rank(candidate.language_code.as_deref())
    }
}
