//! One predicate per active facet, scoped to the current fragment's row.
//!
//! Facets over to-many relations are correlated existence checks: include
//! wraps the subquery in `EXISTS`, exclude wraps the same body in
//! `NOT EXISTS`. Scalar facets exclude with an explicit NULL branch so a
//! missing value counts as "not matching".

use super::newest::NewestStrategy;
use super::schema::{EntitySchema, OwnerKey};
use crate::error::{QueryError, Result};
use crate::query::{
    FilterCriteria, LookupKey, Polarity, RatingFilter, RatingSource,
    SearchQuery,
};
use crate::sql::{ArithOp, Expr, ParamSet, Predicate, Select, col};

/// Parameter shared by every media file lookup.
pub(crate) fn not_extra(params: &mut ParamSet) -> Expr {
    params.bind("extra", false)
}

fn quantify(polarity: Polarity, body: Select) -> Predicate {
    match polarity {
        Polarity::Include => Predicate::exists(body),
        Polarity::Exclude => Predicate::not_exists(body),
    }
}

/// Include as-is; exclude as `value IS NULL OR NOT (predicate)`.
fn scalar(polarity: Polarity, value: Expr, predicate: Predicate) -> Predicate {
    match polarity {
        Polarity::Include => predicate,
        Polarity::Exclude => value.is_null().or(predicate.negate()),
    }
}

/// `SELECT 1 FROM <link> lnk JOIN <target> <alias>` correlated to the owner.
fn linked(
    owner: &OwnerKey,
    link_tables: (&'static str, &'static str),
    foreign_key: &'static str,
    target: &'static str,
    alias: &'static str,
) -> Select {
    let (videodata_table, series_table) = link_tables;
    Select::from(owner.owner.table(videodata_table, series_table), "lnk")
        .select_one()
        .join(target, alias, col(alias, "id").eq(col("lnk", foreign_key)))
        .filter(col("lnk", owner.owner.key_column()).eq(owner.id.clone()))
}

/// Id or case-insensitive name match on a lookup table. Names are bound as
/// given and folded by the store on both sides.
fn lookup(
    key: &LookupKey,
    alias: &'static str,
    name_column: &'static str,
    param: &str,
    params: &mut ParamSet,
) -> Predicate {
    match key {
        LookupKey::Id(id) => {
            let id = params.bind(&format!("{param}_id"), *id);
            col(alias, "id").eq(id)
        }
        LookupKey::Name(name) => {
            let name = params.bind(param, name.trim());
            col(alias, name_column).eq_ignore_case(name)
        }
    }
}

/// Appends one predicate per active facet to `select`.
pub(crate) struct FacetPredicates<'a> {
    pub criteria: &'a FilterCriteria,
    pub newest: Option<NewestStrategy>,
}

impl FacetPredicates<'_> {
    pub(crate) fn apply(
        &self,
        schema: &dyn EntitySchema,
        mut select: Select,
        params: &mut ParamSet,
    ) -> Result<Select> {
        let criteria = self.criteria;

        if let Some((polarity, ids)) = criteria.id.active() {
            let ids: Vec<Expr> =
                ids.iter().map(|id| params.bind("id", *id)).collect();
            select = select.filter(match polarity {
                Polarity::Include => schema.id().in_list(ids),
                Polarity::Exclude => schema.id().not_in_list(ids),
            });
        }

        if let Some((polarity, year)) = criteria.year_exact.active() {
            let year = params.bind("year", *year);
            let year_column = schema.year();
            select = select.filter(scalar(
                polarity,
                year_column.clone(),
                year_column.eq(year),
            ));
        }

        if let Some((polarity, range)) = criteria.year_range.active() {
            let from = params.bind("year_from", range.start);
            let to = params.bind("year_to", range.end);
            let year_column = schema.year();
            select = select.filter(scalar(
                polarity,
                year_column.clone(),
                year_column.between(from, to),
            ));
        }

        if let Some((polarity, watched)) = criteria.watched.active() {
            let watched = params.bind("watched", *watched);
            let watched_column = schema.watched();
            select = select.filter(scalar(
                polarity,
                watched_column.clone(),
                watched_column.eq(watched),
            ));
        }

        if let Some((polarity, genre)) = criteria.genre.active() {
            select =
                select.filter(genre_check(schema, polarity, genre, params));
        }

        if let Some((polarity, studio)) = criteria.studio.active() {
            let body = linked(
                &schema.relation_owner(),
                ("videodata_studios", "series_studios"),
                "studio_id",
                "studio",
                "st",
            )
            .filter(lookup(studio, "st", "name", "studio", params));
            select = select.filter(quantify(polarity, body));
        }

        if let Some((polarity, country)) = criteria.country.active() {
            let code = params.bind("country", country.trim());
            let body = linked(
                &schema.relation_owner(),
                ("videodata_countries", "series_countries"),
                "country_id",
                "country",
                "c",
            )
            .filter(col("c", "country_code").eq_ignore_case(code));
            select = select.filter(quantify(polarity, body));
        }

        if let Some((polarity, certification)) =
            criteria.certification.active()
        {
            let body = linked(
                &schema.relation_owner(),
                ("videodata_certifications", "series_certifications"),
                "cert_id",
                "certification",
                "cert",
            )
            .filter(lookup(
                certification,
                "cert",
                "certificate",
                "certification",
                params,
            ));
            select = select.filter(quantify(polarity, body));
        }

        if let Some((polarity, award)) = criteria.award.active() {
            let body = linked(
                &schema.relation_owner(),
                ("videodata_awards", "series_awards"),
                "award_id",
                "award",
                "aw",
            )
            .filter(lookup(award, "aw", "event", "award", params));
            select = select.filter(quantify(polarity, body));
        }

        if let Some((polarity, source)) = criteria.video_source.active() {
            let extra = not_extra(params);
            let source = params.bind("video_source", source.trim());
            let body = schema
                .file_scope()
                .mediafiles()
                .select_one()
                .filter(col("mf", "extra").eq(extra))
                .filter(col("mf", "video_source").eq_ignore_case(source));
            select = select.filter(quantify(polarity, body));
        }

        if let Some((polarity, resolution)) = criteria.resolution.active() {
            let (min_width, max_width) = resolution.width_range();
            let extra = not_extra(params);
            let min_width = params.bind("min_width", min_width);
            let max_width = params.bind("max_width", max_width);
            let body = schema
                .file_scope()
                .mediafiles()
                .select_one()
                .filter(col("mf", "extra").eq(extra))
                .filter(col("mf", "width").between(min_width, max_width));
            select = select.filter(quantify(polarity, body));
        }

        if let Some((polarity, rating)) = criteria.rating.active() {
            let body = rating_check(schema, rating, params)?;
            select = select.filter(quantify(polarity, body));
        }

        if let Some((polarity, filter)) = criteria.newest.active()
            && let Some(strategy) = self.newest
        {
            select = select.filter(strategy.predicate(
                schema,
                polarity,
                filter.threshold,
                params,
            ));
        }

        if let Some((polarity, boxed_set)) = criteria.boxed_set.active() {
            let owner = schema.relation_owner();
            let boxed_set = params.bind("boxed_set", *boxed_set);
            let body = Select::from("boxed_set_order", "bo")
                .select_one()
                .filter(col("bo", owner.owner.key_column()).eq(owner.id))
                .filter(col("bo", "boxedset_id").eq(boxed_set));
            select = select.filter(quantify(polarity, body));
        }

        if let Some(search) = &criteria.search {
            select = select.filter(search_check(schema, search, params));
        }

        Ok(select)
    }
}

/// Genre matches its canonical name or either localized override.
fn genre_check(
    schema: &dyn EntitySchema,
    polarity: Polarity,
    genre: &str,
    params: &mut ParamSet,
) -> Predicate {
    let genre = params.bind("genre", genre.trim()).lower();
    let label_matches = col("g", "name")
        .lower()
        .eq(genre.clone())
        .or(col("g", "target_api").lower().eq(genre.clone()))
        .or(col("g", "target_xml").lower().eq(genre));
    let body = linked(
        &schema.relation_owner(),
        ("videodata_genres", "series_genres"),
        "genre_id",
        "genre",
        "g",
    )
    .filter(label_matches);
    quantify(polarity, body)
}

/// Rating bucket check. A filter without a source cannot be expressed.
fn rating_check(
    schema: &dyn EntitySchema,
    rating: &RatingFilter,
    params: &mut ParamSet,
) -> Result<Select> {
    let owner = schema.rating_owner();
    let table = owner.owner.table("videodata_ratings", "series_ratings");
    let key_column = owner.owner.key_column();
    let bucket = |value: Expr| {
        Expr::func(
            "ROUND",
            vec![value.arith(ArithOp::Div, Expr::Decimal("10.0"))],
        )
    };
    let target = params.bind("rating", rating.value);

    let body = Select::from(table, "r")
        .select_one()
        .filter(col("r", key_column).eq(owner.id));
    match rating.source.as_ref() {
        None => Err(QueryError::invalid(
            "rating facet requires a rating source",
        )),
        Some(RatingSource::Combined) => Ok(
            body.group_by(col("r", key_column)).having(
                bucket(Expr::func("AVG", vec![col("r", "rating")])).eq(target),
            ),
        ),
        Some(RatingSource::Source(source)) => {
            let source = params.bind("rating_source", source.trim());
            Ok(
                body.filter(col("r", "sourcedb").eq_ignore_case(source))
                    .filter(bucket(col("r", "rating")).eq(target)),
            )
        }
    }
}

fn search_check(
    schema: &dyn EntitySchema,
    search: &SearchQuery,
    params: &mut ParamSet,
) -> Predicate {
    let pattern = params.bind("search", search.like_pattern());
    schema.search_column(search.field).like_ignore_case(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::schema::schema_for;
    use crate::query::{CriteriaBuilder, Resolution};
    use crate::sql::{Dialect, Renderer};
    use marquee_model::MetadataType;

    fn render_for(
        metadata_type: MetadataType,
        criteria: &FilterCriteria,
    ) -> String {
        let schema = schema_for(metadata_type).unwrap();
        let mut params = ParamSet::new();
        let select = FacetPredicates {
            criteria,
            newest: None,
        }
        .apply(schema, schema.base().select_one(), &mut params)
        .unwrap();
        Renderer::new(Dialect::Postgres, &params)
            .render_select(&select)
            .unwrap()
            .sql
    }

    #[test]
    fn genre_checks_all_three_labels() {
        let criteria = CriteriaBuilder::new().genre("Action").build_unchecked();
        let sql = render_for(MetadataType::Movie, &criteria);
        assert!(sql.contains(
            "EXISTS (SELECT 1 FROM videodata_genres lnk \
             JOIN genre g ON g.id = lnk.genre_id \
             WHERE lnk.videodata_id = vd.id AND (LOWER(g.name) = LOWER($1) \
             OR LOWER(g.target_api) = LOWER($1) \
             OR LOWER(g.target_xml) = LOWER($1)))"
        ));
    }

    #[test]
    fn excluded_relation_uses_not_exists() {
        let criteria = CriteriaBuilder::new()
            .studio(Polarity::Exclude, "Ghibli")
            .build_unchecked();
        let sql = render_for(MetadataType::Season, &criteria);
        assert!(sql.contains("NOT EXISTS (SELECT 1 FROM series_studios lnk"));
        assert!(sql.contains("lnk.series_id = sea.series_id"));
        assert!(sql.contains("LOWER(st.name) = LOWER($1)"));
    }

    #[test]
    fn numeric_award_matches_by_id() {
        let criteria = CriteriaBuilder::new()
            .award(Polarity::Include, "12")
            .build_unchecked();
        let sql = render_for(MetadataType::Series, &criteria);
        assert!(sql.contains("aw.id = $1"));
        assert!(!sql.contains("LOWER(aw.event)"));
    }

    #[test]
    fn excluded_year_keeps_rows_without_a_year() {
        let criteria = CriteriaBuilder::new()
            .year(Polarity::Exclude, 1999)
            .build_unchecked();
        let sql = render_for(MetadataType::Series, &criteria);
        assert!(sql.ends_with(
            "(ser.start_year IS NULL OR NOT (ser.start_year = $1))"
        ));
    }

    #[test]
    fn combined_rating_groups_and_rounds_the_average() {
        let criteria = CriteriaBuilder::new()
            .combined_rating(Polarity::Include, 8)
            .build_unchecked();
        let sql = render_for(MetadataType::Episode, &criteria);
        assert!(sql.contains(
            "EXISTS (SELECT 1 FROM videodata_ratings r \
             WHERE r.videodata_id = vd.id GROUP BY r.videodata_id \
             HAVING ROUND((AVG(r.rating) / 10.0)) = $1)"
        ));
    }

    #[test]
    fn series_resolution_walks_episode_files() {
        let criteria = CriteriaBuilder::new()
            .resolution(Polarity::Include, Resolution::Hd1080)
            .build_unchecked();
        let sql = render_for(MetadataType::Series, &criteria);
        assert!(sql.contains("JOIN season es ON es.id = ev.season_id"));
        assert!(sql.contains("es.series_id = ser.id"));
        assert!(sql.contains("mf.extra = $1"));
        assert!(sql.contains("mf.width BETWEEN $2 AND $3"));
    }

    #[test]
    fn shared_extra_parameter_is_bound_once() {
        let criteria = CriteriaBuilder::new()
            .video_source(Polarity::Include, "BluRay")
            .resolution(Polarity::Exclude, Resolution::Sd)
            .build_unchecked();
        let schema = schema_for(MetadataType::Movie).unwrap();
        let mut params = ParamSet::new();
        FacetPredicates {
            criteria: &criteria,
            newest: None,
        }
        .apply(schema, schema.base(), &mut params)
        .unwrap();
        let extra_bindings = params
            .iter()
            .filter(|(name, _)| name.starts_with("extra"))
            .count();
        assert_eq!(extra_bindings, 1);
    }

    #[test]
    fn rating_without_source_is_an_error() {
        let criteria = FilterCriteria {
            rating: crate::query::Facet::Include(RatingFilter {
                source: None,
                value: 8,
            }),
            ..FilterCriteria::default()
        };
        let schema = schema_for(MetadataType::Movie).unwrap();
        let result = FacetPredicates {
            criteria: &criteria,
            newest: None,
        }
        .apply(schema, schema.base(), &mut ParamSet::new());
        assert!(matches!(
            result,
            Err(QueryError::InvalidFacetCombination(_))
        ));
    }

    #[test]
    fn search_folds_both_sides_in_the_store() {
        let criteria =
            CriteriaBuilder::new().search("Ōkami").build_unchecked();
        let schema = schema_for(MetadataType::Movie).unwrap();
        let mut params = ParamSet::new();
        let select = FacetPredicates {
            criteria: &criteria,
            newest: None,
        }
        .apply(schema, schema.base().select_one(), &mut params)
        .unwrap();
        let compiled = Renderer::new(Dialect::Sqlite, &params)
            .render_select(&select)
            .unwrap();
        assert!(
            compiled
                .sql
                .ends_with("LOWER(vd.title) LIKE LOWER(?1) ESCAPE '\\'")
        );
        assert_eq!(
            compiled.params,
            vec![crate::sql::SqlValue::Text("%Ōkami%".into())]
        );
    }
}
