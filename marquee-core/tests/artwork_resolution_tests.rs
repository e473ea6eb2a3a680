mod support;

use std::collections::{BTreeMap, BTreeSet};

use marquee_core::query::ArtworkRequest;
use marquee_core::{
    ArtworkResolver, CriteriaBuilder, EngineSettings, LanguagePriority,
    QueryPhase, VideoQueryService,
};
use marquee_model::{ArtworkType, MetadataType};
use support::{Fixture, RecordingStore};

/// Movies 1..=3. Movie 2 has two usable located posters and one invalid
/// one; movie 1 has a poster slot without any located instance; movie 3 only
/// has fanart.
async fn posters() -> Fixture {
    let fx = Fixture::new().await;
    fx.movie(1, "Alpha", 2001).await;
    fx.movie(2, "Bravo", 2002).await;
    fx.movie(3, "Charlie", 2003).await;
    fx.exec(
        "INSERT INTO artwork (id, artwork_type, videodata_id) VALUES \
             (10, 'POSTER', 1), (20, 'POSTER', 2), (30, 'FANART', 3); \
         INSERT INTO artwork_located \
             (id, artwork_id, source, hash, language_code, status, \
             create_timestamp) VALUES \
             (200, 20, 'tmdb', 'a1', 'en', 'DONE', '2024-01-01 00:00:00'), \
             (201, 20, 'fanarttv', 'b2', NULL, 'DONE', '2024-02-01 00:00:00'), \
             (202, 20, 'tmdb', 'c3', 'de', 'INVALID', '2024-03-01 00:00:00'), \
             (300, 30, 'tmdb', 'd4', 'en', 'DONE', '2024-01-01 00:00:00'); \
         INSERT INTO artwork_generated \
             (id, located_id, profile, cache_dir, cache_filename) VALUES \
             (900, 201, 'thumb', 'posters/20/', '201.jpg');",
    )
    .await;
    fx
}

fn movies(ids: &[i64]) -> BTreeMap<MetadataType, Vec<i64>> {
    BTreeMap::from([(MetadataType::Movie, ids.to_vec())])
}

fn posters_only() -> ArtworkRequest {
    ArtworkRequest::new([ArtworkType::Poster])
}

#[tokio::test]
async fn groups_located_instances_by_owner_in_requested_order() {
    let fx = posters().await;
    let store = fx.store();
    let resolver = ArtworkResolver::new();

    let ascending = resolver
        .resolve(&store, &movies(&[1, 2, 3]), &posters_only())
        .await
        .expect("resolve");
    assert_eq!(ascending.len(), 1);
    let refs = &ascending[&(MetadataType::Movie, 2)];
    assert_eq!(
        refs.iter().map(|r| r.located_id).collect::<Vec<_>>(),
        vec![200, 201]
    );
    assert!(!ascending.contains_key(&(MetadataType::Movie, 1)));
    assert!(!ascending.contains_key(&(MetadataType::Movie, 3)));

    let descending = resolver
        .resolve(
            &store,
            &movies(&[1, 2, 3]),
            &ArtworkRequest::new([ArtworkType::Poster]).newest_first(),
        )
        .await
        .expect("resolve");
    assert_eq!(
        descending[&(MetadataType::Movie, 2)]
            .iter()
            .map(|r| r.located_id)
            .collect::<Vec<_>>(),
        vec![201, 200]
    );
}

#[tokio::test]
async fn renditions_are_joined_for_the_requested_profile() {
    let fx = posters().await;
    let store = fx.store();

    let map = ArtworkResolver::new()
        .with_default_profile(Some("thumb".into()))
        .resolve(&store, &movies(&[2]), &posters_only())
        .await
        .expect("resolve");
    let refs = &map[&(MetadataType::Movie, 2)];
    let cached = refs.iter().find(|r| r.located_id == 201).expect("201");
    assert_eq!(cached.generated_id, Some(900));
    assert_eq!(cached.cache_path().as_deref(), Some("posters/20/201.jpg"));
    let uncached = refs.iter().find(|r| r.located_id == 200).expect("200");
    assert_eq!(uncached.generated_id, None);

    // The request's own profile wins over the default.
    let map = ArtworkResolver::new()
        .with_default_profile(Some("thumb".into()))
        .resolve(
            &store,
            &movies(&[2]),
            &ArtworkRequest::new([ArtworkType::Poster]).with_profile("full"),
        )
        .await
        .expect("resolve");
    assert!(map[&(MetadataType::Movie, 2)].iter().all(|r| !r.is_cached()));
}

#[tokio::test]
async fn empty_buckets_emit_no_subquery() {
    let fx = posters().await;
    fx.series(7, "Firefly", 2002).await;
    fx.exec(
        "INSERT INTO artwork (id, artwork_type, series_id) VALUES \
             (70, 'BANNER', 7); \
         INSERT INTO artwork_located (id, artwork_id, create_timestamp) VALUES \
             (700, 70, '2024-01-01 00:00:00');",
    )
    .await;
    let store = RecordingStore::new(fx.store());
    let resolver = ArtworkResolver::new();

    let owners = BTreeMap::from([
        (MetadataType::Movie, Vec::new()),
        (MetadataType::Series, vec![7]),
    ]);
    let map = resolver
        .resolve(&store, &owners, &ArtworkRequest::new([ArtworkType::Banner]))
        .await
        .expect("resolve");
    assert_eq!(map[&(MetadataType::Series, 7)].len(), 1);

    let statements = store.statements();
    assert_eq!(statements.len(), 1);
    assert!(!statements[0].contains("videodata"));
    assert!(statements[0].contains("FROM series o"));

    let nothing = resolver
        .resolve(
            &store,
            &movies(&[]),
            &posters_only(),
        )
        .await
        .expect("resolve");
    assert!(nothing.is_empty());
    assert_eq!(store.statements().len(), 1);
}

#[tokio::test]
async fn movie_branch_ignores_episode_artwork() {
    let fx = posters().await;
    fx.series(1, "Firefly", 2002).await;
    fx.season(10, 1, 1, 2002).await;
    fx.episode(4, 10, 1, "Serenity", None).await;
    fx.exec(
        "INSERT INTO artwork (id, artwork_type, videodata_id) VALUES \
             (40, 'VIDEOIMAGE', 4); \
         INSERT INTO artwork_located (id, artwork_id, create_timestamp) VALUES \
             (400, 40, '2024-01-01 00:00:00');",
    )
    .await;
    let store = fx.store();
    let request = ArtworkRequest::new([ArtworkType::VideoImage]);

    let as_movie = ArtworkResolver::new()
        .resolve(&store, &movies(&[4]), &request)
        .await
        .expect("resolve");
    assert!(as_movie.is_empty());

    let as_episode = ArtworkResolver::new()
        .resolve(
            &store,
            &BTreeMap::from([(MetadataType::Episode, vec![4])]),
            &request,
        )
        .await
        .expect("resolve");
    assert_eq!(as_episode[&(MetadataType::Episode, 4)][0].located_id, 400);
}

#[tokio::test]
async fn people_and_boxed_sets_own_artwork_too() {
    let fx = Fixture::new().await;
    fx.exec(
        "INSERT INTO person (id, name) VALUES (1, 'Nathan Fillion'); \
         INSERT INTO boxed_set (id, name) VALUES (1, 'Alien Anthology'); \
         INSERT INTO artwork (id, artwork_type, person_id) VALUES \
             (1, 'PHOTO', 1); \
         INSERT INTO artwork (id, artwork_type, boxedset_id) VALUES \
             (2, 'POSTER', 1); \
         INSERT INTO artwork_located (id, artwork_id, create_timestamp) VALUES \
             (11, 1, '2024-01-01 00:00:00'), \
             (22, 2, '2024-01-02 00:00:00');",
    )
    .await;
    let owners = BTreeMap::from([
        (MetadataType::Person, vec![1]),
        (MetadataType::BoxedSet, vec![1]),
    ]);
    let map = fx
        .service()
        .resolve_artwork(
            &owners,
            &ArtworkRequest::new([ArtworkType::Photo, ArtworkType::Poster]),
        )
        .await
        .expect("resolve");
    let keys: BTreeSet<_> = map.keys().copied().collect();
    assert_eq!(
        keys,
        BTreeSet::from([(MetadataType::Person, 1), (MetadataType::BoxedSet, 1)])
    );
    assert_eq!(
        map[&(MetadataType::BoxedSet, 1)][0].artwork_type,
        ArtworkType::Poster
    );
}

#[tokio::test]
async fn listing_attaches_artwork_to_each_row() {
    let fx = posters().await;
    let criteria = CriteriaBuilder::new()
        .with_type(MetadataType::Movie)
        .artwork([ArtworkType::Poster])
        .build()
        .expect("valid");
    let service = fx.service_with(EngineSettings {
        language: LanguagePriority::new(Some("fr".into()), Some("en".into())),
        ..EngineSettings::default()
    });

    let page = service.list(&criteria).await.expect("list");
    assert_eq!(page.items.len(), 3);
    for item in &page.items {
        let expected = if item.row.id == 2 { 2 } else { 0 };
        assert_eq!(item.artwork.len(), expected, "movie {}", item.row.id);
    }

    let bravo = page.items.iter().find(|item| item.row.id == 2).expect("bravo");
    let preferred = service
        .preferred_artwork(bravo, ArtworkType::Poster)
        .expect("poster");
    assert_eq!(preferred.located_id, 200);

    // Without an English fallback the language-neutral poster wins.
    let french_only = fx.service_with(EngineSettings {
        language: LanguagePriority::new(Some("fr".into()), None),
        ..EngineSettings::default()
    });
    assert_eq!(
        french_only
            .preferred_artwork(bravo, ArtworkType::Poster)
            .expect("poster")
            .located_id,
        201
    );
}

#[tokio::test]
async fn artwork_failure_aborts_the_listing() {
    let fx = posters().await;
    fx.exec("DELETE FROM artwork_generated; DROP TABLE artwork_located;")
        .await;
    let criteria = CriteriaBuilder::new()
        .with_type(MetadataType::Movie)
        .artwork([ArtworkType::Poster])
        .build()
        .expect("valid");
    let service = VideoQueryService::new(fx.store(), EngineSettings::default());

    let err = service.list(&criteria).await.expect_err("artwork must fail");
    assert_eq!(err.phase(), Some(QueryPhase::Artwork));
}
