mod support;

use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use marquee_core::query::{NewestSource, Polarity};
use marquee_core::{CriteriaBuilder, EngineSettings};
use marquee_model::MetadataType;
use support::{Fixture, ids};

fn threshold() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

async fn three_movies() -> Fixture {
    let fx = Fixture::new().await;
    fx.movie(1, "Alpha", 2001).await;
    fx.movie(2, "Bravo", 2002).await;
    fx.movie(3, "Charlie", 2003).await;
    fx
}

async fn partition(
    fx: &Fixture,
    source: NewestSource,
) -> (BTreeSet<i64>, BTreeSet<i64>) {
    let service = fx.service();
    let mut sides = Vec::with_capacity(2);
    for polarity in [Polarity::Include, Polarity::Exclude] {
        let criteria = CriteriaBuilder::new()
            .with_type(MetadataType::Movie)
            .newest(polarity, source, threshold())
            .build()
            .expect("valid");
        let page = service.list(&criteria).await.expect("list");
        sides.push(ids(&page).into_iter().collect::<BTreeSet<_>>());
    }
    let exclude = sides.pop().unwrap_or_default();
    let include = sides.pop().unwrap_or_default();
    (include, exclude)
}

#[tokio::test]
async fn creation_partitions_are_complementary() {
    let fx = three_movies().await;
    fx.exec(
        "UPDATE videodata SET create_timestamp = '2023-06-01 00:00:00' \
             WHERE id = 1; \
         UPDATE videodata SET create_timestamp = '2024-03-01 12:00:00' \
             WHERE id = 2; \
         UPDATE videodata SET create_timestamp = '2024-01-01 00:00:00' \
             WHERE id = 3;",
    )
    .await;

    let (include, exclude) = partition(&fx, NewestSource::Creation).await;
    assert_eq!(include, BTreeSet::from([2, 3]));
    assert_eq!(exclude, BTreeSet::from([1]));
    assert!(include.is_disjoint(&exclude));
}

#[tokio::test]
async fn last_scan_treats_unscanned_rows_as_newest() {
    let fx = three_movies().await;
    fx.exec(
        "UPDATE videodata SET last_scanned = '2023-12-31 23:59:59' \
             WHERE id = 1; \
         UPDATE videodata SET last_scanned = '2024-02-01 10:00:00' \
             WHERE id = 2;",
    )
    .await;

    let (include, exclude) = partition(&fx, NewestSource::LastScan).await;
    assert_eq!(include, BTreeSet::from([2, 3]));
    assert_eq!(exclude, BTreeSet::from([1]));
    // Movie 3 was never scanned: it satisfies include and can never
    // satisfy exclude.
    assert!(include.contains(&3));
    assert!(!exclude.contains(&3));
}

#[tokio::test]
async fn stored_timestamp_layouts_compare_as_instants() {
    let fx = three_movies().await;
    fx.exec(
        "UPDATE videodata SET create_timestamp = '2024-01-01T08:00:00Z' \
             WHERE id = 1; \
         UPDATE videodata SET create_timestamp = '2024-01-01T13:00:00+00:00' \
             WHERE id = 2; \
         UPDATE videodata SET create_timestamp = '2024-01-01T14:00:00+04:00' \
             WHERE id = 3;",
    )
    .await;
    let noon = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let service = fx.service();

    let listed = |polarity: Polarity| {
        let criteria = CriteriaBuilder::new()
            .with_type(MetadataType::Movie)
            .newest(polarity, NewestSource::Creation, noon)
            .build()
            .expect("valid");
        let service = &service;
        async move {
            let page = service.list(&criteria).await.expect("list");
            ids(&page).into_iter().collect::<BTreeSet<_>>()
        }
    };

    assert_eq!(listed(Polarity::Include).await, BTreeSet::from([2]));
    assert_eq!(listed(Polarity::Exclude).await, BTreeSet::from([1, 3]));
}

#[tokio::test]
async fn file_date_uses_latest_countable_video_file() {
    let fx = three_movies().await;
    fx.video_file(10, 1, "2023-05-01 00:00:00", false, "DONE").await;
    fx.video_file(20, 2, "2023-01-01 00:00:00", false, "DONE").await;
    fx.video_file(21, 2, "2024-05-01 00:00:00", false, "DONE").await;
    // Neither file of movie 3 counts: one is deleted, the other is an extra.
    fx.video_file(30, 3, "2024-02-01 00:00:00", false, "DELETED").await;
    fx.video_file(31, 3, "2024-06-01 00:00:00", true, "DONE").await;

    let (include, exclude) = partition(&fx, NewestSource::FileDate).await;
    assert_eq!(include, BTreeSet::from([2]));
    assert_eq!(exclude, BTreeSet::from([1]));
    assert!(!include.contains(&3) && !exclude.contains(&3));

    let criteria = CriteriaBuilder::new()
        .with_type(MetadataType::Movie)
        .newest(Polarity::Include, NewestSource::FileDate, threshold())
        .build()
        .expect("valid");
    let page = fx.service().list(&criteria).await.expect("list");
    let newest = page.rows().next().and_then(|row| row.newest);
    let may = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    assert_eq!(newest, Some(may));
}

#[tokio::test]
async fn newest_sort_uses_configured_fallback_source() {
    let fx = three_movies().await;
    fx.video_file(10, 1, "2023-05-01 00:00:00", false, "DONE").await;
    fx.video_file(20, 2, "2024-05-01 00:00:00", false, "DONE").await;
    fx.exec(
        "UPDATE videodata SET create_timestamp = '2023-06-01 00:00:00' \
             WHERE id = 1; \
         UPDATE videodata SET create_timestamp = '2024-03-01 00:00:00' \
             WHERE id = 2; \
         UPDATE videodata SET create_timestamp = '2024-01-01 00:00:00' \
             WHERE id = 3;",
    )
    .await;
    let criteria = CriteriaBuilder::new()
        .with_type(MetadataType::Movie)
        .newest_first()
        .build()
        .expect("valid");

    let by_file_date = fx.service().list(&criteria).await.expect("list");
    assert_eq!(ids(&by_file_date), vec![2, 1, 3]);
    assert_eq!(by_file_date.items[2].row.newest, None);

    let by_creation = fx
        .service_with(EngineSettings {
            default_newest_source: NewestSource::Creation,
            ..EngineSettings::default()
        })
        .list(&criteria)
        .await
        .expect("list");
    assert_eq!(ids(&by_creation), vec![2, 3, 1]);
}

#[tokio::test]
async fn series_newest_walks_episode_files() {
    let fx = Fixture::new().await;
    fx.series(1, "Firefly", 2002).await;
    fx.season(10, 1, 1, 2002).await;
    fx.episode(100, 10, 1, "Serenity", None).await;
    fx.series(2, "Lost", 2004).await;
    fx.season(20, 2, 1, 2004).await;
    fx.episode(200, 20, 1, "Pilot", None).await;
    fx.video_file(1, 100, "2024-07-01 00:00:00", false, "DONE").await;
    fx.video_file(2, 200, "2022-07-01 00:00:00", false, "DONE").await;

    let criteria = CriteriaBuilder::new()
        .types([MetadataType::Series, MetadataType::Season])
        .newest(Polarity::Include, NewestSource::FileDate, threshold())
        .build()
        .expect("valid");
    let page = fx.service().list(&criteria).await.expect("list");
    let keys: BTreeSet<_> = page.rows().map(|row| row.key()).collect();
    assert_eq!(
        keys,
        BTreeSet::from([(MetadataType::Series, 1), (MetadataType::Season, 10)])
    );
}
