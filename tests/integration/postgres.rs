//! Queries against a real PostGIS database.
//!
//! These tests require DATABASE_URL pointing at a loaded izza schema.

use std::sync::Arc;

use strum::IntoEnumIterator;
use tokio_test::assert_ok;

use izza_back::config::Config;
use izza_back::search::dto::LandFilterRequest;
use izza_back::search::{LandDataRangeService, MapSearchService, RegionType, UseZoneCategory};
use izza_back::store::prefix_sum::{
    AREA_BUCKET_SIZE, MAX_AREA_BUCKET, MAX_PRICE_BUCKET, PRICE_BUCKET_SIZE,
};
use izza_back::store::{CountLandQuery, LandFilter, LandStore, LongRange, PgStore, StatType};

/// Get a test config from environment.
fn test_config() -> Option<Config> {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").ok()?;
    Some(Config {
        database_url: Some(url),
        db_max_connections: 2,
        ..Config::default()
    })
}

async fn store() -> Option<Arc<dyn LandStore>> {
    let config = test_config()?;
    let store = assert_ok!(PgStore::connect(&config).await);
    Some(Arc::new(store))
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn ping_and_statistics() {
    let Some(store) = store().await else {
        println!("Skipping: DATABASE_URL not set");
        return;
    };

    assert_ok!(store.ping().await);
    for stat_type in StatType::iter() {
        if let Some(row) = assert_ok!(store.find_statistics(stat_type).await) {
            assert!(row.min_value <= row.max_value, "{} range inverted", stat_type);
        }
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn sido_regions_have_names() {
    let Some(store) = store().await else {
        println!("Skipping: DATABASE_URL not set");
        return;
    };

    let regions = assert_ok!(store.find_all_sido().await);
    for region in regions {
        assert_eq!(region.full_code.len(), 10);
        assert!(region.picker_name().is_some(), "{} has no name", region.full_code);
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn lands_by_full_code_stay_under_prefix() {
    let Some(store) = store().await else {
        println!("Skipping: DATABASE_URL not set");
        return;
    };

    let ranges = Arc::new(LandDataRangeService::new(
        Arc::clone(&store),
        std::time::Duration::from_secs(60),
    ));
    let search = MapSearchService::new(Arc::clone(&store), ranges, 100);

    let lands = assert_ok!(
        search
            .lands_by_full_code("51730", LandFilterRequest::default())
            .await
    );
    assert!(lands.iter().all(|l| l.full_code.starts_with("51730")));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn province_prefix_sum_matches_grouped_district_counts() {
    let Some(store) = store().await else {
        println!("Skipping: DATABASE_URL not set");
        return;
    };

    // Bucket-aligned bounds covering the whole prefix sum table.
    let filter = LandFilter {
        land_area: LongRange::new(0, (i64::from(MAX_AREA_BUCKET) + 1) * AREA_BUCKET_SIZE - 1),
        official_land_price: LongRange::new(
            0,
            (i64::from(MAX_PRICE_BUCKET) + 1) * PRICE_BUCKET_SIZE - 1,
        ),
        use_zone_categories: vec![UseZoneCategory::Industrial],
    };

    let sido = assert_ok!(store.find_all_sido().await);
    let Some(province) = sido.first() else {
        println!("Skipping: no provinces loaded");
        return;
    };
    let province_prefix = RegionType::Sido.prefix_of(&province.full_code).to_string();

    let by_prefix_sum = assert_ok!(
        store
            .count_lands_by_regions(&CountLandQuery {
                full_code_prefixes: vec![province_prefix.clone()],
                filter: filter.clone(),
            })
            .await
    );

    let districts = assert_ok!(store.find_regions_by_parent(&province.full_code).await);
    let district_prefixes: Vec<String> = districts
        .iter()
        .map(|r| RegionType::Sig.prefix_of(&r.full_code).to_string())
        .collect();
    let by_group_by = assert_ok!(
        store
            .count_lands_by_regions(&CountLandQuery {
                full_code_prefixes: district_prefixes.clone(),
                filter,
            })
            .await
    );

    assert!(by_group_by.keys().all(|k| district_prefixes.contains(k)));
    assert_eq!(
        by_prefix_sum.get(&province_prefix).copied().unwrap_or(0),
        by_group_by.values().sum::<i64>(),
        "prefix sum and grouped count disagree for {}",
        province_prefix
    );
}
