//! PostGIS-backed [`LandStore`].

use std::collections::HashMap;
use std::str::FromStr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, QueryBuilder};
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::geo::{parse_optional_rings, Bounds, Point, PolygonRings};
use crate::metrics::record_db_latency;
use crate::search::types::RegionType;
use crate::search::zone::EXCLUDED_LAND_USE_CODES;

use super::prefix_sum::{combine, BucketWindow};
use super::{
    CountLandQuery, Disaster, ElectricityCost, FullCodeLandQuery, Land, LandFilter,
    LandSearchQuery, LandStatistics, LandStore, LongRange, PopulationAggregate,
    PowerInfrastructureSummary, Region, StatType, LAND_PAGE_SIZE,
};

const LAND_COLUMNS: &str = r#"
    l.id::int8 AS id,
    l.shape_id::int8 AS shape_id,
    l.unique_no,
    l.full_code,
    l.address,
    l.ledger_division_code::int2 AS ledger_division_code,
    l.ledger_division_name,
    l.base_year::int2 AS base_year,
    l.base_month::int2 AS base_month,
    l.land_category_code::int2 AS land_category_code,
    l.land_category_name,
    l.land_area::numeric AS land_area,
    l.use_district_code1::int2 AS use_district_code1,
    l.use_district_name1,
    l.land_use_code::int2 AS land_use_code,
    l.land_use_name,
    l.terrain_height_code::int2 AS terrain_height_code,
    l.terrain_height_name,
    l.terrain_shape_code::int2 AS terrain_shape_code,
    l.terrain_shape_name,
    l.road_side_code::int2 AS road_side_code,
    l.road_side_name,
    l.official_land_price::numeric AS official_land_price,
    l.data_standard_date::timestamp AS data_standard_date,
    l.use_zone_category"#;

const LAND_GIS_COLUMNS: &str = r#",
    ST_AsGeoJSON(lg.boundary) AS boundary_geojson,
    ST_X(lg.center_point) AS center_lng,
    ST_Y(lg.center_point) AS center_lat
    FROM land l
    LEFT JOIN land_gis lg ON l.id = lg.land_id"#;

const LAND_ONLY_COLUMNS: &str = r#",
    NULL::text AS boundary_geojson,
    NULL::float8 AS center_lng,
    NULL::float8 AS center_lat
    FROM land l"#;

const REGION_COLUMNS: &str = r#"
    SELECT full_code,
           beopjung_dong_name AS korean_name,
           dong_type,
           sido,
           sig,
           emd,
           ri,
           parent_code,
           ST_X(center_point) AS center_lng,
           ST_Y(center_point) AS center_lat
    FROM beopjeong_dong"#;

#[derive(Debug, FromRow)]
struct LandRow {
    id: i64,
    shape_id: Option<i64>,
    unique_no: Option<String>,
    full_code: String,
    address: Option<String>,
    ledger_division_code: Option<i16>,
    ledger_division_name: Option<String>,
    base_year: Option<i16>,
    base_month: Option<i16>,
    land_category_code: Option<i16>,
    land_category_name: Option<String>,
    land_area: Option<Decimal>,
    use_district_code1: Option<i16>,
    use_district_name1: Option<String>,
    land_use_code: Option<i16>,
    land_use_name: Option<String>,
    terrain_height_code: Option<i16>,
    terrain_height_name: Option<String>,
    terrain_shape_code: Option<i16>,
    terrain_shape_name: Option<String>,
    road_side_code: Option<i16>,
    road_side_name: Option<String>,
    official_land_price: Option<Decimal>,
    data_standard_date: Option<NaiveDateTime>,
    use_zone_category: Option<String>,
    boundary_geojson: Option<String>,
    center_lng: Option<f64>,
    center_lat: Option<f64>,
}

fn point_of(lng: Option<f64>, lat: Option<f64>) -> Option<Point> {
    match (lng, lat) {
        (Some(lng), Some(lat)) => Some(Point::new(lng, lat)),
        _ => None,
    }
}

impl TryFrom<LandRow> for Land {
    type Error = StoreError;

    fn try_from(row: LandRow) -> Result<Self, Self::Error> {
        Ok(Land {
            boundary: parse_optional_rings(row.boundary_geojson.as_deref())?,
            center_point: point_of(row.center_lng, row.center_lat),
            id: row.id,
            shape_id: row.shape_id,
            unique_no: row.unique_no,
            full_code: row.full_code,
            address: row.address,
            ledger_division_code: row.ledger_division_code,
            ledger_division_name: row.ledger_division_name,
            base_year: row.base_year,
            base_month: row.base_month,
            land_category_code: row.land_category_code,
            land_category_name: row.land_category_name,
            land_area: row.land_area,
            use_district_code1: row.use_district_code1,
            use_district_name1: row.use_district_name1,
            land_use_code: row.land_use_code,
            land_use_name: row.land_use_name,
            terrain_height_code: row.terrain_height_code,
            terrain_height_name: row.terrain_height_name,
            terrain_shape_code: row.terrain_shape_code,
            terrain_shape_name: row.terrain_shape_name,
            road_side_code: row.road_side_code,
            road_side_name: row.road_side_name,
            official_land_price: row.official_land_price,
            data_standard_date: row.data_standard_date,
            use_zone_category: row.use_zone_category,
        })
    }
}

fn lands_from_rows(rows: Vec<LandRow>) -> StoreResult<Vec<Land>> {
    rows.into_iter().map(Land::try_from).collect()
}

#[derive(Debug, FromRow)]
struct RegionRow {
    full_code: String,
    korean_name: String,
    dong_type: String,
    sido: Option<String>,
    sig: Option<String>,
    emd: Option<String>,
    ri: Option<String>,
    parent_code: Option<String>,
    center_lng: Option<f64>,
    center_lat: Option<f64>,
}

impl TryFrom<RegionRow> for Region {
    type Error = StoreError;

    fn try_from(row: RegionRow) -> Result<Self, Self::Error> {
        let region_type = RegionType::from_str(&row.dong_type)
            .map_err(|_| StoreError::Decode(format!("unknown dong_type {}", row.dong_type)))?;

        Ok(Region {
            full_code: row.full_code,
            korean_name: row.korean_name,
            region_type,
            sido_name: row.sido,
            sig_name: row.sig,
            emd_name: row.emd,
            ri_name: row.ri,
            parent_code: row.parent_code,
            center_point: point_of(row.center_lng, row.center_lat),
        })
    }
}

fn regions_from_rows(rows: Vec<RegionRow>) -> StoreResult<Vec<Region>> {
    rows.into_iter().map(Region::try_from).collect()
}

#[derive(Debug, FromRow)]
struct StatisticsRow {
    stat_type: String,
    min_value: i64,
    max_value: i64,
    updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, FromRow)]
struct ElectricityRow {
    full_code: String,
    year: Option<i32>,
    month: Option<i32>,
    metro: Option<String>,
    city: Option<String>,
    unit_cost: Option<Decimal>,
}

#[derive(Debug, FromRow)]
struct DisasterRow {
    id: i64,
    region_name: Option<String>,
    disaster_type: Option<String>,
    count: Option<i32>,
    full_code: String,
}

#[derive(Debug, FromRow)]
struct PopulationRow {
    reference_month: Option<String>,
    sido: Option<String>,
    sig: Option<String>,
    total: Option<i64>,
    age_0_9: Option<i64>,
    age_10_19: Option<i64>,
    age_20_29: Option<i64>,
    age_30_39: Option<i64>,
    age_40_49: Option<i64>,
    age_50_59: Option<i64>,
    age_60_69: Option<i64>,
    age_70_79: Option<i64>,
    age_80_plus: Option<i64>,
    male: Option<i64>,
    female: Option<i64>,
}

#[derive(Debug, FromRow)]
struct PowerInfrastructureRow {
    land_id: i64,
    substation_count: Option<i32>,
    substation_closest_distance_meters: Option<Decimal>,
    transmission_line_count: Option<i32>,
    transmission_line_closest_distance_meters: Option<Decimal>,
    transmission_tower_count: Option<i32>,
    transmission_tower_closest_distance_meters: Option<Decimal>,
    total_infrastructure_count: Option<i32>,
    has_high_voltage: Option<bool>,
}

#[derive(Debug, FromRow)]
struct PrefixSumRow {
    key_prefix: String,
    use_zone_category: String,
    area_bucket: i32,
    price_bucket: i32,
    cumulative_count: i64,
}

/// `AND <column> = ANY($n)`, skipped when `values` is empty.
fn push_any_text(qb: &mut QueryBuilder<'_, Postgres>, column: &str, values: Vec<String>) {
    if values.is_empty() {
        return;
    }
    qb.push(format!(" AND {column} = ANY("))
        .push_bind(values)
        .push(")");
}

/// `AND <column> BETWEEN $n AND $m`.
fn push_between(qb: &mut QueryBuilder<'_, Postgres>, column: &str, range: LongRange) {
    qb.push(format!(" AND {column} BETWEEN "))
        .push_bind(Decimal::from(range.min))
        .push(" AND ")
        .push_bind(Decimal::from(range.max));
}

/// Category, area and price conditions on the `l` alias.
fn push_land_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &LandFilter) {
    push_any_text(qb, "l.use_zone_category", filter.category_names());
    push_between(qb, "l.land_area", filter.land_area);
    push_between(qb, "l.official_land_price", filter.official_land_price);
}

/// Drops roads, rivers and similar parcels. `<> ALL` rejects NULL codes.
fn push_land_use_exclusion(qb: &mut QueryBuilder<'_, Postgres>) {
    qb.push(" AND l.land_use_code <> ALL(")
        .push_bind(EXCLUDED_LAND_USE_CODES.to_vec())
        .push(")");
}

fn push_full_code_prefix(qb: &mut QueryBuilder<'_, Postgres>, full_code: &str) {
    qb.push(" AND LEFT(l.full_code, ")
        .push_bind(full_code.chars().count() as i32)
        .push(") = ")
        .push_bind(full_code.to_string());
}

/// Postgres store over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Build the pool from configuration and check out one connection.
    pub async fn connect(config: &Config) -> StoreResult<Self> {
        let mut options = match &config.database_url {
            Some(url) => PgConnectOptions::from_str(url)?,
            None => PgConnectOptions::new()
                .host(&config.db_host)
                .port(config.db_port)
                .database(&config.db_name),
        };
        // Resolved secrets land in these fields and win over the URL.
        if let Some(username) = &config.db_username {
            options = options.username(username);
        }
        if let Some(password) = &config.db_password {
            options = options.password(password);
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_seconds))
            .connect_with(options)
            .await?;

        let conn = pool.acquire().await?;
        drop(conn);

        info!(
            database = %config.database_target(),
            max_connections = config.db_max_connections,
            "Database pool ready"
        );

        Ok(Self { pool })
    }

    async fn count_with_prefix_sum(
        &self,
        query: &CountLandQuery,
    ) -> StoreResult<HashMap<String, i64>> {
        let window = BucketWindow::from_filter(&query.filter);
        let terms = window.terms();

        let mut area_buckets: Vec<i32> = terms.iter().map(|t| t.area_bucket).collect();
        area_buckets.sort_unstable();
        area_buckets.dedup();
        let mut price_buckets: Vec<i32> = terms.iter().map(|t| t.price_bucket).collect();
        price_buckets.sort_unstable();
        price_buckets.dedup();

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT key_prefix, use_zone_category, area_bucket::int4 AS area_bucket, \
             price_bucket::int4 AS price_bucket, \
             COALESCE(cumulative_count, 0)::int8 AS cumulative_count \
             FROM land_statistics_prefix_sum WHERE key_prefix = ANY(",
        );
        qb.push_bind(query.full_code_prefixes.clone())
            .push(") AND use_zone_category = ANY(")
            .push_bind(query.filter.category_names())
            .push(") AND area_bucket = ANY(")
            .push_bind(area_buckets)
            .push(") AND price_bucket = ANY(")
            .push_bind(price_buckets)
            .push(")");

        let start = Instant::now();
        let rows: Vec<PrefixSumRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        record_db_latency(start, "count_lands_prefix_sum");

        let mut cells: HashMap<(&str, &str, i32, i32), i64> = HashMap::with_capacity(rows.len());
        for row in &rows {
            cells.insert(
                (
                    row.key_prefix.as_str(),
                    row.use_zone_category.as_str(),
                    row.area_bucket,
                    row.price_bucket,
                ),
                row.cumulative_count,
            );
        }

        let categories = query.filter.category_names();
        let mut counts = HashMap::with_capacity(query.full_code_prefixes.len());
        for prefix in &query.full_code_prefixes {
            let total: i64 = categories
                .iter()
                .map(|category| {
                    combine(&terms, |a, p| {
                        cells
                            .get(&(prefix.as_str(), category.as_str(), a, p))
                            .copied()
                    })
                })
                .sum();
            debug!(region = %prefix, count = total, "prefix sum count");
            counts.insert(prefix.clone(), total);
        }

        Ok(counts)
    }

    async fn count_with_group_by(
        &self,
        query: &CountLandQuery,
        prefix_len: usize,
    ) -> StoreResult<HashMap<String, i64>> {
        let len = prefix_len as i32;
        let mut qb = QueryBuilder::<Postgres>::new("SELECT LEFT(l.full_code, ");
        qb.push_bind(len)
            .push(") AS region_code, COUNT(*) AS land_count FROM land l WHERE LEFT(l.full_code, ")
            .push_bind(len)
            .push(") = ANY(")
            .push_bind(query.full_code_prefixes.clone())
            .push(")");
        push_land_filter(&mut qb, &query.filter);
        qb.push(" GROUP BY 1");

        let start = Instant::now();
        let rows: Vec<(String, i64)> = qb.build_query_as().fetch_all(&self.pool).await?;
        record_db_latency(start, "count_lands_group_by");

        Ok(rows.into_iter().collect())
    }
}

#[async_trait]
impl LandStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn find_regions_in_bounds(
        &self,
        region_type: RegionType,
        bounds: Bounds,
    ) -> StoreResult<Vec<Region>> {
        let mut qb = QueryBuilder::<Postgres>::new(REGION_COLUMNS);
        qb.push(" WHERE ST_Contains(ST_MakeEnvelope(")
            .push_bind(bounds.south_west.lng)
            .push(", ")
            .push_bind(bounds.south_west.lat)
            .push(", ")
            .push_bind(bounds.north_east.lng)
            .push(", ")
            .push_bind(bounds.north_east.lat)
            .push(", 4326), center_point) AND dong_type = ")
            .push_bind(region_type.to_string());

        let start = Instant::now();
        let rows: Vec<RegionRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        record_db_latency(start, "find_regions_in_bounds");

        regions_from_rows(rows)
    }

    async fn find_region(&self, full_code: &str) -> StoreResult<Option<Region>> {
        let sql = format!("{REGION_COLUMNS} WHERE full_code = $1");
        let row: Option<RegionRow> = sqlx::query_as(&sql)
            .bind(full_code)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Region::try_from).transpose()
    }

    async fn find_region_polygon(&self, full_code: &str) -> StoreResult<PolygonRings> {
        let geojson: Option<Option<String>> = sqlx::query_scalar(
            "SELECT ST_AsGeoJSON(boundary) FROM beopjeong_dong WHERE full_code = $1",
        )
        .bind(full_code)
        .fetch_optional(&self.pool)
        .await?;
        parse_optional_rings(geojson.flatten().as_deref())
    }

    async fn find_all_sido(&self) -> StoreResult<Vec<Region>> {
        let sql = format!("{REGION_COLUMNS} WHERE dong_type = $1 ORDER BY full_code");
        let rows: Vec<RegionRow> = sqlx::query_as(&sql)
            .bind(RegionType::Sido.to_string())
            .fetch_all(&self.pool)
            .await?;
        regions_from_rows(rows)
    }

    async fn find_regions_by_parent(&self, parent_code: &str) -> StoreResult<Vec<Region>> {
        let sql = format!("{REGION_COLUMNS} WHERE parent_code = $1 ORDER BY full_code");
        let rows: Vec<RegionRow> = sqlx::query_as(&sql)
            .bind(parent_code)
            .fetch_all(&self.pool)
            .await?;
        regions_from_rows(rows)
    }

    #[instrument(skip(self, query), level = "debug")]
    async fn find_lands(&self, query: &LandSearchQuery) -> StoreResult<Vec<Land>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT");
        qb.push(LAND_COLUMNS).push(LAND_GIS_COLUMNS).push(" WHERE 1=1");

        if let Some(bounds) = query.bounds {
            qb.push(" AND ST_Contains(ST_MakeEnvelope(")
                .push_bind(bounds.south_west.lng)
                .push(", ")
                .push_bind(bounds.south_west.lat)
                .push(", ")
                .push_bind(bounds.north_east.lng)
                .push(", ")
                .push_bind(bounds.north_east.lat)
                .push(", 4326), lg.center_point)");
        }
        push_land_filter(&mut qb, &query.filter);
        push_land_use_exclusion(&mut qb);
        qb.push(" ORDER BY l.id");
        if let Some(limit) = query.limit {
            qb.push(" LIMIT ").push_bind(limit);
        }

        let start = Instant::now();
        let rows: Vec<LandRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        record_db_latency(start, "find_lands");

        lands_from_rows(rows)
    }

    async fn find_land(&self, id: i64) -> StoreResult<Option<Land>> {
        let sql = format!("SELECT {LAND_COLUMNS}{LAND_GIS_COLUMNS} WHERE l.id = $1");
        let row: Option<LandRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Land::try_from).transpose()
    }

    async fn find_lands_by_ids(&self, ids: &[i64]) -> StoreResult<Vec<Land>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {LAND_COLUMNS}{LAND_GIS_COLUMNS} WHERE l.id = ANY($1) ORDER BY l.id"
        );
        let start = Instant::now();
        let rows: Vec<LandRow> = sqlx::query_as(&sql)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;
        record_db_latency(start, "find_lands_by_ids");

        lands_from_rows(rows)
    }

    #[instrument(skip(self, query), fields(full_code = %query.full_code), level = "debug")]
    async fn find_lands_by_full_code(&self, query: &FullCodeLandQuery) -> StoreResult<Vec<Land>> {
        let mut lands = Vec::new();
        let mut last_id = 0i64;
        let start = Instant::now();

        loop {
            let mut qb = QueryBuilder::<Postgres>::new("SELECT");
            qb.push(LAND_COLUMNS).push(LAND_ONLY_COLUMNS).push(" WHERE l.id > ");
            qb.push_bind(last_id);
            push_full_code_prefix(&mut qb, &query.full_code);
            push_land_filter(&mut qb, &query.filter);
            push_land_use_exclusion(&mut qb);
            qb.push(" ORDER BY l.id LIMIT ").push_bind(LAND_PAGE_SIZE);

            let rows: Vec<LandRow> = qb.build_query_as().fetch_all(&self.pool).await?;
            let page_len = rows.len() as i64;
            let page = lands_from_rows(rows)?;

            match page.last() {
                Some(last) => last_id = last.id,
                None => break,
            }
            lands.extend(page);

            if page_len < LAND_PAGE_SIZE {
                break;
            }
        }

        record_db_latency(start, "find_lands_by_full_code");
        debug!(count = lands.len(), "lands loaded by full code");
        Ok(lands)
    }

    async fn count_lands_by_full_code(&self, query: &FullCodeLandQuery) -> StoreResult<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM land l WHERE 1=1");
        push_full_code_prefix(&mut qb, &query.full_code);
        push_land_filter(&mut qb, &query.filter);
        push_land_use_exclusion(&mut qb);

        let start = Instant::now();
        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        record_db_latency(start, "count_lands_by_full_code");

        Ok(count)
    }

    #[instrument(skip(self, query), fields(regions = query.full_code_prefixes.len()), level = "debug")]
    async fn count_lands_by_regions(
        &self,
        query: &CountLandQuery,
    ) -> StoreResult<HashMap<String, i64>> {
        let Some(first) = query.full_code_prefixes.first() else {
            return Ok(HashMap::new());
        };

        match first.chars().count() {
            2 => self.count_with_prefix_sum(query).await,
            len => self.count_with_group_by(query, len).await,
        }
    }

    async fn find_land_polygon(&self, land_id: i64) -> StoreResult<PolygonRings> {
        let geojson: Option<Option<String>> =
            sqlx::query_scalar("SELECT ST_AsGeoJSON(boundary) FROM land_gis WHERE land_id = $1")
                .bind(land_id)
                .fetch_optional(&self.pool)
                .await?;
        parse_optional_rings(geojson.flatten().as_deref())
    }

    async fn land_area_range_by_region(&self, prefix: &str) -> StoreResult<Option<LongRange>> {
        let (min, max): (Option<i64>, Option<i64>) = sqlx::query_as(
            "SELECT MIN(FLOOR(land_area))::int8, MAX(CEIL(land_area))::int8 \
             FROM land WHERE LEFT(full_code, 5) = $1 AND land_area IS NOT NULL",
        )
        .bind(prefix)
        .fetch_one(&self.pool)
        .await?;
        Ok(min.zip(max).map(|(min, max)| LongRange::new(min, max)))
    }

    async fn official_land_price_range_by_region(
        &self,
        prefix: &str,
    ) -> StoreResult<Option<LongRange>> {
        let (min, max): (Option<i64>, Option<i64>) = sqlx::query_as(
            "SELECT MIN(FLOOR(official_land_price))::int8, MAX(CEIL(official_land_price))::int8 \
             FROM land WHERE LEFT(full_code, 5) = $1 AND official_land_price IS NOT NULL",
        )
        .bind(prefix)
        .fetch_one(&self.pool)
        .await?;
        Ok(min.zip(max).map(|(min, max)| LongRange::new(min, max)))
    }

    async fn find_statistics(&self, stat_type: StatType) -> StoreResult<Option<LandStatistics>> {
        let start = Instant::now();
        let row: Option<StatisticsRow> = sqlx::query_as(
            "SELECT stat_type, min_value::int8 AS min_value, max_value::int8 AS max_value, \
             updated_at::timestamp AS updated_at FROM land_statistics WHERE stat_type = $1",
        )
        .bind(stat_type.to_string())
        .fetch_optional(&self.pool)
        .await?;
        record_db_latency(start, "find_statistics");

        row.map(|row| {
            let stat_type = StatType::from_str(&row.stat_type)
                .map_err(|_| StoreError::Decode(format!("unknown stat_type {}", row.stat_type)))?;
            Ok(LandStatistics {
                stat_type,
                min_value: row.min_value,
                max_value: row.max_value,
                updated_at: row.updated_at,
            })
        })
        .transpose()
    }

    async fn latest_electricity_cost(&self, full_code: &str) -> StoreResult<Option<ElectricityCost>> {
        let row: Option<ElectricityRow> = sqlx::query_as(
            r#"SELECT full_code, year::int4 AS year, month::int4 AS month, metro, city,
                      "unitCost"::numeric AS unit_cost
               FROM electricity
               WHERE full_code = $1
               ORDER BY year DESC, month DESC
               LIMIT 1"#,
        )
        .bind(full_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| ElectricityCost {
            full_code: row.full_code,
            year: row.year,
            month: row.month,
            metro: row.metro,
            city: row.city,
            unit_cost: row.unit_cost,
        }))
    }

    async fn find_disasters(&self, full_code: &str) -> StoreResult<Vec<Disaster>> {
        let rows: Vec<DisasterRow> = sqlx::query_as(
            r#"SELECT id::int8 AS id, "RCPTN_RGN_NM" AS region_name, "DST_SE_NM" AS disaster_type,
                      count::int4 AS count, full_code
               FROM natural_disasters
               WHERE full_code = $1
               ORDER BY count DESC"#,
        )
        .bind(full_code)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Disaster {
                id: row.id,
                region_name: row.region_name,
                disaster_type: row.disaster_type,
                count: row.count,
                full_code: row.full_code,
            })
            .collect())
    }

    async fn aggregate_population(&self, prefix: &str) -> StoreResult<Option<PopulationAggregate>> {
        let start = Instant::now();
        let row: Option<PopulationRow> = sqlx::query_as(
            r#"SELECT 기준연월::text AS reference_month,
                      시도명 AS sido,
                      시군구명 AS sig,
                      SUM(계)::int8 AS total,
                      SUM("0~9세")::int8 AS age_0_9,
                      SUM("10~19세")::int8 AS age_10_19,
                      SUM("20~29세")::int8 AS age_20_29,
                      SUM("30~39세")::int8 AS age_30_39,
                      SUM("40~49세")::int8 AS age_40_49,
                      SUM("50~59세")::int8 AS age_50_59,
                      SUM("60~69세")::int8 AS age_60_69,
                      SUM("70~79세")::int8 AS age_70_79,
                      SUM("80세~")::int8 AS age_80_plus,
                      SUM(남자)::int8 AS male,
                      SUM(여자)::int8 AS female
               FROM population_simple
               WHERE full_code LIKE $1
               GROUP BY 시도명, 시군구명, 기준연월
               ORDER BY 기준연월 DESC
               LIMIT 1"#,
        )
        .bind(format!("{prefix}%"))
        .fetch_optional(&self.pool)
        .await?;
        record_db_latency(start, "aggregate_population");

        Ok(row.map(|row| PopulationAggregate {
            full_code: prefix.to_string(),
            reference_month: row.reference_month,
            sido: row.sido,
            sig: row.sig,
            total: row.total,
            age_groups: [
                row.age_0_9.unwrap_or(0),
                row.age_10_19.unwrap_or(0),
                row.age_20_29.unwrap_or(0),
                row.age_30_39.unwrap_or(0),
                row.age_40_49.unwrap_or(0),
                row.age_50_59.unwrap_or(0),
                row.age_60_69.unwrap_or(0),
                row.age_70_79.unwrap_or(0),
                row.age_80_plus.unwrap_or(0),
            ],
            male: row.male.unwrap_or(0),
            female: row.female.unwrap_or(0),
        }))
    }

    async fn find_power_infrastructure(
        &self,
        land_ids: &[i64],
    ) -> StoreResult<Vec<PowerInfrastructureSummary>> {
        if land_ids.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let rows: Vec<PowerInfrastructureRow> = sqlx::query_as(
            "SELECT land_id::int8 AS land_id, \
                    substation_count::int4 AS substation_count, \
                    substation_closest_distance_meters::numeric AS substation_closest_distance_meters, \
                    transmission_line_count::int4 AS transmission_line_count, \
                    transmission_line_closest_distance_meters::numeric AS transmission_line_closest_distance_meters, \
                    transmission_tower_count::int4 AS transmission_tower_count, \
                    transmission_tower_closest_distance_meters::numeric AS transmission_tower_closest_distance_meters, \
                    total_infrastructure_count::int4 AS total_infrastructure_count, \
                    has_high_voltage \
             FROM land_power_infrastructure_summary \
             WHERE land_id = ANY($1)",
        )
        .bind(land_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;
        record_db_latency(start, "find_power_infrastructure");

        Ok(rows
            .into_iter()
            .map(|row| PowerInfrastructureSummary {
                land_id: row.land_id,
                substation_count: row.substation_count,
                substation_closest_distance_meters: row.substation_closest_distance_meters,
                transmission_line_count: row.transmission_line_count,
                transmission_line_closest_distance_meters: row
                    .transmission_line_closest_distance_meters,
                transmission_tower_count: row.transmission_tower_count,
                transmission_tower_closest_distance_meters: row
                    .transmission_tower_closest_distance_meters,
                total_infrastructure_count: row.total_infrastructure_count,
                has_high_voltage: row.has_high_voltage,
            })
            .collect())
    }
}
