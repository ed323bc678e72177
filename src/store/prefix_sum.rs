//! 2D prefix sums over (area bucket, price bucket).
//!
//! `land_statistics_prefix_sum` stores, per province prefix and use zone
//! category, the cumulative count of lands with
//! `area_bucket <= a && price_bucket <= p`. A rectangular window is then
//! four lookups: `P(aMax,pMax) - P(aMin-1,pMax) - P(aMax,pMin-1) + P(aMin-1,pMin-1)`.

use super::LandFilter;

/// Square metres per area bucket.
pub const AREA_BUCKET_SIZE: i64 = 500;
/// Won per price bucket.
pub const PRICE_BUCKET_SIZE: i64 = 500_000;
/// Last area bucket in the table.
pub const MAX_AREA_BUCKET: i32 = 1999;
/// Last price bucket in the table.
pub const MAX_PRICE_BUCKET: i32 = 360;

/// One lookup of the inclusion-exclusion formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixSumTerm {
    pub area_bucket: i32,
    pub price_bucket: i32,
    /// +1 or -1.
    pub sign: i64,
}

/// Bucket window covered by a land filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketWindow {
    pub area_min: i32,
    pub area_max: i32,
    pub price_min: i32,
    pub price_max: i32,
}

fn bucket(value: i64, size: i64) -> i64 {
    value / size
}

impl BucketWindow {
    /// Window for the filter's area and price ranges, clamped to the table.
    pub fn from_filter(filter: &LandFilter) -> Self {
        let clamp = |v: i64, max: i32| v.clamp(0, i64::from(max)) as i32;

        Self {
            area_min: clamp(bucket(filter.land_area.min, AREA_BUCKET_SIZE), MAX_AREA_BUCKET),
            area_max: clamp(bucket(filter.land_area.max, AREA_BUCKET_SIZE), MAX_AREA_BUCKET),
            price_min: clamp(
                bucket(filter.official_land_price.min, PRICE_BUCKET_SIZE),
                MAX_PRICE_BUCKET,
            ),
            price_max: clamp(
                bucket(filter.official_land_price.max, PRICE_BUCKET_SIZE),
                MAX_PRICE_BUCKET,
            ),
        }
    }

    /// Lookups needed for this window. Terms that would index bucket -1
    /// are omitted since they are zero.
    pub fn terms(&self) -> Vec<PrefixSumTerm> {
        let mut terms = vec![PrefixSumTerm {
            area_bucket: self.area_max,
            price_bucket: self.price_max,
            sign: 1,
        }];

        if self.area_min > 0 {
            terms.push(PrefixSumTerm {
                area_bucket: self.area_min - 1,
                price_bucket: self.price_max,
                sign: -1,
            });
        }

        if self.price_min > 0 {
            terms.push(PrefixSumTerm {
                area_bucket: self.area_max,
                price_bucket: self.price_min - 1,
                sign: -1,
            });
        }

        if self.area_min > 0 && self.price_min > 0 {
            terms.push(PrefixSumTerm {
                area_bucket: self.area_min - 1,
                price_bucket: self.price_min - 1,
                sign: 1,
            });
        }

        terms
    }
}

/// Combine looked-up cumulative counts. Missing cells are zero and a
/// negative result (stale table) counts as zero.
pub fn combine<F>(terms: &[PrefixSumTerm], mut lookup: F) -> i64
where
    F: FnMut(i32, i32) -> Option<i64>,
{
    let total: i64 = terms
        .iter()
        .map(|t| t.sign * lookup(t.area_bucket, t.price_bucket).unwrap_or(0))
        .sum();
    total.max(0)
}
