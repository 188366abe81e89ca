//! The aggregation pipeline: catch records in, statistics tables out.
//!
//! Every function here is a pure batch transform over an
//! already-filtered record slice. No state is kept between calls and
//! identical input always produces identical output. Callers are
//! expected to reject empty filtered sets before asking for shares;
//! the zero-total guard behind that check is an assertion, not a
//! recoverable path.

use crate::error::DatasetError;
use crate::models::{
    month_name, CatchRecord, MonthStat, RegionOverallStat, RegionYearStat, YearGrowth, YearTotal,
    ZoneStat,
};
use crate::zones::ZoneTable;
use std::collections::{BTreeMap, HashMap};

/// Keep only records matching the selected years and regions.
///
/// `None` means "no constraint". This is the explicit replacement for
/// the ambient widget state the aggregation used to reach into: the
/// caller decides the filter, the aggregator only ever sees its result.
pub fn filter_records(
    records: &[CatchRecord],
    years: Option<&[i32]>,
    regions: Option<&[String]>,
) -> Vec<CatchRecord> {
    records
        .iter()
        .filter(|r| years.map_or(true, |ys| ys.contains(&r.year())))
        .filter(|r| regions.map_or(true, |rs| rs.iter().any(|name| name == &r.region)))
        .cloned()
        .collect()
}

/// All-time totals and shares per region.
///
/// Regions are summed in first-seen order, then sorted descending by
/// total weight. The sort is stable, so ties keep their input order.
/// Shares are computed from the raw float sums; across all regions
/// they add up to 100% within floating-point tolerance.
pub fn overall_by_region(records: &[CatchRecord]) -> Result<Vec<RegionOverallStat>, DatasetError> {
    if records.is_empty() {
        return Err(DatasetError::EmptyDataset);
    }

    let mut order: Vec<&str> = Vec::new();
    let mut sums: HashMap<&str, f64> = HashMap::new();

    for record in records {
        if !sums.contains_key(record.region.as_str()) {
            order.push(&record.region);
        }
        *sums.entry(&record.region).or_default() += record.weight_kg;
    }

    let total: f64 = sums.values().sum();
    if total <= 0.0 {
        return Err(DatasetError::DivisionUndefined);
    }

    let mut stats: Vec<RegionOverallStat> = order
        .into_iter()
        .map(|region| {
            let sum = sums[region];
            RegionOverallStat {
                region: region.to_string(),
                total_weight_kg: sum,
                share_pct: sum / total * 100.0,
            }
        })
        .collect();

    // Vec::sort_by is stable: ties preserve first-seen region order.
    stats.sort_by(|a, b| {
        b.total_weight_kg
            .partial_cmp(&a.total_weight_kg)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(stats)
}

/// Totals, counts, means and within-year shares per (year, region).
///
/// Every (year, region) pair with at least one record appears exactly
/// once; absent combinations are not zero-filled. Rows are ordered by
/// year ascending, then descending weight within the year. Within each
/// year the shares add up to 100%.
pub fn by_year_and_region(records: &[CatchRecord]) -> Result<Vec<RegionYearStat>, DatasetError> {
    if records.is_empty() {
        return Err(DatasetError::EmptyDataset);
    }

    struct YearAcc<'a> {
        order: Vec<&'a str>,
        groups: HashMap<&'a str, (f64, usize)>,
        total: f64,
    }

    let mut years: BTreeMap<i32, YearAcc<'_>> = BTreeMap::new();

    for record in records {
        let acc = years.entry(record.year()).or_insert_with(|| YearAcc {
            order: Vec::new(),
            groups: HashMap::new(),
            total: 0.0,
        });
        if !acc.groups.contains_key(record.region.as_str()) {
            acc.order.push(&record.region);
        }
        let group = acc.groups.entry(&record.region).or_insert((0.0, 0));
        group.0 += record.weight_kg;
        group.1 += 1;
        acc.total += record.weight_kg;
    }

    let mut stats = Vec::new();

    for (year, acc) in &years {
        if acc.total <= 0.0 {
            return Err(DatasetError::DivisionUndefined);
        }

        let mut rows: Vec<RegionYearStat> = acc
            .order
            .iter()
            .map(|region| {
                let (sum, count) = acc.groups[region];
                RegionYearStat {
                    year: year.to_string(),
                    region: (*region).to_string(),
                    total_weight_kg: sum,
                    count,
                    mean_weight_kg: sum / count as f64,
                    share_pct: sum / acc.total * 100.0,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.total_weight_kg
                .partial_cmp(&a.total_weight_kg)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        stats.extend(rows);
    }

    Ok(stats)
}

/// Seasonality rollup: sum, count and mean per calendar month.
///
/// Months are emitted in canonical January…December order regardless
/// of first appearance in the data; months with no records are omitted.
pub fn by_month(records: &[CatchRecord]) -> Result<Vec<MonthStat>, DatasetError> {
    if records.is_empty() {
        return Err(DatasetError::EmptyDataset);
    }

    let mut buckets: [(f64, usize); 12] = [(0.0, 0); 12];

    for record in records {
        let bucket = &mut buckets[(record.month() - 1) as usize];
        bucket.0 += record.weight_kg;
        bucket.1 += 1;
    }

    Ok(buckets
        .iter()
        .enumerate()
        .filter(|(_, (_, count))| *count > 0)
        .map(|(index, (sum, count))| {
            let month_number = index as u32 + 1;
            MonthStat {
                month: month_name(month_number).to_string(),
                month_number,
                total_weight_kg: *sum,
                count: *count,
                mean_weight_kg: sum / *count as f64,
            }
        })
        .collect())
}

/// Rollup per FAO fishing zone, with fail-open name resolution.
///
/// Same ordering rules as [`overall_by_region`]: descending by total
/// weight, stable on ties.
pub fn by_zone(records: &[CatchRecord], zones: &ZoneTable) -> Result<Vec<ZoneStat>, DatasetError> {
    if records.is_empty() {
        return Err(DatasetError::EmptyDataset);
    }

    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, (f64, usize)> = HashMap::new();

    for record in records {
        if !groups.contains_key(record.fao_zone.as_str()) {
            order.push(&record.fao_zone);
        }
        let group = groups.entry(&record.fao_zone).or_insert((0.0, 0));
        group.0 += record.weight_kg;
        group.1 += 1;
    }

    let total: f64 = groups.values().map(|(sum, _)| sum).sum();
    if total <= 0.0 {
        return Err(DatasetError::DivisionUndefined);
    }

    let mut stats: Vec<ZoneStat> = order
        .into_iter()
        .map(|code| {
            let (sum, count) = groups[code];
            ZoneStat {
                zone_code: code.to_string(),
                zone_name: zones.display_name(code),
                total_weight_kg: sum,
                count,
                share_pct: sum / total * 100.0,
            }
        })
        .collect();

    stats.sort_by(|a, b| {
        b.total_weight_kg
            .partial_cmp(&a.total_weight_kg)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(stats)
}

/// Total weight and count per year, ascending by year.
pub fn year_totals(records: &[CatchRecord]) -> Result<Vec<YearTotal>, DatasetError> {
    if records.is_empty() {
        return Err(DatasetError::EmptyDataset);
    }

    let mut years: BTreeMap<i32, (f64, usize)> = BTreeMap::new();

    for record in records {
        let entry = years.entry(record.year()).or_insert((0.0, 0));
        entry.0 += record.weight_kg;
        entry.1 += 1;
    }

    Ok(years
        .into_iter()
        .map(|(year, (sum, count))| YearTotal {
            year,
            label: year.to_string(),
            total_weight_kg: sum,
            count,
        })
        .collect())
}

/// Year-over-year growth over a series of year totals ordered by year.
///
/// The first year has no preceding total, so its growth is `None` —
/// missing, never zero. A zero preceding total (impossible with
/// validated weights) also yields `None` rather than an infinity.
pub fn year_over_year_growth(totals: &[YearTotal]) -> Vec<YearGrowth> {
    totals
        .iter()
        .enumerate()
        .map(|(index, current)| {
            let growth_pct = if index == 0 {
                None
            } else {
                let previous = totals[index - 1].total_weight_kg;
                if previous > 0.0 {
                    Some((current.total_weight_kg - previous) / previous * 100.0)
                } else {
                    None
                }
            };
            YearGrowth {
                year: current.label.clone(),
                total_weight_kg: current.total_weight_kg,
                growth_pct,
            }
        })
        .collect()
}
