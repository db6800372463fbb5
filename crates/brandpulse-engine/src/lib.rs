//! Aggregation & comparison engine plus load-pipeline orchestration.
//!
//! `aggregate` is a pure, synchronous function of a record set and a filter
//! state: same inputs, byte-identical output. Every filter change upstream
//! is treated as a fresh, complete aggregation request; nothing here caches
//! across calls.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use brandpulse_core::{
    CanonicalRecord, DataLoad, DatasetDomain, FilterState, PeriodSelection,
};
use brandpulse_source::SnapshotSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};
use uuid::Uuid;

pub const CRATE_NAME: &str = "brandpulse-engine";

/// Percentage change against a prior value; 0.0 when there is no usable
/// prior, never NaN or infinity.
pub fn pct_change(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

/// Engagement-per-post rate with the division-by-zero case resolved to 0.0.
pub fn per_post_rate(engagement: f64, posts: f64) -> f64 {
    if posts > 0.0 {
        engagement / posts
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Totals {
    pub engagement: f64,
    pub posts: f64,
    pub followers: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRollup {
    pub category: String,
    pub engagement: f64,
    pub posts: f64,
    pub followers: f64,
    pub share_pct: f64,
}

/// One filtered record joined with its comparison-period values and the
/// deltas computed from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub record: CanonicalRecord,
    pub previous_engagement: f64,
    pub previous_followers: f64,
    pub wow_engagement_pct: f64,
    pub wow_follower_pct: f64,
    pub engagement_per_post: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCount {
    pub label: String,
    pub count: usize,
}

/// Fixed engagement-distribution boundaries (upper bound exclusive; `None`
/// is the open top bucket).
const BUCKETS: &[(&str, Option<f64>)] = &[
    ("under 1k", Some(1_000.0)),
    ("1k-10k", Some(10_000.0)),
    ("10k-100k", Some(100_000.0)),
    ("100k+", None),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub totals: Totals,
    pub category_rollups: Vec<CategoryRollup>,
    pub comparisons: Vec<ComparisonRow>,
    pub buckets: Vec<BucketCount>,
    pub filtered_count: usize,
}

impl AggregateResult {
    fn ranked_by<F>(&self, n: usize, compare: F) -> Vec<ComparisonRow>
    where
        F: FnMut(&ComparisonRow, &ComparisonRow) -> std::cmp::Ordering,
    {
        // sort_by is stable: equal keys keep input order.
        let mut rows = self.comparisons.clone();
        rows.sort_by(compare);
        rows.truncate(n);
        rows
    }

    pub fn top_by_engagement(&self, n: usize) -> Vec<ComparisonRow> {
        self.ranked_by(n, |a, b| b.record.engagement.total_cmp(&a.record.engagement))
    }

    pub fn bottom_by_engagement(&self, n: usize) -> Vec<ComparisonRow> {
        self.ranked_by(n, |a, b| a.record.engagement.total_cmp(&b.record.engagement))
    }

    pub fn top_growth(&self, n: usize) -> Vec<ComparisonRow> {
        self.ranked_by(n, |a, b| b.wow_engagement_pct.total_cmp(&a.wow_engagement_pct))
    }

    pub fn top_decline(&self, n: usize) -> Vec<ComparisonRow> {
        self.ranked_by(n, |a, b| a.wow_engagement_pct.total_cmp(&b.wow_engagement_pct))
    }
}

/// Full aggregation pass over a canonical record set under one filter
/// selection. Recomputed wholesale on every call.
pub fn aggregate(records: &[CanonicalRecord], filter: &FilterState) -> AggregateResult {
    let working: Vec<&CanonicalRecord> =
        records.iter().filter(|r| filter.accepts(r)).collect();

    // In comparison mode the previous period supplies counterpart values,
    // keyed by (brand, category); a missing counterpart contributes zero.
    let counterparts: Option<HashMap<(&str, &str), (f64, f64)>> = match &filter.periods {
        PeriodSelection::Compare { previous, .. } => Some(
            records
                .iter()
                .filter(|r| r.period.as_deref() == Some(previous.as_str()))
                .map(|r| {
                    (
                        (r.brand.as_str(), r.category.as_str()),
                        (r.engagement, r.followers),
                    )
                })
                .collect(),
        ),
        _ => None,
    };

    let mut comparisons = Vec::with_capacity(working.len());
    for record in &working {
        let (previous_engagement, previous_followers) = match &counterparts {
            Some(lookup) => lookup
                .get(&(record.brand.as_str(), record.category.as_str()))
                .copied()
                .unwrap_or((0.0, 0.0)),
            None => (record.previous_engagement, record.previous_followers),
        };
        comparisons.push(ComparisonRow {
            record: (*record).clone(),
            previous_engagement,
            previous_followers,
            wow_engagement_pct: pct_change(record.engagement, previous_engagement),
            wow_follower_pct: pct_change(record.followers, previous_followers),
            engagement_per_post: per_post_rate(record.engagement, record.posts),
        });
    }

    let mut totals = Totals::default();
    let mut by_category: BTreeMap<&str, Totals> = BTreeMap::new();
    for record in &working {
        totals.engagement += record.engagement;
        totals.posts += record.posts;
        totals.followers += record.followers;
        let entry = by_category.entry(record.category.as_str()).or_default();
        entry.engagement += record.engagement;
        entry.posts += record.posts;
        entry.followers += record.followers;
    }

    let category_rollups = by_category
        .into_iter()
        .map(|(category, sums)| CategoryRollup {
            category: category.to_string(),
            engagement: sums.engagement,
            posts: sums.posts,
            followers: sums.followers,
            share_pct: if totals.engagement > 0.0 {
                sums.engagement / totals.engagement * 100.0
            } else {
                0.0
            },
        })
        .collect();

    let buckets = BUCKETS
        .iter()
        .map(|(label, upper)| BucketCount {
            label: (*label).to_string(),
            count: working
                .iter()
                .filter(|r| {
                    let below = upper.map(|u| r.engagement < u).unwrap_or(true);
                    let above = bucket_lower(upper)
                        .map(|l| r.engagement >= l)
                        .unwrap_or(true);
                    below && above
                })
                .count(),
        })
        .collect();

    AggregateResult {
        totals,
        category_rollups,
        comparisons,
        buckets,
        filtered_count: working.len(),
    }
}

fn bucket_lower(upper: &Option<f64>) -> Option<f64> {
    let index = BUCKETS.iter().position(|(_, u)| u == upper)?;
    if index == 0 {
        None
    } else {
        BUCKETS[index - 1].1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub origin: String,
    pub record_count: usize,
    pub brand_count: usize,
    pub category_count: usize,
    pub period_count: usize,
    pub fallback: bool,
}

/// Everything a render collaborator needs after one load: tagged data,
/// the default filter for it, and run provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadOutcome {
    pub run_id: Uuid,
    pub data: DataLoad,
    pub filter: FilterState,
    pub summary: LoadSummary,
}

/// Fetch, parse, normalize, and discover the filter domain for one
/// snapshot. Never fails: a transport or parse failure degrades to the
/// deterministic demo dataset, tagged and logged so it cannot pass as real.
pub async fn load_once(source: &dyn SnapshotSource) -> LoadOutcome {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let origin = source.origin();

    let data = match source.fetch(run_id).await {
        Ok(snapshot) => info_span!("normalize", %run_id, origin = %snapshot.info.origin)
            .in_scope(|| match brandpulse_ingest::ingest_csv(&snapshot.body) {
                Ok(records) => {
                    info!(records = records.len(), "snapshot normalized");
                    DataLoad::Loaded {
                        records,
                        snapshot: snapshot.info,
                    }
                }
                Err(err) => {
                    warn!(error = %err, "snapshot unparseable; serving demo dataset");
                    DataLoad::FallbackDemo {
                        records: brandpulse_ingest::demo_records(),
                        reason: err.to_string(),
                    }
                }
            }),
        Err(err) => {
            warn!(%run_id, origin = %origin, error = %err, "snapshot fetch failed; serving demo dataset");
            DataLoad::FallbackDemo {
                records: brandpulse_ingest::demo_records(),
                reason: err.to_string(),
            }
        }
    };

    let (domain, filter) = info_span!("discover_domain", %run_id).in_scope(|| {
        let domain = DatasetDomain::discover(data.records());
        let filter = FilterState::for_domain(&domain);
        (domain, filter)
    });
    let summary = LoadSummary {
        started_at,
        finished_at: Utc::now(),
        origin,
        record_count: data.records().len(),
        brand_count: domain.brands.len(),
        category_count: domain.categories.len(),
        period_count: domain.periods.len(),
        fallback: data.is_fallback(),
    };

    LoadOutcome {
        run_id,
        data,
        filter,
        summary,
    }
}

/// Explicitly requested demo mode: same tagged shape as a fallback load so
/// downstream rendering treats it identically.
pub fn demo_outcome(reason: &str) -> LoadOutcome {
    let started_at = Utc::now();
    let records = brandpulse_ingest::demo_records();
    let domain = DatasetDomain::discover(&records);
    let filter = FilterState::for_domain(&domain);
    let summary = LoadSummary {
        started_at,
        finished_at: Utc::now(),
        origin: "demo".to_string(),
        record_count: records.len(),
        brand_count: domain.brands.len(),
        category_count: domain.categories.len(),
        period_count: domain.periods.len(),
        fallback: true,
    };
    LoadOutcome {
        run_id: Uuid::new_v4(),
        data: DataLoad::FallbackDemo {
            records,
            reason: reason.to_string(),
        },
        filter,
        summary,
    }
}

/// Group thousands for display; input is a non-negative whole-ish metric.
pub fn fmt_count(value: f64) -> String {
    let whole = value.round() as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// One-paragraph narrative of an aggregation pass, for the brief and the
/// dashboard summary panel.
pub fn narrative(aggregate: &AggregateResult) -> String {
    if aggregate.filtered_count == 0 {
        return "No records match the current selection.".to_string();
    }
    let mut text = format!(
        "Across {} selected records, total engagement reached {} over {} posts and {} followers.",
        aggregate.filtered_count,
        fmt_count(aggregate.totals.engagement),
        fmt_count(aggregate.totals.posts),
        fmt_count(aggregate.totals.followers),
    );
    if let Some(leader) = aggregate.top_by_engagement(1).first() {
        text.push_str(&format!(
            " {} leads on engagement with {}.",
            leader.record.brand,
            fmt_count(leader.record.engagement)
        ));
    }
    if let Some(mover) = aggregate.top_growth(1).first() {
        if mover.wow_engagement_pct > 0.0 {
            text.push_str(&format!(
                " Fastest week-over-week growth: {} at {:+.1}%.",
                mover.record.brand, mover.wow_engagement_pct
            ));
        }
    }
    if let Some(decliner) = aggregate.top_decline(1).first() {
        if decliner.wow_engagement_pct < 0.0 {
            text.push_str(&format!(
                " Sharpest decline: {} at {:+.1}%.",
                decliner.record.brand, decliner.wow_engagement_pct
            ));
        }
    }
    text
}

/// Write the markdown brief plus a machine-readable aggregate dump under
/// `dir/<run_id>/`. Returns the brief path.
pub async fn write_brief(
    dir: &Path,
    outcome: &LoadOutcome,
    aggregate: &AggregateResult,
) -> Result<PathBuf> {
    let run_dir = dir.join(outcome.run_id.to_string());
    tokio::fs::create_dir_all(&run_dir)
        .await
        .with_context(|| format!("creating {}", run_dir.display()))?;

    let mut brief = format!(
        "# Brand Pulse Brief\n\n- Run ID: `{}`\n- Source: {}\n- Records: {}\n- Periods: {}\n\n",
        outcome.run_id, outcome.summary.origin, outcome.summary.record_count, outcome.summary.period_count,
    );
    if let DataLoad::FallbackDemo { reason, .. } = &outcome.data {
        brief.push_str(&format!(
            "> **Warning:** live source unavailable ({reason}); figures below come from the demonstration dataset.\n\n"
        ));
    }
    brief.push_str(&format!("{}\n\n## Categories\n\n", narrative(aggregate)));
    brief.push_str("| Category | Engagement | Posts | Followers | Share |\n|---|---|---|---|---|\n");
    for rollup in &aggregate.category_rollups {
        brief.push_str(&format!(
            "| {} | {} | {} | {} | {:.1}% |\n",
            rollup.category,
            fmt_count(rollup.engagement),
            fmt_count(rollup.posts),
            fmt_count(rollup.followers),
            rollup.share_pct,
        ));
    }
    brief.push_str("\n## Top Movers\n\n");
    for row in aggregate.top_growth(3) {
        brief.push_str(&format!(
            "- {} {:+.1}% ({} engagement)\n",
            row.record.brand,
            row.wow_engagement_pct,
            fmt_count(row.record.engagement)
        ));
    }
    brief.push_str("\n## Distribution\n\n");
    for bucket in &aggregate.buckets {
        brief.push_str(&format!("- {}: {}\n", bucket.label, bucket.count));
    }

    let brief_path = run_dir.join("brief.md");
    tokio::fs::write(&brief_path, brief)
        .await
        .context("writing brief.md")?;

    let dump = serde_json::to_vec_pretty(&serde_json::json!({
        "outcome": outcome,
        "aggregate": aggregate,
    }))
    .context("serializing aggregate dump")?;
    tokio::fs::write(run_dir.join("aggregate.json"), dump)
        .await
        .context("writing aggregate.json")?;

    Ok(brief_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use brandpulse_core::POSTS_SENTINEL;
    use brandpulse_source::{FetchError, Snapshot, SnapshotSource};
    use std::path::PathBuf;

    fn record(
        brand: &str,
        category: &str,
        period: Option<&str>,
        engagement: f64,
        previous: f64,
    ) -> CanonicalRecord {
        CanonicalRecord {
            brand: brand.to_string(),
            category: category.to_string(),
            period: period.map(ToString::to_string),
            posts: POSTS_SENTINEL,
            video_posts: 0.0,
            image_posts: 0.0,
            engagement,
            previous_engagement: previous,
            followers: engagement * 10.0,
            previous_followers: previous * 10.0,
            engagement_rate: 0.0,
        }
    }

    fn all_filter(records: &[CanonicalRecord]) -> FilterState {
        FilterState::for_domain(&DatasetDomain::discover(records))
    }

    #[test]
    fn week_over_week_scenario_matches_expected_figures() {
        let records = vec![
            record("A", "Other", None, 1000.0, 500.0),
            record("B", "Other", None, 300.0, 600.0),
        ];
        let result = aggregate(&records, &all_filter(&records));

        assert_eq!(result.totals.engagement, 1300.0);
        assert_eq!(result.comparisons[0].wow_engagement_pct, 100.0);
        assert_eq!(result.comparisons[1].wow_engagement_pct, -50.0);
        assert_eq!(result.top_by_engagement(1)[0].record.brand, "A");
        assert_eq!(result.top_decline(1)[0].record.brand, "B");
    }

    #[test]
    fn zero_previous_yields_zero_deltas() {
        let records = vec![record("A", "Other", None, 1000.0, 0.0)];
        let result = aggregate(&records, &all_filter(&records));
        assert_eq!(result.comparisons[0].wow_engagement_pct, 0.0);
        assert_eq!(result.comparisons[0].wow_follower_pct, 0.0);
        assert!(result.comparisons[0].wow_engagement_pct.is_finite());
    }

    #[test]
    fn aggregate_is_idempotent() {
        let records = vec![
            record("A", "Fashion", Some("9-Nov"), 1000.0, 500.0),
            record("B", "Tech", Some("9-Nov"), 300.0, 600.0),
            record("A", "Fashion", Some("16-Nov"), 1200.0, 1000.0),
            record("B", "Tech", Some("16-Nov"), 250.0, 300.0),
        ];
        let filter = all_filter(&records);
        assert_eq!(aggregate(&records, &filter), aggregate(&records, &filter));
    }

    #[test]
    fn category_sums_equal_filtered_total() {
        let records = vec![
            record("A", "Fashion", None, 1000.0, 500.0),
            record("B", "Tech", None, 300.0, 600.0),
            record("C", "Fashion", None, 450.0, 100.0),
        ];
        let result = aggregate(&records, &all_filter(&records));
        let rollup_sum: f64 = result.category_rollups.iter().map(|r| r.engagement).sum();
        assert_eq!(rollup_sum, result.totals.engagement);
        let share_sum: f64 = result.category_rollups.iter().map(|r| r.share_pct).sum();
        assert!((share_sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn equal_engagement_keeps_input_order_in_rankings() {
        let forward = vec![
            record("X", "Other", None, 500.0, 500.0),
            record("Y", "Other", None, 500.0, 500.0),
            record("Z", "Other", None, 500.0, 500.0),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let top_forward = aggregate(&forward, &all_filter(&forward)).top_by_engagement(3);
        let top_reversed = aggregate(&reversed, &all_filter(&reversed)).top_by_engagement(3);

        let brands = |rows: &[ComparisonRow]| {
            rows.iter().map(|r| r.record.brand.clone()).collect::<Vec<_>>()
        };
        assert_eq!(brands(&top_forward), vec!["X", "Y", "Z"]);
        assert_eq!(brands(&top_reversed), vec!["Z", "Y", "X"]);
    }

    #[test]
    fn compare_mode_uses_counterpart_period_values() {
        let records = vec![
            record("A", "Fashion", Some("9-Nov"), 500.0, 0.0),
            record("B", "Tech", Some("9-Nov"), 600.0, 0.0),
            record("A", "Fashion", Some("16-Nov"), 1000.0, 0.0),
            record("B", "Tech", Some("16-Nov"), 300.0, 0.0),
            // No 9-Nov counterpart: previous contributes zero.
            record("C", "Food", Some("16-Nov"), 200.0, 999.0),
        ];
        let filter = all_filter(&records);
        assert!(matches!(filter.periods, PeriodSelection::Compare { .. }));

        let result = aggregate(&records, &filter);
        assert_eq!(result.filtered_count, 3);
        let row = |brand: &str| {
            result
                .comparisons
                .iter()
                .find(|r| r.record.brand == brand)
                .unwrap()
                .clone()
        };
        assert_eq!(row("A").previous_engagement, 500.0);
        assert_eq!(row("A").wow_engagement_pct, 100.0);
        assert_eq!(row("B").wow_engagement_pct, -50.0);
        assert_eq!(row("C").previous_engagement, 0.0);
        assert_eq!(row("C").wow_engagement_pct, 0.0);
    }

    #[test]
    fn compare_mode_excludes_records_without_a_period() {
        let records = vec![
            record("A", "Fashion", Some("9-Nov"), 500.0, 0.0),
            record("A", "Fashion", Some("16-Nov"), 1000.0, 0.0),
            record("B", "Tech", None, 700.0, 0.0),
        ];
        let filter = all_filter(&records);
        assert!(matches!(filter.periods, PeriodSelection::Compare { .. }));

        let result = aggregate(&records, &filter);
        assert_eq!(result.filtered_count, 1);
        assert_eq!(result.totals.engagement, 1000.0);
        assert_eq!(result.comparisons[0].record.brand, "A");
        assert_eq!(result.comparisons[0].previous_engagement, 500.0);
    }

    #[test]
    fn empty_selection_produces_zeroes_not_errors() {
        let records = vec![record("A", "Fashion", None, 1000.0, 500.0)];
        let mut filter = all_filter(&records);
        filter.min_engagement = 5000.0;

        let result = aggregate(&records, &filter);
        assert_eq!(result.filtered_count, 0);
        assert_eq!(result.totals.engagement, 0.0);
        assert!(result.comparisons.is_empty());
        assert!(result.category_rollups.is_empty());
        assert!(result.top_by_engagement(5).is_empty());
        assert!(result.buckets.iter().all(|b| b.count == 0));
    }

    #[test]
    fn distribution_buckets_cover_boundaries() {
        let records = vec![
            record("A", "Other", None, 999.0, 0.0),
            record("B", "Other", None, 1_000.0, 0.0),
            record("C", "Other", None, 10_000.0, 0.0),
            record("D", "Other", None, 250_000.0, 0.0),
        ];
        let result = aggregate(&records, &all_filter(&records));
        let count = |label: &str| {
            result
                .buckets
                .iter()
                .find(|b| b.label == label)
                .unwrap()
                .count
        };
        assert_eq!(count("under 1k"), 1);
        assert_eq!(count("1k-10k"), 1);
        assert_eq!(count("10k-100k"), 1);
        assert_eq!(count("100k+"), 1);
    }

    #[test]
    fn per_post_rate_handles_zero_posts() {
        assert_eq!(per_post_rate(100.0, 0.0), 0.0);
        assert_eq!(per_post_rate(100.0, 4.0), 25.0);
    }

    struct FailingSource;

    #[async_trait]
    impl SnapshotSource for FailingSource {
        fn origin(&self) -> String {
            "https://example.invalid/export.csv".to_string()
        }
        async fn fetch(&self, _run_id: Uuid) -> Result<Snapshot, FetchError> {
            Err(FetchError::HttpStatus {
                status: 503,
                url: self.origin(),
            })
        }
    }

    struct InlineSource(String);

    #[async_trait]
    impl SnapshotSource for InlineSource {
        fn origin(&self) -> String {
            "inline".to_string()
        }
        async fn fetch(&self, _run_id: Uuid) -> Result<Snapshot, FetchError> {
            Ok(Snapshot::from_body(self.origin(), self.0.clone()))
        }
    }

    #[tokio::test]
    async fn fetch_failure_falls_back_to_demo_aggregate() {
        let outcome = load_once(&FailingSource).await;
        assert!(outcome.data.is_fallback());
        assert!(outcome.summary.fallback);

        let demo = brandpulse_ingest::demo_records();
        let expected_filter = FilterState::for_domain(&DatasetDomain::discover(&demo));
        assert_eq!(outcome.filter, expected_filter);
        assert_eq!(
            aggregate(outcome.data.records(), &outcome.filter),
            aggregate(&demo, &expected_filter)
        );
    }

    #[tokio::test]
    async fn load_once_normalizes_and_discovers_domain() {
        let csv = "Brand,Type,9-Nov,16-Nov\nAcme,Retail,\"1,000\",\"1,500\"\n".to_string();
        let outcome = load_once(&InlineSource(csv)).await;
        assert!(!outcome.data.is_fallback());
        assert_eq!(outcome.summary.record_count, 2);
        assert_eq!(outcome.summary.period_count, 2);
        assert_eq!(
            outcome.filter.periods,
            PeriodSelection::Compare {
                current: "16-Nov".to_string(),
                previous: "9-Nov".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn brief_is_written_with_fallback_notice() {
        let dir = tempfile::tempdir().expect("tempdir");
        let outcome = load_once(&FailingSource).await;
        let result = aggregate(outcome.data.records(), &outcome.filter);

        let path = write_brief(dir.path(), &outcome, &result)
            .await
            .expect("write brief");
        let text = std::fs::read_to_string(&path).expect("read brief");
        assert!(text.contains("Brand Pulse Brief"));
        assert!(text.contains("demonstration dataset"));
        assert!(PathBuf::from(path.parent().unwrap().join("aggregate.json")).exists());
    }

    #[test]
    fn count_formatting_groups_thousands() {
        assert_eq!(fmt_count(0.0), "0");
        assert_eq!(fmt_count(999.0), "999");
        assert_eq!(fmt_count(1_234_567.4), "1,234,567");
    }
}
