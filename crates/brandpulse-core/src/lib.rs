//! Core domain model for the Brand Pulse pipeline.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CRATE_NAME: &str = "brandpulse-core";

/// Sentinel used for `posts` when the source has no post-count column,
/// keeping per-post rates away from division by zero.
pub const POSTS_SENTINEL: f64 = 10.0;

/// Brand label used when only a secondary identifying column is present.
pub const UNKNOWN_BRAND: &str = "Unknown";

/// Category label used when no category column resolves.
pub const OTHER_CATEGORY: &str = "Other";

/// One source row as parsed: an ordered header -> cell mapping.
/// Headers keep their original spelling; lookup is trimmed and
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RawRow {
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(cells: Vec<(String, String)>) -> Self {
        Self { cells }
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        let wanted = header.trim();
        self.cells
            .iter()
            .find(|(h, _)| h.trim().eq_ignore_ascii_case(wanted))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.trim().is_empty())
    }
}

/// Normalized unit of analysis: one brand's metrics for one period,
/// independent of the source layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub brand: String,
    pub category: String,
    /// Time-bucket key; `None` for single-snapshot layouts.
    pub period: Option<String>,
    pub posts: f64,
    pub video_posts: f64,
    pub image_posts: f64,
    pub engagement: f64,
    pub previous_engagement: f64,
    pub followers: f64,
    pub previous_followers: f64,
    /// Explicit rate column when supplied; 0.0 otherwise.
    pub engagement_rate: f64,
}

/// Domain discovered from a normalized record set, in first-seen order for
/// periods and sorted order for categories/brands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DatasetDomain {
    pub categories: BTreeSet<String>,
    pub brands: BTreeSet<String>,
    /// Periods in first-seen (header appearance) order.
    pub periods: Vec<String>,
}

impl DatasetDomain {
    pub fn discover(records: &[CanonicalRecord]) -> Self {
        let mut domain = Self::default();
        for record in records {
            domain.categories.insert(record.category.clone());
            domain.brands.insert(record.brand.clone());
            if let Some(period) = &record.period {
                if !domain.periods.contains(period) {
                    domain.periods.push(period.clone());
                }
            }
        }
        domain
    }
}

/// Which period(s) the user has selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PeriodSelection {
    #[default]
    All,
    Single(String),
    /// A/B comparison: `current` drives the working set, `previous`
    /// supplies counterpart values.
    Compare { current: String, previous: String },
}

/// Current UI selection, read-only to the aggregation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub categories: BTreeSet<String>,
    pub brands: BTreeSet<String>,
    pub periods: PeriodSelection,
    pub min_engagement: f64,
}

impl FilterState {
    /// Default selection for a freshly loaded dataset: everything selected,
    /// latest two periods paired up for comparison when they exist.
    pub fn for_domain(domain: &DatasetDomain) -> Self {
        let periods = match domain.periods.as_slice() {
            [] => PeriodSelection::All,
            [only] => PeriodSelection::Single(only.clone()),
            [.., previous, current] => PeriodSelection::Compare {
                current: current.clone(),
                previous: previous.clone(),
            },
        };
        Self {
            categories: domain.categories.clone(),
            brands: domain.brands.clone(),
            periods,
            min_engagement: 0.0,
        }
    }

    /// Whether a record belongs to the filtered working set. For
    /// `Compare`, the working set is the current period; counterpart
    /// lookup over the previous period is the engine's job.
    pub fn accepts(&self, record: &CanonicalRecord) -> bool {
        if !self.categories.contains(&record.category) {
            return false;
        }
        if !self.brands.contains(&record.brand) {
            return false;
        }
        if record.engagement < self.min_engagement {
            return false;
        }
        match &self.periods {
            PeriodSelection::All => true,
            PeriodSelection::Single(period) => {
                record.period.as_deref() == Some(period.as_str())
            }
            PeriodSelection::Compare { current, .. } => {
                record.period.as_deref() == Some(current.as_str())
            }
        }
    }
}

/// Snapshot provenance attached to a successful load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub origin: String,
    pub fetched_at: DateTime<Utc>,
    pub content_hash: String,
    pub byte_size: usize,
}

/// Tagged load outcome so consumers can tell real data from the synthetic
/// demo set that stands in after a transport or parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataLoad {
    Loaded {
        records: Vec<CanonicalRecord>,
        snapshot: SnapshotInfo,
    },
    FallbackDemo {
        records: Vec<CanonicalRecord>,
        reason: String,
    },
}

impl DataLoad {
    pub fn records(&self) -> &[CanonicalRecord] {
        match self {
            Self::Loaded { records, .. } | Self::FallbackDemo { records, .. } => records,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::FallbackDemo { .. })
    }
}
