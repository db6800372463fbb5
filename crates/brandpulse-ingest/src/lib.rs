//! Source-shape normalization: CSV rows in, canonical records out.
//!
//! Spreadsheet exports arrive in one of two shapes. A "long" export carries
//! explicit metric columns (engagement, followers, ...) with one row per
//! brand and period. A "wide" export carries one row per brand and one
//! date-labeled column per period, with a single metric value in each cell.
//! This crate detects which shape applies from the headers alone, resolves
//! heterogeneous header spellings through an ordered alias table, coerces
//! numeric strings, and backfills missing fields with documented defaults.

use std::collections::BTreeMap;

use brandpulse_core::{
    CanonicalRecord, RawRow, OTHER_CATEGORY, POSTS_SENTINEL, UNKNOWN_BRAND,
};
use strsim::jaro_winkler;
use thiserror::Error;

pub const CRATE_NAME: &str = "brandpulse-ingest";

/// Minimum Jaro-Winkler similarity for a near-miss header to bind to a
/// canonical field after the exact alias pass comes up empty.
pub const FUZZY_HEADER_THRESHOLD: f64 = 0.88;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("source contains a header row but no data rows")]
    Empty,
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Canonical fields a header can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CanonicalField {
    Brand,
    Category,
    Period,
    Posts,
    VideoPosts,
    ImagePosts,
    Engagement,
    PreviousEngagement,
    Followers,
    PreviousFollowers,
    EngagementRate,
}

/// Ordered (field -> candidate headers) rules. Earlier candidates win, so
/// `Brand` beats the secondary `Platform Name` label when both exist.
const HEADER_RULES: &[(CanonicalField, &[&str])] = &[
    (CanonicalField::Brand, &["Brand", "Platform Name", "Platform", "Account"]),
    (CanonicalField::Category, &["Type", "Category", "Vertical"]),
    (CanonicalField::Period, &["Week", "Period", "Date"]),
    (CanonicalField::Posts, &["Posts", "Total Posts", "Post Count"]),
    (CanonicalField::VideoPosts, &["Video Posts", "Videos"]),
    (CanonicalField::ImagePosts, &["Image Posts", "Images"]),
    (
        CanonicalField::Engagement,
        &["Total Engagement", "Engagement", "Engagements"],
    ),
    (
        CanonicalField::PreviousEngagement,
        &["Previous Engagement", "Prev Engagement", "Last Week Engagement"],
    ),
    (
        CanonicalField::Followers,
        &["Followers", "Total Followers", "Follower Count"],
    ),
    (
        CanonicalField::PreviousFollowers,
        &["Previous Followers", "Prev Followers"],
    ),
    (CanonicalField::EngagementRate, &["Engagement Rate", "ER"]),
];

const MONTH_ABBREVS: &[&str] = &[
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Wide-layout trigger: 1-2 digit day, hyphen, 3-letter month abbreviation
/// (`9-Nov`, `16-Nov`).
pub fn is_date_header(header: &str) -> bool {
    let Some((day, month)) = header.trim().split_once('-') else {
        return false;
    };
    if day.is_empty() || day.len() > 2 || !day.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    MONTH_ABBREVS.iter().any(|m| m.eq_ignore_ascii_case(month))
}

/// Strip thousands separators and percent signs, then parse. Empty or
/// unparseable input coerces to 0.0; so do negative and non-finite parses,
/// keeping the non-negative invariant intact.
pub fn coerce_metric(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '%')
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => 0.0,
    }
}

/// Result of evaluating the alias table against one header set: for each
/// canonical field, the source headers that bind to it, in candidate order.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    bindings: BTreeMap<CanonicalField, Vec<String>>,
}

impl HeaderMap {
    pub fn resolve(headers: &[String]) -> Self {
        let mut bindings: BTreeMap<CanonicalField, Vec<String>> = BTreeMap::new();
        let mut claimed: Vec<&String> = Vec::new();

        for (field, candidates) in HEADER_RULES {
            let mut matched = Vec::new();
            for candidate in *candidates {
                if let Some(header) = headers
                    .iter()
                    .find(|h| h.trim().eq_ignore_ascii_case(candidate))
                {
                    if !matched.contains(header) {
                        matched.push(header.clone());
                        claimed.push(header);
                    }
                }
            }
            if !matched.is_empty() {
                bindings.insert(*field, matched);
            }
        }

        // Fuzzy pass: bind the closest unclaimed, non-date header to any
        // field the exact pass left empty.
        for (field, candidates) in HEADER_RULES {
            if bindings.contains_key(field) {
                continue;
            }
            let mut best: Option<(&String, f64)> = None;
            for header in headers {
                if is_date_header(header) || claimed.contains(&header) {
                    continue;
                }
                for candidate in *candidates {
                    let score = jaro_winkler(
                        &header.trim().to_ascii_lowercase(),
                        &candidate.to_ascii_lowercase(),
                    );
                    if score >= FUZZY_HEADER_THRESHOLD
                        && best.map(|(_, s)| score > s).unwrap_or(true)
                    {
                        best = Some((header, score));
                    }
                }
            }
            if let Some((header, _)) = best {
                bindings.insert(*field, vec![header.clone()]);
            }
        }

        Self { bindings }
    }

    pub fn has(&self, field: CanonicalField) -> bool {
        self.bindings.contains_key(&field)
    }

    /// First non-blank cell among the headers bound to `field`.
    pub fn cell<'a>(&self, row: &'a RawRow, field: CanonicalField) -> Option<&'a str> {
        self.bindings.get(&field)?.iter().find_map(|header| {
            row.get(header)
                .map(str::trim)
                .filter(|value| !value.is_empty())
        })
    }
}

/// Which of the two source shapes applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    Long,
    /// Date-keyed columns, in header appearance order.
    Wide { periods: Vec<String> },
}

/// Header-presence detection, deliberately not value-based: the layout is
/// wide only when neither an engagement nor a followers column resolved and
/// at least one date-pattern header exists.
pub fn detect_layout(headers: &[String], map: &HeaderMap) -> Layout {
    if map.has(CanonicalField::Engagement) || map.has(CanonicalField::Followers) {
        return Layout::Long;
    }
    let periods: Vec<String> = headers
        .iter()
        .filter(|h| is_date_header(h))
        .map(|h| h.trim().to_string())
        .collect();
    if periods.is_empty() {
        Layout::Long
    } else {
        Layout::Wide { periods }
    }
}

/// Parse comma-separated text into ordered raw rows. The first line is the
/// header row; cells are trimmed.
pub fn parse_rows(text: &str) -> Result<Vec<RawRow>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let cells = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        rows.push(RawRow::new(cells));
    }
    if rows.is_empty() {
        return Err(IngestError::Empty);
    }
    Ok(rows)
}

fn resolve_brand(row: &RawRow, map: &HeaderMap) -> Option<String> {
    if map.has(CanonicalField::Brand) {
        // Column exists; a row with only blank brand cells is a trailing or
        // filler row and gets dropped.
        return map
            .cell(row, CanonicalField::Brand)
            .map(ToString::to_string);
    }
    // No brand-like column at all: degrade to the literal label rather than
    // dropping the whole dataset.
    if row.is_blank() {
        None
    } else {
        Some(UNKNOWN_BRAND.to_string())
    }
}

fn resolve_category(row: &RawRow, map: &HeaderMap) -> String {
    map.cell(row, CanonicalField::Category)
        .map(ToString::to_string)
        .unwrap_or_else(|| OTHER_CATEGORY.to_string())
}

fn normalize_long(rows: &[RawRow], map: &HeaderMap) -> Vec<CanonicalRecord> {
    let mut records = Vec::new();
    for row in rows {
        let Some(brand) = resolve_brand(row, map) else {
            continue;
        };
        let coerced = |field| coerce_metric(map.cell(row, field).unwrap_or(""));

        let engagement = coerced(CanonicalField::Engagement);
        let previous_engagement = if map.has(CanonicalField::PreviousEngagement) {
            coerced(CanonicalField::PreviousEngagement)
        } else {
            engagement * 0.9
        };
        let followers = coerced(CanonicalField::Followers);
        let previous_followers = if map.has(CanonicalField::PreviousFollowers) {
            coerced(CanonicalField::PreviousFollowers)
        } else {
            followers * 0.95
        };
        let posts = if map.has(CanonicalField::Posts) {
            coerced(CanonicalField::Posts)
        } else {
            POSTS_SENTINEL
        };

        records.push(CanonicalRecord {
            brand,
            category: resolve_category(row, map),
            period: map
                .cell(row, CanonicalField::Period)
                .map(ToString::to_string),
            posts,
            video_posts: coerced(CanonicalField::VideoPosts),
            image_posts: coerced(CanonicalField::ImagePosts),
            engagement,
            previous_engagement,
            followers,
            previous_followers,
            engagement_rate: coerced(CanonicalField::EngagementRate),
        });
    }
    records
}

fn normalize_wide(rows: &[RawRow], map: &HeaderMap, periods: &[String]) -> Vec<CanonicalRecord> {
    let mut records = Vec::new();
    for row in rows {
        let Some(brand) = resolve_brand(row, map) else {
            continue;
        };
        let category = resolve_category(row, map);
        for period in periods {
            // The date-keyed cell is the row's primary metric for that
            // period. The shape gives no way to tell engagement from a
            // follower count, so the value lands on engagement.
            let value = coerce_metric(row.get(period).unwrap_or(""));
            records.push(CanonicalRecord {
                brand: brand.clone(),
                category: category.clone(),
                period: Some(period.clone()),
                posts: POSTS_SENTINEL,
                video_posts: 0.0,
                image_posts: 0.0,
                engagement: value,
                previous_engagement: value * 0.9,
                followers: 0.0,
                previous_followers: 0.0,
                engagement_rate: 0.0,
            });
        }
    }
    records
}

/// Normalize already-parsed rows: resolve headers, detect the layout, emit
/// canonical records. Rows without a resolvable brand are dropped silently.
pub fn normalize_rows(rows: &[RawRow]) -> Vec<CanonicalRecord> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };
    let headers: Vec<String> = first.headers().map(ToString::to_string).collect();
    let map = HeaderMap::resolve(&headers);
    match detect_layout(&headers, &map) {
        Layout::Long => normalize_long(rows, &map),
        Layout::Wide { periods } => normalize_wide(rows, &map, &periods),
    }
}

/// Full ingestion: CSV text to canonical records.
pub fn ingest_csv(text: &str) -> Result<Vec<CanonicalRecord>, IngestError> {
    Ok(normalize_rows(&parse_rows(text)?))
}

/// Deterministic demonstration dataset used when the live source cannot be
/// fetched or parsed. Two periods, five brands, three categories; stable
/// across calls so fallback aggregates are reproducible in tests.
pub fn demo_records() -> Vec<CanonicalRecord> {
    const ROWS: &[(&str, &str, &str, f64, f64, f64, f64, f64)] = &[
        // brand, category, period, posts, engagement, prev_engagement, followers, prev_followers
        ("Aurora Wear", "Fashion", "9-Nov", 14.0, 12400.0, 11800.0, 88000.0, 86500.0),
        ("Nimbus Tech", "Tech", "9-Nov", 9.0, 20150.0, 22300.0, 152000.0, 149900.0),
        ("Copper Kitchen", "Food", "9-Nov", 22.0, 8300.0, 7100.0, 45200.0, 44100.0),
        ("Verde Active", "Fashion", "9-Nov", 11.0, 5400.0, 6000.0, 31000.0, 31500.0),
        ("Polar Audio", "Tech", "9-Nov", 6.0, 3100.0, 2800.0, 19800.0, 19200.0),
        ("Aurora Wear", "Fashion", "16-Nov", 15.0, 13900.0, 12400.0, 89600.0, 88000.0),
        ("Nimbus Tech", "Tech", "16-Nov", 10.0, 18700.0, 20150.0, 153400.0, 152000.0),
        ("Copper Kitchen", "Food", "16-Nov", 20.0, 9450.0, 8300.0, 46800.0, 45200.0),
        ("Verde Active", "Fashion", "16-Nov", 12.0, 6150.0, 5400.0, 30700.0, 31000.0),
        ("Polar Audio", "Tech", "16-Nov", 7.0, 2600.0, 3100.0, 20100.0, 19800.0),
    ];
    ROWS.iter()
        .map(
            |&(brand, category, period, posts, engagement, prev_e, followers, prev_f)| {
                CanonicalRecord {
                    brand: brand.to_string(),
                    category: category.to_string(),
                    period: Some(period.to_string()),
                    posts,
                    video_posts: (posts / 2.0).floor(),
                    image_posts: (posts / 2.0).ceil(),
                    engagement,
                    previous_engagement: prev_e,
                    followers,
                    previous_followers: prev_f,
                    engagement_rate: 0.0,
                }
            },
        )
        .collect()
}
