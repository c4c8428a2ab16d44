//! End-to-end evaluation of candidate documents.
//!
//! One document flows through extraction, rule validation, complexity
//! analysis, multi-size preview and correction synthesis. Independent variants
//! are evaluated in parallel on a rayon pool; repeated evaluations can be
//! memoized in a [`ReportCache`].

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::extract::document::parse_viewbox;
use crate::extract::extract;
use crate::models::{
    AutoFix, ComplexityAnalysis, CorrectionDirective, IconMetadata, PreviewReport, Shape,
    ValidationResult,
};
use crate::profile::{ComplianceProfile, PREVIEW_SIZES};
use crate::validate::complexity::analyze_complexity;
use crate::validate::compliance::validate_compliance_shapes;
use crate::validate::correction::{apply_auto_fixes, synthesize};
use crate::validate::geometry::validate_geometry_with;
use crate::validate::preview::preview_report;

pub const CACHE_ENV: &str = "ICONGUARD_CACHE";
pub const DEFAULT_CACHE_ENTRIES: usize = 256;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// Request / report
// ---------------------------------------------------------------------------

/// What to evaluate a document for.
///
/// With metadata present the full compliance validator runs; without it only
/// the geometry rules apply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationRequest {
    pub metadata: Option<IconMetadata>,
    pub sizes: Vec<u32>,
    pub attempt: u32,
}

impl Default for EvaluationRequest {
    fn default() -> Self {
        Self {
            metadata: None,
            sizes: PREVIEW_SIZES.to_vec(),
            attempt: 1,
        }
    }
}

impl EvaluationRequest {
    pub fn with_metadata(metadata: IconMetadata) -> Self {
        Self {
            metadata: Some(metadata),
            ..Self::default()
        }
    }
}

/// The document after deterministic auto-fixes, re-validated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixedCandidate {
    pub document: String,
    pub applied: Vec<AutoFix>,
    pub validation: ValidationResult,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IconReport {
    pub shape_count: usize,
    pub validation: ValidationResult,
    pub complexity: ComplexityAnalysis,
    pub preview: PreviewReport,
    pub correction: Option<CorrectionDirective>,
    pub fixed: Option<FixedCandidate>,
}

impl IconReport {
    pub fn is_valid(&self) -> bool {
        self.validation.is_valid
    }

    /// Whether an auto-fixed document exists and passes validation.
    pub fn fixed_is_valid(&self) -> bool {
        self.fixed.as_ref().is_some_and(|f| f.validation.is_valid)
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn validate_candidate(
    document: &str,
    shapes: &[Shape],
    request: &EvaluationRequest,
    profile: &ComplianceProfile,
) -> ValidationResult {
    match &request.metadata {
        Some(metadata) => validate_compliance_shapes(document, shapes, metadata, profile),
        None => validate_geometry_with(shapes, parse_viewbox(document).as_ref(), &profile.rules),
    }
}

pub fn evaluate(document: &str, request: &EvaluationRequest, profile: &ComplianceProfile) -> IconReport {
    let shapes = extract(document);
    let validation = validate_candidate(document, &shapes, request, profile);
    let description = request
        .metadata
        .as_ref()
        .and_then(|m| m.description.as_deref());
    let complexity = analyze_complexity(&shapes, description);
    let preview = preview_report(&shapes, &request.sizes);
    let correction = synthesize(&validation, request.attempt);

    let fixed = correction
        .as_ref()
        .filter(|directive| !directive.auto_fixes.is_empty())
        .and_then(|directive| {
            let outcome = apply_auto_fixes(document, &directive.auto_fixes, &profile.rules);
            if outcome.applied.is_empty() {
                return None;
            }
            let fixed_shapes = extract(&outcome.document);
            let validation = validate_candidate(&outcome.document, &fixed_shapes, request, profile);
            Some(FixedCandidate {
                document: outcome.document,
                applied: outcome.applied,
                validation,
            })
        });

    debug!(
        "Evaluated document: {} shapes, valid={}, score {:.1}, complexity {:?}",
        shapes.len(),
        validation.is_valid,
        validation.score,
        complexity.rating
    );
    IconReport {
        shape_count: shapes.len(),
        validation,
        complexity,
        preview,
        correction,
        fixed,
    }
}

/// Evaluate independent variants in parallel; output order matches input.
pub fn evaluate_variants<S: AsRef<str> + Sync>(
    documents: &[S],
    request: &EvaluationRequest,
    profile: &ComplianceProfile,
    workers: usize,
) -> Vec<IconReport> {
    if documents.is_empty() {
        return vec![];
    }
    let started = Instant::now();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build();

    let reports: Vec<IconReport> = match pool {
        Ok(pool) => pool.install(|| {
            documents
                .par_iter()
                .map(|doc| evaluate(doc.as_ref(), request, profile))
                .collect()
        }),
        Err(_) => {
            // Fallback to sequential
            documents
                .iter()
                .map(|doc| evaluate(doc.as_ref(), request, profile))
                .collect()
        }
    };

    info!(
        "Evaluated {} variants with {} workers in {}ms ({} valid)",
        reports.len(),
        workers.max(1),
        started.elapsed().as_millis(),
        reports.iter().filter(|r| r.is_valid()).count()
    );
    reports
}

// ---------------------------------------------------------------------------
// Report cache
// ---------------------------------------------------------------------------

/// Whether report caching is enabled (`ICONGUARD_CACHE`, on by default).
pub fn cache_enabled() -> bool {
    toggle_enabled(std::env::var(CACHE_ENV).ok().as_deref())
}

fn toggle_enabled(value: Option<&str>) -> bool {
    match value {
        Some(val) => {
            let v = val.trim().to_lowercase();
            !matches!(v.as_str(), "0" | "false" | "no" | "off")
        }
        None => true,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    Hit,
    Miss,
    Bypass,
}

struct CacheEntry {
    report: IconReport,
    expires_at: Instant,
}

/// Bounded, TTL-expiring memo of evaluation reports. Oldest entries are
/// evicted first; a hit moves the entry to the back.
pub struct ReportCache {
    max_entries: usize,
    ttl: Duration,
    entries: Mutex<IndexMap<String, CacheEntry>>,
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_ENTRIES, DEFAULT_CACHE_TTL)
    }
}

impl ReportCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            max_entries: max_entries.max(1),
            ttl,
            entries: Mutex::new(IndexMap::new()),
        }
    }

    pub fn cache_key(document: &str, request: &EvaluationRequest, profile: &ComplianceProfile) -> String {
        let mut hasher = Sha256::new();
        hasher.update(profile.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(serde_json::to_vec(profile).unwrap_or_default());
        hasher.update([0u8]);
        hasher.update(serde_json::to_vec(request).unwrap_or_default());
        hasher.update([0u8]);
        hasher.update(document.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn evict_expired(entries: &mut IndexMap<String, CacheEntry>, now: Instant) {
        entries.retain(|_, entry| entry.expires_at > now);
    }

    pub fn get(&self, key: &str) -> Option<IconReport> {
        let mut entries = self.entries.lock();
        Self::evict_expired(&mut entries, Instant::now());
        let entry = entries.shift_remove(key)?;
        let report = entry.report.clone();
        entries.insert(key.to_string(), entry);
        Some(report)
    }

    pub fn insert(&self, key: String, report: IconReport) {
        let mut entries = self.entries.lock();
        let expires_at = Instant::now() + self.ttl;
        entries.shift_remove(&key);
        entries.insert(key, CacheEntry { report, expires_at });
        while entries.len() > self.max_entries {
            entries.shift_remove_index(0);
        }
    }

    /// Return the cached report for this evaluation or compute and store it.
    pub fn get_or_evaluate(
        &self,
        document: &str,
        request: &EvaluationRequest,
        profile: &ComplianceProfile,
    ) -> (IconReport, CacheMode) {
        if !cache_enabled() {
            return (evaluate(document, request, profile), CacheMode::Bypass);
        }
        let key = Self::cache_key(document, request, profile);
        if let Some(report) = self.get(&key) {
            debug!("Report cache hit {}", &key[..12]);
            return (report, CacheMode::Hit);
        }
        debug!("Report cache miss {}", &key[..12]);
        let report = evaluate(document, request, profile);
        self.insert(key, report.clone());
        (report, CacheMode::Miss)
    }
}
