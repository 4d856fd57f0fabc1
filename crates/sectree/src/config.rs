//! Runtime configuration for sectree.
//!
//! Two settings are exposed: the run ceiling applied to every scenario and the
//! tag filter deciding which scenarios run. In-process overrides take
//! precedence over the `SECTREE_MAX_RUNS` and `SECTREE_TAGS` environment
//! variables.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::tags::TagFilter;

/// Run ceiling used when neither an override nor the environment sets one.
pub const DEFAULT_MAX_RUNS: usize = 10_000;

const MAX_RUNS_ENV: &str = "SECTREE_MAX_RUNS";
const TAGS_ENV: &str = "SECTREE_TAGS";

const OVERRIDE_UNSET: usize = 0;

static MAX_RUNS_OVERRIDE: AtomicUsize = AtomicUsize::new(OVERRIDE_UNSET);
static TAG_FILTER_OVERRIDE: OnceLock<Mutex<Option<TagFilter>>> = OnceLock::new();

fn parse_env_limit(value: &str) -> Option<usize> {
    value
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|limit| *limit > 0)
}

fn env_max_runs() -> Option<usize> {
    std::env::var(MAX_RUNS_ENV)
        .ok()
        .as_deref()
        .and_then(parse_env_limit)
}

fn env_tag_filter() -> Option<TagFilter> {
    let value = std::env::var(TAGS_ENV).ok()?;
    if value.trim().is_empty() {
        return None;
    }
    match TagFilter::parse(&value) {
        Ok(filter) => Some(filter),
        Err(error) => {
            log::warn!("ignoring {TAGS_ENV}={value:?}: {error}");
            None
        }
    }
}

fn lock_tag_filter() -> MutexGuard<'static, Option<TagFilter>> {
    let mutex = TAG_FILTER_OVERRIDE.get_or_init(|| Mutex::new(None));
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Determine the run ceiling applied to each scenario.
#[must_use]
pub fn max_runs() -> usize {
    match MAX_RUNS_OVERRIDE.load(Ordering::Relaxed) {
        OVERRIDE_UNSET => env_max_runs().unwrap_or(DEFAULT_MAX_RUNS),
        limit => limit,
    }
}

/// Override the run ceiling for the current process. Zero is raised to one.
pub fn set_max_runs(limit: usize) {
    MAX_RUNS_OVERRIDE.store(limit.max(1), Ordering::Relaxed);
}

/// Remove any in-process override of the run ceiling.
pub fn clear_max_runs_override() {
    MAX_RUNS_OVERRIDE.store(OVERRIDE_UNSET, Ordering::Relaxed);
}

/// Determine the active tag filter, if any.
#[must_use]
pub fn tag_filter() -> Option<TagFilter> {
    lock_tag_filter().clone().or_else(env_tag_filter)
}

/// Override the tag filter for the current process.
pub fn set_tag_filter(filter: TagFilter) {
    *lock_tag_filter() = Some(filter);
}

/// Remove any in-process override of the tag filter.
pub fn clear_tag_filter_override() {
    *lock_tag_filter() = None;
}
