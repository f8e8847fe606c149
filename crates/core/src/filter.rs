// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure filter/selection engine over `[ProcessView]` (spec.md §4.8). No
//! I/O, no locking — a plain function of its inputs.
//!
//! No fuzzy-match dependency appears anywhere in the example pack for
//! this shape of problem, so matching is a small self-contained
//! subsequence scorer: every character of the needle must appear in the
//! haystack in order (case-insensitive), with a bonus for contiguous
//! runs so e.g. `"web"` ranks `"webserver"` above `"w-e-bridge"`.

use crate::model::{ProcessView, Status};

/// Default prefix that switches filtering into category mode.
pub const DEFAULT_CATEGORY_PREFIX: &str = "cat:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Preserve input order.
    None,
    /// Case-insensitive label order.
    Alpha,
}

#[derive(Debug, Clone)]
pub struct FilterOptions {
    pub filter_text: String,
    pub only_running: bool,
    pub running_first: bool,
    pub sort: SortMode,
    pub category_prefix: String,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            filter_text: String::new(),
            only_running: false,
            running_first: false,
            sort: SortMode::None,
            category_prefix: DEFAULT_CATEGORY_PREFIX.to_owned(),
        }
    }
}

/// Apply the filter/sort pipeline described in spec.md §4.8.
pub fn apply(views: &[ProcessView], opts: &FilterOptions) -> Vec<ProcessView> {
    let base: Vec<ProcessView> = if opts.only_running {
        views.iter().filter(|v| v.status == Status::Running).cloned().collect()
    } else {
        views.to_vec()
    };

    let text = opts.filter_text.trim();

    if text.is_empty() {
        return finish(base, opts);
    }

    if let Some(rest) = text.strip_prefix(&opts.category_prefix) {
        let tokens: Vec<String> =
            rest.split(',').map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()).collect();
        let matched: Vec<ProcessView> = if tokens.is_empty() {
            base
        } else {
            base.into_iter()
                .filter(|v| {
                    tokens.iter().all(|tok| {
                        v.config
                            .categories
                            .iter()
                            .any(|cat| fuzzy_match(tok, &cat.to_lowercase()).is_some())
                    })
                })
                .collect()
        };
        return finish(matched, opts);
    }

    // Fuzzy-match order is preserved: filter in place, no ranking sort and
    // no running_first/alpha sort applied in this mode (spec.md §4.8).
    let needle = text.to_lowercase();
    base.into_iter().filter(|v| fuzzy_match(&needle, &v.label.to_lowercase()).is_some()).collect()
}

fn finish(mut views: Vec<ProcessView>, opts: &FilterOptions) -> Vec<ProcessView> {
    if opts.sort == SortMode::Alpha && !opts.running_first {
        views.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
    }

    if opts.running_first {
        // Stable partition: Running before non-Running.
        let (mut running, mut rest): (Vec<_>, Vec<_>) =
            views.into_iter().partition(|v| v.status == Status::Running);
        if opts.sort == SortMode::Alpha {
            running.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
            rest.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
        }
        running.extend(rest.drain(..));
        return running;
    }

    views
}

/// Subsequence match with a contiguity bonus. Returns `None` if `needle`
/// is not a subsequence of `haystack`; otherwise a higher-is-better score.
fn fuzzy_match(needle: &str, haystack: &str) -> Option<i64> {
    if needle.is_empty() {
        return Some(0);
    }
    let hay: Vec<char> = haystack.chars().collect();
    let mut score: i64 = 0;
    let mut hay_idx = 0;
    let mut run = 0i64;

    for ch in needle.chars() {
        let mut found = false;
        while hay_idx < hay.len() {
            if hay[hay_idx] == ch {
                run += 1;
                score += 1 + run; // reward contiguous runs
                hay_idx += 1;
                found = true;
                break;
            }
            run = 0;
            hay_idx += 1;
        }
        if !found {
            return None;
        }
    }
    // Prefer shorter haystacks (tighter matches) as a tiebreaker.
    score -= hay.len() as i64;
    Some(score)
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
