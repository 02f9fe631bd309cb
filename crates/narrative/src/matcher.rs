//! Cross-snapshot identity resolution.
//!
//! Narratives share no stable key across runs, so "the same" narrative
//! is resolved by slug equality first, then fuzzy name similarity.
//! Matching is greedy and order-dependent: current narratives are
//! processed in their given order and each previous narrative can be
//! claimed at most once. Narrative counts per run are small, so a
//! globally optimal bipartite matching buys nothing here.

use std::collections::BTreeSet;

use narradar_core::config::MatcherConfig;

use crate::types::Narrative;

/// For each current narrative, the index of the previous narrative it
/// resolved to, or `None` if it is new. 1:1 by construction.
pub fn match_narratives(
    current: &[Narrative],
    previous: &[Narrative],
    cfg: &MatcherConfig,
) -> Vec<Option<usize>> {
    let mut claimed = vec![false; previous.len()];
    let mut matches: Vec<Option<usize>> = vec![None; current.len()];

    // Pass 1: exact slug.
    for (ci, cur) in current.iter().enumerate() {
        let found = previous
            .iter()
            .enumerate()
            .find(|(pi, prev)| !claimed[*pi] && prev.slug == cur.slug)
            .map(|(pi, _)| pi);
        if let Some(pi) = found {
            claimed[pi] = true;
            matches[ci] = Some(pi);
        }
    }

    // Pass 2: fuzzy name similarity over still-unclaimed candidates.
    for (ci, cur) in current.iter().enumerate() {
        if matches[ci].is_some() {
            continue;
        }
        let cur_words = normalize_name(&cur.name, cfg);
        let mut best: Option<(usize, f64)> = None;
        for (pi, prev) in previous.iter().enumerate() {
            if claimed[pi] {
                continue;
            }
            let score = jaccard(&cur_words, &normalize_name(&prev.name, cfg));
            if score >= cfg.fuzzy_threshold && best.map_or(true, |(_, s)| score > s) {
                best = Some((pi, score));
            }
        }
        if let Some((pi, _)) = best {
            claimed[pi] = true;
            matches[ci] = Some(pi);
        }
    }

    matches
}

/// Indices of previous narratives no current narrative claimed.
pub fn unclaimed_previous(matches: &[Option<usize>], previous_len: usize) -> Vec<usize> {
    let claimed: BTreeSet<usize> = matches.iter().flatten().copied().collect();
    (0..previous_len).filter(|i| !claimed.contains(i)).collect()
}

/// Normalize a narrative name into a bag of words: lowercase, strip
/// punctuation, drop stop words (including the ecosystem name — nearly
/// every narrative is prefixed with it).
fn normalize_name(name: &str, cfg: &MatcherConfig) -> BTreeSet<String> {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|w| !cfg.stop_words.iter().any(|s| s == w))
        .map(|w| w.to_string())
        .collect()
}

/// Jaccard similarity of two word sets. 0.0 when either side is empty.
fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}
