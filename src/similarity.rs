//! Similarity utilities for span overlap and fuzzy value matching.
//!
//! - [`jaccard`]: set overlap used for span priority
//! - [`normalize_value`]: canonical form of attribute and argument values
//! - [`bounded_levenshtein`]: edit distance with an early cutoff
//! - [`FuzzyMatcher`]: length-scaled fuzzy equality with a shared memo cache

use crate::sync::{lock, Mutex};
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Default fraction of the shorter string's length allowed as edits.
pub const DEFAULT_EDIT_RATIO: f64 = 0.2;

/// Compute the Jaccard coefficient of two ordered sets.
///
/// Returns 0.0 when both sets are empty.
///
/// # Examples
///
/// ```
/// use anno_score::similarity::jaccard;
/// use std::collections::BTreeSet;
///
/// let a: BTreeSet<u32> = [1, 2, 3].into_iter().collect();
/// let b: BTreeSet<u32> = [1, 2].into_iter().collect();
/// assert!((jaccard(&a, &b) - 2.0 / 3.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Normalize a value for comparison: trim, lowercase, `ё` → `е`, and collapse
/// runs of whitespace into single spaces.
///
/// # Examples
///
/// ```
/// use anno_score::similarity::normalize_value;
///
/// assert_eq!(normalize_value("  Пётр   Первый "), "петр первый");
/// ```
#[must_use]
pub fn normalize_value(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| word.to_lowercase().replace('ё', "е"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Levenshtein distance between `a` and `b`, or `None` once it provably
/// exceeds `bound`.
///
/// Works on chars, not bytes.
#[must_use]
pub fn bounded_levenshtein(a: &str, b: &str, bound: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.len().abs_diff(b.len()) > bound {
        return None;
    }
    if a.is_empty() || b.is_empty() {
        return Some(a.len().max(b.len()));
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
            row_min = row_min.min(curr[j + 1]);
        }
        if row_min > bound {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[b.len()];
    (distance <= bound).then_some(distance)
}

type PairCache = HashMap<(String, String), bool>;

static SHARED: Lazy<FuzzyMatcher> = Lazy::new(|| FuzzyMatcher::new(DEFAULT_EDIT_RATIO));

/// Fuzzy equality of normalized strings with a bounded edit distance.
///
/// Two values match when their edit distance is at most
/// `floor(min(len_a, len_b) * edit_ratio)`, so short values must match
/// exactly. Decisions are memoized per unordered string pair; clones of a
/// matcher share one cache behind a mutex, which makes a matcher safe to use
/// from several scoring threads at once.
///
/// # Examples
///
/// ```
/// use anno_score::similarity::FuzzyMatcher;
///
/// let matcher = FuzzyMatcher::new(0.2);
/// assert!(matcher.matches("Газпромбанк", "газпромбанка"));
/// assert!(!matcher.matches("кот", "кит"));
/// ```
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    edit_ratio: f64,
    cache: Arc<Mutex<PairCache>>,
}

impl FuzzyMatcher {
    /// Create a matcher with its own cache.
    #[must_use]
    pub fn new(edit_ratio: f64) -> Self {
        Self {
            edit_ratio: edit_ratio.max(0.0),
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The process-wide matcher using [`DEFAULT_EDIT_RATIO`].
    #[must_use]
    pub fn shared() -> Self {
        SHARED.clone()
    }

    /// Matcher for `edit_ratio`, reusing the process-wide cache when the ratio
    /// is the default one.
    #[must_use]
    pub fn with_ratio(edit_ratio: f64) -> Self {
        if (edit_ratio - DEFAULT_EDIT_RATIO).abs() < f64::EPSILON {
            Self::shared()
        } else {
            Self::new(edit_ratio)
        }
    }

    /// Allowed fraction of edits.
    #[must_use]
    pub fn edit_ratio(&self) -> f64 {
        self.edit_ratio
    }

    /// Compare two values after normalization.
    #[must_use]
    pub fn matches(&self, a: &str, b: &str) -> bool {
        let a = normalize_value(a);
        let b = normalize_value(b);
        if a == b {
            return true;
        }

        let key = if a <= b { (a, b) } else { (b, a) };
        if let Some(&hit) = lock(&self.cache).get(&key) {
            return hit;
        }

        let shorter = key.0.chars().count().min(key.1.chars().count());
        let bound = (shorter as f64 * self.edit_ratio).floor() as usize;
        let result = bounded_levenshtein(&key.0, &key.1, bound).is_some();

        lock(&self.cache).insert(key, result);
        result
    }

    /// Number of memoized pairs.
    #[must_use]
    pub fn cached_pairs(&self) -> usize {
        lock(&self.cache).len()
    }

    /// Drop all memoized decisions.
    pub fn clear_cache(&self) {
        lock(&self.cache).clear();
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[u32]) -> BTreeSet<u32> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_jaccard() {
        assert!((jaccard(&set(&[1, 2, 3]), &set(&[1, 2, 3])) - 1.0).abs() < 1e-12);
        assert!((jaccard(&set(&[1, 2]), &set(&[2, 3])) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(jaccard(&set(&[1]), &set(&[2])), 0.0);
        assert_eq!(jaccard(&set(&[]), &set(&[])), 0.0);
    }

    #[test]
    fn test_normalize_value() {
        assert_eq!(normalize_value("Ёлка"), "елка");
        assert_eq!(normalize_value("\tNew   York\n"), "new york");
        assert_eq!(normalize_value(""), "");
    }

    #[test]
    fn test_bounded_levenshtein() {
        assert_eq!(bounded_levenshtein("kitten", "sitting", 3), Some(3));
        assert_eq!(bounded_levenshtein("kitten", "sitting", 2), None);
        assert_eq!(bounded_levenshtein("", "abc", 3), Some(3));
        assert_eq!(bounded_levenshtein("abc", "abc", 0), Some(0));
        assert_eq!(bounded_levenshtein("a", "abcdef", 2), None);
    }

    #[test]
    fn test_fuzzy_short_values_need_exact_match() {
        let matcher = FuzzyMatcher::new(0.2);
        assert!(matcher.matches("ООН", "оон"));
        assert!(!matcher.matches("ООН", "ОНН"));
    }

    #[test]
    fn test_fuzzy_tolerates_inflection() {
        let matcher = FuzzyMatcher::new(0.2);
        assert!(matcher.matches("Министерство обороны", "министерства обороны"));
        assert!(!matcher.matches("Министерство обороны", "министерство финансов"));
    }

    #[test]
    fn test_fuzzy_cache_is_symmetric() {
        let matcher = FuzzyMatcher::new(0.2);
        assert!(matcher.matches("москва", "москвы"));
        assert!(matcher.matches("москвы", "москва"));
        assert_eq!(matcher.cached_pairs(), 1);
        matcher.clear_cache();
        assert_eq!(matcher.cached_pairs(), 0);
    }

    #[test]
    fn test_clones_share_cache() {
        let matcher = FuzzyMatcher::new(0.3);
        let clone = matcher.clone();
        assert!(clone.matches("абвгде", "абвгдж"));
        assert_eq!(matcher.cached_pairs(), 1);
    }
}
