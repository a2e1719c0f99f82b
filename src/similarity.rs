//! Ratcliff/Obershelp string similarity.
//!
//! Same scoring as Python's `difflib.SequenceMatcher.ratio()`: repeatedly take
//! the longest common substring, recurse on both sides, and score
//! `2 * matched / (len(a) + len(b))`. Sequences are compared per `char`.

use std::cmp::Ordering;
use std::collections::HashMap;

/// Second sequences at least this long get the "popular element" heuristic.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Matcher with the second sequence pre-indexed, reusable across many first
/// sequences (the shape `close_matches` needs).
struct SequenceMatcher {
    b: Vec<char>,
    /// Positions of each non-popular element of `b`, ascending.
    b2j: HashMap<char, Vec<usize>>,
    /// Element counts of `b`, for `quick_ratio`.
    b_counts: HashMap<char, usize>,
}

impl SequenceMatcher {
    fn new(b: &str) -> Self {
        let b: Vec<char> = b.chars().collect();
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &ch) in b.iter().enumerate() {
            b2j.entry(ch).or_default().push(j);
        }
        let b_counts = b2j.iter().map(|(&ch, js)| (ch, js.len())).collect();

        if b.len() >= AUTOJUNK_MIN_LEN {
            let ntest = b.len() / 100 + 1;
            b2j.retain(|_, js| js.len() <= ntest);
        }

        Self { b, b2j, b_counts }
    }

    /// Longest matching block of `a[alo..ahi]` and `b[blo..bhi]`, earliest in
    /// `a` (then `b`) on ties. Returns `(i, j, size)`.
    fn find_longest_match(&self, a: &[char], alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut besti, mut bestj, mut bestsize) = (alo, blo, 0usize);
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for (i, ch) in a.iter().enumerate().take(ahi).skip(alo) {
            let mut newj2len: HashMap<usize, usize> = HashMap::new();
            if let Some(js) = self.b2j.get(ch) {
                for &j in js {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let prev = if j > 0 { j2len.get(&(j - 1)).copied().unwrap_or(0) } else { 0 };
                    let k = prev + 1;
                    newj2len.insert(j, k);
                    if k > bestsize {
                        besti = i + 1 - k;
                        bestj = j + 1 - k;
                        bestsize = k;
                    }
                }
            }
            j2len = newj2len;
        }

        // Popular elements were left out of b2j; let equal neighbours extend
        // the block so they still count.
        while besti > alo && bestj > blo && a[besti - 1] == self.b[bestj - 1] {
            besti -= 1;
            bestj -= 1;
            bestsize += 1;
        }
        while besti + bestsize < ahi && bestj + bestsize < bhi && a[besti + bestsize] == self.b[bestj + bestsize] {
            bestsize += 1;
        }

        (besti, bestj, bestsize)
    }

    /// Total number of elements covered by matching blocks.
    fn matched_len(&self, a: &[char]) -> usize {
        let mut matched = 0;
        let mut queue = vec![(0, a.len(), 0, self.b.len())];
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.find_longest_match(a, alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            matched += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
        matched
    }

    fn ratio(&self, a: &[char]) -> f64 {
        score(self.matched_len(a), a.len() + self.b.len())
    }

    /// Upper bound on `ratio`: shared element counts, ignoring order.
    fn quick_ratio(&self, a: &[char]) -> f64 {
        let mut avail: HashMap<char, usize> = HashMap::new();
        let mut matches = 0;
        for ch in a {
            let left = avail
                .entry(*ch)
                .or_insert_with(|| self.b_counts.get(ch).copied().unwrap_or(0));
            if *left > 0 {
                *left -= 1;
                matches += 1;
            }
        }
        score(matches, a.len() + self.b.len())
    }

    /// Cheapest upper bound on `ratio`: lengths only.
    fn real_quick_ratio(&self, a: &[char]) -> f64 {
        score(a.len().min(self.b.len()), a.len() + self.b.len())
    }
}

fn score(matches: usize, total_len: usize) -> f64 {
    if total_len == 0 {
        return 1.0;
    }
    2.0 * matches as f64 / total_len as f64
}

/// Similarity of `a` and `b` in `[0, 1]`. Two empty strings score `1.0`.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    SequenceMatcher::new(b).ratio(&a)
}

/// Up to `n` candidates scoring at least `cutoff` against `word`, best first.
///
/// Ties on score go to the lexicographically greater candidate. A cutoff
/// outside `[0, 1]` or `n == 0` yields nothing.
pub fn close_matches<'a, S: AsRef<str>>(word: &str, possibilities: &'a [S], n: usize, cutoff: f64) -> Vec<&'a str> {
    if n == 0 || !(0.0..=1.0).contains(&cutoff) {
        return Vec::new();
    }

    let matcher = SequenceMatcher::new(word);
    let mut scored: Vec<(f64, &'a str)> = possibilities
        .iter()
        .filter_map(|p| {
            let candidate = p.as_ref();
            let a: Vec<char> = candidate.chars().collect();
            if matcher.real_quick_ratio(&a) < cutoff || matcher.quick_ratio(&a) < cutoff {
                return None;
            }
            let r = matcher.ratio(&a);
            (r >= cutoff).then_some((r, candidate))
        })
        .collect();

    scored.sort_by(|x, y| {
        y.0.partial_cmp(&x.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| y.1.cmp(x.1))
    });
    scored.into_iter().take(n).map(|(_, s)| s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn ratio_known_values() {
        // Reference values from difflib.SequenceMatcher(None, a, b).ratio().
        assert!(approx(ratio("abcd", "bcde"), 0.75));
        assert!(approx(ratio("Tacoz", "Tacos"), 0.8));
        assert!(approx(ratio("apple", "ape"), 0.75));
        assert!(approx(ratio("", ""), 1.0));
        assert!(approx(ratio("abc", ""), 0.0));
        assert!(approx(ratio("same", "same"), 1.0));
    }

    #[test]
    fn ratio_is_case_sensitive() {
        assert!(ratio("salad", "Salad") < 1.0);
        assert!(approx(ratio("salad", "Salad"), 0.8));
    }

    #[test]
    fn ratio_uses_recursive_blocks() {
        // "private Thread currentThread;" example from the difflib docs.
        let a = "private Thread currentThread;";
        let b = "private volatile Thread currentThread;";
        let r = ratio(a, b);
        assert!(r > 0.86 && r < 0.87, "got {r}");
    }

    #[test]
    fn close_matches_difflib_example() {
        let words = ["ape", "apple", "peach", "puppy"];
        assert_eq!(close_matches("appel", &words, 3, 0.6), vec!["apple", "ape"]);
    }

    #[test]
    fn close_matches_respects_cutoff_and_n() {
        let names = ["Pasta", "Salad", "Tacos"];
        assert_eq!(close_matches("Tacoz", &names, 1, 0.7), vec!["Tacos"]);
        assert!(close_matches("Burger", &names, 1, 0.7).is_empty());
        assert!(close_matches("Tacoz", &names, 0, 0.7).is_empty());
        assert!(close_matches("Tacoz", &names, 1, 1.5).is_empty());
    }

    #[test]
    fn ties_prefer_greater_candidate() {
        let names = ["abx", "aby"];
        assert_eq!(close_matches("abz", &names, 1, 0.5), vec!["aby"]);
    }

    #[test]
    fn autojunk_applies_to_long_words() {
        // 'a' is popular in the 251-char word, so only the 'x' seeds a block.
        let word = format!("x{}", "a".repeat(250));
        let candidate = format!("{}x", "a".repeat(10));
        assert!(approx(ratio(&candidate, &word), 2.0 / 262.0));

        // Popular elements still extend a block that starts at the range edge.
        let same = "a".repeat(250);
        assert!(approx(ratio(&same, &same), 1.0));
    }
}
