//! Resolve a free-text meal selection (`"1, salad, Tacoz"`) against the meal list.
//!
//! Each token goes through a fixed cascade, first hit wins:
//!
//! 1. ordinal: the literal 1-based position (`"2"`; `"02"` is not an ordinal),
//! 2. exact name, case-insensitive,
//! 3. closest name by similarity ratio, at or above the configured cutoff.
//!
//! Fuzzy hits are reported back as [`Advisory::Interpreted`] and never replace
//! a meal that is already selected. Tokens that resolve to nothing produce an
//! [`Advisory::Unmatched`] and are skipped.

use crate::error::{BudgetError, Result};
use crate::meals::MealRecord;
use crate::similarity::close_matches;
use std::collections::HashSet;
use std::fmt;

pub const DEFAULT_MAX_SELECTION: usize = 5;
pub const DEFAULT_SIMILARITY_CUTOFF: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionPolicy {
    /// Only this many tokens are considered, so at most this many meals come back.
    pub max_selection: usize,
    /// Minimum similarity ratio for an approximate name match.
    pub similarity_cutoff: f64,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            max_selection: DEFAULT_MAX_SELECTION,
            similarity_cutoff: DEFAULT_SIMILARITY_CUTOFF,
        }
    }
}

/// Exact classification of a single token. Indices point into the meal list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMatch {
    Ordinal(usize),
    ExactName(usize),
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// A token was matched approximately to `name`.
    Interpreted { token: String, name: String },
    /// A token matched nothing and was skipped.
    Unmatched { token: String },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::Interpreted { token, name } => write!(f, "(Interpreting '{token}' as '{name}')"),
            Advisory::Unmatched { token } => {
                write!(f, "Warning: Could not find meal matching '{token}'. Skipping.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Chosen meals in the order the user named them, no duplicate names.
    pub meals: Vec<MealRecord>,
    /// Notices produced while resolving, in token order.
    pub advisories: Vec<Advisory>,
}

/// Split on commas, trim, drop empty tokens.
pub fn split_tokens(input: &str) -> Vec<&str> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

pub fn classify_token(token: &str, meals: &[MealRecord]) -> TokenMatch {
    if let Some(idx) = ordinal_index(token, meals.len()) {
        return TokenMatch::Ordinal(idx);
    }
    let lower = token.to_lowercase();
    match meals.iter().position(|m| m.name.to_lowercase() == lower) {
        Some(idx) => TokenMatch::ExactName(idx),
        None => TokenMatch::Unresolved,
    }
}

/// Best approximate name match for `token`, if any clears `cutoff`.
pub fn fuzzy_candidate(token: &str, meals: &[MealRecord], cutoff: f64) -> Option<usize> {
    let names: Vec<&str> = meals.iter().map(|m| m.name.as_str()).collect();
    let best = close_matches(token, &names, 1, cutoff).into_iter().next()?;
    meals.iter().position(|m| m.name == best)
}

fn ordinal_index(token: &str, len: usize) -> Option<usize> {
    let n: usize = token.parse().ok()?;
    // Literal comparison: "01" and "+1" parse to 1 but are not ordinals.
    if n == 0 || n > len || n.to_string() != token {
        return None;
    }
    Some(n - 1)
}

/// State threaded through the token fold.
#[derive(Debug, Default)]
struct Accumulator {
    selected: Vec<usize>,
    /// Raw tokens seen, plus lowercase names and ordinals of selected meals.
    consumed: HashSet<String>,
    advisories: Vec<Advisory>,
}

impl Accumulator {
    fn holds(&self, meals: &[MealRecord], idx: usize) -> bool {
        self.selected.iter().any(|&s| meals[s].name == meals[idx].name)
    }

    fn select(&mut self, meals: &[MealRecord], idx: usize, token: &str) {
        self.selected.push(idx);
        self.consumed.insert(token.to_string());
        self.consumed.insert(meals[idx].name.to_lowercase());
        self.consumed.insert((idx + 1).to_string());
    }

    fn absorb(mut self, token: &str, meals: &[MealRecord], cutoff: f64) -> Self {
        if self.consumed.contains(token) {
            return self;
        }

        let hit = match classify_token(token, meals) {
            TokenMatch::Ordinal(idx) | TokenMatch::ExactName(idx) => Some(idx),
            TokenMatch::Unresolved => match fuzzy_candidate(token, meals, cutoff) {
                Some(idx) if self.holds(meals, idx) => {
                    self.consumed.insert(token.to_string());
                    return self;
                }
                Some(idx) => {
                    self.advisories.push(Advisory::Interpreted {
                        token: token.to_string(),
                        name: meals[idx].name.clone(),
                    });
                    Some(idx)
                }
                None => None,
            },
        };

        match hit {
            Some(idx) if !self.holds(meals, idx) => self.select(meals, idx, token),
            Some(_) => {
                self.consumed.insert(token.to_string());
            }
            None => {
                self.advisories.push(Advisory::Unmatched {
                    token: token.to_string(),
                });
                self.consumed.insert(token.to_string());
            }
        }
        self
    }
}

/// Resolve a comma-separated selection against `meals`.
///
/// Errors with [`BudgetError::EmptySelection`] when the input has no tokens and
/// [`BudgetError::NoValidSelection`] when no token resolved to a meal.
pub fn resolve_selection(input: &str, meals: &[MealRecord], policy: &SelectionPolicy) -> Result<Selection> {
    let tokens = split_tokens(input);
    if tokens.is_empty() {
        return Err(BudgetError::EmptySelection);
    }

    let acc = tokens
        .iter()
        .take(policy.max_selection)
        .fold(Accumulator::default(), |acc, token| {
            acc.absorb(token, meals, policy.similarity_cutoff)
        });

    if acc.selected.is_empty() {
        return Err(BudgetError::NoValidSelection);
    }

    Ok(Selection {
        meals: acc.selected.iter().map(|&i| meals[i].clone()).collect(),
        advisories: acc.advisories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn meals(names: &[&str]) -> Vec<MealRecord> {
        names
            .iter()
            .map(|n| MealRecord {
                name: n.to_string(),
                body: format!("{n} (Time: 10 min, Shelf life: 2 days)"),
            })
            .collect()
    }

    fn names(sel: &Selection) -> Vec<&str> {
        sel.meals.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn classify_each_tier() {
        let list = meals(&["Pasta", "Salad", "Tacos"]);
        assert_eq!(classify_token("2", &list), TokenMatch::Ordinal(1));
        assert_eq!(classify_token("TACOS", &list), TokenMatch::ExactName(2));
        assert_eq!(classify_token("Tacoz", &list), TokenMatch::Unresolved);
        assert_eq!(classify_token("4", &list), TokenMatch::Unresolved);
        assert_eq!(classify_token("0", &list), TokenMatch::Unresolved);
        assert_eq!(classify_token("01", &list), TokenMatch::Unresolved);
    }

    #[test]
    fn ordinal_wins_over_numeric_name() {
        let list = meals(&["2", "Soup"]);
        assert_eq!(classify_token("2", &list), TokenMatch::Ordinal(1));
        assert_eq!(classify_token("1", &list), TokenMatch::Ordinal(0));
    }

    #[test]
    fn fuzzy_candidate_uses_cutoff() {
        let list = meals(&["Pasta", "Salad", "Tacos"]);
        assert_eq!(fuzzy_candidate("Tacoz", &list, 0.7), Some(2));
        assert_eq!(fuzzy_candidate("Tacoz", &list, 0.9), None);
        assert_eq!(fuzzy_candidate("Ramen", &list, 0.7), None);
    }

    #[test]
    fn ordinal_name_and_fuzzy_mix() {
        let list = meals(&["Pasta", "Salad", "Tacos"]);
        let sel = resolve_selection("1, salad, Tacoz", &list, &SelectionPolicy::default()).unwrap();
        assert_eq!(names(&sel), ["Pasta", "Salad", "Tacos"]);
        assert_eq!(
            sel.advisories,
            vec![Advisory::Interpreted {
                token: "Tacoz".into(),
                name: "Tacos".into()
            }]
        );
        assert_eq!(sel.advisories[0].to_string(), "(Interpreting 'Tacoz' as 'Tacos')");
    }

    #[test]
    fn duplicates_are_absorbed_silently() {
        let list = meals(&["Pasta", "Salad", "Tacos"]);
        let sel = resolve_selection("Pasta, pasta, 1", &list, &SelectionPolicy::default()).unwrap();
        assert_eq!(names(&sel), ["Pasta"]);
        assert!(sel.advisories.is_empty());
    }

    #[test]
    fn fuzzy_hit_on_selected_meal_is_silent() {
        let list = meals(&["Pasta", "Salad", "Tacos"]);
        let sel = resolve_selection("3, Tacoz", &list, &SelectionPolicy::default()).unwrap();
        assert_eq!(names(&sel), ["Tacos"]);
        assert!(sel.advisories.is_empty());
    }

    #[test]
    fn only_first_max_tokens_count() {
        let list = meals(&["Pasta", "Salad", "Tacos"]);
        let policy = SelectionPolicy {
            max_selection: 2,
            ..SelectionPolicy::default()
        };
        let sel = resolve_selection("1,2,3", &list, &policy).unwrap();
        assert_eq!(names(&sel), ["Pasta", "Salad"]);

        // Duplicates still use up a slot.
        let sel = resolve_selection("1,1,3", &list, &policy).unwrap();
        assert_eq!(names(&sel), ["Pasta"]);
    }

    #[test]
    fn unmatched_tokens_warn_and_continue() {
        let list = meals(&["Pasta", "Salad", "Tacos"]);
        let sel = resolve_selection("burger, 2, 9", &list, &SelectionPolicy::default()).unwrap();
        assert_eq!(names(&sel), ["Salad"]);
        assert_eq!(
            sel.advisories,
            vec![
                Advisory::Unmatched { token: "burger".into() },
                Advisory::Unmatched { token: "9".into() },
            ]
        );
        assert_eq!(
            sel.advisories[0].to_string(),
            "Warning: Could not find meal matching 'burger'. Skipping."
        );
    }

    #[test]
    fn repeated_unmatched_token_warns_once() {
        let list = meals(&["Pasta"]);
        let sel = resolve_selection("zzz, zzz, Pasta", &list, &SelectionPolicy::default()).unwrap();
        assert_eq!(sel.advisories.len(), 1);
    }

    #[test]
    fn empty_and_invalid_selections() {
        let list = meals(&["Pasta", "Salad"]);
        let policy = SelectionPolicy::default();
        assert!(matches!(resolve_selection("", &list, &policy), Err(BudgetError::EmptySelection)));
        assert!(matches!(resolve_selection(" , ,, ", &list, &policy), Err(BudgetError::EmptySelection)));
        assert!(matches!(
            resolve_selection("nothing, 7", &list, &policy),
            Err(BudgetError::NoValidSelection)
        ));
    }

    #[test]
    fn custom_cutoff_disables_fuzzy() {
        let list = meals(&["Pasta", "Salad", "Tacos"]);
        let policy = SelectionPolicy {
            similarity_cutoff: 0.95,
            ..SelectionPolicy::default()
        };
        assert!(matches!(
            resolve_selection("Tacoz", &list, &policy),
            Err(BudgetError::NoValidSelection)
        ));
    }

    fn token_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("1".to_string()),
            Just("2".to_string()),
            Just("3".to_string()),
            Just("4".to_string()),
            Just("Pasta".to_string()),
            Just("pasta".to_string()),
            Just("SALAD".to_string()),
            Just("Tacoz".to_string()),
            Just("Salat".to_string()),
            "[A-Za-z ]{0,8}",
        ]
    }

    proptest! {
        #[test]
        fn never_exceeds_max_or_repeats_a_name(
            tokens in proptest::collection::vec(token_strategy(), 0..12),
            max in 1usize..6,
        ) {
            let list = meals(&["Pasta", "Salad", "Tacos", "Pasta Bake"]);
            let policy = SelectionPolicy { max_selection: max, ..SelectionPolicy::default() };
            match resolve_selection(&tokens.join(","), &list, &policy) {
                Ok(sel) => {
                    prop_assert!(!sel.meals.is_empty());
                    prop_assert!(sel.meals.len() <= max);
                    let mut seen = HashSet::new();
                    for m in &sel.meals {
                        prop_assert!(seen.insert(m.name.clone()), "duplicate {}", m.name);
                    }
                }
                Err(BudgetError::EmptySelection) | Err(BudgetError::NoValidSelection) => {}
                Err(e) => prop_assert!(false, "unexpected error: {e}"),
            }
        }
    }
}
