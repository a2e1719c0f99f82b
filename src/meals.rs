//! Meal block segmentation.
//!
//! A meals document is free text where every meal starts with a header line
//! carrying both a `Time:` and a `Shelf life:` note, e.g.
//!
//! ```text
//! Chicken Stir Fry (Time: 25 min, Shelf life: 3 days)
//! 2 chicken breasts
//! 1 bag frozen vegetables
//! ```
//!
//! Everything up to the next header belongs to the same meal.

use crate::error::{BudgetError, Result};
use crate::normalize::normalize_line;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealRecord {
    /// Normalized first line of the block.
    pub name: String,
    /// Whole block including the header, one trimmed paragraph per line.
    pub body: String,
}

/// Header rule: the line mentions both `time:` and `shelf life:` (any case).
pub fn is_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("time:") && lower.contains("shelf life:")
}

/// Group raw paragraphs into meal blocks.
///
/// Lines before the first header are ignored and blank lines inside a block
/// are skipped. Fails with [`BudgetError::NoMealBlocksFound`] when no header is
/// present or every block ends up without a usable name.
pub fn segment_meals<S: AsRef<str>>(lines: &[S]) -> Result<Vec<MealRecord>> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let current = lines[i].as_ref().trim();
        if !is_header(current) {
            i += 1;
            continue;
        }

        let mut block = vec![current];
        i += 1;
        while i < lines.len() {
            let next = lines[i].as_ref().trim();
            if next.is_empty() {
                i += 1;
                continue;
            }
            if is_header(next) {
                break;
            }
            block.push(next);
            i += 1;
        }
        blocks.push(block);
    }

    let header_count = blocks.len();
    let records: Vec<MealRecord> = blocks
        .into_iter()
        .filter_map(|block| {
            let name = normalize_line(block[0]);
            if name.is_empty() {
                return None;
            }
            Some(MealRecord {
                name,
                body: block.join("\n"),
            })
        })
        .collect();

    debug!(headers = header_count, meals = records.len(), "segmented meals document");

    if records.is_empty() {
        return Err(BudgetError::NoMealBlocksFound);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_detection_is_case_insensitive() {
        assert!(is_header("Tacos (TIME: 20m, SHELF LIFE: 2 days)"));
        assert!(is_header("shelf life: 1 day / time: 5 min"));
        assert!(!is_header("Tacos (Time: 20m)"));
        assert!(!is_header("Shelf life: forever"));
    }

    #[test]
    fn zero_headers_is_an_error() {
        let lines = ["Groceries", "", "Milk", "Eggs"];
        assert!(matches!(
            segment_meals(&lines),
            Err(BudgetError::NoMealBlocksFound)
        ));
        let empty: [&str; 0] = [];
        assert!(matches!(
            segment_meals(&empty),
            Err(BudgetError::NoMealBlocksFound)
        ));
    }

    #[test]
    fn single_header_collects_following_lines() {
        for n in 0..6 {
            let mut lines = vec!["Chili (Time: 1h, Shelf life: 4 days)".to_string()];
            for k in 0..n {
                lines.push(format!("ingredient {k}"));
                lines.push(String::new());
            }
            let meals = segment_meals(&lines).unwrap();
            assert_eq!(meals.len(), 1);
            assert_eq!(meals[0].body.lines().count(), 1 + n, "n = {n}");
        }
    }

    #[test]
    fn consecutive_headers_split_blocks() {
        let lines = [
            "My meal plan",
            "• Pasta (Time: 30 min, Shelf life: 3 days)",
            "  200g spaghetti  ",
            "",
            "1 jar sauce",
            "- Salad (Time: 10 min, Shelf life: 1 day)",
            "Tacos (Time: 20 min, Shelf life: 2 days)",
            "8 tortillas",
        ];
        let meals = segment_meals(&lines).unwrap();
        let names: Vec<&str> = meals.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Pasta (Time: 30 min, Shelf life: 3 days)",
                "Salad (Time: 10 min, Shelf life: 1 day)",
                "Tacos (Time: 20 min, Shelf life: 2 days)",
            ]
        );
        assert_eq!(
            meals[0].body,
            "• Pasta (Time: 30 min, Shelf life: 3 days)\n200g spaghetti\n1 jar sauce"
        );
        assert_eq!(meals[1].body.lines().count(), 1);
        assert_eq!(meals[2].body, "Tacos (Time: 20 min, Shelf life: 2 days)\n8 tortillas");
    }

    #[test]
    fn name_is_normalized_but_body_keeps_marker() {
        let lines = ["— Soup (time: 40m, shelf life: 5d)", "stock"];
        let meals = segment_meals(&lines).unwrap();
        assert_eq!(meals[0].name, "Soup (time: 40m, shelf life: 5d)");
        assert!(meals[0].body.starts_with("— Soup"));
    }
}
