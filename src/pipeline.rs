//! One end-to-end run: load documents, take a selection, generate the grocery
//! list, stream the store comparison, and report the estimated cost.
//!
//! Console I/O and the generator are injected so the whole run can be driven
//! from tests.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::documents::{list_paragraphs, load_inventory};
use crate::error::BudgetError;
use crate::generation::{capture_stream, CapturedText, StreamEnd, TextGenerator};
use crate::meals::{segment_meals, MealRecord};
use crate::prices::{PriceExtraction, PriceOutcome, PriceScanner};
use crate::prompts::{comparison_messages, grocery_messages, COMPARISON_TASK, GROCERY_TASK};
use crate::selection::resolve_selection;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Pre-supplied selection; skips the interactive prompt.
    pub selection: Option<String>,
    /// Draw a spinner while waiting on the grocery list.
    pub show_progress: bool,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub selected: Vec<MealRecord>,
    pub grocery_list: String,
    pub comparison: CapturedText,
    /// `None` when the comparison produced no text at all.
    pub prices: Option<PriceExtraction>,
}

/// Load and segment the meals document.
pub fn load_meals(cfg: &Config) -> Result<Vec<MealRecord>> {
    let paragraphs = list_paragraphs(&cfg.meals_path, "Meals file")?;
    Ok(segment_meals(&paragraphs)?)
}

pub fn render_meal_list(meals: &[MealRecord]) -> String {
    let mut out = String::from("--- Available Meals ---\n");
    for (idx, meal) in meals.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", idx + 1, meal.name));
    }
    out.push_str("-----------------------\n");
    out
}

pub fn render_cost_report(extraction: &PriceExtraction) -> String {
    let mut out = String::new();
    out.push_str("===================================\n");
    out.push_str("  CONFIDENT COST ESTIMATION\n");
    out.push_str("-----------------------------------\n");
    out.push_str(&format!(
        " The total estimated cost for the matched items is: ${:.2}\n",
        extraction.total
    ));
    out.push_str("===================================\n");
    match extraction.outcome() {
        PriceOutcome::Priced { .. } => {}
        PriceOutcome::NothingMatched => out.push_str(
            "(Note: No prices could be extracted from the AI's response. Ensure the model followed the requested format.)\n",
        ),
        PriceOutcome::FormatWarnings => out.push_str(&format!(
            "(Note: {} price line(s) did not follow the requested format; none could be read.)\n",
            extraction.warnings.len()
        )),
    }
    out
}

fn spinner(message: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn read_selection<R: BufRead, W: Write>(input: &mut R, out: &mut W, max: usize) -> Result<String> {
    writeln!(out, "\nEnter up to {max} meal names or numbers (comma-separated):")?;
    write!(out, "> ")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read meal selection")?;
    Ok(line.trim().to_string())
}

pub fn run<G, R, W, E>(
    cfg: &Config,
    generator: &G,
    input: &mut R,
    out: &mut W,
    err: &mut E,
    opts: &RunOptions,
) -> Result<RunSummary>
where
    G: TextGenerator + ?Sized,
    R: BufRead,
    W: Write,
    E: Write,
{
    // ── Documents ────────────────────────────────────────────────────────────
    let meals = load_meals(cfg)?;
    let inventory_label = format!("{} items", cfg.store_name);
    let inventory = load_inventory(&cfg.inventory_path, &inventory_label)?;
    info!(meals = meals.len(), inventory = inventory.len(), "documents loaded");

    // ── Selection ────────────────────────────────────────────────────────────
    write!(out, "{}", render_meal_list(&meals))?;
    let policy = cfg.selection_policy();
    let raw = match opts.selection.as_deref() {
        Some(s) => s.to_string(),
        None => read_selection(input, out, policy.max_selection)?,
    };
    let selection = resolve_selection(&raw, &meals, &policy)?;
    for advisory in &selection.advisories {
        writeln!(out, "{advisory}")?;
    }
    debug!(selected = selection.meals.len(), "selection resolved");

    // ── Grocery list ─────────────────────────────────────────────────────────
    writeln!(out, "\nGenerating intermediate grocery list...")?;
    out.flush()?;
    let pb = spinner("waiting for the grocery list...", opts.show_progress);
    let grocery = generator.complete(GROCERY_TASK, &grocery_messages(&selection.meals));
    pb.finish_and_clear();
    let grocery_list = grocery
        .and_then(|text| {
            let text = text.trim().to_string();
            if text.is_empty() {
                Err(BudgetError::generation(GROCERY_TASK, "empty response"))
            } else {
                Ok(text)
            }
        })
        .context("Failed to generate the initial grocery list")?;
    debug!(chars = grocery_list.len(), "grocery list generated");

    // ── Store comparison (streamed) ──────────────────────────────────────────
    let messages = comparison_messages(&grocery_list, &inventory, &cfg.store_name);
    writeln!(
        out,
        "\n--- Recommended {} Purchases (Streaming from {}) ---",
        cfg.store_name, cfg.model
    )?;
    out.flush()?;

    let fragments = generator
        .stream(COMPARISON_TASK, &messages)
        .map_err(|e| BudgetError::GenerationEmptyPartial {
            task: COMPARISON_TASK.to_string(),
            reason: match e {
                BudgetError::GenerationFailed { reason, .. } => reason,
                other => other.to_string(),
            },
        })?;
    let mut scanner = PriceScanner::new();
    let mut echo_failed = false;
    let comparison = capture_stream(COMPARISON_TASK, fragments, |fragment| {
        // Echo failures never stop the capture.
        if let Err(e) = out.write_all(fragment.as_bytes()).and_then(|()| out.flush()) {
            if !echo_failed {
                warn!(error = %e, "failed to echo comparison output; continuing to capture");
                echo_failed = true;
            }
        }
        scanner.feed(fragment);
    })?;
    writeln!(out)?;
    writeln!(out, "-----------------------------------------------------------------")?;

    if let StreamEnd::EndedEarly(reason) = &comparison.end {
        writeln!(
            err,
            "Warning: the comparison stream ended early ({reason}); estimating from the output captured so far."
        )?;
    }

    // ── Cost ─────────────────────────────────────────────────────────────────
    if comparison.text.is_empty() {
        writeln!(out, "\nCould not calculate total cost as no comparison output was captured.")?;
        return Ok(RunSummary {
            selected: selection.meals,
            grocery_list,
            comparison,
            prices: None,
        });
    }

    writeln!(out, "\nCalculating estimated total cost...")?;
    let extraction = scanner.finish();
    write!(out, "\n{}", render_cost_report(&extraction))?;
    if !extraction.warnings.is_empty() {
        writeln!(err, "\n{} price line(s) could not be read:", extraction.warnings.len())?;
        for w in &extraction.warnings {
            writeln!(err, "Warning: {}", BudgetError::from(w.clone()))?;
        }
    }
    info!(total = extraction.total, matched = extraction.matched, "cost estimated");

    Ok(RunSummary {
        selected: selection.meals,
        grocery_list,
        comparison,
        prices: Some(extraction),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::extract_prices;

    #[test]
    fn meal_list_is_numbered() {
        let meals = vec![
            MealRecord {
                name: "Pasta".into(),
                body: "Pasta".into(),
            },
            MealRecord {
                name: "Soup".into(),
                body: "Soup".into(),
            },
        ];
        assert_eq!(
            render_meal_list(&meals),
            "--- Available Meals ---\n1. Pasta\n2. Soup\n-----------------------\n"
        );
    }

    #[test]
    fn cost_report_variants() {
        let priced = extract_prices("\"Milk\" -> \"Milk\" (Estimated Price: $3.5)");
        let report = render_cost_report(&priced);
        assert!(report.contains("matched items is: $3.50"));
        assert!(!report.contains("Note:"));

        let nothing = extract_prices("just prose");
        assert!(render_cost_report(&nothing).contains("No prices could be extracted"));

        let broken = extract_prices("\"A\" -> \"B\" (Estimated Price: $??)");
        let report = render_cost_report(&broken);
        assert!(report.contains("$0.00"));
        assert!(report.contains("did not follow the requested format"));
    }
}
