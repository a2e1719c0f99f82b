//! Price extraction from the store-match comparison text.
//!
//! Only lines following the requested grammar carry a price:
//!
//! ```text
//! "Milk" -> "Great Value Whole Milk" (Estimated Price: $3.50)
//! "Saffron" -> "No close match found in Walmart list"
//! ```
//!
//! Anything else is treated as prose and ignored. A line that has the price
//! clause but no readable number is recorded as an [`UnparsedPrice`] and adds
//! nothing to the total.

use crate::error::BudgetError;
use regex::Regex;
use std::sync::OnceLock;

fn price_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)->.*\(Estimated Price:\s*\$([^)]*)\)").unwrap())
}

fn numeral_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(?:\.\d*)?$").unwrap())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnparsedPrice {
    /// 1-based line number in the scanned text.
    pub line_number: usize,
    pub line: String,
    /// Text captured after the `$`.
    pub raw: String,
}

impl From<UnparsedPrice> for BudgetError {
    fn from(w: UnparsedPrice) -> Self {
        BudgetError::PriceLineUnparsable {
            line_number: w.line_number,
            line: w.line,
            raw: w.raw,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceExtraction {
    pub total: f64,
    /// Lines whose price parsed and was added to `total`.
    pub matched: usize,
    pub warnings: Vec<UnparsedPrice>,
}

/// How a finished extraction should be reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceOutcome {
    Priced { total: f64 },
    /// No price lines at all; the model most likely ignored the format.
    NothingMatched,
    /// Price clauses were present but none was readable.
    FormatWarnings,
}

impl PriceExtraction {
    pub fn outcome(&self) -> PriceOutcome {
        match (self.matched, self.warnings.is_empty()) {
            (0, true) => PriceOutcome::NothingMatched,
            (0, false) => PriceOutcome::FormatWarnings,
            _ => PriceOutcome::Priced { total: self.total },
        }
    }
}

/// Parse one captured price. Commas are thousands separators and dropped.
/// Numerals too large for an `f64` are rejected rather than summed as infinity.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    if !numeral_regex().is_match(&cleaned) {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Line-oriented scanner that accepts text in arbitrary fragments.
///
/// Only completed lines are scanned on [`feed`](Self::feed); the trailing
/// partial line waits for more input or for [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct PriceScanner {
    pending: String,
    line_number: usize,
    extraction: PriceExtraction,
}

impl PriceScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, fragment: &str) {
        self.pending.push_str(fragment);
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            let line = line.strip_suffix('\n').unwrap_or(&line);
            let line = line.strip_suffix('\r').unwrap_or(line);
            self.scan_line(line);
        }
    }

    pub fn finish(mut self) -> PriceExtraction {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.scan_line(rest.strip_suffix('\r').unwrap_or(&rest));
        }
        self.extraction
    }

    fn scan_line(&mut self, line: &str) {
        self.line_number += 1;
        let Some(caps) = price_line_regex().captures(line) else {
            return;
        };
        let raw = caps.get(1).map_or("", |m| m.as_str());
        match parse_price(raw) {
            Some(value) => {
                self.extraction.total += value;
                self.extraction.matched += 1;
            }
            None => self.extraction.warnings.push(UnparsedPrice {
                line_number: self.line_number,
                line: line.to_string(),
                raw: raw.trim().to_string(),
            }),
        }
    }
}

/// Scan a complete text and sum every readable price.
pub fn extract_prices(text: &str) -> PriceExtraction {
    let mut scanner = PriceScanner::new();
    scanner.feed(text);
    scanner.finish()
}
