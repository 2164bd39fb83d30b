//! User selection state: currencies, amount, visible codes, last result.

use std::collections::BTreeSet;

use ratecalc_common::{CodeError, CurrencyCode};
use ratecalc_fx::{ConversionError, ConversionSummary};
use tracing::debug;

/// What the result area currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LastResult {
    /// Nothing calculated since the last input change.
    #[default]
    Empty,
    /// A successful conversion.
    Converted(ConversionSummary),
    /// The amount could not be parsed.
    Invalid(ConversionError),
}

impl LastResult {
    pub fn is_empty(&self) -> bool {
        matches!(self, LastResult::Empty)
    }

    /// Formatted result value, if a conversion succeeded.
    pub fn value(&self) -> Option<&str> {
        match self {
            LastResult::Converted(summary) => Some(&summary.result),
            LastResult::Empty | LastResult::Invalid(_) => None,
        }
    }
}

/// Holds what the user has chosen and typed.
///
/// Every mutator clears the last result. Results are only recomputed on an
/// explicit calculate, never on each keystroke.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    base: CurrencyCode,
    target: CurrencyCode,
    amount_text: String,
    visible: BTreeSet<CurrencyCode>,
    last_result: LastResult,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new(
            CurrencyCode::eur(),
            CurrencyCode::usd(),
            [CurrencyCode::eur(), CurrencyCode::gbp(), CurrencyCode::usd()],
        )
    }
}

impl SelectionStore {
    pub fn new(
        base: CurrencyCode,
        target: CurrencyCode,
        visible: impl IntoIterator<Item = CurrencyCode>,
    ) -> Self {
        Self {
            base,
            target,
            amount_text: String::new(),
            visible: visible.into_iter().collect(),
            last_result: LastResult::Empty,
        }
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn target(&self) -> &CurrencyCode {
        &self.target
    }

    pub fn amount_text(&self) -> &str {
        &self.amount_text
    }

    pub fn visible_codes(&self) -> &BTreeSet<CurrencyCode> {
        &self.visible
    }

    pub fn last_result(&self) -> &LastResult {
        &self.last_result
    }

    pub fn is_visible(&self, code: &CurrencyCode) -> bool {
        self.visible.contains(code)
    }

    pub fn set_amount_text(&mut self, text: impl Into<String>) {
        self.amount_text = text.into();
        self.clear_result();
    }

    /// Set the base from typed text. Returns whether the base changed.
    ///
    /// Blank text is rejected and the previous base kept.
    pub fn set_base(&mut self, text: &str) -> Result<bool, CodeError> {
        self.clear_result();
        let code = CurrencyCode::parse(text)?;
        Ok(replace_if_changed(&mut self.base, code))
    }

    /// Set the target from typed text. Returns whether the target changed.
    pub fn set_target(&mut self, text: &str) -> Result<bool, CodeError> {
        self.clear_result();
        let code = CurrencyCode::parse(text)?;
        Ok(replace_if_changed(&mut self.target, code))
    }

    /// Replace the visible set wholesale.
    ///
    /// Dropping the current base or target from the set leaves the selection
    /// alone; it just stops being offered in pickers.
    pub fn set_visible_codes(&mut self, codes: impl IntoIterator<Item = CurrencyCode>) {
        self.visible = codes.into_iter().collect();
        self.clear_result();
    }

    /// Check or uncheck a single code in the visible set.
    pub fn toggle_visible(&mut self, code: CurrencyCode, visible: bool) {
        let mut codes = self.visible.clone();
        if visible {
            codes.insert(code);
        } else {
            codes.remove(&code);
        }
        self.set_visible_codes(codes);
    }

    pub fn set_last_result(&mut self, result: LastResult) {
        self.last_result = result;
    }

    /// Visible codes, alphabetically, that contain `typed`.
    pub fn dropdown_options(&self, typed: &str) -> Vec<CurrencyCode> {
        let candidates: Vec<CurrencyCode> = self.visible.iter().cloned().collect();
        filter_codes(&candidates, typed)
    }

    fn clear_result(&mut self) {
        self.last_result = LastResult::Empty;
    }
}

fn replace_if_changed(slot: &mut CurrencyCode, code: CurrencyCode) -> bool {
    if *slot == code {
        false
    } else {
        *slot = code;
        true
    }
}

/// Candidates containing `typed` case-insensitively, in their original order.
pub fn filter_codes(candidates: &[CurrencyCode], typed: &str) -> Vec<CurrencyCode> {
    let matches: Vec<CurrencyCode> = candidates
        .iter()
        .filter(|code| code.contains_ignore_case(typed))
        .cloned()
        .collect();
    debug!(typed, candidates = candidates.len(), matches = matches.len(), "Filtered codes");
    matches
}
