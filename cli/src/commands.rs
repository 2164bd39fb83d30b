//! Subcommand implementations. Each returns the text to print.

use std::fmt::Write as _;

use anyhow::{anyhow, bail, Result};
use ratecalc_common::CurrencyCode;
use ratecalc_fx::{InvalidAmount, RateQuery};
use ratecalc_session::{ConverterSession, FetchStatus, LastResult};
use tracing::info;

/// Convert `amount` from one currency to another.
pub async fn convert(
    session: &ConverterSession,
    amount: &str,
    from: &str,
    to: &str,
    json: bool,
) -> Result<String> {
    session.set_base(from)?;
    session.set_target(to)?;

    // Make sure the target is part of the request.
    let target = session.selection().target().clone();
    session.toggle_visible(target, true);

    session.load_rates().await;
    ensure_loaded(session)?;

    session.set_amount_text(amount);
    let result = session.calculate()?;

    if json {
        return Ok(serde_json::to_string_pretty(&session.view())?);
    }

    match result {
        LastResult::Converted(summary) => Ok(summary.to_string()),
        LastResult::Invalid(err) => bail!(invalid_amount_message(amount, err.reason())),
        LastResult::Empty => Err(anyhow!("No result was produced")),
    }
}

/// Show rates for `base`, optionally limited to `targets`.
pub async fn rates(session: &ConverterSession, base: &str, targets: &[String]) -> Result<String> {
    let base = CurrencyCode::parse(base)?;
    let targets = targets
        .iter()
        .map(|t| CurrencyCode::parse(t))
        .collect::<Result<Vec<_>, _>>()?;

    session.fetch(RateQuery::with_targets(base, targets)).await;
    ensure_loaded(session)?;

    let status = session.status();
    let table = status
        .table()
        .ok_or_else(|| anyhow!("Rates are not loaded"))?;

    let mut out = String::new();
    writeln!(out, "Base: {}", table.base())?;
    if let Some(updated) = table.provider_updated_at() {
        writeln!(out, "Provider updated: {}", updated.to_rfc3339())?;
    }
    if session.view().rates_stale {
        writeln!(out, "Warning: rates may be out of date")?;
    }
    for (code, rate) in table.rates() {
        writeln!(out, "{:<6} {rate}", code.as_str())?;
    }

    info!(base = %table.base(), count = table.len(), "Listed rates");
    Ok(out.trim_end().to_string())
}

/// List every currency the provider knows.
pub async fn currencies(session: &ConverterSession) -> Result<String> {
    session.load_catalog().await;
    ensure_loaded(session)?;

    let codes: Vec<String> = session
        .available_codes()
        .iter()
        .map(|code| code.to_string())
        .collect();

    Ok(codes.join("\n"))
}

fn ensure_loaded(session: &ConverterSession) -> Result<()> {
    match session.status() {
        FetchStatus::Success(_) => Ok(()),
        FetchStatus::Failed(err) => {
            let hint = if err.is_retryable() {
                " (temporary, try again)"
            } else {
                ""
            };
            bail!("Failed to load rates: {err}{hint}")
        }
        FetchStatus::Idle | FetchStatus::Loading => bail!("Rates are not loaded"),
    }
}

fn invalid_amount_message(amount: &str, reason: InvalidAmount) -> String {
    match reason {
        InvalidAmount::Empty => "Enter an amount to convert".to_string(),
        InvalidAmount::Malformed => {
            format!("Invalid amount {amount:?}: use digits and '.' as the decimal separator")
        }
        InvalidAmount::OutOfRange => format!("Amount {amount:?} is too large to convert"),
    }
}
