use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::pricing::black_scholes::MIN_VOLATILITY;
use crate::strategy::leg::{MarketParameters, Strategy, MAX_LEGS};

// ---------------------------------------------------------------------------
// Issue types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueSeverity {
    /// Blocks simulation.
    Error,
    /// Informational; simulation still runs.
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueCode {
    LegCount,
    DuplicateLegId,
    NonPositiveStrike,
    InvalidQuantity,
    NegativeQuantity,
    InvalidMultiplier,
    NegativePremium,
    NegativeExpiration,
    NonPositiveUnderlying,
    PresetMismatch,
    NonPositiveVolatility,
    NegativeDividendYield,
    NegativeElapsedTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: IssueCode,
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn error(code: IssueCode, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            code,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(code: IssueCode, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            code,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == IssueSeverity::Error
    }
}

/// True when any issue should stop the simulator from running.
pub fn has_blocking_issues(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(ValidationIssue::is_blocking)
}

// ---------------------------------------------------------------------------
// Strategy checks
// ---------------------------------------------------------------------------

/// Structural checks on a strategy. Never fails and never prices anything;
/// returns every issue found, errors and warnings alike.
pub fn validate_strategy(strategy: &Strategy) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let n = strategy.legs.len();
    if n == 0 || n > MAX_LEGS {
        issues.push(ValidationIssue::error(
            IssueCode::LegCount,
            "legs",
            format!("Strategy must have between 1 and {MAX_LEGS} legs, found {n}"),
        ));
    }

    if strategy.underlying_price_at_entry <= Decimal::ZERO {
        issues.push(ValidationIssue::error(
            IssueCode::NonPositiveUnderlying,
            "underlying_price_at_entry",
            "Underlying price at entry must be positive",
        ));
    }

    let mut seen_ids = HashSet::new();
    for (i, leg) in strategy.legs.iter().enumerate() {
        let field = |name: &str| format!("legs[{i}].{name}");

        if !seen_ids.insert(leg.id.as_str()) {
            issues.push(ValidationIssue::error(
                IssueCode::DuplicateLegId,
                field("id"),
                format!("Leg id '{}' is used more than once", leg.id),
            ));
        }

        if leg.strike <= Decimal::ZERO {
            issues.push(ValidationIssue::error(
                IssueCode::NonPositiveStrike,
                field("strike"),
                "Strike price must be positive",
            ));
        }

        if leg.quantity.is_zero() || !leg.quantity.fract().is_zero() {
            issues.push(ValidationIssue::error(
                IssueCode::InvalidQuantity,
                field("quantity"),
                format!("Quantity must be a non-zero whole number of contracts, found {}", leg.quantity),
            ));
        } else if leg.quantity < Decimal::ZERO {
            issues.push(ValidationIssue::warning(
                IssueCode::NegativeQuantity,
                field("quantity"),
                "Negative quantity reverses the leg's direction; prefer a positive quantity with the opposite direction",
            ));
        }

        if leg.contract_multiplier <= Decimal::ZERO {
            issues.push(ValidationIssue::error(
                IssueCode::InvalidMultiplier,
                field("contract_multiplier"),
                "Contract multiplier must be positive",
            ));
        }

        if leg.entry_premium < Decimal::ZERO {
            issues.push(ValidationIssue::error(
                IssueCode::NegativePremium,
                field("entry_premium"),
                "Entry premium must not be negative; direction carries the sign",
            ));
        }

        if leg.time_to_expiration < Decimal::ZERO {
            issues.push(ValidationIssue::error(
                IssueCode::NegativeExpiration,
                field("time_to_expiration"),
                "Time to expiration must not be negative",
            ));
        }
    }

    if let Some(preset) = strategy.preset {
        for message in preset.mismatches(strategy) {
            issues.push(ValidationIssue::warning(IssueCode::PresetMismatch, "preset", message));
        }
    }

    issues
}

// ---------------------------------------------------------------------------
// Market checks
// ---------------------------------------------------------------------------

/// Checks on evaluation inputs. Volatility at or below the floor is only a
/// warning because the pricing engine clamps it.
pub fn validate_market(market: &MarketParameters) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if market.current_underlying_price <= Decimal::ZERO {
        issues.push(ValidationIssue::error(
            IssueCode::NonPositiveUnderlying,
            "current_underlying_price",
            "Current underlying price must be positive",
        ));
    }
    if market.volatility < MIN_VOLATILITY {
        issues.push(ValidationIssue::warning(
            IssueCode::NonPositiveVolatility,
            "volatility",
            format!(
                "Volatility {} is below the {MIN_VOLATILITY} floor and will be clamped",
                market.volatility
            ),
        ));
    }
    if market.dividend_yield < Decimal::ZERO {
        issues.push(ValidationIssue::error(
            IssueCode::NegativeDividendYield,
            "dividend_yield",
            "Dividend yield must not be negative",
        ));
    }
    if market.elapsed_time < Decimal::ZERO {
        issues.push(ValidationIssue::error(
            IssueCode::NegativeElapsedTime,
            "elapsed_time",
            "Elapsed time must not be negative",
        ));
    }

    issues
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
