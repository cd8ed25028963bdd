// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Murabaha amortization engine.
//!
//! A pure function from [`DealParameters`] to a [`DealSummary`] plus an
//! ordered installment schedule. Money is `Decimal` end to end and every
//! operation is checked, so the only failures are bad input
//! ([`CalcError::Validation`]) or arithmetic overflow
//! ([`CalcError::Computation`]).

use chrono::{Local, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const MONTHS_PER_YEAR: u32 = 12;

/// Longest tenure accepted, in months (100 years).
pub const MAX_DURATION_MONTHS: u32 = 1200;

/// Largest asset price accepted (one quadrillion). Keeps portfolio totals
/// far inside `Decimal` range.
pub const MAX_ASSET_PRICE: Decimal = Decimal::from_parts(2764472320, 232830, 0, false, 0);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalcError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("computation failed: {0}")]
    Computation(String),
}

impl CalcError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        CalcError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// The offending input field, for validation failures.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            CalcError::Validation { field, .. } => Some(*field),
            CalcError::Computation(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealParameters {
    pub asset_price: Decimal,
    /// Fraction (0.05) or percentage (5); see [`normalize_rate`].
    pub annual_profit_rate: Decimal,
    pub duration_months: u32,
    #[serde(default)]
    pub down_payment_percentage: Decimal,
    /// Hamish Jiddiyyah, paid upfront on top of the percentage down payment.
    #[serde(default)]
    pub security_deposit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealSummary {
    pub asset_price: Decimal,
    pub down_payment: Decimal,
    pub security_deposit: Decimal,
    pub financed_amount: Decimal,
    /// Normalized annual rate as a fraction.
    pub annual_profit_rate: Decimal,
    pub duration_months: u32,
    pub total_profit: Decimal,
    pub total_cost: Decimal,
    pub monthly_installment: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub month: u32,
    #[serde(alias = "date")]
    pub due_date: NaiveDate,
    pub beginning_balance: Decimal,
    pub principal_paid: Decimal,
    pub profit_portion: Decimal,
    #[serde(alias = "monthly_installment")]
    pub installment_amount: Decimal,
    pub remaining_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calculation {
    pub summary: DealSummary,
    pub schedule: Vec<ScheduleRow>,
}

/// Rates above 1 are percentages (5 => 0.05); anything else is already a fraction.
///
/// The threshold is strict: a rate of exactly `1` means 100%.
pub fn normalize_rate(rate: Decimal) -> Decimal {
    if rate > Decimal::ONE {
        rate / Decimal::ONE_HUNDRED
    } else {
        rate
    }
}

pub fn validate(params: &DealParameters) -> Result<(), CalcError> {
    if params.asset_price <= Decimal::ZERO {
        return Err(CalcError::invalid(
            "asset_price",
            "must be greater than zero",
        ));
    }
    if params.asset_price > MAX_ASSET_PRICE {
        return Err(CalcError::invalid(
            "asset_price",
            format!("must not exceed {}", MAX_ASSET_PRICE),
        ));
    }
    if params.annual_profit_rate < Decimal::ZERO {
        return Err(CalcError::invalid(
            "annual_profit_rate",
            "must not be negative",
        ));
    }
    if params.duration_months == 0 {
        return Err(CalcError::invalid("duration_months", "must be at least 1"));
    }
    if params.duration_months > MAX_DURATION_MONTHS {
        return Err(CalcError::invalid(
            "duration_months",
            format!("must not exceed {}", MAX_DURATION_MONTHS),
        ));
    }
    if params.down_payment_percentage < Decimal::ZERO
        || params.down_payment_percentage > Decimal::ONE
    {
        return Err(CalcError::invalid(
            "down_payment_percentage",
            "must be a fraction between 0 and 1",
        ));
    }
    if params.security_deposit < Decimal::ZERO {
        return Err(CalcError::invalid(
            "security_deposit",
            "must not be negative",
        ));
    }

    let upfront = checked_add(
        checked_mul(
            params.asset_price,
            params.down_payment_percentage,
            "down payment",
        )?,
        params.security_deposit,
        "down payment",
    )?;
    if upfront > params.asset_price {
        let field = if params.security_deposit.is_zero() {
            "down_payment_percentage"
        } else {
            "security_deposit"
        };
        return Err(CalcError::invalid(
            field,
            format!(
                "upfront payment {} exceeds asset price {}",
                upfront, params.asset_price
            ),
        ));
    }
    Ok(())
}

/// Computes the deal summary and installment schedule.
///
/// The first installment falls due one calendar month after `start`, each
/// later one a further month on. The last row pays whatever balance remains,
/// so the schedule always sums to `total_cost` and ends at zero.
pub fn calculate(params: &DealParameters, start: NaiveDate) -> Result<Calculation, CalcError> {
    validate(params)?;

    let rate = normalize_rate(params.annual_profit_rate);
    let months = Decimal::from(params.duration_months);

    let down_payment = checked_add(
        checked_mul(
            params.asset_price,
            params.down_payment_percentage,
            "down payment",
        )?,
        params.security_deposit,
        "down payment",
    )?;
    let financed_amount = checked_sub(params.asset_price, down_payment, "financed amount")?;
    // multiply before dividing by 12 so whole-year tenures stay exact
    let total_profit = checked_div(
        checked_mul(
            checked_mul(financed_amount, rate, "total profit")?,
            months,
            "total profit",
        )?,
        Decimal::from(MONTHS_PER_YEAR),
        "total profit",
    )?;
    let total_cost = checked_add(financed_amount, total_profit, "total cost")?;
    let monthly_installment = checked_div(total_cost, months, "monthly installment")?;

    let principal_paid = checked_div(financed_amount, months, "principal share")?;
    let profit_portion = checked_div(total_profit, months, "profit share")?;

    let mut schedule = Vec::with_capacity(params.duration_months as usize);
    let mut remaining = total_cost;
    for month in 1..=params.duration_months {
        let beginning_balance = remaining;
        let installment_amount = if month == params.duration_months {
            remaining
        } else {
            monthly_installment
        };
        remaining = checked_sub(remaining, installment_amount, "remaining balance")?
            .max(Decimal::ZERO);

        // offset from the anchor, not the previous row, so a 31st stays a 31st
        let due_date = start
            .checked_add_months(Months::new(month))
            .ok_or_else(|| {
                CalcError::Computation(format!("due date for month {} is out of range", month))
            })?;

        schedule.push(ScheduleRow {
            month,
            due_date,
            beginning_balance,
            principal_paid,
            profit_portion,
            installment_amount,
            remaining_balance: remaining,
        });
    }

    Ok(Calculation {
        summary: DealSummary {
            asset_price: params.asset_price,
            down_payment,
            security_deposit: params.security_deposit,
            financed_amount,
            annual_profit_rate: rate,
            duration_months: params.duration_months,
            total_profit,
            total_cost,
            monthly_installment,
        },
        schedule,
    })
}

pub fn calculate_today(params: &DealParameters) -> Result<Calculation, CalcError> {
    calculate(params, Local::now().date_naive())
}

pub fn installment_total(schedule: &[ScheduleRow]) -> Decimal {
    schedule.iter().map(|r| r.installment_amount).sum()
}

fn checked_add(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, CalcError> {
    a.checked_add(b)
        .ok_or_else(|| CalcError::Computation(format!("overflow computing {}", what)))
}

fn checked_sub(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, CalcError> {
    a.checked_sub(b)
        .ok_or_else(|| CalcError::Computation(format!("overflow computing {}", what)))
}

fn checked_mul(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, CalcError> {
    a.checked_mul(b)
        .ok_or_else(|| CalcError::Computation(format!("overflow computing {}", what)))
}

fn checked_div(a: Decimal, b: Decimal, what: &str) -> Result<Decimal, CalcError> {
    a.checked_div(b)
        .ok_or_else(|| CalcError::Computation(format!("cannot divide while computing {}", what)))
}

/// Deal fields as they arrive over the wire, before any typing.
///
/// Keeping the raw JSON values lets a bad field be reported by name instead
/// of surfacing as a generic decode failure.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawDeal {
    #[serde(default, alias = "cost_price")]
    pub asset_price: Option<Value>,
    #[serde(default, alias = "margin_rate")]
    pub annual_profit_rate: Option<Value>,
    #[serde(default, alias = "months")]
    pub duration_months: Option<Value>,
    #[serde(default)]
    pub down_payment_percentage: Option<Value>,
    #[serde(default, alias = "deposit")]
    pub security_deposit: Option<Value>,
}

impl RawDeal {
    pub fn into_params(self) -> Result<DealParameters, CalcError> {
        let asset_price = required_decimal("asset_price", self.asset_price.as_ref())?;
        let annual_profit_rate =
            required_decimal("annual_profit_rate", self.annual_profit_rate.as_ref())?;
        let duration_months = parse_months(self.duration_months.as_ref())?;
        let down_payment_percentage = optional_decimal(
            "down_payment_percentage",
            self.down_payment_percentage.as_ref(),
        )?
        .unwrap_or(Decimal::ZERO);
        let security_deposit =
            optional_decimal("security_deposit", self.security_deposit.as_ref())?
                .unwrap_or(Decimal::ZERO);

        Ok(DealParameters {
            asset_price,
            annual_profit_rate,
            duration_months,
            down_payment_percentage,
            security_deposit,
        })
    }
}

/// Parses a JSON number or numeric string into a `Decimal`.
pub fn decimal_from_value(field: &'static str, value: &Value) -> Result<Decimal, CalcError> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(CalcError::invalid(field, "must be a number")),
    };
    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| CalcError::invalid(field, format!("'{}' is not a number", text)))
}

fn required_decimal(field: &'static str, value: Option<&Value>) -> Result<Decimal, CalcError> {
    optional_decimal(field, value)?.ok_or_else(|| CalcError::invalid(field, "is required"))
}

fn optional_decimal(
    field: &'static str,
    value: Option<&Value>,
) -> Result<Option<Decimal>, CalcError> {
    value.map(|v| decimal_from_value(field, v)).transpose()
}

fn parse_months(value: Option<&Value>) -> Result<u32, CalcError> {
    const FIELD: &str = "duration_months";
    let months = required_decimal(FIELD, value)?;
    if !months.fract().is_zero() {
        return Err(CalcError::invalid(FIELD, "must be a whole number of months"));
    }
    if months < Decimal::ONE {
        return Err(CalcError::invalid(FIELD, "must be at least 1"));
    }
    months
        .to_u32()
        .ok_or_else(|| CalcError::invalid(FIELD, "is too large"))
}
