//! Five-year free cash flow projection and Gordon-growth terminal value.

use super::{finite, ValuationError};
use serde::{Deserialize, Serialize};

/// Explicit forecast horizon in years.
pub const PROJECTION_YEARS: u32 = 5;

/// How the terminal value is brought back to present value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalDiscounting {
    /// Divide once by the final year's discount factor.
    #[default]
    Single,
    /// Divide by the final year's discount factor raised to the horizon
    /// again. Reproduces older worksheets that compounded the exponent;
    /// materially understates the terminal value.
    Compounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionYear {
    pub year: u32,
    pub projected_fcf: f64,
    pub discount_factor: f64,
    pub discounted_fcf: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerminalValue {
    pub gordon_rate: f64,
    pub value: f64,
    pub discounted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub years: Vec<ProjectionYear>,
    pub terminal: TerminalValue,
}

impl Projection {
    /// The five discounted cash flows followed by the discounted terminal
    /// value.
    pub fn discounted_entries(&self) -> Vec<f64> {
        self.years
            .iter()
            .map(|y| y.discounted_fcf)
            .chain(std::iter::once(self.terminal.discounted))
            .collect()
    }
}

/// Denominator of the Gordon growth model: `WACC - p` when that exceeds `p`,
/// else `p`.
pub fn gordon_growth_rate(wacc: f64, perpetual_rate: f64) -> f64 {
    let spread = wacc - perpetual_rate;
    if spread > perpetual_rate {
        spread
    } else {
        perpetual_rate
    }
}

/// `(1 + WACC)^year`. A WACC at or below -100% has no meaningful factor.
pub fn discount_factor(wacc: f64, year: u32) -> Result<f64, ValuationError> {
    let base = 1.0 + wacc;
    if base <= 0.0 {
        return Err(ValuationError::degenerate(
            "discount factor",
            format!("1 + WACC = {base} is not positive"),
        ));
    }
    let factor = finite("discount factor", base.powi(year as i32))?;
    if factor == 0.0 {
        return Err(ValuationError::degenerate(
            "discount factor",
            format!("(1 + WACC)^{year} underflows to zero"),
        ));
    }
    Ok(factor)
}

/// Project `latest_fcf` forward at `growth`, discount at `wacc`, and append the
/// terminal value.
pub fn project(
    latest_fcf: f64,
    growth: f64,
    wacc: f64,
    perpetual_rate: f64,
    discounting: TerminalDiscounting,
) -> Result<Projection, ValuationError> {
    let mut years = Vec::with_capacity(PROJECTION_YEARS as usize);

    for year in 1..=PROJECTION_YEARS {
        let raw = finite(
            "projected free cash flow",
            latest_fcf * (1.0 + growth).powi(year as i32),
        )?;
        let projected_fcf = if raw >= 0.0 { raw } else { 0.0 };
        let factor = discount_factor(wacc, year)?;
        years.push(ProjectionYear {
            year,
            projected_fcf,
            discount_factor: factor,
            discounted_fcf: projected_fcf / factor,
        });
    }

    let gordon_rate = gordon_growth_rate(wacc, perpetual_rate);
    if gordon_rate == 0.0 {
        return Err(ValuationError::degenerate(
            "terminal value",
            "Gordon growth denominator is zero",
        ));
    }

    let last = years[years.len() - 1];
    let value = finite(
        "terminal value",
        last.projected_fcf * (1.0 + perpetual_rate) / gordon_rate,
    )?;
    let divisor = match discounting {
        TerminalDiscounting::Single => last.discount_factor,
        TerminalDiscounting::Compounded => finite(
            "terminal discount factor",
            last.discount_factor.powi(PROJECTION_YEARS as i32),
        )?,
    };
    let discounted = finite("discounted terminal value", value / divisor)?;

    Ok(Projection {
        years,
        terminal: TerminalValue {
            gordon_rate,
            value,
            discounted,
        },
    })
}
