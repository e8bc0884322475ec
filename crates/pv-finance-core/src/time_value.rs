use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::SolarFinanceError;
use crate::types::{Money, Rate};
use crate::SolarFinanceResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const BRACKET_TOLERANCE: Decimal = dec!(0.000000000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// Lowest rate the IRR search will consider (-50%).
pub const IRR_LOWER_BOUND: Rate = dec!(-0.5);

/// Highest rate the IRR search will consider (1000%).
pub const IRR_UPPER_BOUND: Rate = dec!(10.0);

/// Net Present Value of a series of cash flows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> SolarFinanceResult<Money> {
    if rate <= dec!(-1) {
        return Err(SolarFinanceError::invalid(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }
    Ok(npv_with_derivative(rate, cash_flows).0)
}

/// Internal Rate of Return on an annual series whose first element is the
/// period-0 outlay.
///
/// The root is bracketed on [`IRR_LOWER_BOUND`, `IRR_UPPER_BOUND`] and refined
/// with Newton steps, falling back to bisection whenever a step would leave the
/// bracket or the derivative vanishes. The bracket shrinks every iteration, so
/// the search either converges or reports failure within
/// `MAX_IRR_ITERATIONS`.
pub fn irr(cash_flows: &[Money], guess: Rate) -> SolarFinanceResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(SolarFinanceError::DegenerateCashFlowSeries(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let has_inflow = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    let has_outflow = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    if !(has_inflow && has_outflow) {
        return Err(SolarFinanceError::DegenerateCashFlowSeries(
            "cash flows never change sign, IRR is undefined".into(),
        ));
    }

    let mut lo = IRR_LOWER_BOUND;
    let mut hi = IRR_UPPER_BOUND;
    let (npv_lo, _) = npv_with_derivative(lo, cash_flows);
    let (npv_hi, _) = npv_with_derivative(hi, cash_flows);

    if npv_lo.is_zero() {
        return Ok(lo);
    }
    if npv_hi.is_zero() {
        return Ok(hi);
    }
    if (npv_lo > Decimal::ZERO) == (npv_hi > Decimal::ZERO) {
        return Err(SolarFinanceError::NonConvergentRootFind {
            function: "IRR".into(),
            iterations: 0,
            last_delta: npv_lo.abs().min(npv_hi.abs()),
        });
    }
    let positive_at_lo = npv_lo > Decimal::ZERO;

    let mut rate = if guess > lo && guess < hi {
        guess
    } else {
        (lo + hi) / dec!(2)
    };

    for i in 0..MAX_IRR_ITERATIONS {
        let (npv_val, dnpv) = npv_with_derivative(rate, cash_flows);

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            log::debug!("IRR converged to {rate} after {i} iterations");
            return Ok(rate);
        }

        if (npv_val > Decimal::ZERO) == positive_at_lo {
            lo = rate;
        } else {
            hi = rate;
        }

        if hi - lo < BRACKET_TOLERANCE {
            log::debug!("IRR bracket collapsed at {rate} after {i} iterations");
            return Ok(rate);
        }

        let newton = npv_val
            .checked_div(dnpv)
            .and_then(|step| rate.checked_sub(step));
        rate = match newton {
            Some(next) if next > lo && next < hi => next,
            _ => (lo + hi) / dec!(2),
        };
    }

    Err(SolarFinanceError::NonConvergentRootFind {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: npv_with_derivative(rate, cash_flows).0,
    })
}

/// Payment (PMT)
pub fn pmt(
    rate: Rate,
    nper: u32,
    present_value: Money,
    future_value: Money,
) -> SolarFinanceResult<Money> {
    if nper == 0 {
        return Err(SolarFinanceError::invalid(
            "nper",
            "Number of periods must be > 0",
        ));
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let one_plus_r = Decimal::ONE + rate;
    let factor = one_plus_r.powu(nper as u64);
    let annuity_factor = (factor - Decimal::ONE) / rate;

    if annuity_factor.is_zero() {
        return Err(SolarFinanceError::invalid(
            "rate",
            "PMT annuity factor is zero",
        ));
    }

    Ok(-(present_value * factor + future_value) / annuity_factor)
}

/// NPV and dNPV/dr in one pass, using iterative discount factors.
/// Terms whose discount factor leaves Decimal range contribute nothing.
fn npv_with_derivative(rate: Rate, cash_flows: &[Money]) -> (Money, Decimal) {
    let one_plus_r = Decimal::ONE + rate;
    let mut value = Decimal::ZERO;
    let mut derivative = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            match discount.checked_mul(one_plus_r) {
                Some(d) => discount = d,
                None => break,
            }
        }
        let Some(term) = cf.checked_div(discount) else {
            break;
        };
        value += term;
        if t > 0 {
            let slope = discount
                .checked_mul(one_plus_r)
                .and_then(|d| (Decimal::from(t as i64) * cf).checked_div(d));
            if let Some(slope) = slope {
                derivative -= slope;
            }
        }
    }

    (value, derivative)
}
