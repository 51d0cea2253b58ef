use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Decimal math helpers (no f64, no MathematicalOps exp/ln/sqrt)
// ---------------------------------------------------------------------------

/// Beyond this magnitude exp() leaves the 28-digit Decimal range.
const EXP_SATURATION: Decimal = dec!(64);

/// |x| beyond which N(x) is 0 or 1 and phi(x) is 0 at Decimal precision.
const NORMAL_TAIL_CUTOFF: Decimal = dec!(40);

const LN_TOLERANCE: Decimal = dec!(0.000000000000000000000001);

/// 1 / sqrt(2*pi)
const INV_SQRT_TWO_PI: Decimal = dec!(0.3989422804014326779399460599);

/// Taylor series exp(x) with range reduction for |x| > 2.
/// exp(x) = exp(x/2)^2 when |x| > 2, then Taylor with 25 terms.
/// Saturates to zero below -64 and to `Decimal::MAX` above 64.
pub fn exp_decimal(x: Decimal) -> Decimal {
    if x < -EXP_SATURATION {
        return Decimal::ZERO;
    }
    if x > EXP_SATURATION {
        return Decimal::MAX;
    }

    let two = dec!(2);
    if x > two || x < -two {
        let half = exp_decimal(x / two);
        return half * half;
    }

    let mut sum = Decimal::ONE;
    let mut term = Decimal::ONE;
    for n in 1u32..=25 {
        term = term * x / Decimal::from(n);
        sum += term;
    }
    sum
}

/// Newton's method sqrt: y_{n+1} = (y_n + x/y_n) / 2, stops once the iterate is stable.
pub fn sqrt_decimal(x: Decimal) -> Decimal {
    if x <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if x == Decimal::ONE {
        return Decimal::ONE;
    }
    let two = dec!(2);
    let mut guess = x / two;
    if x > dec!(100) {
        guess = dec!(10);
    } else if x < dec!(0.01) {
        guess = dec!(0.1);
    }
    for _ in 0..100 {
        let next = (guess + x / guess) / two;
        if next == guess {
            break;
        }
        guess = next;
    }
    guess
}

/// Natural log via Newton's method: find y such that exp(y) = x.
///
/// Non-positive inputs have no logarithm; callers handle those limits
/// before reaching here, the `-999` sentinel only keeps the function total.
pub fn ln_decimal(x: Decimal) -> Decimal {
    if x <= Decimal::ZERO {
        return dec!(-999);
    }
    if x == Decimal::ONE {
        return Decimal::ZERO;
    }

    // Initial guess: for x near 1, use (x-1); otherwise count powers of e
    let mut y = if x > dec!(0.5) && x < dec!(2) {
        x - Decimal::ONE
    } else {
        let mut approx = Decimal::ZERO;
        let mut v = x;
        let e_approx = dec!(2.718281828459045);
        if x > Decimal::ONE {
            while v > e_approx {
                v /= e_approx;
                approx += Decimal::ONE;
            }
        } else {
            while v < Decimal::ONE / e_approx {
                v *= e_approx;
                approx -= Decimal::ONE;
            }
        }
        approx + (v - Decimal::ONE)
    };

    // y_{n+1} = y_n - 1 + x / exp(y_n)
    for _ in 0..50 {
        let ey = exp_decimal(y);
        if ey.is_zero() {
            break;
        }
        let next = y - Decimal::ONE + x / ey;
        let step = (next - y).abs();
        y = next;
        if step < LN_TOLERANCE {
            break;
        }
    }
    y
}

/// Standard normal PDF: phi(x) = exp(-x^2/2) / sqrt(2*pi)
pub fn norm_pdf(x: Decimal) -> Decimal {
    if x.abs() > NORMAL_TAIL_CUTOFF {
        return Decimal::ZERO;
    }
    let exponent = -(x * x) / dec!(2);
    exp_decimal(exponent) * INV_SQRT_TWO_PI
}

/// Standard normal CDF, Abramowitz & Stegun 26.2.17.
///
/// Phi(x) = 1 - phi(x) * (b1*t + b2*t^2 + b3*t^3 + b4*t^4 + b5*t^5),
/// t = 1 / (1 + 0.2316419 * |x|), and Phi(x) = 1 - Phi(-x) for x < 0.
/// Maximum absolute error is 7.5e-8 over the whole real line.
pub fn norm_cdf(x: Decimal) -> Decimal {
    if x > NORMAL_TAIL_CUTOFF {
        return Decimal::ONE;
    }
    if x < -NORMAL_TAIL_CUTOFF {
        return Decimal::ZERO;
    }

    let b1 = dec!(0.319381530);
    let b2 = dec!(-0.356563782);
    let b3 = dec!(1.781477937);
    let b4 = dec!(-1.821255978);
    let b5 = dec!(1.330274429);
    let p = dec!(0.2316419);

    let abs_x = x.abs();
    let t = Decimal::ONE / (Decimal::ONE + p * abs_x);

    // Horner form: t * (b1 + t * (b2 + t * (b3 + t * (b4 + t * b5))))
    let poly = t * (b1 + t * (b2 + t * (b3 + t * (b4 + t * b5))));

    let cdf_pos = Decimal::ONE - norm_pdf(abs_x) * poly;

    if x < Decimal::ZERO {
        Decimal::ONE - cdf_pos
    } else {
        cdf_pos
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
