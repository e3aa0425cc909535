//! Comparison of two `Z.txt` result files.
//!
//! Each file holds four decimal values on its first line. Values are
//! parsed as arbitrary-precision decimals rounded to a working precision,
//! and compared position by position with the relative difference
//! `|v1 - v2| / v1`, where `v1` always comes from the first file.

use crate::config::CompareConfig;
use crate::errors::CompareError;
use crate::models::VALUE_COUNT;
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Default largest accepted relative difference.
pub const DEFAULT_TOLERANCE: &str = "1e-9";

/// Default working precision, in significant decimal digits.
pub const DEFAULT_PRECISION: u64 = 128;

/// Guard digits kept while dividing, before the final rounding.
const GUARD_DIGITS: u64 = 2;

/// Tolerance and working precision for a comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareOptions {
    pub tolerance: BigDecimal,
    pub precision: u64,
}

impl CompareOptions {
    /// Build options from a textual tolerance and a precision.
    pub fn new(tolerance: &str, precision: u64) -> Result<Self, CompareError> {
        if precision == 0 {
            return Err(CompareError::Precision);
        }

        let parsed = BigDecimal::from_str(tolerance.trim())
            .map_err(|_| CompareError::Tolerance(tolerance.to_string()))?;
        if parsed < BigDecimal::zero() {
            return Err(CompareError::Tolerance(tolerance.to_string()));
        }

        Ok(Self {
            tolerance: round_to(parsed, precision),
            precision,
        })
    }
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            tolerance: BigDecimal::new(BigInt::from(1), 9),
            precision: DEFAULT_PRECISION,
        }
    }
}

impl TryFrom<&CompareConfig> for CompareOptions {
    type Error = CompareError;

    fn try_from(config: &CompareConfig) -> Result<Self, Self::Error> {
        Self::new(&config.tolerance, config.precision)
    }
}

/// Relative difference at one position.
#[derive(Debug, Clone, PartialEq)]
pub enum RelativeDifference {
    Finite(BigDecimal),
    /// The reference value is zero and the other is not.
    Unbounded,
}

impl RelativeDifference {
    pub fn exceeds(&self, tolerance: &BigDecimal) -> bool {
        match self {
            RelativeDifference::Finite(value) => {
                if !value.is_positive() {
                    return false;
                }
                if !tolerance.is_positive() {
                    return true;
                }
                // Leading-digit positions decide without aligning scales.
                match magnitude_order(value).cmp(&magnitude_order(tolerance)) {
                    std::cmp::Ordering::Equal => value > tolerance,
                    order => order.is_gt(),
                }
            }
            RelativeDifference::Unbounded => true,
        }
    }
}

impl fmt::Display for RelativeDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelativeDifference::Finite(value) => write!(f, "{}", value),
            RelativeDifference::Unbounded => write!(f, "inf"),
        }
    }
}

/// Outcome of comparing two files.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    /// Every position is within tolerance.
    Match,
    /// The first position whose relative difference exceeds the tolerance.
    Mismatch {
        /// 1-based position.
        position: usize,
        first: BigDecimal,
        second: BigDecimal,
        difference: RelativeDifference,
        tolerance: BigDecimal,
    },
}

impl Comparison {
    pub fn is_match(&self) -> bool {
        matches!(self, Comparison::Match)
    }

    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        if self.is_match() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Match => write!(f, "Files match within tolerance."),
            Comparison::Mismatch {
                position,
                first,
                second,
                difference,
                tolerance,
            } => {
                writeln!(f, "Mismatch at position {}:", position)?;
                writeln!(f, "  File 1: {}", first)?;
                writeln!(f, "  File 2: {}", second)?;
                write!(
                    f,
                    "  |Difference| = {} > Tolerance = {}",
                    difference, tolerance
                )
            }
        }
    }
}

fn decimal_digits(n: &BigInt) -> u64 {
    n.magnitude().to_string().len() as u64
}

/// Position of the leading digit: `d` such that `10^(d-1) <= |value| < 10^d`.
fn magnitude_order(value: &BigDecimal) -> i64 {
    let (mantissa, scale) = value.as_bigint_and_exponent();
    decimal_digits(&mantissa) as i64 - scale
}

/// Round to `precision` significant digits; shorter values are left alone.
pub fn round_to(value: BigDecimal, precision: u64) -> BigDecimal {
    let (mantissa, _) = value.as_bigint_and_exponent();
    if decimal_digits(&mantissa) > precision {
        value.with_prec(precision)
    } else {
        value
    }
}

/// Divide to `precision` significant digits. `den` must not be zero.
fn div_with_precision(num: &BigDecimal, den: &BigDecimal, precision: u64) -> BigDecimal {
    if num.is_zero() {
        return BigDecimal::zero();
    }

    let (n, n_scale) = num.as_bigint_and_exponent();
    let (d, d_scale) = den.as_bigint_and_exponent();

    let shift = (precision + GUARD_DIGITS) as i64 + decimal_digits(&d) as i64
        - decimal_digits(&n) as i64;
    let shift = shift.max(0);

    let scaled = n * num_traits::pow(BigInt::from(10u32), shift as usize);
    let quotient = scaled / d;

    round_to(BigDecimal::new(quotient, n_scale - d_scale + shift), precision)
}

/// `|v1 - v2|` at the given precision.
///
/// Operands are expected to be rounded to `precision` already. When their
/// leading digits are further apart than the working precision, the smaller
/// one is below the rounding resolution and the larger magnitude is returned
/// without aligning the two scales.
fn absolute_difference(v1: &BigDecimal, v2: &BigDecimal, precision: u64) -> BigDecimal {
    if v1.is_zero() {
        return round_to(v2.abs(), precision);
    }
    if v2.is_zero() {
        return round_to(v1.abs(), precision);
    }

    let (order1, order2) = (magnitude_order(v1), magnitude_order(v2));
    if order1.abs_diff(order2) > precision + GUARD_DIGITS {
        let larger = if order1 > order2 { v1 } else { v2 };
        return round_to(larger.abs(), precision);
    }

    round_to((v1 - v2).abs(), precision)
}

/// `|v1 - v2| / v1` at the given precision.
pub fn relative_difference(v1: &BigDecimal, v2: &BigDecimal, precision: u64) -> RelativeDifference {
    let diff = absolute_difference(v1, v2, precision);

    if v1.is_zero() {
        return if diff.is_zero() {
            RelativeDifference::Finite(BigDecimal::zero())
        } else {
            RelativeDifference::Unbounded
        };
    }

    RelativeDifference::Finite(div_with_precision(&diff, v1, precision))
}

/// Parse one line of exactly four decimal values.
pub fn parse_line(
    line: &str,
    path: &Path,
    precision: u64,
) -> Result<[BigDecimal; VALUE_COUNT], CompareError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    if tokens.len() != VALUE_COUNT {
        return Err(CompareError::Format {
            path: path.to_path_buf(),
            found: tokens.len(),
        });
    }

    let mut values: [BigDecimal; VALUE_COUNT] = Default::default();
    for (slot, token) in values.iter_mut().zip(&tokens) {
        let parsed = BigDecimal::from_str(token).map_err(|_| CompareError::Parse {
            path: path.to_path_buf(),
            token: token.to_string(),
        })?;
        *slot = round_to(parsed, precision);
    }

    Ok(values)
}

/// Read the four values on the first line of `path`.
pub fn read_values(path: &Path, precision: u64) -> Result<[BigDecimal; VALUE_COUNT], CompareError> {
    let io_err = |source: std::io::Error| CompareError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let mut line = String::new();
    BufReader::new(file).read_line(&mut line).map_err(io_err)?;

    parse_line(&line, path, precision)
}

/// Compare two sets of values, stopping at the first position out of tolerance.
pub fn compare_values(
    first: &[BigDecimal; VALUE_COUNT],
    second: &[BigDecimal; VALUE_COUNT],
    options: &CompareOptions,
) -> Comparison {
    for (index, (v1, v2)) in first.iter().zip(second.iter()).enumerate() {
        let difference = relative_difference(v1, v2, options.precision);
        debug!("Position {}: relative difference {}", index + 1, difference);

        if difference.exceeds(&options.tolerance) {
            return Comparison::Mismatch {
                position: index + 1,
                first: v1.clone(),
                second: v2.clone(),
                difference,
                tolerance: options.tolerance.clone(),
            };
        }
    }

    Comparison::Match
}

/// Compare the values in two result files.
pub fn compare_files(
    file1: &Path,
    file2: &Path,
    options: &CompareOptions,
) -> Result<Comparison, CompareError> {
    let first = read_values(file1, options.precision)?;
    let second = read_values(file2, options.precision)?;
    Ok(compare_values(&first, &second, options))
}

/// Compare two result files with the default tolerance and precision.
pub fn compare(file1: &Path, file2: &Path) -> Result<Comparison, CompareError> {
    compare_files(file1, file2, &CompareOptions::default())
}
