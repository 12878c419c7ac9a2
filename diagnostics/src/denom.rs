//! Amounts written with a denomination suffix, e.g. `2gwei` or `0.5aut`.

use ethers::types::U256;
use ethers::utils::parse_units;

use crate::error::DiagnosticsError;

/// Suffixes and their decimal exponent. Longer suffixes sharing an ending
/// with shorter ones (`gwei`/`wei`, `auton`/`aut`...) must come first.
const DENOMINATIONS: &[(&str, u32)] = &[
    ("kwei", 3),
    ("mwei", 6),
    ("gwei", 9),
    ("szabo", 12),
    ("finney", 15),
    ("auton", 18),
    ("aut", 18),
    ("attoton", 0),
    ("wei", 0),
];

/// Decimal exponent used when no suffix is given
const DEFAULT_DECIMALS: u32 = 18;

/// Parse a decimal amount with an optional, case-insensitive denomination
/// suffix into wei. A bare number is read as auton.
pub fn parse_wei_representation(value: &str) -> Result<U256, DiagnosticsError> {
    let invalid =
        || DiagnosticsError::config(format!("{value} is not a valid representation of wei"));

    let lower = value.trim().to_ascii_lowercase();
    let (number, decimals) = DENOMINATIONS
        .iter()
        .find_map(|(suffix, decimals)| {
            lower
                .strip_suffix(suffix)
                .map(|number| (number.trim(), *decimals))
        })
        .unwrap_or((lower.as_str(), DEFAULT_DECIMALS));

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty())
        || !digits_only(whole)
        || !digits_only(fraction)
    {
        return Err(invalid());
    }
    // digits below one wei would be dropped
    if fraction.trim_end_matches('0').len() > decimals as usize {
        return Err(invalid());
    }

    parse_units(number, decimals)
        .map(U256::from)
        .map_err(|_| invalid())
}
