//! Hex and unit conversion helpers
//!
//! Node values arrive as `0x`-prefixed hex quantities. Amounts are wei and can
//! exceed any native float or 128-bit range, so everything here works on
//! `U256` and fixed-point decimals instead of `f64`.

use std::fmt;
use std::str::FromStr;

use ethnum::U256;

use crate::error::{Result, RpcError};

/// Number of fractional ether digits carried by one wei.
pub const ETHER_DECIMALS: usize = 18;

/// 10^18 wei = 1 ether
pub const WEI_PER_ETHER: U256 = U256::new(1_000_000_000_000_000_000);

/// Decode a hex quantity into an integer.
///
/// A `0x` prefix always means hex. Without the prefix the string is treated
/// as hex only when it contains a letter digit (`a-f`), otherwise it is read
/// as an already-decimal number.
pub fn decode_hex(input: &str) -> Result<U256> {
    let (digits, prefixed) = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(rest) => (rest, true),
        None => (input, false),
    };

    if digits.is_empty() {
        return Err(RpcError::Format(format!("empty hex value: {:?}", input)));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(RpcError::Format(format!("invalid hex value: {:?}", input)));
    }

    let radix = if prefixed || digits.bytes().any(|b| b.is_ascii_alphabetic()) {
        16
    } else {
        10
    };

    U256::from_str_radix(digits, radix)
        .map_err(|e| RpcError::Format(format!("invalid hex value {:?}: {}", input, e)))
}

/// Encode an integer as a `0x`-prefixed lowercase hex quantity.
pub fn encode_hex(value: impl Into<U256>) -> String {
    let value: U256 = value.into();
    format!("0x{:x}", value)
}

/// Same as [`encode_hex`] for signed input; negative values are rejected.
pub fn encode_hex_signed(value: i128) -> Result<String> {
    if value < 0 {
        return Err(RpcError::Format(format!(
            "cannot hex-encode negative value {}",
            value
        )));
    }
    Ok(encode_hex(U256::new(value as u128)))
}

/// Convert a hex wei quantity to ether.
pub fn wei_to_ether(wei_hex: &str) -> Result<Ether> {
    decode_hex(wei_hex).map(Ether::from_wei)
}

/// Convert an ether amount to a hex wei quantity.
pub fn ether_to_wei(ether: Ether) -> String {
    encode_hex(ether.wei())
}

/// Exact ether amount with 18 fractional digits, backed by its wei value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ether(U256);

impl Ether {
    pub const ZERO: Ether = Ether(U256::ZERO);

    pub fn from_wei(wei: U256) -> Self {
        Self(wei)
    }

    pub fn wei(&self) -> U256 {
        self.0
    }

    /// Lossy conversion for display and rough arithmetic.
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }
}

impl FromStr for Ether {
    type Err = RpcError;

    /// Parses a plain decimal such as `1`, `0.25` or `.5`. Digits past the
    /// 18th fractional place are truncated.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));

        let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !is_digits(whole) || !is_digits(frac) {
            return Err(RpcError::Format(format!("invalid ether amount: {:?}", s)));
        }

        let parse = |digits: &str| {
            U256::from_str_radix(digits, 10)
                .map_err(|e| RpcError::Format(format!("invalid ether amount {:?}: {}", s, e)))
        };

        let whole = if whole.is_empty() {
            U256::ZERO
        } else {
            parse(whole)?
        };
        let frac = &frac[..frac.len().min(ETHER_DECIMALS)];
        let frac = if frac.is_empty() {
            U256::ZERO
        } else {
            parse(&format!("{:0<width$}", frac, width = ETHER_DECIMALS))?
        };

        whole
            .checked_mul(WEI_PER_ETHER)
            .and_then(|wei| wei.checked_add(frac))
            .map(Ether)
            .ok_or_else(|| RpcError::Format(format!("ether amount out of range: {:?}", s)))
    }
}

impl fmt::Display for Ether {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / WEI_PER_ETHER;
        // remainder is below 10^18 so it always fits
        let frac = (self.0 % WEI_PER_ETHER).as_u128();
        let frac = format!("{:018}", frac);
        let frac = frac.trim_end_matches('0');
        let frac = if frac.is_empty() { "0" } else { frac };
        write!(f, "{}.{}", whole, frac)
    }
}
