//! Fixed-point token amounts.
//!
//! Requests carry amounts as integer strings plus an explicit decimals
//! count. The backend expects human-readable decimal strings ("100.0").

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::GatewayError;

/// Largest decimals count a request may declare.
pub const MAX_DECIMALS: u8 = 18;

/// Non-negative integer amount scaled by `10^decimals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedAmount {
    pub raw: u128,
    pub decimals: u8,
}

impl FixedAmount {
    /// Parse an integer string. Rejects signs, fractions and whitespace.
    pub fn parse(raw: &str, decimals: u8, field: &str) -> Result<Self, GatewayError> {
        if decimals > MAX_DECIMALS {
            return Err(GatewayError::validation(format!(
                "decimals must be <= {MAX_DECIMALS}, got {decimals}"
            )));
        }
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GatewayError::validation(format!(
                "{field} must be a non-negative integer, got {raw:?}"
            )));
        }
        let out_of_range = || GatewayError::validation(format!("{field} is out of range: {raw}"));
        let amount = Self {
            raw: raw.parse::<u128>().map_err(|_| out_of_range())?,
            decimals,
        };
        // Every accepted amount must render as a decimal string.
        amount.to_decimal().map_err(|_| out_of_range())?;
        Ok(amount)
    }

    pub const fn is_zero(&self) -> bool {
        self.raw == 0
    }

    pub fn to_decimal(&self) -> Result<Decimal, GatewayError> {
        let raw = i128::try_from(self.raw)
            .map_err(|_| GatewayError::validation("amount exceeds representable range"))?;
        Decimal::try_from_i128_with_scale(raw, u32::from(self.decimals))
            .map_err(|_| GatewayError::validation("amount exceeds representable range"))
    }

    /// Decimal-shifted string with at least one fractional digit.
    ///
    /// `100000000` at 6 decimals renders as `"100.0"`, `1500000` as `"1.5"`.
    pub fn to_decimal_string(&self) -> Result<String, GatewayError> {
        Ok(format_decimal(self.to_decimal()?))
    }

    /// Re-express this amount in `target` decimals.
    ///
    /// Fails rather than truncating when precision would be lost.
    pub fn rescale(&self, target: u8) -> Result<u128, GatewayError> {
        if target >= self.decimals {
            let factor = pow10(target - self.decimals)?;
            self.raw
                .checked_mul(factor)
                .ok_or_else(|| GatewayError::validation("amount overflows token precision"))
        } else {
            let factor = pow10(self.decimals - target)?;
            if self.raw % factor != 0 {
                return Err(GatewayError::validation(format!(
                    "amount has more precision than the token's {target} decimals"
                )));
            }
            Ok(self.raw / factor)
        }
    }
}

fn pow10(exp: u8) -> Result<u128, GatewayError> {
    10u128
        .checked_pow(u32::from(exp))
        .ok_or_else(|| GatewayError::validation("decimals difference too large"))
}

/// Render a decimal the way the backend expects: normalized, never
/// without a fractional part.
pub fn format_decimal(value: Decimal) -> String {
    let normalized = value.normalize();
    if normalized.scale() == 0 {
        format!("{normalized}.0")
    } else {
        normalized.to_string()
    }
}
