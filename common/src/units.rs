use alloy::primitives::{utils::format_units, U256};

/// Decimals assumed when neither the token list nor the chain reports them.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Converts a smallest-unit amount into a human readable decimal string,
/// without trailing fractional zeros (`1.500000` becomes `1.5`).
pub fn format_balance(amount: U256, decimals: u8) -> crate::Result<String> {
    let formatted =
        format_units(amount, decimals).map_err(|error| crate::Error::FormatUnitsFailed {
            amount,
            decimals,
            error,
        })?;

    if formatted.contains('.') {
        Ok(formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string())
    } else {
        Ok(formatted)
    }
}
