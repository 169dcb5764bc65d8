use crate::api::RateFetcher;
use crate::error::{RateError, RateResult};
use crate::models::Conversion;

pub const DEFAULT_BASE: &str = "USD";

/// Converts `amount` of `from` into `to` using the latest rates for `from`.
pub async fn convert(
    fetcher: &RateFetcher,
    amount: f64,
    from: &str,
    to: &str,
) -> RateResult<Conversion> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(RateError::InvalidAmount(amount));
    }

    let rates = fetcher.fetch_rates(from).await?;
    let rate = match rates.rate(to) {
        Some(rate) if rate > 0.0 => rate,
        _ => return Err(RateError::NoRate(to.to_string())),
    };

    Ok(Conversion {
        amount,
        from: from.to_string(),
        to: to.to_string(),
        rate,
        converted: amount * rate,
    })
}

/// Sorted currency codes available for `base`.
pub async fn currency_codes(fetcher: &RateFetcher, base: &str) -> RateResult<Vec<String>> {
    let rates = fetcher.fetch_rates(base).await?;
    let mut codes: Vec<String> = rates.rates.into_keys().collect();
    codes.sort();
    Ok(codes)
}

pub fn format_amount(amount: f64, code: &str) -> String {
    format!("{:.2} {}", amount, code)
}
