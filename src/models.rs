use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Exchange rates for one base currency, as returned by the rates API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub result: String,
    #[serde(default)]
    pub rates: HashMap<String, f64>,
    #[serde(rename = "error-type", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_last_update_unix: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_next_update_unix: Option<i64>,
}

impl RateSnapshot {
    pub fn success(rates: HashMap<String, f64>) -> Self {
        Self {
            result: "success".to_string(),
            rates,
            error_type: None,
            base_code: None,
            time_last_update_unix: None,
            time_next_update_unix: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == "success"
    }

    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Returns the first code whose rate is negative or not finite.
    pub fn invalid_rate(&self) -> Option<&str> {
        self.rates
            .iter()
            .find(|(_, rate)| !rate.is_finite() || **rate < 0.0)
            .map(|(code, _)| code.as_str())
    }
}

/// One cached snapshot, stamped with the epoch milliseconds it was stored at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub ts: i64,
    pub data: RateSnapshot,
}

/// The persisted blob. Entries stay raw JSON until looked up so a single
/// malformed entry does not poison the rest.
pub type CacheBlob = BTreeMap<String, serde_json::Value>;

/// Outcome of converting an amount between two currencies.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub amount: f64,
    pub from: String,
    pub to: String,
    pub rate: f64,
    pub converted: f64,
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {}",
            crate::convert::format_amount(self.amount, &self.from),
            crate::convert::format_amount(self.converted, &self.to)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_api_error_body() {
        let snapshot: RateSnapshot =
            serde_json::from_str(r#"{"result":"error","error-type":"invalid-base"}"#).unwrap();

        assert!(!snapshot.is_success());
        assert!(snapshot.rates.is_empty());
        assert_eq!(snapshot.error_type.as_deref(), Some("invalid-base"));
    }

    #[test]
    fn test_deserialize_success_body_keeps_metadata() {
        let body = r#"{
            "result": "success",
            "base_code": "USD",
            "time_last_update_unix": 1700000000,
            "time_next_update_unix": 1700086400,
            "rates": {"USD": 1, "EUR": 0.92, "JPY": 149.5}
        }"#;
        let snapshot: RateSnapshot = serde_json::from_str(body).unwrap();

        assert!(snapshot.is_success());
        assert_eq!(snapshot.base_code.as_deref(), Some("USD"));
        assert_eq!(snapshot.rate("EUR"), Some(0.92));
        assert_eq!(snapshot.rate("GBP"), None);
        assert!(snapshot.invalid_rate().is_none());
    }

    #[test]
    fn test_invalid_rate_detects_negative() {
        let mut rates = HashMap::new();
        rates.insert("EUR".to_string(), 0.92);
        rates.insert("BAD".to_string(), -1.0);

        assert_eq!(RateSnapshot::success(rates).invalid_rate(), Some("BAD"));
    }

    #[test]
    fn test_conversion_display() {
        let conversion = Conversion {
            amount: 100.0,
            from: "USD".to_string(),
            to: "EUR".to_string(),
            rate: 0.92,
            converted: 92.0,
        };

        assert_eq!(conversion.to_string(), "100.00 USD = 92.00 EUR");
    }
}
