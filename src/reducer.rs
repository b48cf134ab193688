//! Reduces raw provider output into a display-ready snapshot
//!
//! Only the price is mandatory. Every other field degrades to a placeholder
//! when absent, and to a placeholder plus a [`MalformedField`] when present
//! but unusable.

use crate::{
    constants::{
        DEFAULT_FLUCTUATION, MARKET_CAP_DIVISOR, NOT_AVAILABLE, PLACEHOLDER_CIRCULATING_SUPPLY,
        PLACEHOLDER_MARKET_CAP, SUPPLY_DIVISOR,
    },
    error::{MalformedField, ReductionError},
    math::{parse_non_negative, parse_percentage, round, safe_op, Numeric, SafeOp},
    types::{LooseNumber, PriceSnapshot, RawMarketData, SnapshotOrigin, TradingPair},
};
use chrono::{DateTime, Utc};

/// A reduced snapshot together with the optional fields that had to be dropped
#[derive(Debug, Clone, PartialEq)]
pub struct Reduced {
    pub snapshot: PriceSnapshot,
    pub malformed: Vec<MalformedField>,
}

/// Reduces `raw` into a live snapshot stamped with `now`
pub fn reduce(
    raw: &RawMarketData,
    pair: &TradingPair,
    now: DateTime<Utc>,
) -> Result<PriceSnapshot, ReductionError> {
    reduce_detailed(raw, pair, now).map(|reduced| reduced.snapshot)
}

/// Like [`reduce`], but also reports malformed optional fields
pub fn reduce_detailed(
    raw: &RawMarketData,
    pair: &TradingPair,
    now: DateTime<Utc>,
) -> Result<Reduced, ReductionError> {
    let price = raw
        .average_price
        .as_ref()
        .and_then(|p| parse_non_negative(p, "averagePrice"))
        .ok_or_else(|| {
            ReductionError::missing_price(raw.average_price.as_ref().map(ToString::to_string))
        })?;

    let mut malformed = Vec::new();
    let supply = supply(raw.circulating_supply.as_ref(), &mut malformed);

    let market_cap_usd = match supply {
        Some(supply) if price > 0.0 => format_market_cap(price, supply),
        _ => PLACEHOLDER_MARKET_CAP.to_string(),
    };

    let circulating_supply = match supply {
        Some(supply) => format!(
            "{:.2}B {}",
            safe_op(SafeOp::Div, supply, SUPPLY_DIVISOR, 0.0),
            pair.base
        ),
        None => PLACEHOLDER_CIRCULATING_SUPPLY.to_string(),
    };

    let volume_24h = match present(raw.total_volume_usdt.as_ref()) {
        Some(volume) => format!("${}", volume),
        None => NOT_AVAILABLE.to_string(),
    };

    let (fluctuation_percent, fluctuation) =
        fluctuation(raw.average_fluctuation.as_ref(), &mut malformed);

    for field in &malformed {
        tracing::warn!(
            pair = %pair,
            field = field.field,
            value = %field.value,
            "Dropping malformed market data field"
        );
    }

    Ok(Reduced {
        snapshot: PriceSnapshot {
            price,
            volume_24h,
            circulating_supply,
            market_cap_usd,
            fluctuation_percent,
            fluctuation,
            captured_at: now,
            origin: SnapshotOrigin::Live,
            fallback_version: None,
        },
        malformed,
    })
}

/// Treats blank text the same as an absent field
fn present(value: Option<&LooseNumber>) -> Option<&LooseNumber> {
    value.filter(|v| !v.is_blank())
}

/// Usable circulating supply; zero counts as unknown
fn supply(value: Option<&LooseNumber>, malformed: &mut Vec<MalformedField>) -> Option<f64> {
    let value = present(value)?;
    match value.to_finite() {
        Some(supply) if supply > 0.0 => Some(supply),
        Some(supply) if supply == 0.0 => None,
        _ => {
            malformed.push(MalformedField {
                field: "circulatingSupply",
                value: value.to_string(),
            });
            None
        }
    }
}

fn format_market_cap(price: f64, supply: f64) -> String {
    let cap = safe_op(SafeOp::Mul, price, supply, 0.0);
    let millions = safe_op(SafeOp::Div, cap, MARKET_CAP_DIVISOR, 0.0);
    format!("${:.2}M", round(millions, 2, 0.0))
}

fn fluctuation(
    value: Option<&LooseNumber>,
    malformed: &mut Vec<MalformedField>,
) -> (f64, String) {
    let default = || (0.0, format!("{}%", DEFAULT_FLUCTUATION));

    let Some(value) = present(value) else {
        return default();
    };

    if value.to_finite().is_none() {
        malformed.push(MalformedField {
            field: "averageFluctuation",
            value: value.to_string(),
        });
        return default();
    }

    let text = value.to_string();
    let text = text.strip_suffix('%').unwrap_or(&text).trim_end();
    (parse_percentage(value, 0.0), format!("{}%", text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> TradingPair {
        TradingPair::new("CIRX", "USDT")
    }

    fn sample() -> RawMarketData {
        RawMarketData {
            average_price: Some("0.0044".into()),
            total_volume_usdt: Some("35552".into()),
            circulating_supply: Some(LooseNumber::Number(3_380_000_000.0)),
            average_fluctuation: Some("1.390".into()),
            total_volume_base: None,
        }
    }

    #[test]
    fn test_full_response() {
        let now = Utc::now();
        let snapshot = reduce(&sample(), &pair(), now).unwrap();

        assert_eq!(snapshot.origin, SnapshotOrigin::Live);
        assert_eq!(snapshot.price, 0.0044);
        assert_eq!(snapshot.formatted_price(), "0.004400");
        assert_eq!(snapshot.market_cap_usd, "$14.87M");
        assert_eq!(snapshot.circulating_supply, "3.38B CIRX");
        assert_eq!(snapshot.volume_24h, "$35552");
        assert_eq!(snapshot.fluctuation, "1.390%");
        assert_eq!(snapshot.fluctuation_percent, 1.39);
        assert_eq!(snapshot.captured_at, now);
        assert_eq!(snapshot.fallback_version, None);
    }

    #[test]
    fn test_missing_price_is_fatal() {
        let mut raw = sample();
        raw.average_price = None;
        assert_eq!(
            reduce(&raw, &pair(), Utc::now()),
            Err(ReductionError::MissingPrice { raw: None })
        );

        raw.average_price = Some("abc".into());
        assert_eq!(
            reduce(&raw, &pair(), Utc::now()),
            Err(ReductionError::MissingPrice {
                raw: Some("abc".to_string())
            })
        );

        raw.average_price = Some(LooseNumber::Number(-1.0));
        assert!(reduce(&raw, &pair(), Utc::now()).is_err());
    }

    #[test]
    fn test_partial_response_degrades() {
        let raw = RawMarketData {
            average_price: Some(LooseNumber::Number(0.005)),
            ..Default::default()
        };
        let snapshot = reduce(&raw, &pair(), Utc::now()).unwrap();

        assert_eq!(snapshot.formatted_price(), "0.005000");
        assert_eq!(snapshot.volume_24h, "N/A");
        assert_eq!(snapshot.circulating_supply, "3.38B CIRX");
        assert_eq!(snapshot.market_cap_usd, "$14.8M");
        assert_eq!(snapshot.fluctuation, "0.00%");
        assert_eq!(snapshot.fluctuation_percent, 0.0);
    }

    #[test]
    fn test_zero_supply_uses_placeholders() {
        let mut raw = sample();
        raw.circulating_supply = Some(LooseNumber::Number(0.0));
        let reduced = reduce_detailed(&raw, &pair(), Utc::now()).unwrap();

        assert_eq!(reduced.snapshot.market_cap_usd, "$14.8M");
        assert_eq!(reduced.snapshot.circulating_supply, "3.38B CIRX");
        assert!(reduced.malformed.is_empty());
    }

    #[test]
    fn test_zero_price_keeps_placeholder_market_cap() {
        let mut raw = sample();
        raw.average_price = Some("0".into());
        let snapshot = reduce(&raw, &pair(), Utc::now()).unwrap();

        assert_eq!(snapshot.price, 0.0);
        assert_eq!(snapshot.market_cap_usd, "$14.8M");
    }

    #[test]
    fn test_malformed_fields_are_reported_not_fatal() {
        let mut raw = sample();
        raw.circulating_supply = Some("plenty".into());
        raw.average_fluctuation = Some("up".into());
        let reduced = reduce_detailed(&raw, &pair(), Utc::now()).unwrap();

        assert_eq!(reduced.snapshot.circulating_supply, "3.38B CIRX");
        assert_eq!(reduced.snapshot.fluctuation, "0.00%");
        let fields: Vec<_> = reduced.malformed.iter().map(|m| m.field).collect();
        assert_eq!(fields, vec!["circulatingSupply", "averageFluctuation"]);
    }

    #[test]
    fn test_blank_volume_is_not_available() {
        let mut raw = sample();
        raw.total_volume_usdt = Some("  ".into());
        let snapshot = reduce(&raw, &pair(), Utc::now()).unwrap();
        assert_eq!(snapshot.volume_24h, "N/A");
    }

    #[test]
    fn test_supply_unit_follows_pair() {
        let snapshot = reduce(&sample(), &TradingPair::new("ABC", "USDT"), Utc::now()).unwrap();
        assert_eq!(snapshot.circulating_supply, "3.38B ABC");
    }

    #[test]
    fn test_negative_fluctuation() {
        let mut raw = sample();
        raw.average_fluctuation = Some(LooseNumber::Number(-2.5));
        let snapshot = reduce(&raw, &pair(), Utc::now()).unwrap();
        assert_eq!(snapshot.fluctuation, "-2.5%");
        assert_eq!(snapshot.fluctuation_percent, -2.5);
    }
}
