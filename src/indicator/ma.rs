use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::check_period;

/// Simple Moving Average of the trailing `period` samples.
///
/// Only the most recent window is computed; this is not a sliding series.
pub fn sma(prices: &[f64], period: usize) -> Result<f64, Report<IndicatorError>> {
    check_period(period)?;
    if prices.len() < period {
        bail!(IndicatorError::InsufficientData {
            required: period,
            available: prices.len(),
        });
    }
    let window = &prices[prices.len() - period..];
    Ok(window.iter().sum::<f64>() / period as f64)
}

/// Exponential Moving Average series, one value per input sample.
///
/// Seeded with the first price, so short input still yields a well-formed
/// series. `period == 0` degenerates to `k = 2`; callers pick the period.
pub fn ema(prices: &[f64], period: usize) -> Vec<f64> {
    let Some(&seed) = prices.first() else {
        return Vec::new();
    };

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = seed;
    prices
        .iter()
        .map(|&price| {
            ema = price * k + ema * (1.0 - k);
            ema
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_period_zero_invalid() {
        assert!(sma(&[1.0, 2.0], 0).is_err());
    }

    #[test]
    fn sma_insufficient_data() {
        let err = sma(&[1.0; 4], 5).unwrap_err();
        assert!(matches!(
            err.current_context(),
            IndicatorError::InsufficientData {
                required: 5,
                available: 4
            }
        ));
    }

    #[test]
    fn sma_uses_trailing_window() {
        // (3+4+5)/3
        let value = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert!((value - 4.0).abs() < 1e-9);
    }

    #[test]
    fn sma_exact_length_is_full_mean() {
        let value = sma(&[2.0, 4.0, 6.0], 3).unwrap();
        assert!((value - 4.0).abs() < 1e-9);
    }

    #[test]
    fn sma_flat_prices() {
        let value = sma(&[10.0; 30], 21).unwrap();
        assert!((value - 10.0).abs() < 1e-9);
    }

    #[test]
    fn ema_matches_input_length() {
        let prices = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(ema(&prices, 3).len(), prices.len());
        assert_eq!(ema(&prices, 21).len(), prices.len());
    }

    #[test]
    fn ema_first_value_is_first_price() {
        let values = ema(&[7.5, 9.0, 3.0], 14);
        assert_eq!(values[0], 7.5);
    }

    #[test]
    fn ema_empty_input() {
        assert!(ema(&[], 7).is_empty());
    }

    #[test]
    fn ema_known_values() {
        // k = 2/(3+1) = 0.5
        let values = ema(&[2.0, 4.0, 8.0], 3);
        assert!((values[1] - 3.0).abs() < 1e-9);
        assert!((values[2] - 5.5).abs() < 1e-9);
    }

    #[test]
    fn ema_flat_prices() {
        for v in ema(&[10.0; 6], 3) {
            assert!((v - 10.0).abs() < 1e-9);
        }
    }
}
