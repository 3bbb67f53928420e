pub mod ma;
pub mod rsi;

use error_stack::{Report, bail};

use crate::error::IndicatorError;

pub use ma::{ema, sma};
pub use rsi::{DEFAULT_RSI_PERIOD, NEUTRAL_RSI, rsi};

/// Reject a zero-length lookback window.
///
/// All indicators take samples in ascending chronological order (oldest first).
fn check_period(period: usize) -> Result<(), Report<IndicatorError>> {
    if period == 0 {
        bail!(IndicatorError::InvalidParameter {
            name: "period must be > 0".into(),
        });
    }
    Ok(())
}
