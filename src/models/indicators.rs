//! Technical indicator arithmetic over daily closes
//!
//! Every function takes slices ordered oldest first and returns one value per
//! input element. `None` means "no value": either the trailing window is not
//! full yet, or the arithmetic produced a non-finite number.
//!
//! # Conventions
//! - Moving averages are simple arithmetic means of the trailing N values.
//! - Standard deviations are sample (n - 1) deviations.
//! - Exponential averages are seeded with the first value and carry no bias
//!   adjustment: `ema = alpha * x + (1 - alpha) * ema_prev`.

/// Seed value for K and D on the first bar
pub const STOCHASTIC_SEED: f64 = 50.0;

/// RSV used when the rolling high equals the rolling low
pub const RSV_DEGENERATE: f64 = 50.0;

/// Normalize a value to "no value" when it is NaN or infinite
pub fn finite(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// Calculate Simple Moving Average for a given period
///
/// # Returns
/// * One entry per close; the first `period - 1` entries are `None`
pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut ma_values = vec![None; closes.len()];

    if period == 0 || closes.len() < period {
        return ma_values;
    }

    let mut window_sum: f64 = closes[..period].iter().sum();
    ma_values[period - 1] = finite(window_sum / period as f64);

    for i in period..closes.len() {
        window_sum += closes[i] - closes[i - period];
        ma_values[i] = finite(window_sum / period as f64);
    }

    ma_values
}

/// Rolling sample standard deviation over `period` values
pub fn calculate_rolling_std(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut std_values = vec![None; values.len()];

    if period < 2 || values.len() < period {
        return std_values;
    }

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
        std_values[i] = finite(variance.sqrt());
    }

    std_values
}

/// Bollinger bands as (mid, upper, lower) per element
pub fn calculate_bollinger(
    closes: &[f64],
    period: usize,
    width: f64,
) -> Vec<(Option<f64>, Option<f64>, Option<f64>)> {
    let mids = calculate_sma(closes, period);
    let stds = calculate_rolling_std(closes, period);

    mids.into_iter()
        .zip(stds)
        .map(|(mid, std)| match (mid, std) {
            (Some(m), Some(s)) => (Some(m), finite(m + width * s), finite(m - width * s)),
            (mid, _) => (mid, None, None),
        })
        .collect()
}

/// Exponential moving average with smoothing factor `alpha`, seeded with the
/// first value
pub fn calculate_ema_alpha(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut ema = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for &value in values {
        let next = match prev {
            Some(p) => alpha * value + (1.0 - alpha) * p,
            None => value,
        };
        ema.push(next);
        prev = Some(next);
    }

    ema
}

/// Exponential moving average by span: alpha = 2 / (span + 1)
pub fn calculate_ema(values: &[f64], span: usize) -> Vec<f64> {
    calculate_ema_alpha(values, 2.0 / (span as f64 + 1.0))
}

/// Raw stochastic value per bar over a `period`-bar high/low window
///
/// The first bars use however many bars are available. When the window's high
/// equals its low the RSV is exactly 50.
pub fn calculate_rsv(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<f64> {
    let len = closes.len().min(highs.len()).min(lows.len());
    let period = period.max(1);

    (0..len)
        .map(|i| {
            let start = (i + 1).saturating_sub(period);
            let high = highs[start..=i].iter().copied().fold(f64::MIN, f64::max);
            let low = lows[start..=i].iter().copied().fold(f64::MAX, f64::min);
            let range = high - low;

            if range == 0.0 {
                return RSV_DEGENERATE;
            }

            let rsv = 100.0 * (closes[i] - low) / range;
            if rsv.is_finite() {
                rsv
            } else {
                RSV_DEGENERATE
            }
        })
        .collect()
}

/// K/D recurrence over an RSV sequence
///
/// K and D are 50 on the first element. After that
/// `k = 2/3 * k_prev + 1/3 * rsv` and `d = 2/3 * d_prev + 1/3 * k`.
/// State carries forward, so the sequence must be in date order.
pub fn stochastic_recurrence(rsv: &[f64]) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(rsv.len());

    rsv.iter().enumerate().fold(
        (STOCHASTIC_SEED, STOCHASTIC_SEED),
        |(k_prev, d_prev), (i, &value)| {
            let (k, d) = if i == 0 {
                (STOCHASTIC_SEED, STOCHASTIC_SEED)
            } else {
                let k = (2.0 / 3.0) * k_prev + (1.0 / 3.0) * value;
                let d = (2.0 / 3.0) * d_prev + (1.0 / 3.0) * k;
                (k, d)
            };
            out.push((k, d));
            (k, d)
        },
    );

    out
}

/// Stochastic oscillator as (K, D, J) per bar; J = 3K - 2D, unclamped
///
/// The first `period - 1` bars take their RSV from the bars available so far
/// rather than a full window. K and D carry that start forward, so values over
/// roughly the first 50 bars differ from a series seeded after a full window.
pub fn calculate_kdj(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
) -> Vec<(Option<f64>, Option<f64>, Option<f64>)> {
    let rsv = calculate_rsv(highs, lows, closes, period);

    stochastic_recurrence(&rsv)
        .into_iter()
        .map(|(k, d)| (finite(k), finite(d), finite(3.0 * k - 2.0 * d)))
        .collect()
}

/// MACD as (DIF, DEA, histogram) per bar
///
/// DIF = EMA(fast) - EMA(slow), DEA = EMA(signal) of DIF,
/// histogram = 2 * (DIF - DEA).
pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> Vec<(Option<f64>, Option<f64>, Option<f64>)> {
    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);
    let dif: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let dea = calculate_ema(&dif, signal);

    dif.iter()
        .zip(&dea)
        .map(|(&dif, &dea)| (finite(dif), finite(dea), finite(2.0 * (dif - dea))))
        .collect()
}

/// Relative strength index smoothed with a center-of-mass exponential average
///
/// alpha = 1 / (1 + com). The first bar has no delta and therefore no RSI.
/// When the smoothed loss is zero the RSI is `None`.
pub fn calculate_rsi(closes: &[f64], com: f64) -> Vec<Option<f64>> {
    let mut rsi_values = vec![None; closes.len()];

    if closes.len() < 2 {
        return rsi_values;
    }

    let alpha = 1.0 / (1.0 + com);
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let gains: Vec<f64> = deltas.iter().map(|d| d.max(0.0)).collect();
    let losses: Vec<f64> = deltas.iter().map(|d| (-d).max(0.0)).collect();

    let avg_gain = calculate_ema_alpha(&gains, alpha);
    let avg_loss = calculate_ema_alpha(&losses, alpha);

    for (i, (gain, loss)) in avg_gain.iter().zip(&avg_loss).enumerate() {
        if *loss == 0.0 {
            continue;
        }
        let rs = gain / loss;
        rsi_values[i + 1] = finite(100.0 - 100.0 / (1.0 + rs));
    }

    rsi_values
}
