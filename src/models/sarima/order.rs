//! SARIMA order specification.

use serde::Serialize;
use std::fmt;

/// Orders of a SARIMA(p, d, q)(P, D, Q)\[s\] model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SarimaOrder {
    /// Non-seasonal AR order (p)
    pub p: usize,
    /// Non-seasonal differencing (d)
    pub d: usize,
    /// Non-seasonal MA order (q)
    pub q: usize,
    /// Seasonal AR order (P)
    pub seasonal_p: usize,
    /// Seasonal differencing (D)
    pub seasonal_d: usize,
    /// Seasonal MA order (Q)
    pub seasonal_q: usize,
    /// Season length (s)
    pub period: usize,
}

impl SarimaOrder {
    /// SARIMA(1,1,1)(1,1,1)\[12\]: monthly data with an annual cycle, one regular
    /// and one seasonal difference.
    pub const MONTHLY: SarimaOrder = SarimaOrder {
        p: 1,
        d: 1,
        q: 1,
        seasonal_p: 1,
        seasonal_d: 1,
        seasonal_q: 1,
        period: 12,
    };

    pub fn new(
        (p, d, q): (usize, usize, usize),
        (seasonal_p, seasonal_d, seasonal_q, period): (usize, usize, usize, usize),
    ) -> Self {
        Self {
            p,
            d,
            q,
            seasonal_p,
            seasonal_d,
            seasonal_q,
            period,
        }
    }

    /// Whether the seasonal part contributes anything.
    pub fn is_seasonal(&self) -> bool {
        self.period > 1 && (self.seasonal_p + self.seasonal_d + self.seasonal_q) > 0
    }

    /// Effective season length (1 when there is no seasonal part).
    pub(crate) fn season(&self) -> usize {
        if self.is_seasonal() {
            self.period
        } else {
            1
        }
    }

    /// Number of estimated ARMA coefficients.
    pub fn num_coefficients(&self) -> usize {
        if self.is_seasonal() {
            self.p + self.q + self.seasonal_p + self.seasonal_q
        } else {
            self.p + self.q
        }
    }

    /// Observations consumed by differencing: `d + D * s`.
    pub fn differencing_span(&self) -> usize {
        if self.is_seasonal() {
            self.d + self.seasonal_d * self.period
        } else {
            self.d
        }
    }
}

impl Default for SarimaOrder {
    fn default() -> Self {
        Self::MONTHLY
    }
}

impl fmt::Display for SarimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SARIMA({},{},{})({},{},{})[{}]",
            self.p, self.d, self.q, self.seasonal_p, self.seasonal_d, self.seasonal_q, self.period
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_order_is_default() {
        let order = SarimaOrder::default();
        assert_eq!(order, SarimaOrder::MONTHLY);
        assert_eq!(order.to_string(), "SARIMA(1,1,1)(1,1,1)[12]");
        assert!(order.is_seasonal());
        assert_eq!(order.num_coefficients(), 4);
        assert_eq!(order.differencing_span(), 13);
    }

    #[test]
    fn non_seasonal_order_ignores_period() {
        let order = SarimaOrder::new((2, 1, 0), (0, 0, 0, 12));
        assert!(!order.is_seasonal());
        assert_eq!(order.season(), 1);
        assert_eq!(order.num_coefficients(), 2);
        assert_eq!(order.differencing_span(), 1);
    }
}
