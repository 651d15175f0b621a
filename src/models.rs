//! Calling contract for capillary pressure models
//!
//! The deck's ROCKS block carries capillarity sub-records as a model id
//! plus a short parameter list, and the simulator evaluates the actual
//! formula internally. This module pins down the calling contract those
//! records satisfy, with one reference implementation; further formulas
//! are deliberately out of scope and plug in through the same trait.

// external crates
use anyhow::{bail, Result};
use serde_json::{json, Value};

/// A capillary pressure function of liquid saturation
///
/// Implementations pair the simulator's numeric model id with the ordered
/// parameter list its record carries, and evaluate capillary pressure for
/// a liquid saturation in `[0, 1]`.
pub trait Capillarity {
    /// Numeric id of the model in the simulator's catalogue
    fn id(&self) -> i64;

    /// Ordered parameters exactly as the deck record carries them
    fn parameters(&self) -> Vec<f64>;

    /// Capillary pressure at liquid saturation `sl`
    fn evaluate(&self, sl: f64) -> f64;

    /// The `capillarity` sub-dictionary for a rock entry
    fn record(&self) -> Value {
        json!({ "id": self.id(), "parameters": self.parameters() })
    }
}

/// Pickens et al. (1979) capillary pressure function
#[derive(Debug, Clone, PartialEq)]
pub struct Pickens {
    /// Capillary pressure strength
    p0: f64,
    /// Irreducible liquid saturation
    slr: f64,
    /// Initial liquid saturation
    sl0: f64,
    /// Curve shape exponent
    x: f64,
}

impl Pickens {
    /// Build the model, rejecting parameters outside its domain
    pub fn new(p0: f64, slr: f64, sl0: f64, x: f64) -> Result<Self> {
        if !(0.0 < slr && slr < 1.0) {
            bail!("Irreducible saturation must lie in (0, 1), got {slr}");
        }
        if sl0 < 1.0 {
            bail!("Initial saturation must be at least 1, got {sl0}");
        }
        if x == 0.0 {
            bail!("Shape exponent must be non-zero");
        }
        Ok(Self { p0, slr, sl0, x })
    }
}

impl Capillarity for Pickens {
    fn id(&self) -> i64 {
        2
    }

    fn parameters(&self) -> Vec<f64> {
        vec![self.p0, self.slr, self.sl0, self.x]
    }

    fn evaluate(&self, sl: f64) -> f64 {
        // keep the saturation strictly inside the function's domain
        let sl = sl.max(1.001 * self.slr);
        let sl = if sl > 0.999 * self.sl0 {
            0.999 * self.sl0
        } else {
            sl
        };

        let a = (1.0 + sl / self.sl0) * (self.sl0 - self.slr) / (self.sl0 + self.slr);
        let b = 1.0 - sl / self.sl0;
        -self.p0
            * (a / b * (1.0 + (1.0 - b.powi(2) / a.powi(2)).sqrt()))
                .ln()
                .powf(1.0 / self.x)
    }
}

impl std::fmt::Display for Pickens {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Pickens{:?}", (self.p0, self.slr, self.sl0, self.x))
    }
}
