//! Common small functions used throughout the crate
//!
//! These are left public for the convenience of the user, such as the
//! fixed-width scientific formatting used by every simulator record.

use std::fmt::LowerExp;

// Alias for the format! macro out of laziness
pub use std::format as f;

/// Extends primitives with the fixed-width formats of the simulator deck
pub trait NumberFmt {
    /// Fixed-width scientific formatting
    ///
    /// The default Rust scientific format pads neither the mantissa nor the
    /// exponent, which the column-positional records cannot tolerate. This
    /// right-justifies into `width` columns with `precision` decimals and a
    /// signed two-digit exponent.
    ///
    /// ```rust
    /// # use toughprep::utils::NumberFmt;
    /// assert_eq!((0.1).sci(10, 4), "1.0000e-01");
    /// assert_eq!((-1.0).sci(10, 3), "-1.000e+00");
    /// assert_eq!((1.0e20).sci(10, 3), " 1.000e+20");
    /// ```
    fn sci(&self, width: usize, precision: usize) -> String;
}

impl<T: LowerExp> NumberFmt for T {
    fn sci(&self, width: usize, precision: usize) -> String {
        let mut num = f!("{:.precision$e}", &self, precision = precision);
        // Safe to `unwrap` as `num` is guaranteed to contain `'e'`
        let exp = num.split_off(num.find('e').unwrap());
        // Make sure the exponent is signed
        let (sign, exp) = match exp.strip_prefix("e-") {
            Some(exp) => ('-', exp),
            None => ('+', &exp[1..]),
        };
        // Pad the exponent with zeros if needed and put it back on the number
        num.push_str(&f!("e{}{:0>2}", sign, exp));
        f!("{num:>width$}")
    }
}

/// Find the maximum value of a `Vec<f64>`
///
/// Rust only has a built-in max method for types that implement Ord.
/// Floating-point types do not implement Ord because of NaN, so this is the
/// workaround.
///
/// ```rust
/// # use toughprep::utils::vec_f64_max;
/// let vector = vec![1.0, 2.0, 3.0];
/// assert_eq!(*vec_f64_max(&vector), 3.0)
/// ```
pub fn vec_f64_max(vector: &[f64]) -> &f64 {
    vector.iter().max_by(|a, b| a.total_cmp(b)).unwrap()
}

/// Find the minimum value of a `Vec<f64>`
///
/// Rust only has a built-in max method for types that implement Ord.
/// Floating-point types do not implement Ord because of NaN, so this is the
/// workaround.
///
/// ```rust
/// # use toughprep::utils::vec_f64_min;
/// let vector = vec![1.0, 2.0, 3.0];
/// assert_eq!(*vec_f64_min(&vector), 1.0)
/// ```
pub fn vec_f64_min(vector: &[f64]) -> &f64 {
    vector.iter().min_by(|a, b| a.total_cmp(b)).unwrap()
}
