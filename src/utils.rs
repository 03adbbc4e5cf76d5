use std::error::Error;

/// Boxed static error type
pub type Err = Box<dyn Error + 'static>;

/// Relative float comparison with the same default tolerance as a
/// probability-sum check needs: `|a - b| <= rel_tol * max(|a|, |b|)`.
///
/// ```
/// assert!(cykparse::utils::is_close(0.1 + 0.2, 0.3, 1e-9));
/// assert!(!cykparse::utils::is_close(0.99, 1.0, 1e-9));
/// ```
pub fn is_close(a: f64, b: f64, rel_tol: f64) -> bool {
  a == b || (a - b).abs() <= rel_tol * a.abs().max(b.abs())
}
