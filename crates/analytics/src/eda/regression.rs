use crate::error::AnalyticsError;
use nalgebra::{DMatrix, DVector};

/// Ordinary least squares fit of `y` on the columns of `x`.
pub(crate) struct OlsFit {
    pub params: DVector<f64>,
    pub std_errors: DVector<f64>,
    pub residuals: DVector<f64>,
    /// Sum of squared residuals.
    pub ssr: f64,
}

impl OlsFit {
    pub fn t_value(&self, i: usize) -> f64 {
        self.params[i] / self.std_errors[i]
    }

    /// Gaussian log-likelihood, as used for information criteria.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.residuals.len() as f64;
        -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.params.len() as f64
    }
}

pub(crate) fn ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<OlsFit, AnalyticsError> {
    let (n, k) = x.shape();
    if n <= k {
        return Err(AnalyticsError::InsufficientData(format!(
            "{n} observations for a regression with {k} parameters"
        )));
    }

    let xt = x.transpose();
    let xtx_inv = (&xt * x)
        .try_inverse()
        .ok_or_else(|| AnalyticsError::Calculation("singular design matrix".to_string()))?;
    let params = &xtx_inv * (&xt * y);
    let residuals = y - x * &params;
    let ssr = residuals.dot(&residuals);

    let sigma2 = ssr / (n - k) as f64;
    let std_errors = DVector::from_iterator(k, (0..k).map(|i| (sigma2 * xtx_inv[(i, i)]).sqrt()));

    Ok(OlsFit {
        params,
        std_errors,
        residuals,
        ssr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_an_exact_line() {
        let x = DMatrix::from_fn(5, 2, |r, c| if c == 0 { 1.0 } else { r as f64 });
        let y = DVector::from_iterator(5, (0..5).map(|r| 3.0 + 2.0 * r as f64));
        let fit = ols(&x, &y).unwrap();
        assert!((fit.params[0] - 3.0).abs() < 1e-9);
        assert!((fit.params[1] - 2.0).abs() < 1e-9);
        assert!(fit.ssr < 1e-12);
    }

    #[test]
    fn rejects_underdetermined_systems() {
        let x = DMatrix::from_element(2, 2, 1.0);
        let y = DVector::from_element(2, 1.0);
        assert!(matches!(ols(&x, &y), Err(AnalyticsError::InsufficientData(_))));
    }
}
