/* The MIT License (MIT)
* Copyright (c) 2024 Nathan Hoos
*
* Permission is hereby granted, free of charge, to any person obtaining a copy
* of this software and associated documentation files (the "Software"), to deal
* in the Software without restriction, including without limitation the rights
* to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
* copies of the Software, and to permit persons to whom the Software is
* furnished to do so, subject to the following conditions:
*
* The above copyright notice and this permission notice shall be included in
* all copies or substantial portions of the Software.
*
* THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
* IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
* FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
* AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
* LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
* OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
* THE SOFTWARE.
*/

mod glynn;
mod ryser;
mod scalar;
mod sub;

pub use glynn::permanent_glynn;
pub use ryser::permanent_ryser;
pub use scalar::PermanentScalar;
pub use sub::sub_permanents;

use crate::environment::resolve_nthreads;
use crate::error::{Error, Result};

pub(crate) fn shape_check<T>(a: &[T], n: usize) -> Result<()> {
    if n == 0 || a.len() != n * n {
        return Err(Error::InvalidArgument(
            "input must be a non-empty n x n row-major matrix".to_string(),
        ));
    }
    Ok(())
}

/// Algorithm selection for [`permanent`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PermanentStrategy {
    /// Glynn when 1 or 2 threads are requested (it is naturally
    /// single-threaded), parallel Ryser otherwise.
    #[default]
    Auto,
    Glynn,
    Ryser,
}

/// Permanent of a flat row-major n x n matrix.
///
/// `nthreads` only matters for the Ryser path; 0 means the platform's
/// hardware concurrency (overridable through `FOCKSPACE_NUM_THREADS`).
/// Glynn is rejected for integer scalars, the algorithm divides by 2.
pub fn permanent<T: PermanentScalar>(
    a: &[T],
    n: usize,
    nthreads: usize,
    strategy: PermanentStrategy,
) -> Result<T> {
    shape_check(a, n)?;

    if strategy == PermanentStrategy::Glynn
        || (strategy == PermanentStrategy::Auto && (nthreads == 1 || nthreads == 2))
    {
        if !T::SUPPORTS_GLYNN {
            return Err(Error::InvalidArgument(
                "cannot use glynn for int".to_string(),
            ));
        }
        return permanent_glynn(a, n);
    }

    permanent_ryser(a, n, resolve_nthreads(nthreads))
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_dispatch_2x2() {
        let matrix = [1.0f64, 2.0, 3.0, 4.0];
        for (nthreads, strategy) in [
            (1, PermanentStrategy::Auto),
            (2, PermanentStrategy::Auto),
            (4, PermanentStrategy::Auto),
            (0, PermanentStrategy::Auto),
            (1, PermanentStrategy::Glynn),
            (4, PermanentStrategy::Ryser),
        ] {
            let result = permanent(&matrix, 2, nthreads, strategy).unwrap();
            assert!((result - 10.0).abs() < 1e-12, "{:?}", strategy);
        }
    }

    #[test]
    fn test_integer_dispatch() {
        let matrix = [1i64, 2, 3, 4];
        // auto with 1 thread would pick glynn, which integers cannot use
        assert!(permanent(&matrix, 2, 1, PermanentStrategy::Auto).is_err());
        assert!(permanent(&matrix, 2, 1, PermanentStrategy::Glynn).is_err());
        assert_eq!(
            permanent(&matrix, 2, 4, PermanentStrategy::Ryser).unwrap(),
            10
        );
        assert_eq!(
            permanent(&matrix, 2, 4, PermanentStrategy::Auto).unwrap(),
            10
        );
    }

    #[test]
    fn test_shape_validation() {
        assert!(permanent(&[1.0f64; 5], 2, 1, PermanentStrategy::Auto).is_err());
        assert!(permanent(&[] as &[f64], 0, 1, PermanentStrategy::Auto).is_err());
    }

    #[test]
    fn test_complex_dispatch_consistency() {
        let matrix: Vec<Complex64> = (1..=16)
            .map(|i| Complex64::new(i as f64 * 0.1, (16 - i) as f64 * 0.05))
            .collect();
        let glynn = permanent(&matrix, 4, 1, PermanentStrategy::Auto).unwrap();
        let ryser = permanent(&matrix, 4, 4, PermanentStrategy::Auto).unwrap();
        assert!((glynn - ryser).norm() <= glynn.norm() * 1e-10);
    }
}
