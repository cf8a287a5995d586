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

use super::scalar::{scratch, scratch_indices, PermanentScalar};
use super::shape_check;
use crate::error::Result;

/// Glynn's formula, single-threaded.
///
/// Row sums start at half the full column sum (delta all +1); the 2^(n-1)
/// sign patterns are walked with the loopless Gray generation of Knuth's
/// Algorithm L, so each step updates the row sums by a single column. The
/// final sum is doubled to undo the initial halving.
pub fn permanent_glynn<T: PermanentScalar>(a: &[T], n: usize) -> Result<T> {
    shape_check(a, n)?;
    if n == 1 {
        return Ok(a[0]);
    }

    let mut rowsum = scratch::<T>(n)?;
    for (i, sum) in rowsum.iter_mut().enumerate() {
        let base = i * n;
        let mut row_total = a[base];
        for k in 1..n {
            row_total += a[base + k];
        }
        *sum = row_total.halve();
    }
    let mut sum = T::product_of(&rowsum);

    let mut chi = vec![true; n];
    let mut focus = scratch_indices(n)?;
    for (i, f) in focus.iter_mut().enumerate() {
        *f = i;
    }

    let mut j = 0;
    while j < n - 1 {
        if chi[j] {
            for (i, sum) in rowsum.iter_mut().enumerate() {
                *sum -= a[i * n + j];
            }
            chi[j] = false;
        } else {
            for (i, sum) in rowsum.iter_mut().enumerate() {
                *sum += a[i * n + j];
            }
            chi[j] = true;
        }
        if j > 0 {
            sum += T::product_of(&rowsum);
            focus[j] = focus[j + 1];
            focus[j + 1] = j + 1;
            j = 0;
        } else {
            sum -= T::product_of(&rowsum);
            j = focus[1];
            focus[1] = 1;
        }
    }
    Ok(sum.double())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use num_complex::Complex64;

    /// Deterministic test matrix: entries 1/n^2, 2/n^2, ... in row-major
    /// order.
    pub(crate) fn ramp_matrix_f64(n: usize) -> Vec<f64> {
        let increment = 1.0 / (n * n) as f64;
        (1..=n * n).map(|i| i as f64 * increment).collect()
    }

    pub(crate) fn ramp_matrix_complex(n: usize) -> Vec<Complex64> {
        let increment = 1.0 / (n * n) as f64;
        (1..=n * n)
            .map(|i| Complex64::new(i as f64 * increment, i as f64 * increment / 2.0))
            .collect()
    }

    #[test]
    fn test_glynn_2x2() {
        let matrix = [1.0f64, 2.0, 3.0, 4.0];
        let result = permanent_glynn(&matrix, 2).unwrap();
        assert!((result - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_glynn_5x5_double() {
        let matrix = ramp_matrix_f64(5);
        let result = permanent_glynn(&matrix, 5).unwrap();
        assert!((result - 1.4828236800000005).abs() < 1e-12);
    }

    #[test]
    fn test_glynn_5x5_complex() {
        let matrix = ramp_matrix_complex(5);
        let result = permanent_glynn(&matrix, 5).unwrap();
        let expected = Complex64::new(-1.760853120000001, 1.8998678400000022);
        assert!((result - expected).norm() < 1e-12);
    }

    #[test]
    fn test_glynn_1x1() {
        assert_eq!(permanent_glynn(&[7.0f64], 1).unwrap(), 7.0);
    }

    #[test]
    fn test_glynn_bad_shape() {
        assert!(permanent_glynn(&[1.0f64, 2.0, 3.0], 2).is_err());
        assert!(permanent_glynn(&[] as &[f64], 0).is_err());
    }
}
