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
use crate::error::{Error, Result};

/// All n+1 permanents of the n x n minors of an (n+1) x n matrix, one per
/// deleted row (Clifford & Clifford 2017, lemma 2).
///
/// Runs the same Glynn Gray walk as the plain permanent, but keeps a running
/// prefix product `q[i] = ∏_{j<=i} rowsum[j]` and a backward tail product so
/// each minor's contribution costs O(n) per sign pattern instead of O(n^2).
pub fn sub_permanents<T: PermanentScalar>(a: &[T], n: usize) -> Result<Vec<T>> {
    if n == 0 || a.len() != (n + 1) * n {
        return Err(Error::InvalidArgument(
            "input must be an (n+1) x n row-major matrix".to_string(),
        ));
    }
    if !T::SUPPORTS_GLYNN {
        return Err(Error::InvalidArgument(
            "cannot compute sub-permanents for int".to_string(),
        ));
    }
    let m = n + 1;
    if n == 1 {
        return Ok(vec![a[1], a[0]]);
    }

    let mut rowsum = scratch::<T>(m)?;
    for (i, sum) in rowsum.iter_mut().enumerate() {
        let base = i * n;
        let mut row_total = a[base];
        for k in 1..n {
            row_total += a[base + k];
        }
        *sum = row_total.halve();
    }

    let mut q = scratch::<T>(m)?;
    let mut prefix = T::one();
    for (i, slot) in q.iter_mut().enumerate() {
        prefix = prefix * rowsum[i];
        *slot = prefix;
    }

    let mut p = scratch::<T>(m)?;
    p[m - 1] = q[m - 2];
    let mut tail = rowsum[m - 1];
    for i in (1..=m - 2).rev() {
        p[i] = tail * q[i - 1];
        tail *= rowsum[i];
    }
    p[0] = tail;

    let mut chi = vec![true; n];
    let mut focus = scratch_indices(n)?;
    for (i, f) in focus.iter_mut().enumerate() {
        *f = i;
    }

    let mut negate = true;
    let mut j = 0;
    while j < n - 1 {
        for (i, sum) in rowsum.iter_mut().enumerate() {
            let value = a[i * n + j];
            if chi[j] {
                *sum -= value;
            } else {
                *sum += value;
            }
        }
        chi[j] = !chi[j];
        let mut prefix = T::one();
        for (i, slot) in q.iter_mut().enumerate() {
            prefix = prefix * rowsum[i];
            *slot = prefix;
        }
        if negate {
            tail = -rowsum[m - 1];
            p[m - 1] -= q[m - 2];
        } else {
            tail = rowsum[m - 1];
            p[m - 1] += q[m - 2];
        }
        for i in (1..=m - 2).rev() {
            p[i] += tail * q[i - 1];
            tail *= rowsum[i];
        }
        p[0] += tail;
        negate = !negate;
        if j > 0 {
            focus[j] = focus[j + 1];
            focus[j + 1] = j + 1;
            j = 0;
        } else {
            j = focus[1];
            focus[1] = 1;
        }
    }
    for value in p.iter_mut() {
        *value = value.double();
    }
    Ok(p)
}

#[cfg(test)]
mod tests {
    use super::super::glynn::permanent_glynn;
    use super::*;
    use num_complex::Complex64;

    /// Permanent of `a` with row `skip` deleted, through the plain kernel.
    fn minor_permanent(a: &[f64], n: usize, skip: usize) -> f64 {
        let minor: Vec<f64> = a
            .chunks_exact(n)
            .enumerate()
            .filter(|(row, _)| *row != skip)
            .flat_map(|(_, row)| row.iter().copied())
            .collect();
        permanent_glynn(&minor, n).unwrap()
    }

    fn minor_permanent_complex(a: &[Complex64], n: usize, skip: usize) -> Complex64 {
        let minor: Vec<Complex64> = a
            .chunks_exact(n)
            .enumerate()
            .filter(|(row, _)| *row != skip)
            .flat_map(|(_, row)| row.iter().copied())
            .collect();
        permanent_glynn(&minor, n).unwrap()
    }

    #[test]
    fn test_sub_permanents_1x1() {
        let a = [3.0f64, 5.0];
        assert_eq!(sub_permanents(&a, 1).unwrap(), vec![5.0, 3.0]);
    }

    #[test]
    fn test_sub_permanents_match_minors_f64() {
        // 4x3 ramp matrix
        let n = 3;
        let a: Vec<f64> = (1..=(n + 1) * n).map(|i| i as f64 * 0.25).collect();
        let subs = sub_permanents(&a, n).unwrap();
        assert_eq!(subs.len(), n + 1);
        for (skip, &value) in subs.iter().enumerate() {
            let expected = minor_permanent(&a, n, skip);
            assert!(
                (value - expected).abs() <= expected.abs() * 1e-10,
                "row {}: {} vs {}",
                skip,
                value,
                expected
            );
        }
    }

    #[test]
    fn test_sub_permanents_match_minors_complex() {
        let n = 4;
        let a: Vec<Complex64> = (1..=(n + 1) * n)
            .map(|i| Complex64::new(i as f64 * 0.125, 0.5 - i as f64 * 0.0625))
            .collect();
        let subs = sub_permanents(&a, n).unwrap();
        for (skip, &value) in subs.iter().enumerate() {
            let expected = minor_permanent_complex(&a, n, skip);
            assert!(
                (value - expected).norm() <= expected.norm() * 1e-10,
                "row {}",
                skip
            );
        }
    }

    #[test]
    fn test_sub_permanents_rejects_bad_input() {
        assert!(sub_permanents(&[1.0f64; 6], 3).is_err());
        assert!(sub_permanents(&[1i64; 12], 3).is_err());
        assert!(sub_permanents(&[] as &[f64], 0).is_err());
    }
}
