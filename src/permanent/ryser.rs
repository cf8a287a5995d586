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
use std::thread;

/// Update `chi` (the sorted column indices of the current subset) from the
/// previous Gray code to `gray`.
///
/// When `prev_size` is nonzero the two subsets differ by one column and only
/// that column is inserted or removed; the returned diff is `+(col+1)` /
/// `-(col+1)` accordingly. With `prev_size == 0` (first subset of a block)
/// `chi` is rebuilt in full and the diff is 0, which tells the caller to
/// recompute its row sums from scratch.
fn gray_to_columns(chi: &mut [usize], gray: u64, prev_size: usize) -> (usize, isize) {
    let mut pos = 0usize;
    let mut idx = 0usize;
    let mut bits = gray;
    if prev_size != 0 {
        while bits > 0 {
            if bits & 1 == 1 {
                if idx == prev_size || chi[idx] != pos {
                    let mut i = prev_size;
                    while i > idx {
                        chi[i] = chi[i - 1];
                        i -= 1;
                    }
                    chi[idx] = pos;
                    return (prev_size + 1, (pos + 1) as isize);
                }
                idx += 1;
            } else if idx < prev_size && chi[idx] == pos {
                let mut j = idx;
                while j + 1 < prev_size {
                    chi[j] = chi[j + 1];
                    j += 1;
                }
                return (prev_size - 1, -((pos + 1) as isize));
            }
            bits >>= 1;
            pos += 1;
        }
        (idx, 0)
    } else {
        while bits > 0 {
            if bits & 1 == 1 {
                chi[idx] = pos;
                idx += 1;
            }
            bits >>= 1;
            pos += 1;
        }
        (idx, 0)
    }
}

/// Inclusion-exclusion sum over the Gray codes of `[from, to)`. Each block
/// owns its scratch buffers; the first iteration rebuilds the row sums, the
/// rest update them by the single column that changed.
fn permanent_ryser_block<T: PermanentScalar>(a: &[T], from: u64, to: u64, n: usize) -> Result<T> {
    let mut sum = T::zero();
    let mut chi = scratch_indices(n)?;
    let mut rowsum = scratch::<T>(n)?;

    let mut prev_size = 0usize;
    for k in from..to {
        let gray = k ^ (k >> 1);
        let (size_set, diff) = gray_to_columns(&mut chi, gray, prev_size);
        prev_size = size_set;

        if diff > 0 {
            let column = diff as usize - 1;
            for (r, sum) in rowsum.iter_mut().enumerate() {
                *sum += a[r * n + column];
            }
        } else if diff < 0 {
            let column = (-diff) as usize - 1;
            for (r, sum) in rowsum.iter_mut().enumerate() {
                *sum -= a[r * n + column];
            }
        } else {
            // once per block
            for (r, sum) in rowsum.iter_mut().enumerate() {
                let mut row_total = T::zero();
                for &column in chi[..size_set].iter() {
                    row_total += a[r * n + column];
                }
                *sum = row_total;
            }
        }

        let rowsumprod = T::product_of(&rowsum);
        if (n - size_set) % 2 == 1 {
            sum -= rowsumprod;
        } else {
            sum += rowsumprod;
        }
    }
    Ok(sum)
}

/// Ryser's inclusion-exclusion permanent, Gray-code ordered and partitioned
/// into `nthreads` contiguous subset ranges. Workers share nothing but the
/// input matrix; partial sums are collected and added once all workers are
/// done.
pub fn permanent_ryser<T: PermanentScalar>(a: &[T], n: usize, nthreads: usize) -> Result<T> {
    shape_check(a, n)?;
    if n == 1 {
        return Ok(a[0]);
    }
    if n >= 64 {
        return Err(crate::error::Error::InvalidArgument(
            "matrix too large for subset enumeration".to_string(),
        ));
    }
    let subsets: u64 = 1u64 << n;
    // no point splitting below a couple of subsets per worker
    let workers = nthreads.max(1).min((subsets / 2) as usize);
    if workers == 1 {
        return permanent_ryser_block(a, 1, subsets, n);
    }

    let block_size = subsets / workers as u64;
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        let mut start = 1u64;
        for i in 0..workers {
            let end = if i == workers - 1 {
                subsets
            } else {
                block_size * (i as u64 + 1)
            };
            handles.push(scope.spawn(move || permanent_ryser_block(a, start, end, n)));
            start = end;
        }
        let mut result = T::zero();
        for handle in handles {
            match handle.join() {
                Ok(partial) => result += partial?,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        Ok(result)
    })
}

#[cfg(test)]
mod tests {
    use super::super::glynn::permanent_glynn;
    use super::super::glynn::tests::{ramp_matrix_complex, ramp_matrix_f64};
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_ryser_2x2() {
        let matrix = [1.0f64, 2.0, 3.0, 4.0];
        for nthreads in [1, 2, 4] {
            let result = permanent_ryser(&matrix, 2, nthreads).unwrap();
            assert!((result - 10.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_ryser_matches_glynn_f64() {
        for n in 2..=8 {
            let matrix = ramp_matrix_f64(n);
            let glynn = permanent_glynn(&matrix, n).unwrap();
            for nthreads in [1, 3, 4] {
                let ryser = permanent_ryser(&matrix, n, nthreads).unwrap();
                assert!(
                    (ryser - glynn).abs() <= glynn.abs() * 1e-10,
                    "n={} nthreads={}: {} vs {}",
                    n,
                    nthreads,
                    ryser,
                    glynn
                );
            }
        }
    }

    #[test]
    fn test_ryser_matches_glynn_complex() {
        for n in 2..=8 {
            let matrix = ramp_matrix_complex(n);
            let glynn = permanent_glynn(&matrix, n).unwrap();
            for nthreads in [1, 4] {
                let ryser = permanent_ryser(&matrix, n, nthreads).unwrap();
                assert!(
                    (ryser - glynn).norm() <= glynn.norm() * 1e-10,
                    "n={} nthreads={}",
                    n,
                    nthreads
                );
            }
        }
    }

    #[test]
    fn test_ryser_integer() {
        // permanent of the all-ones 3x3 matrix is 3! = 6
        let ones = [1i64; 9];
        assert_eq!(permanent_ryser(&ones, 3, 2).unwrap(), 6);
        let matrix = [1i64, 2, 3, 4];
        assert_eq!(permanent_ryser(&matrix, 2, 1).unwrap(), 10);
    }

    #[test]
    fn test_ryser_identity() {
        // permanent of the identity is 1
        let mut identity = vec![Complex64::new(0.0, 0.0); 36];
        for i in 0..6 {
            identity[i * 6 + i] = Complex64::new(1.0, 0.0);
        }
        let result = permanent_ryser(&identity, 6, 4).unwrap();
        assert!((result - Complex64::new(1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_ryser_excess_threads() {
        let matrix = [1.0f64, 2.0, 3.0, 4.0];
        // more threads than subsets degrades gracefully
        let result = permanent_ryser(&matrix, 2, 64).unwrap();
        assert!((result - 10.0).abs() < 1e-12);
    }
}
