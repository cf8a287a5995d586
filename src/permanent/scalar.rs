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

use crate::error::{Error, Result};
use num_complex::Complex64;
use num_traits::{NumAssign, One, Zero};
use std::ops::Neg;

/// Scalars the permanent kernels run over: `f64`, `Complex64` and `i64`.
///
/// `product_of` is the hot row-sum product of the Gray-code walks - for
/// complex matrices it is where most of the time goes. The default is a
/// plain left-to-right product; `f64` overrides it with a lane-split variant
/// that the compiler can vectorize. Correctness of any override is defined
/// by the plain product.
pub trait PermanentScalar:
    Copy + Send + Sync + Zero + One + NumAssign + Neg<Output = Self> + PartialEq
{
    /// Glynn and the Clifford-Clifford sub-permanents halve row sums, which
    /// integers cannot represent.
    const SUPPORTS_GLYNN: bool;

    fn halve(self) -> Self;

    fn double(self) -> Self;

    fn product_of(row: &[Self]) -> Self {
        let mut product = match row.first() {
            Some(&first) => first,
            None => return Self::one(),
        };
        for &value in &row[1..] {
            product = product * value;
        }
        product
    }
}

impl PermanentScalar for f64 {
    const SUPPORTS_GLYNN: bool = true;

    fn halve(self) -> Self {
        self / 2.0
    }

    fn double(self) -> Self {
        self * 2.0
    }

    fn product_of(row: &[Self]) -> Self {
        // four independent accumulators, one multiply per lane per step
        let mut lanes = [1.0f64; 4];
        let mut chunks = row.chunks_exact(4);
        for chunk in &mut chunks {
            for (lane, &value) in lanes.iter_mut().zip(chunk) {
                *lane *= value;
            }
        }
        let mut product = (lanes[0] * lanes[2]) * (lanes[1] * lanes[3]);
        for &value in chunks.remainder() {
            product *= value;
        }
        product
    }
}

impl PermanentScalar for Complex64 {
    const SUPPORTS_GLYNN: bool = true;

    fn halve(self) -> Self {
        self / 2.0
    }

    fn double(self) -> Self {
        self * 2.0
    }
}

impl PermanentScalar for i64 {
    const SUPPORTS_GLYNN: bool = false;

    fn halve(self) -> Self {
        self / 2
    }

    fn double(self) -> Self {
        self * 2
    }
}

/// Zero-filled scratch buffer; allocation failure surfaces as
/// [`Error::OutOfMemory`] instead of aborting.
pub(crate) fn scratch<T: PermanentScalar>(len: usize) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| Error::OutOfMemory)?;
    buffer.resize(len, T::zero());
    Ok(buffer)
}

pub(crate) fn scratch_indices(len: usize) -> Result<Vec<usize>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| Error::OutOfMemory)?;
    buffer.resize(len, 0);
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f64_product_matches_plain_loop() {
        for len in 0..12 {
            let row: Vec<f64> = (0..len).map(|i| 0.5 + i as f64 * 0.25).collect();
            let plain: f64 = row.iter().product();
            let lane = <f64 as PermanentScalar>::product_of(&row);
            assert!((plain - lane).abs() <= plain.abs() * 1e-14);
        }
    }

    #[test]
    fn test_complex_product() {
        let row = [
            Complex64::new(1.0, 1.0),
            Complex64::new(2.0, -1.0),
            Complex64::new(0.5, 0.0),
        ];
        let product = <Complex64 as PermanentScalar>::product_of(&row);
        // (1+i)(2-i) = 3+i, then * 0.5
        assert!((product - Complex64::new(1.5, 0.5)).norm() < 1e-14);
    }
}
