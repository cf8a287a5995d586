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

use crate::caching::{get_cached_layer, get_layer_cache_key, insert_layer_to_cache, CachedLayer};
use crate::error::{Error, Result};
use crate::fockstate::FockState;
use crate::fs_mask::FSMask;
use num_complex::Complex64;
use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Sentinel "no such index", the all-ones pattern of a map cell.
pub const FS_NPOS: u64 = 0xffff_ffff;

/// Number of distinct (m, n) states: C(m+n-1, n).
pub(crate) fn layer_count(m: usize, n: usize) -> u64 {
    let mut count: u64 = 1;
    for nk in 1..=n as u64 {
        count = (count * (nk + m as u64 - 1)) / nk;
    }
    count
}

/// The ordered array of all n-photon m-mode states, optionally constrained
/// by a mask.
///
/// The backing buffer (the concatenation of all n-byte codes in
/// lexicographic order) is generated lazily on first random access and then
/// lives for the lifetime of the array; iteration alone can proceed without
/// it. Generated buffers are shared through a process-wide LRU cache, so
/// building the same layer twice is cheap.
///
/// `generate` is idempotent and safe to race, but pre-generating before
/// fanning out across threads avoids duplicated work.
pub struct FSArray {
    m: usize,
    n: usize,
    mask: Option<FSMask>,
    count: u64,
    buffer: OnceCell<Arc<CachedLayer>>,
}

impl FSArray {
    /// Unconstrained layer. The count is the closed form C(m+n-1, n).
    pub fn new(m: usize, n: usize) -> Self {
        FSArray {
            m,
            n,
            mask: None,
            count: layer_count(m, n),
            buffer: OnceCell::new(),
        }
    }

    /// Masked layer. The count is established by a full lexicographic walk.
    ///
    /// The mask's photon count may exceed the layer's: a mask written for
    /// the final layer also constrains the partially-populated ones, with
    /// the missing photons counted as tolerated deficits.
    pub fn with_mask(m: usize, n: usize, mask: FSMask) -> Result<Self> {
        if mask.m() != m || mask.n() < n {
            return Err(Error::InvalidArgument(
                "mask does not apply to this layer".to_string(),
            ));
        }
        let mut count = 0u64;
        let mut fs = FockState::with_photons(m, n);
        while !fs.is_undefined() {
            if mask.matches(&fs, true) {
                count += 1;
            }
            fs.increment()?;
        }
        Ok(FSArray {
            m,
            n,
            mask: Some(mask),
            count,
            buffer: OnceCell::new(),
        })
    }

    pub(crate) fn from_layer(m: usize, n: usize, layer: CachedLayer) -> Self {
        let count = layer.count;
        let buffer = OnceCell::new();
        let _ = buffer.set(Arc::new(layer));
        FSArray {
            m,
            n,
            mask: None,
            count,
            buffer,
        }
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of states in the array.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Size of the generated buffer in bytes.
    pub fn size(&self) -> u64 {
        self.count * self.n as u64
    }

    pub fn mask(&self) -> Option<&FSMask> {
        self.mask.as_ref()
    }

    fn layer(&self) -> &Arc<CachedLayer> {
        self.buffer.get_or_init(|| {
            let key = get_layer_cache_key(self.m, self.n, self.mask.as_ref());
            if let Some(cached) = get_cached_layer(key) {
                return cached;
            }
            let mut buffer = Vec::with_capacity((self.count * self.n as u64) as usize);
            let mut fs = FockState::with_photons(self.m, self.n);
            while let Some(code) = fs.code() {
                if self
                    .mask
                    .as_ref()
                    .map_or(true, |mask| mask.matches(&fs, true))
                {
                    buffer.extend_from_slice(code);
                }
                if fs.increment().is_err() {
                    break;
                }
            }
            insert_layer_to_cache(
                CachedLayer {
                    buffer,
                    count: self.count,
                    hash: key,
                },
                key,
            )
        })
    }

    /// Materialize the buffer now. Idempotent; after this, reads are safe
    /// from any number of threads.
    pub fn generate(&self) {
        self.layer();
    }

    pub(crate) fn raw(&self) -> &[u8] {
        &self.layer().buffer
    }

    fn row(&self, idx: u64) -> &[u8] {
        let start = (idx as usize) * self.n;
        &self.raw()[start..start + self.n]
    }

    /// State at index `idx` in lexicographic order.
    pub fn get(&self, idx: u64) -> Result<FockState> {
        if idx >= self.count {
            return Err(Error::OutOfRange("index too large".to_string()));
        }
        Ok(FockState::from_code(self.m, self.row(idx).to_vec()))
    }

    /// Index of a state, `FS_NPOS` when it is not part of the array.
    /// Binary search over the sorted buffer, O(n log count) byte compares.
    pub fn find_idx(&self, fs: &FockState) -> Result<u64> {
        self.generate();
        if fs.m() != self.m {
            return Err(Error::InvalidArgument("incorrect fock state".to_string()));
        }
        if self.n == 0 {
            return Ok(if fs.n() == 0 { 0 } else { FS_NPOS });
        }
        if fs.n() != self.n || self.count == 0 {
            return Ok(FS_NPOS);
        }
        let code = match fs.code() {
            Some(code) => code,
            None => return Ok(FS_NPOS),
        };
        let mut begin = 0u64;
        let mut end = self.count;
        while end - begin > 1 {
            let middle = (begin + end) >> 1;
            match code.cmp(self.row(middle)) {
                std::cmp::Ordering::Equal => return Ok(middle),
                std::cmp::Ordering::Less => end = middle,
                std::cmp::Ordering::Greater => begin = middle,
            }
        }
        if code == self.row(begin) {
            return Ok(begin);
        }
        Ok(FS_NPOS)
    }

    /// Like [`find_idx`](FSArray::find_idx), with `None` instead of the
    /// sentinel.
    pub fn find(&self, fs: &FockState) -> Result<Option<u64>> {
        let idx = self.find_idx(fs)?;
        Ok(if idx == FS_NPOS { None } else { Some(idx) })
    }

    /// Iterate over the states in order. When the buffer has not been
    /// generated yet, the iteration walks a local state under increment
    /// instead of materializing anything.
    pub fn iter(&self) -> FSArrayIter<'_> {
        let walker = if self.buffer.get().is_none() {
            let mut fs = FockState::with_photons(self.m, self.n);
            if let Some(mask) = &self.mask {
                while !fs.is_undefined() && !mask.matches(&fs, true) {
                    let _ = fs.increment();
                }
            }
            Some(fs)
        } else {
            None
        };
        FSArrayIter {
            fsa: self,
            idx: 0,
            walker,
        }
    }

    /// Scale `coefs[i]` by the √(∏ nk!) normalization of state i. Square
    /// roots are memoized per distinct product.
    pub fn norm_coefs(&self, coefs: &mut [Complex64]) -> Result<()> {
        self.generate();
        if coefs.len() != self.count as usize {
            return Err(Error::InvalidArgument(
                "coefficient vector does not match layer size".to_string(),
            ));
        }
        let mut sqrt_memo: FxHashMap<u64, f64> = FxHashMap::default();
        let buffer = self.raw();
        for (i, coef) in coefs.iter_mut().enumerate() {
            let code = &buffer[i * self.n..(i + 1) * self.n];
            let mut product = 1u64;
            let mut j = 0;
            while j < code.len() {
                let mut k = 1u64;
                while j + (k as usize) < code.len() && code[j + k as usize] == code[j] {
                    k += 1;
                    product *= k;
                }
                j += k as usize;
            }
            let factor = *sqrt_memo
                .entry(product)
                .or_insert_with(|| (product as f64).sqrt());
            *coef *= factor;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a FSArray {
    type Item = FockState;
    type IntoIter = FSArrayIter<'a>;

    fn into_iter(self) -> FSArrayIter<'a> {
        self.iter()
    }
}

pub struct FSArrayIter<'a> {
    fsa: &'a FSArray,
    idx: u64,
    walker: Option<FockState>,
}

impl Iterator for FSArrayIter<'_> {
    type Item = FockState;

    fn next(&mut self) -> Option<FockState> {
        if self.idx >= self.fsa.count {
            return None;
        }
        let item = match &self.walker {
            Some(fs) => fs.clone(),
            None => self.fsa.get(self.idx).ok()?,
        };
        self.idx += 1;
        if let Some(fs) = &mut self.walker {
            if !fs.is_undefined() {
                let _ = fs.increment();
                if let Some(mask) = &self.fsa.mask {
                    while !fs.is_undefined() && !mask.matches(fs, true) {
                        let _ = fs.increment();
                    }
                }
            }
        }
        Some(item)
    }
}
