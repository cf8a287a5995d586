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
use crate::fs_array::{FSArray, FS_NPOS};
use num_complex::Complex64;
use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Transition table between two consecutive photon layers: the slot at
/// (parent index, mode) holds the child-array index of the state obtained by
/// adding one photon to that mode of the parent, or [`FS_NPOS`] when that
/// child is not part of the child array (mask filtered).
///
/// Cells are `step` bytes wide, little-endian, where `step` is the smallest
/// byte count that can encode `child_count + 1` values - the all-ones
/// pattern is reserved for the sentinel. This trims the table by 2-4x over a
/// fixed 8-byte slot.
///
/// The table drives the SLOS recurrence: one
/// [`compute_slos_layer`](FSMap::compute_slos_layer) call per added photon.
pub struct FSMap {
    m: usize,
    n: usize,
    step: usize,
    count: u64,
    child_count: u64,
    buffer: OnceCell<Vec<u8>>,
    arrays: Option<(Arc<FSArray>, Arc<FSArray>)>,
}

impl FSMap {
    /// Build the map between `parent` (n photons) and `child` (n+1 photons)
    /// layers over the same modes. The table itself is generated lazily.
    pub fn new(child: Arc<FSArray>, parent: Arc<FSArray>) -> Result<FSMap> {
        if child.m() != parent.m() {
            return Err(Error::InvalidArgument(
                "child and parent layers must share the mode count".to_string(),
            ));
        }
        if child.n() != parent.n() + 1 {
            return Err(Error::InvalidArgument(
                "child layer must have exactly one more photon".to_string(),
            ));
        }
        // bytes needed to encode a child index, keeping all-ones for npos
        let mut step = 0usize;
        let mut c = child.count() + 1;
        while c > 0 {
            step += 1;
            c >>= 8;
        }
        Ok(FSMap {
            m: child.m(),
            n: parent.n(),
            step,
            count: parent.count(),
            child_count: child.count(),
            buffer: OnceCell::new(),
            arrays: Some((child, parent)),
        })
    }

    pub(crate) fn from_parts(
        m: usize,
        n: usize,
        step: usize,
        count: u64,
        child_count: u64,
        buffer: Vec<u8>,
    ) -> FSMap {
        let cell = OnceCell::new();
        let _ = cell.set(buffer);
        FSMap {
            m,
            n,
            step,
            count,
            child_count,
            buffer: cell,
            arrays: None,
        }
    }

    pub fn m(&self) -> usize {
        self.m
    }

    /// Photon count of the parent layer.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of parent states, equivalent to `parent.count()` for the array
    /// the map was built from.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Size of the table in bytes: `count * m * step`.
    pub fn size(&self) -> u64 {
        self.count * (self.m * self.step) as u64
    }

    /// Number of child states; the length [`compute_slos_layer`]
    /// (FSMap::compute_slos_layer) expects for the output vector.
    pub fn child_count(&self) -> u64 {
        self.child_count
    }

    fn table(&self) -> &[u8] {
        self.buffer.get_or_init(|| {
            let (child, parent) = self
                .arrays
                .as_ref()
                .expect("fs-map loaded from a file is always generated");
            child.generate();
            parent.generate();
            let nk = self.n + 1;
            let mut buffer = vec![0xffu8; self.size() as usize];

            // index the parent codes; only states actually present in the
            // parent array (mask included) take part
            let parent_codes = parent.raw();
            let mut parent_index: FxHashMap<&[u8], u64> = FxHashMap::default();
            parent_index.reserve(parent.count() as usize);
            if self.n == 0 {
                if parent.count() > 0 {
                    parent_index.insert(&parent_codes[0..0], 0);
                }
            } else {
                for idx in 0..parent.count() as usize {
                    parent_index.insert(&parent_codes[idx * self.n..(idx + 1) * self.n], idx as u64);
                }
            }

            // each child arises from as many distinct parents as it has
            // distinct occupied modes: delete the last photon of each run
            let child_codes = child.raw();
            let mut parent_code = vec![0u8; self.n];
            for k in 0..child.count() as usize {
                let code = &child_codes[k * nk..(k + 1) * nk];
                for i in 0..nk {
                    if i + 1 < nk && code[i + 1] == code[i] {
                        continue;
                    }
                    parent_code[..i].copy_from_slice(&code[..i]);
                    parent_code[i..].copy_from_slice(&code[i + 1..]);
                    let parent_idx = match parent_index.get(&parent_code[..]) {
                        Some(&idx) => idx,
                        None => continue,
                    };
                    let mode = (code[i] - b'A') as usize;
                    let slot = (parent_idx as usize * self.m + mode) * self.step;
                    let mut value = k as u64;
                    for b in buffer[slot..slot + self.step].iter_mut() {
                        *b = (value & 0xff) as u8;
                        value >>= 8;
                    }
                }
            }
            buffer
        })
    }

    /// Materialize the table now. Idempotent.
    pub fn generate(&self) {
        self.table();
    }

    pub(crate) fn raw(&self) -> &[u8] {
        self.table()
    }

    #[inline]
    fn get_cell(&self, table: &[u8], idx: u64, mode: usize) -> u64 {
        let slot = (idx as usize * self.m + mode) * self.step;
        let cell = &table[slot..slot + self.step];
        if cell.iter().all(|&b| b == 0xff) {
            return FS_NPOS;
        }
        let mut value = 0u64;
        for (i, &b) in cell.iter().enumerate() {
            value |= (b as u64) << (8 * i);
        }
        value
    }

    /// Child-array index of the state obtained by adding one photon to
    /// `mode` of parent `idx`, or [`FS_NPOS`] when that child is filtered
    /// out.
    pub fn get(&self, idx: u64, mode: usize) -> Result<u64> {
        if mode >= self.m {
            return Err(Error::OutOfRange("mode id too large".to_string()));
        }
        if idx >= self.count {
            return Err(Error::OutOfRange("idx too large".to_string()));
        }
        Ok(self.get_cell(self.table(), idx, mode))
    }

    /// One SLOS step: add one photon emitted into input mode `mk` and spread
    /// through the unitary `u` (row-major m x m), turning the parent layer's
    /// amplitude vector into the child layer's:
    ///
    /// `child[c(i, j)] += parent[i] * u[j*m + mk]` for every parent i and
    /// mode j with a live transition.
    ///
    /// The final amplitudes must still be scaled by √(∏ nk!) through
    /// [`FSArray::norm_coefs`].
    pub fn compute_slos_layer(
        &self,
        u: &[Complex64],
        m: usize,
        mk: usize,
        coefs: &mut [Complex64],
        parent_coefs: &[Complex64],
    ) -> Result<()> {
        if m != self.m || u.len() != m * m {
            return Err(Error::InvalidArgument(
                "unitary does not match the mode count".to_string(),
            ));
        }
        if mk >= m {
            return Err(Error::OutOfRange("input mode out of range".to_string()));
        }
        if parent_coefs.len() != self.count as usize {
            return Err(Error::InvalidArgument(
                "parent coefficients do not match the parent layer".to_string(),
            ));
        }
        if coefs.len() != self.child_count as usize {
            return Err(Error::InvalidArgument(
                "coefficients do not match the child layer".to_string(),
            ));
        }
        let table = self.table();
        coefs.fill(Complex64::new(0.0, 0.0));
        for (i, parent_coef) in parent_coefs.iter().enumerate() {
            for j in 0..m {
                let idx = self.get_cell(table, i as u64, j);
                if idx != FS_NPOS {
                    coefs[idx as usize] += parent_coef * u[j * m + mk];
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fockstate::FockState;
    use crate::fs_mask::FSMask;

    fn arrays(m: usize, n: usize) -> (Arc<FSArray>, Arc<FSArray>) {
        (
            Arc::new(FSArray::new(m, n + 1)),
            Arc::new(FSArray::new(m, n)),
        )
    }

    #[test]
    fn test_one_byte_storage() {
        let (child, parent) = arrays(5, 2);
        let fsm = FSMap::new(Arc::clone(&child), Arc::clone(&parent)).unwrap();
        assert_eq!(fsm.count(), parent.count());
        assert_eq!(fsm.count() * 5, fsm.size());
        let fs = FockState::from_occupations(&[0, 1, 1, 0, 0]);
        let idx = parent.find_idx(&fs).unwrap();
        assert_eq!(parent.get(idx).unwrap().to_str(true), "|0,1,1,0,0>");
        let expected = [
            "|1,1,1,0,0>",
            "|0,2,1,0,0>",
            "|0,1,2,0,0>",
            "|0,1,1,1,0>",
            "|0,1,1,0,1>",
        ];
        for (j, want) in expected.iter().enumerate() {
            let child_idx = fsm.get(idx, j).unwrap();
            assert_eq!(child.get(child_idx).unwrap().to_str(true), *want);
        }
    }

    #[test]
    fn test_two_byte_storage() {
        let (child, parent) = arrays(9, 3);
        let fsm = FSMap::new(Arc::clone(&child), Arc::clone(&parent)).unwrap();
        assert_eq!(fsm.count(), parent.count());
        assert_eq!(fsm.count() * 9 * 2, fsm.size());
        let fs = FockState::from_occupations(&[0, 1, 0, 0, 1, 0, 0, 1, 0]);
        let idx = parent.find_idx(&fs).unwrap();
        assert_eq!(parent.get(idx).unwrap().to_str(true), "|0,1,0,0,1,0,0,1,0>");
        let expected = [
            "|1,1,0,0,1,0,0,1,0>",
            "|0,2,0,0,1,0,0,1,0>",
            "|0,1,1,0,1,0,0,1,0>",
            "|0,1,0,1,1,0,0,1,0>",
            "|0,1,0,0,2,0,0,1,0>",
            "|0,1,0,0,1,1,0,1,0>",
            "|0,1,0,0,1,0,1,1,0>",
            "|0,1,0,0,1,0,0,2,0>",
            "|0,1,0,0,1,0,0,1,1>",
        ];
        for (j, want) in expected.iter().enumerate() {
            let child_idx = fsm.get(idx, j).unwrap();
            assert_eq!(child.get(child_idx).unwrap().to_str(true), *want);
        }
    }

    #[test]
    fn test_masked_map() {
        // one mask written for the full 4-photon layer constrains both
        // layers; the parent matches with one photon still missing
        let mask = FSMask::with_condition(9, 4, "1       1").unwrap();
        let parent = Arc::new(FSArray::with_mask(9, 3, mask.clone()).unwrap());
        let child = Arc::new(FSArray::with_mask(9, 4, mask).unwrap());
        let fsm = FSMap::new(Arc::clone(&child), Arc::clone(&parent)).unwrap();
        assert_eq!(fsm.count(), parent.count());

        let fs = FockState::from_occupations(&[0, 1, 0, 0, 1, 0, 0, 1, 0]);
        assert_eq!(parent.find_idx(&fs).unwrap(), FS_NPOS);
        let fs = FockState::from_occupations(&[1, 0, 0, 0, 1, 0, 0, 1, 0]);
        let idx = parent.find_idx(&fs).unwrap();
        assert_ne!(idx, FS_NPOS);
        assert_eq!(parent.get(idx).unwrap().to_str(true), "|1,0,0,0,1,0,0,1,0>");
        // the only child still satisfying the mask adds the photon to mode 8
        for j in 0..8 {
            assert_eq!(fsm.get(idx, j).unwrap(), FS_NPOS);
        }
        let child_idx = fsm.get(idx, 8).unwrap();
        assert_ne!(child_idx, FS_NPOS);
        assert_eq!(
            child.get(child_idx).unwrap().to_str(true),
            "|1,0,0,0,1,0,0,1,1>"
        );
    }

    #[test]
    fn test_full_coverage_from_vacuum() {
        // every (parent, mode) cell of an unmasked map is live and points at
        // the parent plus one photon in that mode
        let (child, parent) = arrays(4, 2);
        let fsm = FSMap::new(Arc::clone(&child), Arc::clone(&parent)).unwrap();
        for idx in 0..parent.count() {
            let parent_state = parent.get(idx).unwrap();
            for mode in 0..4 {
                let child_idx = fsm.get(idx, mode).unwrap();
                assert_ne!(child_idx, FS_NPOS);
                let mut occupations = parent_state.to_vect();
                occupations[mode] += 1;
                assert_eq!(
                    child.get(child_idx).unwrap(),
                    FockState::from_occupations(&occupations)
                );
            }
        }
    }

    #[test]
    fn test_out_of_range_access() {
        let (child, parent) = arrays(3, 1);
        let fsm = FSMap::new(child, Arc::clone(&parent)).unwrap();
        assert!(fsm.get(0, 3).is_err());
        assert!(fsm.get(parent.count(), 0).is_err());
    }

    #[test]
    fn test_hom_interference_and_normalization() {
        // two photons entering a balanced beam splitter bunch: the |1,1>
        // output amplitude cancels and the output norm stays 1
        let layer0 = Arc::new(FSArray::new(2, 0));
        let layer1 = Arc::new(FSArray::new(2, 1));
        let layer2 = Arc::new(FSArray::new(2, 2));
        let map01 = FSMap::new(Arc::clone(&layer1), Arc::clone(&layer0)).unwrap();
        let map12 = FSMap::new(Arc::clone(&layer2), Arc::clone(&layer1)).unwrap();

        let r = std::f64::consts::FRAC_1_SQRT_2;
        let u = [
            Complex64::new(r, 0.0),
            Complex64::new(r, 0.0),
            Complex64::new(r, 0.0),
            Complex64::new(-r, 0.0),
        ];
        // input state |1,1>: one photon in mode 0, then one in mode 1
        let mut amplitudes1 = vec![Complex64::new(0.0, 0.0); layer1.count() as usize];
        map01
            .compute_slos_layer(&u, 2, 0, &mut amplitudes1, &[Complex64::new(1.0, 0.0)])
            .unwrap();
        let mut amplitudes2 = vec![Complex64::new(0.0, 0.0); layer2.count() as usize];
        map12
            .compute_slos_layer(&u, 2, 1, &mut amplitudes2, &amplitudes1)
            .unwrap();
        layer2.norm_coefs(&mut amplitudes2).unwrap();

        // layer order: |2,0>, |1,1>, |0,2>
        assert!((amplitudes2[0].re - r).abs() < 1e-12);
        assert!(amplitudes2[1].norm() < 1e-12);
        assert!((amplitudes2[2].re + r).abs() < 1e-12);
        let norm: f64 = amplitudes2.iter().map(|a| a.norm_sqr()).sum();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_slos_norm_three_modes() {
        // three photons through a 3-mode unitary keep unit norm
        let m = 3;
        let layers: Vec<Arc<FSArray>> =
            (0..=3).map(|n| Arc::new(FSArray::new(m, n))).collect();
        // a real orthogonal 3x3 matrix (rotation)
        let (c, s) = (0.8f64, 0.6f64);
        let u = [
            Complex64::new(c, 0.0),
            Complex64::new(-s, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(s * c, 0.0),
            Complex64::new(c * c, 0.0),
            Complex64::new(-s, 0.0),
            Complex64::new(s * s, 0.0),
            Complex64::new(c * s, 0.0),
            Complex64::new(c, 0.0),
        ];
        let input = [0usize, 1, 2]; // |1,1,1>
        let mut amplitudes = vec![Complex64::new(1.0, 0.0)];
        for (k, &mk) in input.iter().enumerate() {
            let map = FSMap::new(Arc::clone(&layers[k + 1]), Arc::clone(&layers[k])).unwrap();
            let mut next = vec![Complex64::new(0.0, 0.0); layers[k + 1].count() as usize];
            map.compute_slos_layer(&u, m, mk, &mut next, &amplitudes).unwrap();
            amplitudes = next;
        }
        layers[3].norm_coefs(&mut amplitudes).unwrap();
        let norm: f64 = amplitudes.iter().map(|a| a.norm_sqr()).sum();
        assert!((norm - 1.0).abs() < 1e-10);
    }
}
