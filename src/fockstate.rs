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

use crate::annotation::Annotation;
use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Per-mode annotations: mode index -> ordered list of (photon count,
/// annotation). Counts in a mode sum to at most the mode occupation;
/// unannotated photons in that mode are implicit bare photons.
pub(crate) type ModeAnnotations = FxHashMap<usize, SmallVec<[(usize, Annotation); 2]>>;

/// A multi-mode photon occupation with a canonical packed code.
///
/// The code is the mode of each photon in nondecreasing order, one byte per
/// photon over the alphabet `'A'..'A'+m-1`. Two equal states have
/// byte-identical codes, tensor product is code concatenation (with the
/// right operand shifted), and lexicographic order over codes matches the
/// enumeration order of [`FSArray`](crate::FSArray).
///
/// A state is one of:
/// - undefined: the result of incrementing past the last state (no code),
/// - a vacuum: n = 0, empty code,
/// - a coded state: n photons, n code bytes.
#[derive(Debug, Clone)]
pub struct FockState {
    m: usize,
    n: usize,
    code: Option<Vec<u8>>,
    annotations: ModeAnnotations,
}

#[inline]
pub(crate) fn djb2(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 5381;
    for &c in bytes {
        hash = hash
            .wrapping_shl(5)
            .wrapping_add(hash)
            .wrapping_add(c as u64);
    }
    hash
}

fn bad_state(reason: &str) -> Error {
    Error::InvalidFockState(reason.to_string())
}

fn ndef_operation() -> Error {
    Error::InvalidOperation("cannot make operation on ndef-state".to_string())
}

fn skip_blanks(b: &[u8], mut i: usize) -> usize {
    while i < b.len() && b[i] == b' ' {
        i += 1;
    }
    i
}

fn build_code(occupations: &[usize]) -> Vec<u8> {
    let n: usize = occupations.iter().sum();
    let mut code = Vec::with_capacity(n);
    for (mode, &count) in occupations.iter().enumerate() {
        for _ in 0..count {
            code.push(b'A' + mode as u8);
        }
    }
    code
}

impl Default for FockState {
    /// The zero-mode empty state, unit of the tensor product.
    fn default() -> Self {
        FockState::vacuum(0)
    }
}

impl FockState {
    /// Vacuum state of `m` modes.
    pub fn vacuum(m: usize) -> Self {
        FockState {
            m,
            n: 0,
            code: Some(Vec::new()),
            annotations: ModeAnnotations::default(),
        }
    }

    /// First state of the (m, n) layer: all photons in mode 0.
    pub fn with_photons(m: usize, n: usize) -> Self {
        FockState {
            m,
            n,
            code: Some(vec![b'A'; n]),
            annotations: ModeAnnotations::default(),
        }
    }

    pub(crate) fn from_code(m: usize, code: Vec<u8>) -> Self {
        FockState {
            m,
            n: code.len(),
            code: Some(code),
            annotations: ModeAnnotations::default(),
        }
    }

    /// Build from an occupation vector, one entry per mode.
    pub fn from_occupations(occupations: &[usize]) -> Self {
        FockState {
            m: occupations.len(),
            n: occupations.iter().sum(),
            code: Some(build_code(occupations)),
            annotations: ModeAnnotations::default(),
        }
    }

    /// Build from an occupation vector plus per-mode annotation strings.
    pub fn from_occupations_annotated(
        occupations: &[usize],
        annotations: &[(usize, &[&str])],
    ) -> Result<Self> {
        let mut fs = FockState::from_occupations(occupations);
        for (mode, texts) in annotations {
            let mut parsed = Vec::with_capacity(texts.len());
            for text in *texts {
                parsed.push(Annotation::parse(text)?);
            }
            fs.set_mode_annotations(*mode, &parsed)?;
        }
        Ok(fs)
    }

    /// Parse a textual state: `|...>` (or `|...〉`), `[...]` or `(...)`.
    ///
    /// A mode entry is a sequence of non-negative integers and `{ANNOTATION}`
    /// blocks; `{...}` without a preceding integer counts as one photon. A
    /// body made of bare commas defines a vacuum with one mode per slot.
    pub fn parse(s: &str) -> Result<FockState> {
        let b = s.as_bytes();
        let mut i = skip_blanks(b, 0);
        let opener = match b.get(i) {
            Some(&c) if matches!(c, b'[' | b'|' | b'(') => c,
            _ => return Err(bad_state("bad open")),
        };
        i += 1;

        let mut occupations: Vec<usize> = Vec::new();
        let mut annotation_map = ModeAnnotations::default();
        let mut n = 0usize;
        loop {
            i = skip_blanks(b, i);
            let c = match b.get(i) {
                Some(&c) if matches!(c, b'0'..=b'9' | b',' | b'{') => c,
                _ => break,
            };
            if !occupations.is_empty() && c != b',' {
                break;
            }
            if occupations.is_empty() && c == b',' {
                break;
            }
            if c == b',' {
                i = skip_blanks(b, i + 1);
            }
            let mut total = 0usize;
            // annotated runs keyed by canonical form so duplicates merge
            let mut entry: BTreeMap<String, (usize, Annotation)> = BTreeMap::new();
            while i < b.len() && (b[i].is_ascii_digit() || b[i] == b'{') {
                let mut count = 0usize;
                if b[i] == b'{' {
                    count = 1;
                } else {
                    while i < b.len() && b[i].is_ascii_digit() {
                        count = 10 * count + (b[i] - b'0') as usize;
                        i += 1;
                    }
                }
                if i < b.len() && b[i] == b'{' {
                    if count == 0 {
                        return Err(bad_state("annotation on 0 photons"));
                    }
                    let close = b[i + 1..]
                        .iter()
                        .position(|&x| x == b'}')
                        .map(|p| p + i + 1)
                        .ok_or_else(|| bad_state("no annotation close"))?;
                    let inner = std::str::from_utf8(&b[i + 1..close])
                        .map_err(|_| bad_state("invalid annotation text"))?;
                    let annotation = Annotation::parse(inner)?;
                    i = close + 1;
                    if !annotation.is_empty() {
                        entry
                            .entry(annotation.to_str())
                            .and_modify(|e| e.0 += count)
                            .or_insert((count, annotation));
                    }
                }
                total += count;
            }
            n += total;
            if !entry.is_empty() {
                let list = annotation_map.entry(occupations.len()).or_default();
                for (_, (count, annotation)) in entry {
                    list.push((count, annotation));
                }
            }
            occupations.push(total);
        }

        // pure commas define a vacuum with one mode per slot
        let mut comma_m = 0usize;
        if occupations.is_empty() && b.get(i) == Some(&b',') {
            comma_m = 1;
            loop {
                i = skip_blanks(b, i);
                if b.get(i) != Some(&b',') {
                    break;
                }
                comma_m += 1;
                i += 1;
            }
        }

        let rest = &b[i.min(b.len())..];
        let closed = match opener {
            b'[' => rest.first() == Some(&b']'),
            b'(' => rest.first() == Some(&b')'),
            _ => rest.first() == Some(&b'>') || rest.starts_with("\u{3009}".as_bytes()),
        };
        if !closed {
            return Err(bad_state("bad close"));
        }
        i += match rest.first() {
            Some(&c) if c == b'>' || c == b']' || c == b')' => 1,
            _ => 3, // the three-byte '〉'
        };
        i = skip_blanks(b, i);
        if i != b.len() {
            return Err(bad_state("extra chars"));
        }

        if comma_m > 0 {
            return Ok(FockState {
                m: comma_m,
                n: 0,
                code: None,
                annotations: ModeAnnotations::default(),
            });
        }
        Ok(FockState {
            m: occupations.len(),
            n,
            code: Some(build_code(&occupations)),
            annotations: annotation_map,
        })
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Packed code bytes, `None` for the undefined state.
    pub fn code(&self) -> Option<&[u8]> {
        self.code.as_deref()
    }

    /// True once the lexicographic iteration has moved past the last state.
    pub fn is_undefined(&self) -> bool {
        self.code.is_none()
    }

    /// Occupation of one mode.
    pub fn occupation(&self, mode: usize) -> Result<usize> {
        if mode >= self.m {
            return Err(Error::OutOfRange("invalid mode".to_string()));
        }
        let code = match &self.code {
            Some(code) => code,
            None => return Ok(0),
        };
        Ok(code.iter().filter(|&&c| (c - b'A') as usize == mode).count())
    }

    /// Occupation vector, one entry per mode.
    pub fn to_vect(&self) -> Vec<usize> {
        let mut occupations = vec![0usize; self.m];
        if let Some(code) = &self.code {
            for &c in code {
                occupations[(c - b'A') as usize] += 1;
            }
        }
        occupations
    }

    /// Mode of the photon at index `photon_idx` (photons are sorted by mode).
    pub fn photon2mode(&self, photon_idx: usize) -> Result<usize> {
        if photon_idx >= self.n {
            return Err(Error::OutOfRange("photon index out of range".to_string()));
        }
        let code = self.code.as_ref().ok_or_else(ndef_operation)?;
        Ok((code[photon_idx] - b'A') as usize)
    }

    /// First photon index in the given mode, `None` if the mode is empty.
    pub fn mode2photon(&self, mode_idx: usize) -> Result<Option<usize>> {
        if mode_idx >= self.m {
            return Err(Error::OutOfRange("mode index out of range".to_string()));
        }
        let code = match &self.code {
            Some(code) => code,
            None => return Ok(None),
        };
        for (k, &c) in code.iter().enumerate() {
            let mode = (c - b'A') as usize;
            if mode == mode_idx {
                return Ok(Some(k));
            }
            if mode > mode_idx {
                break;
            }
        }
        Ok(None)
    }

    /// Advance to the lexicographic successor among the n-photon m-mode
    /// states. Past the last state, the state becomes undefined; one more
    /// increment is an error.
    pub fn increment(&mut self) -> Result<()> {
        let code = self.code.as_mut().ok_or_else(ndef_operation)?;
        let top = b'A' + self.m.saturating_sub(1) as u8;
        let pivot = code.iter().rposition(|&c| c < top);
        match pivot {
            Some(i) => {
                code[i] += 1;
                let value = code[i];
                for c in code[i + 1..].iter_mut() {
                    *c = value;
                }
            }
            None => self.code = None,
        }
        Ok(())
    }

    /// Fresh state advanced `count` steps in lexicographic order.
    pub fn advanced(&self, count: usize) -> Result<FockState> {
        if self.code.is_none() {
            return Err(ndef_operation());
        }
        let mut fs = self.clone();
        for _ in 0..count {
            fs.increment()?;
        }
        Ok(fs)
    }

    /// Merge two states over the same modes: occupations add up, and each of
    /// `other`'s annotated runs joins the first run of ours it is compatible
    /// with (see [`Annotation::compatible_annotation`]), summing counts;
    /// incompatible runs stay separate.
    pub fn merge(&self, other: &FockState) -> Result<FockState> {
        let (a, b) = match (&self.code, &other.code) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(ndef_operation()),
        };
        if self.m != other.m {
            return Err(Error::InvalidOperation(
                "cannot add fock states with different mode count".to_string(),
            ));
        }
        let mut code = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            if a[i] <= b[j] {
                code.push(a[i]);
                i += 1;
            } else {
                code.push(b[j]);
                j += 1;
            }
        }
        code.extend_from_slice(&a[i..]);
        code.extend_from_slice(&b[j..]);

        let mut annotations = self.annotations.clone();
        for (mode, list) in other.annotations.iter() {
            let target = annotations.entry(*mode).or_default();
            for (count, annotation) in list {
                let mut placed = false;
                for (existing_count, existing) in target.iter_mut() {
                    if let Some(merged) = existing.compatible_annotation(annotation) {
                        *existing = merged;
                        *existing_count += count;
                        placed = true;
                        break;
                    }
                }
                if !placed {
                    target.push((*count, annotation.clone()));
                }
            }
            target.sort_by_key(|(_, e)| e.to_str());
        }
        Ok(FockState {
            m: self.m,
            n: self.n + other.n,
            code: Some(code),
            annotations,
        })
    }

    /// Tensor product: right operand modes are appended after ours.
    pub fn tensor(&self, other: &FockState) -> Result<FockState> {
        let (a, b) = match (&self.code, &other.code) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(ndef_operation()),
        };
        let mut code = Vec::with_capacity(a.len() + b.len());
        code.extend_from_slice(a);
        code.extend(b.iter().map(|&c| c + self.m as u8));

        let mut annotations = self.annotations.clone();
        for (mode, list) in other.annotations.iter() {
            annotations.insert(mode + self.m, list.clone());
        }
        Ok(FockState {
            m: self.m + other.m,
            n: self.n + other.n,
            code: Some(code),
            annotations,
        })
    }

    fn check_slice(
        &self,
        start: isize,
        end: isize,
        step: usize,
    ) -> Result<(usize, usize, usize, usize)> {
        if step < 1 {
            return Err(Error::InvalidOperation("slice step must be >= 1".to_string()));
        }
        let code = self.code.as_ref().ok_or_else(ndef_operation)?;
        let m = self.m as isize;
        let mut start = if start < 0 { start + m } else { start };
        let mut end = if end < 0 { end + m } else { end };
        if start < 0 {
            start = 0;
        }
        if end < 0 {
            end = 0;
        }
        if end > m {
            end = m;
        }
        let (start, end) = (start as usize, end as usize);
        let slice_m = if end > start {
            (end - start).div_ceil(step)
        } else {
            0
        };
        let slice_n = code
            .iter()
            .filter(|&&c| {
                let mode = (c - b'A') as usize;
                mode >= start && mode < end && (step == 1 || (mode - start) % step == 0)
            })
            .count();
        Ok((start, end, slice_m, slice_n))
    }

    /// Extract modes `[start, end)` with the given stride. Negative indices
    /// count from the end, python-style. Annotations on retained modes are
    /// re-keyed by their new index.
    pub fn slice(&self, start: isize, end: isize, step: usize) -> Result<FockState> {
        let (start, end, slice_m, slice_n) = self.check_slice(start, end, step)?;
        if slice_n == 0 {
            return Ok(FockState::vacuum(slice_m));
        }
        let code = self.code.as_ref().ok_or_else(ndef_operation)?;
        let mut new_code = Vec::with_capacity(slice_n);
        for &c in code {
            let mode = (c - b'A') as usize;
            if mode >= start && mode < end && (step == 1 || (mode - start) % step == 0) {
                new_code.push(((mode - start) / step) as u8 + b'A');
            }
        }
        let mut annotations = ModeAnnotations::default();
        for (j, i) in (start..end).step_by(step).enumerate() {
            if let Some(list) = self.annotations.get(&i) {
                annotations.insert(j, list.clone());
            }
        }
        Ok(FockState {
            m: slice_m,
            n: slice_n,
            code: Some(new_code),
            annotations,
        })
    }

    /// Splice `fs` over the window `[start, end)`: modes outside the window
    /// are kept (with their annotations), the window content and annotations
    /// are replaced by `fs`'s, re-keyed by `start`.
    pub fn set_slice(&self, fs: &FockState, start: isize, end: isize) -> Result<FockState> {
        let (start, end, slice_m, slice_n) = self.check_slice(start, end, 1)?;
        if slice_m != fs.m {
            return Err(Error::InvalidOperation(
                "invalid fockstate to replace in slice".to_string(),
            ));
        }
        let fs_code = fs.code.as_ref().ok_or_else(ndef_operation)?;
        let new_n = self.n - slice_n + fs.n;
        if new_n == 0 {
            return Ok(FockState::vacuum(self.m));
        }
        let code = self.code.as_ref().ok_or_else(ndef_operation)?;
        let mut new_code = Vec::with_capacity(new_n);
        let low = b'A' + start as u8;
        let high = b'A' + end as u8;
        for &c in code.iter().filter(|&&c| c < low) {
            new_code.push(c);
        }
        for &c in fs_code {
            new_code.push(c + start as u8);
        }
        for &c in code.iter().filter(|&&c| c >= high) {
            new_code.push(c);
        }
        let mut annotations = ModeAnnotations::default();
        for (mode, list) in self.annotations.iter() {
            if *mode < start || *mode >= end {
                annotations.insert(*mode, list.clone());
            }
        }
        for (mode, list) in fs.annotations.iter() {
            annotations.insert(mode + start, list.clone());
        }
        Ok(FockState {
            m: self.m,
            n: new_n,
            code: Some(new_code),
            annotations,
        })
    }

    pub fn has_annotations(&self) -> bool {
        !self.annotations.is_empty()
    }

    pub fn has_polarization(&self) -> bool {
        self.annotations
            .values()
            .any(|list| list.iter().any(|(_, a)| a.has_polarization()))
    }

    pub fn clear_annotations(&mut self) {
        self.annotations.clear();
    }

    /// Flattened annotation list for one mode, one entry per photon; bare
    /// photons appear as empty annotations, padded at the tail.
    pub fn get_mode_annotations(&self, mode: usize) -> Result<Vec<Annotation>> {
        let occupation = self.occupation(mode)?;
        let mut out = Vec::with_capacity(occupation);
        if let Some(list) = self.annotations.get(&mode) {
            for (count, annotation) in list {
                for _ in 0..*count {
                    out.push(annotation.clone());
                }
            }
        }
        while out.len() < occupation {
            out.push(Annotation::new());
        }
        Ok(out)
    }

    /// Replace the annotations of one mode. Entries with identical canonical
    /// forms merge, empty annotations are dropped (those photons stay bare).
    pub fn set_mode_annotations(&mut self, mode: usize, annotations: &[Annotation]) -> Result<()> {
        let occupation = self.occupation(mode)?;
        if annotations.len() > occupation {
            return Err(Error::InvalidOperation(
                "invalid mode annotations".to_string(),
            ));
        }
        let mut merged: BTreeMap<String, (usize, Annotation)> = BTreeMap::new();
        for annotation in annotations {
            if annotation.is_empty() {
                continue;
            }
            merged
                .entry(annotation.to_str())
                .and_modify(|e| e.0 += 1)
                .or_insert((1, annotation.clone()));
        }
        if merged.is_empty() {
            self.annotations.remove(&mode);
        } else {
            self.annotations
                .insert(mode, merged.into_values().collect());
        }
        Ok(())
    }

    /// Annotation of the photon at index `photon_idx`, empty when bare.
    pub fn get_photon_annotation(&self, photon_idx: usize) -> Result<Annotation> {
        let mode = self.photon2mode(photon_idx)?;
        let list = match self.annotations.get(&mode) {
            Some(list) => list,
            None => return Ok(Annotation::new()),
        };
        let first_idx = self.mode2photon(mode)?.unwrap_or(photon_idx);
        let mut iter = list.iter();
        let mut current = iter.next();
        let mut in_run = 0usize;
        let mut idx = first_idx;
        while idx < photon_idx {
            in_run += 1;
            if let Some((count, _)) = current {
                if in_run == *count {
                    current = iter.next();
                    in_run = 0;
                }
            }
            idx += 1;
        }
        Ok(current
            .map(|(_, annotation)| annotation.clone())
            .unwrap_or_default())
    }

    /// Partition the photons into distinguishability groups and return one
    /// non-annotated state per group. Photons whose annotations are mutually
    /// compatible (see [`Annotation::compatible_annotation`]) stay together.
    /// When everything collapses to one group, the result is the original
    /// state with annotations cleared.
    pub fn separate_state(&self) -> Vec<FockState> {
        if self.n == 0 || self.code.is_none() || !self.has_annotations() {
            return vec![self.clone()];
        }
        let occupations = self.to_vect();
        let mut groups: Vec<(Annotation, Vec<usize>)> = Vec::new();
        for mode in 0..self.m {
            let mut flattened = Vec::with_capacity(occupations[mode]);
            if let Some(list) = self.annotations.get(&mode) {
                for (count, annotation) in list {
                    for _ in 0..*count {
                        flattened.push(annotation.clone());
                    }
                }
            }
            while flattened.len() < occupations[mode] {
                flattened.push(Annotation::new());
            }
            for photon_annotation in flattened {
                let mut placed = false;
                for (group_annotation, group_occupations) in groups.iter_mut() {
                    if let Some(merged) = group_annotation.compatible_annotation(&photon_annotation)
                    {
                        *group_annotation = merged;
                        group_occupations[mode] += 1;
                        placed = true;
                        break;
                    }
                }
                if !placed {
                    let mut group_occupations = vec![0usize; self.m];
                    group_occupations[mode] = 1;
                    groups.push((photon_annotation, group_occupations));
                }
            }
        }
        if groups.len() == 1 {
            let mut state = self.clone();
            state.clear_annotations();
            return vec![state];
        }
        groups
            .into_iter()
            .map(|(_, occupations)| FockState::from_occupations(&occupations))
            .collect()
    }

    /// Product over modes of the factorial of the occupation, the usual
    /// bosonic normalization factor.
    pub fn prodnfact(&self) -> u64 {
        let code: &[u8] = self.code.as_deref().unwrap_or(&[]);
        let mut product = 1u64;
        let mut i = 0;
        while i < code.len() {
            let mut k = 1u64;
            while i + (k as usize) < code.len() && code[i + k as usize] == code[i] {
                k += 1;
                product *= k;
            }
            i += k as usize;
        }
        product
    }

    /// DJB2 hash of the canonical textual form, so annotation-equivalent
    /// states share a hash.
    pub fn hash(&self) -> u64 {
        djb2(self.to_str(true).as_bytes())
    }

    /// Canonical textual form `|...>`. Annotated runs come first in each
    /// mode, prefixed by their count when above one; the remaining bare
    /// count is printed iff it is nonzero or the mode has no annotations.
    pub fn to_str(&self, show_annotations: bool) -> String {
        let mut out = String::from("|");
        match &self.code {
            Some(_) => {
                let mut remaining: Vec<i64> =
                    self.to_vect().into_iter().map(|c| c as i64).collect();
                let mut blocks: Vec<String> = vec![String::new(); self.m];
                if show_annotations {
                    for mode in 0..self.m {
                        if let Some(list) = self.annotations.get(&mode) {
                            for (count, annotation) in list {
                                if *count > 1 {
                                    blocks[mode].push_str(&count.to_string());
                                }
                                blocks[mode].push('{');
                                blocks[mode].push_str(&annotation.to_str());
                                blocks[mode].push('}');
                                remaining[mode] -= *count as i64;
                            }
                        }
                    }
                }
                for mode in 0..self.m {
                    if mode > 0 {
                        out.push(',');
                    }
                    out.push_str(&blocks[mode]);
                    if blocks[mode].is_empty() || remaining[mode] != 0 {
                        out.push_str(&remaining[mode].to_string());
                    }
                }
            }
            None => {
                for _ in 1..self.m {
                    out.push(',');
                }
            }
        }
        out.push('>');
        out
    }
}

impl PartialEq for FockState {
    fn eq(&self, other: &FockState) -> bool {
        if self.m != other.m || self.n != other.n {
            return false;
        }
        if self.m == 0 && other.m == 0 {
            return true;
        }
        match (&self.code, &other.code) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                if a != b || self.annotations.len() != other.annotations.len() {
                    return false;
                }
                // canonical lists have unique forms per mode, so one-way
                // containment plus the length check is equality
                self.annotations.iter().all(|(mode, list)| {
                    other.annotations.get(mode).is_some_and(|other_list| {
                        list.iter().all(|(count, annotation)| {
                            let form = annotation.to_str();
                            other_list
                                .iter()
                                .any(|(oc, oa)| oc == count && oa.to_str() == form)
                        })
                    })
                })
            }
            _ => false,
        }
    }
}

impl fmt::Display for FockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str(true))
    }
}

impl FromStr for FockState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FockState::parse(s)
    }
}
