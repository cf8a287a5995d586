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
use crate::fockstate::FockState;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A constraint on the Fock space used to keep [`FSArray`](crate::FSArray)
/// and [`FSMap`](crate::FSMap) from exploding combinatorially when only an
/// identified subset matters, e.g. because of heralding conditions.
///
/// A mask is a list of inclusive conditions (OR). Each condition is a string
/// of length m where:
/// - `' '` puts no constraint on the mode,
/// - a char in `0x30..0x50` requires exactly `char - 0x30` photons in the
///   mode (up to 32 photons).
///
/// A mask is defined for a given photon count n. A state that is not fully
/// populated may still match as long as the missing photons could fill the
/// deficits; extraneous photons in a constrained mode never match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FSMask {
    m: usize,
    n: usize,
    conditions: SmallVec<[String; 2]>,
}

fn check_condition(condition: &str, m: usize) -> Result<()> {
    if condition.len() != m {
        return Err(Error::InvalidArgument(format!(
            "mask condition must have one char per mode ({} != {})",
            condition.len(),
            m
        )));
    }
    for c in condition.bytes() {
        if c != b' ' && !(0x30..0x50).contains(&c) {
            return Err(Error::InvalidArgument(
                "mask condition chars must be ' ' or in 0x30..0x50".to_string(),
            ));
        }
    }
    Ok(())
}

impl FSMask {
    /// Unconstrained mask: matches everything.
    pub fn new(m: usize, n: usize) -> Self {
        FSMask {
            m,
            n,
            conditions: SmallVec::new(),
        }
    }

    pub fn with_condition(m: usize, n: usize, condition: &str) -> Result<Self> {
        FSMask::with_conditions(m, n, &[condition])
    }

    pub fn with_conditions(m: usize, n: usize, conditions: &[&str]) -> Result<Self> {
        let mut mask = FSMask::new(m, n);
        for condition in conditions {
            check_condition(condition, m)?;
            mask.conditions.push((*condition).to_string());
        }
        Ok(mask)
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub(crate) fn conditions(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(|c| c.as_str())
    }

    /// Whether the state satisfies at least one condition (or there are no
    /// conditions at all). With `allow_missing`, up to `n - fs.n()` photons
    /// may still be missing from constrained modes; a surplus in a
    /// constrained mode always fails.
    pub fn matches(&self, fs: &FockState, allow_missing: bool) -> bool {
        if self.conditions.is_empty() {
            return true;
        }
        let occupations = fs.to_vect();
        for condition in &self.conditions {
            let mut allowed_errors: i64 = if allow_missing {
                self.n as i64 - fs.n() as i64
            } else {
                0
            };
            for (i, c) in condition.bytes().enumerate() {
                if allowed_errors < 0 || i >= self.m {
                    break;
                }
                if (0x30..0x50).contains(&c) {
                    let required = (c - 0x30) as i64;
                    let occupation = occupations.get(i).copied().unwrap_or(0) as i64;
                    if occupation > required {
                        allowed_errors = -1;
                    } else {
                        allowed_errors -= required - occupation;
                    }
                }
            }
            if allowed_errors >= 0 {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mask_matches_everything() {
        let mask = FSMask::new(3, 2);
        assert!(mask.matches(&FockState::from_occupations(&[2, 0, 0]), true));
        assert!(mask.matches(&FockState::from_occupations(&[0, 1, 1]), false));
    }

    #[test]
    fn test_condition_validation() {
        assert!(FSMask::with_condition(3, 2, " 1").is_err());
        assert!(FSMask::with_condition(3, 2, " 1z").is_err());
        assert!(FSMask::with_condition(3, 2, " 1 ").is_ok());
    }

    #[test]
    fn test_exact_matching() {
        let mask = FSMask::with_condition(5, 3, " 1 1 ").unwrap();
        assert!(mask.matches(&FockState::from_occupations(&[0, 1, 0, 1, 1]), true));
        assert!(mask.matches(&FockState::from_occupations(&[1, 1, 0, 1, 0]), true));
        // surplus never matches
        assert!(!mask.matches(&FockState::from_occupations(&[0, 2, 0, 1, 0]), true));
    }

    #[test]
    fn test_missing_photons() {
        let mask = FSMask::with_condition(5, 3, " 1 1 ").unwrap();
        // two photons placed, one still missing: the deficit is allowed
        assert!(mask.matches(&FockState::from_occupations(&[0, 1, 0, 0, 1]), true));
        assert!(!mask.matches(&FockState::from_occupations(&[0, 1, 0, 0, 1]), false));
        // two deficits but only one photon missing
        assert!(!mask.matches(&FockState::from_occupations(&[0, 0, 0, 0, 2]), true));
    }

    #[test]
    fn test_disjunction() {
        let mask = FSMask::with_conditions(2, 2, &["2 ", " 2"]).unwrap();
        assert!(mask.matches(&FockState::from_occupations(&[2, 0]), true));
        assert!(mask.matches(&FockState::from_occupations(&[0, 2]), true));
        assert!(!mask.matches(&FockState::from_occupations(&[1, 1]), true));
    }
}
