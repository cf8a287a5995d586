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
use num_complex::Complex32;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

/// An ordered tag -> complex value mapping attached to a group of photons.
///
/// Tags make otherwise identical photons distinguishable. The tag `P` is
/// special: its value is a point on the Poincare sphere and the six letters
/// `H`, `V`, `D`, `A`, `R`, `L` are accepted as shorthands for the canonical
/// polarization pairs.
///
/// The textual form is `TAG1:VALUE1,TAG2:VALUE2,...` where a value is either
/// a polarization letter (tag `P` only), a real number, a pure-imaginary
/// number (`1i`, `-2j`), a `re+imi` sum, or an explicit `(re,im)` pair.
/// Tags are kept sorted, so two equal annotations always print the same.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    values: BTreeMap<String, Complex32>,
}

const POLARIZATIONS: [(char, Complex32); 6] = [
    ('H', Complex32::new(0.0, 0.0)),
    ('V', Complex32::new(PI, 0.0)),
    ('D', Complex32::new(PI / 2.0, 0.0)),
    ('A', Complex32::new(PI / 2.0, PI)),
    ('L', Complex32::new(PI / 2.0, PI / 2.0)),
    ('R', Complex32::new(PI / 2.0, 3.0 * PI / 2.0)),
];

/// Longest float prefix of `s`: `[+-]?digits[.digits][e[+-]digits]`.
/// Returns the parsed value and the number of bytes consumed.
fn float_prefix(s: &str) -> Option<(f32, usize)> {
    let b = s.as_bytes();
    let mut i = 0;
    if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }
    let mut digits = 0;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
        digits += 1;
    }
    if i < b.len() && b[i] == b'.' {
        i += 1;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let mut j = i + 1;
        if j < b.len() && (b[j] == b'+' || b[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    s[..i].parse().ok().map(|v| (v, i))
}

fn invalid(reason: &str) -> Error {
    Error::InvalidAnnotation(reason.to_string())
}

/// Parse one value string: polarization letter (tag `P` only), `(re,im)`
/// pair, real, pure imaginary, or `re+imi` sum. The whole string must be
/// consumed.
fn parse_value(tag: &str, value: &str) -> Result<Complex32> {
    if tag == "P" && value.len() == 1 {
        let c = value.chars().next().unwrap();
        if c.is_ascii_uppercase() {
            return POLARIZATIONS
                .iter()
                .find(|(letter, _)| *letter == c)
                .map(|(_, v)| *v)
                .ok_or_else(|| invalid("unknown polarization value"));
        }
    }
    // (re,im)
    if let Some(inner) = value.strip_prefix('(') {
        let inner = inner
            .strip_suffix(')')
            .ok_or_else(|| invalid("cannot parse value"))?;
        let (re_str, im_str) = inner
            .split_once(',')
            .ok_or_else(|| invalid("cannot parse value"))?;
        let re: f32 = re_str.parse().map_err(|_| invalid("cannot parse value"))?;
        let im: f32 = im_str.parse().map_err(|_| invalid("cannot parse value"))?;
        return Ok(Complex32::new(re, im));
    }
    let (first, mut used) = float_prefix(value).ok_or_else(|| invalid("cannot parse value"))?;
    let rest = &value[used..];
    if rest.is_empty() {
        return Ok(Complex32::new(first, 0.0));
    }
    if rest == "i" || rest == "j" {
        return Ok(Complex32::new(0.0, first));
    }
    // re+imi / re-imi
    let sign = match rest.as_bytes()[0] {
        b'+' => 1.0,
        b'-' => -1.0,
        _ => return Err(invalid("cannot parse value")),
    };
    used += 1;
    let tail = &value[used..];
    let (im, im_used) = float_prefix(tail).ok_or_else(|| invalid("cannot parse value"))?;
    match &tail[im_used..] {
        "i" | "j" => Ok(Complex32::new(first, sign * im)),
        _ => Err(invalid("cannot parse value")),
    }
}

fn valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Annotation {
    /// The empty annotation, i.e. a bare photon.
    pub fn new() -> Self {
        Self::default()
    }

    /// Single entry annotation.
    pub fn single(tag: &str, value: Complex32) -> Self {
        let mut values = BTreeMap::new();
        values.insert(tag.to_string(), value);
        Annotation { values }
    }

    /// Read a `KEY1:VALUE1,KEY2:VALUE2,...` annotation. The empty string is
    /// the empty annotation.
    pub fn parse(s: &str) -> Result<Annotation> {
        let mut annotation = Annotation::new();
        if s.is_empty() {
            return Ok(annotation);
        }
        let mut rest = s;
        loop {
            let sep = rest
                .find(':')
                .ok_or_else(|| invalid("no key-value separator"))?;
            let tag = &rest[..sep];
            if tag.is_empty() || !valid_tag(tag) {
                return Err(invalid("invalid key format"));
            }
            // scan the value up to the next top-level comma
            let after = &rest[sep + 1..];
            let mut level = 0i32;
            let mut end = after.len();
            for (i, c) in after.char_indices() {
                match c {
                    '(' => level += 1,
                    ')' => level -= 1,
                    ',' if level == 0 => {
                        end = i;
                        break;
                    }
                    _ => {}
                }
            }
            let value = parse_value(tag, &after[..end])?;
            if annotation.values.contains_key(tag) {
                return Err(invalid("duplicate tag"));
            }
            annotation.values.insert(tag.to_string(), value);
            rest = &after[end..];
            if let Some(stripped) = rest.strip_prefix(',') {
                rest = stripped;
            }
            if rest.is_empty() {
                break;
            }
        }
        Ok(annotation)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.values.contains_key(tag)
    }

    pub fn has_polarization(&self) -> bool {
        self.has_tag("P")
    }

    /// Value of `tag`, or `default` when the tag is absent.
    pub fn get(&self, tag: &str, default: Complex32) -> Complex32 {
        self.values.get(tag).copied().unwrap_or(default)
    }

    pub fn set(&mut self, tag: &str, value: Complex32) {
        self.values.insert(tag.to_string(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Complex32)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Canonical form of one value: the polarization letter when the tag is
    /// `P` and the value is exactly one of the six canonical pairs, the bare
    /// real part when the imaginary part is zero, a `(re,im)` pair otherwise.
    pub fn str_value(&self, tag: &str) -> String {
        let value = match self.values.get(tag) {
            Some(v) => *v,
            None => return String::new(),
        };
        if tag == "P" {
            for (letter, pol) in POLARIZATIONS.iter() {
                if value == *pol {
                    return letter.to_string();
                }
            }
        }
        if value.im == 0.0 {
            format!("{}", value.re)
        } else {
            format!("({},{})", value.re, value.im)
        }
    }

    /// Canonical textual form. Entries come out sorted by tag, so equal
    /// annotations always produce identical strings.
    pub fn to_str(&self) -> String {
        let mut out = String::new();
        for (i, tag) in self.values.keys().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(tag);
            out.push(':');
            out.push_str(&self.str_value(tag));
        }
        out
    }

    /// Try to merge `other` into a copy of `self`. Tags absent from `self`
    /// are inserted; tags present with the same value are kept; a differing
    /// value means the two annotations describe distinguishable photons and
    /// `None` is returned. The `P` tag never takes part in the merge.
    pub fn compatible_annotation(&self, other: &Annotation) -> Option<Annotation> {
        let mut merged = self.clone();
        for (tag, value) in other.values.iter() {
            if tag == "P" {
                continue;
            }
            match self.values.get(tag) {
                None => {
                    merged.values.insert(tag.clone(), *value);
                }
                Some(existing) if existing == value => {}
                Some(_) => return None,
            }
        }
        Some(merged)
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str())
    }
}

impl FromStr for Annotation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Annotation::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_incorrect_annotations() {
        for txt in [
            "12:0",
            "test",
            "test:",
            "test:a",
            "test:0,op",
            "test:(1234)",
            "test:(1234,2i)",
            "P:X",
            "P:0+1",
            "P:1i+0",
            "P:1i+1i",
            "P:1+i",
            ":0",
            "P:D,P:H",
        ] {
            assert!(Annotation::parse(txt).is_err(), "{:?} should fail", txt);
        }
        assert_eq!(Annotation::parse("P:D,p:0").unwrap().len(), 2);
    }

    #[test]
    fn test_parse_real_value_annotations() {
        let a1 = Annotation::parse("_:0").unwrap();
        assert_eq!(a1.get("_", Complex32::new(9.0, 9.0)), Complex32::new(0.0, 0.0));
        assert_eq!(a1.to_str(), "_:0");

        let a2 = Annotation::parse("test:-1.345").unwrap();
        assert_eq!(a2.get("test", Complex32::default()), Complex32::new(-1.345, 0.0));
        assert_eq!(a2.to_str(), "test:-1.345");
        assert!(!a2.has_tag("_"));
    }

    #[test]
    fn test_parse_complex_value_annotations() {
        let a1 = Annotation::parse("_:1i").unwrap();
        assert_eq!(a1.get("_", Complex32::default()), Complex32::new(0.0, 1.0));
        assert_eq!(a1.to_str(), "_:(0,1)");

        let a2 = Annotation::parse("AB12:2-3i").unwrap();
        assert_eq!(a2.get("AB12", Complex32::default()), Complex32::new(2.0, -3.0));
        assert_eq!(a2.to_str(), "AB12:(2,-3)");

        let a3 = Annotation::parse("AB12:2+3e-4i").unwrap();
        assert_eq!(a3.get("AB12", Complex32::default()), Complex32::new(2.0, 0.0003));

        let a4 = Annotation::parse("AB_12:2+-3e-4i").unwrap();
        assert_eq!(a4.get("AB_12", Complex32::default()), Complex32::new(2.0, -0.0003));

        let a5 = Annotation::parse("_:1j").unwrap();
        assert_eq!(a5.to_str(), "_:(0,1)");
    }

    #[test]
    fn test_parse_multi_entry() {
        let a = Annotation::parse("P:V,Energy:86").unwrap();
        assert_eq!(a.len(), 2);
        assert!(a.has_tag("P"));
        assert!(a.has_polarization());
        assert_eq!(a.get("P", Complex32::default()), Complex32::new(PI, 0.0));
        assert_eq!(a.get("Energy", Complex32::default()), Complex32::new(86.0, 0.0));
    }

    #[test]
    fn test_parse_pair_annotations() {
        let a1 = Annotation::parse("_:(0.3,-0.5)").unwrap();
        assert_eq!(a1.get("_", Complex32::default()), Complex32::new(0.3, -0.5));
        assert_eq!(a1.to_str(), "_:(0.3,-0.5)");
    }

    #[test]
    fn test_parse_polarization_annotations() {
        let a1 = Annotation::parse("P:(0.3,-0.5)").unwrap();
        assert_eq!(a1.to_str(), "P:(0.3,-0.5)");

        for (letter, expected) in POLARIZATIONS.iter() {
            let a = Annotation::parse(&format!("P:{}", letter)).unwrap();
            assert_eq!(a.get("P", Complex32::new(-1.0, -1.0)), *expected);
            assert_eq!(a.to_str(), format!("P:{}", letter));
        }

        // a non-canonical pair equal to a canonical one collapses to the letter
        let a2 = Annotation::parse("P:(0,0)").unwrap();
        assert_eq!(a2.to_str(), "P:H");
    }

    #[test]
    fn test_compatible_annotation() {
        let a = Annotation::parse("_:1,color:2").unwrap();
        let b = Annotation::parse("_:1,t:3").unwrap();
        let merged = a.compatible_annotation(&b).unwrap();
        assert_eq!(merged.to_str(), "_:1,color:2,t:3");

        let c = Annotation::parse("_:2").unwrap();
        assert!(a.compatible_annotation(&c).is_none());

        // polarization does not take part in the merge
        let d = Annotation::parse("P:H").unwrap();
        let e = Annotation::parse("P:V").unwrap();
        assert_eq!(d.compatible_annotation(&e).unwrap().to_str(), "P:H");

        // empty annotation merges with anything
        let empty = Annotation::new();
        assert_eq!(empty.compatible_annotation(&a).unwrap().to_str(), a.to_str());
    }

    #[test]
    fn test_equality_is_by_content() {
        let a = Annotation::parse("x:1,y:2").unwrap();
        let b = Annotation::parse("y:2,x:1").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_str(), b.to_str());
    }
}
