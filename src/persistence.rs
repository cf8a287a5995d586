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

//! On-disk formats for generated layers and maps. Persistence only; nothing
//! in the algorithmic core needs these files.
//!
//! FSA file: magic `FSA`, version byte (2), decimal ASCII count + NUL (since
//! v2), one byte m, one byte n, then `count * n` code bytes.
//!
//! FSM file: magic `FSM`, version byte (1), one byte m, one byte n (parent
//! photons), then `count * m * step` table bytes. The parent count and cell
//! width are derived from the unmasked binomials, so only unmasked maps
//! round-trip through a file.

use crate::caching::CachedLayer;
use crate::error::{Error, Result};
use crate::fs_array::{layer_count, FSArray};
use crate::fs_map::FSMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub(crate) const FSA_MAGIC: &[u8] = b"FSA";
pub(crate) const FSA_VERSION: u8 = 2;
pub(crate) const FSM_MAGIC: &[u8] = b"FSM";
pub(crate) const FSM_VERSION: u8 = 1;

fn bad_format(reason: &str) -> Error {
    Error::InvalidArgument(reason.to_string())
}

/// A directory path resolves to the templated `layer-m<M>-n<N>.<ext>` name
/// inside it; anything else is used as-is.
fn resolve_path(path: &Path, m: Option<usize>, n: Option<usize>, ext: &str) -> Result<PathBuf> {
    if path.is_dir() {
        let (m, n) = match (m, n) {
            (Some(m), Some(n)) => (m, n),
            _ => {
                return Err(bad_format(
                    "m and n are required when passing a directory",
                ))
            }
        };
        Ok(path.join(format!("layer-m{}-n{}.{}", m, n, ext)))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_byte_sized(value: usize, what: &str) -> Result<u8> {
    u8::try_from(value).map_err(|_| bad_format(&format!("{} does not fit the file header", what)))
}

impl FSArray {
    /// Write the generated layer. `path` may be a directory, in which case
    /// the templated `layer-m<M>-n<N>.fsa` name is used.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = resolve_path(path.as_ref(), Some(self.m()), Some(self.n()), "fsa")?;
        self.generate();
        let mut header = Vec::with_capacity(16);
        header.extend_from_slice(FSA_MAGIC);
        header.push(FSA_VERSION);
        header.extend_from_slice(self.count().to_string().as_bytes());
        header.push(0);
        header.push(check_byte_sized(self.m(), "mode count")?);
        header.push(check_byte_sized(self.n(), "photon count")?);
        let mut file = fs::File::create(path)?;
        file.write_all(&header)?;
        file.write_all(self.raw())?;
        Ok(())
    }

    /// Read a layer back. When `path` is a directory, `m` and `n` select the
    /// templated file name; when it is a file they only validate the header.
    pub fn load<P: AsRef<Path>>(path: P, m: Option<usize>, n: Option<usize>) -> Result<FSArray> {
        let path = resolve_path(path.as_ref(), m, n, "fsa")?;
        let bytes = fs::read(path)?;
        if bytes.len() < 4 || &bytes[..3] != FSA_MAGIC {
            return Err(bad_format("not a fs-array file"));
        }
        let version = bytes[3];
        let mut cursor = 4usize;
        let mut count: Option<u64> = None;
        if version >= 2 {
            let nul = bytes[cursor..]
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| bad_format("truncated fs-array header"))?;
            let text = std::str::from_utf8(&bytes[cursor..cursor + nul])
                .map_err(|_| bad_format("bad count field"))?;
            count = Some(text.parse().map_err(|_| bad_format("bad count field"))?);
            cursor += nul + 1;
        } else if version != 1 {
            return Err(bad_format("unsupported fs-array version"));
        }
        if bytes.len() < cursor + 2 {
            return Err(bad_format("truncated fs-array header"));
        }
        let file_m = bytes[cursor] as usize;
        let file_n = bytes[cursor + 1] as usize;
        cursor += 2;
        if m.is_some_and(|m| m != file_m) || n.is_some_and(|n| n != file_n) {
            return Err(bad_format("file does not hold the requested layer"));
        }
        let count = count.unwrap_or_else(|| layer_count(file_m, file_n));
        let codes = &bytes[cursor..];
        if codes.len() as u64 != count * file_n as u64 {
            return Err(bad_format("fs-array body does not match its header"));
        }
        Ok(FSArray::from_layer(
            file_m,
            file_n,
            CachedLayer {
                buffer: codes.to_vec(),
                count,
                hash: 0,
            },
        ))
    }
}

impl FSMap {
    /// Write the generated table. `path` may be a directory, in which case
    /// the templated `layer-m<M>-n<N>.fsm` name is used.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = resolve_path(path.as_ref(), Some(self.m()), Some(self.n()), "fsm")?;
        self.generate();
        let header = [
            FSM_MAGIC[0],
            FSM_MAGIC[1],
            FSM_MAGIC[2],
            FSM_VERSION,
            check_byte_sized(self.m(), "mode count")?,
            check_byte_sized(self.n(), "photon count")?,
        ];
        let mut file = fs::File::create(path)?;
        file.write_all(&header)?;
        file.write_all(self.raw())?;
        Ok(())
    }

    /// Read a map back. The parent count and cell width are recomputed from
    /// the unmasked binomials of (m, n).
    pub fn load<P: AsRef<Path>>(path: P, m: Option<usize>, n: Option<usize>) -> Result<FSMap> {
        let path = resolve_path(path.as_ref(), m, n, "fsm")?;
        let bytes = fs::read(path)?;
        if bytes.len() < 6 || &bytes[..3] != FSM_MAGIC {
            return Err(bad_format("not a fs-map file"));
        }
        if bytes[3] != FSM_VERSION {
            return Err(bad_format("unsupported fs-map version"));
        }
        let file_m = bytes[4] as usize;
        let file_n = bytes[5] as usize;
        if m.is_some_and(|m| m != file_m) || n.is_some_and(|n| n != file_n) {
            return Err(bad_format("file does not hold the requested map"));
        }
        let count = layer_count(file_m, file_n);
        let child_count = layer_count(file_m, file_n + 1);
        let mut step = 0usize;
        let mut c = child_count + 1;
        while c > 0 {
            step += 1;
            c >>= 8;
        }
        let table = &bytes[6..];
        if table.len() as u64 != count * (file_m * step) as u64 {
            return Err(bad_format("fs-map body does not match its header"));
        }
        Ok(FSMap::from_parts(
            file_m,
            file_n,
            step,
            count,
            child_count,
            table.to_vec(),
        ))
    }
}
