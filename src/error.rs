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

use thiserror::Error;

/// Errors surfaced at the API boundary. Callers are expected to match on the
/// kind; no retries are performed inside the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed annotation text, duplicate tag, or unknown polarization letter.
    #[error("invalid annotation ({0})")]
    InvalidAnnotation(String),

    /// Malformed fock state text: bad opener/closer, extra characters,
    /// annotation on zero photons, unbalanced braces.
    #[error("invalid fock state representation ({0})")]
    InvalidFockState(String),

    /// Arithmetic or tensor operation on an undefined state, dimension
    /// mismatch, zero-step slice, set-slice window size mismatch.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Mode or photon index outside its valid interval.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Bad input to a kernel: wrong buffer shape, integer glynn, ...
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Scratch buffer allocation failure inside a permanent kernel.
    #[error("out of memory")]
    OutOfMemory,

    /// Persistence only.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
