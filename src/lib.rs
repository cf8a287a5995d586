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

//! Core numerical and combinatorial engine for linear-optical quantum
//! simulation: Fock state algebra with photon annotations, layered Fock
//! space enumeration with layer-to-layer transition tables (the SLOS
//! recurrence), and matrix permanent kernels (threaded Ryser, Glynn,
//! Clifford-Clifford sub-permanents).

mod annotation;
mod caching;
pub mod environment;
mod error;
mod fockstate;
mod fs_array;
mod fs_map;
mod fs_mask;
mod permanent;
mod persistence;

pub use annotation::Annotation;
pub use error::{Error, Result};
pub use fockstate::FockState;
pub use fs_array::{FSArray, FSArrayIter, FS_NPOS};
pub use fs_map::FSMap;
pub use fs_mask::FSMask;
pub use permanent::{
    permanent, permanent_glynn, permanent_ryser, sub_permanents, PermanentScalar,
    PermanentStrategy,
};
