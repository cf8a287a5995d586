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

use once_cell::sync::Lazy;
use std::env;

/// Maximum number of generated layer buffers to keep in the process-wide cache.
///
/// Set via the `FOCKSPACE_CACHE_SIZE` environment variable:
/// ```bash
/// export FOCKSPACE_CACHE_SIZE=[INTEGER]
/// ```
///
/// Default is 64 layers with LRU eviction. Each cached layer holds the full
/// code buffer for one (modes, photons, mask) combination, so memory usage
/// grows with C(m+n-1, n) * n bytes per entry - size the cache accordingly
/// when working with large photon counts.
pub static LAYER_CACHE_SIZE: Lazy<usize> = Lazy::new(|| {
    env::var("FOCKSPACE_CACHE_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(64)
});

/// Global flag to disable the layer caching system.
///
/// Set via the `FOCKSPACE_DISABLE_CACHE` environment variable. Accepted
/// disabling values are "1", "true" and "yes" (case insensitive); anything
/// else, the empty string, or an unset variable keeps the cache enabled.
///
/// Disabling is mostly useful when debugging layer generation or measuring
/// the raw enumeration cost without cache hits.
pub static DISABLE_CACHE: Lazy<bool> =
    Lazy::new(|| match env::var("FOCKSPACE_DISABLE_CACHE") {
        Ok(val) => {
            let val_lower = val.to_lowercase();
            val_lower == "1" || val_lower == "true" || val_lower == "yes"
        }
        Err(_) => false,
    });

/// Worker thread count used by the parallel permanent kernel when the caller
/// passes `nthreads = 0`.
///
/// Set via the `FOCKSPACE_NUM_THREADS` environment variable. When unset or 0,
/// the platform's available parallelism is used instead.
pub static NUM_THREADS: Lazy<usize> = Lazy::new(|| {
    env::var("FOCKSPACE_NUM_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
});

/// Resolve an `nthreads` argument: 0 defers to [`NUM_THREADS`], then to the
/// platform's hardware concurrency.
pub(crate) fn resolve_nthreads(nthreads: usize) -> usize {
    if nthreads != 0 {
        return nthreads;
    }
    if *NUM_THREADS != 0 {
        return *NUM_THREADS;
    }
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}
