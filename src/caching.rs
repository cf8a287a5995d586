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

use crate::environment::{DISABLE_CACHE, LAYER_CACHE_SIZE};
use crate::fs_mask::FSMask;
use lru::LruCache;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

/// A fully generated layer: the concatenation of all n-byte codes of the
/// matching states, in lexicographic order.
#[derive(Serialize, Deserialize, Clone)]
pub(crate) struct CachedLayer {
    pub buffer: Vec<u8>,
    pub count: u64,
    pub hash: u64,
}

pub(crate) struct ModuleState {
    pub layer_cache: Mutex<LruCache<u64, Arc<CachedLayer>>>,
}

pub(crate) static MODULE_STATE: Lazy<ModuleState> = Lazy::new(|| ModuleState {
    layer_cache: Mutex::new(LruCache::new(
        std::num::NonZeroUsize::new(*LAYER_CACHE_SIZE).unwrap(),
    )),
});

/// Cache key for one (m, n, mask) layer. The mask's own photon count and its
/// conditions both take part in the key: the same condition strings written
/// for a different target photon count tolerate a different deficit and
/// match a different set of states.
pub(crate) fn get_layer_cache_key(m: usize, n: usize, mask: Option<&FSMask>) -> u64 {
    let mut hasher = DefaultHasher::new();
    m.hash(&mut hasher);
    n.hash(&mut hasher);
    if let Some(mask) = mask {
        mask.n().hash(&mut hasher);
        for condition in mask.conditions() {
            condition.hash(&mut hasher);
        }
    }
    hasher.finish()
}

pub(crate) fn get_cached_layer(hash: u64) -> Option<Arc<CachedLayer>> {
    if *DISABLE_CACHE {
        return None;
    }

    let mut cache = MODULE_STATE.layer_cache.lock().unwrap();
    cache.get(&hash).map(Arc::clone)
}

pub(crate) fn insert_layer_to_cache(layer: CachedLayer, cache_key: u64) -> Arc<CachedLayer> {
    let layer = Arc::new(layer);
    if !*DISABLE_CACHE {
        let mut cache = MODULE_STATE.layer_cache.lock().unwrap();
        cache.put(cache_key, Arc::clone(&layer));
    }
    layer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_keys_for_distinct_layers() {
        let k1 = get_layer_cache_key(3, 2, None);
        let k2 = get_layer_cache_key(3, 3, None);
        let k3 = get_layer_cache_key(2, 3, None);
        assert_ne!(k1, k2);
        assert_ne!(k2, k3);

        let mask = FSMask::with_condition(3, 2, " 1 ").unwrap();
        let k4 = get_layer_cache_key(3, 2, Some(&mask));
        assert_ne!(k1, k4);

        // same conditions, different target photon count: different deficit
        // budget, different matched layer, must not share a key
        let mask5 = FSMask::with_condition(3, 5, " 1 ").unwrap();
        let k5 = get_layer_cache_key(3, 2, Some(&mask5));
        assert_ne!(k4, k5);
    }

    #[test]
    fn test_insert_then_get() {
        let key = get_layer_cache_key(250, 250, None);
        let layer = CachedLayer {
            buffer: vec![b'A', b'B'],
            count: 1,
            hash: key,
        };
        let inserted = insert_layer_to_cache(layer, key);
        let fetched = get_cached_layer(key).expect("layer should be cached");
        assert_eq!(fetched.buffer, inserted.buffer);
        assert_eq!(fetched.count, 1);
    }
}
