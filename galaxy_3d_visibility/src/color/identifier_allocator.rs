/// Identifier allocator
///
/// Hands out one color code per probe instance and
/// keeps the reverse color → fragment mapping.
///
/// One allocator lives for one scene build. A reload replaces it, so codes
/// are never reused within a session: exhausting the space fails with
/// `CapacityExceeded` and registering a code twice fails with
/// `ColorCollision`.

use rustc_hash::FxHashMap;
use crate::engine_fail;
use crate::error::{Error, Result};
use crate::fragment::FragmentId;
use super::color_code::{ColorCode, ColorCounter};

const SOURCE: &str = "galaxy3d::IdentifierAllocator";

pub struct IdentifierAllocator {
    counter: ColorCounter,
    color_to_fragment: FxHashMap<ColorCode, FragmentId>,
}

impl IdentifierAllocator {
    pub fn new() -> Self {
        Self {
            counter: ColorCounter::new(),
            color_to_fragment: FxHashMap::default(),
        }
    }

    /// Next unused color code.
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` once all 256³ − 1 codes have been issued.
    pub fn next(&mut self) -> Result<ColorCode> {
        self.counter.next_code().ok_or_else(|| {
            engine_fail!(SOURCE, Error::CapacityExceeded { capacity: ColorCounter::CAPACITY })
        })
    }

    /// Map `code` to `fragment`.
    ///
    /// # Errors
    ///
    /// `ColorCollision` if `code` is the background or is already mapped.
    /// The existing mapping is left untouched.
    pub fn register(&mut self, code: ColorCode, fragment: FragmentId) -> Result<()> {
        if code.is_background() {
            return Err(engine_fail!(SOURCE, Error::ColorCollision { code, existing: None }));
        }
        if let Some(existing) = self.color_to_fragment.get(&code) {
            return Err(engine_fail!(SOURCE, Error::ColorCollision {
                code,
                existing: Some(existing.clone()),
            }));
        }
        self.color_to_fragment.insert(code, fragment);
        Ok(())
    }

    /// `next()` followed by `register()`.
    pub fn allocate(&mut self, fragment: FragmentId) -> Result<ColorCode> {
        let code = self.next()?;
        self.register(code, fragment)?;
        Ok(code)
    }

    /// Fragment owning `code`, or None for background / unknown codes.
    pub fn resolve(&self, code: &ColorCode) -> Option<&FragmentId> {
        self.color_to_fragment.get(code)
    }

    /// Number of registered codes
    pub fn len(&self) -> usize {
        self.color_to_fragment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.color_to_fragment.is_empty()
    }

    /// Number of codes issued by `next()`
    pub fn issued(&self) -> u32 {
        self.counter.issued()
    }

    pub fn remaining(&self) -> u32 {
        self.counter.remaining()
    }

    #[cfg(test)]
    pub(crate) fn counter_mut(&mut self) -> &mut ColorCounter {
        &mut self.counter
    }
}

impl Default for IdentifierAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "identifier_allocator_tests.rs"]
mod tests;
