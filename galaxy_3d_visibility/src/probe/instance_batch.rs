/// Instance batches
///
/// GPU-ready per-instance data for one probe group.
///
/// Building a batch allocates one color code per instance, in input
/// order, and registers it against the instance's fragment.

use bytemuck::{Pod, Zeroable};
use rustc_hash::FxHashMap;
use crate::color::{ColorCode, IdentifierAllocator};
use crate::engine_fail;
use crate::error::{Error, Result};
use crate::fragment::{FragmentId, InstanceBox};

const SOURCE: &str = "galaxy3d::InstanceBatch";

/// Which probe group a batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderGroup {
    /// Present in both passes
    Opaque,
    /// Added to the probe scene for the transparent pass only
    Transparent,
}

/// Per-instance vertex data: world transform + flat color.
///
/// Layout (80 bytes): `transform` as 4 column vectors, then `color` as
/// normalized RGBA. Matches a `mat4 + vec4` per-instance attribute block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ProbeInstance {
    pub transform: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl ProbeInstance {
    pub fn new(instance: &InstanceBox, code: ColorCode) -> Self {
        Self {
            transform: instance.transform.to_cols_array_2d(),
            color: code.to_unorm(),
        }
    }
}

/// Instance data for one render group, ready for upload.
#[derive(Debug, Clone)]
pub struct InstanceBatch {
    group: RenderGroup,
    instances: Vec<ProbeInstance>,
    codes: Vec<ColorCode>,
}

impl InstanceBatch {
    /// Allocate and register a color for every box of `boxes`.
    ///
    /// # Errors
    ///
    /// - `UnmappedInstance` if a box's key is missing from `instance_to_fragment`
    /// - `CapacityExceeded` / `ColorCollision` from the allocator
    ///
    /// On error the batch is abandoned; codes already registered stay
    /// registered, so the caller must discard the allocator as well.
    pub fn build(
        group: RenderGroup,
        boxes: &[InstanceBox],
        instance_to_fragment: &FxHashMap<u32, FragmentId>,
        allocator: &mut IdentifierAllocator,
    ) -> Result<Self> {
        let mut instances = Vec::with_capacity(boxes.len());
        let mut codes = Vec::with_capacity(boxes.len());

        for instance in boxes {
            let fragment = instance_to_fragment
                .get(&instance.instance_key)
                .ok_or_else(|| engine_fail!(SOURCE, Error::UnmappedInstance(instance.instance_key)))?;
            let code = allocator.allocate(fragment.clone())?;
            instances.push(ProbeInstance::new(instance, code));
            codes.push(code);
        }

        Ok(Self { group, instances, codes })
    }

    pub fn group(&self) -> RenderGroup {
        self.group
    }

    pub fn instances(&self) -> &[ProbeInstance] {
        &self.instances
    }

    /// Color of each instance, index-aligned with `instances()`
    pub fn codes(&self) -> &[ColorCode] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Raw bytes of the instance array, for a vertex/storage buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

#[cfg(test)]
#[path = "instance_batch_tests.rs"]
mod tests;
