//! Fragments and the scene-build input handed over by the loader.
//!
//! A fragment is a named group of geometry. The loader describes each
//! placed occurrence (instance) by an integer key and a transform, split
//! into opaque and transparent groups, plus a key → fragment mapping.

use std::fmt;
use std::sync::Arc;
use glam::Mat4;
use rustc_hash::FxHashMap;

/// Identifier of a renderable fragment.
///
/// Cheap to clone: the name is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(Arc<str>);

impl FragmentId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FragmentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FragmentId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One instance of a fragment's bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceBox {
    /// Loader-side instance key, resolved through `FragmentBoxes::instance_to_fragment`
    pub instance_key: u32,
    /// World transform of the unit box
    pub transform: Mat4,
}

impl InstanceBox {
    pub fn new(instance_key: u32, transform: Mat4) -> Self {
        Self { instance_key, transform }
    }
}

/// Everything needed to (re)build the probe geometry of a scene.
#[derive(Debug, Clone, Default)]
pub struct FragmentBoxes {
    /// Boxes drawn in both passes
    pub opaque: Vec<InstanceBox>,
    /// Boxes added for the transparent pass only
    pub transparent: Vec<InstanceBox>,
    /// Instance key → owning fragment
    pub instance_to_fragment: FxHashMap<u32, FragmentId>,
}

impl FragmentBoxes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an opaque instance owned by `fragment`
    pub fn push_opaque(&mut self, instance_key: u32, transform: Mat4, fragment: impl Into<FragmentId>) {
        self.opaque.push(InstanceBox::new(instance_key, transform));
        self.instance_to_fragment.insert(instance_key, fragment.into());
    }

    /// Add a transparent instance owned by `fragment`
    pub fn push_transparent(&mut self, instance_key: u32, transform: Mat4, fragment: impl Into<FragmentId>) {
        self.transparent.push(InstanceBox::new(instance_key, transform));
        self.instance_to_fragment.insert(instance_key, fragment.into());
    }

    /// Total number of instances across both groups
    pub fn instance_count(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }
}
