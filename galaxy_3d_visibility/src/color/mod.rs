//! Color identifier module
//!
//! Color codes for probe instances and the allocator mapping them back
//! to fragments.

mod color_code;
mod identifier_allocator;

pub use color_code::{ColorCode, ColorCounter};
pub use identifier_allocator::IdentifierAllocator;
