/*!
# Galaxy 3D Visibility

GPU color-ID visibility culling for the Galaxy 3D engine.

Every placed instance of a fragment's bounding box gets a unique flat
color. The boxes are rendered into a small off-screen target, read back
and decoded on a worker thread; the colors found tell which fragments
are on screen. Loaders listen for newly discovered fragments and stream
in their full geometry.

## Architecture

- **IdentifierAllocator**: unique color per instance, reverse lookup to fragments
- **PixelDecoder**: worker thread turning RGBA buffers into color sets
- **VisibilityRenderPass**: opaque pass, then opaque + transparent pass
- **VisibilityTracker**: discovered / pending-removal bookkeeping per cycle
- **VisibilityCuller**: owns the pipeline and schedules cycles

The rendering engine plugs in through the `ProbeRenderer` and
`RenderableGroup` traits.
*/

// Internal modules
mod error;
pub mod log;
mod fragment;
mod color;
mod decode;
mod probe;
mod tracking;
mod culler;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Orchestrator
    pub use crate::culler::{UpdateReasons, VisibilityConfig, VisibilityCuller};

    // Scene-build input
    pub use crate::fragment::{FragmentBoxes, FragmentId, InstanceBox};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, set_logger, reset_logger};
    }

    // Color identifier sub-module
    pub mod color {
        pub use crate::color::*;
    }

    // Pixel decode sub-module
    pub mod decode {
        pub use crate::decode::*;
    }

    // Probe rendering sub-module (engine seams)
    pub mod probe {
        pub use crate::probe::*;
    }

    // Tracking sub-module
    pub mod tracking {
        pub use crate::tracking::*;
    }
}

// Re-export math library at crate root
pub use glam;
