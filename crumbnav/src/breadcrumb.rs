// Breadcrumb cells: the per-sample occupancy signature.
//
// A breadcrumb records what occupies one sub-tile sample point: whether the
// tile underneath is empty space, whether the point falls in the chunk's
// expansion margin, whether cleanup proved it enclosed, and the OR of the
// collision layer/mask bits of every shape containing the point.
//
// Cells dropped by cleanup are represented as `None` in the chunk's
// `Vec<Option<Breadcrumb>>`, never as a sentinel breadcrumb value.
//
// See also: `sampler.rs` which produces breadcrumbs, `cleanup.rs` which
// classifies and drops them, `chunk.rs` which stores them.

use crate::types::SampleCoord;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Per-cell flag set.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct BreadcrumbFlags: u8 {
        /// The tile under this cell is empty and no shape covers the point.
        const SPACE = 1 << 0;
        /// The cell lies in the expansion margin, outside the chunk footprint.
        const IS_BORDER = 1 << 1;
        /// All four cardinal neighbors are equivalent (set by cleanup only).
        const INTERIOR = 1 << 2;
    }
}

/// One sampled cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Position in the owning chunk's sample array.
    pub coord: SampleCoord,
    pub flags: BreadcrumbFlags,
    /// OR of the collision layers of every contributing shape.
    pub collision_layer: u32,
    /// OR of the collision masks of every contributing shape.
    pub collision_mask: u32,
}

impl Breadcrumb {
    pub fn new(coord: SampleCoord) -> Self {
        Self {
            coord,
            ..Self::default()
        }
    }

    pub fn is_space(&self) -> bool {
        self.flags.contains(BreadcrumbFlags::SPACE)
    }

    pub fn is_border(&self) -> bool {
        self.flags.contains(BreadcrumbFlags::IS_BORDER)
    }

    pub fn is_interior(&self) -> bool {
        self.flags.contains(BreadcrumbFlags::INTERIOR)
    }

    /// True if any shape contributed collision bits to this cell.
    pub fn has_collision(&self) -> bool {
        self.collision_layer != 0 || self.collision_mask != 0
    }

    /// Two cells are equivalent when they represent the same occupancy
    /// class: same space status and identical aggregated layer and mask.
    /// Position and the border/interior flags are ignored.
    pub fn equivalent(&self, other: &Breadcrumb) -> bool {
        self.is_space() == other.is_space()
            && self.collision_layer == other.collision_layer
            && self.collision_mask == other.collision_mask
    }
}
