//! Typed indices into a scene sink.

use serde::{Deserialize, Serialize};

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            /// Kind name used in error messages.
            pub const KIND: &'static str = $kind;

            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

define_handle!(
    /// A node in the output graph.
    NodeHandle,
    "node"
);
define_handle!(
    /// A mesh data block.
    MeshHandle,
    "mesh"
);
define_handle!(
    /// A material.
    MaterialHandle,
    "material"
);
define_handle!(
    /// An image used as a texture.
    ImageHandle,
    "image"
);
define_handle!(
    /// A shared instance group.
    GroupHandle,
    "group"
);
define_handle!(
    /// A camera.
    CameraHandle,
    "camera"
);
