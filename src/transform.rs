use image::{metadata::Orientation, DynamicImage};
use strum::{IntoStaticStr, VariantArray};

/// Geometric correction for an Exif orientation value.
///
/// Rotations are counter-clockwise: `Rotate270` turns the picture a quarter turn clockwise.
#[derive(IntoStaticStr, VariantArray, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum Transform {
    Identity,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    /// Flip along the top-left to bottom-right diagonal
    Transpose,
    Rotate270,
    /// Flip along the top-right to bottom-left diagonal
    Transverse,
    Rotate90,
}

impl Transform {
    /// The correction that undoes an Exif orientation value.
    /// 0 (no orientation found), 1 and anything out of range need none.
    pub fn from_orientation(orientation: u8) -> Self {
        match orientation {
            2 => Transform::FlipHorizontal,
            3 => Transform::Rotate180,
            4 => Transform::FlipVertical,
            5 => Transform::Transpose,
            6 => Transform::Rotate270,
            7 => Transform::Transverse,
            8 => Transform::Rotate90,
            0 | 1 | 9.. => Transform::Identity,
        }
    }

    /// Whether the corrected image has width and height swapped.
    pub fn swaps_dimensions(self) -> bool {
        match self {
            Transform::Transpose
            | Transform::Rotate270
            | Transform::Transverse
            | Transform::Rotate90 => true,
            Transform::Identity
            | Transform::FlipHorizontal
            | Transform::Rotate180
            | Transform::FlipVertical => false,
        }
    }

    pub fn inverse(self) -> Self {
        match self {
            Transform::Rotate90 => Transform::Rotate270,
            Transform::Rotate270 => Transform::Rotate90,
            other => other,
        }
    }

    /// The `image` operation performing this transform, `None` for `Identity`.
    pub fn to_orientation(self) -> Option<Orientation> {
        // `image` names its rotations clockwise
        match self {
            Transform::Identity => None,
            Transform::FlipHorizontal => Some(Orientation::FlipHorizontal),
            Transform::Rotate180 => Some(Orientation::Rotate180),
            Transform::FlipVertical => Some(Orientation::FlipVertical),
            Transform::Transpose => Some(Orientation::Rotate90FlipH),
            Transform::Rotate270 => Some(Orientation::Rotate90),
            Transform::Transverse => Some(Orientation::Rotate270FlipH),
            Transform::Rotate90 => Some(Orientation::Rotate270),
        }
    }

    /// `Identity` hands the image back untouched; everything else produces the transformed raster.
    pub fn apply(self, mut image: DynamicImage) -> DynamicImage {
        if let Some(orientation) = self.to_orientation() {
            image.apply_orientation(orientation);
        }
        image
    }
}
