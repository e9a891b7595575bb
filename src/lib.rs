//! Image decoding that honors the Exif orientation tag.
//!
//! [`decode`] and [`decode_config`] work like their `image` counterparts, except that the result
//! is already rotated or flipped the way the Exif orientation of a JPEG asks for.
//! Images without an orientation (or with a broken one) decode unchanged.
//!
//! ```no_run
//! let file = std::io::BufReader::new(std::fs::File::open("photo.jpg")?);
//! let (image, format) = imageorient::decode(file)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]

mod decode;
mod orientation;
pub mod replay;
mod transform;

pub use decode::{
    decode, decode_config, decode_config_with_options, decode_with_options, open, open_config,
    scan_orientation, Config, DecodeOptions, SCAN_LIMIT,
};
pub use orientation::read_orientation;
pub use transform::Transform;
