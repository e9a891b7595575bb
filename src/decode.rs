//! Decoding with the Exif orientation applied.
//!
//! The input is read once: the orientation scan records what it reads,
//! and the decoder is then fed the recorded prefix followed by the rest of the stream,
//! pulled in only as far as the decoder actually reads.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use image::{
    error::{ImageFormatHint, UnsupportedError, UnsupportedErrorKind},
    ColorType, DynamicImage, ImageDecoder, ImageError, ImageFormat, ImageReader, ImageResult,
    Limits,
};
use tracing::debug;

use crate::{
    orientation::read_orientation,
    replay::{Replay, ReplayReader, SeekableReplay},
    transform::Transform,
};

/// How far into the stream the Exif block is looked for.
/// It normally sits in the segment right after the start of the image.
pub const SCAN_LIMIT: u64 = 1 << 20;

/// Dimensions and color type of an image, as it is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    pub color_type: ColorType,
}

#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Decode as this format instead of guessing it from the contents.
    pub format: Option<ImageFormat>,
    /// Maximum number of bytes read while looking for the orientation.
    pub scan_limit: u64,
    /// Resource limits for the decoder. `None` keeps the `image` defaults.
    ///
    /// `max_alloc` also caps how much of the input is buffered for the decoder.
    pub limits: Option<Limits>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            format: None,
            scan_limit: SCAN_LIMIT,
            limits: None,
        }
    }
}

/// Decodes an image and corrects its orientation according to the Exif orientation tag, if present.
///
/// Fails exactly when decoding the same bytes without orientation handling would.
pub fn decode<R: Read>(reader: R) -> ImageResult<(DynamicImage, ImageFormat)> {
    decode_with_options(reader, &DecodeOptions::default())
}

/// Reports the dimensions of an image after orientation correction, without decoding the pixels.
///
/// The color type is the one of the stored image.
pub fn decode_config<R: Read>(reader: R) -> ImageResult<(Config, ImageFormat)> {
    decode_config_with_options(reader, &DecodeOptions::default())
}

pub fn decode_with_options<R: Read>(
    reader: R,
    options: &DecodeOptions,
) -> ImageResult<(DynamicImage, ImageFormat)> {
    let (orientation, replay) = scan_seekable(reader, options);

    let reader = image_reader(replay, options)?;
    let format = reader.format().ok_or_else(unknown_format)?;
    let image = reader.decode()?;

    let transform = Transform::from_orientation(orientation);
    debug!(
        orientation,
        transform = <&'static str>::from(transform),
        ?format,
        "correcting decoded image"
    );
    Ok((transform.apply(image), format))
}

pub fn decode_config_with_options<R: Read>(
    reader: R,
    options: &DecodeOptions,
) -> ImageResult<(Config, ImageFormat)> {
    let (orientation, replay) = scan_seekable(reader, options);

    let reader = image_reader(replay, options)?;
    let format = reader.format().ok_or_else(unknown_format)?;
    let decoder = reader.into_decoder()?;
    let (mut width, mut height) = decoder.dimensions();
    let color_type = decoder.color_type();

    let transform = Transform::from_orientation(orientation);
    if transform.swaps_dimensions() {
        std::mem::swap(&mut width, &mut height);
    }
    debug!(orientation, width, height, ?format, "read image header");
    Ok((
        Config {
            width,
            height,
            color_type,
        },
        format,
    ))
}

/// Opens and decodes a file, correcting its orientation.
pub fn open(path: impl AsRef<Path>) -> ImageResult<(DynamicImage, ImageFormat)> {
    decode(BufReader::new(File::open(path)?))
}

/// Like [`decode_config`], for a file on disk.
pub fn open_config(path: impl AsRef<Path>) -> ImageResult<(Config, ImageFormat)> {
    decode_config(BufReader::new(File::open(path)?))
}

/// Looks up the Exif orientation in the first `limit` bytes of `reader`.
///
/// Returns the orientation (0 if there is none) and a reader that yields the whole stream,
/// starting from where `reader` was when this was called.
pub fn scan_orientation<R: Read>(reader: R, limit: u64) -> (u8, Replay<R>) {
    let mut source = ReplayReader::new(reader, limit);
    let orientation = read_orientation(source.scan_view());
    (orientation, source.into_replay())
}

/// Scans for the orientation, then hands back the whole stream in a form the decoders can seek in.
fn scan_seekable<R: Read>(reader: R, options: &DecodeOptions) -> (u8, SeekableReplay<R>) {
    let mut source = ReplayReader::new(reader, options.scan_limit);
    let orientation = read_orientation(source.scan_view());

    let max_alloc = match &options.limits {
        Some(limits) => limits.max_alloc,
        None => Limits::default().max_alloc,
    };
    (orientation, source.into_seekable(max_alloc.unwrap_or(u64::MAX)))
}

fn image_reader<R: Read>(
    replay: SeekableReplay<R>,
    options: &DecodeOptions,
) -> ImageResult<ImageReader<SeekableReplay<R>>> {
    let mut reader = ImageReader::new(replay);
    match options.format {
        Some(format) => reader.set_format(format),
        None => reader = reader.with_guessed_format()?,
    }
    if let Some(limits) = &options.limits {
        reader.limits(limits.clone());
    }
    Ok(reader)
}

/// The error `image` reports for content it cannot identify.
fn unknown_format() -> ImageError {
    ImageError::Unsupported(UnsupportedError::from_format_and_kind(
        ImageFormatHint::Unknown,
        UnsupportedErrorKind::Format(ImageFormatHint::Unknown),
    ))
}
