//! Exif orientation lookup in a JPEG stream.
//!
//! The scan walks JPEG segments up to the first APP1, then reads just enough of
//! the TIFF structure inside it to find the Orientation tag of IFD0.
//! Anything unexpected means "no orientation", never an error:
//! a broken or missing Exif block must not prevent decoding the image itself.
//!
//! An explanation of Exif orientation:
//! https://web.archive.org/web/20200412005226/https://www.impulseadventure.com/photo/exif-orientation.html

use std::io::{self, Read};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use tracing::trace;

const MARKER_SOI: u16 = 0xffd8;
const MARKER_APP1: u16 = 0xffe1;
/// "Exif" in ASCII
const EXIF_HEADER: u32 = 0x4578_6966;
/// "MM"
const BYTE_ORDER_BE: u16 = 0x4d4d;
/// "II"
const BYTE_ORDER_LE: u16 = 0x4949;
const ORIENTATION_TAG: u16 = 0x0112;

/// Reads the Exif orientation of a JPEG stream.
///
/// Returns the tag value (1 to 8), or 0 if the stream is not a JPEG,
/// has no Exif block, has no orientation tag, or anything along the way is malformed.
/// Reads no further than the orientation entry.
pub fn read_orientation<R: Read>(mut reader: R) -> u8 {
    scan(&mut reader).unwrap_or(0)
}

fn scan<R: Read>(r: &mut R) -> Option<u8> {
    if r.read_u16::<BigEndian>().ok()? != MARKER_SOI {
        trace!("missing JPEG SOI marker");
        return None;
    }

    // find the first APP1 segment; JPEG framing is always big-endian
    loop {
        let marker = r.read_u16::<BigEndian>().ok()?;
        let size = r.read_u16::<BigEndian>().ok()?;
        if marker >> 8 != 0xff {
            trace!(marker, "invalid JPEG marker");
            return None;
        }
        if marker == MARKER_APP1 {
            break;
        }
        if size < 2 {
            trace!(marker, size, "invalid JPEG segment size");
            return None;
        }
        skip(r, u64::from(size - 2))?;
    }

    if r.read_u32::<BigEndian>().ok()? != EXIF_HEADER {
        trace!("APP1 segment does not hold Exif data");
        return None;
    }
    skip(r, 2)?;

    // the TIFF structure inside picks its own byte order
    match r.read_u16::<BigEndian>().ok()? {
        BYTE_ORDER_BE => ifd0::<BigEndian, R>(r),
        BYTE_ORDER_LE => ifd0::<LittleEndian, R>(r),
        mark => {
            trace!(mark, "invalid TIFF byte order mark");
            None
        }
    }
}

/// Reads the orientation entry of IFD0, starting right after the byte order mark.
fn ifd0<E: ByteOrder, R: Read>(r: &mut R) -> Option<u8> {
    // TIFF magic number, not checked
    skip(r, 2)?;

    // offset of IFD0, counted from the byte order mark; 8 bytes of it are behind us
    let offset = r.read_u32::<E>().ok()?;
    if offset < 8 {
        trace!(offset, "invalid IFD0 offset");
        return None;
    }
    skip(r, u64::from(offset - 8))?;

    let entries = r.read_u16::<E>().ok()?;
    for _ in 0..entries {
        if r.read_u16::<E>().ok()? != ORIENTATION_TAG {
            skip(r, 10)?;
            continue;
        }
        // type and count
        skip(r, 6)?;
        let value = r.read_u16::<E>().ok()?;
        return match value {
            1..=8 => Some(value as u8),
            _ => {
                trace!(value, "orientation value out of range");
                None
            }
        };
    }
    trace!(entries, "no orientation tag in IFD0");
    None
}

/// Discards exactly `len` bytes. A stream that ends early counts as failure.
fn skip<R: Read>(r: &mut R, len: u64) -> Option<()> {
    let skipped = io::copy(&mut r.by_ref().take(len), &mut io::sink()).ok()?;
    (skipped == len).then_some(())
}
