//! Synthetic JPEG/Exif streams for tests, with `quickcheck`'s `Arbitrary` trait

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use quickcheck::{Arbitrary, Gen};

const ORIENTATION_TAG: u16 = 0x0112;
/// Markers that are not APP1 and may come before it
const OTHER_MARKERS: [u8; 6] = [0xe0, 0xe2, 0xed, 0xee, 0xdb, 0xfe];

/// Byte order of the TIFF structure a stream is written with
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// A JPEG prefix: SOI, some unrelated segments, then an APP1 Exif block
/// whose IFD0 may or may not carry an orientation entry.
#[derive(Debug, Clone)]
pub struct ExifStream {
    /// (marker low byte, payload) of the segments before APP1
    pub segments: Vec<(u8, Vec<u8>)>,
    pub byte_order: Endian,
    /// bytes between the TIFF header and IFD0
    pub padding: usize,
    pub tags_before: Vec<u16>,
    pub orientation: Option<u16>,
    pub tags_after: Vec<u16>,
}

impl ExifStream {
    /// Position of the TIFF byte order mark when there are no segments before APP1.
    pub const TIFF_START: usize = 2 + 4 + 6;

    pub fn with_orientation(byte_order: Endian, value: u16) -> Self {
        ExifStream {
            segments: Vec::new(),
            byte_order,
            padding: 0,
            tags_before: Vec::new(),
            orientation: Some(value),
            tags_after: Vec::new(),
        }
    }

    /// What a correct scanner reports for this stream.
    pub fn expected(&self) -> u8 {
        match self.orientation {
            Some(value @ 1..=8) => value as u8,
            _ => 0,
        }
    }

    pub fn ifd_offset(&self) -> u32 {
        8 + self.padding as u32
    }

    /// Offset just past the orientation value, if there is an orientation entry.
    pub fn orientation_end(&self) -> Option<usize> {
        self.orientation?;
        let segments: usize = self.segments.iter().map(|(_, p)| 4 + p.len()).sum();
        let ifd0 = 2 + segments + 4 + 6 + self.ifd_offset() as usize;
        Some(ifd0 + 2 + self.tags_before.len() * 12 + 10)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0xff, 0xd8];
        for (marker, payload) in &self.segments {
            bytes.extend_from_slice(&[0xff, *marker]);
            bytes.write_u16::<BigEndian>(payload.len() as u16 + 2).unwrap();
            bytes.extend_from_slice(payload);
        }

        let tiff = self.tiff();
        bytes.extend_from_slice(&[0xff, 0xe1]);
        bytes.write_u16::<BigEndian>(tiff.len() as u16 + 2 + 6).unwrap();
        bytes.extend_from_slice(b"Exif\0\0");
        bytes.extend_from_slice(&tiff);

        // stand-in for the rest of the image
        bytes.extend_from_slice(&[0xff, 0xd9]);
        bytes
    }

    fn tiff(&self) -> Vec<u8> {
        match self.byte_order {
            Endian::Big => self.tiff_with::<BigEndian>(b"MM"),
            Endian::Little => self.tiff_with::<LittleEndian>(b"II"),
        }
    }

    fn tiff_with<E: ByteOrder>(&self, mark: &[u8; 2]) -> Vec<u8> {
        let mut tiff = mark.to_vec();
        tiff.write_u16::<E>(42).unwrap();
        tiff.write_u32::<E>(self.ifd_offset()).unwrap();
        tiff.resize(tiff.len() + self.padding, 0);

        let entries: Vec<(u16, u16)> = self
            .tags_before
            .iter()
            .map(|&tag| (tag, 0x1234))
            .chain(self.orientation.map(|value| (ORIENTATION_TAG, value)))
            .chain(self.tags_after.iter().map(|&tag| (tag, 0x1234)))
            .collect();
        tiff.write_u16::<E>(entries.len() as u16).unwrap();
        for (tag, value) in entries {
            tiff.write_u16::<E>(tag).unwrap();
            tiff.write_u16::<E>(3).unwrap(); // SHORT
            tiff.write_u32::<E>(1).unwrap();
            // a SHORT is left-justified in the 4-byte value field
            tiff.write_u16::<E>(value).unwrap();
            tiff.write_u16::<E>(0).unwrap();
        }
        // no next IFD
        tiff.write_u32::<E>(0).unwrap();
        tiff
    }
}

#[must_use]
fn other_tags(gen: &mut Gen) -> Vec<u16> {
    let mut tags = Vec::<u16>::arbitrary(gen);
    tags.retain(|&tag| tag != ORIENTATION_TAG);
    tags
}

impl Arbitrary for ExifStream {
    fn arbitrary(gen: &mut Gen) -> Self {
        let segment_count = usize::arbitrary(gen) % 4;
        let segments = (0..segment_count)
            .map(|_| {
                let marker = *gen.choose(&OTHER_MARKERS).unwrap();
                (marker, Vec::<u8>::arbitrary(gen))
            })
            .collect();

        let byte_order = if bool::arbitrary(gen) {
            Endian::Big
        } else {
            Endian::Little
        };

        // mostly valid values, sometimes garbage, sometimes none at all
        let orientation = match u8::arbitrary(gen) % 4 {
            0 => None,
            1 => Some(u16::arbitrary(gen)),
            _ => Some(u16::arbitrary(gen) % 8 + 1),
        };

        ExifStream {
            segments,
            byte_order,
            padding: usize::arbitrary(gen) % 64,
            tags_before: other_tags(gen),
            orientation,
            tags_after: other_tags(gen),
        }
    }
}
