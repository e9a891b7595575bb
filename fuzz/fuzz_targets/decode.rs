#![no_main]

use image::Limits;
use imageorient::{decode_config_with_options, decode_with_options, DecodeOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut limits = Limits::default();
    limits.max_image_width = Some(2048);
    limits.max_image_height = Some(2048);
    limits.max_alloc = Some(64 * 1024 * 1024);
    let options = DecodeOptions {
        limits: Some(limits),
        ..Default::default()
    };

    let config = decode_config_with_options(data, &options);
    if let Ok((image, format)) = decode_with_options(data, &options) {
        // the header and the decoder agree on the corrected size
        let (config, config_format) = config.expect("reading the header failed on a decodable image");
        assert_eq!(format, config_format);
        assert_eq!((image.width(), image.height()), (config.width, config.height));
    }
});
