#![no_main]

use std::io::Read;

use imageorient::replay::ReplayReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u16, &[u8])| {
    let (limit, data) = input;
    let mut source = ReplayReader::new(data, limit as u64);
    let orientation = imageorient::read_orientation(source.scan_view());
    assert!(orientation <= 8);
    assert!(source.recorded().len() <= limit as usize);

    // whatever the scan consumed, the decoder must still see every byte
    let mut replayed = Vec::new();
    source
        .into_replay()
        .read_to_end(&mut replayed)
        .expect("reading from memory cannot fail");
    assert_eq!(replayed, data);
});
