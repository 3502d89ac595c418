#![no_main]

//! Untrusted bytes through the unified decoder, then a thumbnail-sized
//! resample of whatever decodes.

use libfuzzer_sys::fuzz_target;
use thumbnail_lab::engine::{decode_image, ensure_dimensions_safe, plan, resample_image};
use thumbnail_lab::settings::ResampleOptions;

fuzz_target!(|data: &[u8]| {
    // Reject inputs that would exceed fuzz decode budget
    if ensure_dimensions_safe(data).is_err() {
        return;
    }

    let Ok((img, _format)) = decode_image(data) else {
        return;
    };
    if u64::from(img.width()) * u64::from(img.height()) > 4_000_000 {
        return;
    }

    let target = plan(img.width(), img.height(), 64);
    let resized = resample_image(&img, target, &ResampleOptions::default())
        .expect("decoded image must resample");
    assert_eq!((resized.width(), resized.height()), (target.width, target.height));
});
