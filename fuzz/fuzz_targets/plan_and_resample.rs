#![no_main]

use arbitrary::Arbitrary;
use image::{DynamicImage, Rgba, RgbaImage};
use libfuzzer_sys::fuzz_target;
use thumbnail_lab::engine::{plan, resample_image};
use thumbnail_lab::settings::{ResampleOptions, ResampleQuality, UnsharpMask};

#[derive(Arbitrary, Debug)]
struct Input {
    width: u16,
    height: u16,
    max_edge: u16,
    quality: u8,
    alpha: bool,
    amount: u8,
    threshold: u8,
}

fuzz_target!(|input: Input| {
    let out = plan(input.width.into(), input.height.into(), input.max_edge.into());
    assert!(out.width >= 1 && out.height >= 1);
    assert!(out.width.max(out.height) <= u32::from(input.max_edge).max(1));

    // Keep the pixel work small; the planner above already saw the full range.
    let w = u32::from(input.width % 128) + 1;
    let h = u32::from(input.height % 128) + 1;
    let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(w, h, |x, y| {
        Rgba([x as u8, y as u8, (x ^ y) as u8, (x * y) as u8])
    }));
    let options = ResampleOptions {
        quality: ResampleQuality::from_level(input.quality % 4).expect("level in range"),
        alpha: input.alpha,
        unsharp: UnsharpMask {
            amount: input.amount.into(),
            radius: 0.6,
            threshold: input.threshold,
        },
    };
    let target = plan(w, h, u32::from(input.max_edge % 64) + 1);
    let resized = resample_image(&img, target, &options).expect("resample");
    assert_eq!((resized.width(), resized.height()), (target.width, target.height));
});
