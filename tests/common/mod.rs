//! Shared fixtures for integration tests

use image::{ImageBuffer, Rgb};
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Encode a synthetic JPEG of the given dimensions
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 100])
    });
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .expect("jpeg encode");
    out.into_inner()
}

/// Lay out an asset root with a couple of images and a JSON database
pub fn seed_asset_root(root: &Path) {
    let images = root.join("assets/imagens/bigsize");
    let data = root.join("assets/database");
    fs::create_dir_all(&images).expect("create images dir");
    fs::create_dir_all(&data).expect("create data dir");

    fs::write(images.join("field.jpg"), jpeg_bytes(1200, 900)).expect("write field.jpg");
    fs::write(images.join("icon.jpg"), jpeg_bytes(100, 80)).expect("write icon.jpg");
    fs::write(
        data.join("plants.json"),
        b"{\n  \"plants\": [\n    {\"id\": 1, \"name\": \"soy\"},\n    {\"id\": 2, \"name\": \"corn\"}\n  ]\n}",
    )
    .expect("write plants.json");
}
