#![allow(dead_code)]

use std::io::Cursor;

use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};
use serde_json::{Value, json};

/// PNG holding `text` as a QR code with a four-module quiet zone.
pub fn qr_png(text: &str) -> Vec<u8> {
    let code = QrCode::new(text.as_bytes()).expect("qr");
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let (scale, quiet) = (4u32, 4u32);
    let side = (modules + quiet * 2) * scale;
    let img = GrayImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / scale, y / scale);
        if mx < quiet || my < quiet || mx >= modules + quiet || my >= modules + quiet {
            return Luma([255]);
        }
        match colors[((my - quiet) * modules + (mx - quiet)) as usize] {
            Color::Dark => Luma([0]),
            Color::Light => Luma([255]),
        }
    });
    png(&img)
}

pub fn blank_png() -> Vec<u8> {
    png(&GrayImage::from_pixel(48, 48, Luma([255])))
}

fn png(img: &GrayImage) -> Vec<u8> {
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("png");
    out
}

pub fn bundle(store_url: &str) -> Value {
    json!({
        "dataStore": {"url": store_url, "key": "anon-key"},
        "imageHost": {"apiKey": "host-key"}
    })
}
