use super::*;

fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

#[test]
fn decode_png_premultiplies() {
    let bytes = png_bytes(3, 2, [255, 0, 0, 128]);
    let img = decode_image(&bytes).unwrap();
    assert_eq!((img.width, img.height), (3, 2));
    assert_eq!(img.rgba8_premul.len(), 3 * 2 * 4);
    assert_eq!(&img.rgba8_premul[..4], &[128, 0, 0, 128]);
}

#[test]
fn empty_source_is_invalid_request() {
    let err = SourceImage::from_bytes(Vec::new()).decode().unwrap_err();
    assert!(matches!(err, MotionError::InvalidRequest(_)));
    let err = SourceImage::from_data_uri("  ").decode().unwrap_err();
    assert!(matches!(err, MotionError::InvalidRequest(_)));
}

#[test]
fn garbage_bytes_are_invalid_request() {
    let err = SourceImage::from_bytes(vec![1u8, 2, 3, 4]).decode().unwrap_err();
    assert!(matches!(err, MotionError::InvalidRequest(_)));
}

#[test]
fn data_uri_roundtrips_through_decode() {
    let bytes = png_bytes(8, 4, [0, 255, 0, 255]);
    let uri = SourceImage::from_bytes(bytes.clone()).to_data_uri().unwrap();
    assert!(uri.starts_with("data:image/png;base64,"));

    let from_uri = SourceImage::from_data_uri(uri);
    assert_eq!(from_uri.encoded_bytes().unwrap().as_ref(), bytes.as_slice());
    let img = from_uri.decode().unwrap();
    assert_eq!((img.width, img.height), (8, 4));
}

#[test]
fn malformed_data_uris_are_rejected() {
    for uri in [
        "image/png;base64,AAAA",
        "data:image/png;base64",
        "data:image/png,AAAA",
        "data:image/png;base64,",
        "data:image/png;base64,@@@@",
    ] {
        let err = SourceImage::from_data_uri(uri).decode().unwrap_err();
        assert!(
            matches!(err, MotionError::InvalidRequest(_)),
            "expected invalid request for {uri:?}, got {err:?}"
        );
    }
}

#[test]
fn working_canvas_follows_aspect_and_stays_even() {
    assert_eq!(
        working_canvas(64, 64, 1024).unwrap(),
        Canvas {
            width: 1024,
            height: 1024
        }
    );
    assert_eq!(working_canvas(1920, 1080, 1024).unwrap().height, 576);
    // 1024 * 333 / 1000 = 340.99 -> 341 -> 342
    assert_eq!(working_canvas(1000, 333, 1024).unwrap().height, 342);
    assert_eq!(working_canvas(4000, 1, 1024).unwrap().height, 2);
}

#[test]
fn tall_sources_keep_their_aspect() {
    assert_eq!(
        working_canvas(100, 900, 1024).unwrap(),
        Canvas {
            width: 1024,
            height: 9216
        }
    );
    assert_eq!(working_canvas(1, 32767, 2).unwrap().height, 65534);
}

#[test]
fn working_canvas_rejects_odd_width_and_oversize() {
    assert!(working_canvas(10, 10, 1023).is_err());
    assert!(working_canvas(1, 100, 1024).is_err());
}
