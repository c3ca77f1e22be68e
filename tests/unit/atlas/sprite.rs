use super::*;
use crate::resources::{
    animation::AnimationInfo,
    resolver::{MemoryResolver, ResourceResolver},
};

fn sheet(w: u32, h: u32) -> DecodedImage {
    let mut img = RgbaImage::new(w, h);
    for (_, y, px) in img.enumerate_pixels_mut() {
        *px = image::Rgba([0, 0, (y % 256) as u8, 255]);
    }
    DecodedImage::from_rgba8(img)
}

fn info(w: u32, h: u32, animation: AnimationInfo) -> SpriteInfo {
    SpriteInfo {
        id: ResourceId::parse("demo:sheet").unwrap(),
        width: w,
        height: h,
        animation,
    }
}

fn with_handle<T>(f: impl FnOnce(&dyn ResourceHandle) -> T) -> T {
    let id = ResourceId::parse("demo:sheet").unwrap();
    let mut r = MemoryResolver::new();
    r.insert(&id, Vec::new());
    let mut h = r.open(&id, &r.resolve(&id)).unwrap();
    let out = f(h.as_ref());
    h.close().unwrap();
    out
}

fn animated() -> AnimationInfo {
    crate::resources::animation::parse_metadata(
        &ResourceId::parse("demo:sheet").unwrap(),
        br#"{"animation": {}}"#,
    )
    .unwrap()
    .unwrap()
}

#[test]
fn bakes_first_frame_with_mip_chain() {
    let placement = Placement {
        width: 16,
        height: 16,
        mip_level: 4,
        x: 32,
        y: 48,
    };
    let sprite = with_handle(|h| {
        StandardSpriteBaker
            .bake(&info(16, 16, animated()), h, &sheet(16, 64), &placement)
            .unwrap()
    });

    assert_eq!((sprite.x, sprite.y), (32, 48));
    assert_eq!((sprite.width, sprite.height), (16, 16));
    assert_eq!(sprite.frame_count, 4);
    let sizes: Vec<_> = sprite.mips.iter().map(|m| m.dimensions()).collect();
    assert_eq!(sizes, [(16, 16), (8, 8), (4, 4), (2, 2), (1, 1)]);
    // first frame only: rows 0..16 of the sheet
    assert_eq!(sprite.mips[0].get_pixel(0, 15).0, [0, 0, 15, 255]);
}

#[test]
fn mip_chain_stops_at_one_pixel() {
    let placement = Placement {
        width: 2,
        height: 2,
        mip_level: 6,
        ..Placement::default()
    };
    let sprite = with_handle(|h| {
        StandardSpriteBaker
            .bake(&info(2, 2, AnimationInfo::empty()), h, &sheet(2, 2), &placement)
            .unwrap()
    });
    assert_eq!(sprite.mip_count(), 2);
    assert_eq!(sprite.frame_count, 1);
}

#[test]
fn resizes_to_placement() {
    let placement = Placement {
        width: 8,
        height: 4,
        ..Placement::default()
    };
    let sprite = with_handle(|h| {
        StandardSpriteBaker
            .bake(&info(4, 4, AnimationInfo::empty()), h, &sheet(4, 4), &placement)
            .unwrap()
    });
    assert_eq!(sprite.mip_count(), 1);
    assert_eq!(sprite.mips[0].dimensions(), (8, 4));
}

#[test]
fn rejects_empty_placement_and_oversized_frame() {
    let err = with_handle(|h| {
        StandardSpriteBaker
            .bake(
                &info(4, 4, AnimationInfo::empty()),
                h,
                &sheet(4, 4),
                &Placement::default(),
            )
            .unwrap_err()
    });
    assert!(matches!(err, AtlasError::Bake { .. }));

    let placement = Placement {
        width: 8,
        height: 8,
        ..Placement::default()
    };
    let err = with_handle(|h| {
        StandardSpriteBaker
            .bake(&info(8, 8, AnimationInfo::empty()), h, &sheet(4, 4), &placement)
            .unwrap_err()
    });
    assert!(err.to_string().contains("exceeds image"));
}

#[test]
fn huge_mip_level_is_bounded_by_sprite_size() {
    let placement = Placement {
        width: 4,
        height: 4,
        mip_level: u32::MAX,
        ..Placement::default()
    };
    let sprite = with_handle(|h| {
        StandardSpriteBaker
            .bake(&info(4, 4, AnimationInfo::empty()), h, &sheet(4, 4), &placement)
            .unwrap()
    });
    let sizes: Vec<_> = sprite.mips.iter().map(|m| m.dimensions()).collect();
    assert_eq!(sizes, [(4, 4), (2, 2), (1, 1)]);
}
