mod common;

use std::collections::HashSet;

use common::{disc, vertical_step};
use ec_contour::{
    ContourError, EDGE_PIXEL, EdgeMapKind, extract_segments, fuse_contours, fuse_contours_bw,
};
use ec_core::{Image, ImageView, Pixel};
use ec_edge::Channels;

fn on_pixels(view: &ImageView<'_, u8>) -> HashSet<Pixel> {
    let mut out = HashSet::new();
    for row in 0..view.height() {
        for (col, &v) in view.row(row).iter().enumerate() {
            if v == EDGE_PIXEL {
                out.insert(Pixel::new(row, col));
            }
        }
    }
    out
}

#[test]
fn soft_map_keeps_input_dimensions() {
    for (w, h) in [(1usize, 1usize), (3, 7), (16, 9), (33, 20)] {
        let img = disc(w, h, 0.3 * w.min(h) as f32);
        let gray = fuse_contours(&Channels::gray(img.as_view()), 30).expect("gray fuse");
        assert_eq!((gray.width(), gray.height()), (w, h));
        assert_eq!(gray.kind(), EdgeMapKind::Soft);
        assert_eq!(gray.num_segments(), 0);

        let v = img.as_view();
        let color = fuse_contours(&Channels::rgb(v, v, v).expect("planes"), 32).expect("fuse");
        assert_eq!((color.width(), color.height()), (w, h));
        assert_eq!(color.edge_image().as_contiguous_slice().map(<[u8]>::len), Some(w * h));
    }
}

#[test]
fn repeated_runs_are_byte_identical() {
    let img = disc(40, 30, 9.0);
    let input = Channels::gray(img.as_view());

    let a = fuse_contours(&input, 30).expect("first");
    let b = fuse_contours(&input, 30).expect("second");
    assert_eq!(a.edge_image().as_contiguous_slice(), b.edge_image().as_contiguous_slice());

    let a = fuse_contours_bw(&input, 30, 128).expect("first bw");
    let b = fuse_contours_bw(&input, 30, 128).expect("second bw");
    assert_eq!(a.segments(), b.segments());
    assert!(a.num_segments() > 0);
}

#[test]
fn raising_cutoff_never_adds_pixels() {
    let img = disc(32, 32, 10.0);
    let soft = fuse_contours(&Channels::gray(img.as_view()), 24).expect("fuse");

    let mut prev = usize::MAX;
    for cutoff in (0..=255).step_by(15).chain([255]) {
        let bw = soft.threshold(cutoff).expect("threshold");
        let count = on_pixels(&bw.edge_image()).len();
        assert!(count <= prev, "cutoff {cutoff}: {count} > {prev}");
        prev = count;
    }
}

#[test]
fn binary_raster_equals_union_of_segments() {
    let r = disc(36, 28, 8.0);
    let g = vertical_step(36, 28, 20, 30, 160);
    let b = Image::new_fill(36, 28, 70u8);
    let input = Channels::rgb(r.as_view(), g.as_view(), b.as_view()).expect("planes");

    let map = fuse_contours_bw(&input, 32, 100).expect("fuse bw");
    assert_eq!(map.kind(), EdgeMapKind::Binary);

    let mut union = HashSet::new();
    for seg in map.segments() {
        assert!(!seg.is_empty());
        for pair in seg.pixels().windows(2) {
            assert!(pair[0].is_adjacent8(pair[1]));
        }
        for &p in seg {
            assert!(union.insert(p), "pixel {p:?} in two segments");
        }
    }
    assert_eq!(on_pixels(&map.edge_image()), union);

    let rendered = map.render().expect("render");
    assert_eq!(on_pixels(&rendered.as_view()), union);
}

#[test]
fn cutoff_extremes() {
    let img = disc(20, 16, 5.0);
    let soft = fuse_contours(&Channels::gray(img.as_view()), 30).expect("fuse");

    let all = soft.threshold(0).expect("cutoff 0");
    assert_eq!(on_pixels(&all.edge_image()).len(), 20 * 16);

    let top = soft.threshold(255).expect("cutoff 255");
    let strength = soft.edge_image();
    for row in 0..16 {
        for col in 0..20 {
            let max = strength.get(col, row) == Some(&255);
            assert_eq!(top.pixel(row, col) == Some(EDGE_PIXEL), max);
        }
    }
}

#[test]
fn all_zero_image_has_no_segments() {
    let img = Image::new_fill(10, 6, 0u8);
    let input = Channels::gray(img.as_view());
    for cutoff in [1, 100, 255] {
        let map = fuse_contours_bw(&input, 30, cutoff).expect("fuse bw");
        assert_eq!(map.num_segments(), 0, "cutoff {cutoff}");
    }

    let soft = fuse_contours(&input, 30).expect("fuse");
    assert!(
        extract_segments(&soft.edge_image(), 0)
            .expect("cutoff 0")
            .num_segments()
            > 0
    );
}

#[test]
fn uniform_mid_gray_yields_no_segments() {
    let img = Image::new_fill(4, 4, 128u8);
    let v = img.as_view();

    let gray = fuse_contours_bw(&Channels::gray(v), 32, 200).expect("gray");
    assert_eq!(gray.num_segments(), 0);

    let color = fuse_contours_bw(&Channels::rgb(v, v, v).expect("planes"), 32, 200).expect("color");
    assert_eq!(color.num_segments(), 0);
}

#[test]
fn vertical_boundary_is_one_segment() {
    let img = vertical_step(8, 8, 4, 0, 255);
    let expected: Vec<Pixel> = (0..8).map(|row| Pixel::new(row, 4)).collect();

    let gray = fuse_contours_bw(&Channels::gray(img.as_view()), 32, 128).expect("gray");
    assert_eq!(gray.num_segments(), 1);
    assert_eq!(gray.segments()[0].pixels(), expected.as_slice());

    let v = img.as_view();
    let color = fuse_contours_bw(&Channels::rgb(v, v, v).expect("planes"), 32, 128).expect("color");
    assert_eq!(color.num_segments(), 1);
    assert_eq!(color.segments()[0].pixels(), expected.as_slice());
}

#[test]
fn degenerate_inputs_are_rejected() {
    let empty: [u8; 0] = [];
    let zero_w = ImageView::contiguous(0, 4, &empty).expect("view");
    let zero_h = ImageView::contiguous(4, 0, &empty).expect("view");

    for view in [zero_w, zero_h] {
        assert!(matches!(
            fuse_contours(&Channels::gray(view), 30),
            Err(ContourError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            fuse_contours_bw(&Channels::gray(view), 30, 100),
            Err(ContourError::InvalidDimensions { .. })
        ));
    }

    let img = Image::new_fill(4, 4, 0u8);
    assert!(matches!(
        fuse_contours_bw(&Channels::gray(img.as_view()), 30, 300),
        Err(ContourError::InvalidThreshold { value: 300, .. })
    ));
    assert!(matches!(
        fuse_contours(&Channels::gray(img.as_view()), 0),
        Err(ContourError::InvalidThreshold { name: "grad_thresh", .. })
    ));
}
