use ec_core::{Image, ImageView, Pixel, try_alloc};
use serde::Serialize;

use crate::error::{SegmentFault, check_dimensions, push_checked};
use crate::{ContourError, extract_segments};

/// Byte value of an edge pixel in a binary map.
pub const EDGE_PIXEL: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMapKind {
    /// Contour strength in `0..=255`, no segments.
    Soft,
    /// `0`/`255` raster backed by segments.
    Binary,
}

/// Ordered chain of 8-connected pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Segment {
    pixels: Vec<Pixel>,
}

impl Segment {
    pub(crate) fn from_traced(pixels: Vec<Pixel>) -> Self {
        Self { pixels }
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Pixel> {
        self.pixels.iter()
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn first(&self) -> Option<Pixel> {
        self.pixels.first().copied()
    }

    pub fn last(&self) -> Option<Pixel> {
        self.pixels.last().copied()
    }
}

impl<'a> IntoIterator for &'a Segment {
    type Item = &'a Pixel;
    type IntoIter = core::slice::Iter<'a, Pixel>;

    fn into_iter(self) -> Self::IntoIter {
        self.pixels.iter()
    }
}

/// Detection result: a byte raster plus the segments it was built from.
///
/// Binary maps keep the raster and the segment list in lockstep: a pixel
/// is [`EDGE_PIXEL`] exactly when one segment contains it. Soft maps carry
/// a strength raster and no segments. Maps are only produced by the fusion
/// engine, the extractor or [`EdgeMap::from_segments`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeMap {
    width: usize,
    height: usize,
    kind: EdgeMapKind,
    #[serde(skip)]
    edge_img: Image<u8>,
    segments: Vec<Segment>,
}

impl EdgeMap {
    pub(crate) fn soft(strength: Image<u8>) -> Self {
        Self {
            width: strength.width(),
            height: strength.height(),
            kind: EdgeMapKind::Soft,
            edge_img: strength,
            segments: Vec::new(),
        }
    }

    /// Rasterises segments that are already known to be disjoint and in bounds.
    pub(crate) fn from_traced(
        width: usize,
        height: usize,
        segments: Vec<Segment>,
    ) -> Result<Self, ContourError> {
        let edge_img = rasterize(width, height, &segments)?;
        Ok(Self {
            width,
            height,
            kind: EdgeMapKind::Binary,
            edge_img,
            segments,
        })
    }

    /// Builds a binary map from externally traced chains.
    ///
    /// Every chain must be non-empty, in bounds, 8-connected between
    /// consecutive pixels and disjoint from all other chains.
    pub fn from_segments(
        width: usize,
        height: usize,
        chains: Vec<Vec<Pixel>>,
    ) -> Result<Self, ContourError> {
        let n = check_dimensions(width, height)?;
        let mut claimed = try_alloc(n, false)?;

        let mut segments = Vec::new();
        segments
            .try_reserve_exact(chains.len())
            .map_err(|_| ContourError::AllocationFailure { len: chains.len() })?;

        for (index, pixels) in chains.into_iter().enumerate() {
            let fault = |reason| ContourError::InvalidSegment { index, reason };
            if pixels.is_empty() {
                return Err(fault(SegmentFault::Empty));
            }
            for (at, &p) in pixels.iter().enumerate() {
                if p.row >= height || p.col >= width {
                    return Err(fault(SegmentFault::OutOfBounds(p)));
                }
                if at > 0 && !pixels[at - 1].is_adjacent8(p) {
                    return Err(fault(SegmentFault::NotAdjacent { at }));
                }
                let slot = &mut claimed[p.index(width)];
                if *slot {
                    return Err(fault(SegmentFault::Overlap(p)));
                }
                *slot = true;
            }
            segments.push(Segment::from_traced(pixels));
        }

        Self::from_traced(width, height, segments)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn kind(&self) -> EdgeMapKind {
        self.kind
    }

    /// Raster value at `(row, col)`, `None` outside the map.
    pub fn pixel(&self, row: usize, col: usize) -> Option<u8> {
        self.edge_img.get(col, row).copied()
    }

    pub fn edge_image(&self) -> ImageView<'_, u8> {
        self.edge_img.as_view()
    }

    pub fn into_edge_image(self) -> Image<u8> {
        self.edge_img
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Byte raster for saving: regenerated from segments for binary maps,
    /// a copy of the strength raster for soft maps.
    pub fn render(&self) -> Result<Image<u8>, ContourError> {
        match self.kind {
            EdgeMapKind::Binary => rasterize(self.width, self.height, &self.segments),
            EdgeMapKind::Soft => Ok(self.edge_img.as_view().to_image()?),
        }
    }

    /// Binarizes this map's raster at `cutoff` and traces the result.
    pub fn threshold(&self, cutoff: i32) -> Result<EdgeMap, ContourError> {
        extract_segments(&self.edge_img.as_view(), cutoff)
    }
}

fn rasterize(width: usize, height: usize, segments: &[Segment]) -> Result<Image<u8>, ContourError> {
    let mut img = Image::try_new_fill(width, height, 0u8)?;
    let data = img.data_mut();
    for p in segments.iter().flat_map(Segment::iter) {
        data[p.index(width)] = EDGE_PIXEL;
    }
    Ok(img)
}

pub(crate) fn collect_segment(
    pixels: &mut Vec<Pixel>,
    out: &mut Vec<Segment>,
) -> Result<(), ContourError> {
    push_checked(out, Segment::from_traced(core::mem::take(pixels)))
}

#[cfg(test)]
mod tests {
    use ec_core::{Image, Pixel};

    use super::{EDGE_PIXEL, EdgeMap, EdgeMapKind};
    use crate::{ContourError, SegmentFault};

    fn px(row: usize, col: usize) -> Pixel {
        Pixel::new(row, col)
    }

    #[test]
    fn from_segments_rasterizes_chains() {
        let map = EdgeMap::from_segments(
            5,
            4,
            vec![vec![px(0, 0), px(1, 1), px(1, 2)], vec![px(3, 4)]],
        )
        .expect("valid chains");

        assert_eq!(map.kind(), EdgeMapKind::Binary);
        assert_eq!(map.num_segments(), 2);
        assert_eq!(map.pixel(1, 1), Some(EDGE_PIXEL));
        assert_eq!(map.pixel(3, 4), Some(EDGE_PIXEL));
        assert_eq!(map.pixel(0, 1), Some(0));
        assert_eq!(map.pixel(4, 0), None);

        let on = map.edge_image().row(1).iter().filter(|&&v| v == EDGE_PIXEL).count();
        assert_eq!(on, 2);
        assert_eq!(map.segment(1).map(|s| s.pixels().to_vec()), Some(vec![px(3, 4)]));
        assert!(map.segment(2).is_none());
    }

    #[test]
    fn from_segments_rejects_bad_chains() {
        let err = |chains: Vec<Vec<Pixel>>| match EdgeMap::from_segments(4, 4, chains) {
            Err(ContourError::InvalidSegment { index, reason }) => (index, reason),
            other => panic!("expected InvalidSegment, got {other:?}"),
        };

        assert_eq!(err(vec![vec![px(0, 0)], vec![]]), (1, SegmentFault::Empty));
        assert_eq!(
            err(vec![vec![px(0, 4)]]),
            (0, SegmentFault::OutOfBounds(px(0, 4)))
        );
        assert_eq!(
            err(vec![vec![px(0, 0), px(0, 2)]]),
            (0, SegmentFault::NotAdjacent { at: 1 })
        );
        assert_eq!(
            err(vec![vec![px(0, 0), px(0, 1)], vec![px(1, 1), px(0, 1)]]),
            (1, SegmentFault::Overlap(px(0, 1)))
        );
        assert_eq!(
            err(vec![vec![px(2, 2), px(2, 3), px(2, 2)]]),
            (0, SegmentFault::Overlap(px(2, 2)))
        );
    }

    #[test]
    fn from_segments_rejects_empty_raster() {
        assert!(matches!(
            EdgeMap::from_segments(0, 3, Vec::new()),
            Err(ContourError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn render_matches_raster() {
        let map = EdgeMap::from_segments(3, 3, vec![vec![px(0, 0), px(1, 1), px(2, 2)]])
            .expect("valid chain");
        let rendered = map.render().expect("render");
        assert_eq!(rendered.as_view().as_contiguous_slice(), map.edge_image().as_contiguous_slice());

        let soft = EdgeMap::soft(Image::from_vec(2, 1, vec![7u8, 200]).expect("raster"));
        assert_eq!(soft.kind(), EdgeMapKind::Soft);
        assert_eq!(soft.num_segments(), 0);
        assert_eq!(soft.render().expect("render").data(), &[7, 200]);
    }

    #[test]
    fn soft_map_thresholds_into_segments() {
        let soft = EdgeMap::soft(
            Image::from_vec(3, 2, vec![10u8, 180, 181, 0, 0, 250]).expect("raster"),
        );

        let bw = soft.threshold(180).expect("threshold");
        assert_eq!(bw.kind(), EdgeMapKind::Binary);
        assert_eq!(bw.num_segments(), 1);
        assert_eq!(
            bw.segments()[0].pixels(),
            &[px(0, 1), px(0, 2), px(1, 2)]
        );
    }

    #[test]
    fn segment_iteration_is_restartable() {
        let map = EdgeMap::from_segments(4, 1, vec![vec![px(0, 0), px(0, 1), px(0, 2)]])
            .expect("valid chain");
        let seg = &map.segments()[0];

        let first: Vec<Pixel> = seg.iter().copied().collect();
        let second: Vec<Pixel> = seg.into_iter().copied().collect();
        assert_eq!(first, second);
        assert_eq!(seg.len(), 3);
        assert_eq!(seg.first(), Some(px(0, 0)));
        assert_eq!(seg.last(), Some(px(0, 2)));
    }

    #[test]
    fn serializes_segments_without_raster() {
        let map = EdgeMap::from_segments(2, 2, vec![vec![px(0, 0), px(1, 1)]])
            .expect("valid chain");
        let json = serde_json::to_value(&map).expect("serialize");

        assert_eq!(json["width"], 2);
        assert_eq!(json["kind"], "binary");
        assert_eq!(json["segments"][0][1]["row"], 1);
        assert!(json.get("edge_img").is_none());
    }
}
