//! Thin raster codec for the contour tools.
//!
//! Input is decoded with the `image` crate (PGM/PPM, plus PNG for
//! convenience) into `ec-core` rasters. Gray output is written as binary
//! PGM (`P5`, maxval 255, row-major, one byte per pixel) unless the target
//! path ends in `.png`.

use std::fs;
use std::path::Path;

use ec_contour::EdgeMap;
use ec_core::{Image, ImageView};
use ec_edge::Channels;
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{DynamicImage, ExtendedColorType, GrayImage, ImageEncoder, ImageFormat};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Core(#[from] ec_core::Error),
    #[error(transparent)]
    Contour(#[from] ec_contour::ContourError),
    #[error("unsupported raster: {0}")]
    UnsupportedFormat(String),
}

/// Three equally sized colour planes.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbPlanes {
    red: Image<u8>,
    green: Image<u8>,
    blue: Image<u8>,
}

impl RgbPlanes {
    /// Splits interleaved `RGBRGB...` samples.
    pub fn from_interleaved(width: usize, height: usize, rgb: &[u8]) -> Result<Self, IoError> {
        let n = width
            .checked_mul(height)
            .ok_or(ec_core::Error::AllocationFailure { len: usize::MAX })?;
        if rgb.len() != 3 * n {
            return Err(ec_core::Error::SizeMismatch {
                expected: 3 * n,
                actual: rgb.len(),
            }
            .into());
        }

        let mut planes = [
            ec_core::try_alloc(n, 0u8)?,
            ec_core::try_alloc(n, 0u8)?,
            ec_core::try_alloc(n, 0u8)?,
        ];
        for (i, px) in rgb.chunks_exact(3).enumerate() {
            planes[0][i] = px[0];
            planes[1][i] = px[1];
            planes[2][i] = px[2];
        }

        let [r, g, b] = planes;
        Ok(Self {
            red: Image::from_vec(width, height, r)?,
            green: Image::from_vec(width, height, g)?,
            blue: Image::from_vec(width, height, b)?,
        })
    }

    pub fn width(&self) -> usize {
        self.red.width()
    }

    pub fn height(&self) -> usize {
        self.red.height()
    }

    pub fn red(&self) -> &Image<u8> {
        &self.red
    }

    pub fn green(&self) -> &Image<u8> {
        &self.green
    }

    pub fn blue(&self) -> &Image<u8> {
        &self.blue
    }

    pub fn channels(&self) -> Channels<'_> {
        Channels::Rgb([self.red.as_view(), self.green.as_view(), self.blue.as_view()])
    }
}

/// Decoded input, gray or colour as stored in the file.
#[derive(Debug, Clone, PartialEq)]
pub enum Raster {
    Gray(Image<u8>),
    Rgb(RgbPlanes),
}

impl Raster {
    pub fn width(&self) -> usize {
        match self {
            Self::Gray(img) => img.width(),
            Self::Rgb(p) => p.width(),
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Self::Gray(img) => img.height(),
            Self::Rgb(p) => p.height(),
        }
    }

    pub fn is_color(&self) -> bool {
        matches!(self, Self::Rgb(_))
    }

    pub fn channels(&self) -> Channels<'_> {
        match self {
            Self::Gray(img) => Channels::gray(img.as_view()),
            Self::Rgb(p) => p.channels(),
        }
    }
}

fn load(bytes: &[u8]) -> Result<DynamicImage, IoError> {
    let img = image::load_from_memory(bytes)?;
    let color = img.color();
    if color.bytes_per_pixel() != color.channel_count() {
        return Err(IoError::UnsupportedFormat(format!(
            "{color:?} samples wider than 8 bits"
        )));
    }
    Ok(img)
}

fn luma_to_image(img: &DynamicImage) -> Result<Image<u8>, IoError> {
    let luma = img.to_luma8();
    let (w, h) = luma.dimensions();
    Ok(Image::from_vec(w as usize, h as usize, luma.into_raw())?)
}

fn rgb_to_planes(img: &DynamicImage) -> Result<RgbPlanes, IoError> {
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    RgbPlanes::from_interleaved(w as usize, h as usize, rgb.as_raw())
}

/// Decodes keeping the file's colour model.
pub fn decode(bytes: &[u8]) -> Result<Raster, IoError> {
    let img = load(bytes)?;
    if img.color().has_color() {
        Ok(Raster::Rgb(rgb_to_planes(&img)?))
    } else {
        Ok(Raster::Gray(luma_to_image(&img)?))
    }
}

/// Decodes to one gray plane; colour input is converted to luma.
pub fn decode_gray(bytes: &[u8]) -> Result<Image<u8>, IoError> {
    luma_to_image(&load(bytes)?)
}

/// Decodes to three planes; gray input is replicated.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbPlanes, IoError> {
    rgb_to_planes(&load(bytes)?)
}

fn contiguous_bytes(view: &ImageView<'_, u8>) -> Result<Vec<u8>, IoError> {
    match view.as_contiguous_slice() {
        Some(s) => Ok(s.to_vec()),
        None => Ok(view.to_image()?.into_raw()),
    }
}

fn dims_u32(view: &ImageView<'_, u8>) -> Result<(u32, u32), IoError> {
    let w = u32::try_from(view.width());
    let h = u32::try_from(view.height());
    match (w, h) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(IoError::UnsupportedFormat(format!(
            "{}x{} exceeds the codec size limit",
            view.width(),
            view.height()
        ))),
    }
}

/// Binary PGM bytes of `view`.
pub fn encode_gray(view: &ImageView<'_, u8>) -> Result<Vec<u8>, IoError> {
    let (w, h) = dims_u32(view)?;
    let data = contiguous_bytes(view)?;

    let mut out = Vec::new();
    PnmEncoder::new(&mut out)
        .with_subtype(PnmSubtype::Graymap(SampleEncoding::Binary))
        .write_image(&data, w, h, ExtendedColorType::L8)?;
    Ok(out)
}

pub fn read(path: impl AsRef<Path>) -> Result<Raster, IoError> {
    decode(&fs::read(path)?)
}

pub fn read_gray(path: impl AsRef<Path>) -> Result<Image<u8>, IoError> {
    decode_gray(&fs::read(path)?)
}

pub fn read_rgb(path: impl AsRef<Path>) -> Result<RgbPlanes, IoError> {
    decode_rgb(&fs::read(path)?)
}

/// Writes `view` as binary PGM, or PNG when the extension says so.
pub fn write_gray(path: impl AsRef<Path>, view: &ImageView<'_, u8>) -> Result<(), IoError> {
    let path = path.as_ref();
    if matches!(ImageFormat::from_path(path), Ok(ImageFormat::Png)) {
        let (w, h) = dims_u32(view)?;
        let gray = GrayImage::from_raw(w, h, contiguous_bytes(view)?).ok_or_else(|| {
            IoError::UnsupportedFormat(format!("{w}x{h} buffer does not match its size"))
        })?;
        gray.save_with_format(path, ImageFormat::Png)?;
    } else {
        fs::write(path, encode_gray(view)?)?;
    }
    debug!(path = %path.display(), width = view.width(), height = view.height(), "wrote raster");
    Ok(())
}

/// Saves the rendered raster of `map`: strengths for soft maps, `0`/`255`
/// regenerated from segments for binary maps.
pub fn save_edge_map(path: impl AsRef<Path>, map: &EdgeMap) -> Result<(), IoError> {
    let raster = map.render()?;
    write_gray(path, &raster.as_view())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use ec_contour::EdgeMap;
    use ec_core::{Image, ImageView, Pixel};

    use super::{
        IoError, Raster, RgbPlanes, decode, decode_gray, decode_rgb, encode_gray, read_gray,
        save_edge_map, write_gray,
    };

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ec-io-{}-{name}", std::process::id()))
    }

    #[test]
    fn encodes_binary_pgm() {
        let img = Image::from_vec(3, 2, vec![0u8, 10, 20, 30, 40, 255]).expect("raster");
        let bytes = encode_gray(&img.as_view()).expect("encode");

        assert!(bytes.starts_with(b"P5"));
        assert!(bytes.ends_with(&[0, 10, 20, 30, 40, 255]));
        assert_eq!(decode_gray(&bytes).expect("decode"), img);
    }

    #[test]
    fn strided_views_encode_visible_pixels() {
        let data = [1u8, 2, 99, 3, 4, 99];
        let view = ImageView::from_slice(2, 2, 3, &data).expect("view");
        let bytes = encode_gray(&view).expect("encode");
        assert!(bytes.ends_with(&[1, 2, 3, 4]));
    }

    #[test]
    fn decodes_ascii_and_binary_pnm() {
        let pgm = b"P2\n3 1\n255\n0 128 255\n";
        assert_eq!(decode_gray(pgm).expect("P2").data(), &[0, 128, 255]);

        let mut ppm = b"P6\n2 1\n255\n".to_vec();
        ppm.extend_from_slice(&[10, 20, 30, 40, 50, 60]);
        let planes = decode_rgb(&ppm).expect("P6");
        assert_eq!(planes.red().data(), &[10, 40]);
        assert_eq!(planes.green().data(), &[20, 50]);
        assert_eq!(planes.blue().data(), &[30, 60]);

        match decode(&ppm).expect("auto") {
            Raster::Rgb(p) => assert_eq!(p, planes),
            Raster::Gray(_) => panic!("colour file decoded as gray"),
        }
        assert!(!decode(pgm).expect("auto").is_color());
    }

    #[test]
    fn gray_input_replicates_into_planes() {
        let pgm = b"P5\n2 1\n255\n\x07\x09";
        let planes = decode_rgb(pgm).expect("decode");
        assert_eq!(planes.red(), planes.green());
        assert_eq!(planes.green(), planes.blue());
        assert!(planes.channels().is_color());
    }

    #[test]
    fn sixteen_bit_samples_are_rejected() {
        let pgm = b"P5\n1 1\n65535\n\x12\x34";
        assert!(matches!(decode_gray(pgm), Err(IoError::UnsupportedFormat(_))));
    }

    #[test]
    fn interleaved_length_is_checked() {
        assert!(RgbPlanes::from_interleaved(2, 2, &[0u8; 11]).is_err());
    }

    #[test]
    fn edge_map_round_trips_through_file() {
        let map = EdgeMap::from_segments(4, 3, vec![vec![Pixel::new(0, 0), Pixel::new(1, 1)]])
            .expect("map");
        let path = scratch("map.pgm");

        save_edge_map(&path, &map).expect("save");
        let back = read_gray(&path).expect("read");
        std::fs::remove_file(&path).expect("cleanup");

        assert_eq!((back.width(), back.height()), (4, 3));
        assert_eq!(back.get(0, 0), Some(&255));
        assert_eq!(back.get(1, 1), Some(&255));
        assert_eq!(back.data().iter().filter(|&&v| v == 255).count(), 2);
    }

    #[test]
    fn png_extension_selects_png() {
        let img = Image::from_vec(2, 2, vec![0u8, 64, 128, 255]).expect("raster");
        let path = scratch("preview.png");

        write_gray(&path, &img.as_view()).expect("write");
        let bytes = std::fs::read(&path).expect("read back");
        std::fs::remove_file(&path).expect("cleanup");

        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
        assert_eq!(decode_gray(&bytes).expect("decode"), img);
    }
}
