use ec_core::ImageView;

use crate::EdgeError;

/// Detector input: one gray plane or three colour planes of equal size.
#[derive(Debug, Clone, Copy)]
pub enum Channels<'a> {
    Gray(ImageView<'a, u8>),
    Rgb([ImageView<'a, u8>; 3]),
}

impl<'a> Channels<'a> {
    pub fn gray(view: ImageView<'a, u8>) -> Self {
        Self::Gray(view)
    }

    /// Builds colour input, rejecting planes whose size differs from `red`.
    pub fn rgb(
        red: ImageView<'a, u8>,
        green: ImageView<'a, u8>,
        blue: ImageView<'a, u8>,
    ) -> Result<Self, EdgeError> {
        let planes = [red, green, blue];
        for (index, p) in planes.iter().enumerate().skip(1) {
            if p.width() != red.width() || p.height() != red.height() {
                return Err(EdgeError::ChannelSizeMismatch {
                    index,
                    width: red.width(),
                    height: red.height(),
                    actual_width: p.width(),
                    actual_height: p.height(),
                });
            }
        }
        Ok(Self::Rgb(planes))
    }

    pub fn width(&self) -> usize {
        self.planes()[0].width()
    }

    pub fn height(&self) -> usize {
        self.planes()[0].height()
    }

    pub fn is_color(&self) -> bool {
        matches!(self, Self::Rgb(_))
    }

    pub fn planes(&self) -> &[ImageView<'a, u8>] {
        match self {
            Self::Gray(v) => core::slice::from_ref(v),
            Self::Rgb(p) => p,
        }
    }
}
