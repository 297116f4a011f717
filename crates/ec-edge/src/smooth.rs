use ec_core::Border;

use crate::GaussianKernel;

/// Separable smoothing of a contiguous `width x height` plane.
///
/// The horizontal pass writes into `tmp`, the vertical pass into `dst`.
/// All three buffers must hold `width * height` elements.
pub fn smooth_separable(
    src: &[f32],
    width: usize,
    height: usize,
    kernel: &GaussianKernel,
    border: Border,
    tmp: &mut [f32],
    dst: &mut [f32],
) {
    let n = width * height;
    assert_eq!(src.len(), n, "src must match plane size");
    assert_eq!(tmp.len(), n, "tmp must match plane size");
    assert_eq!(dst.len(), n, "dst must match plane size");
    if n == 0 {
        return;
    }

    let rows = Axis {
        len: width,
        lines: height,
        step: 1,
        line_step: width,
    };
    let cols = Axis {
        len: height,
        lines: width,
        step: width,
        line_step: 1,
    };

    convolve_axis(src, tmp, rows, kernel, border);
    convolve_axis(tmp, dst, cols, kernel, border);
}

#[derive(Debug, Clone, Copy)]
struct Axis {
    len: usize,
    lines: usize,
    step: usize,
    line_step: usize,
}

fn convolve_axis(src: &[f32], dst: &mut [f32], axis: Axis, kernel: &GaussianKernel, border: Border) {
    let taps = kernel.taps();
    let radius = kernel.radius();
    let len = axis.len;

    let interior_start = radius;
    let interior_end = len.saturating_sub(radius);

    for line in 0..axis.lines {
        let base = line * axis.line_step;

        for i in 0..len {
            let mut acc = 0.0f32;
            if i >= interior_start && i < interior_end {
                let first = base + (i - radius) * axis.step;
                for (k, &tap) in taps.iter().enumerate() {
                    acc += src[first + k * axis.step] * tap;
                }
            } else {
                for (k, &tap) in taps.iter().enumerate() {
                    let j = border
                        .resolve(i as isize + k as isize - radius as isize, len)
                        .unwrap_or(i);
                    acc += src[base + j * axis.step] * tap;
                }
            }
            dst[base + i * axis.step] = acc;
        }
    }
}
