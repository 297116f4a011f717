/// Backward-difference Prewitt response of one smoothed plane.
///
/// `gx` at `(x, y)` is the mean over rows `y-1..=y+1` of `s(x) - s(x-1)`,
/// `gy` the mean over columns `x-1..=x+1` of `s(y) - s(y-1)`. Indices are
/// replicated at the border, so the first column/row has zero response
/// along its own axis.
pub(crate) fn prewitt_backward(s: &[f32], w: usize, h: usize, gx: &mut [f32], gy: &mut [f32]) {
    for y in 0..h {
        let ym1 = y.saturating_sub(1);
        let yp1 = (y + 1).min(h - 1);
        for x in 0..w {
            let xm1 = x.saturating_sub(1);
            let xp1 = (x + 1).min(w - 1);

            let dx = (s[ym1 * w + x] - s[ym1 * w + xm1])
                + (s[y * w + x] - s[y * w + xm1])
                + (s[yp1 * w + x] - s[yp1 * w + xm1]);
            let dy = (s[y * w + xm1] - s[ym1 * w + xm1])
                + (s[y * w + x] - s[ym1 * w + x])
                + (s[y * w + xp1] - s[ym1 * w + xp1]);

            let idx = y * w + x;
            gx[idx] = dx / 3.0;
            gy[idx] = dy / 3.0;
        }
    }
}

pub(crate) fn magnitude(gx: &[f32], gy: &[f32], mag: &mut [f32]) {
    for ((m, &x), &y) in mag.iter_mut().zip(gx).zip(gy) {
        *m = (x * x + y * y).sqrt();
    }
}

/// Adds one channel's gradient to the DiZenzo structure tensor.
pub(crate) fn accumulate_tensor(
    gx: &[f32],
    gy: &[f32],
    txx: &mut [f32],
    tyy: &mut [f32],
    txy: &mut [f32],
) {
    for i in 0..gx.len() {
        txx[i] += gx[i] * gx[i];
        tyy[i] += gy[i] * gy[i];
        txy[i] += gx[i] * gy[i];
    }
}

/// Resolves the structure tensor into a direction vector and a magnitude.
///
/// The magnitude is `sqrt(lambda_max / channels)`; the direction is the
/// principal eigenvector, returned in `(gx, gy)` scaled by the magnitude.
/// The sign of the direction is arbitrary.
pub(crate) fn dizenzo_resolve(
    txx: &[f32],
    tyy: &[f32],
    txy: &[f32],
    channels: usize,
    gx: &mut [f32],
    gy: &mut [f32],
    mag: &mut [f32],
) {
    let norm = channels.max(1) as f32;
    for i in 0..txx.len() {
        let (a, b, c) = (txx[i], tyy[i], txy[i]);
        let disc = ((a - b) * (a - b) + 4.0 * c * c).sqrt();
        let lambda = 0.5 * (a + b + disc);
        let m = (lambda / norm).max(0.0).sqrt();
        let theta = 0.5 * (2.0 * c).atan2(a - b);

        gx[i] = m * theta.cos();
        gy[i] = m * theta.sin();
        mag[i] = m;
    }
}
