//! Thresholding and 8-connected chain tracing.
//!
//! Pixels with strength `>= cutoff` are "on". The raster is scanned in
//! row-major order; every unclaimed "on" pixel seeds a new segment:
//! 1. walk forward from the seed, always stepping to the first unclaimed
//!    "on" neighbour in the order E, S, W, N, SE, SW, NW, NE,
//! 2. walk again from the seed to collect the other branch,
//! 3. the segment is `reverse(branch 2) + seed + branch 1`.
//!
//! Orthogonal neighbours are tried before diagonal ones. Each pixel is
//! claimed by exactly one segment.

use ec_core::{ImageView, Pixel, try_alloc};
use tracing::trace;

use crate::edge_map::{Segment, collect_segment};
use crate::error::{check_cutoff, check_dimensions, push_checked};
use crate::{ContourError, EdgeMap};

const DCOL: [isize; 8] = [1, 0, -1, 0, 1, -1, -1, 1];
const DROW: [isize; 8] = [0, 1, 0, -1, 1, 1, -1, -1];

const OFF: u8 = 0;
const ON: u8 = 1;
const CLAIMED: u8 = 2;

/// Binarizes `raster` at `cutoff` (`0..=255`) and traces the "on" pixels
/// into a binary [`EdgeMap`].
pub fn extract_segments(raster: &ImageView<'_, u8>, cutoff: i32) -> Result<EdgeMap, ContourError> {
    let cutoff = check_cutoff(cutoff)?;
    let (w, h) = (raster.width(), raster.height());
    let n = check_dimensions(w, h)?;

    let mut state = try_alloc(n, OFF)?;
    let mut on = 0usize;
    for y in 0..h {
        for (x, &v) in raster.row(y).iter().enumerate() {
            if v >= cutoff {
                state[y * w + x] = ON;
                on += 1;
            }
        }
    }

    let mut segments: Vec<Segment> = Vec::new();
    let mut chain = Vec::new();
    let mut branch = Vec::new();
    for seed in 0..n {
        if state[seed] != ON {
            continue;
        }
        trace_segment(seed, w, h, &mut state, &mut chain, &mut branch)?;
        collect_segment(&mut chain, &mut segments)?;
    }

    trace!(
        width = w,
        height = h,
        cutoff,
        on,
        segments = segments.len(),
        "extracted segments"
    );

    EdgeMap::from_traced(w, h, segments)
}

fn trace_segment(
    seed: usize,
    w: usize,
    h: usize,
    state: &mut [u8],
    chain: &mut Vec<Pixel>,
    branch: &mut Vec<Pixel>,
) -> Result<(), ContourError> {
    state[seed] = CLAIMED;

    chain.clear();
    branch.clear();
    walk(seed, w, h, state, branch)?;
    let forward = branch.len();
    walk(seed, w, h, state, branch)?;

    chain
        .try_reserve_exact(branch.len() + 1)
        .map_err(|_| ContourError::AllocationFailure {
            len: branch.len() + 1,
        })?;
    chain.extend(branch[forward..].iter().rev());
    chain.push(Pixel::from_index(seed, w));
    chain.extend_from_slice(&branch[..forward]);
    Ok(())
}

/// Greedy walk from `start`, appending claimed pixels to `out`.
fn walk(
    start: usize,
    w: usize,
    h: usize,
    state: &mut [u8],
    out: &mut Vec<Pixel>,
) -> Result<(), ContourError> {
    let mut cur = start;
    while let Some(next) = next_on_neighbor(cur, w, h, state) {
        state[next] = CLAIMED;
        push_checked(out, Pixel::from_index(next, w))?;
        cur = next;
    }
    Ok(())
}

#[inline]
fn next_on_neighbor(p: usize, w: usize, h: usize, state: &[u8]) -> Option<usize> {
    let row = (p / w) as isize;
    let col = (p % w) as isize;
    (0..8).find_map(|dir| {
        let r = row + DROW[dir];
        let c = col + DCOL[dir];
        if r < 0 || c < 0 || r >= h as isize || c >= w as isize {
            return None;
        }
        let idx = r as usize * w + c as usize;
        (state[idx] == ON).then_some(idx)
    })
}
