//! Mutual information between two labeled sections over their overlap.
//!
//! Sections are `(ny, nx)` label grids; `EXCLUDED` marks pixels that take no
//! part (masked or unlabeled). For a pair shift `(dx, dy)`, pixel `A[x, y]` is
//! paired with `B[x + dx, y + dy]`. The joint histogram is accumulated as
//! per-thread partial maps and merged at the end.

use hashbrown::HashMap;
use ndarray::{s, ArrayView2};
use rayon::prelude::*;

/// Label of a pixel excluded from every histogram.
pub const EXCLUDED: u32 = u32::MAX;

type JointHistogram = HashMap<(u32, u32), u64>;

/// Maps `value` in `[min, max]` onto `0..bins`. A degenerate range maps
/// everything to bin 0.
#[inline]
pub fn bin_index(value: f64, min: f64, max: f64, bins: usize) -> u32 {
    if !(max > min) || bins <= 1 {
        return 0;
    }
    let t = (value - min) / (max - min);
    ((t * bins as f64) as usize).min(bins - 1) as u32
}

/// The overlapping windows of `a` and `b` under shift `(dx, dy)`, or `None`
/// when they do not overlap.
pub fn overlap<'a>(
    a: &ArrayView2<'a, u32>,
    b: &ArrayView2<'a, u32>,
    dx: i32,
    dy: i32,
) -> Option<(ArrayView2<'a, u32>, ArrayView2<'a, u32>)> {
    let (a, b): (ArrayView2<'a, u32>, ArrayView2<'a, u32>) = (*a, *b);
    let (ny, nx) = a.dim();
    let (x0, x1) = axis_range(nx, dx)?;
    let (y0, y1) = axis_range(ny, dy)?;
    let bx = |x: usize| (x as i64 + dx as i64) as usize;
    let by = |y: usize| (y as i64 + dy as i64) as usize;
    let wa = a.slice_move(s![y0..y1, x0..x1]);
    let wb = b.slice_move(s![by(y0)..by(y1), bx(x0)..bx(x1)]);
    Some((wa, wb))
}

fn axis_range(n: usize, d: i32) -> Option<(usize, usize)> {
    let n = n as i64;
    let d = d as i64;
    let lo = 0i64.max(-d);
    let hi = n.min(n - d);
    if lo >= hi {
        return None;
    }
    Some((lo as usize, hi as usize))
}

fn joint_histogram(a: &ArrayView2<'_, u32>, b: &ArrayView2<'_, u32>) -> JointHistogram {
    (0..a.nrows())
        .into_par_iter()
        .fold(JointHistogram::new, |mut hist, row| {
            for (&la, &lb) in a.row(row).iter().zip(b.row(row).iter()) {
                if la != EXCLUDED && lb != EXCLUDED {
                    *hist.entry((la, lb)).or_insert(0) += 1;
                }
            }
            hist
        })
        .reduce(JointHistogram::new, |mut left, right| {
            for (key, count) in right {
                *left.entry(key).or_insert(0) += count;
            }
            left
        })
}

/// `Σ p(a,b)·ln(p(a,b) / (p(a)·p(b)))` over the overlap; `-∞` when the overlap
/// holds no included pixel pair.
pub fn mutual_information(a: &ArrayView2<'_, u32>, b: &ArrayView2<'_, u32>, dx: i32, dy: i32) -> f64 {
    let Some((wa, wb)) = overlap(&a.view(), &b.view(), dx, dy) else {
        return f64::NEG_INFINITY;
    };
    let joint = joint_histogram(&wa, &wb);
    let total: u64 = joint.values().sum();
    if total == 0 {
        return f64::NEG_INFINITY;
    }

    let mut pa: HashMap<u32, u64> = HashMap::new();
    let mut pb: HashMap<u32, u64> = HashMap::new();
    for (&(la, lb), &count) in &joint {
        *pa.entry(la).or_insert(0) += count;
        *pb.entry(lb).or_insert(0) += count;
    }

    let n = total as f64;
    joint
        .iter()
        .map(|(&(la, lb), &count)| {
            let p_ab = count as f64 / n;
            let p_a = pa[&la] as f64 / n;
            let p_b = pb[&lb] as f64 / n;
            p_ab * (p_ab / (p_a * p_b)).ln()
        })
        .sum()
}
