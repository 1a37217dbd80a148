use crate::error::{Degeneracy, HomographyError};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};
use serde::{Deserialize, Serialize};

/// Smallest accepted ratio between the extreme singular values of the
/// (column-equilibrated) normal-equations matrix.
const MIN_RECIPROCAL_CONDITION: f64 = 1e-12;
/// Relative tolerance for coincident / collinear point tests.
const LAYOUT_EPS: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_fn(|r, c| rows[r][c]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        let h = &self.h;
        [
            [h[(0, 0)], h[(0, 1)], h[(0, 2)]],
            [h[(1, 0)], h[(1, 1)], h[(1, 2)]],
            [h[(2, 0)], h[(2, 1)], h[(2, 2)]],
        ]
    }

    /// Map a point through the projective transform. The result is not finite
    /// when `p` lies on the line at infinity of `h`.
    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0] / v[2], v[1] / v[2])
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

/// One point pair; the solved homography maps `from` onto `to`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    pub from: Point2<f64>,
    pub to: Point2<f64>,
}

impl Correspondence {
    pub fn new(from: Point2<f64>, to: Point2<f64>) -> Self {
        Self { from, to }
    }
}

/// Exactly four non-degenerate correspondences.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorrespondenceSet([Correspondence; 4]);

impl CorrespondenceSet {
    /// Validate four correspondences: no two `from` (or `to`) points may
    /// coincide and no three may be collinear.
    pub fn new(pairs: [Correspondence; 4]) -> Result<Self, HomographyError> {
        check_layout(&pairs.map(|c| c.from))?;
        check_layout(&pairs.map(|c| c.to))?;
        Ok(Self(pairs))
    }

    pub fn from_points(
        from: [Point2<f64>; 4],
        to: [Point2<f64>; 4],
    ) -> Result<Self, HomographyError> {
        Self::new(std::array::from_fn(|i| Correspondence::new(from[i], to[i])))
    }

    #[inline]
    pub fn pairs(&self) -> &[Correspondence; 4] {
        &self.0
    }
}

impl TryFrom<&[Correspondence]> for CorrespondenceSet {
    type Error = HomographyError;

    fn try_from(pairs: &[Correspondence]) -> Result<Self, Self::Error> {
        let got = pairs.len();
        let fixed: [Correspondence; 4] = pairs.try_into().map_err(|_| {
            HomographyError::DegenerateConfiguration(if got < 4 {
                Degeneracy::TooFewCorrespondences { got }
            } else {
                Degeneracy::TooManyCorrespondences { got }
            })
        })?;
        Self::new(fixed)
    }
}

fn check_layout(pts: &[Point2<f64>; 4]) -> Result<(), HomographyError> {
    let degenerate = HomographyError::DegenerateConfiguration;

    let scale = pts
        .iter()
        .flat_map(|p| [p.x.abs(), p.y.abs()])
        .fold(1.0_f64, f64::max);

    for i in 0..4 {
        for j in (i + 1)..4 {
            // negated so that NaN coordinates are rejected too
            if !((pts[i] - pts[j]).norm() > LAYOUT_EPS * scale) {
                return Err(degenerate(Degeneracy::CoincidentPoints));
            }
        }
    }

    for (i, j, k) in [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)] {
        let u = pts[j] - pts[i];
        let v = pts[k] - pts[i];
        let cross = u.x * v.y - u.y * v.x;
        if cross.abs() <= LAYOUT_EPS * u.norm() * v.norm() {
            return Err(degenerate(Degeneracy::CollinearPoints));
        }
    }

    Ok(())
}

/// Solve for H such that `to ~ H * from` from exactly four correspondences.
///
/// Unknowns are `[h00 h01 h02 h10 h11 h12 h20 h21]` with `h22 = 1`. For every
/// pair `(x, y) -> (x̄, ȳ)` two rows are added:
///
/// ```text
/// [x y 1 0 0 0 -x·x̄ -y·x̄] h = x̄
/// [0 0 0 x y 1 -x·ȳ -y·ȳ] h = ȳ
/// ```
///
/// and the normal equations `(AᵀA) h = Aᵀb` are solved. The columns of `A`
/// are equilibrated first; this leaves the solution unchanged but keeps the
/// singularity test meaningful for pixel-scale coordinates.
pub fn homography_from_correspondences(
    set: &CorrespondenceSet,
) -> Result<Homography, HomographyError> {
    let singular = HomographyError::DegenerateConfiguration(Degeneracy::SingularSystem);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for (k, c) in set.pairs().iter().enumerate() {
        let (x, y) = (c.from.x, c.from.y);
        let (u, v) = (c.to.x, c.to.y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -x * u;
        a[(r0, 7)] = -y * u;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -x * v;
        a[(r1, 7)] = -y * v;
        b[r1] = v;
    }

    // D = diag(1 / ||A_j||); solve (D AᵀA D) z = D Aᵀb, then h = D z.
    let mut d = SVector::<f64, 8>::zeros();
    for j in 0..8 {
        let n = a.column(j).norm();
        if !(n > 0.0) || !n.is_finite() {
            return Err(singular);
        }
        d[j] = 1.0 / n;
    }
    let scale = SMatrix::<f64, 8, 8>::from_diagonal(&d);

    let ata = scale * (a.transpose() * a) * scale;
    let atb = scale * (a.transpose() * b);

    let sv = ata.singular_values();
    let (s_max, s_min) = (sv.max(), sv.min());
    if !(s_max > 0.0) || !(s_min / s_max > MIN_RECIPROCAL_CONDITION) {
        log::debug!("normal equations rejected: singular values {s_min:e}..{s_max:e}");
        return Err(singular);
    }

    let z = ata.lu().solve(&atb).ok_or(singular)?;
    let h = scale * z;
    if h.iter().any(|v| !v.is_finite()) {
        return Err(singular);
    }

    Ok(Homography::new(Matrix3::new(
        h[0], h[1], h[2], //
        h[3], h[4], h[5], //
        h[6], h[7], 1.0,
    )))
}
