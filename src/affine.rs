/// A 2D affine transform stored as six numbers in column-major order.
///
/// `[a, b, c, d, e, f]` maps a point with
/// `x' = a*x + c*y + e` and `y' = b*x + d*y + f`, the same layout the
/// canvas `setTransform` call takes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine {
    pub data: [f64; 6],
}

impl Affine {
    /// Identity matrix (no transformation)
    pub const IDENTITY: Self = Self {
        data: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self {
            data: [a, b, c, d, e, f],
        }
    }

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Create a translation transform
    pub fn translation(x: f64, y: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    /// Create a rotation transform (radians)
    pub fn rotation(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Create a non-uniform scale transform
    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn skewing_x(angle: f64) -> Self {
        Self::new(1.0, 0.0, angle.tan(), 1.0, 0.0, 0.0)
    }

    pub fn skewing_y(angle: f64) -> Self {
        Self::new(1.0, angle.tan(), 0.0, 1.0, 0.0, 0.0)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Right-multiply `other` onto this matrix in place.
    ///
    /// The result applies `other` first and then the previous value of
    /// `self`, so `self` stays the outer transform.
    pub fn compose(&mut self, other: &Affine) -> &mut Self {
        let [a1, b1, c1, d1, e1, f1] = self.data;
        let [a2, b2, c2, d2, e2, f2] = other.data;
        self.data = [
            a1 * a2 + c1 * b2,
            b1 * a2 + d1 * b2,
            a1 * c2 + c1 * d2,
            b1 * c2 + d1 * d2,
            a1 * e2 + c1 * f2 + e1,
            b1 * e2 + d1 * f2 + f1,
        ];
        self
    }

    /// Non-mutating form of [`Affine::compose`].
    pub fn then(&self, other: &Affine) -> Affine {
        let mut out = *self;
        out.compose(other);
        out
    }

    pub fn apply_to_point(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, e, f] = self.data;
        (x * a + y * c + e, x * b + y * d + f)
    }

    /// Apply only the linear part, ignoring translation.
    pub fn apply_to_vector(&self, x: f64, y: f64) -> (f64, f64) {
        let [a, b, c, d, _, _] = self.data;
        (x * a + y * c, x * b + y * d)
    }

    pub fn determinant(&self) -> f64 {
        let [a, b, c, d, _, _] = self.data;
        a * d - b * c
    }

    /// Compute the inverse of this transform.
    ///
    /// A zero determinant is not guarded: the result holds non-finite values
    /// and every point mapped through it is non-finite too.
    pub fn invert(&self) -> Affine {
        let [a, b, c, d, e, f] = self.data;
        let det = a * d - b * c;
        Affine::new(
            d / det,
            -b / det,
            -c / det,
            a / det,
            (c * f - d * e) / det,
            (b * e - a * f) / det,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    pub fn translate(&mut self, x: f64, y: f64) -> &mut Self {
        if x != 0.0 || y != 0.0 {
            self.compose(&Affine::translation(x, y));
        }
        self
    }

    /// Rotate by `angle` radians, optionally about the pivot `(cx, cy)`.
    pub fn rotate(&mut self, angle: f64, pivot: Option<(f64, f64)>) -> &mut Self {
        if angle == 0.0 {
            return self;
        }
        match pivot {
            Some((cx, cy)) => {
                self.translate(cx, cy);
                self.compose(&Affine::rotation(angle));
                self.translate(-cx, -cy)
            }
            None => self.compose(&Affine::rotation(angle)),
        }
    }

    pub fn scale(&mut self, sx: f64, sy: f64) -> &mut Self {
        if sx != 1.0 || sy != 1.0 {
            self.compose(&Affine::scaling(sx, sy));
        }
        self
    }

    pub fn skew_x(&mut self, angle: f64) -> &mut Self {
        if angle != 0.0 {
            self.compose(&Affine::skewing_x(angle));
        }
        self
    }

    pub fn skew_y(&mut self, angle: f64) -> &mut Self {
        if angle != 0.0 {
            self.compose(&Affine::skewing_y(angle));
        }
        self
    }

    /// Length of the longer of the two transformed unit axes.
    pub fn max_axis_scale(&self) -> f64 {
        let [a, b, c, d, _, _] = self.data;
        (a * a + b * b).max(c * c + d * d).sqrt()
    }

    /// Split into translate, rotate, scale, rotate for surfaces that have no
    /// way of setting a full matrix.
    pub fn decompose(&self) -> Decomposed {
        let m = Linear::from(self);
        let mut out = Decomposed {
            dx: self.data[4],
            dy: self.data[5],
            ..Decomposed::default()
        };

        if near(m.xy, 0.0) && near(m.yx, 0.0) {
            out.sx = m.xx;
            out.sy = m.yy;
            return out;
        }
        if near(m.xx * m.yx, -m.xy * m.yy) {
            scale_rotate(&m, &mut out);
            return out;
        }
        if near(m.xx * m.xy, -m.yx * m.yy) {
            rotate_scale(&m, &mut out);
            return out;
        }

        // General case: singular value decomposition M = U * S * V^T
        let mt = m.transposed();
        let (u1, u2) = eigenvectors(&m.mul(&mt));
        let (v1, v2) = eigenvectors(&mt.mul(&m));
        let u = Linear {
            xx: u1.0,
            xy: u2.0,
            yx: u1.1,
            yy: u2.1,
        };
        let vt = Linear {
            xx: v1.0,
            xy: v1.1,
            yx: v2.0,
            yy: v2.1,
        };
        let mut s = u.inverse().mul(&m).mul(&vt.inverse());

        scale_rotate(&vt, &mut out);
        s.xx *= out.sx;
        s.yy *= out.sy;
        rotate_scale(&u, &mut out);
        s.xx *= out.sx;
        s.yy *= out.sy;
        out.sx = s.xx;
        out.sy = s.yy;
        out
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[f64; 6]> for Affine {
    fn from(data: [f64; 6]) -> Self {
        Self { data }
    }
}

/// Result of [`Affine::decompose`].
///
/// Recomposes as `translate(dx, dy) * rotate(angle2) * scale(sx, sy) * rotate(angle1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decomposed {
    pub dx: f64,
    pub dy: f64,
    pub angle1: f64,
    pub sx: f64,
    pub sy: f64,
    pub angle2: f64,
}

impl Default for Decomposed {
    fn default() -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            angle1: 0.0,
            sx: 1.0,
            sy: 1.0,
            angle2: 0.0,
        }
    }
}

impl Decomposed {
    pub fn to_affine(&self) -> Affine {
        let mut m = Affine::translation(self.dx, self.dy);
        m.compose(&Affine::rotation(self.angle2))
            .compose(&Affine::scaling(self.sx, self.sy))
            .compose(&Affine::rotation(self.angle1));
        m
    }
}

fn near(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * (a.abs() + b.abs())
}

/// Divide by whichever denominator is further from zero.
fn steadier_quotient(n1: f64, d1: f64, n2: f64, d2: f64) -> f64 {
    if d1.abs() >= d2.abs() {
        n1 / d1
    } else {
        n2 / d2
    }
}

/// 2x2 linear part in row-major naming: `xx xy / yx yy`.
#[derive(Clone, Copy, Debug)]
struct Linear {
    xx: f64,
    xy: f64,
    yx: f64,
    yy: f64,
}

impl From<&Affine> for Linear {
    fn from(m: &Affine) -> Self {
        let [a, b, c, d, _, _] = m.data;
        Self {
            xx: a,
            xy: c,
            yx: b,
            yy: d,
        }
    }
}

impl Linear {
    fn mul(&self, r: &Linear) -> Linear {
        Linear {
            xx: self.xx * r.xx + self.xy * r.yx,
            xy: self.xx * r.xy + self.xy * r.yy,
            yx: self.yx * r.xx + self.yy * r.yx,
            yy: self.yx * r.xy + self.yy * r.yy,
        }
    }

    fn transposed(&self) -> Linear {
        Linear {
            xx: self.xx,
            xy: self.yx,
            yx: self.xy,
            yy: self.yy,
        }
    }

    fn inverse(&self) -> Linear {
        let det = self.xx * self.yy - self.xy * self.yx;
        Linear {
            xx: self.yy / det,
            xy: -self.xy / det,
            yx: -self.yx / det,
            yy: self.xx / det,
        }
    }

    fn sign(&self) -> f64 {
        if self.xx * self.yy < 0.0 || self.xy * self.yx > 0.0 {
            -1.0
        } else {
            1.0
        }
    }
}

/// Handles matrices of the form `S * R`, filling `angle1`.
fn scale_rotate(m: &Linear, out: &mut Decomposed) {
    let sign = m.sign();
    let angle =
        ((m.yx).atan2(m.yy) + (-sign * m.xy).atan2(sign * m.xx)) / 2.0;
    let (sin, cos) = angle.sin_cos();
    out.angle1 = angle;
    out.sx = steadier_quotient(m.xx, cos, -m.xy, sin);
    out.sy = steadier_quotient(m.yy, cos, m.yx, sin);
}

/// Handles matrices of the form `R * S`, filling `angle2`.
fn rotate_scale(m: &Linear, out: &mut Decomposed) {
    let sign = m.sign();
    let angle =
        ((sign * m.yx).atan2(sign * m.xx) + (-m.xy).atan2(m.yy)) / 2.0;
    let (sin, cos) = angle.sin_cos();
    out.angle2 = angle;
    out.sx = steadier_quotient(m.xx, cos, m.yx, sin);
    out.sy = steadier_quotient(m.yy, cos, -m.xy, sin);
}

/// Unit eigenvectors of a symmetric 2x2 matrix.
fn eigenvectors(m: &Linear) -> ((f64, f64), (f64, f64)) {
    let b = -m.xx - m.yy;
    let c = m.xx * m.yy - m.xy * m.yx;
    let d = (b * b - 4.0 * c).max(0.0).sqrt();
    let l1 = -(b + if b < 0.0 { -d } else { d }) / 2.0;
    let l2 = c / l1;

    if near(l1, l2) {
        return ((1.0, 0.0), (0.0, 1.0));
    }
    let v1 = eigenvector_for(m, l1);
    let v2 = eigenvector_for(m, l2);
    (normalize(v1), normalize(v2))
}

fn eigenvector_for(m: &Linear, l: f64) -> (f64, f64) {
    let vx = m.xy / (l - m.xx);
    if vx.is_finite() {
        return (vx, 1.0);
    }
    let vy = (l - m.xx) / m.xy;
    if vy.is_finite() {
        return (1.0, vy);
    }
    let vx = (l - m.yy) / m.yx;
    if vx.is_finite() {
        return (vx, 1.0);
    }
    (1.0, m.yx / (l - m.yy))
}

fn normalize((x, y): (f64, f64)) -> (f64, f64) {
    let len = (x * x + y * y).sqrt();
    (x / len, y / len)
}
