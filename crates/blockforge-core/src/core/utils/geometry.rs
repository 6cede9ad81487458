use nalgebra::{Matrix3, Point3, Unit, Vector3};
use thiserror::Error;

/// Vectors shorter than this cannot be normalized.
pub const ZERO_VECTOR_EPSILON: f64 = 1e-10;

/// Relative tolerance on the second-largest covariance eigenvalue below which a
/// point cloud is treated as collinear.
const COLLINEAR_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Cannot compute a centroid over an empty atom selection")]
    EmptySelection,
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),
    #[error("Cannot normalize a vector of near-zero magnitude")]
    ZeroVector,
    #[error("Atom index {index} is out of range for a molecule with {atom_count} atoms")]
    AtomOutOfRange { index: usize, atom_count: usize },
}

/// A plane `normal . x = offset` with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Unit<Vector3<f64>>,
    pub offset: f64,
}

impl Plane {
    /// Plane coefficients `(a, b, c, d)` satisfying `ax + by + cz = d`.
    pub fn coefficients(&self) -> [f64; 4] {
        [self.normal.x, self.normal.y, self.normal.z, self.offset]
    }

    /// Signed distance of `point` from the plane along the normal.
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Returns the same plane with the normal flipped when needed so that it
    /// points along `reference`.
    ///
    /// The dot product of the result with `reference` is never negative.
    /// When it is exactly zero, or `reference` has (near-)zero length, the
    /// normal is oriented so that its largest-magnitude component is positive.
    pub fn oriented_towards(self, reference: &Vector3<f64>) -> Self {
        let cosine = if reference.norm() < ZERO_VECTOR_EPSILON {
            0.0
        } else {
            self.normal.dot(reference)
        };

        let flip = if cosine == 0.0 {
            let dominant = self
                .normal
                .iter()
                .copied()
                .max_by(|a, b| a.abs().total_cmp(&b.abs()))
                .unwrap_or(0.0);
            dominant < 0.0
        } else {
            cosine < 0.0
        };

        if flip {
            Self {
                normal: -self.normal,
                offset: -self.offset,
            }
        } else {
            self
        }
    }
}

/// Arithmetic mean of a set of points.
pub fn centroid<'a, I>(points: I) -> Result<Point3<f64>, GeometryError>
where
    I: IntoIterator<Item = &'a Point3<f64>>,
{
    let mut sum = Vector3::zeros();
    let mut count = 0usize;
    for point in points {
        sum += point.coords;
        count += 1;
    }
    if count == 0 {
        return Err(GeometryError::EmptySelection);
    }
    Ok(Point3::from(sum / count as f64))
}

/// Normalizes `vector`, refusing near-zero input instead of producing NaN.
pub fn normalize(vector: &Vector3<f64>) -> Result<Unit<Vector3<f64>>, GeometryError> {
    Unit::try_new(*vector, ZERO_VECTOR_EPSILON).ok_or(GeometryError::ZeroVector)
}

/// Least-squares plane through `points`.
///
/// The normal is the eigenvector of the covariance matrix with the smallest
/// eigenvalue. Fewer than three points, or points that are (nearly)
/// collinear, yield [`GeometryError::DegenerateGeometry`]. The orientation of
/// the returned normal is unspecified; see [`Plane::oriented_towards`].
pub fn fit_plane(points: &[Point3<f64>]) -> Result<Plane, GeometryError> {
    if points.len() < 3 {
        return Err(GeometryError::DegenerateGeometry(format!(
            "a plane needs at least 3 points, got {}",
            points.len()
        )));
    }

    let center = centroid(points)?;
    let covariance = points
        .iter()
        .map(|p| {
            let d = p - center;
            d * d.transpose()
        })
        .fold(Matrix3::zeros(), |acc, m| acc + m);

    let eigen = covariance.symmetric_eigen();
    let mut order = [0usize, 1, 2];
    order.sort_by(|&i, &j| eigen.eigenvalues[i].total_cmp(&eigen.eigenvalues[j]));
    let (smallest, middle, largest) = (order[0], order[1], order[2]);

    let spread = eigen.eigenvalues[largest].max(0.0);
    if eigen.eigenvalues[middle] <= COLLINEAR_TOLERANCE * (1.0 + spread) {
        return Err(GeometryError::DegenerateGeometry(
            "points are collinear or coincident".to_string(),
        ));
    }

    let normal = normalize(&eigen.eigenvectors.column(smallest).into_owned())?;
    Ok(Plane {
        normal,
        offset: normal.dot(&center.coords),
    })
}

/// Any unit vector perpendicular to `axis`.
pub fn any_perpendicular(axis: &Unit<Vector3<f64>>) -> Unit<Vector3<f64>> {
    let helper = if axis.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    Unit::new_normalize(axis.cross(&helper))
}
