use nalgebra::{Matrix3, Vector3};

/// Unit cell of a periodic structure, described by its three cell vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicInfo {
    pub x_vector: Vector3<f64>,
    pub y_vector: Vector3<f64>,
    pub z_vector: Vector3<f64>,
}

fn angle_degrees(u: &Vector3<f64>, v: &Vector3<f64>) -> f64 {
    let cosine = (u.dot(v) / (u.norm() * v.norm())).clamp(-1.0, 1.0);
    cosine.acos().to_degrees()
}

impl PeriodicInfo {
    pub fn new(x_vector: Vector3<f64>, y_vector: Vector3<f64>, z_vector: Vector3<f64>) -> Self {
        Self {
            x_vector,
            y_vector,
            z_vector,
        }
    }

    /// Builds the cell from lattice lengths (Angstroms) and angles (degrees),
    /// with `a` along x and `b` in the xy-plane.
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let (alpha, beta, gamma) = (alpha.to_radians(), beta.to_radians(), gamma.to_radians());
        let x_vector = Vector3::new(a, 0.0, 0.0);
        let y_vector = Vector3::new(b * gamma.cos(), b * gamma.sin(), 0.0);
        let cx = c * beta.cos();
        let cy = c * (alpha.cos() - beta.cos() * gamma.cos()) / gamma.sin();
        let cz = (c * c - cx * cx - cy * cy).max(0.0).sqrt();
        Self::new(x_vector, y_vector, Vector3::new(cx, cy, cz))
    }

    pub fn a(&self) -> f64 {
        self.x_vector.norm()
    }

    pub fn b(&self) -> f64 {
        self.y_vector.norm()
    }

    pub fn c(&self) -> f64 {
        self.z_vector.norm()
    }

    /// Angle between the y and z cell vectors, in degrees.
    pub fn alpha(&self) -> f64 {
        angle_degrees(&self.y_vector, &self.z_vector)
    }

    /// Angle between the x and z cell vectors, in degrees.
    pub fn beta(&self) -> f64 {
        angle_degrees(&self.x_vector, &self.z_vector)
    }

    /// Angle between the x and y cell vectors, in degrees.
    pub fn gamma(&self) -> f64 {
        angle_degrees(&self.x_vector, &self.y_vector)
    }

    /// Cell vectors as matrix columns.
    pub fn cell_matrix(&self) -> Matrix3<f64> {
        Matrix3::from_columns(&[self.x_vector, self.y_vector, self.z_vector])
    }

    pub fn volume(&self) -> f64 {
        self.cell_matrix().determinant().abs()
    }
}
