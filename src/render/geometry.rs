use std::f32::consts::PI;

use glam::Vec3;
use itertools::Itertools;
use thiserror::Error;

use super::data::Vertex;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SphereParameters {
    /// Subdivisions from pole to pole.
    pub latitude_bands: u32,
    /// Subdivisions around the equator.
    pub longitude_bands: u32,
    pub radius: f32,
    /// Clamp vertex colors into [0, 1]. Off by default, in which case channels
    /// above 0.25 on the unit direction come out brighter than 1.0.
    pub clamp_colors: bool,
}

impl Default for SphereParameters {
    fn default() -> Self {
        Self {
            latitude_bands: 40,
            longitude_bands: 40,
            radius: 2.0,
            clamp_colors: false,
        }
    }
}

impl SphereParameters {
    pub fn new(latitude_bands: u32, longitude_bands: u32, radius: f32) -> Self {
        Self {
            latitude_bands,
            longitude_bands,
            radius,
            clamp_colors: false,
        }
    }

    pub fn with_clamped_colors(self, clamp_colors: bool) -> Self {
        Self {
            clamp_colors,
            ..self
        }
    }

    pub fn vertex_count(&self) -> Option<u32> {
        (self.latitude_bands.checked_add(1)?).checked_mul(self.longitude_bands.checked_add(1)?)
    }

    pub fn index_count(&self) -> Option<u32> {
        self.latitude_bands
            .checked_mul(self.longitude_bands)?
            .checked_mul(6)
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.latitude_bands < 1 {
            return Err(GeometryError::InvalidParameter {
                name: "latitude_bands",
                reason: format!("must be at least 1, got {}", self.latitude_bands),
            });
        }
        if self.longitude_bands < 1 {
            return Err(GeometryError::InvalidParameter {
                name: "longitude_bands",
                reason: format!("must be at least 1, got {}", self.longitude_bands),
            });
        }
        if !(self.radius > 0.0 && self.radius.is_finite()) {
            return Err(GeometryError::InvalidParameter {
                name: "radius",
                reason: format!("must be a positive finite number, got {}", self.radius),
            });
        }
        if self.vertex_count().is_none() || self.index_count().is_none() {
            return Err(GeometryError::InvalidParameter {
                name: "latitude_bands",
                reason: format!(
                    "{}x{} bands cannot be addressed with 32-bit indices",
                    self.latitude_bands, self.longitude_bands
                ),
            });
        }

        Ok(())
    }
}

/// Triangulated UV-sphere. Immutable once generated.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Mesh {
    pub fn get_vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn get_indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn vertex_data(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_data(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|triangle| [triangle[0], triangle[1], triangle[2]])
    }
}

fn vertex_color(direction: Vec3, clamp: bool) -> Vec3 {
    let color = (direction + Vec3::ONE) * 0.8;
    if clamp {
        color.clamp(Vec3::ZERO, Vec3::ONE)
    } else {
        color
    }
}

fn generate_vertices(parameters: &SphereParameters) -> Vec<Vertex> {
    let latitude_bands = parameters.latitude_bands;
    let longitude_bands = parameters.longitude_bands;

    (0..=latitude_bands)
        .cartesian_product(0..=longitude_bands)
        .map(|(lat, lon)| {
            let theta = lat as f32 * PI / latitude_bands as f32;
            let phi = lon as f32 * 2.0 * PI / longitude_bands as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let (sin_phi, cos_phi) = phi.sin_cos();

            let direction = Vec3::new(cos_phi * sin_theta, cos_theta, sin_phi * sin_theta);

            Vertex::new(
                direction * parameters.radius,
                direction,
                vertex_color(direction, parameters.clamp_colors),
            )
        })
        .collect()
}

// Two triangles per cell, (first, second, first + 1) and (second, second + 1, first + 1),
// which winds clockwise seen from outside the sphere.
fn generate_indices(latitude_bands: u32, longitude_bands: u32) -> Vec<u32> {
    (0..latitude_bands)
        .cartesian_product(0..longitude_bands)
        .flat_map(|(lat, lon)| {
            let first = lat * (longitude_bands + 1) + lon;
            let second = first + longitude_bands + 1;

            [first, second, first + 1, second, second + 1, first + 1]
        })
        .collect()
}

pub fn generate_sphere(parameters: &SphereParameters) -> Result<Mesh, GeometryError> {
    parameters.validate()?;

    let vertices = generate_vertices(parameters);
    let indices = generate_indices(parameters.latitude_bands, parameters.longitude_bands);

    Ok(Mesh { vertices, indices })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::*;

    fn reference_mesh() -> Mesh {
        generate_sphere(&SphereParameters::default()).unwrap()
    }

    #[rstest]
    #[case(1, 1)]
    #[case(1, 3)]
    #[case(2, 2)]
    #[case(3, 7)]
    #[case(40, 40)]
    #[case(17, 64)]
    fn buffer_sizes(#[case] latitude_bands: u32, #[case] longitude_bands: u32) {
        let parameters = SphereParameters::new(latitude_bands, longitude_bands, 1.0);
        let mesh = generate_sphere(&parameters).unwrap();

        assert_eq!(
            mesh.vertex_count(),
            ((latitude_bands + 1) * (longitude_bands + 1)) as usize
        );
        assert_eq!(
            mesh.index_count(),
            (latitude_bands * longitude_bands * 6) as usize
        );
        assert_eq!(Some(mesh.vertex_count() as u32), parameters.vertex_count());
        assert_eq!(Some(mesh.index_count() as u32), parameters.index_count());
        assert!(
            mesh.get_indices()
                .iter()
                .all(|&index| (index as usize) < mesh.vertex_count())
        );
    }

    #[rstest]
    #[case(0.5)]
    #[case(2.0)]
    #[case(100.0)]
    fn normals_are_unit_and_positions_on_radius(#[case] radius: f32) {
        let mesh = generate_sphere(&SphereParameters::new(12, 24, radius)).unwrap();

        for vertex in mesh.get_vertices() {
            assert_abs_diff_eq!(vertex.normal.length(), 1.0, epsilon = 1e-5);
            assert_abs_diff_eq!(vertex.position.length(), radius, epsilon = radius * 1e-5);
            assert_abs_diff_eq!(
                (vertex.position - vertex.normal * radius).length(),
                0.0,
                epsilon = radius * 1e-6
            );
        }
    }

    #[test]
    fn reference_sphere() {
        let mesh = reference_mesh();

        assert_eq!(mesh.vertex_count(), 1681);
        assert_eq!(mesh.index_count(), 9600);

        let first = mesh.get_vertices()[0];
        assert_abs_diff_eq!(first.position.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(first.position.y, 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(first.position.z, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(first.normal.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn pole_rows_are_coincident_but_distinct_records() {
        let mesh = reference_mesh();
        let row = 41;
        let vertices = mesh.get_vertices();

        for pole_row in [&vertices[..row], &vertices[vertices.len() - row..]] {
            assert_eq!(pole_row.len(), row);
            for vertex in pole_row {
                assert_abs_diff_eq!(
                    vertex.position.distance(pole_row[0].position),
                    0.0,
                    epsilon = 1e-5
                );
            }
        }

        let south = vertices[vertices.len() - 1];
        assert_abs_diff_eq!(south.position.y, -2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(south.normal.y, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn seam_column_is_duplicated() {
        let parameters = SphereParameters::new(8, 16, 1.0);
        let mesh = generate_sphere(&parameters).unwrap();
        let row = (parameters.longitude_bands + 1) as usize;

        for lat in 0..=parameters.latitude_bands as usize {
            let start = mesh.get_vertices()[lat * row];
            let end = mesh.get_vertices()[lat * row + row - 1];
            assert_abs_diff_eq!(start.position.distance(end.position), 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn vertices_are_row_major_by_latitude() {
        let mesh = generate_sphere(&SphereParameters::new(4, 4, 1.0)).unwrap();
        let heights = mesh
            .get_vertices()
            .chunks(5)
            .map(|row| row[0].position.y)
            .collect::<Vec<_>>();

        assert!(heights.windows(2).all(|pair| pair[0] > pair[1]));
        // second sample of the equator row sits at phi = 90 degrees
        let equator_quarter = mesh.get_vertices()[2 * 5 + 1];
        assert_abs_diff_eq!(equator_quarter.position.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn first_cell_indices() {
        let mesh = generate_sphere(&SphereParameters::new(2, 3, 1.0)).unwrap();

        assert_eq!(&mesh.get_indices()[..6], &[0, 4, 1, 4, 5, 1]);
        // last cell: lat = 1, lon = 2, first = 6, second = 10
        assert_eq!(mesh.triangles().last(), Some([10, 11, 7]));
        assert_eq!(mesh.triangles().count(), 2 * 3 * 2);
    }

    #[test]
    fn winding_is_consistent() {
        let mesh = reference_mesh();
        let vertices = mesh.get_vertices();
        let mut checked = 0;

        for [a, b, c] in mesh.triangles() {
            let (a, b, c) = (
                vertices[a as usize].position,
                vertices[b as usize].position,
                vertices[c as usize].position,
            );
            let cross = (b - a).cross(c - a);
            if cross.length() < 1e-6 {
                // collapsed at a pole
                continue;
            }
            let centroid = (a + b + c) / 3.0;
            assert!(cross.dot(centroid) < 0.0);
            checked += 1;
        }

        // one triangle per cell collapses in each pole row
        assert_eq!(checked, 40 * 40 * 2 - 2 * 40);
    }

    #[test]
    fn colors_are_unclamped_by_default() {
        let mesh = reference_mesh();
        let north = mesh.get_vertices()[0];

        assert_abs_diff_eq!(north.color.x, 0.8, epsilon = 1e-6);
        assert_abs_diff_eq!(north.color.y, 1.6, epsilon = 1e-6);
        assert_abs_diff_eq!(north.color.z, 0.8, epsilon = 1e-6);
    }

    #[test]
    fn colors_can_be_clamped() {
        let parameters = SphereParameters::default().with_clamped_colors(true);
        let mesh = generate_sphere(&parameters).unwrap();

        assert!(mesh.get_vertices().iter().all(|vertex| {
            vertex.color.cmpge(Vec3::ZERO).all() && vertex.color.cmple(Vec3::ONE).all()
        }));
        assert_abs_diff_eq!(mesh.get_vertices()[0].color.y, 1.0, epsilon = 1e-6);

        let unclamped = reference_mesh();
        assert_eq!(mesh.index_data(), unclamped.index_data());
        assert!(
            mesh.get_vertices()
                .iter()
                .zip(unclamped.get_vertices())
                .all(|(clamped, raw)| clamped.position == raw.position
                    && clamped.normal == raw.normal)
        );
    }

    #[test]
    fn generation_is_deterministic() {
        let parameters = SphereParameters::new(13, 29, 3.5);
        let first = generate_sphere(&parameters).unwrap();
        let second = generate_sphere(&parameters).unwrap();

        assert_eq!(first.vertex_data(), second.vertex_data());
        assert_eq!(first.index_data(), second.index_data());
        assert_eq!(
            first.vertex_data().len(),
            first.vertex_count() * Vertex::FLOATS * 4
        );
    }

    #[rstest]
    #[case(SphereParameters::new(0, 40, 2.0), "latitude_bands")]
    #[case(SphereParameters::new(40, 0, 2.0), "longitude_bands")]
    #[case(SphereParameters::new(40, 40, 0.0), "radius")]
    #[case(SphereParameters::new(40, 40, -1.0), "radius")]
    #[case(SphereParameters::new(40, 40, f32::NAN), "radius")]
    #[case(SphereParameters::new(40, 40, f32::INFINITY), "radius")]
    #[case(SphereParameters::new(u32::MAX, 2, 1.0), "latitude_bands")]
    #[case(SphereParameters::new(70_000, 70_000, 1.0), "latitude_bands")]
    fn invalid_parameters(#[case] parameters: SphereParameters, #[case] expected: &str) {
        match generate_sphere(&parameters) {
            Err(GeometryError::InvalidParameter { name, .. }) => assert_eq!(name, expected),
            Ok(_) => panic!("{parameters:?} should be rejected"),
        }
    }
}
