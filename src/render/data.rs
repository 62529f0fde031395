use glam::{Mat3, Mat4, Vec3};

use super::camera::Camera;

/// One interleaved mesh sample: position, unit normal and color, nine floats.
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: Vec3,
}

impl Vertex {
    pub const FLOATS: usize = 9;

    pub const POSITION_LOCATION: u32 = 0;
    pub const NORMAL_LOCATION: u32 = 1;
    pub const COLOR_LOCATION: u32 = 2;

    const ATTRIBS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        // a_pos
        0 => Float32x3,
        // a_normal
        1 => Float32x3,
        // a_color
        2 => Float32x3,
    ];

    pub fn new(position: Vec3, normal: Vec3, color: Vec3) -> Self {
        Self {
            position,
            normal,
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Per-frame shader inputs. Field order and padding follow the WGSL layout
/// of the `Uniforms` block in `sphere_shader.wgsl`.
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Uniforms {
    model: Mat4,
    view: Mat4,
    projection: Mat4,
    // mat3x3<f32> columns are padded to 16 bytes
    normal_matrix: [[f32; 4]; 3],
    light_dir: [f32; 3],
    _padding0: f32,
    view_dir: [f32; 3],
    _padding1: f32,
}

impl Uniforms {
    pub fn new(camera: &Camera, light_dir: Vec3, rotation: f32, aspect_ratio: f32) -> Self {
        let model = Mat4::from_rotation_y(rotation);

        Self {
            model,
            view: camera.get_view(),
            projection: camera.build_projection_matrix(aspect_ratio),
            normal_matrix: Self::pack_normal_matrix(Self::normal_matrix(&model)),
            light_dir: light_dir.to_array(),
            _padding0: 0.0,
            view_dir: camera.view_direction().to_array(),
            _padding1: 0.0,
        }
    }

    pub fn normal_matrix(model: &Mat4) -> Mat3 {
        Mat3::from_mat4(*model).inverse().transpose()
    }

    fn pack_normal_matrix(normal_matrix: Mat3) -> [[f32; 4]; 3] {
        [
            normal_matrix.x_axis.extend(0.0).to_array(),
            normal_matrix.y_axis.extend(0.0).to_array(),
            normal_matrix.z_axis.extend(0.0).to_array(),
        ]
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn normal_matrix_columns(&self) -> [[f32; 4]; 3] {
        self.normal_matrix
    }

    pub fn light_dir(&self) -> Vec3 {
        Vec3::from_array(self.light_dir)
    }

    pub fn view_dir(&self) -> Vec3 {
        Vec3::from_array(self.view_dir)
    }
}
