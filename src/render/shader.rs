use std::borrow::Cow;

use naga::{
    AddressSpace, ShaderStage,
    valid::{Capabilities, ValidationFlags, Validator},
};
use thiserror::Error;

const SPHERE_SHADER: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/resources/shaders/sphere_shader.wgsl"
));

#[derive(Error, Debug)]
pub enum ShaderBuildError {
    #[error("failed to parse {label}:\n{message}")]
    Parse { label: &'static str, message: String },
    #[error("{label} failed validation:\n{message}")]
    Validation { label: &'static str, message: String },
    #[error("{label} has no {stage:?} entry point named `{name}`")]
    MissingEntryPoint {
        label: &'static str,
        stage: ShaderStage,
        name: &'static str,
    },
    #[error("{label} declares a {actual:?} byte uniform block, host side expects {expected}")]
    UniformLayout {
        label: &'static str,
        expected: u32,
        actual: Option<u32>,
    },
}

/// A vertex/fragment pair in one WGSL module, checked with naga before any
/// GPU object exists. The GPU module is created on demand and freed on drop.
#[derive(Debug)]
pub struct ShaderProgram {
    label: &'static str,
    source: Cow<'static, str>,
    module: naga::Module,
}

impl ShaderProgram {
    pub const VERTEX_ENTRY_POINT: &'static str = "vs_main";
    pub const FRAGMENT_ENTRY_POINT: &'static str = "fs_main";

    pub fn sphere() -> Result<Self, ShaderBuildError> {
        Self::from_wgsl("sphere shader", SPHERE_SHADER)
    }

    pub fn from_wgsl(
        label: &'static str,
        source: impl Into<Cow<'static, str>>,
    ) -> Result<Self, ShaderBuildError> {
        let source = source.into();

        let module =
            naga::front::wgsl::parse_str(&source).map_err(|err| ShaderBuildError::Parse {
                label,
                message: err.emit_to_string(&source),
            })?;

        Validator::new(ValidationFlags::all(), Capabilities::empty())
            .validate(&module)
            .map_err(|err| ShaderBuildError::Validation {
                label,
                message: err.emit_to_string(&source),
            })?;

        for (stage, name) in [
            (ShaderStage::Vertex, Self::VERTEX_ENTRY_POINT),
            (ShaderStage::Fragment, Self::FRAGMENT_ENTRY_POINT),
        ] {
            if !module
                .entry_points
                .iter()
                .any(|entry_point| entry_point.stage == stage && entry_point.name == name)
            {
                return Err(ShaderBuildError::MissingEntryPoint { label, stage, name });
            }
        }

        log::debug!("validated {label}");

        Ok(Self {
            label,
            source,
            module,
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Size in bytes of the first `var<uniform>` declared by the module.
    pub fn uniform_block_size(&self) -> Option<u32> {
        self.module
            .global_variables
            .iter()
            .find(|(_, variable)| variable.space == AddressSpace::Uniform)
            .map(|(_, variable)| self.module.types[variable.ty].inner.size(self.module.to_ctx()))
    }

    pub fn check_uniform_block_size(&self, expected: usize) -> Result<(), ShaderBuildError> {
        let actual = self.uniform_block_size();
        if actual.map(|size| size as usize) == Some(expected) {
            Ok(())
        } else {
            Err(ShaderBuildError::UniformLayout {
                label: self.label,
                expected: expected as u32,
                actual,
            })
        }
    }

    pub fn create_module(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(self.label),
            source: wgpu::ShaderSource::Wgsl(self.source.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::render::data::Uniforms;

    use super::*;

    #[test]
    fn sphere_shader_is_valid() {
        let program = ShaderProgram::sphere().unwrap();

        assert_eq!(program.label(), "sphere shader");
        assert_eq!(program.uniform_block_size(), Some(272));
        program
            .check_uniform_block_size(std::mem::size_of::<Uniforms>())
            .unwrap();
    }

    #[test]
    fn uniform_block_mismatch_is_reported() {
        let program = ShaderProgram::sphere().unwrap();

        assert!(matches!(
            program.check_uniform_block_size(256),
            Err(ShaderBuildError::UniformLayout {
                expected: 256,
                actual: Some(272),
                ..
            })
        ));
    }

    #[test]
    fn syntax_error_is_a_parse_error() {
        let result = ShaderProgram::from_wgsl("broken shader", "@vertex fn vs_main( {");

        assert!(matches!(
            result,
            Err(ShaderBuildError::Parse {
                label: "broken shader",
                ..
            })
        ));
    }

    #[test]
    fn missing_fragment_stage_is_reported() {
        let source = r#"
@vertex
fn vs_main(@location(0) a_pos: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(a_pos, 1.0);
}
"#;
        let result = ShaderProgram::from_wgsl("vertex only", source);

        match result {
            Err(ShaderBuildError::MissingEntryPoint { stage, name, .. }) => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert_eq!(name, ShaderProgram::FRAGMENT_ENTRY_POINT);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn program_without_uniforms_has_no_block() {
        let source = r#"
@vertex
fn vs_main(@location(0) a_pos: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(a_pos, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;
        let program = ShaderProgram::from_wgsl("flat", source).unwrap();

        assert_eq!(program.uniform_block_size(), None);
        assert!(program.check_uniform_block_size(272).is_err());
    }
}
