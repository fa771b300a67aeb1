//! Named uniform values and their host-side block layout

use std::collections::BTreeMap;
use std::fmt;

use crate::error::UniformError;
use crate::shader::ShaderInterface;

/// Every uniform the host knows how to supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UniformName {
    /// `u_time`: elapsed seconds
    Time,
    /// `u_resolution`: screen width and height in pixels
    Resolution,
}

impl UniformName {
    pub const ALL: [UniformName; 2] = [UniformName::Time, UniformName::Resolution];

    /// Name as declared in GLSL
    pub const fn as_str(self) -> &'static str {
        match self {
            UniformName::Time => "u_time",
            UniformName::Resolution => "u_resolution",
        }
    }

    pub fn from_glsl(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.as_str() == name)
    }

    const fn expected_kind(self) -> &'static str {
        match self {
            UniformName::Time => "float",
            UniformName::Resolution => "vec2",
        }
    }
}

impl fmt::Display for UniformName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
}

impl UniformValue {
    pub const fn kind(&self) -> &'static str {
        match self {
            UniformValue::Float(_) => "float",
            UniformValue::Vec2(_) => "vec2",
        }
    }
}

/// A set of uniform assignments, checked against a program before use
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSet {
    values: BTreeMap<UniformName, UniformValue>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: UniformName, value: UniformValue) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: UniformName, value: UniformValue) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: UniformName) -> Option<UniformValue> {
        self.values.get(&name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UniformName, UniformValue)> + '_ {
        self.values.iter().map(|(name, value)| (*name, *value))
    }

    /// Check every assignment names a uniform the program declares, with the right type
    pub fn validate(&self, program: &str, interface: &ShaderInterface) -> Result<(), UniformError> {
        for (name, value) in self.iter() {
            if !interface.declares(name.as_str()) {
                return Err(UniformError::NotFound {
                    program: program.to_string(),
                    name: name.as_str(),
                });
            }
            if value.kind() != name.expected_kind() {
                return Err(UniformError::TypeMismatch {
                    name: name.as_str(),
                    expected: name.expected_kind(),
                    actual: value.kind(),
                });
            }
        }
        Ok(())
    }

    /// Write the assignments into a block. Call after `validate`; mistyped entries are skipped.
    pub fn apply_to(&self, params: &mut FrameParams) {
        for (name, value) in self.iter() {
            match (name, value) {
                (UniformName::Time, UniformValue::Float(t)) => params.time = t,
                (UniformName::Resolution, UniformValue::Vec2(r)) => params.resolution = r,
                _ => {}
            }
        }
    }
}

/// std140 layout of the `u_time` / `u_resolution` block shared by the render and compute programs
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameParams {
    pub time: f32,
    pub _padding: f32, // vec2 aligns to 8 bytes
    pub resolution: [f32; 2],
}

impl FrameParams {
    pub fn new(resolution: (u32, u32)) -> Self {
        Self {
            time: 0.0,
            _padding: 0.0,
            resolution: [resolution.0 as f32, resolution.1 as f32],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compute_interface() -> ShaderInterface {
        ShaderInterface::with_uniforms(["u_time", "u_resolution", "output_image"])
    }

    #[test]
    fn names_round_trip_through_glsl_spelling() {
        for name in UniformName::ALL {
            assert_eq!(UniformName::from_glsl(name.as_str()), Some(name));
        }
        assert_eq!(UniformName::from_glsl("u_mouse"), None);
    }

    #[test]
    fn validate_accepts_declared_uniforms() {
        let set = UniformSet::new()
            .with(UniformName::Time, UniformValue::Float(1.5))
            .with(UniformName::Resolution, UniformValue::Vec2([800.0, 600.0]));
        assert_eq!(set.validate("compute", &compute_interface()), Ok(()));
    }

    #[test]
    fn validate_reports_missing_uniform() {
        let render = ShaderInterface::with_uniforms(["u_time"]);
        let set = UniformSet::new().with(UniformName::Resolution, UniformValue::Vec2([1.0, 1.0]));

        assert_eq!(
            set.validate("render", &render),
            Err(UniformError::NotFound {
                program: "render".to_string(),
                name: "u_resolution",
            })
        );
    }

    #[test]
    fn validate_reports_wrong_type() {
        let set = UniformSet::new().with(UniformName::Time, UniformValue::Vec2([0.0, 0.0]));
        assert_eq!(
            set.validate("compute", &compute_interface()),
            Err(UniformError::TypeMismatch {
                name: "u_time",
                expected: "float",
                actual: "vec2",
            })
        );
    }

    #[test]
    fn apply_overrides_only_supplied_fields() {
        let mut params = FrameParams::new((800, 600));
        UniformSet::new()
            .with(UniformName::Time, UniformValue::Float(2.5))
            .apply_to(&mut params);

        assert_eq!(params.time, 2.5);
        assert_eq!(params.resolution, [800.0, 600.0]);
    }

    #[test]
    fn frame_params_is_std140_sized() {
        assert_eq!(std::mem::size_of::<FrameParams>(), 16);
        assert_eq!(std::mem::offset_of!(FrameParams, resolution), 8);
    }
}
