//! Uniform reflection from GLSL source using naga's GLSL front end

use std::collections::BTreeSet;

use naga::front::glsl::{Frontend, Options};

use crate::error::ShaderError;

/// Names a compiled program exposes to the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInterface {
    uniforms: BTreeSet<String>,
    workgroup_size: Option<[u32; 3]>,
}

impl ShaderInterface {
    /// Interface with an explicit uniform list
    #[cfg(test)]
    pub fn with_uniforms<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            uniforms: names.into_iter().map(Into::into).collect(),
            workgroup_size: None,
        }
    }

    pub fn declares(&self, name: &str) -> bool {
        self.uniforms.contains(name)
    }

    pub fn uniforms(&self) -> impl Iterator<Item = &str> {
        self.uniforms.iter().map(String::as_str)
    }

    /// Local size of the compute entry point, if this is a compute program
    pub fn workgroup_size(&self) -> Option<[u32; 3]> {
        self.workgroup_size
    }
}

/// Parse `source` and collect its uniform block members and resource names.
pub fn reflect(
    program: &str,
    source: &str,
    stage: naga::ShaderStage,
) -> Result<ShaderInterface, ShaderError> {
    let mut frontend = Frontend::default();
    let module = frontend
        .parse(&Options::from(stage), source)
        .map_err(|e| ShaderError::Parse {
            program: program.to_string(),
            message: format!("{:?}", e),
        })?;

    let mut uniforms = BTreeSet::new();
    for (_, var) in module.global_variables.iter() {
        match var.space {
            naga::AddressSpace::Uniform | naga::AddressSpace::Handle => {}
            _ => continue,
        }

        if let Some(name) = &var.name {
            uniforms.insert(name.clone());
        }
        // Members of a uniform block are addressed by name from GLSL
        if let naga::TypeInner::Struct { members, .. } = &module.types[var.ty].inner {
            uniforms.extend(members.iter().filter_map(|m| m.name.clone()));
        }
    }

    let workgroup_size = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == naga::ShaderStage::Compute)
        .map(|ep| ep.workgroup_size);

    log::debug!("{} program uniforms: {:?}", program, uniforms);

    Ok(ShaderInterface {
        uniforms,
        workgroup_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkgroupSize;
    use crate::shader::source::substitute_workgroup_size;

    #[test]
    fn fragment_shader_declares_time() {
        let source = include_str!("../../shaders/fragment.glsl");
        let iface = reflect("render", source, naga::ShaderStage::Fragment).unwrap();
        assert!(iface.declares("u_time"));
        assert!(!iface.declares("u_resolution"));
        assert_eq!(iface.workgroup_size(), None);
    }

    #[test]
    fn compute_shader_declares_time_and_resolution() {
        let source = substitute_workgroup_size(
            include_str!("../../shaders/compute.glsl"),
            WorkgroupSize::new(16, 8),
        );
        let iface = reflect("compute", &source, naga::ShaderStage::Compute).unwrap();
        assert!(iface.declares("u_time"));
        assert!(iface.declares("u_resolution"));
        assert!(iface.declares("output_image"));
        assert_eq!(iface.workgroup_size(), Some([16, 8, 1]));
    }

    #[test]
    fn syntax_error_is_parse_error() {
        let result = reflect(
            "render",
            "#version 450\nvoid main() { this is not glsl }",
            naga::ShaderStage::Fragment,
        );
        match result {
            Err(ShaderError::Parse { program, .. }) => assert_eq!(program, "render"),
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
