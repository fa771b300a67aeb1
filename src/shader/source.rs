//! Reads shader text from disk and fills in the workgroup size placeholders

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::config::WorkgroupSize;
use crate::error::ShaderError;

pub const SIZE_X_TOKEN: &str = "COMPUTE_SIZE_X";
pub const SIZE_Y_TOKEN: &str = "COMPUTE_SIZE_Y";

/// Read a shader file verbatim
pub fn load_source(path: &Path) -> Result<String, ShaderError> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ShaderError::NotFound(path.to_path_buf()),
        _ => ShaderError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Replace the size tokens with their decimal values. Nothing else is touched.
pub fn substitute_workgroup_size(source: &str, size: WorkgroupSize) -> String {
    source
        .replace(SIZE_X_TOKEN, &size.x.to_string())
        .replace(SIZE_Y_TOKEN, &size.y.to_string())
}

/// Load the optional compute shader.
///
/// Returns `Ok(None)` when the file does not exist, which disables the compute
/// path for the whole session. Any other read failure is an error.
pub fn load_compute_source(
    path: &Path,
    size: WorkgroupSize,
) -> Result<Option<String>, ShaderError> {
    match load_source(path) {
        Ok(source) => Ok(Some(substitute_workgroup_size(&source, size))),
        Err(ShaderError::NotFound(_)) => {
            log::info!("No compute shader at {}, compute disabled", path.display());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
