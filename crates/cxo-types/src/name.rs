use crate::error::TypeError;

/// Check that `name` can be used as a single path component.
///
/// Publisher identities and header names become directory and file names
/// under the storage root, so anything that could escape the parent
/// directory is rejected.
pub fn validate_path_component(name: &str) -> Result<&str, TypeError> {
    let reason = if name.is_empty() {
        "empty"
    } else if name == "." || name == ".." {
        "relative component"
    } else if name.contains(['/', '\\']) {
        "contains a path separator"
    } else if name.contains('\0') {
        "contains NUL"
    } else {
        return Ok(name);
    };
    Err(TypeError::InvalidName {
        name: name.to_string(),
        reason,
    })
}
