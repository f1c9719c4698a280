use std::fmt;
use std::sync::Arc;

use super::device::DeviceId;
use super::library::Library;
use super::reflect::{EntryPoint, FunctionRole};

/// Name and role of a function, as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    pub name: String,
    pub role: FunctionRole,
}

/// One entry point of a [`Library`].
///
/// The function keeps its library alive; the library is reached through
/// the function rather than through a second handle.
pub struct Function {
    library: Arc<Library>,
    index: usize,
}

impl Function {
    pub(crate) fn new(library: Arc<Library>, index: usize) -> Self {
        Self { library, index }
    }

    pub fn library(&self) -> &Arc<Library> {
        &self.library
    }

    pub fn device_id(&self) -> DeviceId {
        self.library.device_id()
    }

    pub fn entry_point(&self) -> &EntryPoint {
        // Functions are only created from positions the library reported.
        &self.library.reflection().entry_points()[self.index]
    }

    pub fn name(&self) -> &str {
        &self.entry_point().name
    }

    pub fn role(&self) -> FunctionRole {
        self.entry_point().role
    }

    pub fn info(&self) -> FunctionInfo {
        FunctionInfo {
            name: self.name().to_string(),
            role: self.role(),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("role", &self.role())
            .finish()
    }
}
