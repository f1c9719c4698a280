//! WGSL parsing, validation and entry-point reflection with naga.

use std::fmt;

use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};

use crate::error::{Error, Result};

/// What a function is for, derived from its shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionRole {
    Kernel,
    Vertex,
    Fragment,
    Intersection,
    Unknown,
}

impl FunctionRole {
    fn from_stage(stage: naga::ShaderStage) -> Self {
        match stage {
            naga::ShaderStage::Compute => FunctionRole::Kernel,
            naga::ShaderStage::Vertex => FunctionRole::Vertex,
            naga::ShaderStage::Fragment => FunctionRole::Fragment,
            #[allow(unreachable_patterns)]
            _ => FunctionRole::Unknown,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            FunctionRole::Kernel => "kernel",
            FunctionRole::Vertex => "vertex",
            FunctionRole::Fragment => "fragment",
            FunctionRole::Intersection => "intersection",
            FunctionRole::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FunctionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingAccess {
    Read,
    ReadWrite,
    Uniform,
    Other,
}

/// A resource binding an entry point statically uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSlot {
    pub group: u32,
    pub binding: u32,
    pub name: Option<String>,
    pub access: BindingAccess,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub role: FunctionRole,
    pub workgroup_size: [u32; 3],
    /// Sorted by group, then binding.
    pub bindings: Vec<BindingSlot>,
}

impl EntryPoint {
    /// Binding indices used in group 0, ascending.
    pub fn slots(&self) -> Vec<u32> {
        self.bindings
            .iter()
            .filter(|b| b.group == 0)
            .map(|b| b.binding)
            .collect()
    }

    pub fn threads_per_workgroup(&self) -> u64 {
        self.workgroup_size.iter().map(|&n| u64::from(n)).product()
    }
}

/// Entry points of a validated shader module, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderReflection {
    entry_points: Vec<EntryPoint>,
}

impl ShaderReflection {
    /// Parses and validates `source` as one WGSL translation unit.
    ///
    /// Diagnostics are rendered against the source text, so the error
    /// carries line and column information.
    pub fn parse(source: &str) -> Result<Self> {
        let module = naga::front::wgsl::parse_str(source)
            .map_err(|e| Error::compile(e.emit_to_string(source)))?;

        let info = Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .map_err(|e| Error::compile(e.emit_to_string(source)))?;

        Ok(Self::from_module(&module, &info))
    }

    fn from_module(module: &naga::Module, info: &ModuleInfo) -> Self {
        let entry_points = module
            .entry_points
            .iter()
            .enumerate()
            .map(|(index, ep)| {
                let usage = info.get_entry_point(index);
                let mut bindings: Vec<BindingSlot> = module
                    .global_variables
                    .iter()
                    .filter(|(handle, _)| !usage[*handle].is_empty())
                    .filter_map(|(_, var)| {
                        var.binding.as_ref().map(|rb| BindingSlot {
                            group: rb.group,
                            binding: rb.binding,
                            name: var.name.clone(),
                            access: access_of(var.space),
                        })
                    })
                    .collect();
                bindings.sort_by_key(|b| (b.group, b.binding));

                EntryPoint {
                    name: ep.name.clone(),
                    role: FunctionRole::from_stage(ep.stage),
                    workgroup_size: ep.workgroup_size,
                    bindings,
                }
            })
            .collect();

        Self { entry_points }
    }

    pub fn entry_points(&self) -> &[EntryPoint] {
        &self.entry_points
    }

    pub fn names(&self) -> Vec<String> {
        self.entry_points.iter().map(|ep| ep.name.clone()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.entry_points.iter().position(|ep| ep.name == name)
    }

    pub fn get(&self, index: usize) -> Option<&EntryPoint> {
        self.entry_points.get(index)
    }
}

fn access_of(space: naga::AddressSpace) -> BindingAccess {
    match space {
        naga::AddressSpace::Storage { access } => {
            if access.contains(naga::StorageAccess::STORE) {
                BindingAccess::ReadWrite
            } else {
                BindingAccess::Read
            }
        }
        naga::AddressSpace::Uniform => BindingAccess::Uniform,
        _ => BindingAccess::Other,
    }
}
