#![allow(dead_code)]

use gpubridge::prelude::*;

pub const ADD_ONE: &str = r#"
    @group(0) @binding(0) var<storage, read_write> data: array<i32>;

    @compute @workgroup_size(1)
    fn add_one() {
        for (var i = 0u; i < arrayLength(&data); i = i + 1u) {
            data[i] = data[i] + 1;
        }
    }
"#;

pub const ADD_INTO: &str = r#"
    @group(0) @binding(0) var<storage, read_write> acc: array<i32>;
    @group(0) @binding(2) var<storage, read> addend: array<i32>;

    @compute @workgroup_size(1)
    fn add_into() {
        for (var i = 0u; i < arrayLength(&acc); i = i + 1u) {
            acc[i] = acc[i] + addend[i];
        }
    }
"#;

pub const DOUBLE_ALL: &str = r#"
    @group(0) @binding(0) var<storage, read_write> values: array<f32>;

    @compute @workgroup_size(1)
    fn double_all() {
        for (var i = 0u; i < arrayLength(&values); i = i + 1u) {
            values[i] = values[i] * 2.0;
        }
    }
"#;

/// The default device, or `None` on machines without a usable adapter.
pub fn device() -> Option<Handle> {
    device_with(&Config::default())
}

pub fn device_with(config: &Config) -> Option<Handle> {
    match api::default_device(config) {
        Ok(device) => Some(device),
        Err(err) => {
            assert_eq!(err.kind(), ErrorKind::NoDevice, "unexpected error: {}", err);
            eprintln!("skipping: {}", err);
            None
        }
    }
}

/// Compiles `source` and builds a pipeline for `name`.
pub fn pipeline(device: &Handle, source: &str, name: &str) -> Handle {
    let library = api::make_library(device, source).unwrap();
    let function = api::library_function(&library, name).unwrap().unwrap();
    api::compute_pipeline(&function).unwrap()
}

pub fn int_buffer(device: &Handle, values: &[i32]) -> Handle {
    let bytes = (values.len() * 4) as i64;
    let buffer = api::buffer(device, values.len() * 4).unwrap();
    api::buffer_copy_from(&HostVector::Integer(values.to_vec()), &buffer, 0, 0, bytes).unwrap();
    buffer
}

pub fn read_ints(buffer: &Handle) -> Vec<i32> {
    let len = api::buffer_size(buffer).unwrap() as i64;
    match api::buffer_copy_into(buffer, VectorKind::Integer, 0, len).unwrap() {
        HostVector::Integer(values) => values,
        other => panic!("expected integers, got {:?}", other),
    }
}
