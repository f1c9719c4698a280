mod common;

use common::*;
use gpubridge::prelude::*;

#[test]
fn test_add_one_end_to_end() {
    let Some(device) = device() else { return };

    let pipeline = pipeline(&device, ADD_ONE, "add_one");
    let queue = api::command_queue(&device).unwrap();
    let buffer = int_buffer(&device, &[1, 2, 3, 4]);

    api::compute_pipeline_execute(&pipeline, &queue, &[Some(buffer.clone())]).unwrap();
    assert_eq!(read_ints(&buffer), vec![2, 3, 4, 5]);

    // A second dispatch sees the first one's writes.
    api::compute_pipeline_execute(&pipeline, &queue, &[Some(buffer.clone())]).unwrap();
    assert_eq!(read_ints(&buffer), vec![3, 4, 5, 6]);
}

#[test]
fn test_zero_copy_buffer_writes_host_region() {
    let Some(device) = device() else { return };

    let region = HostRegion::new(HostVector::Integer(vec![1, 2, 3, 4])).unwrap();
    let buffer = api::buffer_wrap(&device, &region).unwrap();
    assert_eq!(region.pin_count(), 1);
    assert_eq!(api::buffer_size(&buffer).unwrap(), 16);

    let pipeline = pipeline(&device, ADD_ONE, "add_one");
    let queue = api::command_queue(&device).unwrap();
    api::compute_pipeline_execute(&pipeline, &queue, &[Some(buffer.clone())]).unwrap();

    assert_eq!(region.to_vector(), HostVector::Integer(vec![2, 3, 4, 5]));

    // Host edits to the region reach the next dispatch.
    region
        .overwrite(&HostVector::Integer(vec![10, 20, 30, 40]))
        .unwrap();
    api::compute_pipeline_execute(&pipeline, &queue, &[Some(buffer.clone())]).unwrap();
    assert_eq!(region.to_vector(), HostVector::Integer(vec![11, 21, 31, 41]));

    buffer.dispose();
    assert_eq!(region.pin_count(), 0);
}

#[test]
fn test_packed_floats_through_kernel() {
    let Some(device) = device() else { return };

    let floats = PackedFloats::from_double(&[0.5, -1.25, 3.0]);
    let buffer = api::buffer(&device, 12).unwrap();
    api::buffer_copy_from(&HostVector::Floats(floats), &buffer, 0, 0, 12).unwrap();

    let pipeline = pipeline(&device, DOUBLE_ALL, "double_all");
    let queue = api::command_queue(&device).unwrap();
    api::compute_pipeline_execute(&pipeline, &queue, &[Some(buffer.clone())]).unwrap();

    match api::buffer_copy_into(&buffer, VectorKind::Floats, 0, 12).unwrap() {
        HostVector::Floats(out) => assert_eq!(out.to_double(), vec![1.0, -2.5, 6.0]),
        other => panic!("expected floats, got {:?}", other),
    }
}

#[test]
fn test_ordinal_slots_with_gap() {
    let Some(device) = device() else { return };

    let pipeline = pipeline(&device, ADD_INTO, "add_into");
    let queue = api::command_queue(&device).unwrap();
    let acc = int_buffer(&device, &[1, 1, 1]);
    let addend = int_buffer(&device, &[5, 6, 7]);

    api::compute_pipeline_execute(&pipeline, &queue, &[Some(acc.clone()), None, Some(addend.clone())])
        .unwrap();
    assert_eq!(read_ints(&acc), vec![6, 7, 8]);
    assert_eq!(read_ints(&addend), vec![5, 6, 7]);
}

#[test]
fn test_missing_used_slot_fails_before_submit() {
    let Some(device) = device() else { return };

    let pipeline = pipeline(&device, ADD_INTO, "add_into");
    let queue = api::command_queue(&device).unwrap();
    let acc = int_buffer(&device, &[1, 2]);

    let err = api::compute_pipeline_execute(&pipeline, &queue, &[Some(acc.clone())]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DispatchFailed);
    assert_eq!(read_ints(&acc), vec![1, 2]);
}

#[test]
fn test_unused_slot_is_ignored() {
    let Some(device) = device() else { return };

    let pipeline = pipeline(&device, ADD_ONE, "add_one");
    let queue = api::command_queue(&device).unwrap();
    let data = int_buffer(&device, &[0]);
    let extra = int_buffer(&device, &[100]);

    api::compute_pipeline_execute(&pipeline, &queue, &[Some(data.clone()), Some(extra.clone())])
        .unwrap();
    assert_eq!(read_ints(&data), vec![1]);
    assert_eq!(read_ints(&extra), vec![100]);
}

#[test]
fn test_non_buffer_argument_is_invalid_handle() {
    let Some(device) = device() else { return };

    let pipeline = pipeline(&device, ADD_ONE, "add_one");
    let queue = api::command_queue(&device).unwrap();

    let err = api::compute_pipeline_execute(&pipeline, &queue, &[Some(queue.clone())]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidHandle);
}

#[test]
fn test_compile_error_carries_diagnostic() {
    let Some(device) = device() else { return };

    let err = api::make_library(&device, "@compute fn broken( {").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CompileError);
    assert!(!err.detail().trim().is_empty());

    // The device is unaffected.
    assert!(api::make_library(&device, ADD_ONE).is_ok());
}

#[test]
fn test_library_catalog() {
    let Some(device) = device() else { return };

    let source = format!(
        "{}\n{}",
        ADD_ONE,
        r#"
        @vertex
        fn vs_main() -> @builtin(position) vec4<f32> {
            return vec4<f32>(0.0, 0.0, 0.0, 1.0);
        }
        "#
    );
    let library = api::make_library(&device, &source).unwrap();
    assert_eq!(
        api::library_function_names(&library).unwrap(),
        vec!["add_one", "vs_main"]
    );

    let kernel = api::library_function(&library, "add_one").unwrap().unwrap();
    let info = api::function_info(&kernel).unwrap();
    assert_eq!(info.name, "add_one");
    assert_eq!(info.role, FunctionRole::Kernel);

    let vertex = api::library_function(&library, "vs_main").unwrap().unwrap();
    assert_eq!(api::function_info(&vertex).unwrap().role, FunctionRole::Vertex);
    let err = api::compute_pipeline(&vertex).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BuildError);

    assert!(api::library_function(&library, "does_not_exist").unwrap().is_none());
}

#[test]
fn test_empty_library() {
    let Some(device) = device() else { return };

    let library = api::make_library(&device, "const K: i32 = 4;").unwrap();
    assert!(api::library_function_names(&library).unwrap().is_empty());
}

#[test]
fn test_wide_workgroup_rejected() {
    let Some(device) = device() else { return };

    let source = r#"
        @group(0) @binding(0) var<storage, read_write> data: array<i32>;

        @compute @workgroup_size(64)
        fn wide(@builtin(global_invocation_id) id: vec3<u32>) {
            data[id.x] = 0;
        }
    "#;
    let library = api::make_library(&device, source).unwrap();
    let function = api::library_function(&library, "wide").unwrap().unwrap();
    let err = api::compute_pipeline(&function).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BuildError);
}

#[test]
fn test_pipeline_max_threads() {
    let Some(device) = device() else { return };

    let pipeline = pipeline(&device, ADD_ONE, "add_one");
    assert!(api::pipeline_max_threads(&pipeline).unwrap() >= 1);
}

#[test]
fn test_device_info() {
    let Some(device) = device() else { return };

    let info = api::device_info(&device).unwrap();
    assert!(info.description.starts_with(&info.name));
}

#[test]
fn test_cross_device_rejected() {
    let Some(first) = device() else { return };
    let Some(second) = device() else { return };

    let pipeline = pipeline(&first, ADD_ONE, "add_one");
    let foreign_queue = api::command_queue(&second).unwrap();
    let foreign_buffer = int_buffer(&second, &[1]);
    let local_queue = api::command_queue(&first).unwrap();
    let local_buffer = int_buffer(&first, &[1]);

    let err = api::compute_pipeline_execute(&pipeline, &foreign_queue, &[Some(local_buffer.clone())])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeviceMismatch);

    let err = api::compute_pipeline_execute(&pipeline, &local_queue, &[Some(foreign_buffer)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeviceMismatch);

    api::compute_pipeline_execute(&pipeline, &local_queue, &[Some(local_buffer.clone())]).unwrap();
    assert_eq!(read_ints(&local_buffer), vec![2]);
}

#[test]
fn test_allocation_limit() {
    let config = Config::builder().max_buffer_size(64).build().unwrap();
    let Some(device) = device_with(&config) else { return };

    assert!(api::buffer(&device, 64).is_ok());
    let err = api::buffer(&device, 65).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AllocationFailed);

    let region = HostRegion::new(HostVector::Double(vec![0.0; 9])).unwrap();
    let err = api::buffer_wrap(&device, &region).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AllocationFailed);
    assert_eq!(region.pin_count(), 0);
}

#[test]
fn test_failure_leaves_earlier_handles_usable() {
    let Some(device) = device() else { return };

    let pipeline = pipeline(&device, ADD_ONE, "add_one");
    let queue = api::command_queue(&device).unwrap();
    let buffer = int_buffer(&device, &[41]);

    assert!(api::make_library(&device, "not wgsl at all").is_err());
    assert!(api::buffer_copy_from(&HostVector::Integer(vec![1]), &buffer, 0, 8, 4).is_err());

    api::compute_pipeline_execute(&pipeline, &queue, &[Some(buffer.clone())]).unwrap();
    assert_eq!(read_ints(&buffer), vec![42]);
}

#[test]
fn test_zero_length_buffer() {
    let Some(device) = device() else { return };

    let buffer = api::buffer(&device, 0).unwrap();
    assert_eq!(api::buffer_size(&buffer).unwrap(), 0);

    let view = api::buffer_pointer(&buffer).unwrap();
    assert!(view.is_empty());
    assert!(view.to_vec().is_empty());

    api::buffer_copy_from(&HostVector::Integer(vec![]), &buffer, 0, 0, 0).unwrap();
    let out = api::buffer_copy_into(&buffer, VectorKind::Integer, 0, 0).unwrap();
    assert_eq!(out, HostVector::Integer(vec![]));
}

#[test]
fn test_writes_through_lent_pointer_reach_every_dispatch() {
    let Some(device) = device() else { return };

    let pipeline = pipeline(&device, ADD_ONE, "add_one");
    let queue = api::command_queue(&device).unwrap();
    let buffer = int_buffer(&device, &[1]);
    let view = api::buffer_pointer(&buffer).unwrap();
    let ptr = view.as_mut_ptr() as *mut i32;

    api::compute_pipeline_execute(&pipeline, &queue, &[Some(buffer.clone())]).unwrap();
    assert_eq!(read_ints(&buffer), vec![2]);

    // The pointer was taken before the first dispatch and is still live.
    unsafe { ptr.write_unaligned(100) };
    assert_eq!(read_ints(&buffer), vec![100]);

    api::compute_pipeline_execute(&pipeline, &queue, &[Some(buffer.clone())]).unwrap();
    assert_eq!(read_ints(&buffer), vec![101]);

    unsafe { ptr.write_unaligned(-5) };
    api::compute_pipeline_execute(&pipeline, &queue, &[Some(buffer.clone())]).unwrap();
    assert_eq!(read_ints(&buffer), vec![-4]);
}

#[test]
fn test_reported_limit_is_allocatable() {
    let config = Config::builder().max_buffer_size(66).build().unwrap();
    let Some(device) = device_with(&config) else { return };

    let limit = device.device().unwrap().max_buffer_size();
    assert_eq!(limit, 64);
    assert!(api::buffer(&device, limit as usize).is_ok());
    assert!(api::buffer(&device, 63).is_ok());

    let err = api::buffer(&device, limit as usize + 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AllocationFailed);
}

#[test]
fn test_copy_from_guard_of_wrapped_region() {
    let Some(device) = device() else { return };

    let region = HostRegion::new(HostVector::Integer(vec![3, 4])).unwrap();
    let buffer = api::buffer_wrap(&device, &region).unwrap();

    let err = api::buffer_copy_from(&region.read(), &buffer, 0, 4, 4).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);

    api::buffer_copy_from(&region.to_vector(), &buffer, 0, 4, 4).unwrap();
    assert_eq!(region.to_vector(), HostVector::Integer(vec![3, 3]));
}
