//! Compiles a one-line kernel, runs it over a zero-copy region and prints
//! the result.
//!
//! Run with `RUST_LOG=gpubridge=debug` to see device selection and dispatch
//! timing.

use gpubridge::prelude::*;

const SOURCE: &str = r#"
    @group(0) @binding(0) var<storage, read_write> data: array<i32>;

    @compute @workgroup_size(1)
    fn add_one() {
        for (var i = 0u; i < arrayLength(&data); i = i + 1u) {
            data[i] = data[i] + 1;
        }
    }
"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let device = api::default_device(&Config::default())?;
    println!("device: {}", api::device_info(&device)?.description);

    let library = api::make_library(&device, SOURCE)?;
    println!("functions: {:?}", api::library_function_names(&library)?);

    let function = api::library_function(&library, "add_one")?
        .ok_or_else(|| Error::build("add_one missing from library"))?;
    let pipeline = api::compute_pipeline(&function)?;
    let queue = api::command_queue(&device)?;

    let region = HostRegion::new(HostVector::Integer(vec![1, 2, 3, 4]))?;
    let buffer = api::buffer_wrap(&device, &region)?;
    api::compute_pipeline_execute(&pipeline, &queue, &[Some(buffer.clone())])?;
    println!("after one dispatch: {:?}", region.to_vector());

    let copied = api::buffer(&device, 16)?;
    api::buffer_copy_from(&region.to_vector(), &copied, 0, 0, 16)?;
    api::compute_pipeline_execute(&pipeline, &queue, &[Some(copied.clone())])?;
    println!(
        "copied buffer after another: {:?}",
        api::buffer_copy_into(&copied, VectorKind::Integer, 0, 16)?
    );

    buffer.dispose();
    println!("pins left on region: {}", region.pin_count());

    #[cfg(feature = "telemetry")]
    {
        use gpubridge::telemetry::{ConsoleExporter, MetricsExporter};
        ConsoleExporter::new(false).export(&gpubridge::telemetry::global().snapshot())?;
    }

    Ok(())
}
