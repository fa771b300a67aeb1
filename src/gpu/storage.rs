//! Storage buffer creation, seeding and host readback

use rayon::prelude::*;
use wgpu::util::DeviceExt;

use crate::error::FrameError;

/// Ramp that cycles 0..255 scaled to 0..1 every 256 elements
pub fn seed_ramp(len: usize) -> Vec<f32> {
    (0..len)
        .into_par_iter()
        .map(|i| (i % 256) as f32 / 255.0)
        .collect()
}

/// Storage buffer pre-filled with `data`, usable as a copy source for readback
pub fn create_storage_buffer(device: &wgpu::Device, label: &str, data: &[f32]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(data),
        usage: wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_SRC
            | wgpu::BufferUsages::COPY_DST,
    })
}

/// Copy `buffer` into a staging buffer and block until it can be read on the host
pub fn read_f32_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    buffer: &wgpu::Buffer,
) -> Result<Vec<f32>, FrameError> {
    let size = buffer.size();
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Storage Readback Buffer"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Storage Readback Encoder"),
    });
    encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        // Receiver only goes away if we already returned
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    rx.recv().map_err(|_| FrameError::ReadbackDisconnected)??;

    let values = {
        let bytes = slice.get_mapped_range();
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    };
    staging.unmap();

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_ramp_cycles_every_256() {
        let seed = seed_ramp(800 * 600 * 4);
        assert_eq!(seed.len(), 800 * 600 * 4);
        for (i, value) in seed.iter().enumerate() {
            assert_eq!(*value, (i % 256) as f32 / 255.0, "index {}", i);
        }
        assert_eq!(seed[0], 0.0);
        assert_eq!(seed[255], 1.0);
        assert_eq!(seed[256], 0.0);
    }

    #[test]
    fn seed_ramp_empty() {
        assert!(seed_ramp(0).is_empty());
    }

    #[test]
    fn storage_buffer_reads_back_its_contents() {
        let Some((device, queue)) = crate::gpu::context::headless_device() else {
            eprintln!("no compute-capable adapter, skipping");
            return;
        };
        let seed = seed_ramp(1000);
        let buffer = create_storage_buffer(&device, "Readback Test", &seed);

        assert_eq!(read_f32_buffer(&device, &queue, &buffer).unwrap(), seed);
    }
}
