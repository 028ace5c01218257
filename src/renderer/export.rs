//! PNG export of the current scene.
//!
//! Frames are rendered into an offscreen target at a fixed size rather than
//! reading back the window surface, so exports look the same regardless of
//! window dimensions.

use std::path::Path;
use std::sync::mpsc;

use anyhow::{bail, Context};
use glam::Mat4;
use tracing::info;

use crate::camera::Camera;

use super::{DepthTexture, Renderer};

pub const EXPORT_WIDTH: u32 = 1024;
pub const EXPORT_HEIGHT: u32 = 768;

impl Renderer<'_> {
    /// Render the current scene through `camera` at the fixed export size and
    /// save it as a PNG at `path`.
    pub fn export_frame(&mut self, camera: &Camera, path: &Path) -> anyhow::Result<()> {
        let format = self.surface_config.format;

        let color_texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("export color target"),
            size: wgpu::Extent3d {
                width: EXPORT_WIDTH,
                height: EXPORT_HEIGHT,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let depth_texture = DepthTexture::new(
            &self.device,
            EXPORT_WIDTH,
            EXPORT_HEIGHT,
            Some("export depth buffer"),
        );

        // Use the export target's aspect ratio, not the window's.
        let projection = Mat4::perspective_rh(
            camera.fov_y(),
            EXPORT_WIDTH as f32 / EXPORT_HEIGHT as f32,
            camera.z_near(),
            camera.z_far(),
        );
        self.per_frame_uniforms
            .set_camera(camera.view_matrix(), projection, camera.eye());
        self.write_uniforms();

        // Texture-to-buffer copies require rows padded to the copy alignment.
        let unpadded_bytes_per_row = 4 * EXPORT_WIDTH;
        let padded_bytes_per_row =
            unpadded_bytes_per_row.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

        let readback_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("export readback buffer"),
            size: (padded_bytes_per_row * EXPORT_HEIGHT) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("export encoder"),
            });

        self.encode_scene_pass(&mut encoder, &color_view, &depth_texture.view);

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &color_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &readback_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(EXPORT_HEIGHT),
                },
            },
            wgpu::Extent3d {
                width: EXPORT_WIDTH,
                height: EXPORT_HEIGHT,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        // Block until the readback buffer is mapped.
        let (tx, rx) = mpsc::channel();
        readback_buffer
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .context("readback mapping callback never ran")?
            .context("failed to map export readback buffer")?;

        let image = {
            let mapped = readback_buffer.slice(..).get_mapped_range();
            copy_to_image(
                &mapped,
                EXPORT_WIDTH,
                EXPORT_HEIGHT,
                padded_bytes_per_row as usize,
                format,
            )?
        };
        readback_buffer.unmap();

        image
            .save(path)
            .with_context(|| format!("failed to write image to {}", path.display()))?;

        info!("saved {}x{} frame to {}", EXPORT_WIDTH, EXPORT_HEIGHT, path.display());
        Ok(())
    }
}

/// Strip row padding and convert the raw texture bytes to an RGBA image.
fn copy_to_image(
    data: &[u8],
    width: u32,
    height: u32,
    padded_bytes_per_row: usize,
    format: wgpu::TextureFormat,
) -> anyhow::Result<image::RgbaImage> {
    let swap_red_blue = match format {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => false,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => true,
        other => bail!("unsupported surface format for export: {other:?}"),
    };

    let mut pixels = Vec::with_capacity((4 * width * height) as usize);

    for row in data.chunks(padded_bytes_per_row) {
        for pixel in row[..4 * width as usize].chunks_exact(4) {
            if swap_red_blue {
                pixels.extend_from_slice(&[pixel[2], pixel[1], pixel[0], pixel[3]]);
            } else {
                pixels.extend_from_slice(pixel);
            }
        }
    }

    image::RgbaImage::from_raw(width, height, pixels)
        .context("export pixel data has the wrong length")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgra_rows_are_swizzled_and_row_padding_is_stripped() {
        // A 2x2 image with rows padded out to 16 bytes.
        let mut data = vec![0u8; 32];
        data[0..4].copy_from_slice(&[10, 20, 30, 255]);
        data[4..8].copy_from_slice(&[1, 2, 3, 255]);
        data[16..20].copy_from_slice(&[5, 6, 7, 255]);
        data[20..24].copy_from_slice(&[8, 9, 11, 255]);

        let image =
            copy_to_image(&data, 2, 2, 16, wgpu::TextureFormat::Bgra8UnormSrgb).unwrap();

        assert_eq!(image.get_pixel(0, 0).0, [30, 20, 10, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [3, 2, 1, 255]);
        assert_eq!(image.get_pixel(0, 1).0, [7, 6, 5, 255]);
        assert_eq!(image.get_pixel(1, 1).0, [11, 9, 8, 255]);
    }

    #[test]
    fn rgba_rows_pass_through_unchanged() {
        let mut data = vec![0u8; 8];
        data[0..4].copy_from_slice(&[10, 20, 30, 255]);
        data[4..8].copy_from_slice(&[40, 50, 60, 255]);

        let image = copy_to_image(&data, 2, 1, 8, wgpu::TextureFormat::Rgba8UnormSrgb).unwrap();

        assert_eq!(image.get_pixel(0, 0).0, [10, 20, 30, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [40, 50, 60, 255]);
    }
}
