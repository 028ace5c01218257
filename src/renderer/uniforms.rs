//! CPU side mirrors of the shader uniform buffers.
//!
//! Each buffer struct must exactly match the memory layout of its counterpart
//! in shader code. All fields are aligned to 16 bytes (`Vec4` boundaries) as
//! WebGPU requires for uniform address space data.

use std::cell::Cell;

use glam::{Mat4, Vec4};

use crate::scene::GlobalCoefficients;

use super::packing::{PackedLight, MAX_LIGHTS};

/// Maps a Rust struct of uniform values to a GPU buffer accessible from
/// shaders.
///
/// Callers mutate values through `values_mut()` and then call `update_gpu()`
/// to copy the new values across. Mutable access marks the buffer dirty even
/// if nothing actually changed.
#[derive(Debug)]
pub struct GenericUniformBuffer<T>
where
    T: Clone + Copy + std::fmt::Debug + bytemuck::Pod + bytemuck::Zeroable,
{
    values: T,
    gpu_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// True when `values` is potentially out of sync with the GPU copy.
    is_dirty: Cell<bool>,
}

impl<T> GenericUniformBuffer<T>
where
    T: Clone + Copy + std::fmt::Debug + bytemuck::Pod + bytemuck::Zeroable,
{
    pub fn new(
        device: &wgpu::Device,
        label: Option<&str>,
        values: T,
        bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let gpu_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label,
                contents: bytemuck::bytes_of(&values),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label,
            layout: bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: gpu_buffer.as_entire_binding(),
            }],
        });

        Self {
            values,
            gpu_buffer,
            bind_group,
            is_dirty: Cell::new(false),
        }
    }

    pub fn values_mut(&mut self) -> &mut T {
        self.is_dirty.set(true);
        &mut self.values
    }

    /// Copy the CPU values to the GPU buffer and clear the dirty flag.
    pub fn update_gpu(&self, queue: &wgpu::Queue) {
        self.is_dirty.set(false);
        queue.write_buffer(&self.gpu_buffer, 0, bytemuck::bytes_of(&self.values));
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty.get()
    }
}

/// Per-frame uniform values: camera matrices, the scene-wide lighting
/// coefficients and the packed light list.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PerFrameBufferData {
    pub view: Mat4,
    pub projection: Mat4,
    /// World space camera position. `.w` is unused.
    pub camera_pos: Vec4,
    /// x = k_a, y = k_d, z = k_s, w = active light count.
    pub coeffs: Vec4,
    pub lights: [PackedLight; MAX_LIGHTS],
}

/// Stores per-frame shader uniform values and copies them to the GPU. One
/// instance is needed per renderer.
pub struct PerFrameUniforms {
    buffer: GenericUniformBuffer<PerFrameBufferData>,
}

impl PerFrameUniforms {
    pub fn new(device: &wgpu::Device, layouts: &BindGroupLayouts) -> Self {
        Self {
            buffer: GenericUniformBuffer::new(
                device,
                Some("per-frame uniforms"),
                Default::default(),
                &layouts.per_frame_layout,
            ),
        }
    }

    /// Set the view and projection matrices along with the matching world
    /// space camera position.
    pub fn set_camera(&mut self, view: Mat4, projection: Mat4, camera_pos: glam::Vec3) {
        let values = self.buffer.values_mut();
        values.view = view;
        values.projection = projection;
        values.camera_pos = camera_pos.extend(1.0);
    }

    /// Set the scene-wide lighting coefficients.
    pub fn set_globals(&mut self, globals: GlobalCoefficients) {
        let values = self.buffer.values_mut();
        values.coeffs.x = globals.ka;
        values.coeffs.y = globals.kd;
        values.coeffs.z = globals.ks;
    }

    /// Replace the packed light list and active light count.
    pub fn set_lights(&mut self, lights: [PackedLight; MAX_LIGHTS], light_count: u32) {
        let values = self.buffer.values_mut();
        values.lights = lights;
        values.coeffs.w = light_count as f32;
    }

    pub fn update_gpu(&self, queue: &wgpu::Queue) {
        self.buffer.update_gpu(queue)
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        self.buffer.bind_group()
    }
}

/// Per-shape uniform values: the model transform, its inverse transpose for
/// normals, and the shape's Phong material.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PerShapeBufferData {
    pub model: Mat4,
    /// Inverse transpose of `model`, computed on the CPU because WGSL has no
    /// matrix inverse.
    pub normal_matrix: Mat4,
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    /// x = shininess. yzw unused.
    pub params: Vec4,
}

/// Stores per-shape shader uniform values and copies them to the GPU. One
/// instance per flattened shape.
pub struct PerShapeUniforms {
    buffer: GenericUniformBuffer<PerShapeBufferData>,
}

impl PerShapeUniforms {
    pub fn new(device: &wgpu::Device, layouts: &BindGroupLayouts) -> Self {
        Self {
            buffer: GenericUniformBuffer::new(
                device,
                Some("per-shape uniforms"),
                Default::default(),
                &layouts.per_shape_layout,
            ),
        }
    }

    /// Set the model-to-world transform. The normal matrix is derived here so
    /// the two can never drift apart.
    pub fn set_model(&mut self, model: Mat4) {
        let values = self.buffer.values_mut();
        values.model = model;
        values.normal_matrix = model.inverse().transpose();
    }

    /// Set the Phong material constants.
    pub fn set_material(&mut self, material: &crate::scene::Material) {
        let values = self.buffer.values_mut();
        values.ambient = material.ambient;
        values.diffuse = material.diffuse;
        values.specular = material.specular;
        values.params.x = material.shininess;
    }

    pub fn update_gpu(&self, queue: &wgpu::Queue) {
        self.buffer.update_gpu(queue)
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        self.buffer.bind_group()
    }

    pub fn is_dirty(&self) -> bool {
        self.buffer.is_dirty()
    }
}

/// A registry of the bind group layouts used by this renderer.
pub struct BindGroupLayouts {
    pub per_frame_layout: wgpu::BindGroupLayout,
    pub per_shape_layout: wgpu::BindGroupLayout,
}

impl BindGroupLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            per_frame_layout: device.create_bind_group_layout(&Self::uniform_desc(
                "per-frame bind group layout",
            )),
            per_shape_layout: device.create_bind_group_layout(&Self::uniform_desc(
                "per-shape bind group layout",
            )),
        }
    }

    /// Both bind groups are a single uniform buffer at binding 0, visible to
    /// the vertex and fragment stages.
    fn uniform_desc(label: &str) -> wgpu::BindGroupLayoutDescriptor<'_> {
        wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_data_layouts_are_16_byte_aligned() {
        // Shader-side structs assume these exact sizes.
        assert_eq!(std::mem::size_of::<PerFrameBufferData>(), 160 + 80 * MAX_LIGHTS);
        assert_eq!(std::mem::size_of::<PerShapeBufferData>(), 192);

        assert_eq!(std::mem::size_of::<PerFrameBufferData>() % 16, 0);
        assert_eq!(std::mem::size_of::<PerShapeBufferData>() % 16, 0);
    }
}
