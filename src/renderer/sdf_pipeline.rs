//! SDF-based WebGPU render pipeline
//!
//! Paints a [`Scene`] in the fragment shader using signed distance fields.
//! Stars and lines are uploaded to storage buffers every frame; labels are
//! left to the host (DOM overlay). Scenes are in CSS pixels; `scale` maps
//! them onto the physical surface.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use wgpu::util::DeviceExt;

use super::scene::Scene;
use crate::error::{Result, StarfieldError};

/// Maximum number of star sprites
const MAX_STARS: usize = 512;
/// Maximum number of line segments
const MAX_LINES: usize = 1024;

const FLAG_CURSOR: u32 = 1;
const FLAG_FOCAL: u32 = 2;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2],    // offset 0
    time: f32,               // offset 8
    star_count: u32,         // offset 12
    line_count: u32,         // offset 16
    flags: u32,              // offset 20
    fade: f32,               // offset 24
    scale: f32,              // offset 28 - surface pixels per scene unit
    cursor: [f32; 4],        // offset 32 - xy, radius
    cursor_color: [f32; 4],  // offset 48
    focal: [f32; 4],         // offset 64 - center, radius, ring alpha
    clear: [f32; 4],         // offset 80
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct StarData {
    pos: [f32; 2],
    radius: f32,
    glow: f32,
    color: [f32; 4],
    ray_len: f32,
    ray_alpha: f32,
    hot_core: u32,
    _pad: u32, // Pad to 48 bytes
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct LineData {
    p0: [f32; 2],
    p1: [f32; 2],
    color: [f32; 4],
    width: f32,
    gradient: u32,
    front: u32,
    _pad: u32,
}

#[inline]
fn xy(v: Vec2) -> [f32; 2] {
    [v.x, v.y]
}

impl Globals {
    fn from_scene(scene: &Scene, resolution: [f32; 2], time: f32, scale: f32) -> Self {
        let mut flags = 0;
        let mut cursor = [0.0; 4];
        let mut cursor_color = [0.0; 4];
        if let Some(glow) = &scene.cursor {
            flags |= FLAG_CURSOR;
            cursor = [glow.pos.x, glow.pos.y, glow.radius, 0.0];
            cursor_color = glow.color;
        }
        let mut focal = [0.0; 4];
        if let Some(disc) = &scene.focal {
            flags |= FLAG_FOCAL;
            focal = [disc.center.x, disc.center.y, disc.radius, disc.ring_alpha];
        }

        Self {
            resolution,
            time,
            star_count: scene.stars.len().min(MAX_STARS) as u32,
            line_count: scene.lines.len().min(MAX_LINES) as u32,
            flags,
            fade: scene.fade,
            scale: if scale > 0.0 { scale } else { 1.0 },
            cursor,
            cursor_color,
            focal,
            clear: scene.clear,
        }
    }
}

fn star_data(scene: &Scene) -> Vec<StarData> {
    scene
        .stars
        .iter()
        .take(MAX_STARS)
        .map(|s| StarData {
            pos: xy(s.pos),
            radius: s.radius,
            glow: s.glow,
            color: s.color,
            ray_len: s.ray_len,
            ray_alpha: s.ray_alpha,
            hot_core: u32::from(s.hot_core),
            _pad: 0,
        })
        .collect()
}

fn line_data(scene: &Scene) -> Vec<LineData> {
    scene
        .lines
        .iter()
        .take(MAX_LINES)
        .map(|l| LineData {
            p0: xy(l.from),
            p1: xy(l.to),
            color: l.color,
            width: l.width,
            gradient: u32::from(l.gradient),
            front: u32::from(l.front),
            _pad: 0,
        })
        .collect()
}

// ============================================================================
// SDF RENDER STATE
// ============================================================================

pub struct SdfRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    stars_buffer: wgpu::Buffer,
    lines_buffer: wgpu::Buffer,

    bind_group: wgpu::BindGroup,

    pub size: (u32, u32),
    /// Device pixel ratio of the surface
    scale: f32,
    start_time: f64,
}

impl SdfRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sdf-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .map_err(|e| StarfieldError::Gpu(format!("request_device: {e}")))?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);
        log::info!("Surface alpha modes: {:?}", surface_caps.alpha_modes);

        // Scene colors are authored in sRGB already
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| StarfieldError::Gpu("surface reports no formats".to_string()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("field_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("field_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals::from_scene(
                &Scene::default(),
                [width as f32, height as f32],
                0.0,
                1.0,
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let stars_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("stars"),
            size: (std::mem::size_of::<StarData>() * MAX_STARS) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let lines_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lines"),
            size: (std::mem::size_of::<LineData>() * MAX_LINES) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let storage_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(1),
                storage_entry(2),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sdf_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: stars_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: lines_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sdf_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // No vertex buffers - fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            stars_buffer,
            lines_buffer,
            bind_group,
            size: (width, height),
            scale: 1.0,
            start_time: 0.0,
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Set the device pixel ratio between scene units and the surface
    pub fn set_scale(&mut self, scale: f32) {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
    }

    pub fn set_start_time(&mut self, time: f64) {
        self.start_time = time;
    }

    /// Upload the scene and draw it
    pub fn render(&mut self, scene: &Scene, time: f64) -> std::result::Result<(), wgpu::SurfaceError> {
        // time is ms from requestAnimationFrame, shader wants seconds
        let elapsed = ((time - self.start_time) / 1000.0) as f32;

        let resolution = [self.size.0 as f32, self.size.1 as f32];
        let globals = Globals::from_scene(scene, resolution, elapsed, self.scale);
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        let stars = star_data(scene);
        if !stars.is_empty() {
            self.queue
                .write_buffer(&self.stars_buffer, 0, bytemuck::cast_slice(&stars));
        }

        let lines = line_data(scene);
        if !lines.is_empty() {
            self.queue
                .write_buffer(&self.lines_buffer, 0, bytemuck::cast_slice(&lines));
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sdf_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sdf_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::scene::{CursorGlow, FocalDisc, Line, StarSprite};

    #[test]
    fn test_gpu_struct_sizes_match_shader() {
        assert_eq!(std::mem::size_of::<Globals>(), 96);
        assert_eq!(std::mem::size_of::<StarData>(), 48);
        assert_eq!(std::mem::size_of::<LineData>(), 48);
    }

    #[test]
    fn test_globals_flags_and_counts() {
        let mut scene = Scene::default();
        let g = Globals::from_scene(&scene, [800.0, 600.0], 0.0, 1.0);
        assert_eq!(g.flags, 0);

        scene.cursor = Some(CursorGlow {
            pos: Vec2::new(1.0, 2.0),
            radius: 70.0,
            color: [0.1, 0.2, 0.3, 0.4],
        });
        scene.focal = Some(FocalDisc {
            center: Vec2::new(400.0, 300.0),
            radius: 48.0,
            ring_alpha: 0.4,
            hovered: false,
        });
        let star = StarSprite {
            pos: Vec2::ZERO,
            radius: 1.0,
            color: [1.0; 4],
            glow: 0.0,
            ray_len: 0.0,
            ray_alpha: 0.0,
            hot_core: true,
        };
        scene.stars = vec![star; MAX_STARS + 10];
        scene.lines = vec![Line {
            from: Vec2::ZERO,
            to: Vec2::ONE,
            width: 1.0,
            color: [1.0; 4],
            gradient: true,
            front: true,
        }];

        let g = Globals::from_scene(&scene, [800.0, 600.0], 0.0, 1.0);
        assert_eq!(g.flags, FLAG_CURSOR | FLAG_FOCAL);
        assert_eq!(g.star_count as usize, MAX_STARS);
        assert_eq!(g.line_count, 1);
        assert_eq!(g.focal, [400.0, 300.0, 48.0, 0.4]);
        assert_eq!(star_data(&scene).len(), MAX_STARS);
        assert_eq!(line_data(&scene)[0].gradient, 1);
        assert_eq!(line_data(&scene)[0].front, 1);
    }

    #[test]
    fn test_globals_carry_pixel_ratio() {
        let scene = Scene::default();
        let hidpi = Globals::from_scene(&scene, [1600.0, 1200.0], 0.0, 2.0);
        assert_eq!(hidpi.scale, 2.0);
        assert_eq!(hidpi.resolution, [1600.0, 1200.0]);

        let bogus = Globals::from_scene(&scene, [800.0, 600.0], 0.0, 0.0);
        assert_eq!(bogus.scale, 1.0);
    }
}
