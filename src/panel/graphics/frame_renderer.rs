use std::sync::Arc;
use winit::window::Window;

use crate::panel::poller::RgbaFrame;

mod vulkano_backend {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use vulkano::buffer::{Buffer, BufferCreateInfo, BufferUsage};
    use vulkano::command_buffer::{
        AutoCommandBufferBuilder, CommandBufferUsage, CopyBufferToImageInfo,
        PrimaryCommandBufferAbstract, RenderPassBeginInfo, SubpassBeginInfo, SubpassEndInfo,
        allocator::StandardCommandBufferAllocator,
    };
    use vulkano::descriptor_set::allocator::StandardDescriptorSetAllocator;
    use vulkano::descriptor_set::layout::{
        DescriptorSetLayout, DescriptorSetLayoutBinding, DescriptorSetLayoutCreateInfo,
        DescriptorType,
    };
    use vulkano::descriptor_set::{DescriptorSet, WriteDescriptorSet};
    use vulkano::format::{ClearValue, Format};
    use vulkano::image::sampler::{Sampler, SamplerCreateInfo};
    use vulkano::image::view::ImageView;
    use vulkano::image::{Image, ImageCreateInfo, ImageType, ImageUsage};
    use vulkano::memory::allocator::{AllocationCreateInfo, MemoryTypeFilter};
    use vulkano::pipeline::graphics::color_blend::{ColorBlendAttachmentState, ColorBlendState};
    use vulkano::pipeline::graphics::input_assembly::InputAssemblyState;
    use vulkano::pipeline::graphics::multisample::MultisampleState;
    use vulkano::pipeline::graphics::rasterization::RasterizationState;
    use vulkano::pipeline::graphics::subpass::PipelineSubpassType;
    use vulkano::pipeline::graphics::vertex_input::VertexInputState;
    use vulkano::pipeline::graphics::viewport::{Scissor, Viewport, ViewportState};
    use vulkano::pipeline::layout::{PipelineLayout, PipelineLayoutCreateInfo};
    use vulkano::pipeline::{
        DynamicState, GraphicsPipeline, Pipeline, PipelineBindPoint, PipelineShaderStageCreateInfo,
    };
    use vulkano::render_pass::{Framebuffer, FramebufferCreateInfo, RenderPass, Subpass};
    use vulkano::shader::ShaderStages;
    use vulkano::swapchain::{self, Surface, Swapchain, SwapchainCreateInfo, SwapchainPresentInfo};
    use vulkano::sync::{self, GpuFuture};
    use vulkano::{Validated, VulkanError};
    use vulkano_util::context::{VulkanoConfig, VulkanoContext};
    use winit::window::Window;

    use crate::panel::poller::RgbaFrame;

    mod frame_vs {
        vulkano_shaders::shader! {
            ty: "vertex",
            path: "assets/shaders/frame.vert",
        }
    }

    mod frame_fs {
        vulkano_shaders::shader! {
            ty: "fragment",
            path: "assets/shaders/frame.frag",
        }
    }

    /// The currently displayed frame on the GPU. Replacing this drops the
    /// previous texture once no submitted work references it.
    struct FrameTexture {
        set: Arc<DescriptorSet>,
        width: u32,
        height: u32,
    }

    pub struct VulkanoState {
        context: VulkanoContext,
        window: Arc<Window>,
        #[allow(dead_code)]
        surface: Arc<Surface>,
        swapchain: Arc<Swapchain>,
        swapchain_views: Vec<Arc<ImageView>>,
        render_pass: Arc<RenderPass>,
        framebuffers: Vec<Arc<Framebuffer>>,

        command_buffer_allocator: Arc<StandardCommandBufferAllocator>,
        descriptor_set_allocator: Arc<StandardDescriptorSetAllocator>,

        frame_set_layout: Arc<DescriptorSetLayout>,
        sampler: Arc<Sampler>,
        frame: Option<FrameTexture>,

        pipeline_frame_blit: Arc<GraphicsPipeline>,

        pub window_resized: bool,
        recreate_swapchain: bool,
        previous_frame_end: Option<Box<dyn GpuFuture>>,
    }

    impl VulkanoState {
        pub fn new(window: Arc<Window>) -> Result<Self, Box<dyn std::error::Error>> {
            // The helper context enables surface extensions and sets up
            // queues and allocators.
            let context = VulkanoContext::new(VulkanoConfig::default());
            let device = context.device().clone();

            let surface = Surface::from_window(device.instance().clone(), window.clone())?;

            let surface_capabilities = device
                .physical_device()
                .surface_capabilities(&surface, Default::default())?;
            let image_format = device
                .physical_device()
                .surface_formats(&surface, Default::default())?
                .first()
                .ok_or("no supported surface formats")?
                .0;

            let mut min_image_count = 2u32.max(surface_capabilities.min_image_count);
            if let Some(max_image_count) = surface_capabilities.max_image_count {
                min_image_count = min_image_count.min(max_image_count);
            }

            let (swapchain, images) = Swapchain::new(
                device.clone(),
                surface.clone(),
                SwapchainCreateInfo {
                    min_image_count,
                    image_format,
                    image_extent: window.inner_size().into(),
                    image_usage: ImageUsage::COLOR_ATTACHMENT,
                    composite_alpha: surface_capabilities
                        .supported_composite_alpha
                        .into_iter()
                        .next()
                        .ok_or("no supported composite alpha")?,
                    ..Default::default()
                },
            )?;

            let swapchain_views = images
                .into_iter()
                .map(|image| ImageView::new_default(image).map_err(|e| e.into()))
                .collect::<Result<Vec<_>, Box<dyn std::error::Error>>>()?;

            let render_pass = vulkano::single_pass_renderpass!(
                device.clone(),
                attachments: {
                    color: {
                        format: swapchain.image_format(),
                        samples: 1,
                        load_op: Clear,
                        store_op: Store,
                    },
                },
                pass: {
                    color: [color],
                    depth_stencil: {},
                }
            )?;

            let framebuffers = swapchain_views
                .iter()
                .map(|view| {
                    Framebuffer::new(
                        render_pass.clone(),
                        FramebufferCreateInfo {
                            attachments: vec![view.clone()],
                            ..Default::default()
                        },
                    )
                    .map_err(|e| e.into())
                })
                .collect::<Result<Vec<_>, Box<dyn std::error::Error>>>()?;

            // Set 0, binding 0: the sampled frame texture.
            let mut bindings = BTreeMap::new();
            let mut frame_binding =
                DescriptorSetLayoutBinding::descriptor_type(DescriptorType::CombinedImageSampler);
            frame_binding.descriptor_count = 1;
            frame_binding.stages = ShaderStages::FRAGMENT;
            bindings.insert(0, frame_binding);

            let frame_set_layout = DescriptorSetLayout::new(
                device.clone(),
                DescriptorSetLayoutCreateInfo {
                    bindings,
                    ..Default::default()
                },
            )?;

            let vs = frame_vs::load(device.clone())?;
            let fs = frame_fs::load(device.clone())?;

            let stages = vec![
                PipelineShaderStageCreateInfo::new(
                    vs.entry_point("main")
                        .ok_or("missing frame.vert entry point")?,
                ),
                PipelineShaderStageCreateInfo::new(
                    fs.entry_point("main")
                        .ok_or("missing frame.frag entry point")?,
                ),
            ];

            let layout = PipelineLayout::new(
                device.clone(),
                PipelineLayoutCreateInfo {
                    set_layouts: vec![frame_set_layout.clone()],
                    ..Default::default()
                },
            )?;

            let subpass = Subpass::from(render_pass.clone(), 0).ok_or("missing subpass 0")?;

            // Fullscreen triangle: positions come from gl_VertexIndex, so the
            // vertex input state is deliberately empty.
            let mut pipeline_ci =
                vulkano::pipeline::graphics::GraphicsPipelineCreateInfo::layout(layout);
            pipeline_ci.stages = stages.into();
            pipeline_ci.vertex_input_state = Some(VertexInputState::new());
            pipeline_ci.input_assembly_state = Some(InputAssemblyState::default());
            pipeline_ci.viewport_state = Some(ViewportState::default());
            pipeline_ci.rasterization_state = Some(RasterizationState::default());
            pipeline_ci.multisample_state = Some(MultisampleState::default());
            pipeline_ci.depth_stencil_state = None;
            // Opaque blit; no blending.
            pipeline_ci.color_blend_state = Some(ColorBlendState::with_attachment_states(
                1,
                ColorBlendAttachmentState::default(),
            ));
            pipeline_ci.dynamic_state = [DynamicState::Viewport, DynamicState::Scissor]
                .into_iter()
                .collect();
            pipeline_ci.subpass = Some(PipelineSubpassType::BeginRenderPass(subpass));

            let pipeline_frame_blit = GraphicsPipeline::new(device.clone(), None, pipeline_ci)?;

            let command_buffer_allocator = Arc::new(StandardCommandBufferAllocator::new(
                device.clone(),
                Default::default(),
            ));

            let descriptor_set_allocator = Arc::new(StandardDescriptorSetAllocator::new(
                device.clone(),
                Default::default(),
            ));

            let sampler = Sampler::new(device.clone(), SamplerCreateInfo::simple_repeat_linear())?;

            Ok(Self {
                context,
                window,
                surface,
                swapchain,
                swapchain_views,
                render_pass,
                framebuffers,

                command_buffer_allocator,
                descriptor_set_allocator,

                frame_set_layout,
                sampler,
                frame: None,

                pipeline_frame_blit,

                window_resized: false,
                recreate_swapchain: false,
                previous_frame_end: Some(sync::now(device).boxed()),
            })
        }

        fn recreate_swapchain_if_needed(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            if !(self.window_resized || self.recreate_swapchain) {
                return Ok(());
            }

            self.recreate_swapchain = false;
            let new_dimensions = self.window.inner_size();
            if new_dimensions.width == 0 || new_dimensions.height == 0 {
                // Avoid recreating with a zero-sized swapchain while minimized.
                return Ok(());
            }

            let (new_swapchain, new_images) = match self.swapchain.recreate(SwapchainCreateInfo {
                image_extent: new_dimensions.into(),
                ..self.swapchain.create_info()
            }) {
                Ok(r) => r,
                Err(e) => {
                    self.recreate_swapchain = true;
                    tracing::warn!(
                        "failed to recreate swapchain: {}",
                        Validated::unwrap(e)
                    );
                    return Ok(());
                }
            };

            self.swapchain = new_swapchain;
            self.swapchain_views = new_images
                .into_iter()
                .map(|image| ImageView::new_default(image).map_err(|e| e.into()))
                .collect::<Result<Vec<_>, Box<dyn std::error::Error>>>()?;

            self.framebuffers = self
                .swapchain_views
                .iter()
                .map(|view| {
                    Framebuffer::new(
                        self.render_pass.clone(),
                        FramebufferCreateInfo {
                            attachments: vec![view.clone()],
                            ..Default::default()
                        },
                    )
                    .map_err(|e| e.into())
                })
                .collect::<Result<Vec<_>, Box<dyn std::error::Error>>>()?;

            self.window_resized = false;
            Ok(())
        }

        /// Uploads a decoded frame and makes it the displayed one. The
        /// superseded texture is released once submitted work stops
        /// referencing it.
        pub fn upload_frame(&mut self, frame: &RgbaFrame) -> Result<(), Box<dyn std::error::Error>> {
            if frame.width == 0 || frame.height == 0 {
                return Err("frame has zero size".into());
            }

            let expected_len = frame.width as usize * frame.height as usize * 4;
            if frame.pixels.len() != expected_len {
                return Err(format!(
                    "frame rgba length mismatch: got={}, expected={}",
                    frame.pixels.len(),
                    expected_len
                )
                .into());
            }

            let memory_allocator = self.context.memory_allocator().clone();
            let queue = self.context.graphics_queue().clone();

            let staging = Buffer::from_iter(
                memory_allocator.clone(),
                BufferCreateInfo {
                    usage: BufferUsage::TRANSFER_SRC,
                    ..Default::default()
                },
                AllocationCreateInfo {
                    memory_type_filter: MemoryTypeFilter::PREFER_HOST
                        | MemoryTypeFilter::HOST_SEQUENTIAL_WRITE,
                    ..Default::default()
                },
                frame.pixels.iter().copied(),
            )?;

            let image = Image::new(
                memory_allocator,
                ImageCreateInfo {
                    image_type: ImageType::Dim2d,
                    format: Format::R8G8B8A8_UNORM,
                    extent: [frame.width, frame.height, 1],
                    usage: ImageUsage::TRANSFER_DST | ImageUsage::SAMPLED,
                    ..Default::default()
                },
                AllocationCreateInfo {
                    memory_type_filter: MemoryTypeFilter::PREFER_DEVICE,
                    ..Default::default()
                },
            )?;

            let mut cbb = AutoCommandBufferBuilder::primary(
                self.command_buffer_allocator.clone(),
                queue.queue_family_index(),
                CommandBufferUsage::OneTimeSubmit,
            )?;

            cbb.copy_buffer_to_image(CopyBufferToImageInfo::buffer_image(staging, image.clone()))?;

            let cb = cbb.build()?;

            cb.execute(queue.clone())?
                .then_signal_fence_and_flush()?
                .wait(None)?;

            let view = ImageView::new_default(image)
                .map_err(|e| -> Box<dyn std::error::Error> { format!("{e:?}").into() })?;

            let set = DescriptorSet::new(
                self.descriptor_set_allocator.clone(),
                self.frame_set_layout.clone(),
                [WriteDescriptorSet::image_view_sampler(
                    0,
                    view,
                    self.sampler.clone(),
                )],
                [],
            )?;

            self.frame = Some(FrameTexture {
                set,
                width: frame.width,
                height: frame.height,
            });
            Ok(())
        }

        pub fn draw(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            self.recreate_swapchain_if_needed()?;

            let device = self.context.device().clone();
            let queue = self.context.graphics_queue().clone();

            let extent = self.swapchain.image_extent();
            if extent[0] == 0 || extent[1] == 0 {
                return Ok(());
            }

            if let Some(previous_frame_end) = self.previous_frame_end.as_mut() {
                previous_frame_end.cleanup_finished();
            }

            let (image_i, suboptimal, acquire_future) =
                match swapchain::acquire_next_image(self.swapchain.clone(), None)
                    .map_err(Validated::unwrap)
                {
                    Ok(r) => r,
                    Err(VulkanError::OutOfDate) => {
                        self.recreate_swapchain = true;
                        return Ok(());
                    }
                    Err(e) => return Err(Box::new(e)),
                };

            if suboptimal {
                self.recreate_swapchain = true;
            }

            let framebuffer = self.framebuffers[image_i as usize].clone();
            let mut render_pass_begin = RenderPassBeginInfo::framebuffer(framebuffer);
            render_pass_begin.clear_values = vec![Some(ClearValue::from([0.0f32, 0.0, 0.0, 1.0]))];

            let mut cbb = AutoCommandBufferBuilder::primary(
                self.command_buffer_allocator.clone(),
                queue.queue_family_index(),
                CommandBufferUsage::OneTimeSubmit,
            )?;

            cbb.begin_render_pass(render_pass_begin, SubpassBeginInfo::default())?;

            if let Some(frame) = &self.frame {
                // Fit the frame inside the window, preserving its aspect
                // ratio; the uncovered border stays the clear color.
                let (offset, size) = super::letterbox_rect(extent, frame.width, frame.height);
                let viewport = Viewport {
                    offset,
                    extent: size,
                    depth_range: 0.0..=1.0,
                    ..Default::default()
                };

                cbb.set_viewport(0, vec![viewport].into())?;
                cbb.set_scissor(
                    0,
                    vec![Scissor {
                        offset: [0, 0],
                        extent: [extent[0], extent[1]],
                        ..Default::default()
                    }]
                    .into(),
                )?;

                cbb.bind_pipeline_graphics(self.pipeline_frame_blit.clone())?;
                cbb.bind_descriptor_sets(
                    PipelineBindPoint::Graphics,
                    self.pipeline_frame_blit.layout().clone(),
                    0,
                    frame.set.clone(),
                )?;

                unsafe {
                    cbb.draw(3, 1, 0, 0)?;
                }
            }

            cbb.end_render_pass(SubpassEndInfo::default())?;

            let cb = cbb.build()?;

            let start_future: Box<dyn GpuFuture> = self
                .previous_frame_end
                .take()
                .unwrap_or_else(|| sync::now(device.clone()).boxed());

            let execution = start_future
                .join(acquire_future)
                .then_execute(queue.clone(), cb)?
                .then_swapchain_present(
                    queue.clone(),
                    SwapchainPresentInfo::swapchain_image_index(self.swapchain.clone(), image_i),
                )
                .then_signal_fence_and_flush();

            match execution.map_err(Validated::unwrap) {
                Ok(future) => {
                    // Keep the future so resources can be cleaned up incrementally.
                    self.previous_frame_end = Some(future.boxed());
                }
                Err(VulkanError::OutOfDate) => {
                    self.recreate_swapchain = true;
                    self.previous_frame_end = Some(sync::now(device).boxed());
                }
                Err(e) => {
                    tracing::warn!("failed to flush frame: {e}");
                    self.previous_frame_end = Some(sync::now(device).boxed());
                }
            }

            Ok(())
        }
    }
}

/// Viewport rectangle that fits a `frame_width` x `frame_height` image
/// inside `extent` without stretching. Returns `(offset, size)` in pixels.
fn letterbox_rect(extent: [u32; 2], frame_width: u32, frame_height: u32) -> ([f32; 2], [f32; 2]) {
    let (sw, sh) = (extent[0] as f32, extent[1] as f32);
    let (fw, fh) = (frame_width as f32, frame_height as f32);

    if sw <= 0.0 || sh <= 0.0 || fw <= 0.0 || fh <= 0.0 {
        return ([0.0, 0.0], [sw.max(0.0), sh.max(0.0)]);
    }

    let scale = (sw / fw).min(sh / fh);
    let (w, h) = (fw * scale, fh * scale);
    ([(sw - w) * 0.5, (sh - h) * 0.5], [w, h])
}

/// Vulkano-backed presenter for fetched render frames.
pub struct FrameRenderer {
    vulkano: Option<vulkano_backend::VulkanoState>,
}

impl FrameRenderer {
    pub fn new() -> Self {
        Self { vulkano: None }
    }

    pub fn init_for_window(
        &mut self,
        window: &Arc<Window>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if self.vulkano.is_none() {
            self.vulkano = Some(vulkano_backend::VulkanoState::new(window.clone())?);
            tracing::info!("swapchain and frame-blit pipeline initialized");
        }

        Ok(())
    }

    pub fn resize(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        let _ = size;
        if let Some(vulkano) = self.vulkano.as_mut() {
            vulkano.window_resized = true;
        }
    }

    /// Replaces the displayed frame with a newly fetched one.
    pub fn present_frame(&mut self, frame: &RgbaFrame) -> Result<(), Box<dyn std::error::Error>> {
        let Some(vulkano) = self.vulkano.as_mut() else {
            return Err("FrameRenderer not initialized (call init_for_window first)".into());
        };

        vulkano.upload_frame(frame)
    }

    pub fn draw_frame(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(vulkano) = self.vulkano.as_mut() else {
            return Err("FrameRenderer not initialized (call init_for_window first)".into());
        };

        vulkano.draw()
    }
}

#[cfg(test)]
mod tests {
    use super::letterbox_rect;

    #[test]
    fn wide_frame_in_tall_window_letterboxes_vertically() {
        let (offset, size) = letterbox_rect([400, 800], 200, 100);
        assert_eq!(size, [400.0, 200.0]);
        assert_eq!(offset, [0.0, 300.0]);
    }

    #[test]
    fn tall_frame_in_wide_window_pillarboxes_horizontally() {
        let (offset, size) = letterbox_rect([800, 400], 100, 200);
        assert_eq!(size, [200.0, 400.0]);
        assert_eq!(offset, [300.0, 0.0]);
    }

    #[test]
    fn exact_fit_fills_the_window() {
        let (offset, size) = letterbox_rect([500, 500], 500, 500);
        assert_eq!(size, [500.0, 500.0]);
        assert_eq!(offset, [0.0, 0.0]);
    }

    #[test]
    fn zero_extent_degrades_to_an_empty_rect() {
        let (offset, size) = letterbox_rect([0, 0], 500, 500);
        assert_eq!(offset, [0.0, 0.0]);
        assert_eq!(size, [0.0, 0.0]);
    }
}
