pub mod app;
pub mod camera;
pub mod controls;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod shapes;

use std::time::Instant;

use anyhow::Context;
use glam::Vec2;
use winit::{
    event::{DeviceEvent, ElementState, Event, WindowEvent},
    event_loop::EventLoop,
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

use app::ViewerApp;
use renderer::Renderer;
use settings::Settings;

/// Create the viewer window and run its event loop until the user quits.
pub fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!("creating main window for rendering");

    let event_loop = EventLoop::new().context("failed to create window event loop")?;
    let window = WindowBuilder::new()
        .with_title("Scene Viewer")
        .build(&event_loop)
        .context("failed to create main window")?;

    let renderer = pollster::block_on(Renderer::new(&window, settings.tessellation))?;
    let mut viewer = ViewerApp::new(settings, renderer)?;

    tracing::info!("starting main window event loop");
    let mut last_frame_time = Instant::now();

    event_loop
        .run(move |event, control_flow| match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => control_flow.exit(),
                WindowEvent::KeyboardInput {
                    event: key_event, ..
                } if key_event.state == ElementState::Pressed
                    && key_event.logical_key == Key::Named(NamedKey::Escape) =>
                {
                    control_flow.exit()
                }
                WindowEvent::Resized(new_size) => {
                    viewer.window_resized(new_size.width, new_size.height);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let delta = now - last_frame_time;
                    last_frame_time = now;

                    viewer.update(delta);
                    viewer.render();
                }
                other => {
                    viewer.input(&other);
                }
            },
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => {
                viewer.mouse_motion(Vec2::new(delta.0 as f32, delta.1 as f32));
            }
            // Continuously animate by requesting a redraw whenever the event
            // queue drains.
            Event::AboutToWait => viewer.window().request_redraw(),
            _ => {}
        })
        .context("main window event loop processing failed")
}
