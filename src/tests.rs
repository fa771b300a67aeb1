//! Tests for the frame pipeline, driven through a mock backend

use winit::keyboard::KeyCode;

use crate::error::{FrameError, UniformError};
use crate::frame::{FrameBackend, FrameLoop, KeyAction, QUIT_KEY};
use crate::gpu::storage::seed_ramp;
use crate::shader::ShaderInterface;
use crate::uniforms::{UniformName, UniformSet, UniformValue};

const WIDTH: u32 = 8;
const HEIGHT: u32 = 4;

/// CPU stand-in for the GPU resource set.
///
/// The "compute program" writes a deterministic function of its input state and
/// uniforms into the texture; "present" records a copy of the texture.
struct MockBackend {
    compute_input: Option<Vec<f32>>,
    compute_interface: ShaderInterface,
    texture: Vec<f32>,
    presented: Vec<Vec<f32>>,
    render_times: Vec<f32>,
    calls: Vec<&'static str>,
}

impl MockBackend {
    fn new(compute: bool) -> Self {
        let len = (WIDTH * HEIGHT * 4) as usize;
        Self {
            compute_input: compute.then(|| seed_ramp(len)),
            compute_interface: ShaderInterface::with_uniforms(["u_time", "u_resolution"]),
            texture: vec![0.0; len],
            presented: Vec::new(),
            render_times: Vec::new(),
            calls: Vec::new(),
        }
    }
}

impl FrameBackend for MockBackend {
    fn compute_enabled(&self) -> bool {
        self.compute_input.is_some()
    }

    fn set_render_time(&mut self, time: f32) -> Result<(), FrameError> {
        self.calls.push("update");
        self.render_times.push(time);
        Ok(())
    }

    fn dispatch_compute(&mut self, uniforms: &UniformSet) -> Result<(), FrameError> {
        let Some(input) = &self.compute_input else {
            return Ok(());
        };
        uniforms.validate("compute", &self.compute_interface)?;
        self.calls.push("dispatch");

        let time = match uniforms.get(UniformName::Time) {
            Some(UniformValue::Float(t)) => t,
            _ => 0.0,
        };
        let width = match uniforms.get(UniformName::Resolution) {
            Some(UniformValue::Vec2([w, _])) => w,
            _ => 1.0,
        };
        for (i, texel) in self.texture.iter_mut().enumerate() {
            *texel = 0.5 * input[i] + 0.5 * (time + i as f32 / width).sin();
        }
        Ok(())
    }

    fn present(&mut self) -> Result<(), FrameError> {
        self.calls.push("present");
        self.presented.push(self.texture.clone());
        Ok(())
    }
}

fn frame_loop(compute: bool) -> FrameLoop<MockBackend> {
    FrameLoop::new(MockBackend::new(compute), (WIDTH, HEIGHT))
}

#[test]
fn test_elapsed_is_sum_of_deltas() {
    let mut frame = frame_loop(true);
    let deltas = [0.016, 0.0, 0.5, 1.0e6, 0.033, 0.0];

    for delta in deltas {
        frame.update(delta).unwrap();
    }

    let expected: f64 = deltas.iter().sum();
    assert!((frame.elapsed() - expected).abs() <= expected * f64::EPSILON * 8.0);
    assert_eq!(frame.backend().render_times.len(), deltas.len());
    assert_eq!(*frame.backend().render_times.last().unwrap(), expected as f32);
}

#[test]
fn test_elapsed_is_monotonic() {
    let mut frame = frame_loop(false);
    let mut previous = frame.elapsed();
    for i in 0..100 {
        frame.update(i as f64 * 0.001).unwrap();
        assert!(frame.elapsed() >= previous);
        previous = frame.elapsed();
    }
}

#[test]
fn test_invalid_deltas_are_ignored() {
    let mut frame = frame_loop(false);
    frame.update(1.0).unwrap();
    frame.update(-0.5).unwrap();
    frame.update(f64::NAN).unwrap();
    frame.update(f64::INFINITY).unwrap();
    assert_eq!(frame.elapsed(), 1.0);
}

#[test]
fn test_draw_twice_without_update_is_identical() {
    let mut frame = frame_loop(true);
    frame.update(0.25).unwrap();

    frame.draw().unwrap();
    frame.draw().unwrap();

    let presented = &frame.backend().presented;
    assert_eq!(presented.len(), 2);
    assert_eq!(presented[0], presented[1]);
    // Compute actually wrote something
    assert!(presented[0].iter().any(|&v| v != 0.0));
}

#[test]
fn test_update_between_draws_changes_frame() {
    let mut frame = frame_loop(true);
    frame.draw().unwrap();
    frame.update(0.5).unwrap();
    frame.draw().unwrap();

    let presented = &frame.backend().presented;
    assert_ne!(presented[0], presented[1]);
}

#[test]
fn test_draw_dispatches_before_present() {
    let mut frame = frame_loop(true);
    frame.update(0.1).unwrap();
    frame.draw().unwrap();
    assert_eq!(frame.backend().calls, vec!["update", "dispatch", "present"]);
}

#[test]
fn test_compute_disabled_presents_initial_texture() {
    let mut frame = frame_loop(false);
    frame.update(1.0).unwrap();
    frame.draw().unwrap();
    frame.draw().unwrap();

    let backend = frame.backend();
    assert_eq!(backend.calls, vec!["update", "present", "present"]);
    for texture in &backend.presented {
        assert!(texture.iter().all(|&v| v == 0.0));
    }
}

#[test]
fn test_dispatch_without_compute_is_noop() {
    let mut backend = MockBackend::new(false);
    let uniforms = UniformSet::new().with(UniformName::Time, UniformValue::Float(3.0));

    backend.dispatch_compute(&uniforms).unwrap();

    assert!(backend.calls.is_empty());
    assert!(backend.texture.iter().all(|&v| v == 0.0));
}

#[test]
fn test_frame_uniforms_carry_time_and_resolution() {
    let mut frame = frame_loop(true);
    frame.update(2.0).unwrap();

    let uniforms = frame.frame_uniforms();
    assert_eq!(uniforms.get(UniformName::Time), Some(UniformValue::Float(2.0)));
    assert_eq!(
        uniforms.get(UniformName::Resolution),
        Some(UniformValue::Vec2([WIDTH as f32, HEIGHT as f32]))
    );
}

#[test]
fn test_missing_compute_uniform_fails_draw() {
    let mut backend = MockBackend::new(true);
    backend.compute_interface = ShaderInterface::with_uniforms(["u_time"]);
    let mut frame = FrameLoop::new(backend, (WIDTH, HEIGHT));

    match frame.draw() {
        Err(FrameError::Uniform(UniformError::NotFound { program, name })) => {
            assert_eq!(program, "compute");
            assert_eq!(name, "u_resolution");
        }
        other => panic!("expected missing uniform, got {:?}", other),
    }
    assert!(frame.backend().presented.is_empty());
}

#[test]
fn test_quit_key_requests_close_once() {
    let mut frame = frame_loop(true);
    frame.update(0.5).unwrap();
    let calls_before = frame.backend().calls.len();

    assert_eq!(frame.key_pressed(QUIT_KEY), KeyAction::Quit);
    assert!(frame.close_requested());

    // Nothing else changed
    assert_eq!(frame.elapsed(), 0.5);
    assert_eq!(frame.backend().calls.len(), calls_before);

    assert_eq!(frame.key_pressed(QUIT_KEY), KeyAction::Ignored);
}

#[test]
fn test_other_keys_are_ignored() {
    let mut frame = frame_loop(true);
    for key in [KeyCode::Escape, KeyCode::KeyW, KeyCode::Space, KeyCode::Digit1] {
        assert_eq!(frame.key_pressed(key), KeyAction::Ignored);
    }
    assert!(!frame.close_requested());
    assert!(frame.backend().calls.is_empty());
}
