//! RoomDemo - scene builder and audio loop

use std::f32::consts::TAU;
use std::time::{Duration, Instant};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use glam::Vec3;

use saavy_room::{
    io::AudioClip,
    playback::renderer,
    room::{AcousticElement, Dimensions, SceneSnapshot},
    SimulationConfig, Simulator,
};

/// Seconds between dry/wet flips
const TOGGLE_EVERY: Duration = Duration::from_secs(6);
const TICK: Duration = Duration::from_millis(50);

pub struct RoomDemo {
    config: SimulationConfig,
    dimensions: Dimensions,
    listener: Vec3,
    sources: Vec<(Vec3, f32)>,
}

impl RoomDemo {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            dimensions: Dimensions::new(4.0, 5.0, 3.0),
            listener: Vec3::new(2.0, 1.6, 2.5),
            sources: Vec::new(),
        }
    }

    /// Width, depth and height in meters
    pub fn room(mut self, width: f32, depth: f32, height: f32) -> Self {
        self.dimensions = Dimensions::new(width, depth, height);
        self
    }

    pub fn listener(mut self, position: Vec3) -> Self {
        self.listener = position;
        self
    }

    /// Add a plucked tone at `position`
    pub fn source(mut self, position: Vec3, freq_hz: f32) -> Self {
        self.sources.push((position, freq_hz));
        self
    }

    pub fn run(mut self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let stream_config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = stream_config.sample_rate().0;
        let channels = stream_config.channels() as usize;

        // Simulate at the device rate so clip and impulse response line up
        self.config.sample_rate = sample_rate as f32;

        println!("=== saavy-room ===");
        println!("Sample rate: {} Hz", sample_rate);
        println!("Channels: {}", channels);
        println!(
            "Room: {} x {} x {} m",
            self.dimensions.width, self.dimensions.depth, self.dimensions.height
        );
        println!();

        let (mut sink, mut renderer) = renderer::channel(self.config.ring_capacity, self.sources.len().max(1));
        let mut sim = Simulator::new(self.config.clone())?;

        let mut scene = SceneSnapshot::axis_aligned(self.dimensions, AcousticElement::shared("plaster", 0.05, "plaster"));
        scene.receiver = self.listener;
        for &(position, freq_hz) in &self.sources {
            let id = sim.add_source(pluck(freq_hz, sample_rate), 0.5);
            scene.sources.push((id, position));
            println!("  Source {} at {:?} ({} Hz)", id, position, freq_hz);
        }
        println!();

        let stream = device.build_output_stream(
            &stream_config.into(),
            move |data: &mut [f32], _| renderer.render_block(data, channels),
            |err| log::error!("Audio error: {}", err),
            None,
        )?;
        stream.play()?;

        println!("Playing... Press Ctrl+C to stop");
        println!();

        let mut last_generation = 0;
        let mut last_toggle = Instant::now();
        loop {
            if let Some(report) = sim.update(&scene, &mut sink)? {
                println!(
                    "Generation {} applied to {} sources ({} failed)",
                    report.generation,
                    report.applied.len(),
                    report.failed.len()
                );
            }

            if let Some(telemetry) = sim.telemetry() {
                if telemetry.generation != last_generation {
                    last_generation = telemetry.generation;
                    println!(
                        "Reverberation time: {}s ({} samples)",
                        telemetry.display_reverberation_time(),
                        telemetry.n_samples
                    );
                }
            }

            if !sim.has_pending() && last_toggle.elapsed() >= TOGGLE_EVERY {
                last_toggle = Instant::now();
                let wet = !sim.is_wet();
                sim.set_wet(wet, &mut sink)?;
                println!("Room simulation {}", if wet { "on" } else { "off" });
            }

            sink.collect_retired();
            std::thread::sleep(TICK);
        }
    }
}

/// Two seconds of decaying tones, one every half second
fn pluck(freq_hz: f32, sample_rate: u32) -> AudioClip {
    let fs = sample_rate as f32;
    let period = (fs * 0.5) as usize;
    let samples = (0..sample_rate as usize * 2)
        .map(|n| {
            let t = (n % period) as f32 / fs;
            (TAU * freq_hz * t).sin() * (-t * 12.0).exp() * 0.8
        })
        .collect();
    AudioClip::mono(samples, sample_rate)
}
