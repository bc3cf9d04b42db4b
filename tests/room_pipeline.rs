use glam::{Vec2, Vec3};
use saavy_room::{
    error::{GeometryError, PipelineError, PlaybackError, SimError},
    io::AudioClip,
    playback::{renderer, PlaybackSink},
    room::{AcousticElement, Dimensions, PlacedElement, SceneSnapshot, Surface},
    SimulationConfig, Simulator, SourceId,
};

fn config() -> SimulationConfig {
    SimulationConfig {
        max_samples: 1024,
        worker_threads: 2,
        ..Default::default()
    }
}

fn living_room(source: SourceId) -> SceneSnapshot {
    let mut scene = SceneSnapshot::axis_aligned(
        Dimensions::new(4.0, 5.0, 3.0),
        AcousticElement::shared("plaster", 0.1, "plaster"),
    );
    scene.receiver = Vec3::new(2.0, 1.5, 3.5);
    scene.sources.push((source, Vec3::new(1.0, 1.2, 1.0)));
    scene
}

fn tone(frames: usize) -> AudioClip {
    AudioClip::mono(
        (0..frames).map(|i| (i as f32 * 0.05).sin() * 0.5).collect(),
        16_000,
    )
}

#[test]
fn plays_dry_then_swaps_to_wet_without_restarting() {
    let (mut sink, mut renderer) = renderer::channel(16, 4);
    let mut sim = Simulator::new(config()).unwrap();
    let clip = tone(512);
    let id = sim.add_source(clip.clone(), 1.0);
    let scene = living_room(id);

    sim.update(&scene, &mut sink).unwrap();
    let mut out = vec![0.0; 100];
    renderer.render_block(&mut out, 1);
    assert_eq!(&out[..], &clip.samples()[..100], "raw clip plays first");
    assert_eq!(sink.elapsed_frames(id), 100);

    let report = sim.finish_pending(&mut sink).unwrap().unwrap();
    assert_eq!(report.applied, vec![id]);
    assert!(report.failed.is_empty());

    let wet = sim.current_buffer(id).unwrap().clone();
    assert!(wet.is_wet());
    assert!(wet.frames() > clip.frames(), "convolution adds a tail");

    // Wet playback picks up where the dry clip left off
    renderer.render_block(&mut out, 1);
    assert_eq!(&out[..], &wet.samples()[100..200]);

    let peak = |s: &[f32]| s.iter().fold(0.0f32, |m, x| m.max(x.abs()));
    let (wet_peak, dry_peak) = (peak(wet.samples()), peak(clip.samples()));
    assert!(
        (wet_peak - dry_peak).abs() < 1e-5,
        "normalised to the clip's peak: {} vs {}",
        wet_peak,
        dry_peak
    );
}

#[test]
fn rejected_geometry_keeps_previous_audio() {
    let (mut sink, mut renderer) = renderer::channel(16, 4);
    let mut sim = Simulator::new(config()).unwrap();
    let id = sim.add_source(tone(256), 1.0);

    let mut broken = living_room(id);
    broken.surfaces.retain(|p| p.surface != Surface::Floor);
    let err = sim.update(&broken, &mut sink).unwrap_err();
    assert_eq!(err, SimError::Geometry(GeometryError::MissingSurface(Surface::Floor)));
    assert!(!sim.has_pending());

    // Source still started, still dry
    let mut out = vec![0.0; 16];
    renderer.render_block(&mut out, 1);
    assert!(out.iter().any(|s| *s != 0.0));
    assert!(!sim.current_buffer(id).unwrap().is_wet());
}

#[test]
fn only_latest_generation_is_applied() {
    let (mut sink, _renderer) = renderer::channel(16, 4);
    let mut sim = Simulator::new(config()).unwrap();
    let id = sim.add_source(tone(256), 1.0);
    let mut scene = living_room(id);

    sim.update(&scene, &mut sink).unwrap();
    scene.sources[0].1 = Vec3::new(3.0, 1.2, 4.0);
    sim.request_recompute();
    sim.update(&scene, &mut sink).unwrap();

    // Drain until the moved source has been recomputed
    while sim.has_pending() {
        sim.finish_pending(&mut sink).unwrap();
        sim.update(&scene, &mut sink).unwrap();
    }
    assert_eq!(sim.generation(), 2);
    assert_eq!(sim.current_buffer(id).unwrap().generation(), Some(2));
}

#[test]
fn treatment_shortens_reverberation() {
    let (mut sink, _renderer) = renderer::channel(16, 4);
    let mut sim = Simulator::new(SimulationConfig {
        max_samples: 1 << 14,
        reflection_order: Some(2),
        ..config()
    })
    .unwrap();
    let id = sim.add_source(tone(128), 1.0);
    let mut scene = living_room(id);

    sim.update(&scene, &mut sink).unwrap();
    let bare = sim.telemetry().unwrap();
    sim.finish_pending(&mut sink).unwrap();

    let foam = AcousticElement::shared("foam", 0.95, "foam");
    for x in [0.5, 1.5, 2.5, 3.5] {
        scene.elements.push(PlacedElement::new(
            Vec3::new(x, 3.0, 2.5),
            Vec2::new(1.0, 5.0),
            foam.clone(),
        ));
    }
    sim.request_recompute();
    sim.update(&scene, &mut sink).unwrap();
    let treated = sim.telemetry().unwrap();

    assert!(treated.reverberation_time < bare.reverberation_time);
    assert!(treated.n_samples < bare.n_samples);
    assert_eq!(treated.generation, 2);
}

#[test]
fn yaml_config_drives_anechoic_room() {
    let config = SimulationConfig::from_yaml(
        "max_samples: 512\nworker_threads: 1\ntarget_reverberation_time: 0.0\n",
    )
    .unwrap();
    let (mut sink, _renderer) = renderer::channel(16, 4);
    let mut sim = Simulator::new(config).unwrap();
    let id = sim.add_source(tone(256), 1.0);

    sim.update(&living_room(id), &mut sink).unwrap();
    let telemetry = sim.telemetry().unwrap();
    assert_eq!(telemetry.reverberation_time, 0.0);
    assert_eq!(telemetry.n_samples, 512);
    assert_eq!(telemetry.display_reverberation_time(), "0.00");

    let report = sim.finish_pending(&mut sink).unwrap().unwrap();
    assert_eq!(report.applied, vec![id]);
}

#[test]
fn voice_shortage_only_affects_that_source() {
    // One renderer voice for two sources
    let (mut sink, mut renderer) = renderer::channel(16, 1);
    let mut sim = Simulator::new(config()).unwrap();
    let a = sim.add_source(tone(256), 1.0);
    let b = sim.add_source(tone(256), 1.0);
    let mut scene = living_room(a);
    scene.sources.push((b, Vec3::new(3.0, 1.2, 4.0)));

    let mut report = None;
    for _ in 0..5 {
        report = report.or(sim.update(&scene, &mut sink).unwrap());
    }
    assert_eq!(sim.generation(), 1);

    let report = match report {
        Some(report) => report,
        None => sim.finish_pending(&mut sink).unwrap().unwrap(),
    };
    assert_eq!(report.applied, vec![a]);
    assert_eq!(
        report.failed,
        vec![(b, PipelineError::Playback(PlaybackError::NoFreeVoice { capacity: 1 }))]
    );
    assert!(sim.current_buffer(a).unwrap().is_wet());

    // b holds its wet buffer and starts with it once a voice frees up
    assert!(sim.remove_source(a, &mut sink).unwrap());
    sim.update(&scene, &mut sink).unwrap();
    let wet_b = sim.current_buffer(b).unwrap().clone();
    assert!(wet_b.is_wet());
    let mut out = vec![0.0; 8];
    renderer.render_block(&mut out, 1);
    assert_eq!(&out[..], &wet_b.samples()[..8]);
}

#[test]
fn dry_wet_toggle_and_removal() {
    let (mut sink, mut renderer) = renderer::channel(16, 4);
    let mut sim = Simulator::new(config()).unwrap();
    let clip = tone(256);
    let id = sim.add_source(clip.clone(), 1.0);

    sim.update(&living_room(id), &mut sink).unwrap();
    sim.finish_pending(&mut sink).unwrap();
    assert!(sim.current_buffer(id).unwrap().is_wet());

    sim.set_wet(false, &mut sink).unwrap();
    assert!(!sim.current_buffer(id).unwrap().is_wet());
    let mut out = vec![0.0; 8];
    renderer.render_block(&mut out, 1);
    assert_eq!(&out[..], &clip.samples()[..8]);

    assert!(sim.remove_source(id, &mut sink).unwrap());
    renderer.render_block(&mut out, 1);
    assert!(out.iter().all(|s| *s == 0.0));
    assert_eq!(sink.active_voices(), 0);
}
