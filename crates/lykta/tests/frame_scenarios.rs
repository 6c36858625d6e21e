//! End-to-end frame scenarios on a headless stage: scene edits, resizes and
//! controller input go in through the public API, frame plans come out.

use std::sync::Arc;

use lykta::prelude::*;
use lykta::render::FramePlan;

struct CountingScheduler(u32);

impl RedrawScheduler for CountingScheduler {
    fn schedule_next_frame(&mut self) {
        self.0 += 1;
    }
}

fn cube_mesh(cast: bool, receive: bool) -> Mesh {
    Mesh::new(Arc::new(Geometry::cuboid(1.0, 1.0, 1.0)), Arc::new(Material::default()))
        .with_cast_shadow(cast)
        .with_receive_shadow(receive)
}

/// A headless stage with its frame loop and the recorder that sees its plans.
struct Harness {
    stage: Stage,
    recorder: FrameRecorder,
    frame_loop: FrameLoop,
    scheduler: CountingScheduler,
}

impl Harness {
    fn new(width: u32, height: u32) -> Self {
        let (stage, recorder) = Stage::headless(width, height).unwrap();
        Self { stage, recorder, frame_loop: FrameLoop::new(), scheduler: CountingScheduler(0) }
    }

    fn tick(&mut self) -> FramePlan {
        self.frame_loop
            .tick(&mut self.stage, &mut self.scheduler)
            .unwrap()
            .expect("loop is running");
        self.recorder.last().unwrap()
    }
}

#[test]
fn world_transform_composes_down_the_tree() {
    let mut scene = Scene::new();
    let root = scene.root();
    assert_eq!(scene.world_transform(root).unwrap(), scene.node(root).unwrap().transform.matrix());

    let a = scene.spawn(
        Node::group("a").with_transform(Transform::from_xyz(1.0, 2.0, 3.0).with_rotation(Quat::from_rotation_y(0.7))),
    );
    let b = scene
        .spawn_child(a, Node::group("b").with_transform(Transform::from_xyz(0.0, 1.0, 0.0).with_scale(2.0)))
        .unwrap();
    let c = scene
        .spawn_child(b, Node::group("c").with_transform(Transform::from_euler(0.3, 0.0, 0.1)))
        .unwrap();

    for (child, parent) in [(a, root), (b, a), (c, b)] {
        let expected = scene.world_transform(parent).unwrap() * scene.node(child).unwrap().transform.matrix();
        assert!(scene.world_transform(child).unwrap().abs_diff_eq(expected, 1e-5));
    }
}

#[test]
fn reparenting_moves_between_child_lists() {
    let mut scene = Scene::new();
    let first = scene.spawn(Node::group("first"));
    let second = scene.spawn(Node::group("second"));
    let node = scene.spawn_child(first, Node::group("node")).unwrap();

    scene.add(second, node).unwrap();
    scene.add(second, node).unwrap();

    assert!(!scene.children(first).unwrap().contains(&node));
    assert_eq!(scene.children(second).unwrap().iter().filter(|&&c| c == node).count(), 1);
    assert_eq!(scene.parent(node).unwrap(), Some(second));
}

#[test]
fn resize_lands_before_the_next_frame() {
    let mut h = Harness::new(800, 600);
    let mut reconciler = ResizeReconciler::new();
    h.tick();

    reconciler.reconcile(&mut h.stage, ResizeEvent::new(1280, 720, 3.0)).unwrap();
    let plan = h.tick();

    assert_eq!((plan.output.width, plan.output.height), (1280, 720));
    assert_eq!(plan.output.pixel_ratio, 2.0);
    assert_eq!(plan.output.physical(), (2560, 1440));
    assert!((h.stage.camera().unwrap().aspect() - 1280.0 / 720.0).abs() < 1e-6);

    let mut expected = Camera::default();
    expected.set_aspect(1280.0 / 720.0).unwrap();
    expected.update_projection();
    assert!(plan.view.projection.abs_diff_eq(expected.projection_matrix(), 1e-6));
}

#[test]
fn identical_resizes_change_nothing() {
    let mut h = Harness::new(800, 600);
    let mut reconciler = ResizeReconciler::new();
    reconciler.reconcile(&mut h.stage, ResizeEvent::new(1024, 768, 1.0)).unwrap();
    let aspect = h.stage.camera().unwrap().aspect();
    let output = h.stage.target.output_size();
    let resizes = h.recorder.resizes().len();

    reconciler.reconcile(&mut h.stage, ResizeEvent::new(1024, 768, 1.0)).unwrap();
    assert_eq!(h.stage.camera().unwrap().aspect(), aspect);
    assert_eq!(h.stage.target.output_size(), output);
    assert_eq!(h.recorder.resizes().len(), resizes);
    assert_eq!(reconciler.handled(), 2);
}

#[test]
fn ambient_and_hemisphere_lights_never_get_shadow_maps() {
    let mut h = Harness::new(64, 64);
    h.stage.target.set_shadows_enabled(true);

    let mut ambient = Light::ambient(Color::WHITE, 0.4).unwrap();
    assert!(ambient.set_cast_shadow(true).is_err());
    let mut hemisphere = Light::hemisphere(Color::WHITE, Color::BLACK, 0.4).unwrap();
    assert!(hemisphere.set_cast_shadow(true).is_err());

    h.stage.scene.spawn(Node::light("ambient", ambient));
    h.stage.scene.spawn(Node::light("hemisphere", hemisphere));
    h.stage.scene.spawn(Node::mesh("cube", cube_mesh(true, true)));

    let plan = h.tick();
    assert_eq!(plan.lights.len(), 2);
    assert!(plan.shadow_passes.is_empty());
    assert!(plan.lights.iter().all(|l| l.shadow_pass.is_none()));
}

#[test]
fn directional_shadow_pass_includes_only_casters() {
    let mut h = Harness::new(800, 600);
    h.stage.target.set_shadows_enabled(true);
    let scene = &mut h.stage.scene;

    let cube = scene.spawn(Node::mesh("cube", cube_mesh(true, false)));
    let floor = Mesh::new(Arc::new(Geometry::plane(6.0, 6.0)), Arc::new(Material::default())).with_receive_shadow(true);
    let floor = scene.spawn(Node::mesh("floor", floor).with_position(0.0, -0.5, 0.0));
    let bystander = scene.spawn(Node::mesh("bystander", cube_mesh(false, true)).with_position(1.5, 0.0, 0.0));

    let mut sun = Light::directional(Color::WHITE, 0.5).unwrap();
    sun.set_cast_shadow(true).unwrap();
    sun.shadow_mut()
        .unwrap()
        .set_frustum(ShadowFrustum::orthographic(-3.0, 3.0, 3.0, -2.0, 0.5, 6.0).unwrap())
        .unwrap();
    let sun = scene.spawn(Node::light("sun", sun).with_position(2.0, 2.0, -1.0));

    let plan = h.tick();

    let pass = plan.shadow_pass_for(sun).expect("sun casts");
    let occluders = plan.occluder_nodes(pass);
    assert_eq!(occluders, vec![cube]);
    assert!(!occluders.contains(&floor) && !occluders.contains(&bystander));
    let receivers = plan.receiver_nodes(pass);
    assert!(receivers.contains(&floor) && receivers.contains(&bystander));

    // Every corner of the cube lands inside the light's view volume.
    for x in [-0.5, 0.5] {
        for y in [-0.5, 0.5] {
            for z in [-0.5, 0.5] {
                let ndc = pass.view_projection.project_point3(Vec3::new(x, y, z));
                assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0, "{ndc}");
                assert!((0.0..=1.0).contains(&ndc.z), "{ndc}");
            }
        }
    }
}

#[test]
fn orbit_drag_eases_camera_a_quarter_turn() {
    let mut h = Harness::new(800, 600);
    let camera = h.stage.camera;
    let sun = Light::directional(Color::WHITE, 0.5).unwrap();
    h.stage.scene.spawn(Node::light("sun", sun).with_position(0.0, 3.0, 0.0));
    h.stage.scene.spawn(Node::mesh("cube", cube_mesh(false, false)));
    h.stage.scene.place_looking_at(camera, Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO).unwrap();
    h.frame_loop.set_controller(OrbitControls::new(Vec3::ZERO).with_damping(0.2).unwrap());

    // A full viewport height of drag is one turn, so 150 of 600 px is a quarter.
    h.stage.input.add_drag(150.0, 0.0);
    let first = h.tick();
    let eased = h.stage.scene.world_position(camera).unwrap();
    assert!((eased.length() - 2.0).abs() < 1e-4);
    assert!(eased.x > 0.0 && eased.z > 0.0, "first frame moves part of the way: {eased}");
    assert!(first.view.position.abs_diff_eq(eased, 1e-6));

    let mut plan = first;
    for _ in 0..80 {
        plan = h.tick();
        let distance = h.stage.scene.world_position(camera).unwrap().length();
        assert!((distance - 2.0).abs() < 1e-4, "radius drifted to {distance}");
    }

    let position = h.stage.scene.world_position(camera).unwrap();
    assert!(position.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-4), "{position}");
    assert!(plan.view.position.abs_diff_eq(position, 1e-6));
    assert_eq!(h.scheduler.0, 81);
}

#[test]
fn assets_delivered_between_frames_show_up_next_tick() {
    let mut h = Harness::new(64, 64);
    let pending = h.stage.scene.spawn(Node::mesh("late", Mesh::pending()));
    let sender = h.stage.assets.sender();

    assert!(h.tick().draws.is_empty());

    let worker = std::thread::spawn(move || {
        sender.send(pending, "cube", Payload::Geometry(Arc::new(Geometry::cuboid(1.0, 1.0, 1.0))));
        sender.send(pending, "material", Payload::Material(Arc::new(Material::basic(Color::GREEN))));
    });
    worker.join().unwrap();

    let plan = h.tick();
    assert_eq!(plan.draws.len(), 1);
    assert_eq!(plan.draws[0].node, pending);
}

#[test]
fn cancelled_loop_stops_rendering_and_scheduling() {
    let mut h = Harness::new(64, 64);
    h.tick();

    h.frame_loop.cancel();
    assert!(h.frame_loop.tick(&mut h.stage, &mut h.scheduler).unwrap().is_none());
    assert_eq!(h.scheduler.0, 1);
    assert_eq!(h.recorder.frames(), 1);
}
