//! Basic scene: a cube inside a spinning group, with axis helpers.
//!
//! - a group at y = 1 holding a 1×1×1 cube
//! - a 75° camera at (1, 1, 3) facing -Z, not aimed at anything
//! - the group turns a quarter revolution every two seconds
//! - **double-click** toggles fullscreen
//!
//! Run with: `cargo run -p lykta --example basic_scene`

use std::f32::consts::PI;

use lykta::prelude::*;

fn main() -> Result<()> {
    Viewer::new(ViewerConfig::default())
        .with_title("lykta: basic scene")
        .setup(|stage, frame_loop, _panel| {
            let scene = &mut stage.scene;
            let group = scene.spawn(Node::group("group").with_position(0.0, 1.0, 0.0));

            let cube = Mesh::new(
                Arc::new(Geometry::cuboid(1.0, 1.0, 1.0)),
                Arc::new(Material::basic(Color::from_hex(0xff0000))),
            );
            scene.spawn_child(group, Node::mesh("cube", cube))?;

            let root = scene.root();
            spawn_axes(scene, root, 2.0)?;

            frame_loop.add_animation(move |scene, time| {
                if let Some(node) = scene.get_mut(group) {
                    node.transform.set_euler(0.0, time.elapsed_secs() * PI * 0.25, 0.0);
                }
            });
            Ok(())
        })
        .run()
}
