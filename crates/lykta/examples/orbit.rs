//! Orbit controls: drag to rotate around the target, scroll to zoom.
//!
//! Reads an optional JSON config from the first argument, e.g.
//! `{ "orbit": { "damping": 0.1 }, "camera": { "position": [0, 2, 5] } }`.
//!
//! - **left drag**: orbit
//! - **wheel**: dolly in / out
//!
//! Run with: `cargo run -p lykta --example orbit [config.json]`

use lykta::prelude::*;

fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    let orbit = config.orbit;
    let target = config.camera.focus();

    Viewer::new(config)
        .with_title("lykta: orbit controls")
        .setup(move |stage, frame_loop, _panel| {
            let scene = &mut stage.scene;
            let torus = Mesh::new(
                Arc::new(Geometry::torus(1.0, 0.3, 24, 48)),
                Arc::new(Material::standard(Color::from_hex(0x44aa88), 0.4, 0.1)),
            );
            scene.spawn(Node::mesh("torus", torus));

            scene.spawn(Node::light("ambient", Light::ambient(Color::WHITE, 0.3)?));
            scene.spawn(Node::light("key", Light::directional(Color::WHITE, 1.0)?).with_position(-1.0, 2.0, 4.0));

            let root = scene.root();
            spawn_axes(scene, root, 1.5)?;

            frame_loop.set_controller(orbit.build(target)?);
            Ok(())
        })
        .run()
}
