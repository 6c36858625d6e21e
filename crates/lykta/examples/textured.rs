//! Textured meshes, with a color map loaded in the background.
//!
//! The left cube uses a generated checkerboard. The right cube starts
//! without a material and gets the image given as the first argument once a
//! loader thread has decoded it. Without an argument it stays pending and is
//! never drawn.
//!
//! Run with: `cargo run -p lykta --example textured [image.png]`

use std::f32::consts::TAU;

use lykta::assets::spawn_texture_load;
use lykta::prelude::*;

fn main() -> Result<()> {
    let image = std::env::args().nth(1);

    let mut config = ViewerConfig::default();
    config.camera.target = Some([0.0, 0.0, 0.0]);

    Viewer::new(config)
        .with_title("lykta: textured")
        .setup(move |stage, frame_loop, _panel| {
            let cube = Arc::new(Geometry::cuboid(1.0, 1.0, 1.0));
            let checker = Arc::new(Texture::checker(256, Color::WHITE, Color::from_hex(0x3355aa))?);

            let scene = &mut stage.scene;
            let left = Mesh::new(Arc::clone(&cube), Arc::new(Material::lambert(Color::WHITE).with_map(checker)));
            let left = scene.spawn(Node::mesh("checker cube", left).with_position(-0.8, 0.0, 0.0));

            let right = Mesh { geometry: Some(cube), ..Mesh::pending() };
            let right = scene.spawn(Node::mesh("loaded cube", right).with_position(0.8, 0.0, 0.0));

            scene.spawn(Node::light("ambient", Light::ambient(Color::WHITE, 0.4)?));
            scene.spawn(Node::light("key", Light::directional(Color::WHITE, 0.9)?).with_position(1.0, 2.0, 3.0));

            if let Some(path) = image {
                spawn_texture_load(path, right, stage.assets.sender())?;
            }

            frame_loop.add_animation(move |scene, time| {
                let angle = time.elapsed_secs() * TAU * 0.1;
                for id in [left, right] {
                    if let Some(node) = scene.get_mut(id) {
                        node.transform.set_euler(angle * 0.5, angle, 0.0);
                    }
                }
            });
            Ok(())
        })
        .run()
}
