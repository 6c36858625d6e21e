//! Shadows: a sphere over a floor, lit by a directional and a spot light.
//!
//! The directional light sits at (2, 2, -1) with a tight orthographic
//! shadow frustum. The panel bindings are driven from the keyboard:
//!
//! - **Up / Down**: sun intensity
//! - **W / S**: sphere height
//! - **Space**: show / hide the sphere
//! - **F**: cycle shadow filtering (basic, PCF, soft PCF)
//!
//! Run with: `cargo run -p lykta --example shadows`

use lykta::prelude::*;

fn main() -> Result<()> {
    let mut config = ViewerConfig::default();
    config.shadows.enabled = true;
    config.camera.position = [0.0, 2.5, 5.0];
    config.camera.target = Some([0.0, 0.0, 0.0]);
    config.clear_color = Color::from_hex(0x202028);

    Viewer::new(config)
        .with_title("lykta: shadows")
        .setup(|stage, frame_loop, panel| {
            let scene = &mut stage.scene;

            let floor = Mesh::new(
                Arc::new(Geometry::plane(8.0, 8.0)),
                Arc::new(Material::standard(Color::rgb(0.8, 0.8, 0.8), 0.9, 0.0)),
            )
            .with_receive_shadow(true);
            scene.spawn(Node::mesh("floor", floor));

            let sphere = Mesh::new(
                Arc::new(Geometry::sphere(0.5, 32, 16)),
                Arc::new(Material::standard(Color::from_hex(0x6699ff), 0.3, 0.2)),
            )
            .with_cast_shadow(true)
            .with_receive_shadow(true);
            let sphere = scene.spawn(Node::mesh("sphere", sphere).with_position(0.0, 1.0, 0.0));

            scene.spawn(Node::light("sky", Light::hemisphere(Color::WHITE, Color::rgb(0.2, 0.15, 0.1), 0.3)?));

            let mut sun = Light::directional(Color::WHITE, 0.8)?;
            sun.set_cast_shadow(true)?;
            if let Some(shadow) = sun.shadow_mut() {
                shadow.set_frustum(ShadowFrustum::orthographic(-3.0, 3.0, 3.0, -2.0, 0.5, 6.0)?)?;
                shadow.set_map_size(1024, 1024)?;
            }
            let sun = scene.spawn(Node::light("sun", sun).with_position(2.0, 2.0, -1.0));

            let mut spot = Light::spot(Color::from_hex(0xffeecc), 1.2)?;
            spot.set_cone(0.5, 0.3)?;
            spot.set_cast_shadow(true)?;
            scene.spawn(Node::light("spot", spot).with_position(-2.0, 4.0, 2.0));

            panel.bind_light_intensity("sun intensity", sun, 2.0)?.in_folder("light");
            panel.bind_light_color("sun color", sun)?.in_folder("light");
            panel
                .bind_translation("sphere height", sphere, 1, (0.5, 3.0, 0.1))?
                .in_folder("sphere");
            panel
                .bind_visible("sphere visible", sphere)?
                .in_folder("sphere")
                .on_change(|v| log::info!("sphere visible: {v:?}"));

            frame_loop.set_controller(OrbitControls::new(Vec3::ZERO));
            Ok(())
        })
        .on_key(|key, stage, panel| {
            let scene = &mut stage.scene;
            match key {
                KeyCode::ArrowUp | KeyCode::ArrowDown => step_number(panel, scene, "sun intensity", key, 0.1),
                KeyCode::KeyW | KeyCode::KeyS => step_number(panel, scene, "sphere height", key, 0.1),
                KeyCode::Space => {
                    if let ParamValue::Toggle(v) = panel.get(scene, "sphere visible")? {
                        panel.set(scene, "sphere visible", ParamValue::Toggle(!v))?;
                    }
                    Ok(())
                }
                KeyCode::KeyF => {
                    let next = match stage.target.shadows().filter {
                        ShadowFilter::Basic => ShadowFilter::Pcf,
                        ShadowFilter::Pcf => ShadowFilter::PcfSoft,
                        ShadowFilter::PcfSoft => ShadowFilter::Basic,
                    };
                    stage.target.set_shadow_filter(next);
                    log::info!("shadow filter: {next:?}");
                    Ok(())
                }
                _ => Ok(()),
            }
        })
        .run()
}

fn step_number(panel: &mut ParameterPanel, scene: &mut Scene, name: &str, key: KeyCode, step: f64) -> Result<()> {
    let up = matches!(key, KeyCode::ArrowUp | KeyCode::KeyW);
    if let ParamValue::Number(v) = panel.get(scene, name)? {
        let applied = panel.set(scene, name, ParamValue::Number(if up { v + step } else { v - step }))?;
        log::info!("{name}: {applied:?}");
    }
    Ok(())
}
