use std::sync::Arc;

use bevy_terrain_fusion::{
    FusionError, FusionSession, FusionSettings, Raster, RasterRole, Rotation, TerrainSlot,
};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};

fn rgb(w: usize, h: usize, band: Vec<f32>) -> Raster {
    Raster::new(w, h, vec![band.clone(), band.clone(), band]).expect("valid raster")
}

fn dsm(w: usize, h: usize, band: Vec<f32>) -> Raster {
    Raster::new(w, h, vec![band]).expect("valid raster")
}

fn png(width: u32, height: u32, color: ColorType, data: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(data, width, height, color)
        .expect("png encodes");
    bytes
}

fn red(session: &FusionSession) -> Vec<u8> {
    session
        .current()
        .expect("terrain fused")
        .texture
        .rgba()
        .chunks_exact(4)
        .map(|p| p[0])
        .collect()
}

#[test]
fn rotate_without_rasters_only_advances() {
    let mut session = FusionSession::default();
    assert_eq!(session.rotate().unwrap(), None);
    assert_eq!(session.rotation(), Rotation::Deg90);
    assert!(session.current().is_none());
}

#[test]
fn rotate_refuses_stored_rasters() {
    let mut session = FusionSession::default();
    session
        .combine_rasters(dsm(2, 2, vec![0.0; 4]), rgb(2, 2, vec![10.0, 20.0, 30.0, 40.0]))
        .unwrap();
    assert_eq!(red(&session), vec![10, 20, 30, 40]);

    session.rotate().unwrap();
    let rotated = session.rotate().unwrap().expect("re-fused");
    assert_eq!(rotated.rotation, Rotation::Deg180);
    assert_eq!(red(&session), vec![40, 30, 20, 10]);
}

#[test]
fn four_rotations_restore_texture() {
    let mut session = FusionSession::default();
    let original = session
        .combine_rasters(
            dsm(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            rgb(3, 2, vec![9.0, 8.0, 7.0, 6.0, 5.0, 4.0]),
        )
        .unwrap();
    let mut last = None;
    for _ in 0..4 {
        last = session.rotate().unwrap();
    }
    let last = last.expect("re-fused");
    assert_eq!(last.texture, original.texture);
    assert_eq!(last.mesh, original.mesh);
}

#[test]
fn failed_combine_keeps_last_good_terrain() {
    let mut session = FusionSession::default();
    let good = session
        .combine_rasters(dsm(2, 2, vec![0.0, 1.0, 2.0, 3.0]), rgb(2, 2, vec![5.0; 4]))
        .unwrap();

    let err = session
        .combine_rasters(dsm(4, 4, vec![0.0; 16]), rgb(4, 5, vec![0.0; 20]))
        .unwrap_err();
    assert!(matches!(err, FusionError::DimensionMismatch { .. }));
    assert!(Arc::ptr_eq(session.current().unwrap(), &good));

    // The rasters used by rotate are still the last good ones.
    let rotated = session.rotate().unwrap().expect("re-fused");
    assert_eq!(rotated.mesh.vertex_count(), 4);
}

#[test]
fn combine_decodes_bytes() {
    let mut session = FusionSession::new(FusionSettings::default());
    let elevation = png(3, 3, ColorType::L8, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    let color_data: Vec<u8> = (1..=9).flat_map(|v| [v, v, v]).collect();
    let color = png(3, 3, ColorType::Rgb8, &color_data);

    let terrain = session.combine(elevation, color).unwrap();
    assert_eq!(terrain.mesh.vertex_count(), 9);
    assert_eq!(terrain.texture.pixel(4), Some([5, 5, 5, 255]));
    assert!(session.has_rasters());
    assert!(session.log().entries().iter().any(|e| e.contains("Decoding color")));
}

#[test]
fn decode_failure_names_the_input() {
    let mut session = FusionSession::default();
    let color = png(1, 1, ColorType::Rgb8, &[0, 0, 0]);
    let err = session.combine(b"garbage".to_vec(), color).unwrap_err();
    assert!(matches!(
        err,
        FusionError::Decode {
            which: RasterRole::Elevation,
            ..
        }
    ));
    assert!(session.current().is_none());
    assert!(!session.has_rasters());
    assert!(session.log().entries().last().unwrap().starts_with("Error"));
}

#[test]
fn slot_publishes_latest_generation() {
    let mut session = FusionSession::default();
    let slot = TerrainSlot::new();
    assert!(slot.latest().is_none());
    assert_eq!(slot.generation(), 0);

    let first = session
        .combine_rasters(dsm(2, 2, vec![0.0; 4]), rgb(2, 2, vec![1.0; 4]))
        .unwrap();
    assert_eq!(slot.publish(first), 1);

    let reader = slot.clone();
    let second = session.rotate().unwrap().expect("re-fused");
    assert_eq!(slot.publish(second.clone()), 2);

    let (generation, latest) = reader.latest().unwrap();
    assert_eq!(generation, 2);
    assert!(Arc::ptr_eq(&latest, &second));
    assert!(reader.newer_than(2).is_none());
    assert!(reader.newer_than(1).is_some());
}

#[test]
fn settings_load_from_json() {
    let settings: FusionSettings =
        serde_json::from_str(r#"{ "world_scale_divisor": 50.0 }"#).unwrap();
    assert_eq!(settings.world_scale_divisor, 50.0);
    assert_eq!(
        settings.elevation_scale_fraction,
        FusionSettings::default().elevation_scale_fraction
    );
    assert_eq!(settings.footprint(100, 25), (2.0, 0.5));
}
