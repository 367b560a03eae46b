use bevy::render::render_resource::TextureFormat;
use bevy_terrain_fusion::{FusionError, Raster, Rotation, pack_texture};

fn gray(w: usize, h: usize, values: Vec<f32>) -> Raster {
    Raster::new(w, h, vec![values.clone(), values.clone(), values]).expect("valid raster")
}

fn distinct(w: usize, h: usize) -> Raster {
    let n = w * h;
    Raster::new(
        w,
        h,
        vec![
            (0..n).map(|i| i as f32).collect(),
            (0..n).map(|i| (i + 64) as f32).collect(),
            (0..n).map(|i| (i + 128) as f32).collect(),
        ],
    )
    .expect("valid raster")
}

fn red(texture: &bevy_terrain_fusion::TextureBuffer) -> Vec<u8> {
    texture.rgba().chunks_exact(4).map(|p| p[0]).collect()
}

#[test]
fn buffer_length_is_four_bytes_per_pixel() {
    let texture = pack_texture(&distinct(8, 5), Rotation::Deg0).unwrap();
    assert_eq!(texture.width(), 8);
    assert_eq!(texture.height(), 5);
    assert_eq!(texture.rgba().len(), 8 * 5 * 4);
}

#[test]
fn alpha_is_always_opaque() {
    for rotation in [Rotation::Deg0, Rotation::Deg90, Rotation::Deg180, Rotation::Deg270] {
        let texture = pack_texture(&distinct(4, 3), rotation).unwrap();
        assert!(texture.rgba().chunks_exact(4).all(|p| p[3] == 255));
    }
}

#[test]
fn fourth_band_is_ignored() {
    let band = vec![1.0, 2.0];
    let color = Raster::new(2, 1, vec![band.clone(), band.clone(), band, vec![7.0, 7.0]]).unwrap();
    let texture = pack_texture(&color, Rotation::Deg0).unwrap();
    assert_eq!(texture.pixel(0), Some([1, 1, 1, 255]));
    assert_eq!(texture.pixel(1), Some([2, 2, 2, 255]));
}

#[test]
fn identity_keeps_channel_order() {
    let texture = pack_texture(&distinct(4, 4), Rotation::Deg0).unwrap();
    assert_eq!(texture.pixel(5), Some([5, 69, 133, 255]));
}

#[test]
fn rotate_180_reverses_pixels() {
    let color = gray(2, 2, vec![10.0, 20.0, 30.0, 40.0]);
    let texture = pack_texture(&color, Rotation::Deg180).unwrap();
    assert_eq!(red(&texture), vec![40, 30, 20, 10]);
}

#[test]
fn rotate_180_swaps_first_and_last() {
    let color = distinct(5, 3);
    let identity = pack_texture(&color, Rotation::Deg0).unwrap();
    let rotated = pack_texture(&color, Rotation::Deg180).unwrap();
    assert_eq!(rotated.pixel(0), identity.pixel(14));
    assert_eq!(rotated.pixel(14), identity.pixel(0));
}

#[test]
fn rotate_90_reads_mirrored_columns() {
    // 3×2 raster: row 0 = [0, 1, 2], row 1 = [3, 4, 5]
    let color = gray(3, 2, (0..6).map(|i| i as f32).collect());
    let texture = pack_texture(&color, Rotation::Deg90).unwrap();
    assert_eq!(red(&texture), vec![2, 1, 0, 5, 4, 3]);
}

#[test]
fn rotate_270_reads_mirrored_rows() {
    let color = gray(3, 2, (0..6).map(|i| i as f32).collect());
    let texture = pack_texture(&color, Rotation::Deg270).unwrap();
    assert_eq!(red(&texture), vec![3, 4, 5, 0, 1, 2]);
}

#[test]
fn four_advances_return_to_identity() {
    let color = distinct(4, 3);
    let start = Rotation::Deg0;
    let mut rotation = start;
    for _ in 0..4 {
        rotation = rotation.advance();
    }
    assert_eq!(rotation, start);
    assert_eq!(
        pack_texture(&color, rotation).unwrap(),
        pack_texture(&color, Rotation::Deg0).unwrap()
    );
}

#[test]
fn rotation_cycle_and_degrees() {
    assert_eq!(Rotation::Deg0.advance(), Rotation::Deg90);
    assert_eq!(Rotation::Deg90.advance(), Rotation::Deg180);
    assert_eq!(Rotation::Deg180.advance(), Rotation::Deg270);
    assert_eq!(Rotation::Deg270.advance(), Rotation::Deg0);
    assert_eq!(Rotation::Deg270.degrees(), 270);
    assert_eq!(Rotation::from_quarter_turns(6), Rotation::Deg180);
}

#[test]
fn out_of_range_samples_are_clamped() {
    let color = gray(4, 1, vec![-20.0, 300.0, 127.6, f32::NAN]);
    let texture = pack_texture(&color, Rotation::Deg0).unwrap();
    assert_eq!(red(&texture), vec![0, 255, 128, 0]);
}

#[test]
fn fewer_than_three_bands_fails_in_texture_stage() {
    let color = Raster::new(2, 2, vec![vec![0.0; 4], vec![0.0; 4]]).unwrap();
    let err = pack_texture(&color, Rotation::Deg0).unwrap_err();
    assert!(matches!(err, FusionError::Stage { stage: "texture", .. }));
}

#[test]
fn bevy_image_matches_buffer() {
    let texture = pack_texture(&distinct(16, 32), Rotation::Deg0).unwrap();
    let image = texture.to_image();
    assert_eq!(image.texture_descriptor.size.width, 16);
    assert_eq!(image.texture_descriptor.size.height, 32);
    assert_eq!(image.texture_descriptor.format, TextureFormat::Rgba8UnormSrgb);
    assert_eq!(image.data.as_deref(), Some(texture.rgba()));
}

#[test]
fn source_index_stays_in_bounds() {
    let (w, h) = (5, 3);
    for rotation in [Rotation::Deg0, Rotation::Deg90, Rotation::Deg180, Rotation::Deg270] {
        for i in 0..w * h {
            assert!(rotation.source_index(i, w, h) < w * h, "{rotation:?} pixel {i}");
        }
    }
}

#[test]
#[should_panic]
fn source_index_panics_on_zero_width() {
    Rotation::Deg90.source_index(0, 0, 4);
}
