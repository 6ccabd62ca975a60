use firefly_grove::data_structures::texture::fit_within;

#[test]
fn should_halve_a_texture_twice_the_limit() {
    assert_eq!(fit_within((4096, 2048), 2048).ok(), Some((2048, 1024)));
}

#[test]
fn should_keep_textures_that_fit() {
    assert_eq!(fit_within((2048, 2048), 2048).ok(), Some((2048, 2048)));
    assert_eq!(fit_within((640, 480), 2048).ok(), Some((640, 480)));
}

#[test]
fn should_scale_by_the_longer_side() {
    assert_eq!(fit_within((2048, 8192), 2048).ok(), Some((512, 2048)));
    assert_eq!(fit_within((3000, 2000), 2048).ok(), Some((2048, 1365)));
}

#[test]
fn should_keep_at_least_one_pixel() {
    assert_eq!(fit_within((10000, 1), 2048).ok(), Some((2048, 1)));
}

#[test]
fn should_refuse_empty_images() {
    assert!(fit_within((0, 512), 2048).is_err());
    assert!(fit_within((512, 0), 2048).is_err());
}
