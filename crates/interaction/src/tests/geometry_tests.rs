use rand::{rngs::StdRng, SeedableRng};

use super::*;

#[test]
fn samples_stay_inside_the_allowed_rect() {
    let mut rng = StdRng::seed_from_u64(21);
    let bounds = ContainerBounds::new(360.0, 200.0);
    let footprint = Size::new(120.0, 44.0);
    for _ in 0..256 {
        let p = random_position_within(bounds, footprint, 8.0, &mut rng);
        assert!(p.x >= 0.0 && p.x <= 232.0);
        assert!(p.y >= 0.0 && p.y <= 148.0);
    }
}

#[test]
fn degenerate_container_collapses_to_the_origin() {
    let mut rng = StdRng::seed_from_u64(22);
    let bounds = ContainerBounds::new(60.0, 30.0);
    let footprint = Size::new(120.0, 44.0);
    let p = random_position_within(bounds, footprint, 8.0, &mut rng);
    assert_eq!(p.x, 0.0);
    assert_eq!(p.y, 0.0);
}

#[test]
fn margin_reduces_the_span() {
    let mut rng = StdRng::seed_from_u64(23);
    let bounds = ContainerBounds::new(200.0, 100.0);
    let footprint = Size::new(100.0, 40.0);
    for _ in 0..64 {
        let p = random_position_within(bounds, footprint, 50.0, &mut rng);
        assert!(p.x <= 50.0);
        assert!(p.y <= 10.0);
    }
}
