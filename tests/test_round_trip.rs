mod common;

use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use stereofit::conversion::deg_to_rad;
use stereofit::reconstruction::plane_intersection::PlaneIntersectionReconstructor;
use stereofit::reconstruction::{ErrorWeighting, ReconParams, ShowerReconstructor};
use stereofit::ref_system::AltAz;

use crate::common::{
    assert_geometry_close, same_pointing, simulate_hillas, square_subarray, SyntheticShower,
};

#[test]
fn test_four_telescopes_parallel_pointing() {
    let subarray = square_subarray(16.0);
    let source = AltAz::from_degrees(70.0, 0.0);
    let shower = SyntheticShower::new(10.0, -5.0, source);
    let pointings = same_pointing(&subarray, source);
    let hillas = simulate_hillas(&subarray, &shower, &pointings, &subarray.tel_ids());

    let reco = PlaneIntersectionReconstructor::default();
    let result = reco.predict(&hillas, &subarray, &source, None).unwrap();

    assert_geometry_close(&result, &shower, deg_to_rad(0.01), 0.01);
    assert_eq!(result.tel_ids, vec![1, 2, 3, 4]);
    assert_eq!(result.average_intensity, 250.0);
    assert!(result.alt_uncert < 1e-6);
}

#[test]
fn test_other_sky_positions() {
    let subarray = square_subarray(28.0);
    let cases = [
        (55.0, 135.0, -30.0, 20.0),
        (80.0, -60.0, 120.0, 75.0),
        (45.0, 200.0, 0.0, -150.0),
    ];

    let reco = PlaneIntersectionReconstructor::default();
    for (alt, az, core_x, core_y) in cases {
        let source = AltAz::from_degrees(alt, az);
        let shower = SyntheticShower::new(core_x, core_y, source);
        let pointings = same_pointing(&subarray, source);
        let hillas = simulate_hillas(&subarray, &shower, &pointings, &subarray.tel_ids());

        let result = reco.predict(&hillas, &subarray, &source, None).unwrap();
        assert_geometry_close(&result, &shower, deg_to_rad(0.01), 0.01);
    }
}

#[test]
fn test_every_telescope_pair() {
    let subarray = square_subarray(16.0);
    let source = AltAz::from_degrees(70.0, 0.0);
    let shower = SyntheticShower::new(10.0, -5.0, source);
    let pointings = same_pointing(&subarray, source);
    let reco = PlaneIntersectionReconstructor::default();

    for (t1, t2) in subarray.tel_ids().into_iter().tuple_combinations() {
        let hillas = simulate_hillas(&subarray, &shower, &pointings, &[t1, t2]);
        let result = reco.predict(&hillas, &subarray, &source, None).unwrap();

        assert_geometry_close(&result, &shower, deg_to_rad(0.01), 0.01);
        assert_eq!(result.tel_ids, vec![t1, t2]);
    }
}

#[test]
fn test_min_telescopes_parameter() {
    let subarray = square_subarray(16.0);
    let source = AltAz::from_degrees(70.0, 0.0);
    let shower = SyntheticShower::new(10.0, -5.0, source);
    let pointings = same_pointing(&subarray, source);
    let hillas = simulate_hillas(&subarray, &shower, &pointings, &[1, 3]);

    let params = ReconParams::builder().min_telescopes(3).build().unwrap();
    let reco = PlaneIntersectionReconstructor::new(params);

    assert!(reco.predict(&hillas, &subarray, &source, None).is_err());
}

#[test]
fn test_noisy_axis_angles() {
    let subarray = square_subarray(16.0);
    let source = AltAz::from_degrees(70.0, 0.0);
    let shower = SyntheticShower::new(10.0, -5.0, source);
    let pointings = same_pointing(&subarray, source);
    let mut rng = StdRng::seed_from_u64(42_u64);

    let reco: Box<dyn ShowerReconstructor> =
        Box::new(PlaneIntersectionReconstructor::new(
            ReconParams::builder()
                .error_weighting(ErrorWeighting::PairWeight)
                .build()
                .unwrap(),
        ));

    for _ in 0..20 {
        let mut hillas = simulate_hillas(&subarray, &shower, &pointings, &subarray.tel_ids());
        for moments in hillas.values_mut() {
            moments.psi += 0.01 * rng.sample::<f64, _>(StandardNormal);
        }

        let result = reco.predict(&hillas, &subarray, &source, None).unwrap();
        assert!(result.is_valid);
        assert!(result.alt_uncert > 0.0);
        assert!(result.direction().separation(&source) < deg_to_rad(0.1));
        assert!((result.core_x - 10.0).hypot(result.core_y + 5.0) < 5.0);
    }
}

#[test]
fn test_zero_intensity_event_has_no_direction() {
    let subarray = square_subarray(16.0);
    let source = AltAz::from_degrees(70.0, 0.0);
    let shower = SyntheticShower::new(10.0, -5.0, source);
    let pointings = same_pointing(&subarray, source);
    let mut hillas = simulate_hillas(&subarray, &shower, &pointings, &subarray.tel_ids());
    for moments in hillas.values_mut() {
        moments.intensity = 0.0;
    }

    let result = PlaneIntersectionReconstructor::default()
        .predict(&hillas, &subarray, &source, None)
        .unwrap();

    assert!(!result.is_valid);
    assert!(result.alt.is_nan() && result.az.is_nan() && result.alt_uncert.is_nan());
    // core and shower maximum do not depend on the plane weights
    assert!((result.core_x - 10.0).hypot(result.core_y + 5.0) < 0.01);
    assert!((result.h_max - shower.shower_max().norm()).abs() < 0.01);
}
