use approx::assert_relative_eq;
use strided_dispatch::{blas, special};

#[test]
fn test_ddot_reference_value() {
    let x = [4.0, 2.0, -3.0, 5.0, -1.0];
    let y = [2.0, 6.0, -1.0, -4.0, 8.0];
    assert_relative_eq!(blas::ddot(5, &x, 1, &y, 1), -5.0);

    let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let y = [6.0, 5.0, 4.0, 3.0, 2.0, 1.0];
    // x[0], x[2], x[4] against y[4], y[2], y[0]
    assert_relative_eq!(blas::ddot(3, &x, 2, &y, -2), 1.0 * 2.0 + 3.0 * 4.0 + 5.0 * 6.0);
}

#[test]
fn test_ddot_mirrored_strides_agree() {
    let x = [2.0, -1.0, 3.0, 0.5];
    let y = [1.0, 4.0, -2.0, 6.0];
    let forward = blas::ddot(4, &x, 1, &y, 1);
    let backward = blas::ddot(4, &x, -1, &y, -1);
    assert_relative_eq!(forward, backward);
    assert_relative_eq!(blas::ddot_ndarray(4, &x, -1, 3, &y, -1, 3), forward);
}

#[test]
fn test_ddot_degenerate_length() {
    let x = [1.0, 2.0];
    assert_eq!(blas::ddot(0, &x, 1, &x, 1), 0.0);
}

#[test]
fn test_dscal_in_place_returns_same_buffer() {
    let mut x = [1.0, 2.0];
    let ptr = x.as_ptr();
    let out = blas::dscal(2, 5.0, &mut x, 1);
    assert!(std::ptr::eq(out.as_ptr(), ptr));
    assert_eq!(out, &[5.0, 10.0]);
}

#[test]
fn test_dscal_non_positive_stride_is_noop() {
    let mut x = [1.0, 2.0, 3.0];
    blas::dscal(3, 4.0, &mut x, -1);
    assert_eq!(x, [1.0, 2.0, 3.0]);
    blas::dscal_ndarray(3, 4.0, &mut x, -1, 2);
    assert_eq!(x, [4.0, 8.0, 12.0]);
}

#[test]
fn test_dnanasum_skips_nan() {
    let x = [1.0, f64::NAN, -3.0, 4.0, f64::NAN];
    assert_relative_eq!(blas::dnanasum(5, &x, 1), 8.0);
    assert_relative_eq!(blas::dnanasum(3, &x, 2), 1.0 + 3.0);
    assert_relative_eq!(blas::dnanasum(3, &x, -2), 1.0 + 3.0);
    assert_eq!(blas::dnanasum(0, &x, 1), 0.0);
}

#[test]
fn test_dnanasum_zero_stride_repeats_first_element() {
    let x = [-2.0, 100.0];
    assert_relative_eq!(blas::dnanasum(4, &x, 0), 8.0);
}

#[test]
fn test_clamp_signed_zero() {
    let r = special::clamp(-0.0f64, -0.0, 5.0);
    assert!(r == 0.0 && r.is_sign_negative());
    let r = special::clamp(-0.0f64, 0.0, 5.0);
    assert!(r == 0.0 && r.is_sign_positive());
    let r = special::clamp(0.0f64, -5.0, -0.0);
    assert!(r == 0.0 && r.is_sign_negative());
    let r = special::clampf(-0.0, -0.0, 5.0);
    assert!(r == 0.0 && r.is_sign_negative());
}

#[test]
fn test_clamp_bounds_and_nan() {
    assert_eq!(special::clamp(3.0, 0.0, 5.0), 3.0);
    assert_eq!(special::clamp(-3.0, 0.0, 5.0), 0.0);
    assert_eq!(special::clamp(13.0, 0.0, 5.0), 5.0);
    assert!(special::clamp(f64::NAN, 0.0, 5.0).is_nan());
    assert!(special::clamp(1.0, f64::NAN, 5.0).is_nan());
    assert!(special::clamp(1.0, 0.0, f64::NAN).is_nan());
    assert_eq!(special::clampf(7.5, -1.0, 2.0), 2.0);
}

#[test]
fn test_pdiff() {
    assert_eq!(special::pdiff(5.0, 3.0), 2.0);
    let r = special::pdiff(3.0, 5.0);
    assert!(r == 0.0 && r.is_sign_positive());
    assert!(special::pdiff(f64::NAN, 1.0).is_nan());
    assert!(special::pdifff(1.0, f32::NAN).is_nan());
    assert_eq!(special::pdiff(f64::INFINITY, 1.0), f64::INFINITY);
}

#[test]
fn test_evalpoly() {
    assert_relative_eq!(special::evalpoly(&[3.0, 2.0, 1.0], 10.0), 123.0);
    assert_eq!(special::evalpoly::<f64>(&[], 10.0), 0.0);
    assert_eq!(special::evalpoly(&[7.0], 1e300), 7.0);
    let p = special::evalpoly_fn(vec![1.0f32, -1.0, 0.5]);
    assert_relative_eq!(p(2.0), 1.0);
}

#[test]
fn test_evalrational() {
    let p = [-6.0, -5.0, 4.0, 2.0];
    let q = [3.0, 0.5, 11.0, 2.0];
    let at = |x: f64| special::evalpoly(&p, x) / special::evalpoly(&q, x);
    assert_relative_eq!(special::evalrational(&p, &q, 0.5), at(0.5), epsilon = 1e-14);
    assert_relative_eq!(special::evalrational(&p, &q, 6.0), at(6.0), epsilon = 1e-14);
    assert_relative_eq!(special::evalrational(&p, &q, -40.0), at(-40.0), epsilon = 1e-14);
    assert!(special::evalrational::<f64>(&[], &[], 1.0).is_nan());
    assert!(special::evalrational(&[1.0f64, 2.0], &[1.0], 1.0).is_nan());

    let r = special::evalrational_fn(p.to_vec(), q.to_vec());
    assert_relative_eq!(r(2.0), at(2.0), epsilon = 1e-14);
}

#[test]
fn test_betainc_reference_values() {
    assert_relative_eq!(special::betainc(0.3, 2.0, 5.0, true, false), 0.579825, epsilon = 1e-12);
    assert_relative_eq!(
        special::betainc(0.1, 0.5, 0.5, true, false),
        0.20483276469913346,
        epsilon = 1e-12
    );
    assert_relative_eq!(
        special::betainc(0.3, 2.0, 5.0, true, true),
        1.0 - 0.579825,
        epsilon = 1e-12
    );
}

#[test]
fn test_betainc_non_regularized_scales_by_beta() {
    let regularized = special::betainc(0.4, 2.5, 1.5, true, false);
    let raw = special::betainc(0.4, 2.5, 1.5, false, false);
    assert_relative_eq!(raw, regularized * special::beta(2.5, 1.5), epsilon = 1e-12);
}

#[test]
fn test_betainc_domain() {
    assert!(special::betainc(-0.1, 2.0, 2.0, true, false).is_nan());
    assert!(special::betainc(1.1, 2.0, 2.0, true, false).is_nan());
    assert!(special::betainc(0.5, 0.0, 2.0, true, false).is_nan());
    assert!(special::betainc(f64::NAN, 2.0, 2.0, true, false).is_nan());
    assert_eq!(special::betainc(0.0, 2.0, 3.0, true, false), 0.0);
    assert_eq!(special::betainc(1.0, 2.0, 3.0, true, false), 1.0);
}

#[test]
fn test_betaincinv_reference_and_inverse() {
    assert_relative_eq!(special::betaincinv(0.2, 3.0, 3.0, false), 0.326597937841411, epsilon = 1e-10);
    for &(p, a, b) in &[(0.05, 2.0, 7.0), (0.5, 0.7, 3.0), (0.95, 12.0, 1.5)] {
        let x = special::betaincinv(p, a, b, false);
        assert_relative_eq!(special::betainc(x, a, b, true, false), p, epsilon = 1e-10);
        let xu = special::betaincinv(p, a, b, true);
        assert_relative_eq!(special::betainc(xu, a, b, true, true), p, epsilon = 1e-10);
    }
}

#[test]
fn test_betaincinv_endpoints_and_domain() {
    assert_eq!(special::betaincinv(0.0, 2.0, 3.0, false), 0.0);
    assert_eq!(special::betaincinv(1.0, 2.0, 3.0, false), 1.0);
    assert_eq!(special::betaincinv(1.0, 2.0, 3.0, true), 0.0);
    assert_eq!(special::betaincinv(0.0, 2.0, 3.0, true), 1.0);
    assert!(special::betaincinv(1.5, 2.0, 3.0, false).is_nan());
    assert!(special::betaincinv(0.5, -2.0, 3.0, false).is_nan());
}
