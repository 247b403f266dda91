//! End-to-end tests of the file front end: a geometry configuration file and a CSV of
//! measurements go in, a CSV of Jacobians comes out, and the result must agree with calling the
//! library directly.
use std::io::Write;

use nalgebra::Vector3;
use tempfile::{Builder, tempdir};

use spherconv::batch::{JacobianRecord, MeasurementRecord, compute_jacobians};
use spherconv::config::GeometryConfig;
use spherconv::coordinates::cart_to_spher;
use spherconv::linearize::{spher_conv_jacobian, spher_jacobian};
use spherconv::{GeometryError, SphericalMeasurement, SystemType};

const BISTATIC_TOML: &str = r#"
system_type = 1
transmitter = [-5000.0, 0.0, 0.0]
receiver = [0.0, 0.0, 25.0]
rotation = [0.0, 0.0, 1.0, 0.0, 1.0, 0.0, -1.0, 0.0, 0.0]
"#;

#[test]
fn test_toml_config_to_csv_jacobians() {
    let mut config_file = Builder::new().suffix(".toml").tempfile().unwrap();
    config_file.write_all(BISTATIC_TOML.as_bytes()).unwrap();
    config_file.flush().unwrap();

    let geometry = GeometryConfig::from_file(config_file.path())
        .unwrap()
        .geometry()
        .unwrap();
    assert_eq!(geometry.system_type, SystemType::ZxPlaneAzimuth);
    // Sites were given, so the range is the full bistatic path length
    assert!(!geometry.use_half_range);

    let targets = [
        Vector3::new(12000.0, 3000.0, 1500.0),
        Vector3::new(8000.0, -4000.0, 500.0),
        Vector3::new(20000.0, 100.0, 3000.0),
    ];
    let records: Vec<MeasurementRecord> = targets
        .iter()
        .map(|p| {
            let z = cart_to_spher(p, &geometry);
            MeasurementRecord {
                range: z.range,
                azimuth: z.azimuth,
                elevation: z.elevation,
            }
        })
        .collect();

    let dir = tempdir().unwrap();
    let input = dir.path().join("measurements.csv");
    let output = dir.path().join("jacobians.csv");
    MeasurementRecord::to_csv(&records, &input).unwrap();

    let loaded = MeasurementRecord::from_csv(&input).unwrap();
    let results = compute_jacobians(&loaded, &geometry);
    JacobianRecord::to_csv(&results, &output).unwrap();
    let written = JacobianRecord::from_csv(&output).unwrap();

    assert_eq!(written.len(), targets.len());
    for (record, target) in written.iter().zip(targets.iter()) {
        assert!(record.is_finite());
        let direct = spher_conv_jacobian(
            &SphericalMeasurement::new(record.range, record.azimuth, record.elevation),
            &geometry,
        );
        assert!((record.jacobian() - direct).abs().max() < 1e-12);
        let at_target = spher_jacobian(target, &geometry);
        for i in 0..3 {
            let error =
                (record.jacobian().row(i) - at_target.row(i)).norm() / at_target.row(i).norm();
            assert!(error < 1e-8, "Row {} error {}", i, error);
        }
    }
}

#[test]
fn test_invalid_config_file_fails_before_computation() {
    let mut config_file = Builder::new().suffix(".json").tempfile().unwrap();
    config_file
        .write_all(br#"{ "system_type": 0, "receiver": [1.0, 2.0] }"#)
        .unwrap();
    config_file.flush().unwrap();
    let config = GeometryConfig::from_file(config_file.path()).unwrap();
    assert_eq!(
        config.geometry(),
        Err(GeometryError::Dimension {
            what: "receiver location",
            expected: 3,
            found: 2
        })
    );
}
