use dive_computer_sim::m_value::{calculate_m_values, mixed_coefficients, tolerated_ambient_pressure};
use dive_computer_sim::tissue::Tissue;
use dive_computer_sim::zh16c::ZhL16cGf;

#[test]
fn test_calculate_m_values() {
    let amb_pressure = 5.0;
    let tissue_index = 15;
    let result = calculate_m_values(amb_pressure, tissue_index);
    assert!((result - 5.4124365).abs() < 1e-5);
}

#[test]
fn test_m_values_grow_with_pressure() {
    for i in 0..16 {
        assert!(calculate_m_values(4.0, i) > calculate_m_values(2.0, i));
    }
}

#[test]
fn test_pure_nitrogen_coefficients() {
    let tissue = Tissue {
        load_n2: 2.0,
        load_he: 0.0,
    };
    let (a, b) = mixed_coefficients(tissue, 7);
    assert_eq!(a, ZhL16cGf::N2_A[7]);
    assert_eq!(b, ZhL16cGf::N2_B[7]);
}

#[test]
fn test_mixed_coefficients_lie_between_gases() {
    let tissue = Tissue {
        load_n2: 1.0,
        load_he: 1.0,
    };
    let (a, _) = mixed_coefficients(tissue, 3);
    assert!((a - (ZhL16cGf::N2_A[3] + ZhL16cGf::HE_A[3]) / 2.0).abs() < 1e-6);
}

#[test]
fn test_lower_gradient_factor_tolerates_less() {
    let tissue = Tissue {
        load_n2: 3.0,
        load_he: 0.5,
    };
    let relaxed = tolerated_ambient_pressure(tissue, 5, 1.0);
    let strict = tolerated_ambient_pressure(tissue, 5, 0.3);
    assert!(strict > relaxed);
    // gf 0 only tolerates the tissue tension itself
    assert!((tolerated_ambient_pressure(tissue, 5, 0.0) - 3.5).abs() < 1e-5);
}

#[cfg(feature = "std")]
#[test]
fn plot_m_values() {
    use csv::Writer;

    let mut wtr = Writer::from_writer(vec![]);
    let mut header = vec!["amb_pressure".to_string()];
    header.extend((1..=16).map(|i| format!("m_value_{i}")));
    wtr.write_record(&header).unwrap();

    // pressures in steps of 0.5 bar
    for press in 2..9 {
        let amb = press as f32 / 2.0;
        let mut record = vec![amb.to_string()];
        record.extend((0..16).map(|i| calculate_m_values(amb, i).to_string()));
        wtr.write_record(&record).unwrap();
    }

    let data = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
    assert_eq!(data.lines().count(), 8);
}
