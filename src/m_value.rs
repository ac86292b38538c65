use crate::tissue::Tissue;
use crate::zh16c::ZhL16cGf;

/// Nitrogen M-value of a compartment at `amb_pressure`.
pub fn calculate_m_values(amb_pressure: f32, tissue_index: usize) -> f32 {
    amb_pressure / ZhL16cGf::N2_B[tissue_index] + ZhL16cGf::N2_A[tissue_index]
}

/// Bühlmann a/b coefficients weighted by the inert gas tensions of the tissue.
pub fn mixed_coefficients(tissue: Tissue, tissue_index: usize) -> (f32, f32) {
    let p_total = tissue.total();
    if p_total <= f32::EPSILON {
        return (ZhL16cGf::N2_A[tissue_index], ZhL16cGf::N2_B[tissue_index]);
    }
    let a = (ZhL16cGf::N2_A[tissue_index] * tissue.load_n2
        + ZhL16cGf::HE_A[tissue_index] * tissue.load_he)
        / p_total;
    let b = (ZhL16cGf::N2_B[tissue_index] * tissue.load_n2
        + ZhL16cGf::HE_B[tissue_index] * tissue.load_he)
        / p_total;
    (a, b)
}

/// Lowest ambient pressure the tissue tolerates at gradient factor `gf` (0..=1).
pub fn tolerated_ambient_pressure(tissue: Tissue, tissue_index: usize, gf: f32) -> f32 {
    let p_total = tissue.total();
    if p_total <= f32::EPSILON {
        return 0.0;
    }
    let (a, b) = mixed_coefficients(tissue, tissue_index);
    (b * p_total - gf * a * b) / ((1.0 - b) * gf + b)
}

#[test]
fn test_tolerated_pressure_at_full_m_value() {
    // at gf 1.0 the tolerated pressure is the one whose M-value equals the tension
    let tissue = Tissue {
        load_n2: 3.0,
        load_he: 0.0,
    };
    let tolerated = tolerated_ambient_pressure(tissue, 4, 1.0);
    assert!((calculate_m_values(tolerated, 4) - 3.0).abs() < 1e-4);
}
