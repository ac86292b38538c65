use dive_computer_sim::gas::{BreathingGas, InspiredGas};
use dive_computer_sim::tissue::{Tissue, calculate_tissue, expose_tissues, surface_equilibrium};
use dive_computer_sim::{GasId, default_tissue_load};

#[test]
fn test_calculate_tissue_no_change() {
    let inspired = InspiredGas { n2: 2.3, he: 0.0 };
    let tissue = Tissue {
        load_n2: 1.5,
        load_he: 0.0,
    };
    let result = calculate_tissue(tissue, 0, inspired, 0.0);

    assert_eq!(result.load_n2, tissue.load_n2);
    assert_eq!(result.load_he, tissue.load_he);
}

#[test]
fn test_calculate_tissue_with_time() {
    let tissue = Tissue {
        load_n2: 2.0,
        load_he: 1.0,
    };
    let inspired = BreathingGas::air().inspired(4.0, 20.0);

    let result = calculate_tissue(tissue, 0, inspired, 1.0);

    assert!(result.load_n2 > tissue.load_n2);
    // breathing air the helium washes out
    assert!(result.load_he < tissue.load_he);
}

#[test]
fn test_surface_equilibrium_matches_default_load() {
    let tissues = surface_equilibrium(1.0);
    for tissue in tissues.iter() {
        assert!((tissue.load_n2 - default_tissue_load(1.0)).abs() < 1e-6);
        assert_eq!(tissue.load_he, 0.0);
    }
}

#[test]
fn test_one_second_steps_match_one_long_step() {
    let gas = BreathingGas::air();
    let mut stepped = surface_equilibrium(1.0);
    let mut single = stepped;
    for _ in 0..600 {
        expose_tissues(&mut stepped, 4.0, &gas, 20.0, 1.0);
    }
    expose_tissues(&mut single, 4.0, &gas, 20.0, 600.0);
    for (a, b) in stepped.iter().zip(single.iter()) {
        assert!((a.load_n2 - b.load_n2).abs() < 1e-3);
    }
}

#[test]
fn test_trimix_loads_helium_faster() {
    let trimix = BreathingGas {
        id: GasId::clamped(1),
        oxygen_percentage: 21,
        helium_percentage: 35,
        setpoint_cbar: 0,
    };
    let mut tissues = surface_equilibrium(1.0);
    expose_tissues(&mut tissues, 5.0, &trimix, 20.0, 120.0);
    // helium half lives are shorter, fraction of the way to saturation is larger
    let inspired = trimix.inspired(5.0, 20.0);
    let he_fraction = tissues[0].load_he / inspired.he;
    let n2_fraction =
        (tissues[0].load_n2 - default_tissue_load(1.0)) / (inspired.n2 - default_tissue_load(1.0));
    assert!(he_fraction > n2_fraction);
}
