//! Interactive dive planner.
//!
//! Asks for a dive, plans it with the configured algorithm and prints the stops,
//! the run time summary and the gas needed per cylinder.
//!
//! Run with: `cargo run --example planner [settings.json]`

use std::io::{self, Write};

use dive_computer_sim::consumption::estimate_gas_consumption;
use dive_computer_sim::stops::grid_for;
use dive_computer_sim::summary::build_plan_summary;
use dive_computer_sim::{DecoType, DiveContext, GasSlot, Settings, plan_deco};

fn get_input<T: std::str::FromStr + std::fmt::Display + Copy>(prompt: &str, default: T) -> T {
    loop {
        print!("{} (default: {}): ", prompt, default);
        io::stdout().flush().unwrap();

        let mut input = String::new();
        io::stdin().read_line(&mut input).unwrap();

        let input = input.trim();
        if input.is_empty() {
            return default;
        }

        match input.parse::<T>() {
            Ok(value) => return value,
            Err(_) => println!("Invalid input. Please enter a valid number."),
        }
    }
}

fn load_settings() -> Settings {
    let Some(path) = std::env::args().nth(1) else {
        return Settings::default();
    };
    let json = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {path}: {e}"));
    match Settings::from_json(&json) {
        Ok(settings) => settings,
        Err(e) => {
            println!("Ignoring {path}: {e}");
            Settings::default()
        }
    }
}

fn main() {
    println!("=== Dive Planner ===\n");
    let mut settings = load_settings();

    let vpm = get_input("Use VPM-B instead of Buehlmann (0/1)", 0u8);
    settings.dive.deco_type = if vpm == 1 { DecoType::Vpm } else { DecoType::Buehlmann };
    settings.dive.gf_low = get_input("GF Low (%)", settings.dive.gf_low);
    settings.dive.gf_high = get_input("GF High (%)", settings.dive.gf_high);
    let deco_o2 = get_input("Deco gas O2 % switched at 21 m (0 for none)", 50u8);
    if deco_o2 > 0 {
        settings.dive.gases[2] = GasSlot::new(deco_o2, 0).as_deco(21);
    }
    if let Err(e) = settings.validate() {
        println!("Invalid settings: {e}");
        return;
    }

    let depth = get_input("Depth (m)", 40.0f32);
    let dive_time = get_input("Dive time (min)", 25u32);
    let interval = get_input("Surface interval before the dive (min)", 0u32);

    let ctx = DiveContext::new(settings);
    let plan = plan_deco(&ctx, depth, interval, dive_time);
    let deco = &plan.deco;

    println!("\nDepth (m) | Stop (min)");
    println!("----------|-----------");
    let grid = grid_for(&settings.dive);
    for (index, seconds) in deco.stop_length_seconds.iter().enumerate().rev() {
        if *seconds > 0 {
            println!("   {:5.1}  |   {:4}", grid.depth_of(index), seconds / 60);
        }
    }
    if !deco.has_stops() {
        println!("No decompression stops, NDL {} min", deco.ndl_seconds / 60);
    }
    if deco.overflow {
        println!("WARNING: a stop exceeded the planner limits");
    }

    let surface = ctx.real().life.pressure_surface_bar;
    let summary = build_plan_summary(
        &settings.dive,
        settings.simulation.descent_rate(),
        surface,
        depth,
        dive_time,
        deco,
        &plan.gas_changes,
    );
    println!("\nTime to bottom:     {} min", summary.time_to_bottom_minutes);
    println!("Ascent starts at:   {} min", summary.time_at_bottom_minutes);
    println!(
        "First stop:         {} m at {} min",
        summary.first_stop_depth_meter, summary.time_to_first_stop_minutes
    );
    println!("Surfacing at:       {} min", summary.time_to_surface_minutes);
    println!("ppO2 at bottom:     {:.2} bar", summary.ppo2_at_bottom_bar);
    println!("CNS at surface:     {:.1} %", deco.cns_at_surface);

    let litres = estimate_gas_consumption(&settings, surface, depth, dive_time, deco, &plan.gas_changes);
    println!("\nGas  | O2/He  | Litres");
    for (slot, used) in litres.iter().enumerate() {
        if *used > 0 {
            let gas = settings.dive.gases[slot];
            println!(" {}   | {:2}/{:2}  | {}", slot, gas.oxygen_percentage, gas.helium_percentage, used);
        }
    }
}
