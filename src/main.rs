use std::error::Error;
use std::time::Instant;

use env_logger::{Builder, Env};
use log::info;
use reservation_traffic::{Scenario, Simulation, TickOutcome};

const USAGE: &str = "usage: reservation-traffic [scenario.json|preset] [cars] [ticks]";

fn main() -> Result<(), Box<dyn Error>> {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        println!("{}", USAGE);
        println!("presets: {}", Scenario::PRESETS.join(", "));
        return Ok(());
    }

    let source = args.first().map(String::as_str).unwrap_or("big");
    let mut scenario = if source.ends_with(".json") {
        Scenario::from_json(&std::fs::read_to_string(source)?)?
    } else {
        Scenario::preset(source)?
    };
    if let Some(cars) = args.get(1) {
        scenario.cars = cars.parse()?;
    }
    let ticks: usize = match args.get(2) {
        Some(ticks) => ticks.parse()?,
        None => 1000,
    };

    let mut sim = Simulation::from_scenario(&scenario)?;
    info!("Simulating {} cars on {} for {} ticks", scenario.cars, source, ticks);

    let start = Instant::now();
    let mut runs = 1;
    for _ in 0..ticks {
        if sim.advance(scenario.cars)? {
            runs += 1;
        }
    }
    let elapsed = start.elapsed();

    println!(
        "{} ticks in {:?} ({:?} per tick), {} runs",
        ticks,
        elapsed,
        elapsed / ticks.max(1) as u32,
        runs
    );
    for car in sim.iter_cars() {
        let state = if car.is_dead() { "crashed" } else { "alive" };
        println!("{:>12}: score {:>3}, {}", car.name(), car.score(), state);
    }
    match sim.outcome() {
        TickOutcome::Won { car } => {
            let name = sim.get_car(car).map_or("?", |car| car.name());
            println!("Won by {}", name);
        }
        outcome => println!("Outcome: {:?}", outcome),
    }
    Ok(())
}
