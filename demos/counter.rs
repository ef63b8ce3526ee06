//! Check "the counter never reaches TARGET" on an n-bit counter with an
//! increment input, and print the shortest counterexample.
//!
//! Run with:
//! ```bash
//! cargo run --example counter -- --bits 4 --target 11
//! ```

use std::rc::Rc;

use bdd_invar::bdd::Bdd;
use bdd_invar::check::find_violations;
use bdd_invar::reach::compute_reachable;
use bdd_invar::trace::build_trace;
use bdd_invar::transition::TransitionSystem;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Counter width in bits.
    #[arg(long, default_value_t = 3)]
    bits: usize,

    /// Value the counter must never reach.
    #[arg(long, default_value_t = 5)]
    target: u64,

    /// Log level.
    #[arg(long, default_value = "info")]
    log_level: simplelog::LevelFilter,
}

fn counter(bdd: Rc<Bdd>, bits: usize) -> TransitionSystem {
    let mut ts = TransitionSystem::new(bdd);
    let names: Vec<String> = (0..bits).map(|i| format!("x{}", i)).collect();
    for name in &names {
        ts.declare_state_var(name.as_str());
    }
    ts.declare_input_var("inc");

    // Ripple-carry increment.
    let mut carry = ts.input_var("inc");
    let mut constraints = Vec::new();
    for name in &names {
        let x = ts.state_var(name);
        constraints.push(ts.assign_var(name, ts.bdd().apply_xor(x, carry)));
        carry = ts.bdd().apply_and(x, carry);
    }
    let transition = ts.build_transition(&constraints);
    ts.set_transition(transition);

    let initial = ts.bdd().apply_and_many(names.iter().map(|n| -ts.state_var(n)));
    ts.set_initial(initial);
    ts
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    simplelog::TermLogger::init(
        cli.log_level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    if cli.bits == 0 || cli.bits > 63 {
        color_eyre::eyre::bail!("--bits must be in 1..=63, got {}", cli.bits);
    }

    let bdd = Rc::new(Bdd::default());
    let ts = counter(bdd.clone(), cli.bits);

    let target = ts.bdd().apply_and_many((0..cli.bits).map(|i| {
        let x = ts.state_var(&format!("x{}", i));
        if (cli.target >> i) & 1 == 1 {
            x
        } else {
            -x
        }
    }));
    let invariant = ts.states(-target);

    let reach = compute_reachable(&ts, &ts.initial_states());
    println!(
        "Reachable states: {:?} in {} layers",
        ts.count_states(&reach.reachable),
        reach.layers.len()
    );

    let (satisfied, violating) = find_violations(&reach.reachable, &invariant);
    if satisfied {
        println!("Invariant is respected");
    } else {
        println!("Invariant is not respected");
        let trace = build_trace(&ts, &reach.layers, &violating)?;
        print!("{}", trace);
    }

    log::info!("bdd = {:?}", bdd);
    Ok(())
}
