//! Reel Spin headless runner
//!
//! Usage: `reel-spin [settings.json] [spins]`
//!
//! Drives the machine from a simulated host clock through a fixed-step
//! accumulator and logs every outcome. Set `RUST_LOG=debug` for per-reel
//! transitions.

use std::cell::RefCell;
use std::rc::Rc;

use reel_spin::consts::{FRAME_DT, MAX_SUBSTEPS};
use reel_spin::{Settings, SlotMachine, SpinOutcome};

/// Host frame length the runner pretends to render at
const HOST_DT: f32 = 1.0 / 30.0;
/// Give up on a spin after this many host frames
const MAX_HOST_FRAMES: u32 = 30 * 60;

struct Runner {
    machine: SlotMachine,
    accumulator: f32,
}

impl Runner {
    fn new(machine: SlotMachine) -> Self {
        Self {
            machine,
            accumulator: 0.0,
        }
    }

    /// Run fixed engine frames for `dt` seconds of host time
    fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= FRAME_DT && substeps < MAX_SUBSTEPS {
            self.machine.update(1.0);
            self.accumulator -= FRAME_DT;
            substeps += 1;
        }
    }
}

fn main() {
    env_logger::init();
    log::info!("Reel Spin (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };
    let spins: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(3);

    let outcomes: Rc<RefCell<Vec<SpinOutcome>>> = Rc::default();
    let mut machine = match SlotMachine::from_settings(&settings) {
        Ok(machine) => machine,
        Err(err) => {
            log::error!("Cannot build slot machine: {err}");
            std::process::exit(1);
        }
    };
    {
        let outcomes = Rc::clone(&outcomes);
        machine.on_spin_end(move |outcome| outcomes.borrow_mut().push(outcome.clone()));
    }

    let mut runner = Runner::new(machine);
    for spin in 1..=spins {
        runner.machine.spin();
        let mut frames = 0;
        while runner.machine.is_spinning() && frames < MAX_HOST_FRAMES {
            runner.update(HOST_DT);
            frames += 1;
        }
        if runner.machine.is_spinning() {
            log::error!("Spin {spin} did not finish after {frames} host frames");
            break;
        }
        if let Some(outcome) = outcomes.borrow().last() {
            log::info!(
                "Spin {spin}: {} in {:.2}s, grid {:?}",
                if outcome.win { "WIN" } else { "no win" },
                frames as f32 * HOST_DT,
                outcome.grid
            );
        }
    }

    let wins = outcomes.borrow().iter().filter(|o| o.win).count();
    println!("{} spins, {} wins", outcomes.borrow().len(), wins);
}
