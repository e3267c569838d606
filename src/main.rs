use std::{error::Error, thread, time::Duration};

use lifegrid::{EngineConfig, LifeEngine, SnapshotConfig};
use log::info;

mod console;
mod options;
mod stats;

use console::ConsoleCommand;
use stats::Recorder;

const PAUSED_POLL: Duration = Duration::from_millis(20);

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let Some(args) = options::Args::from_env()? else {
        return Ok(());
    };

    let rule = args.rule()?;
    let (width, height) = args.grid_size()?;
    let alive = args.fill_mode()?.create_alive(width, height);
    info!("starting {} cells under {}", alive.len(), args.rule_name());

    let mut config = EngineConfig::default();
    if let Some(interval) = args.interval()? {
        config.snapshots = SnapshotConfig {
            interval,
            ..config.snapshots
        };
    }
    let mut engine = LifeEngine::new(rule, &alive, config);
    if let Some(boundary) = args.bounded()? {
        info!("bounded to {boundary:?}");
        engine.set_bounded(Some(boundary));
    }

    let mut console = if args.console() {
        Some(console::ConsoleRender::new()?)
    } else {
        None
    };
    let sleep = args.sleep()?;
    let generations = args.generations()?;
    let stats_file = args.stats_file();

    let initial = engine.samples().last().copied().unwrap_or_default();
    let mut stats = stats::SwitchRecorder::new(initial, stats_file.is_some());
    let mut paused = false;
    'generations: loop {
        if let Some(ref mut console) = console {
            while let Some(cmd) = console.poll_events()? {
                match cmd {
                    ConsoleCommand::Exit => break 'generations,
                    ConsoleCommand::TogglePause => paused = !paused,
                    ConsoleCommand::StepBack => {
                        engine.run_to(engine.generation().saturating_sub(1));
                        paused = true;
                    }
                    ConsoleCommand::Handled => {}
                }
            }
            console.render(&engine)?;
        }
        if paused {
            thread::sleep(PAUSED_POLL);
            continue;
        }
        if engine.generation() >= generations {
            break;
        }

        // report metrics every 500ms
        if stats.has_report() {
            let report = stats.report();
            if let Some(ref mut console) = console {
                console.set_report(report);
            } else {
                println!("{report}");
            }
        }

        engine.step();
        if let Some(&sample) = engine.samples().last() {
            stats.record(sample);
        }
        if let Some(time) = sleep {
            thread::sleep(time);
        }
    }
    drop(console);

    if let Some(target) = args.rewind()? {
        engine.run_to(target);
        info!("rewound to generation {}", engine.generation());
    }
    println!(
        "generation {}: population {} on a {}x{} grid",
        engine.generation(),
        engine.population(),
        engine.width(),
        engine.height()
    );

    if let Some(file_name) = stats_file {
        stats.save(file_name)?;
    }
    Ok(())
}
