use clap::{Arg, Command};
use rigscan_data::{ScanEvent, ScanState};
use rigscan_driver::{run_rig, RigConfig, SampleCount};

struct Args {
    samples: String,
    config: Option<String>,
}

fn get_args() -> Args {
    let matches = Command::new("Rig scanner.")
        .about("Runs one spherical scan and prints the point cloud as JSON.")
        .disable_version_flag(true)
        .arg(
            Arg::new("samples")
                .help("Number of motor steps in the sweep")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Path to a TOML configuration file"),
        )
        .get_matches();

    Args {
        samples: matches.get_one::<String>("samples").unwrap().clone(),
        config: matches.get_one::<String>("config").cloned(),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = get_args();

    let config = match &args.config {
        Some(path) => RigConfig::from_file(path),
        None => Ok(RigConfig::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load the configuration. Error: {}", e);
            std::process::exit(1);
        }
    };

    let samples = match args.samples.parse::<SampleCount>() {
        Ok(samples) => samples,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let (rig, events) = match run_rig(&config) {
        Ok(rig) => rig,
        Err(e) => {
            eprintln!("Failed to start the rig. Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = rig.begin(i64::from(samples.get())) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let mut completed = false;
    for event in events.iter() {
        match event {
            ScanEvent::Status(status)
                if matches!(status.state, ScanState::Idle | ScanState::Error) =>
            {
                eprintln!("Scan stopped in {}", status.state);
                break;
            }
            ScanEvent::Status(status) => eprintln!(
                "{} {}/{} ({:.0}%)",
                status.state,
                status.completed_steps,
                status.total_steps,
                status.progress() * 100.
            ),
            ScanEvent::GridUpdate(grid) => eprintln!("grid with {} returns", grid.n_returns()),
            ScanEvent::PointCloudUpdate(cloud) => eprintln!("{} points", cloud.len()),
            ScanEvent::Error(fault) => eprintln!("{}", fault),
            ScanEvent::Complete(cloud) => {
                println!("{}", serde_json::to_string(&cloud).unwrap());
                completed = true;
                break;
            }
        }
    }

    drop(rig);
    if !completed {
        std::process::exit(1);
    }
}
