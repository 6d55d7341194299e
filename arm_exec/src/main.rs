//! Main arm executable entry point.
//!
//! # Architecture
//!
//! - Initialise the session, logging and parameters
//! - Build the data store on either the serial link or the simulated link
//! - Open the link to the arm, carrying on if that fails
//! - Main loop:
//!     - Read a command, from a script or the interactive shell
//!     - Execute it with the telecommand processor
//!     - Print the response as JSON

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, error, info, warn};
use rustyline::{error::ReadlineError, DefaultEditor};
use std::path::{Path, PathBuf};
use structopt::StructOpt;

// Internal
use arm_if::tc::{ErrorKind, Tc, TcResponse};
use arm_lib::{
    clock::{Clock, SystemClock},
    data_store::DataStore,
    link::{serial::SerialConnector, sim::{SimConnector, SimLog}, Connector},
    params::ArmExecParams,
    tc_processor,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const PROMPT: &str = "arm $ ";

/// Events kept by the simulated link, older ones are discarded.
const SIM_LOG_MAX_EVENTS: usize = 1024;

/// Lines which leave the shell or end a script.
const EXIT_COMMANDS: [&str; 2] = ["exit", "quit"];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line options.
#[derive(Debug, StructOpt)]
#[structopt(name = "arm_exec", about = "Pick-and-place arm executable")]
struct Opts {
    /// Parameter file, relative to the params directory
    #[structopt(long, default_value = "arm_exec.toml")]
    params: String,

    /// Use the simulated arm link instead of the serial port
    #[structopt(long)]
    sim: bool,

    /// Script of commands to run instead of the interactive shell
    #[structopt(parse(from_os_str))]
    script: Option<PathBuf>,
}

/// Where commands come from.
enum TcSource {
    Script(String),
    Shell,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, LevelFilter::Info, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Pick-and-place Arm Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opts);

    // ---- LOAD PARAMETERS ----

    let params: ArmExecParams =
        util::params::load(&opts.params).wrap_err("Could not load arm_exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    let source = match &opts.script {
        Some(path) => {
            info!("Loading script from {:?}", path);
            TcSource::Script(load_script(path)?)
        }
        None => {
            info!("No script provided, using the interactive shell\n");
            TcSource::Shell
        }
    };

    // ---- INITIALISE DATASTORE ----

    if opts.sim {
        info!("Using the simulated arm link");
        let connector = SimConnector::new(SimLog::bounded(SIM_LOG_MAX_EVENTS));
        let ds = DataStore::new(&params, connector, SystemClock)
            .wrap_err("Failed to initialise the data store")?;
        run(ds, source)
    } else {
        info!(
            "Using serial port {} at {} baud",
            params.serial.port, params.serial.baud_rate
        );
        let ds = DataStore::new(&params, SerialConnector::new(&params.serial), SystemClock)
            .wrap_err("Failed to initialise the data store")?;
        run(ds, source)
    }
}

/// Connect to the arm and process commands until the source is exhausted.
fn run<C: Connector, K: Clock>(mut ds: DataStore<C, K>, source: TcSource) -> Result<(), Report> {
    // Ctrl-C cancels a running routine at the next step boundary
    let cancel = ds.cancel_token();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, cancelling");
        cancel.cancel();
    })
    .wrap_err("Failed to install the interrupt handler")?;

    // ---- INITIALISE LINK ----

    if !ds.connect() {
        warn!("Arm link not available, it will be reopened on the next command");
    }

    // ---- MAIN LOOP ----

    match source {
        TcSource::Script(script) => {
            let cancel = ds.cancel_token();

            for (num, line) in script.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if EXIT_COMMANDS.contains(&line) {
                    break;
                }

                process_line(&mut ds, line);

                if cancel.is_cancelled() {
                    warn!("Script stopped at line {}", num + 1);
                    break;
                }
            }
        }
        TcSource::Shell => {
            let mut rl = DefaultEditor::new().wrap_err("Failed to start the shell")?;

            loop {
                match rl.readline(PROMPT) {
                    Ok(line) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        rl.add_history_entry(line).ok();
                        if EXIT_COMMANDS.contains(&line) {
                            break;
                        }

                        process_line(&mut ds, line);
                    }
                    Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                    Err(e) => return Err(e).wrap_err("Failed to read from the shell"),
                }
            }
        }
    }

    info!("Link report: {:?}", ds.arm_ctrl.link_report());
    info!("Exiting");

    Ok(())
}

fn load_script(path: &Path) -> Result<String, Report> {
    std::fs::read_to_string(path).wrap_err_with(|| format!("Failed to load script {:?}", path))
}

/// Parse and execute one line, printing the response.
fn process_line<C: Connector, K: Clock>(ds: &mut DataStore<C, K>, line: &str) {
    let rsp = match Tc::parse_line(line) {
        Ok(tc) => tc_processor::exec(ds, &tc),
        Err(e) => {
            warn!("Invalid command {:?}: {}", line, e);
            TcResponse::error(ErrorKind::InvalidCommand, e)
        }
    };

    match serde_json::to_string(&rsp) {
        Ok(s) => println!("{}", s),
        Err(e) => error!("Could not serialise response {:?}: {}", rsp, e),
    }
}
