mod cli;
mod logger;

use areq::configuration::Configuration;
use areq::connection::Connection;
use areq::job::StatusQuery;
use areq::script::options::JobOptions;
use cli::{Application, Command};
use log::{debug, error};
use logger::Logger;
use serde::Serialize;
use std::env;
use std::fs;
use std::path::Path;
use std::process;

/// The environment variable holding the passphrase of the grid certificate.
const PASSPHRASE_VARIABLE: &str = "GRID_PROXY_PASSPHRASE";

fn main() {
    let arguments = Application::handle_arguments();

    let configuration = match Configuration::new(arguments.configuration_path.as_deref()) {
        Ok(configuration) => configuration,
        Err(message) => {
            eprintln!("Unable to load the configuration: {}", message);
            process::exit(1);
        },
    };
    if let Err(error) = Logger::initialize(configuration.log.level) {
        eprintln!("Unable to initialize the logger: {}", error);
        process::exit(1);
    };
    debug!("Running {:?}.", arguments.command);

    if let Err(message) = run(&configuration, arguments.command) {
        error!("{}", message);
        eprintln!("{}", message);
        process::exit(1);
    };
}

/// Run the given command, printing responses of the job service as JSON.
fn run(configuration: &Configuration, command: Command) -> Result<(), String> {
    let mut connection = Connection::open(configuration).map_err(|error| error.to_string())?;
    let jobs = connection.get_jobs();

    match command {
        Command::Submit { script_path, options: pairs, working_directory } => {
            let script = fs::read_to_string(&script_path).map_err(|error| format!("Unable to read {}: {}", script_path, error))?;
            let mut options = JobOptions::new();
            for pair in &pairs {
                options.set_from_pair(pair).map_err(|error| error.to_string())?;
            }
            let response = jobs.submit(&script, &options, working_directory.as_deref()).map_err(|error| error.to_string())?;

            print(&response)
        },
        Command::Status { job_ids, tag, format } => {
            if job_ids.len() == 1 && tag.is_none() && format.is_none() {
                let response = jobs.status(&job_ids[0]).map_err(|error| error.to_string())?;

                return print(&response);
            }

            let mut query = StatusQuery::new(job_ids);
            if let Some(tag) = &tag {
                query = query.with_tag(tag);
            }
            if let Some(format) = &format {
                query = query.with_format(format);
            }
            let response = jobs.statuses(query).map_err(|error| error.to_string())?;

            print(&response)
        },
        Command::Delete { job_id } => print(&jobs.delete(&job_id).map_err(|error| error.to_string())?),
        Command::Abort { job_id } => print(&jobs.abort(&job_id).map_err(|error| error.to_string())?),
        Command::Upload { local_path, remote_path } => {
            connection.upload(Path::new(&local_path), Path::new(&remote_path)).map_err(|error| error.to_string())
        },
        Command::Download { remote_path, local_path } => {
            connection.download(Path::new(&remote_path), Path::new(&local_path)).map_err(|error| error.to_string())
        },
        Command::Proxy { local_path } => {
            let passphrase = match env::var(PASSPHRASE_VARIABLE) {
                Ok(passphrase) => passphrase,
                Err(_) => return Err(format!("The passphrase must be given in {}.", PASSPHRASE_VARIABLE)),
            };

            connection.create_and_download_proxy(&passphrase, Path::new(&local_path)).map_err(|error| error.to_string())
        },
    }
}

fn print<T: Serialize>(value: &T) -> Result<(), String> {
    let output = serde_json::to_string_pretty(value).map_err(|error| error.to_string())?;
    println!("{}", output);

    Ok(())
}
