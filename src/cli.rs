//! Areq's CLI management, parsing CLI arguments given by the user.
//!
//! This module provides a complete handling on CLI arguments, including parsing arguments given by
//! the user, but also displaying the help and version commands. When arguments cannot get parsed,
//! it exits the program, displaying an appropriate message and returning the proper error code to
//! the parent shell.
//!
//! A global argument is available for every command:
//! * `-c`, `--config`: it takes a value as parameter, being the path to the configuration file
//! used for the current execution.

use clap::crate_name;
use clap::crate_version;
use clap::App;
use clap::AppSettings;
use clap::Arg;
use clap::ArgMatches;

/// The command requested by the user.
#[derive(Debug, PartialEq)]
pub enum Command {
    Submit {
        script_path: String,
        options: Vec<String>,
        working_directory: Option<String>,
    },
    Status {
        job_ids: Vec<String>,
        tag: Option<String>,
        format: Option<String>,
    },
    Delete {
        job_id: String,
    },
    Abort {
        job_id: String,
    },
    Upload {
        local_path: String,
        remote_path: String,
    },
    Download {
        remote_path: String,
        local_path: String,
    },
    Proxy {
        local_path: String,
    },
}

#[derive(Debug, PartialEq)]
pub struct Arguments {
    pub configuration_path: Option<String>,
    pub command: Command,
}

pub struct Application {}

impl Application {
    /// Handle current CLI arguments. When arguments cannot get parsed, it exits the program,
    /// displaying the corresponding message, and returning the proper error code.
    pub fn handle_arguments() -> Arguments {
        Application::parse(Application::build().get_matches())
    }

    fn build() -> App<'static> {
        let job_id = || Arg::new("job_id").required(true).value_name("JOB_ID").help("The job identifier");

        App::new(crate_name!())
            .version(crate_version!())
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .arg(
                Arg::new("configuration_path")
                    .short('c')
                    .long("config")
                    .takes_value(true)
                    .value_name("FILE")
                    .global(true)
                    .help("Sets the path of the configuration file")
            )
            .subcommand(
                App::new("submit")
                    .about("Submits a batch script")
                    .arg(Arg::new("script_path").required(true).value_name("SCRIPT").help("The script to submit"))
                    .arg(
                        Arg::new("option")
                            .short('o')
                            .long("option")
                            .takes_value(true)
                            .multiple_occurrences(true)
                            .value_name("KEY=VALUE")
                            .help("Sets a job option (partition, time, nodes, ntasks, error, output, input, account, memory, gpus, job_name, cpus_per_task)")
                    )
                    .arg(
                        Arg::new("working_directory")
                            .short('d')
                            .long("working-directory")
                            .takes_value(true)
                            .value_name("DIR")
                            .help("Runs the job in the given directory")
                    )
            )
            .subcommand(
                App::new("status")
                    .about("Shows the status of one or many jobs")
                    .arg(job_id().multiple_values(true))
                    .arg(Arg::new("tag").long("tag").takes_value(true).value_name("TAG").help("Filters jobs by tag"))
                    .arg(Arg::new("format").long("format").takes_value(true).value_name("FORMAT").help("Sets the response format"))
            )
            .subcommand(App::new("delete").about("Deletes a job").arg(job_id()))
            .subcommand(App::new("abort").about("Aborts a job").arg(job_id()))
            .subcommand(
                App::new("upload")
                    .about("Uploads a file to the cluster")
                    .arg(Arg::new("local_path").required(true).value_name("LOCAL"))
                    .arg(Arg::new("remote_path").required(true).value_name("REMOTE"))
            )
            .subcommand(
                App::new("download")
                    .about("Downloads a file from the cluster")
                    .arg(Arg::new("remote_path").required(true).value_name("REMOTE"))
                    .arg(Arg::new("local_path").required(true).value_name("LOCAL"))
            )
            .subcommand(
                App::new("proxy")
                    .about("Generates a proxy certificate on the cluster and downloads it (passphrase read from GRID_PROXY_PASSPHRASE)")
                    .arg(Arg::new("local_path").required(true).value_name("LOCAL"))
            )
            .help_template("USAGE: {usage}\n\n{all-args}{subcommands}")
    }

    fn parse(matches: ArgMatches) -> Arguments {
        let value = |matches: &ArgMatches, name: &str| matches.value_of(name).map(String::from);
        let required = |matches: &ArgMatches, name: &str| value(matches, name).unwrap_or_default();

        let command = match matches.subcommand() {
            Some(("submit", submit)) => Command::Submit {
                script_path: required(submit, "script_path"),
                options: submit.values_of("option").map(|values| values.map(String::from).collect()).unwrap_or_default(),
                working_directory: value(submit, "working_directory"),
            },
            Some(("status", status)) => Command::Status {
                job_ids: status.values_of("job_id").map(|values| values.map(String::from).collect()).unwrap_or_default(),
                tag: value(status, "tag"),
                format: value(status, "format"),
            },
            Some(("delete", delete)) => Command::Delete {
                job_id: required(delete, "job_id"),
            },
            Some(("abort", abort)) => Command::Abort {
                job_id: required(abort, "job_id"),
            },
            Some(("upload", upload)) => Command::Upload {
                local_path: required(upload, "local_path"),
                remote_path: required(upload, "remote_path"),
            },
            Some(("download", download)) => Command::Download {
                remote_path: required(download, "remote_path"),
                local_path: required(download, "local_path"),
            },
            Some(("proxy", proxy)) => Command::Proxy {
                local_path: required(proxy, "local_path"),
            },
            // Subcommands are required, clap exits before reaching this point.
            _ => unreachable!(),
        };

        Arguments {
            configuration_path: value(&matches, "configuration_path"),
            command: command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(arguments: &[&str]) -> Arguments {
        Application::parse(Application::build().try_get_matches_from(arguments).unwrap())
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            parse(&["areq", "-c", "areq.toml", "submit", "job.sh", "-o", "nodes=1", "-o", "time=10", "-d", "/net/scratch"]),
            Arguments {
                configuration_path: Some(String::from("areq.toml")),
                command: Command::Submit {
                    script_path: String::from("job.sh"),
                    options: vec![String::from("nodes=1"), String::from("time=10")],
                    working_directory: Some(String::from("/net/scratch")),
                },
            },
        );
        assert_eq!(
            parse(&["areq", "status", "1", "2", "--tag", "nightly"]),
            Arguments {
                configuration_path: None,
                command: Command::Status {
                    job_ids: vec![String::from("1"), String::from("2")],
                    tag: Some(String::from("nightly")),
                    format: None,
                },
            },
        );
        assert_eq!(
            parse(&["areq", "download", "/net/scratch/out", "out", "--config", "other.toml"]).command,
            Command::Download { remote_path: String::from("/net/scratch/out"), local_path: String::from("out") },
        );
        assert_eq!(parse(&["areq", "abort", "1"]).command, Command::Abort { job_id: String::from("1") });
    }

    #[test]
    fn test_parse_errors() {
        assert!(Application::build().try_get_matches_from(&["areq"]).is_err());
        assert!(Application::build().try_get_matches_from(&["areq", "delete"]).is_err());
        assert!(Application::build().try_get_matches_from(&["areq", "unknown"]).is_err());
    }
}
