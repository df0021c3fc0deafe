use crate::consts::{
    CONFIG_MAP_DEFAULT_NAME, CONFIG_MAP_DEFAULT_NAMESPACE, CONFIG_MAP_NAMESPACE_ENV_VAR,
    CONFIG_MAP_NAME_ENV_VAR,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs the function operator
    #[clap(visible_alias = "r")]
    Run {
        #[command(subcommand)]
        command: RunCommands,
    },
    /// Custom definition resource (CRD) commands
    #[clap(visible_alias = "c")]
    Crd {
        #[command(subcommand)]
        command: CrdCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum RunCommands {
    /// Runs the function operator in controller mode
    #[clap(visible_alias = "co")]
    Controller {
        /// Name of the ConfigMap holding the registry, build service account and runtimes
        #[clap(short = 'c', long, env = CONFIG_MAP_NAME_ENV_VAR, default_value = CONFIG_MAP_DEFAULT_NAME)]
        config_map: String,
        /// Namespace of the operator ConfigMap
        #[clap(short = 'n', long, env = CONFIG_MAP_NAMESPACE_ENV_VAR, default_value = CONFIG_MAP_DEFAULT_NAMESPACE)]
        config_map_namespace: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CrdCommands {
    /// Writes the CRD to a file
    #[clap(visible_alias = "w")]
    Write {
        /// The path to the file to write the CRD to
        #[clap(short, long)]
        file: PathBuf,
        #[clap(long, value_enum, default_value_t = CrdFormat::default())]
        format: CrdFormat,
    },
    /// Prints the CRD to stdout
    #[clap(visible_alias = "p")]
    Print {
        #[clap(long, value_enum, default_value_t = CrdFormat::default())]
        format: CrdFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CrdFormat {
    #[default]
    Yaml,
    Json,
}

impl std::fmt::Display for CrdFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrdFormat::Yaml => write!(f, "yaml"),
            CrdFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_defaults_to_fn_config() {
        let cli = Cli::try_parse_from(["function_operato_rs", "run", "controller"]).unwrap();

        match cli.command {
            Commands::Run {
                command:
                    RunCommands::Controller {
                        config_map,
                        config_map_namespace,
                    },
            } => {
                // env may override the defaults on a developer machine
                if std::env::var_os(CONFIG_MAP_NAME_ENV_VAR).is_none() {
                    assert_eq!(config_map, "fn-config");
                }
                if std::env::var_os(CONFIG_MAP_NAMESPACE_ENV_VAR).is_none() {
                    assert_eq!(config_map_namespace, "default");
                }
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn crd_print_accepts_json() {
        let cli =
            Cli::try_parse_from(["function_operato_rs", "c", "p", "--format", "json"]).unwrap();

        assert!(matches!(
            cli.command,
            Commands::Crd {
                command: CrdCommands::Print {
                    format: CrdFormat::Json
                }
            }
        ));
    }
}
