use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "apmlens", version, about = "Browse services and instances of an APM backend")]
pub struct Args {
    /// Backend GraphQL endpoint (overrides the config file)
    #[arg(short, long, global = true)]
    pub url: Option<String>,

    /// Size of the query time window, in minutes
    #[arg(short, long, global = true, default_value_t = 15)]
    pub minutes: i64,

    /// Fuzzy-filter the resulting list
    #[arg(short, long, global = true)]
    pub filter: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the services of a layer
    Services {
        /// Layer to list services for (e.g. "GENERAL")
        #[arg(short, long, default_value = "GENERAL")]
        layer: String,
    },
    /// List the instances of a service
    Instances {
        /// Select this service before fetching; wins over --fallback
        #[arg(short, long)]
        service: Option<String>,

        /// Service id used when nothing is selected
        #[arg(long, default_value = "0")]
        fallback: String,
    },
}
