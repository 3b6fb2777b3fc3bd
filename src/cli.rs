use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tera-views",
    about = "Render tera views with URL helpers from a views.toml",
    version
)]
pub struct Cli {
    /// Log at debug level (otherwise RUST_LOG is honored)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a template to stdout
    Render {
        /// Template name, e.g. "hello.html" or "@admin/index.html"
        template: String,

        /// Path to views.toml, or a directory containing it
        #[arg(short, long, default_value = ".")]
        config: PathBuf,

        /// Set template variables (can be repeated: -d key=value). Values are parsed as JSON when possible.
        #[arg(short, long = "data", value_name = "KEY=VALUE")]
        data: Vec<String>,

        /// Request URI the URL helpers are bound to
        #[arg(long, default_value = "http://localhost/")]
        uri: String,
    },

    /// Load and compile every template, then list templates and routes
    Check {
        /// Path to views.toml, or a directory containing it
        #[arg(short, long, default_value = ".")]
        config: PathBuf,
    },

    /// Print the relative path leading from one URL path to another
    Relative {
        /// Target path, e.g. /blog/post
        to: String,

        /// Current path, e.g. /hello/world
        from: String,
    },
}
