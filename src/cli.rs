// CLI definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cadence_driver::ColorChannel;
use cadence_transport::Handedness;

#[derive(Parser)]
#[command(name = "cadence-driver")]
#[command(author, version, about = "Cadence tiled braille panel driver")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Config file (default: ~/.config/cadence/driver.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List attached Cadence panels
    #[command(visible_alias = "ls")]
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Drive all attached panels as one display
    Run {
        /// Image standing in for the screen in image mode
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,

        /// Start in image mode instead of text mode
        #[arg(long)]
        start_image: bool,
    },

    /// Render an image for a simulated panel layout and print it as braille
    Render {
        /// Image to render
        #[arg(long, value_name = "FILE")]
        image: PathBuf,

        /// Panel handedness in order, e.g. L,R or L,R,L,R
        #[arg(long, value_delimiter = ',', default_value = "L")]
        panels: Vec<Handedness>,

        /// Panel indices to put at a top corner
        #[arg(long, value_delimiter = ',')]
        flipped: Vec<usize>,

        /// Threshold 0-100 (default from config)
        #[arg(long)]
        threshold: Option<f64>,

        /// Colour channel to threshold
        #[arg(long, default_value_t = ColorChannel::Luminance)]
        channel: ColorChannel,

        /// Raise dots for light pixels instead of dark ones
        #[arg(long)]
        normal: bool,
    },

    /// Print every layout reachable by cycling panel positions
    Layouts {
        /// Panel handedness in order, e.g. L,R,L,R
        #[arg(long, value_delimiter = ',', default_value = "L,R")]
        panels: Vec<Handedness>,
    },

    /// Show the effective configuration
    Config {
        /// Write the default configuration to the config file
        #[arg(long)]
        write_default: bool,
    },
}
