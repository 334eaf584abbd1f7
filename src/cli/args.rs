//! Command line argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "nodedeck")]
#[command(
    about = "🧰 Multi-node serial workbench - monitor your boards and drive PlatformIO builds and uploads"
)]
pub struct Cli {
    /// Path to the configuration file (defaults to the platform config dir)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decrease logging verbosity (only errors)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// List serial ports that look like attached devices
    Ports,
    /// List PlatformIO environments defined in a project
    Envs {
        /// Project directory containing platformio.ini
        #[arg(value_name = "PROJECT_DIR")]
        project: PathBuf,
    },
    /// Monitor serial ports and watch for device self-identification
    Monitor {
        /// Ports to open (defaults to every board association with a port)
        #[arg(value_name = "PORT")]
        ports: Vec<String>,
        /// Baud rate override for ports without a board association
        #[arg(short, long)]
        baud_rate: Option<u32>,
    },
    /// Build one configured board's project
    Build {
        /// Board id from the configuration
        #[arg(value_name = "BOARD_ID")]
        board: String,
    },
    /// Build every configured board with a project, in configuration order
    BuildAll,
    /// Upload one configured board's project
    Upload {
        /// Board id from the configuration
        #[arg(value_name = "BOARD_ID")]
        board: String,
    },
    /// Upload every configured board with a project and port
    UploadAll,
    /// Clean one configured board's build artifacts
    Clean {
        /// Board id from the configuration
        #[arg(value_name = "BOARD_ID")]
        board: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
