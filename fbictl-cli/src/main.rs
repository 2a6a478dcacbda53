use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use fbictl_common::{
    parse_duration, whole_seconds, DisplayOutcome, ErrorReporting, Fbi, FbictlError, OutputMode,
    ProcessHandle, TerminateMode,
};
use fbictl_config::Config;

#[derive(Parser)]
#[command(name = "fbictl")]
#[command(about = "fbictl (framebuffer image viewer control)")]
#[command(version)]
struct Cli {
    /// Configuration file to use instead of the default one
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show an image on the framebuffer
    Show(ShowArgs),

    /// Kill every running viewer
    Kill,

    /// Print the effective configuration
    Config,
}

#[derive(Args)]
struct ShowArgs {
    /// Image to display
    image: PathBuf,

    /// How long to show the image, e.g. "10s" or "2m". "0s" leaves it open
    #[arg(long = "for", value_name = "DURATION")]
    duration: Option<String>,

    #[arg(long, value_name = "N")]
    frame_buffer: Option<String>,

    #[arg(long, value_name = "PATH")]
    device: Option<String>,

    /// Video mode from /etc/fb.modes
    #[arg(long)]
    mode: Option<String>,

    #[arg(long)]
    status_bar: bool,

    /// Space scrolls down before moving to the next image
    #[arg(long)]
    text_reading: bool,

    #[arg(long)]
    gamma: bool,

    #[arg(long, value_name = "PIXELS", allow_negative_numbers = true)]
    scroll_step: Option<i64>,

    #[arg(long)]
    autozoom: bool,

    #[arg(long)]
    auto_up: bool,

    #[arg(long)]
    auto_down: bool,

    #[arg(long)]
    random: bool,

    /// Show comment tags instead of the file name
    #[arg(long)]
    comments: bool,

    /// Discard everything the viewer prints
    #[arg(long)]
    quiet: bool,

    /// Stop the viewer with killall instead of signalling it
    #[arg(long)]
    kill_by_name: bool,

    /// Print the command instead of running it
    #[arg(long)]
    dry_run: bool,
}

impl ShowArgs {
    fn apply(&self, mut fbi: Fbi) -> anyhow::Result<Fbi> {
        if let Some(duration) = &self.duration {
            let seconds = whole_seconds(parse_duration(duration)?)
                .with_context(|| format!("--for takes whole seconds, got {}", duration))?;
            fbi = fbi.display_for(seconds);
        }
        if let Some(frame_buffer) = &self.frame_buffer {
            fbi = fbi.with_frame_buffer(frame_buffer);
        }
        if let Some(device) = &self.device {
            fbi = fbi.for_device(device.as_str());
        }
        if let Some(mode) = &self.mode {
            fbi = fbi.video_mode(mode.as_str());
        }
        if self.status_bar {
            fbi = fbi.show_status_bar();
        }
        if self.text_reading {
            fbi = fbi.enable_text_reading();
        }
        if self.gamma {
            fbi = fbi.with_gamma_correction();
        }
        if let Some(steps) = self.scroll_step {
            fbi = fbi.scroll_steps(steps);
        }
        if self.autozoom {
            fbi = fbi.with_autozoom();
        }
        if self.auto_up {
            fbi = fbi.auto_up();
        }
        if self.auto_down {
            fbi = fbi.auto_down();
        }
        if self.random {
            fbi = fbi.in_random_order();
        }
        if self.comments {
            fbi = fbi.with_comments();
        }
        if self.quiet {
            fbi = fbi.with_output(OutputMode::Discard);
        }
        if self.kill_by_name {
            fbi = fbi.with_terminate_mode(TerminateMode::ByName);
        }

        Ok(fbi.image(&self.image))
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<FbictlError>() {
            Some(error) => {
                error.log_error("fbictl");
                eprintln!("✗ Error: {}", error.user_friendly_message());
            }
            None => eprintln!("✗ Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Show(args) => show(&config, &args),

        Commands::Kill => {
            config.viewer()?.terminate()?;
            println!("✓ Viewer terminated");
            Ok(())
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load_or_default()?,
    };
    Ok(config)
}

fn show(config: &Config, args: &ShowArgs) -> anyhow::Result<()> {
    let fbi = args.apply(config.viewer()?)?;

    if args.dry_run {
        println!("{}", fbi.invocation()?);
        return Ok(());
    }

    match fbi.display()? {
        DisplayOutcome::Running(handle) => {
            println!("✓ Showing {} (pid {})", args.image.display(), handle.id());
        }
        DisplayOutcome::Terminated => {
            println!("✓ Showed {}", args.image.display());
        }
        DisplayOutcome::Exited => {
            println!("✓ Viewer closed before {} timed out", args.image.display());
        }
    }

    Ok(())
}
