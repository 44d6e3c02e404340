/// wireproj terminal demo
///
/// Draws the sampled cuboid wireframe in the terminal and animates it.
/// Controls:
///   - Arrow keys: change Y / Z rotation speed
///   - x/y/z, X/Y/Z: raise / lower oscillation amplitude
///   - p: toggle pivot, r/Enter: re-render, space: pause
///   - q/ESC: quit
use clap::Parser;
use env_logger::{Builder, Env, Target};
use std::fs::File;
use std::io;
use wireproj_terminal::{Cli, TerminalApp};

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let mut app = TerminalApp::new(cli.settings(), cli.fps)?;
    app.run()
}

/// Logs go to `--log-file` when given. Writing to stderr would tear the
/// screen, so without a file logging stays off unless RUST_LOG asks for it.
fn init_logging(cli: &Cli) -> io::Result<()> {
    let default_level = if cli.log_file.is_some() { "warn" } else { "off" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));
    if let Some(path) = &cli.log_file {
        builder.target(Target::Pipe(Box::new(File::create(path)?)));
    }
    builder.init();
    Ok(())
}
