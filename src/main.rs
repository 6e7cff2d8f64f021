use clap::Parser;
use hreach::cli::{Cli, Commands, GlobalOpts};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) so piping to
    // `head` does not panic on a broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(&global);

    match cli.command {
        Commands::Init(args) => hreach::cli::commands::init::run(args, &global),
        Commands::Analyze(args) => hreach::cli::commands::analyze::run(args, &global),
        Commands::Summary(args) => hreach::cli::commands::summary::run(args, &global),
        Commands::List(args) => hreach::cli::commands::list::run(args, &global),
        Commands::Classify(args) => hreach::cli::commands::classify::run(args, &global),
        Commands::Template(args) => hreach::cli::commands::template::run(args, &global),
        Commands::Config(cmd) => hreach::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => hreach::cli::commands::completions::run(args),
    }
}

/// Log to stderr; RUST_LOG wins over --verbose
fn init_tracing(global: &GlobalOpts) {
    let default = if global.verbose { "hreach=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Ignore a second initialization
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
