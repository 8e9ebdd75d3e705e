use clap::Parser;
use miette::Result;
use sgq::cli::commands;
use sgq::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` exits quietly instead of panicking
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
    sgq::logging::init(global.verbose, global.quiet);

    match cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Import(args) => commands::import::run(args, &global),
        Commands::List(args) => commands::list::run(args, &global),
        Commands::Show(args) => commands::show::run(args, &global),
        Commands::New(args) => commands::new::run(args, &global),
        Commands::Filters(args) => commands::filters::run(args, &global),
        Commands::Dashboard(args) => commands::dashboard::run(args, &global),
        Commands::Sync(args) => commands::sync::run(args, &global),
        Commands::Watch(args) => commands::watch::run(args, &global),
        Commands::Clear(args) => commands::clear::run(args, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
