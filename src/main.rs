use std::path::PathBuf;

use mediagrid::RunOptions;

enum Command {
    Run(RunOptions),
    Exit,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let options = match handle_cli_flags() {
        Ok(Command::Run(options)) => options,
        Ok(Command::Exit) => return,
        Err(message) => {
            eprintln!("error: {message}");
            std::process::exit(2);
        }
    };

    if let Err(err) = mediagrid::run(options) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags() -> Result<Command, String> {
    let mut options = RunOptions::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("mediagrid {}", mediagrid::VERSION);
                return Ok(Command::Exit);
            }
            "--help" | "-h" => {
                println!(
                    "mediagrid - Browse a Pexels photo and video collection.\n\n  --pages N            Load N pages of the collection (default 1)\n  --open INDEX         Open the viewer at INDEX after loading\n  --offline            Use the built-in sample collection\n  --config PATH        Read configuration from PATH\n  --version, -V        Show version and exit\n  --help,    -h        Show this help message"
                );
                return Ok(Command::Exit);
            }
            "--offline" => options.offline = true,
            "--pages" => {
                let value = args.next().ok_or("--pages requires a value")?;
                options.pages = value
                    .parse()
                    .map_err(|_| format!("invalid page count {value:?}"))?;
            }
            "--open" => {
                let value = args.next().ok_or("--open requires a value")?;
                options.open = Some(
                    value
                        .parse()
                        .map_err(|_| format!("invalid index {value:?}"))?,
                );
            }
            "--config" => {
                let value = args.next().ok_or("--config requires a value")?;
                options.config_file = Some(PathBuf::from(value));
            }
            other => return Err(format!("unknown argument {other:?}")),
        }
    }
    Ok(Command::Run(options))
}
