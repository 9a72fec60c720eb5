use gitchat::{cli, config, telemetry};

fn main() {
    let cli = cli::parse_from(std::env::args_os());

    let cfg = match config::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };
    let log_to_stdout = cfg.logging.stdout;
    let telemetry_guard =
        telemetry::init(telemetry::TelemetryConfig::new(cli.verbose, cfg.logging.clone()));

    if let Err(e) = cli::run(cli, cfg) {
        tracing::error!(
            transience = ?e.transience(),
            effect = e.effect().as_str(),
            "error: {}",
            e
        );
        if !log_to_stdout {
            eprintln!("error: {e}");
        }
        // Flush file logs before exiting.
        drop(telemetry_guard);
        std::process::exit(1);
    }
}
