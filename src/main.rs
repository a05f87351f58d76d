use proxyctl::{init_logger, Cli};
use std::process::ExitCode;
use tracing::{debug, info};

const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    #[cfg(feature = "ui")]
    let ui_config = proxyctl::ui::UiConfig::detect();
    #[cfg(feature = "ui")]
    proxyctl::ui::init_ui(&ui_config);

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            report_error(&e);
            return ExitCode::FAILURE;
        }
    };

    init_logger(&config.logging);
    debug!("Effective config: {:?}", config);

    #[cfg(feature = "ui")]
    {
        proxyctl::ui::print_banner(VERSION);
        println!("{}", proxyctl::ui::rule(&ui_config));
        proxyctl::ui::print_info(&format!("Config: {}", cli.config.display()));
    }
    info!("proxyctl {} starting", VERSION);

    match proxyctl_cli::run(&cli, &config).await {
        Ok(()) => {
            #[cfg(feature = "ui")]
            proxyctl::ui::print_success("Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn report_error(err: &anyhow::Error) {
    #[cfg(feature = "ui")]
    proxyctl::ui::print_error(&format!("{:#}", err));
    #[cfg(not(feature = "ui"))]
    eprintln!("Error: {:#}", err);
}
