use colored::{Color, Colorize};
use log::{Level, LevelFilter};
use middleware::logger::LoggerMiddleware;

pub mod middleware {
    pub mod logger;
}

const LOG_FILE: &str = "billing.log";

fn level_color(level: Level) -> Color {
    match level {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::Green,
        Level::Debug => Color::Magenta,
        Level::Trace => Color::BrightBlack,
    }
}

/// Installs the global logger: colored lines on stdout, plain lines in
/// `billing.log`. Debug output is only enabled outside production.
pub fn setup(is_production: bool) -> Result<(), fern::InitError> {
    let level = if is_production {
        LevelFilter::Info
    } else {
        LevelFilter::Debug
    };

    let stdout = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%H:%M:%S]"),
                record.target(),
                record.level().to_string().color(level_color(record.level())),
                message
            ))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {} {} {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .chain(fern::log_file(LOG_FILE)?);

    fern::Dispatch::new()
        .level(level)
        .level_for("hyper", LevelFilter::Off)
        .level_for("sqlx", LevelFilter::Warn)
        .level_for("stripe", LevelFilter::Info)
        .chain(stdout)
        .chain(file)
        .apply()?;
    Ok(())
}

pub fn middleware() -> LoggerMiddleware {
    LoggerMiddleware::new()
}
