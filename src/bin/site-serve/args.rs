use std::io::Write as _;

use crate::serve;

/// Serve a directory for local development, with permissive CORS
#[derive(Clone, Debug, clap::Parser)]
#[command(about, version)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) serve: serve::ServeArgs,

    #[command(flatten, next_help_heading = "Display")]
    pub(crate) color: colorchoice_clap::Color,

    #[command(flatten, next_help_heading = "Display")]
    pub(crate) verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,
}

pub(crate) fn init_logging(
    level: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,
    colored: bool,
) {
    let Some(level) = level.log_level() else {
        return;
    };

    let palette = if colored {
        Palette::colored()
    } else {
        Palette::plain()
    };

    let mut builder = env_logger::Builder::new();
    builder.write_style(if colored {
        env_logger::WriteStyle::Always
    } else {
        env_logger::WriteStyle::Never
    });
    builder.filter(None, level.to_level_filter());

    if level == log::Level::Trace || level == log::Level::Debug {
        builder.format_timestamp_secs();
    } else {
        builder.format(move |f, record| match record.level() {
            log::Level::Info => writeln!(f, "{}", record.args()),
            level => {
                let style = palette.level(level);
                writeln!(
                    f,
                    "{style}{}{style:#}: {}",
                    level.as_str().to_lowercase(),
                    record.args()
                )
            }
        });
    }

    builder.init();
}

#[derive(Copy, Clone, Default, Debug)]
struct Palette {
    error: anstyle::Style,
    warn: anstyle::Style,
    info: anstyle::Style,
    debug: anstyle::Style,
    trace: anstyle::Style,
}

impl Palette {
    fn colored() -> Self {
        Self {
            error: anstyle::AnsiColor::Red.on_default() | anstyle::Effects::BOLD,
            warn: anstyle::AnsiColor::Yellow.on_default(),
            info: anstyle::AnsiColor::Green.on_default(),
            debug: anstyle::AnsiColor::Blue.on_default(),
            trace: anstyle::AnsiColor::Cyan.on_default(),
        }
    }

    fn plain() -> Self {
        Self::default()
    }

    fn level(&self, level: log::Level) -> anstyle::Style {
        match level {
            log::Level::Error => self.error,
            log::Level::Warn => self.warn,
            log::Level::Info => self.info,
            log::Level::Debug => self.debug,
            log::Level::Trace => self.trace,
        }
    }
}
