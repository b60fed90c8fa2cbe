use std::{
    fs::{create_dir_all, OpenOptions},
    io::{self, Write},
    path::Path,
};

use env_logger::Builder;

use crate::{config, core::DispatchResult, internal_error};

/// Appends formatted log records to a file.
pub struct FileWriter {
    file: std::fs::File,
}

impl FileWriter {
    /// Open `path` for appending, creating missing parent directories
    pub fn open(path: &str) -> io::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().append(true).create(true).open(path)?;
        Ok(Self { file })
    }
}

impl Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Sets up `env_logger` from the `log` section of the configuration.
///
/// Module directives from `RUST_LOG` still apply; the configured level
/// replaces its default level.
pub struct Logger {
    config: config::Log,
}

impl Logger {
    pub fn new(config: config::Log) -> Self {
        Self { config }
    }

    /// A builder carrying the configured level and target
    pub fn builder(&self) -> DispatchResult<Builder> {
        let mut builder = Builder::from_env(env_logger::Env::default());
        builder.filter(None, self.config.level_filter());

        if let Some(path) = &self.config.path {
            let writer = FileWriter::open(path)
                .map_err(|e| internal_error!("Failed to open log file {}: {}", path, e))?;
            builder.target(env_logger::Target::Pipe(Box::new(writer)));
        }

        Ok(builder)
    }

    /// Install the global logger.
    ///
    /// Fails if a logger is already installed.
    pub fn init(&self) -> DispatchResult<()> {
        self.builder()?
            .try_init()
            .map_err(|e| internal_error!("Failed to install logger: {}", e))
    }
}
