//! Startup error types

use thiserror::Error;

/// Errors raised while assembling process configuration.
///
/// Any of these is fatal: the service must not reach a serving state.
#[derive(Error, Debug)]
pub enum Error {
    #[error("set {0} environment variable")]
    MissingEnv(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_env_names_the_variable() {
        let err = Error::MissingEnv("CLIENT_SECRET");
        assert_eq!(err.to_string(), "set CLIENT_SECRET environment variable");
    }

    #[test]
    fn error_display_includes_context() {
        let config_err = Error::Config("port must be greater than 0".into());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: port must be greater than 0"
        );

        let io_err = Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        assert!(
            io_err.to_string().starts_with("I/O error:"),
            "got: {}",
            io_err
        );
    }

    #[test]
    fn toml_errors_convert() {
        let parse_err = toml::from_str::<toml::Table>("not valid {{{{ toml").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Toml(_)), "got: {err:?}");
    }
}
