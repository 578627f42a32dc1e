use musico::config;

/// Load settings, falling back to defaults. A problem is reported back so it
/// can be logged once tracing is installed.
pub fn load_settings() -> (config::Settings, Option<String>) {
    match config::Settings::load() {
        Ok(s) => match s.validate() {
            Ok(()) => (s, None),
            Err(e) => (
                config::Settings::default(),
                Some(format!("invalid config, using defaults: {e}")),
            ),
        },
        // Config is optional; failures never prevent startup.
        Err(e) => (
            config::Settings::default(),
            Some(format!("failed to load config, using defaults: {e}")),
        ),
    }
}
