/// Values applied when neither the config file nor the command line sets them.
pub struct DefaultsConfig {
    pub generate_coordinates: bool,
    pub use_cache: bool,
    pub dump_extension: &'static str,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            generate_coordinates: true,
            use_cache: true,
            dump_extension: "toml",
        }
    }
}
