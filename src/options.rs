use clap::Parser;

/// Nano Bridge - polls an AV bridge over its command-line session
#[derive(Debug, Parser)]
#[clap(author, version)]
pub struct Options {
    /// Config file to read
    #[clap(short = 'c', long = "config", default_value = "config.yaml")]
    pub config_file: String,

    /// Optional runtime limit in seconds
    #[clap(short = 't', long = "time")]
    pub runtime: Option<u64>,

    /// Poll until the first populated snapshot, print it as JSON and exit
    #[clap(long = "once")]
    pub once: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = Options::parse_from(["nano-bridge"]);
        assert_eq!(options.config_file, "config.yaml");
        assert_eq!(options.runtime, None);
        assert!(!options.once);
    }

    #[test]
    fn all_flags() {
        let options = Options::parse_from(["nano-bridge", "-c", "nano.yaml", "-t", "30", "--once"]);
        assert_eq!(options.config_file, "nano.yaml");
        assert_eq!(options.runtime, Some(30));
        assert!(options.once);
    }
}
