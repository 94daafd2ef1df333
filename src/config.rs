use crate::probe::ProbeSettings;
use envconfig::Envconfig;
use std::{path::PathBuf, time::Duration};

#[derive(Envconfig)]
pub struct Config {
    #[envconfig(from = "LISTEN_ADDRESS", default = "0.0.0.0:8080")]
    pub listen_address: String,

    #[envconfig(from = "VOLUME_TOOL", default = "admesh")]
    pub volume_tool: String,

    // Zero waits on the tool forever.
    #[envconfig(from = "PROBE_TIMEOUT_SECS", default = "30")]
    pub probe_timeout_secs: u64,

    // Zero captures the whole report.
    #[envconfig(from = "MAX_PROBE_OUTPUT_BYTES", default = "65536")]
    pub max_probe_output_bytes: u64,

    // Zero lets every request run its own tool process.
    #[envconfig(from = "MAX_CONCURRENT_PROBES", default = "0")]
    pub max_concurrent_probes: usize,

    // Zero accepts uploads of any size.
    #[envconfig(from = "MAX_UPLOAD_BYTES", default = "67108864")]
    pub max_upload_bytes: u64,

    // Empty falls back to the OS temp directory.
    #[envconfig(from = "STAGING_FOLDER", default = "")]
    pub staging_folder: String,
}

impl Config {
    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            tool: self.volume_tool.clone(),
            timeout: non_zero(self.probe_timeout_secs).map(Duration::from_secs),
            max_output_bytes: non_zero(self.max_probe_output_bytes),
            max_concurrent: (self.max_concurrent_probes != 0).then(|| self.max_concurrent_probes),
        }
    }

    pub fn max_upload_bytes(&self) -> Option<u64> {
        non_zero(self.max_upload_bytes)
    }

    pub fn staging_folder(&self) -> PathBuf {
        if self.staging_folder.is_empty() {
            std::env::temp_dir()
        } else {
            PathBuf::from(&self.staging_folder)
        }
    }
}

fn non_zero(value: u64) -> Option<u64> {
    (value != 0).then(|| value)
}
