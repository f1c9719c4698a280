use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerPreference {
    #[default]
    HighPerformance,
    LowPower,
}

impl PowerPreference {
    pub(crate) fn to_wgpu(self) -> wgpu::PowerPreference {
        match self {
            PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
            PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
        }
    }
}

/// How the default device is discovered and what it may allocate.
#[derive(Debug, Clone)]
pub struct Config {
    pub power_preference: PowerPreference,
    pub force_fallback_adapter: bool,
    pub backends: wgpu::Backends,
    pub device_label: String,

    /// Cap on a single buffer's byte length, below the device limit.
    pub max_buffer_size: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            power_preference: PowerPreference::default(),
            force_fallback_adapter: false,
            backends: wgpu::Backends::all(),
            device_label: "gpubridge-device".to_string(),
            max_buffer_size: None,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.backends.is_empty() {
            return Err(Error::config("at least one backend must be enabled"));
        }

        if let Some(cap) = self.max_buffer_size {
            if cap < wgpu::COPY_BUFFER_ALIGNMENT {
                return Err(Error::config(format!(
                    "max_buffer_size must be at least {} bytes",
                    wgpu::COPY_BUFFER_ALIGNMENT
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn power_preference(mut self, preference: PowerPreference) -> Self {
        self.config.power_preference = preference;
        self
    }

    pub fn force_fallback_adapter(mut self, force: bool) -> Self {
        self.config.force_fallback_adapter = force;
        self
    }

    pub fn backends(mut self, backends: wgpu::Backends) -> Self {
        self.config.backends = backends;
        self
    }

    pub fn device_label<S: Into<String>>(mut self, label: S) -> Self {
        self.config.device_label = label.into();
        self
    }

    pub fn max_buffer_size(mut self, bytes: u64) -> Self {
        self.config.max_buffer_size = Some(bytes);
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
