use candle_core::Device;
use tracing::{debug, info, warn};

use super::error::EncoderError;

/// Which compute device the encoder should run on.
///
/// Resolved once by [`select_device`] when the encoder loads; the chosen
/// [`Device`] is stored in the encoder and never re-probed per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePreference {
    /// Use a compiled-in GPU backend if one initializes, otherwise CPU.
    #[default]
    Auto,
    /// Always CPU.
    Cpu,
    /// CUDA device 0; failure is fatal.
    Cuda,
    /// Metal device 0; failure is fatal.
    Metal,
}

impl DevicePreference {
    /// Parses `auto`, `cpu`, `cuda` or `metal` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "cpu" => Some(Self::Cpu),
            "cuda" => Some(Self::Cuda),
            "metal" => Some(Self::Metal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cpu => "cpu",
            Self::Cuda => "cuda",
            Self::Metal => "metal",
        }
    }
}

impl std::fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short name of a resolved device, for logs and introspection.
pub fn device_label(device: &Device) -> &'static str {
    if device.is_cuda() {
        "cuda"
    } else if device.is_metal() {
        "metal"
    } else {
        "cpu"
    }
}

/// Resolves a [`DevicePreference`] to a concrete device.
pub fn select_device(preference: DevicePreference) -> Result<Device, EncoderError> {
    match preference {
        DevicePreference::Cpu => {
            debug!("CPU device requested");
            Ok(Device::Cpu)
        }
        DevicePreference::Cuda => {
            let device = Device::new_cuda(0).map_err(|e| EncoderError::DeviceUnavailable {
                device: "cuda".to_string(),
                reason: e.to_string(),
            })?;
            info!("Using CUDA GPU acceleration");
            Ok(device)
        }
        DevicePreference::Metal => {
            let device = Device::new_metal(0).map_err(|e| EncoderError::DeviceUnavailable {
                device: "metal".to_string(),
                reason: e.to_string(),
            })?;
            info!("Using Metal GPU acceleration");
            Ok(device)
        }
        DevicePreference::Auto => Ok(auto_device()),
    }
}

/// Tries compiled GPU backends in order (Metal, CUDA) and falls back to CPU.
fn auto_device() -> Device {
    #[cfg(any(feature = "metal", feature = "cuda"))]
    let mut failures: Vec<String> = Vec::new();

    #[cfg(not(any(feature = "metal", feature = "cuda")))]
    let failures: Vec<String> = Vec::new();

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Using Metal GPU acceleration");
                return device;
            }
            Err(e) => {
                let msg = e.to_string();
                if cfg!(feature = "cuda") {
                    warn!(error = %msg, "Metal device unavailable, trying CUDA");
                } else {
                    warn!(error = %msg, "Metal device unavailable");
                }
                failures.push(format!("metal failed: {msg}"));
            }
        }
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => {
                info!("Using CUDA GPU acceleration");
                return device;
            }
            Err(e) => {
                let msg = e.to_string();
                warn!(error = %msg, "CUDA device unavailable");
                failures.push(format!("cuda failed: {msg}"));
            }
        }
    }

    #[cfg(not(any(feature = "metal", feature = "cuda")))]
    {
        debug!("No GPU features enabled");
    }

    let reason = if !cfg!(any(feature = "metal", feature = "cuda")) {
        "no GPU backend compiled".to_string()
    } else if failures.is_empty() {
        "no GPU device available".to_string()
    } else {
        failures.join("; ")
    };

    warn!(reason = %reason, "Falling back to CPU device");
    Device::Cpu
}
