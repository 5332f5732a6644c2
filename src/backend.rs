// ============================================================
// Compute Backend Selection
// ============================================================
// The tensor backend is a compile-time choice: WGPU by default,
// NdArray (pure CPU) behind the `ndarray` feature. The device
// within that backend is an explicit runtime configuration value
// resolved exactly once at startup and injected into the
// pipeline — never re-probed mid-run.

use burn::backend::Autodiff;

#[cfg(not(feature = "ndarray"))]
mod types {
    use super::*;

    pub type InferenceBackend = burn::backend::Wgpu;
    pub type TrainBackend = Autodiff<InferenceBackend>;
}

#[cfg(feature = "ndarray")]
mod types {
    use super::*;

    pub type InferenceBackend = burn::backend::NdArray;
    pub type TrainBackend = Autodiff<InferenceBackend>;
}

pub use types::*;

pub type Device = <InferenceBackend as burn::tensor::backend::Backend>::Device;

/// The user-facing device choice (`--device` flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevicePreference {
    /// Let the backend pick the best available device
    Auto,
    /// Force CPU execution
    Cpu,
    /// Force the first discrete GPU
    Gpu,
}

/// Resolve the preference to a concrete device. Called once per
/// process, right after CLI parsing.
#[cfg(not(feature = "ndarray"))]
pub fn select_device(pref: DevicePreference) -> Device {
    use burn::backend::wgpu::WgpuDevice;

    let device = match pref {
        DevicePreference::Auto => WgpuDevice::default(),
        DevicePreference::Cpu  => WgpuDevice::Cpu,
        DevicePreference::Gpu  => WgpuDevice::DiscreteGpu(0),
    };
    tracing::info!("Using WGPU device: {:?}", device);
    device
}

#[cfg(feature = "ndarray")]
pub fn select_device(pref: DevicePreference) -> Device {
    use burn::backend::ndarray::NdArrayDevice;

    if pref == DevicePreference::Gpu {
        tracing::warn!("GPU requested but the ndarray backend is CPU-only");
    }
    tracing::info!("Using NdArray CPU device");
    NdArrayDevice::Cpu
}
