/// File name of the driver library as cargo builds it on this platform.
pub fn driver_library_name() -> &'static str {
    #[cfg(target_os = "windows")]
    { "nulldrv_icd.dll" }
    #[cfg(target_os = "macos")]
    { "libnulldrv_icd.dylib" }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    { "libnulldrv_icd.so" }
}

/// Directories the Vulkan loader scans for ICD manifests.
pub fn icd_manifest_dirs() -> &'static [&'static str] {
    #[cfg(unix)]
    {
        &[
            "/usr/share/vulkan/icd.d",
            "/etc/vulkan/icd.d",
            "/usr/local/share/vulkan/icd.d",
        ]
    }
    #[cfg(not(unix))]
    {
        &[]
    }
}

/// Returns the platform name string.
pub fn platform_name() -> &'static str {
    #[cfg(target_os = "windows")]
    { "windows" }
    #[cfg(target_os = "linux")]
    { "linux" }
    #[cfg(target_os = "macos")]
    { "macos" }
    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    { "unknown" }
}
