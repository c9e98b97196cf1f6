use std::ffi::{c_char, CString};
use std::path::Path;

use anyhow::{bail, ensure, Context};
use ash::vk;
use libloading::{Library, Symbol};
use serde::Serialize;
use tracing::debug;

use nulldrv_common::platform::{driver_library_name, icd_manifest_dirs, platform_name};
use nulldrv_core::{default_config_path, NulldrvConfig};
use nulldrv_icd::{ENTRY_POINT_NAMES, ICD_INTERFACE_VERSION};

type NegotiateFn = unsafe extern "system" fn(*mut u32) -> vk::Result;
type GetProcAddrFn = unsafe extern "system" fn(vk::Instance, *const c_char) -> vk::PFN_vkVoidFunction;

// ── Check result types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Skip,
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.to_string(),
            details: Vec::new(),
        }
    }

    fn pass(name: &str, message: &str) -> Self {
        Self::new(name, CheckStatus::Pass, message)
    }

    fn fail(name: &str, message: &str) -> Self {
        Self::new(name, CheckStatus::Fail, message)
    }

    fn warn(name: &str, message: &str) -> Self {
        Self::new(name, CheckStatus::Warn, message)
    }

    fn skip(name: &str, message: &str) -> Self {
        Self::new(name, CheckStatus::Skip, message)
    }

    fn detail(mut self, detail: &str) -> Self {
        self.details.push(detail.to_string());
        self
    }
}

// ── Main entry point ────────────────────────────────────────────────────────

pub fn run_verify(library: &Path, json: bool) -> anyhow::Result<()> {
    let results = run_checks(library);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results_pretty(library, &results);
    }

    if has_failures(&results) {
        std::process::exit(1);
    }

    Ok(())
}

/// Run every check against the driver library at `library`.
pub fn run_checks(library: &Path) -> Vec<CheckResult> {
    let mut results: Vec<CheckResult> = Vec::new();

    check_config(&mut results);

    match load_library(library, &mut results) {
        Some(lib) => {
            check_negotiation(&lib, &mut results);
            check_entry_points(&lib, &mut results);
            check_smoke_sequence(library, &mut results);
        }
        None => {
            for name in ["Interface negotiation", "Entry points", "Smoke sequence"] {
                results.push(CheckResult::skip(name, "Driver library not loaded"));
            }
        }
    }

    check_manifest(&mut results);

    results
}

pub fn has_failures(results: &[CheckResult]) -> bool {
    results.iter().any(|r| r.status == CheckStatus::Fail)
}

// ── Check 1: Configuration ──────────────────────────────────────────────────

fn check_config(results: &mut Vec<CheckResult>) {
    let path = default_config_path();

    match NulldrvConfig::load_optional(&path) {
        Ok(Some(config)) => {
            let mut result = CheckResult::pass(
                "Configuration",
                &format!("Loaded from {}", path.display()),
            )
            .detail(&format!("Device name: {}", config.device.name))
            .detail(&format!("Swapchain images: {}", config.swapchain.image_count));

            if let Some(n) = config.faults.fail_allocation_after {
                result = CheckResult::warn(
                    "Configuration",
                    &format!("Loaded from {}", path.display()),
                )
                .detail(&format!(
                    "Allocation fault armed: allocation #{} will fail",
                    n
                ));
            }
            results.push(result);
        }
        Ok(None) => {
            results.push(
                CheckResult::pass("Configuration", "No configuration file, using defaults")
                    .detail(&format!("Looked for: {}", path.display())),
            );
        }
        Err(e) => {
            results.push(
                CheckResult::warn(
                    "Configuration",
                    &format!("Cannot load {}", path.display()),
                )
                .detail(&e.to_string())
                .detail("The driver will fall back to defaults"),
            );
        }
    }
}

// ── Check 2: Library ────────────────────────────────────────────────────────

fn load_library(path: &Path, results: &mut Vec<CheckResult>) -> Option<Library> {
    debug!(path = %path.display(), "loading driver library");

    // SAFETY: loading the driver runs no initializers beyond Rust statics.
    match unsafe { Library::new(path) } {
        Ok(lib) => {
            results.push(CheckResult::pass(
                "Driver library",
                &format!("Loaded {}", path.display()),
            ));
            Some(lib)
        }
        Err(e) => {
            results.push(
                CheckResult::fail(
                    "Driver library",
                    &format!("Cannot load {}", path.display()),
                )
                .detail(&e.to_string())
                .detail("Build it with: cargo build -p nulldrv-icd"),
            );
            None
        }
    }
}

// ── Check 3: Interface negotiation ──────────────────────────────────────────

fn check_negotiation(lib: &Library, results: &mut Vec<CheckResult>) {
    let negotiate: Symbol<NegotiateFn> =
        match unsafe { lib.get(b"vk_icdNegotiateLoaderICDInterfaceVersion\0") } {
            Ok(symbol) => symbol,
            Err(e) => {
                results.push(
                    CheckResult::fail(
                        "Interface negotiation",
                        "vk_icdNegotiateLoaderICDInterfaceVersion not exported",
                    )
                    .detail(&e.to_string()),
                );
                return;
            }
        };

    let mut version = ICD_INTERFACE_VERSION + 2;
    let result = unsafe { negotiate(&mut version) };
    if result == vk::Result::SUCCESS && version == ICD_INTERFACE_VERSION {
        results.push(CheckResult::pass(
            "Interface negotiation",
            &format!("Loader interface version {}", version),
        ));
    } else {
        results.push(
            CheckResult::fail("Interface negotiation", "Unexpected negotiation result")
                .detail(&format!("Result: {:?}, version: {}", result, version)),
        );
    }
}

// ── Check 4: Entry points ───────────────────────────────────────────────────

fn check_entry_points(lib: &Library, results: &mut Vec<CheckResult>) {
    let get_proc_addr: Symbol<GetProcAddrFn> = match unsafe { lib.get(b"vk_icdGetInstanceProcAddr\0") } {
        Ok(symbol) => symbol,
        Err(e) => {
            results.push(
                CheckResult::fail("Entry points", "vk_icdGetInstanceProcAddr not exported")
                    .detail(&e.to_string()),
            );
            return;
        }
    };

    let missing: Vec<&str> = ENTRY_POINT_NAMES
        .iter()
        .copied()
        .filter(|name| {
            let Ok(c_name) = CString::new(*name) else {
                return true;
            };
            unsafe { get_proc_addr(vk::Instance::null(), c_name.as_ptr()) }.is_none()
        })
        .collect();

    if missing.is_empty() {
        results.push(CheckResult::pass(
            "Entry points",
            &format!("All {} entry points resolve", ENTRY_POINT_NAMES.len()),
        ));
    } else {
        let mut result = CheckResult::fail(
            "Entry points",
            &format!("{} of {} entry points missing", missing.len(), ENTRY_POINT_NAMES.len()),
        );
        for name in missing {
            result = result.detail(name);
        }
        results.push(result);
    }
}

// ── Check 5: Smoke sequence ─────────────────────────────────────────────────

fn check_smoke_sequence(library: &Path, results: &mut Vec<CheckResult>) {
    let mut details = Vec::new();
    match smoke_sequence(library, &mut details) {
        Ok(()) => {
            let mut result = CheckResult::pass(
                "Smoke sequence",
                "Instance, physical device, device and buffer behave",
            );
            for detail in &details {
                result = result.detail(detail);
            }
            results.push(result);
        }
        Err(e) => {
            let mut result = CheckResult::fail("Smoke sequence", &format!("{:#}", e));
            for detail in &details {
                result = result.detail(detail);
            }
            results.push(result);
        }
    }
}

fn smoke_sequence(library: &Path, details: &mut Vec<String>) -> anyhow::Result<()> {
    let entry = unsafe { ash::Entry::load_from(library) }
        .map_err(|e| anyhow::anyhow!("cannot load entry points: {}", e))?;

    let app_info = vk::ApplicationInfo::default()
        .application_name(c"nulldrv verify")
        .api_version(vk::API_VERSION_1_0);
    let create_info = vk::InstanceCreateInfo::default().application_info(&app_info);
    let instance = unsafe { entry.create_instance(&create_info, None) }.context("vkCreateInstance")?;

    let outcome = smoke_with_instance(&instance, details);
    unsafe { instance.destroy_instance(None) };
    outcome
}

fn smoke_with_instance(instance: &ash::Instance, details: &mut Vec<String>) -> anyhow::Result<()> {
    let gpus = unsafe { instance.enumerate_physical_devices() }
        .context("vkEnumeratePhysicalDevices")?;
    let gpu = *gpus.first().context("no physical device reported")?;

    let props = unsafe { instance.get_physical_device_properties(gpu) };
    let name = props
        .device_name_as_c_str()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    details.push(format!("Physical device: {} ({:?})", name, props.device_type));

    let priorities = [1.0f32];
    let queue_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(0)
        .queue_priorities(&priorities)];
    let extensions = [ash::khr::swapchain::NAME.as_ptr()];
    let device_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_infos)
        .enabled_extension_names(&extensions);
    let device = unsafe { instance.create_device(gpu, &device_info, None) }
        .context("vkCreateDevice with VK_KHR_swapchain")?;

    let outcome = smoke_with_device(instance, &device, details);
    unsafe { device.destroy_device(None) };
    outcome
}

fn smoke_with_device(
    instance: &ash::Instance,
    device: &ash::Device,
    details: &mut Vec<String>,
) -> anyhow::Result<()> {
    let queue = unsafe { device.get_device_queue(0, 0) };
    if queue == vk::Queue::null() {
        bail!("vkGetDeviceQueue returned a null queue");
    }

    let create_swapchain = unsafe {
        (instance.fp_v1_0().get_device_proc_addr)(device.handle(), c"vkCreateSwapchainKHR".as_ptr())
    };
    ensure!(
        create_swapchain.is_some(),
        "vkCreateSwapchainKHR not resolvable on a swapchain-enabled device"
    );

    let buffer_info = vk::BufferCreateInfo::default()
        .size(1000)
        .usage(vk::BufferUsageFlags::TRANSFER_SRC);
    let buffer = unsafe { device.create_buffer(&buffer_info, None) }.context("vkCreateBuffer")?;
    let reqs = unsafe { device.get_buffer_memory_requirements(buffer) };
    unsafe { device.destroy_buffer(buffer, None) };

    ensure!(
        reqs.size == 1000 && reqs.alignment == 4096,
        "unexpected buffer requirements: size {}, alignment {}",
        reqs.size,
        reqs.alignment
    );
    details.push(format!(
        "Buffer requirements: {} bytes, {}-byte aligned",
        reqs.size, reqs.alignment
    ));
    Ok(())
}

// ── Check 6: Loader manifest ────────────────────────────────────────────────

fn check_manifest(results: &mut Vec<CheckResult>) {
    for dir in icd_manifest_dirs() {
        let path = Path::new(dir).join("nulldrv_icd.json");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) if content.contains("nulldrv_icd") => {
                results.push(
                    CheckResult::pass(
                        "Loader manifest",
                        &format!("ICD manifest found at {}", path.display()),
                    )
                    .detail("The Vulkan loader will pick up nulldrv"),
                );
            }
            Ok(_) => {
                results.push(CheckResult::warn(
                    "Loader manifest",
                    &format!("Manifest at {} does not reference the nulldrv library", path.display()),
                ));
            }
            Err(e) => {
                results.push(CheckResult::warn(
                    "Loader manifest",
                    &format!("Cannot read {}: {}", path.display(), e),
                ));
            }
        }
        return;
    }

    for var in ["VK_DRIVER_FILES", "VK_ICD_FILENAMES"] {
        if let Ok(files) = std::env::var(var) {
            if files.contains("nulldrv") {
                results.push(
                    CheckResult::pass("Loader manifest", &format!("{} set to: {}", var, files))
                        .detail("The Vulkan loader will use this override"),
                );
                return;
            }
        }
    }

    results.push(
        CheckResult::warn("Loader manifest", "No nulldrv ICD manifest installed")
            .detail(&format!(
                "Generate one with: nulldrv manifest --library <path to {}>",
                driver_library_name()
            ))
            .detail("Then point VK_DRIVER_FILES at it"),
    );
}

// ── Output formatters ───────────────────────────────────────────────────────

fn print_results_pretty(library: &Path, results: &[CheckResult]) {
    println!();
    println!("nulldrv Driver Verification");
    println!("===========================");
    println!("  {} ({})", library.display(), platform_name());
    println!();

    let mut pass_count = 0u32;
    let mut fail_count = 0u32;
    let mut warn_count = 0u32;

    for result in results {
        let (icon, color_start, color_end) = match result.status {
            CheckStatus::Pass => {
                pass_count += 1;
                ("[PASS]", "\x1b[32m", "\x1b[0m")
            }
            CheckStatus::Fail => {
                fail_count += 1;
                ("[FAIL]", "\x1b[31m", "\x1b[0m")
            }
            CheckStatus::Warn => {
                warn_count += 1;
                ("[WARN]", "\x1b[33m", "\x1b[0m")
            }
            CheckStatus::Skip => ("[SKIP]", "\x1b[90m", "\x1b[0m"),
        };

        println!(
            "  {}{}{} {} - {}",
            color_start, icon, color_end, result.name, result.message
        );
        for detail in &result.details {
            println!("         {}", detail);
        }
        println!();
    }

    println!("---------------------------");
    println!(
        "  {} passed, {} failed, {} warnings",
        pass_count, fail_count, warn_count
    );
    println!();
}
