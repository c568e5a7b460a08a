use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::agent::params::WorkerConfig;
use crate::runtime::adapter::{Runner, RunnerResult, StepError};
use crate::runtime::validate::{decode_request, require};

static MUST_GATHER_IMAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(([a-zA-Z0-9\-\.]+)(:[0-9]+)?/)?[a-z0-9\._\-/@]+[?:a-zA-Z0-9_\-.]+$").unwrap()
});

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?[0-9]+(\.[0-9]+)*(-[0-9A-Za-z\-~.]+)?(\+[0-9A-Za-z\-~.]+)?$").unwrap()
});

const MUST_GATHER_OPERATORS: [&str; 5] = ["cnv", "lso", "ocs", "odf", "ocp"];

const ALLOWED_INSTALLER_FLAGS: [&str; 9] = [
    "--append-karg",
    "--delete-karg",
    "-n",
    "--copy-network",
    "--network-dir",
    "--save-partlabel",
    "--save-partindex",
    "--image-url",
    "--image-file",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostRole {
    Master,
    Worker,
    Bootstrap,
    AutoAssign,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Proxy {
    #[serde(default)]
    pub http_proxy: Option<String>,
    #[serde(default)]
    pub https_proxy: Option<String>,
    #[serde(default)]
    pub no_proxy: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallCmdRequest {
    pub cluster_id: Uuid,
    pub host_id: Uuid,
    pub infra_env_id: Uuid,
    pub role: HostRole,
    pub boot_device: String,
    pub controller_image: String,
    #[serde(default)]
    pub high_availability_mode: Option<String>,
    #[serde(default)]
    pub check_cvo: Option<bool>,
    #[serde(default)]
    pub mco_image: String,
    #[serde(default)]
    pub must_gather_image: String,
    #[serde(default)]
    pub openshift_version: String,
    #[serde(default)]
    pub installer_args: String,
    #[serde(default)]
    pub proxy: Option<Proxy>,
    #[serde(default)]
    pub disks_to_format: Vec<String>,
    #[serde(default)]
    pub service_ips: Vec<String>,
}

/// Installer settings merged from the install request
#[derive(Debug, Clone)]
pub struct InstallPlan {
    pub role: HostRole,
    pub cluster_id: Uuid,
    pub host_id: Uuid,
    pub device: String,
    pub controller_image: String,
    pub high_availability_mode: String,
    pub openshift_version: String,
    pub check_cluster_version: bool,
    pub installer_args: Vec<String>,
    pub disks_to_format: Vec<String>,
    pub http_proxy: String,
    pub https_proxy: String,
    pub no_proxy: String,
    pub service_ips: String,
}

/// Runs the (simulated) installer
///
/// A dry-run installation ends by dropping the host's reboot marker, which
/// is what the reboot watcher of the owning agent waits for.
pub struct InstallRunner {
    args: Vec<String>,
    plan: InstallPlan,
    config: Arc<WorkerConfig>,
}

impl InstallRunner {
    pub fn new(config: Arc<WorkerConfig>, args: Vec<String>) -> Result<Self, StepError> {
        let request: InstallCmdRequest = decode_request("installRunner", 1, &args)?;
        let installer_args = validate(&request)?;
        let plan = merge(request, installer_args);
        Ok(Self { args, plan, config })
    }

    pub fn plan(&self) -> &InstallPlan {
        &self.plan
    }
}

fn invalid(message: String) -> StepError {
    StepError::Validation(message)
}

/// Validate the request, returning the decoded installer arguments
fn validate(request: &InstallCmdRequest) -> Result<Vec<String>, StepError> {
    require("installRunner", "boot_device", &request.boot_device)?;
    require("installRunner", "controller_image", &request.controller_image)?;

    if !request.must_gather_image.is_empty() {
        validate_must_gather_images(&request.must_gather_image)?;
    }

    if let Some(proxy) = &request.proxy {
        validate_proxy(proxy)?;
    }

    let mut installer_args = Vec::new();
    if !request.installer_args.is_empty() {
        installer_args = serde_json::from_str::<Vec<String>>(&request.installer_args).map_err(|e| {
            invalid(format!(
                "failed to unmarshal installer args {}: {e}",
                request.installer_args
            ))
        })?;
        validate_installer_args(&installer_args)?;
    }

    if !request.openshift_version.is_empty() && !VERSION_PATTERN.is_match(&request.openshift_version) {
        return Err(invalid(format!(
            "Failed to parse OCP version {}",
            request.openshift_version
        )));
    }

    validate_disks(request)?;
    Ok(installer_args)
}

fn validate_must_gather_images(must_gather_image: &str) -> Result<(), StepError> {
    // The value is either a JSON map of operator -> image or a bare OCP image.
    let images: HashMap<String, String> = serde_json::from_str(must_gather_image)
        .unwrap_or_else(|_| HashMap::from([("ocp".to_string(), must_gather_image.to_string())]));

    for (operator, image) in &images {
        if !MUST_GATHER_IMAGE_PATTERN.is_match(image) {
            return Err(invalid(format!(
                "must gather image {image} validation failed {images:?}"
            )));
        }
        if !MUST_GATHER_OPERATORS.contains(&operator.as_str()) {
            return Err(invalid(format!("operator name {operator} validation failed")));
        }
    }
    Ok(())
}

fn validate_http_proxy(value: &str) -> Result<(), StepError> {
    let url = reqwest::Url::parse(value)
        .map_err(|_| invalid(format!("Proxy URL format is not valid: '{value}'")))?;
    if url.scheme() != "http" {
        return Err(invalid(format!(
            "The URL scheme must be http; {} is unsupported",
            url.scheme()
        )));
    }
    Ok(())
}

fn validate_no_proxy(value: &str) -> Result<(), StepError> {
    if value == "*" {
        return Ok(());
    }
    let valid_entry = |entry: &str| {
        !entry.is_empty()
            && entry
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '/' | ':' | '_'))
    };
    if let Some(bad) = value.split(',').find(|entry| !valid_entry(entry)) {
        return Err(invalid(format!(
            "NO Proxy format is not valid: '{value}'. NO Proxy is a comma-separated list of \
             destination domain names, domains, IP addresses or other network CIDRs. \
             Invalid entry: '{bad}'"
        )));
    }
    Ok(())
}

fn validate_proxy(proxy: &Proxy) -> Result<(), StepError> {
    for value in [&proxy.http_proxy, &proxy.https_proxy].into_iter().flatten() {
        if !value.is_empty() {
            validate_http_proxy(value)?;
        }
    }
    if let Some(no_proxy) = proxy.no_proxy.as_deref().filter(|v| !v.is_empty()) {
        validate_no_proxy(no_proxy)?;
    }
    Ok(())
}

fn validate_installer_args(args: &[String]) -> Result<(), StepError> {
    for arg in args {
        if arg.starts_with('-') && !ALLOWED_INSTALLER_FLAGS.contains(&arg.as_str()) {
            return Err(invalid(format!(
                "found unexpected flag {arg} for installer - allowed flags are {ALLOWED_INSTALLER_FLAGS:?}"
            )));
        }
    }
    Ok(())
}

fn validate_disks(request: &InstallCmdRequest) -> Result<(), StepError> {
    let disks = request
        .disks_to_format
        .iter()
        .chain(std::iter::once(&request.boot_device));

    for disk in disks {
        if !disk.starts_with("/dev/") {
            return Err(invalid(format!("disk {disk} should start of with /dev/")));
        }
        if !Path::new(disk).exists() {
            return Err(invalid(format!("disk {disk} was not found on the host")));
        }
    }
    Ok(())
}

fn merge(request: InstallCmdRequest, installer_args: Vec<String>) -> InstallPlan {
    let proxy = request.proxy.unwrap_or_default();
    InstallPlan {
        role: request.role,
        cluster_id: request.cluster_id,
        host_id: request.host_id,
        device: request.boot_device,
        controller_image: request.controller_image,
        high_availability_mode: request.high_availability_mode.unwrap_or_default(),
        openshift_version: request.openshift_version,
        check_cluster_version: request.check_cvo.unwrap_or(false),
        installer_args,
        disks_to_format: request.disks_to_format,
        http_proxy: proxy.http_proxy.unwrap_or_default(),
        https_proxy: proxy.https_proxy.unwrap_or_default(),
        no_proxy: proxy.no_proxy.unwrap_or_default(),
        service_ips: request.service_ips.join(","),
    }
}

#[async_trait]
impl Runner for InstallRunner {
    fn command(&self) -> &str {
        "installer"
    }

    fn args(&self) -> &[String] {
        &self.args
    }

    async fn run(&self) -> RunnerResult {
        info!(
            role = ?self.plan.role,
            cluster_id = %self.plan.cluster_id,
            host_id = %self.plan.host_id,
            device = %self.plan.device,
            openshift_version = %self.plan.openshift_version,
            "Starting dry-run installation"
        );

        let Some(marker) = self.config.dry_run.reboot_marker() else {
            warn!("No reboot marker configured, installation will not reboot the host");
            return RunnerResult::success("");
        };

        if let Some(parent) = marker.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return RunnerResult::failure(format!(
                    "failed to create reboot marker directory {}: {e}",
                    parent.display()
                ));
            }
        }

        if let Err(e) = tokio::fs::write(marker, b"").await {
            return RunnerResult::failure(format!(
                "failed to write reboot marker {}: {e}",
                marker.display()
            ));
        }

        info!(marker = %marker.display(), "Installation done, host rebooting");
        RunnerResult::success("")
    }
}
