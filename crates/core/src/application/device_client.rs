// Device Client - request/response operations over the libimobiledevice tools
//
// Every operation: validate identifier -> build fixed argument list -> run the
// tool through the ProcessRunner port -> decode / shape stdout.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::log_stream::LogStreamSession;
use crate::config::{ClientConfig, ToolPaths};
use crate::domain::{
    DecodeError, DeviceId, DeviceProperties, DiagnosticsRequest, PackageScope, PropertyQuery,
    PropertyValue, ScreenDetails, StorageDetails,
};
use crate::error::{AppError, Result};
use crate::port::{
    LineClassifier, ProcessOutput, ProcessRunner, PropertyDecoder, RunOptions, StreamSpawner,
    TimeProvider,
};

/// Lockdown domain holding screen metrics
pub const ITUNES_DOMAIN: &str = "com.apple.mobile.iTunes";
/// Lockdown domain holding storage figures
pub const DISK_USAGE_DOMAIN: &str = "com.apple.disk_usage";
/// Lockdown domain holding battery state
pub const BATTERY_DOMAIN: &str = "com.apple.mobile.battery";

const BUNDLE_IDENTIFIER_KEY: &str = "CFBundleIdentifier";
const BATTERY_CAPACITY_KEY: &str = "BatteryCurrentCapacity";
const BATTERY_LEVEL_KEY: &str = "level";

/// Façade over the external device tools
///
/// Holds no per-call state, so concurrent calls are independent; each one
/// owns its own external process.
pub struct DeviceClient {
    runner: Arc<dyn ProcessRunner>,
    decoder: Arc<dyn PropertyDecoder>,
    spawner: Arc<dyn StreamSpawner>,
    time_provider: Arc<dyn TimeProvider>,
    tools: ToolPaths,
    options: RunOptions,
}

impl DeviceClient {
    /// Create a new device client
    ///
    /// # Arguments
    /// * `runner` - Bounded process runner used by request/response operations
    /// * `decoder` - Property-list decoder
    /// * `spawner` - Streaming process spawner used by `syslog`
    /// * `time_provider` - Clock used to stamp log records
    /// * `tools` - Program name per external tool
    /// * `options` - Resource bounds applied to every runner call
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        decoder: Arc<dyn PropertyDecoder>,
        spawner: Arc<dyn StreamSpawner>,
        time_provider: Arc<dyn TimeProvider>,
        tools: ToolPaths,
        options: RunOptions,
    ) -> Self {
        Self {
            runner,
            decoder,
            spawner,
            time_provider,
            tools,
            options,
        }
    }

    /// Create a client from configuration (tool paths + default bounds)
    ///
    /// # Errors
    /// - AppError::Config if the configured bounds are invalid
    pub fn from_config(
        runner: Arc<dyn ProcessRunner>,
        decoder: Arc<dyn PropertyDecoder>,
        spawner: Arc<dyn StreamSpawner>,
        time_provider: Arc<dyn TimeProvider>,
        config: &ClientConfig,
    ) -> Result<Self> {
        let options = config.run_options()?;
        Ok(Self::new(
            runner,
            decoder,
            spawner,
            time_provider,
            config.tools.clone(),
            options,
        ))
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    pub fn run_options(&self) -> &RunOptions {
        &self.options
    }

    /// Identifiers of all currently attached devices, in discovery order
    pub async fn list_devices(&self) -> Result<Vec<DeviceId>> {
        let output = self
            .exec(&self.tools.device_id, vec!["-l".to_string()])
            .await?;

        let devices: Vec<DeviceId> = output
            .stdout
            .split('\n')
            .map(str::trim)
            .filter_map(|line| DeviceId::parse(line).ok())
            .collect();

        info!(count = devices.len(), "Listed devices");
        Ok(devices)
    }

    /// Lockdown properties of a device (`ideviceinfo -x`)
    pub async fn get_properties(
        &self,
        serial: &str,
        query: &PropertyQuery,
    ) -> Result<DeviceProperties> {
        let device = DeviceId::parse(serial)?;
        self.properties(&device, query).await
    }

    /// Bundle identifiers of installed applications in `scope`
    pub async fn get_packages(&self, serial: &str, scope: PackageScope) -> Result<Vec<String>> {
        let device = DeviceId::parse(serial)?;

        let mut args = device_args(&device);
        args.extend(["-l", "-o", "xml"].map(String::from));
        if let Some(option) = scope.list_option() {
            args.push("-o".to_string());
            args.push(option.to_string());
        }

        let output = self.exec(&self.tools.installer, args).await?;
        let document = self.decode(&output)?;
        let descriptors = match document {
            PropertyValue::Array(items) => items,
            other => {
                return Err(DecodeError::UnexpectedShape {
                    expected: "array",
                    found: other.kind(),
                }
                .into())
            }
        };

        // Absent ids are skipped; wrong-shaped entries fail the call
        let mut packages = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let descriptor = DeviceProperties::from_value(descriptor)?;
            match descriptor.string(BUNDLE_IDENTIFIER_KEY)? {
                Some(id) => packages.push(id.to_string()),
                None => {
                    debug!(device = %device, "Package descriptor without bundle identifier skipped")
                }
            }
        }

        info!(device = %device, scope = %scope, count = packages.len(), "Listed packages");
        Ok(packages)
    }

    /// Diagnostics document (`idevicediagnostics COMMAND [KEY]`)
    pub async fn diagnostics(
        &self,
        serial: &str,
        request: &DiagnosticsRequest,
    ) -> Result<PropertyValue> {
        let device = DeviceId::parse(serial)?;

        let mut args = device_args(&device);
        args.push(request.command.clone());
        if let Some(key) = request.key.as_deref().filter(|k| !k.is_empty()) {
            args.push(key.to_string());
        }

        let output = self.exec(&self.tools.diagnostics, args).await?;
        self.decode(&output)
    }

    pub async fn reboot(&self, serial: &str) -> Result<()> {
        self.diagnostics_action(serial, "restart").await
    }

    pub async fn shutdown(&self, serial: &str) -> Result<()> {
        self.diagnostics_action(serial, "shutdown").await
    }

    pub async fn enter_recovery(&self, serial: &str) -> Result<()> {
        let device = DeviceId::parse(serial)?;
        self.exec(&self.tools.enter_recovery, vec![device.to_string()])
            .await?;
        info!(device = %device, "Device entering recovery mode");
        Ok(())
    }

    /// Leave recovery mode via `irecovery -n -i 0x<ecid>`.
    ///
    /// # Errors
    /// - AppError::Unsupported for 40-hex identifiers, which carry no chip id
    pub async fn exit_recovery(&self, serial: &str) -> Result<()> {
        let device = DeviceId::parse(serial)?;
        let ecid = device.ecid_hex().ok_or_else(|| {
            AppError::Unsupported(format!(
                "exit recovery needs a hyphenated identifier, got {device}"
            ))
        })?;

        self.exec(
            &self.tools.recovery,
            vec!["-n".to_string(), "-i".to_string(), ecid],
        )
        .await?;
        info!(device = %device, "Device leaving recovery mode");
        Ok(())
    }

    /// Current device name, or set it when `new_name` is given.
    /// Returns the tool's trimmed output either way.
    pub async fn name(&self, serial: &str, new_name: Option<&str>) -> Result<String> {
        let device = DeviceId::parse(serial)?;
        let mut args = device_args(&device);
        if let Some(name) = new_name {
            args.push(name.to_string());
        }
        let output = self.exec(&self.tools.name, args).await?;
        Ok(output.stdout.trim().to_string())
    }

    pub async fn get_resolution(&self, serial: &str) -> Result<ScreenDetails> {
        let props = self
            .get_properties(serial, &PropertyQuery::domain(ITUNES_DOMAIN))
            .await?;
        Ok(ScreenDetails::from_properties(&props)?)
    }

    pub async fn get_storage(&self, serial: &str) -> Result<StorageDetails> {
        let props = self
            .get_properties(serial, &PropertyQuery::domain(DISK_USAGE_DOMAIN))
            .await?;
        Ok(StorageDetails::from_properties(&props)?)
    }

    /// Battery domain properties plus a normalised `level` key
    pub async fn get_battery(&self, serial: &str) -> Result<DeviceProperties> {
        let props = self
            .get_properties(serial, &PropertyQuery::domain(BATTERY_DOMAIN))
            .await?;

        let mut battery = props.clone();
        if let Some(capacity) = props.get(BATTERY_CAPACITY_KEY) {
            battery.insert(BATTERY_LEVEL_KEY, capacity.clone());
        }
        Ok(battery)
    }

    /// Pull crash reports into a fresh temporary directory.
    ///
    /// The directory is returned to, and owned by, the caller.
    pub async fn collect_logs(&self, serial: &str, filter: Option<&str>) -> Result<PathBuf> {
        let device = DeviceId::parse(serial)?;

        let mktemp = self
            .exec(&self.tools.mktemp, vec!["-d".to_string()])
            .await?;
        let dir = mktemp.stdout.trim().to_string();
        if dir.is_empty() {
            return Err(AppError::InvalidState(
                "mktemp returned an empty path".to_string(),
            ));
        }

        let mut args = device_args(&device);
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            args.push("-f".to_string());
            args.push(filter.to_string());
        }
        args.push(dir.clone());

        self.exec(&self.tools.crash_report, args).await?;
        info!(device = %device, dir = %dir, "Crash reports collected");
        Ok(PathBuf::from(dir))
    }

    /// Spawn a syslog stream for the device. The returned session is in
    /// `Created`; subscribe, then `start()` it.
    ///
    /// Deprecated in intent: device log formats vary and classification is
    /// best-effort.
    pub fn syslog(
        &self,
        serial: &str,
        classifier: Arc<dyn LineClassifier>,
    ) -> Result<LogStreamSession> {
        let device = DeviceId::parse(serial)?;
        LogStreamSession::spawn(
            device,
            self.spawner.as_ref(),
            &self.tools.syslog,
            classifier,
            self.time_provider.clone(),
        )
    }

    async fn properties(&self, device: &DeviceId, query: &PropertyQuery) -> Result<DeviceProperties> {
        let mut args = device_args(device);
        args.push("-x".to_string());
        query.push_args(&mut args);

        let output = self.exec(&self.tools.device_info, args).await?;
        let document = self.decode(&output)?;
        Ok(DeviceProperties::from_value(document)?)
    }

    async fn diagnostics_action(&self, serial: &str, command: &str) -> Result<()> {
        let device = DeviceId::parse(serial)?;
        let args = vec![command.to_string(), "-u".to_string(), device.to_string()];
        self.exec(&self.tools.diagnostics, args).await?;
        info!(device = %device, command = %command, "Diagnostics action completed");
        Ok(())
    }

    async fn exec(&self, program: &str, args: Vec<String>) -> Result<ProcessOutput> {
        debug!(program = %program, args = ?args, "Invoking device tool");
        Ok(self.runner.run(program, &args, &self.options).await?)
    }

    fn decode(&self, output: &ProcessOutput) -> Result<PropertyValue> {
        Ok(self.decoder.decode(output.stdout_bytes())?)
    }
}

fn device_args(device: &DeviceId) -> Vec<String> {
    vec!["-u".to_string(), device.to_string()]
}

#[cfg(test)]
#[path = "device_client_test.rs"]
mod device_client_test;
