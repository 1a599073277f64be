//! Fake libimobiledevice tools
//!
//! Each fake is a small shell script in a temp dir. It records its argv to
//! `<name>.args` and prints canned output, so tests run the real runner,
//! spawner and plist decoder without a device attached.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use imobile_core::{ClientConfig, DeviceClient, ToolPaths};
use tempfile::TempDir;

pub const UDID: &str = "00008030-001A2C3E0E38802E";
pub const LEGACY_UDID: &str = "0123456789abcdef0123456789abcdef01234567";

pub const ITUNES_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
	<key>ScreenWidth</key><integer>1170</integer>
	<key>ScreenHeight</key><integer>2532</integer>
	<key>ScreenScaleFactor</key><integer>3</integer>
</dict>
</plist>"#;

pub const DISK_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
	<key>TotalDataCapacity</key><integer>1000</integer>
	<key>TotalDataAvailable</key><integer>250</integer>
</dict>
</plist>"#;

pub const BATTERY_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
	<key>BatteryCurrentCapacity</key><integer>87</integer>
	<key>BatteryIsCharging</key><true/>
</dict>
</plist>"#;

pub const GENERAL_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
	<key>DeviceName</key><string>Test iPhone</string>
	<key>ProductVersion</key><string>17.2</string>
</dict>
</plist>"#;

pub const PACKAGES_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<array>
	<dict><key>CFBundleIdentifier</key><string>com.example.first</string></dict>
	<dict><key>CFBundleDisplayName</key><string>No Id</string></dict>
	<dict><key>CFBundleIdentifier</key><string>com.example.second</string></dict>
</array>
</plist>"#;

pub const DIAGNOSTICS_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
	<key>GasGauge</key>
	<dict><key>CycleCount</key><integer>412</integer></dict>
</dict>
</plist>"#;

/// `cat` a literal document from a quoted heredoc
fn cat(document: &str) -> String {
    format!("cat <<'PLIST'\n{document}\nPLIST")
}

pub struct FakeTools {
    dir: TempDir,
}

impl FakeTools {
    /// Temp dir with every default fake installed
    pub fn new() -> Self {
        let fakes = Self {
            dir: tempfile::tempdir().expect("create fake tool dir"),
        };
        fakes.install_defaults();
        fakes
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `body` as an executable `sh` script named `name`
    pub fn install(&self, name: &str, body: &str) {
        let path = self.path(name);
        let script = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > \"{}.args\"\n{}\n",
            path.display(),
            body
        );
        fs::write(&path, script).expect("write fake tool");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake tool");
    }

    /// argv of the last invocation of `name`, or None if it never ran
    pub fn args(&self, name: &str) -> Option<Vec<String>> {
        let recorded = fs::read_to_string(self.path(&format!("{name}.args"))).ok()?;
        Some(recorded.lines().map(str::to_string).collect())
    }

    pub fn tools(&self) -> ToolPaths {
        let p = |name: &str| self.path(name).to_string_lossy().into_owned();
        ToolPaths {
            device_id: p("idevice_id"),
            device_info: p("ideviceinfo"),
            installer: p("ideviceinstaller"),
            diagnostics: p("idevicediagnostics"),
            enter_recovery: p("ideviceenterrecovery"),
            recovery: p("irecovery"),
            name: p("idevicename"),
            crash_report: p("idevicecrashreport"),
            syslog: p("idevicesyslog"),
            mktemp: p("mktemp"),
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            tools: self.tools(),
            ..ClientConfig::default()
        }
    }

    pub fn client(&self) -> DeviceClient {
        self.client_with(self.config())
    }

    pub fn client_with(&self, config: ClientConfig) -> DeviceClient {
        imobile_infra_system::system_client(&config).expect("valid config")
    }

    fn install_defaults(&self) {
        self.install(
            "idevice_id",
            &format!("printf '{UDID}\\n\\nnot-a-device\\n{LEGACY_UDID}\\n'"),
        );
        self.install(
            "ideviceinfo",
            &format!(
                "case \"$*\" in\n  *com.apple.mobile.iTunes*) {}\n  ;;\n  *com.apple.disk_usage*) {}\n  ;;\n  *com.apple.mobile.battery*) {}\n  ;;\n  *) {}\n  ;;\nesac",
                cat(ITUNES_PLIST),
                cat(DISK_PLIST),
                cat(BATTERY_PLIST),
                cat(GENERAL_PLIST),
            ),
        );
        self.install("ideviceinstaller", &cat(PACKAGES_PLIST));
        self.install(
            "idevicediagnostics",
            &format!(
                "case \"$1\" in\n  restart|shutdown) echo \"Restarting device.\" ;;\n  *) {}\n  ;;\nesac",
                cat(DIAGNOSTICS_PLIST),
            ),
        );
        self.install(
            "ideviceenterrecovery",
            "echo \"Telling device to enter recovery mode.\"",
        );
        self.install("irecovery", "exit 0");
        self.install(
            "idevicename",
            r#"if [ -n "$3" ]; then echo "device name set to '$3'"; else echo "Test iPhone"; fi"#,
        );
        self.install(
            "mktemp",
            &format!(
                "d=\"{}/crash-$$\"; mkdir -p \"$d\"; echo \"$d\"",
                self.root().display()
            ),
        );
        self.install(
            "idevicecrashreport",
            r#"for last; do :; done; echo "report" > "$last/JetsamEvent.ips"; echo "Done.""#,
        );
        self.install(
            "idevicesyslog",
            "printf 'Jan 17 10:22:33 Test-iPhone SpringBoard(FrontBoard)[57] <Notice>: Scene update\\n'\n\
             printf '[connected:00008030-001A2C3E0E38802E]\\n'\n\
             printf 'Jan 17 10:22:34 Test-iPhone kernel[0]: wlan0 link up\\n'",
        );
    }
}
