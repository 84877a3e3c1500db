//! Host platform detection.
use std::fmt;
use std::path::{Path, PathBuf};

use crate::exec::{Executor, Invocation};

/// Files consulted for the kernel release string, in order.
const KERNEL_RELEASE_FILES: &[&str] = &["/proc/sys/kernel/osrelease", "/proc/version"];

/// Detected host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Darwin kernel.
    MacOs,
    /// Linux under Windows Subsystem for Linux.
    Wsl,
    /// Any other Linux; treated like WSL where a choice is needed.
    UnknownLinux,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => write!(f, "macOS"),
            Self::Wsl => write!(f, "WSL"),
            Self::UnknownLinux => write!(f, "unknown Linux"),
        }
    }
}

/// Raw OS identity probes that classification is computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostProbe {
    /// Output of `uname -s`.
    pub kernel_name: String,
    /// Kernel release / version string (`/proc/sys/kernel/osrelease`).
    pub kernel_release: String,
    /// Output of `uname -m`.
    pub machine: String,
}

impl HostProbe {
    /// Collect probes from the running host.
    ///
    /// Missing probes (no `uname`, no `/proc`) yield empty strings, which
    /// classify as [`Platform::UnknownLinux`].
    #[must_use]
    pub fn collect(executor: &dyn Executor) -> Self {
        let uname = |flag: &str| {
            executor
                .run(&Invocation::new("uname").arg(flag))
                .map(|r| r.stdout.trim().to_string())
                .unwrap_or_default()
        };
        let files: Vec<PathBuf> = KERNEL_RELEASE_FILES.iter().map(PathBuf::from).collect();
        Self {
            kernel_name: uname("-s"),
            kernel_release: read_first(&files),
            machine: uname("-m"),
        }
    }

    /// Whether `uname -s` reported Darwin.
    #[must_use]
    pub fn is_macos(&self) -> bool {
        self.kernel_name.trim() == "Darwin"
    }

    /// Whether the kernel release names Microsoft or WSL.
    #[must_use]
    pub fn is_wsl(&self) -> bool {
        let release = self.kernel_release.to_lowercase();
        release.contains("microsoft") || release.contains("wsl")
    }

    /// Whether the running process sees a 64-bit ARM CPU.
    #[must_use]
    pub fn is_arm64(&self) -> bool {
        matches!(self.machine.trim(), "arm64" | "aarch64")
    }
}

fn read_first(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .find_map(|p| std::fs::read_to_string(p).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

impl Platform {
    /// Classify probe results. macOS wins over WSL signals.
    #[must_use]
    pub fn classify(probe: &HostProbe) -> Self {
        if probe.is_macos() {
            Self::MacOs
        } else if probe.is_wsl() {
            Self::Wsl
        } else {
            Self::UnknownLinux
        }
    }

    /// Whether this is macOS.
    #[must_use]
    pub const fn is_macos(self) -> bool {
        matches!(self, Self::MacOs)
    }

    /// Whether this is WSL.
    #[must_use]
    pub const fn is_wsl(self) -> bool {
        matches!(self, Self::Wsl)
    }

    /// Conventional Homebrew prefix for this platform and the CPU `probe`
    /// reports.
    ///
    /// A process translated by Rosetta sees `x86_64`, as does the Homebrew
    /// installer it spawns, so both agree on `/usr/local`.
    #[must_use]
    pub fn homebrew_prefix(self, probe: &HostProbe) -> &'static Path {
        self.homebrew_prefix_for(probe.is_arm64())
    }

    fn homebrew_prefix_for(self, apple_silicon: bool) -> &'static Path {
        match self {
            Self::MacOs if apple_silicon => Path::new("/opt/homebrew"),
            Self::MacOs => Path::new("/usr/local"),
            Self::Wsl | Self::UnknownLinux => Path::new("/home/linuxbrew/.linuxbrew"),
        }
    }
}
