//! Package manager backends and their unattended command lines.
use std::fmt;

/// App Installer package family that provides `winget`.
const APP_INSTALLER_FAMILY: &str = "Microsoft.DesktopAppInstaller_8wekyb3d8bbwe";

/// Official Chocolatey install script.
const CHOCOLATEY_INSTALL_URL: &str = "https://community.chocolatey.org/install.ps1";

/// Winget: the package is already installed.
pub const WINGET_ALREADY_INSTALLED: i32 = -1_978_335_135;

/// Winget: no applicable upgrade was found for an installed package.
pub const WINGET_UPDATE_NOT_APPLICABLE: i32 = -1_978_335_189;

/// Supported package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Windows Package Manager.
    Winget,
    /// Chocolatey (Windows).
    Chocolatey,
    /// Debian family.
    Apt,
    /// Red Hat family.
    Dnf,
    /// Arch Linux.
    Pacman,
    /// Python packages.
    Pip,
    /// Snap packages.
    Snap,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Winget => "winget",
            Self::Chocolatey => "chocolatey",
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
            Self::Pip => "pip",
            Self::Snap => "snap",
        };
        f.write_str(name)
    }
}

/// A single program invocation: program name plus owned arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: &'static str,
    pub args: Vec<String>,
}

impl Invocation {
    fn new(program: &'static str, args: &[&str]) -> Self {
        Self {
            program,
            args: args.iter().map(ToString::to_string).collect(),
        }
    }

    /// Arguments as borrowed slices, the shape [`Executor`](crate::exec::Executor) takes.
    #[must_use]
    pub fn arg_refs(&self) -> Vec<&str> {
        self.args.iter().map(String::as_str).collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::exec::command_line(self.program, &self.arg_refs()))
    }
}

impl Backend {
    /// Resolve a Windows manifest `source` string.
    ///
    /// `choco` is accepted as an alias for `chocolatey`.
    #[must_use]
    pub fn from_source(source: &str) -> Option<Self> {
        match source.trim().to_ascii_lowercase().as_str() {
            "winget" => Some(Self::Winget),
            "chocolatey" | "choco" => Some(Self::Chocolatey),
            _ => None,
        }
    }

    /// Program whose presence on `PATH` means the backend is usable.
    #[must_use]
    pub const fn program(self) -> &'static str {
        match self {
            Self::Winget => "winget",
            Self::Chocolatey => "choco",
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
            Self::Pip => "pip3",
            Self::Snap => "snap",
        }
    }

    /// Non-interactive install command for one package.
    #[must_use]
    pub fn install_invocation(self, id: &str) -> Invocation {
        match self {
            Self::Winget => Invocation::new(
                "winget",
                &[
                    "install",
                    "--id",
                    id,
                    "--exact",
                    "--silent",
                    "--accept-source-agreements",
                    "--accept-package-agreements",
                    "--disable-interactivity",
                ],
            ),
            Self::Chocolatey => Invocation::new("choco", &["install", id, "-y", "--no-progress"]),
            Self::Apt => Invocation::new(
                "env",
                &["DEBIAN_FRONTEND=noninteractive", "apt-get", "install", "-y", id],
            ),
            Self::Dnf => Invocation::new("dnf", &["install", "-y", id]),
            Self::Pacman => Invocation::new("pacman", &["-S", "--needed", "--noconfirm", id]),
            Self::Pip => Invocation::new("pip3", &["install", "--no-input", id]),
            Self::Snap => Invocation::new("snap", &["install", id]),
        }
    }

    /// Package index refresh to run once before the first install, if any.
    #[must_use]
    pub fn refresh_invocation(self) -> Option<Invocation> {
        match self {
            Self::Apt => Some(Invocation::new(
                "env",
                &["DEBIAN_FRONTEND=noninteractive", "apt-get", "update"],
            )),
            _ => None,
        }
    }

    /// Commands that make this backend available.
    ///
    /// `host` is the platform's primary backend, through which `pip` and
    /// `snap` are installed.  Returns `None` when there is no route: the
    /// system package managers themselves, or a secondary backend on a host
    /// without a primary one.
    #[must_use]
    pub fn bootstrap_plan(self, host: Option<Self>) -> Option<Vec<Invocation>> {
        match self {
            Self::Winget => Some(vec![powershell(&format!(
                "Add-AppxPackage -RegisterByFamilyName -MainPackage {APP_INSTALLER_FAMILY}"
            ))]),
            Self::Chocolatey => Some(vec![powershell(&format!(
                "[System.Net.ServicePointManager]::SecurityProtocol = \
                 [System.Net.ServicePointManager]::SecurityProtocol -bor 3072; \
                 iex ((New-Object System.Net.WebClient).DownloadString('{CHOCOLATEY_INSTALL_URL}'))"
            ))]),
            Self::Pip => {
                let host = host.filter(|h| h.is_system())?;
                let package = if host == Self::Pacman {
                    "python-pip"
                } else {
                    "python3-pip"
                };
                Some(host_install(host, package))
            }
            Self::Snap => {
                let host = host.filter(|h| h.is_system())?;
                Some(host_install(host, "snapd"))
            }
            Self::Apt | Self::Dnf | Self::Pacman => None,
        }
    }

    /// Whether the exit code means "nothing to do" rather than failure.
    #[must_use]
    pub const fn is_noop_exit(self, code: i32) -> bool {
        matches!(self, Self::Winget)
            && (code == WINGET_ALREADY_INSTALLED || code == WINGET_UPDATE_NOT_APPLICABLE)
    }

    /// Linux distribution package managers.
    #[must_use]
    pub const fn is_system(self) -> bool {
        matches!(self, Self::Apt | Self::Dnf | Self::Pacman)
    }
}

fn powershell(script: &str) -> Invocation {
    Invocation::new(
        "powershell",
        &[
            "-NoProfile",
            "-NonInteractive",
            "-ExecutionPolicy",
            "Bypass",
            "-Command",
            script,
        ],
    )
}

/// Install `package` through `host`, refreshing its index first where needed.
fn host_install(host: Backend, package: &str) -> Vec<Invocation> {
    host.refresh_invocation()
        .into_iter()
        .chain(std::iter::once(host.install_invocation(package)))
        .collect()
}
