use crate::config::Platform;

/// Service management cmdlets and their aliases.
const SERVICE_MANAGEMENT: &[&str] = &[
    "Start-Service",
    "sasv",
    "Stop-Service",
    "spsv",
    "Restart-Service",
    "Suspend-Service",
    "ssv",
    "Resume-Service",
    "Set-Service",
    "New-Service",
    "Remove-Service",
];

const MODULE_MANAGEMENT: &[&str] = &[
    "Install-Module",
    "Uninstall-Module",
    "Update-Module",
    "Save-Module",
    "Publish-Module",
    "Install-PackageProvider",
];

const SYSTEM_CONFIGURATION: &[&str] = &[
    "Add-Computer",
    "Remove-Computer",
    "Rename-Computer",
    "Join-Domain",
    "Restart-Computer",
    "Stop-Computer",
    "Enable-PSRemoting",
    "Disable-PSRemoting",
    "Set-ExecutionPolicy",
];

const JOB_MANAGEMENT: &[&str] = &[
    "Start-Job",
    "sajb",
    "Stop-Job",
    "spjb",
    "Remove-Job",
    "rjb",
    "Debug-Job",
];

/// Cmdlets that export data, block on interactive input, instantiate
/// arbitrary objects, touch archives, record sessions, mutate variables or
/// enter other hosts.
const EXTENDED: &[&str] = &[
    // data export
    "Export-Csv",
    "epcsv",
    "Export-Clixml",
    // interactive input
    "Read-Host",
    "Get-Credential",
    "Out-GridView",
    "ogv",
    // dynamic objects
    "New-Object",
    "Invoke-CimMethod",
    "Invoke-WmiMethod",
    // archives
    "Expand-Archive",
    "Compress-Archive",
    // transcripts
    "Start-Transcript",
    "Stop-Transcript",
    // variables
    "Set-Variable",
    "sv",
    "set",
    "New-Variable",
    "nv",
    "Remove-Variable",
    "rv",
    "Clear-Variable",
    "clv",
    // remote hosts
    "Enter-PSHostProcess",
    "Enter-PSSession",
    "etsn",
];

/// Entries that only make sense against a Windows host.
const WINDOWS_ONLY: &[&str] = &[
    // disks
    "Format-Volume",
    "Clear-Disk",
    "Initialize-Disk",
    "Remove-Partition",
    "diskpart",
    "diskpart.exe",
    // acl and mark-of-the-web
    "Set-Acl",
    "Unblock-File",
    "icacls",
    "icacls.exe",
    "takeown",
    "takeown.exe",
    // native admin tools
    "reg",
    "reg.exe",
    "net",
    "net.exe",
    "net1",
    "net1.exe",
    "netsh",
    "netsh.exe",
    "bcdedit",
    "bcdedit.exe",
    "vssadmin",
    "vssadmin.exe",
    "wmic",
    "wmic.exe",
    // registry and local users
    "Set-ItemProperty",
    "sp",
    "New-ItemProperty",
    "Remove-ItemProperty",
    "New-LocalUser",
    "Set-LocalUser",
    "Remove-LocalUser",
    "Add-LocalGroupMember",
    // defender and firewall
    "Set-MpPreference",
    "Add-MpPreference",
    "Remove-MpPreference",
    "New-NetFirewallRule",
    "Set-NetFirewallRule",
    "Remove-NetFirewallRule",
    "Disable-NetFirewallRule",
    "Set-NetFirewallProfile",
    // scheduled tasks
    "schtasks",
    "schtasks.exe",
    "Register-ScheduledTask",
    "Set-ScheduledTask",
    "Unregister-ScheduledTask",
    // certificates
    "Export-PfxCertificate",
    "Export-Certificate",
    "certutil",
    "certutil.exe",
    // process termination
    "taskkill",
    "taskkill.exe",
];

const WINDOWS_DIRECTORIES: &[&str] = &[
    r"C:\Windows",
    r"C:\Program Files",
    r"C:\Program Files (x86)",
    r"C:\ProgramData",
    r"C:\System Volume Information",
    r"C:\$Recycle.Bin",
];

const UNIX_DIRECTORIES: &[&str] = &[
    "/etc", "/boot", "/bin", "/sbin", "/usr/bin", "/usr/sbin", "/usr/lib", "/proc", "/sys",
    "/dev", "/var/log", "/root",
];

const COMMON_NAMESPACES: &[&str] = &["Env:"];

const WINDOWS_NAMESPACES: &[&str] = &["HKLM:", "HKCU:", "HKCR:", "HKU:", "Cert:", "WSMan:"];

/// The built-in deny set for `platform`, as written (not yet case folded).
pub fn default_restricted_commands(platform: Platform) -> Vec<&'static str> {
    let mut commands: Vec<&'static str> = [
        SERVICE_MANAGEMENT,
        MODULE_MANAGEMENT,
        SYSTEM_CONFIGURATION,
        JOB_MANAGEMENT,
        EXTENDED,
    ]
    .concat();

    if platform == Platform::Windows {
        commands.extend_from_slice(WINDOWS_ONLY);
    }

    commands
}

/// Built-in restricted roots for `platform`: namespace prefixes first, then
/// system directories.
pub fn default_restricted_roots(platform: Platform) -> Vec<&'static str> {
    let mut roots = COMMON_NAMESPACES.to_vec();
    match platform {
        Platform::Windows => {
            roots.extend_from_slice(WINDOWS_NAMESPACES);
            roots.extend_from_slice(WINDOWS_DIRECTORIES);
        }
        Platform::Unix => roots.extend_from_slice(UNIX_DIRECTORIES),
    }
    roots
}
