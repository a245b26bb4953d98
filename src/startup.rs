//! Run-at-login management for the agent binary.
//!
//! Registers the installed executable under the current user's startup
//! programs in the Windows registry. Other platforms keep the API surface
//! but report the facility as unsupported.

use std::path::Path;

use crate::error::Result;

#[cfg(windows)]
const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

/// Adds or removes `binary_path` as a login startup program for the
/// current user.
///
/// The registry value is named after the binary's file name. Removing a
/// value that is not present is not an error.
#[cfg(windows)]
pub fn set_run_at_login(binary_path: &Path, enable: bool) -> Result<()> {
    use winreg::RegKey;
    use winreg::enums::HKEY_CURRENT_USER;

    use crate::error::Error;

    let binary_path = std::path::absolute(binary_path)?;
    if !binary_path.exists() {
        return Err(Error::MissingBinary(binary_path));
    }

    let value_name = binary_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::MissingBinary(binary_path.clone()))?;

    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let (key, _) = hkcu.create_subkey(RUN_KEY)?;

    if enable {
        key.set_value(&value_name, &binary_path.to_string_lossy().into_owned())?;
    } else {
        match key.delete_value(&value_name) {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => return Err(error.into()),
        }
    }

    Ok(())
}

#[cfg(not(windows))]
pub fn set_run_at_login(_binary_path: &Path, _enable: bool) -> Result<()> {
    Err(crate::error::Error::StartupUnsupported)
}
