//! Machine fingerprint used as a hardware id for license binding.

use crate::error::Result;
#[cfg(windows)]
use crate::error::ResultExt as _;
use crate::util;

/// SHA-256 hex of a stable per-machine identifier.
///
/// Windows: registry `MachineGuid`. Elsewhere: `/etc/machine-id`, falling
/// back to the `HOSTNAME` environment variable.
pub fn machine_fingerprint() -> Result<String> {
    #[cfg(windows)]
    {
        use winreg::enums::HKEY_LOCAL_MACHINE;
        use winreg::RegKey;
        let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
        let crypto = hklm
            .open_subkey("SOFTWARE\\Microsoft\\Cryptography")
            .ctx_io("open HKLM\\...\\Cryptography")?;
        let guid: String = crypto.get_value("MachineGuid").ctx_io("read MachineGuid")?;
        Ok(util::sha256_hex(guid.trim().as_bytes()))
    }

    #[cfg(not(windows))]
    {
        let id = std::fs::read_to_string("/etc/machine-id")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| std::env::var("HOSTNAME").ok())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(util::sha256_hex(id.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_hex() {
        let a = machine_fingerprint().unwrap();
        let b = machine_fingerprint().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_is_a_valid_hardware_id() {
        util::validate_hardware_id(&machine_fingerprint().unwrap()).unwrap();
    }
}
