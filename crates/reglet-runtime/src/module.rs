//! Module-binary validation, run before compilation so an obviously-bad
//! upload never reaches `wasmtime::Module::new`.

use reglet_types::{PluginError, PluginErrorType};

const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6d];
/// Uncompressed-module size ceiling for any plugin binary accepted here.
const MAX_MODULE_BYTES: usize = 300 * 1024;

pub fn validate_module_binary(bytes: &[u8]) -> Result<(), PluginError> {
    if bytes.len() < 8 || bytes[0..4] != WASM_MAGIC {
        return Err(PluginError::new(
            "invalid_magic",
            "module does not start with the WASM magic number",
            PluginErrorType::Config,
        ));
    }
    if bytes.len() > MAX_MODULE_BYTES {
        return Err(PluginError::new(
            "module_too_large",
            format!("module is {} bytes, limit is {MAX_MODULE_BYTES}", bytes.len()),
            PluginErrorType::Config,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_header() {
        let mut bytes = WASM_MAGIC.to_vec();
        bytes.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]); // version 1
        assert!(validate_module_binary(&bytes).is_ok());
    }

    #[test]
    fn rejects_bad_magic() {
        let bytes = vec![0u8; 16];
        let err = validate_module_binary(&bytes).unwrap_err();
        assert_eq!(err.code, "invalid_magic");
    }

    #[test]
    fn rejects_oversized_module() {
        let mut bytes = WASM_MAGIC.to_vec();
        bytes.extend(std::iter::repeat(0u8).take(MAX_MODULE_BYTES));
        let err = validate_module_binary(&bytes).unwrap_err();
        assert_eq!(err.code, "module_too_large");
    }

    #[test]
    fn rejects_truncated_header() {
        assert!(validate_module_binary(&[0x00, 0x61]).is_err());
    }
}
