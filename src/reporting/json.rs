// src/reporting/json.rs

use color_eyre::eyre::Result;
use std::fs;
use std::path::Path;

use crate::core::models::FingerprintResult;

pub fn write(path: &Path, result: &FingerprintResult) -> Result<()> {
    let contents = serde_json::to_string_pretty(result)?;
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_result_uses_renamed_fields() {
        let mut result = FingerprintResult::new("https://example.com");
        result.database.db_type = "mysql".to_string();
        result.waf.detected = true;
        result.waf.waf_type = Some("cloudflare".to_string());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["database"]["type"], "mysql");
        assert_eq!(json["waf"]["type"], "cloudflare");
        assert_eq!(json["confidence"], "low");
        assert_eq!(json["cms"]["confidence"], "none");
    }
}
