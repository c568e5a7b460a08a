//! Argument validation helpers shared by the step runners.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::net::Ipv4Addr;
use std::sync::LazyLock;

use crate::runtime::adapter::StepError;

static MAC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}$").unwrap());

/// Check that a step received exactly `expected` arguments
pub fn check_arity(name: &str, expected: usize, args: &[String]) -> Result<(), StepError> {
    if args.len() != expected {
        return Err(StepError::Validation(format!(
            "{name} cmd accepts only {expected} params in args, given args {args:?}"
        )));
    }
    Ok(())
}

/// Check arity and decode the first argument as a JSON request
pub fn decode_request<T: DeserializeOwned>(
    name: &str,
    expected: usize,
    args: &[String],
) -> Result<T, StepError> {
    check_arity(name, expected, args)?;
    serde_json::from_str(&args[0])
        .map_err(|e| StepError::Validation(format!("failed to decode {name} request: {e}")))
}

/// Reject empty required string fields
pub fn require(name: &str, field: &str, value: &str) -> Result<(), StepError> {
    if value.trim().is_empty() {
        return Err(StepError::Validation(format!("{name}: {field} is required")));
    }
    Ok(())
}

/// `a.b.c.d/n` with 1 <= n <= 32
pub fn is_ipv4_cidr(value: &str) -> bool {
    let Some((addr, prefix)) = value.split_once('/') else {
        return false;
    };
    addr.parse::<Ipv4Addr>().is_ok()
        && prefix
            .parse::<u8>()
            .map(|p| (1..=32).contains(&p))
            .unwrap_or(false)
}

/// Six hex octets separated by `:` or `-`
pub fn is_mac_address(value: &str) -> bool {
    MAC_PATTERN.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_arity() {
        assert!(check_arity("inventory", 1, &args(&["a"])).is_ok());
        let err = check_arity("disk performance", 2, &args(&["a"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"disk performance cmd accepts only 2 params in args, given args ["a"]"#
        );
    }

    #[test]
    fn test_decode_request() {
        let decoded: Vec<String> =
            decode_request("free addresses", 1, &args(&[r#"["10.0.0.0/24"]"#])).unwrap();
        assert_eq!(decoded, vec!["10.0.0.0/24"]);

        let err = decode_request::<Vec<String>>("free addresses", 1, &args(&["{"])).unwrap_err();
        assert!(matches!(err, StepError::Validation(_)));
    }

    #[test]
    fn test_ipv4_cidr() {
        assert!(is_ipv4_cidr("192.168.126.10/24"));
        assert!(is_ipv4_cidr("10.0.0.1/32"));
        assert!(!is_ipv4_cidr("10.0.0.1"));
        assert!(!is_ipv4_cidr("10.0.0.1/0"));
        assert!(!is_ipv4_cidr("10.0.0.1/33"));
        assert!(!is_ipv4_cidr("300.0.0.1/24"));
    }

    #[test]
    fn test_mac_address() {
        assert!(is_mac_address("52:54:00:aa:bb:cc"));
        assert!(is_mac_address("52-54-00-AA-BB-CC"));
        assert!(!is_mac_address("52:54:00:aa:bb"));
        assert!(!is_mac_address("zz:54:00:aa:bb:cc"));
    }
}
