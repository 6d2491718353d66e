//! `rackline expand` command.

use anyhow::Result;
use rackline_csv::{expand_alphanumeric_pattern, expand_ipaddress_pattern};

pub fn expand(pattern: &str, family: Option<u8>) -> Result<Vec<String>> {
    let values = match family {
        Some(family) => expand_ipaddress_pattern(pattern, family)?,
        None => expand_alphanumeric_pattern(pattern)?,
    };
    Ok(values)
}

pub fn run(pattern: &str, family: Option<u8>) -> Result<()> {
    for value in expand(pattern, family)? {
        println!("{value}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_interface_names() {
        assert_eq!(
            expand("ge-0/0/[0-2]", None).unwrap(),
            vec!["ge-0/0/0", "ge-0/0/1", "ge-0/0/2"]
        );
    }

    #[test]
    fn test_expand_ip_addresses() {
        assert_eq!(
            expand("10.0.0.[1,3]/24", Some(4)).unwrap(),
            vec!["10.0.0.1/24", "10.0.0.3/24"]
        );
        assert!(expand("10.0.0.[1,3]/24", Some(5)).is_err());
    }
}
