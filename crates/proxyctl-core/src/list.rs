//! Line-oriented proxy and target list files
//!
//! Proxy lines are `address:port` or `address:port:protocol`; the protocol
//! defaults to `http`. Lines with fewer than two colon-delimited fields are
//! skipped without error.

use crate::error::Result;
use crate::proxy::{Protocol, ProxyRecord};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Parse a single proxy line
pub fn parse_line(line: &str) -> Option<ProxyRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let parts: Vec<&str> = line.split(':').collect();
    if parts.len() < 2 {
        return None;
    }

    let protocol = match parts.get(2) {
        Some(tag) if !tag.trim().is_empty() => tag.parse::<Protocol>().unwrap_or_default(),
        _ => Protocol::Http,
    };

    Some(ProxyRecord::new(parts[0], parts[1], protocol))
}

/// Parse every proxy line in `content`, skipping malformed ones
pub fn parse_proxies(content: &str) -> Vec<ProxyRecord> {
    let proxies: Vec<ProxyRecord> = content.lines().filter_map(parse_line).collect();
    debug!("Parsed {} proxies from {} lines", proxies.len(), content.lines().count());
    proxies
}

pub fn load_proxies<P: AsRef<Path>>(path: P) -> Result<Vec<ProxyRecord>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_proxies(&content))
}

/// Write proxies as `address:port:protocol`, one per line
pub fn save_proxies<P: AsRef<Path>>(proxies: &[ProxyRecord], path: P) -> Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    for proxy in proxies {
        writeln!(writer, "{}", proxy.to_line())?;
    }
    writer.flush()?;
    Ok(())
}

/// Non-empty, trimmed target lines
pub fn parse_targets(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_targets<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_targets(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_list() {
        let content = "1.2.3.4:8080\nbad-line\n5.6.7.8:3128:socks5\n";
        let proxies = parse_proxies(content);
        assert_eq!(proxies.len(), 2);
        assert_eq!(proxies[0].address, "1.2.3.4");
        assert_eq!(proxies[0].port, "8080");
        assert_eq!(proxies[0].protocol, Protocol::Http);
        assert_eq!(proxies[1].protocol, Protocol::Socks5);
    }

    #[test]
    fn test_parse_line_edge_cases() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line("no-colon-here").is_none());

        let trailing = parse_line("1.2.3.4:8080:").unwrap();
        assert_eq!(trailing.protocol, Protocol::Http);

        let padded = parse_line("  9.9.9.9:80  ").unwrap();
        assert_eq!(padded.address, "9.9.9.9");
        assert_eq!(padded.port, "80");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("valid_proxies.txt");
        let proxies = vec![
            ProxyRecord::new("1.2.3.4", "8080", Protocol::Http),
            ProxyRecord::new("5.6.7.8", "1080", Protocol::Socks5),
        ];

        save_proxies(&proxies, &path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "1.2.3.4:8080:http\n5.6.7.8:1080:socks5\n");

        let loaded = load_proxies(&path).unwrap();
        assert_eq!(loaded, proxies);
        assert_eq!(loaded[1].protocol, Protocol::Socks5);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_proxies(dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }

    #[test]
    fn test_parse_targets_skips_blank_lines() {
        let targets = parse_targets("example.com\n\n   \n  example.org  \n");
        assert_eq!(targets, vec!["example.com", "example.org"]);
    }
}
