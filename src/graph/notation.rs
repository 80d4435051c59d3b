// src/graph/notation.rs

//! Compact predecessor notation: `<id><type><lag>`, e.g. `12FS+3`,
//! `slabSS`, `framingFS-2`.
//!
//! The lag is omitted when zero. Parsing accepts optional whitespace between
//! the id and the type code, and rejects `FF` / `SF` with the same message
//! as [`DependencyType::from_str`].

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::graph::task::Predecessor;
use crate::types::DependencyType;

static NOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?P<id>\S.*?)\s*(?P<ty>FS|SS|FF|SF)(?P<lag>[+-]\d+)?\s*$")
        .unwrap_or_else(|e| panic!("predecessor notation regex is invalid: {e}"))
});

impl fmt::Display for Predecessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.predecessor_id, self.dependency_type)?;
        if self.lag_days != 0 {
            write!(f, "{:+}", self.lag_days)?;
        }
        Ok(())
    }
}

impl FromStr for Predecessor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = NOTATION
            .captures(s)
            .ok_or_else(|| format!("invalid predecessor notation: {s:?} (expected e.g. \"12FS+3\")"))?;

        let id = caps["id"].to_string();
        let dependency_type: DependencyType = caps["ty"].parse()?;
        let lag_days = match caps.name("lag") {
            Some(m) => m
                .as_str()
                .parse::<i64>()
                .map_err(|e| format!("invalid lag in {s:?}: {e}"))?,
            None => 0,
        };

        Ok(Predecessor {
            predecessor_id: id,
            dependency_type,
            lag_days,
        })
    }
}

/// Parse a comma-separated list such as `"1FS+3, 2SS"`.
pub fn parse_predecessor_list(s: &str) -> Result<Vec<Predecessor>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect()
}
