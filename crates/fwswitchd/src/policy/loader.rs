//! Rule-file parsing and the ordered policy container.
//!
//! A rule file holds one rule per line, in one of two shapes:
//!
//! ```text
//! <permit|deny> IP [ip] src <ipv4> dst <ipv4>
//! <permit|deny> <TCP|UDP> <src|dst> <port>
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. Loading is
//! all-or-nothing: the first malformed record fails the whole policy.

use super::rule::Rule;
use super::types::{Permission, PortLocation, Protocol};
use crate::error::{PolicyError, PolicyResult};
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::{debug, info};

/// The whitespace-separated tokens of one rule, with its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRuleRecord {
    /// 1-based line number, for error messages.
    pub line: usize,
    pub tokens: Vec<String>,
}

impl RawRuleRecord {
    pub fn new<I, S>(line: usize, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            line,
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits one line of text on whitespace.
    pub fn from_line(line: usize, text: &str) -> Self {
        Self::new(line, text.split_whitespace())
    }

    fn parse(&self) -> PolicyResult<Rule> {
        let err = |reason: String| PolicyError::malformed(self.line, reason);

        // The `ip` keyword after the protocol is optional in address rules.
        let t: Vec<&str> = match self.tokens.as_slice() {
            [perm, proto, ip, rest @ ..]
                if rest.len() == 4 && ip.eq_ignore_ascii_case("ip") =>
            {
                [perm.as_str(), proto.as_str()]
                    .into_iter()
                    .chain(rest.iter().map(String::as_str))
                    .collect()
            }
            tokens => tokens.iter().map(String::as_str).collect(),
        };

        if t.len() != 4 && t.len() != 6 {
            return Err(err(format!("expected 4 or 6 tokens, found {}", t.len())));
        }

        let permission: Permission = t[0].parse().map_err(err)?;
        let protocol: Protocol = t[1].parse().map_err(err)?;

        if t.len() == 6 {
            if protocol != Protocol::Ip {
                return Err(err(format!(
                    "address-pair rule requires protocol IP, found {}",
                    protocol
                )));
            }
            expect_keyword(t[2], "src").map_err(err)?;
            expect_keyword(t[4], "dst").map_err(err)?;
            let source_ip = parse_ipv4(t[3]).map_err(err)?;
            let dest_ip = parse_ipv4(t[5]).map_err(err)?;
            return Ok(Rule::ip(permission, source_ip, dest_ip));
        }

        if protocol == Protocol::Ip {
            return Err(err(
                "IP rules need the form '<permit|deny> IP src <addr> dst <addr>'".to_string(),
            ));
        }
        let location: PortLocation = t[2].parse().map_err(err)?;
        let port: u16 = t[3]
            .parse()
            .map_err(|_| err(format!("invalid port: {}", t[3])))?;

        Rule::port(permission, protocol, location, port).map_err(err)
    }
}

fn expect_keyword(token: &str, keyword: &str) -> Result<(), String> {
    if token.eq_ignore_ascii_case(keyword) {
        Ok(())
    } else {
        Err(format!("expected keyword '{}', found '{}'", keyword, token))
    }
}

fn parse_ipv4(token: &str) -> Result<Ipv4Addr, String> {
    token
        .parse()
        .map_err(|_| format!("invalid IPv4 address: {}", token))
}

/// An ordered list of firewall rules.
///
/// Order is significant: it is the order entries are compiled and
/// installed in, and so the precedence among overlapping rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    rules: Vec<Rule>,
}

impl Policy {
    /// Builds a policy from raw records, failing on the first malformed one.
    pub fn load(records: impl IntoIterator<Item = RawRuleRecord>) -> PolicyResult<Self> {
        let rules = records
            .into_iter()
            .map(|record| {
                let rule = record.parse()?;
                debug!(line = record.line, rule = %rule, "Parsed rule");
                Ok(rule)
            })
            .collect::<PolicyResult<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Wraps rules built in code.
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parses rule-file text.
    pub fn from_rules_text(text: &str) -> PolicyResult<Self> {
        let records = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
            .map(|(line_no, line)| RawRuleRecord::from_line(line_no, line));

        Self::load(records)
    }

    /// Reads and parses a rule file.
    pub fn from_file(path: impl AsRef<Path>) -> PolicyResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let policy = Self::from_rules_text(&text)?;
        info!(path = %path.display(), rules = policy.len(), "Loaded firewall policy");
        Ok(policy)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
